//! RGB 與 HSV 色彩空間轉換
//!
//! 所有輸入輸出皆為 `[0,1]` 範圍的浮點數，色相為 `[0,360)` 度。

/// RGB 轉 HSV
///
/// - `max == 0`（純黑）時直接回傳 `(0, 0, 0)`
/// - 色相依最大通道計算，相同時優先序為 r > g > b
/// - 計算結果為 NaN（delta 為 0）時色相設為 0
#[must_use]
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let min = r.min(g.min(b));
    let max = r.max(g.max(b));

    let v = max;
    let delta = max - min;

    if max == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let s = delta / max;

    let mut h = if r == max {
        (g - b) / delta
    } else if g == max {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };

    h *= 60.0;
    if h < 0.0 {
        h += 360.0;
    }
    if h.is_nan() {
        h = 0.0;
    }

    (h, s, v)
}

/// HSV 轉 RGB
///
/// `s == 0` 時為無彩色 `(v, v, v)`；其餘依 60 度分為六個扇區插值。
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (v, v, v);
    }

    let h = h / 60.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn assert_close(actual: (f32, f32, f32), expected: (f32, f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() < EPSILON
                && (actual.1 - expected.1).abs() < EPSILON
                && (actual.2 - expected.2).abs() < EPSILON,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn test_black_short_circuit() {
        assert_eq!(rgb_to_hsv(0.0, 0.0, 0.0), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_grey_has_zero_hue_and_saturation() {
        let (h, s, v) = rgb_to_hsv(0.5, 0.5, 0.5);
        assert_eq!(h, 0.0);
        assert_eq!(s, 0.0);
        assert!((v - 0.5).abs() < EPSILON);
        assert_close(hsv_to_rgb(h, s, v), (0.5, 0.5, 0.5));
    }

    #[test]
    fn test_primary_hues() {
        assert_close(rgb_to_hsv(1.0, 0.0, 0.0), (0.0, 1.0, 1.0));
        assert_close(rgb_to_hsv(0.0, 1.0, 0.0), (120.0, 1.0, 1.0));
        assert_close(rgb_to_hsv(0.0, 0.0, 1.0), (240.0, 1.0, 1.0));
        // 洋紅：r 為最大值，(g - b) 為負，需補 360
        assert_close(rgb_to_hsv(1.0, 0.0, 1.0), (300.0, 1.0, 1.0));
    }

    #[test]
    fn test_every_sector() {
        assert_close(hsv_to_rgb(30.0, 1.0, 1.0), (1.0, 0.5, 0.0));
        assert_close(hsv_to_rgb(90.0, 1.0, 1.0), (0.5, 1.0, 0.0));
        assert_close(hsv_to_rgb(150.0, 1.0, 1.0), (0.0, 1.0, 0.5));
        assert_close(hsv_to_rgb(210.0, 1.0, 1.0), (0.0, 0.5, 1.0));
        assert_close(hsv_to_rgb(270.0, 1.0, 1.0), (0.5, 0.0, 1.0));
        assert_close(hsv_to_rgb(330.0, 1.0, 1.0), (1.0, 0.0, 0.5));
    }

    #[test]
    fn test_round_trip_grid() {
        let steps = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for &r in &steps {
            for &g in &steps {
                for &b in &steps {
                    let (h, s, v) = rgb_to_hsv(r, g, b);
                    assert!((0.0..360.0).contains(&h), "hue out of range: {h}");
                    assert!((0.0..=1.0).contains(&s));
                    assert!((0.0..=1.0).contains(&v));
                    assert_close(hsv_to_rgb(h, s, v), (r, g, b));
                }
            }
        }
    }
}
