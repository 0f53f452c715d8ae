use crate::tools::Color;

/// 由幀率計算每個時間桶的大小（四捨五入，至少為 1）
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bucket_size_for(frame_rate: f64) -> usize {
    if !frame_rate.is_finite() {
        return 1;
    }
    (frame_rate.round() as usize).max(1)
}

/// 將連續的顏色依固定大小分桶，每桶取各通道平均（無條件捨去）
///
/// 共 `ceil(n / bucket_size)` 桶，最後一桶可能較小。
#[must_use]
pub fn aggregate_by_bucket(colors: &[Color], bucket_size: usize) -> Vec<Color> {
    colors
        .chunks(bucket_size.max(1))
        .map(average_colors)
        .collect()
}

fn average_colors(bucket: &[Color]) -> Color {
    let count = bucket.len() as u64;
    let (r, g, b) = bucket.iter().fold((0u64, 0u64, 0u64), |(r, g, b), c| {
        (
            r + u64::from(c.r),
            g + u64::from(c.g),
            b + u64::from(c.b),
        )
    });

    #[allow(clippy::cast_possible_truncation)]
    let mean = |sum: u64| (sum / count) as u8;
    Color::new(mean(r), mean(g), mean(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey(value: u8) -> Color {
        Color::new(value, value, value)
    }

    #[test]
    fn test_ten_colors_bucket_three() {
        let colors: Vec<Color> = (0..10).map(|i| grey(i * 10)).collect();
        let buckets = aggregate_by_bucket(&colors, 3);

        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0], grey(10));
        assert_eq!(buckets[1], grey(40));
        assert_eq!(buckets[2], grey(70));
        // 最後一桶只有一個元素，原樣保留
        assert_eq!(buckets[3], colors[9]);
    }

    #[test]
    fn test_average_truncates() {
        let colors = [Color::new(1, 0, 255), Color::new(2, 1, 254)];
        assert_eq!(aggregate_by_bucket(&colors, 2), vec![Color::new(1, 0, 254)]);
    }

    #[test]
    fn test_empty_sequence() {
        assert!(aggregate_by_bucket(&[], 24).is_empty());
    }

    #[test]
    fn test_bucket_size_for() {
        assert_eq!(bucket_size_for(29.97), 30);
        assert_eq!(bucket_size_for(23.976), 24);
        assert_eq!(bucket_size_for(0.2), 1);
        assert_eq!(bucket_size_for(f64::NAN), 1);
    }
}
