use crate::config::save::save_settings;
use crate::config::types::{
    Config, Language, OutputFormat, StripLayout, SummarizerKind, UserSettings,
};
use crate::menu::handlers::run_barcode_generator;
use anyhow::{Context, Result};
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use rust_i18n::t;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_generate"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_barcode_generator(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(1) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(2) | None => Ok(false), // ESC 離開
        _ => unreachable!(),
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("settings.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let options = settings_items(&config.settings);

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        let barcode = &mut config.settings.barcode;
        let changed = match selection {
            Some(0) => {
                let current = barcode.summarizer;
                select_value(
                    term,
                    &t!("settings.opt_summarizer"),
                    &[
                        SummarizerKind::Average,
                        SummarizerKind::HsvMode,
                        SummarizerKind::KMeansPalette,
                    ],
                    current,
                )?
                .map(|v| barcode.summarizer = v)
                .is_some()
            }
            Some(1) => {
                let current = barcode.layout;
                select_value(
                    term,
                    &t!("settings.opt_layout"),
                    &[StripLayout::Gradient, StripLayout::Histogram],
                    current,
                )?
                .map(|v| barcode.layout = v)
                .is_some()
            }
            Some(2) => {
                barcode.frame_stride = input_positive(
                    term,
                    &t!("settings.stride_prompt"),
                    barcode.frame_stride,
                )?;
                true
            }
            Some(3) => {
                barcode.aggregate_by_second = !barcode.aggregate_by_second;
                true
            }
            Some(4) => {
                barcode.output_format = match barcode.output_format {
                    OutputFormat::Jpeg => OutputFormat::Png,
                    OutputFormat::Png => OutputFormat::Jpeg,
                };
                true
            }
            Some(5) => {
                barcode.strip_width =
                    input_positive(term, &t!("settings.width_prompt"), barcode.strip_width)?;
                barcode.strip_height =
                    input_positive(term, &t!("settings.height_prompt"), barcode.strip_height)?;
                true
            }
            Some(6) => {
                barcode.bell_easing = !barcode.bell_easing;
                true
            }
            Some(7) => {
                barcode.use_cache = !barcode.use_cache;
                true
            }
            Some(8) => {
                let value: usize = Input::new()
                    .with_prompt(t!("settings.workers_prompt"))
                    .default(barcode.worker_count.unwrap_or(0))
                    .interact_text_on(term)?;
                barcode.worker_count = zero_as_none(value);
                true
            }
            Some(9) => {
                let value: u32 = Input::new()
                    .with_prompt(t!("settings.decode_width_prompt"))
                    .default(barcode.decode_width.unwrap_or(0))
                    .interact_text_on(term)?;
                barcode.decode_width = zero_as_none(value);
                true
            }
            Some(10) => {
                let text: String = Input::new()
                    .with_prompt(t!("settings.seed_prompt"))
                    .default(barcode.kmeans_seed.map(|s| s.to_string()).unwrap_or_default())
                    .allow_empty(true)
                    .validate_with(|v: &String| {
                        parse_seed(v)
                            .map(|_| ())
                            .map_err(|_| t!("settings.seed_invalid").to_string())
                    })
                    .interact_text_on(term)?;
                barcode.kmeans_seed = parse_seed(&text)?;
                true
            }
            Some(11) => {
                let current = config.settings.language;
                let selected = select_value(
                    term,
                    &t!("settings.opt_language"),
                    &[Language::EnUs, Language::ZhTw],
                    current,
                )?;
                if let Some(language) = selected {
                    config.settings.language = language;
                    rust_i18n::set_locale(language.as_str());
                }
                selected.is_some()
            }
            Some(12) | None => break, // ESC 或返回
            _ => unreachable!(),
        };

        if changed {
            save_settings(&config.settings)?;
        }
    }

    Ok(())
}

/// 設定選單項目，順序需與 `show_settings_menu` 的分支一致
fn settings_items(settings: &UserSettings) -> Vec<String> {
    let barcode = &settings.barcode;
    let auto = || t!("settings.auto").to_string();

    vec![
        format!("{} [{}]", t!("settings.opt_summarizer"), barcode.summarizer),
        format!("{} [{}]", t!("settings.opt_layout"), barcode.layout),
        format!("{} [{}]", t!("settings.opt_stride"), barcode.frame_stride),
        format!(
            "{} [{}]",
            t!("settings.opt_aggregate"),
            on_off(barcode.aggregate_by_second)
        ),
        format!(
            "{} [{}]",
            t!("settings.opt_format"),
            barcode.output_format.extension()
        ),
        format!(
            "{} [{}x{}]",
            t!("settings.opt_strip_size"),
            barcode.strip_width,
            barcode.strip_height
        ),
        format!(
            "{} [{}]",
            t!("settings.opt_bell_easing"),
            on_off(barcode.bell_easing)
        ),
        format!("{} [{}]", t!("settings.opt_use_cache"), on_off(barcode.use_cache)),
        format!(
            "{} [{}]",
            t!("settings.opt_workers"),
            barcode.worker_count.map_or_else(auto, |n| n.to_string())
        ),
        format!(
            "{} [{}]",
            t!("settings.opt_decode_width"),
            barcode
                .decode_width
                .map_or_else(|| t!("settings.original").to_string(), |w| w.to_string())
        ),
        format!(
            "{} [{}]",
            t!("settings.opt_kmeans_seed"),
            barcode
                .kmeans_seed
                .map_or_else(|| t!("settings.random").to_string(), |s| s.to_string())
        ),
        format!("{} [{}]", t!("settings.opt_language"), settings.language),
        t!("settings.back").to_string(),
    ]
}

/// 輸入至少為 1 的數值
fn input_positive<T>(term: &Term, prompt: &str, current: T) -> Result<T>
where
    T: Copy + Display + FromStr + PartialOrd + From<u8>,
    T::Err: Display + Debug,
{
    let value = Input::new()
        .with_prompt(prompt)
        .default(current)
        .validate_with(|v: &T| {
            if *v >= T::from(1) {
                Ok(())
            } else {
                Err(t!("settings.value_invalid").to_string())
            }
        })
        .interact_text_on(term)?;
    Ok(value)
}

/// 0 代表自動／不限制
fn zero_as_none<T: PartialEq + Default>(value: T) -> Option<T> {
    (value != T::default()).then_some(value)
}

/// 空字串代表不固定種子
fn parse_seed(text: &str) -> Result<Option<u64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let seed = text
        .parse::<u64>()
        .with_context(|| format!("無效的種子: {text}"))?;
    Ok(Some(seed))
}

/// 從固定選項中選擇；ESC 或未變更時回傳 `None`
fn select_value<T: Copy + PartialEq + Display>(
    term: &Term,
    prompt: &str,
    values: &[T],
    current: T,
) -> Result<Option<T>> {
    let items: Vec<String> = values.iter().map(ToString::to_string).collect();
    let default_index = values.iter().position(|&v| v == current).unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    Ok(selection
        .map(|index| values[index])
        .filter(|&value| value != current))
}

fn on_off(value: bool) -> String {
    if value {
        t!("common.on").to_string()
    } else {
        t!("common.off").to_string()
    }
}
