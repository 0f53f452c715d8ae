pub mod component;
pub mod config;
pub mod init;
pub mod menu;
pub mod signal;
pub mod tools;

use anyhow::Result;
use console::{Term, style};
use rust_i18n::t;

rust_i18n::i18n!("locales", fallback = "en-US");

pub fn pause(term: &Term) -> Result<()> {
    println!("\n{}", style(t!("common.press_enter")).dim());
    term.read_line()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_messages_are_translated() {
        for locale in ["en-US", "zh-TW"] {
            let goodbye = t!("main_menu.goodbye", locale = locale);
            let error_prefix = t!("common.error_prefix", locale = locale);

            assert!(!goodbye.contains("main_menu.goodbye"), "{locale}: {goodbye}");
            assert!(!error_prefix.contains("common.error_prefix"), "{locale}: {error_prefix}");
        }
        assert_eq!(t!("main_menu.goodbye", locale = "zh-TW"), "再見！");
    }
}
