use crate::component::BarcodeGenerator;
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_barcode_generator(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<()> {
    let mut generator = BarcodeGenerator::new(config.clone(), Arc::clone(shutdown_signal));

    if let Err(e) = generator.run() {
        eprintln!("{} {e:#}", style(t!("common.error_prefix")).red().bold());
    }

    *config = generator.into_config();

    pause(term)?;
    Ok(())
}
