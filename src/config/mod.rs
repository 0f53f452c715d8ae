pub mod load;
pub mod save;
pub mod types;

pub use types::{
    BarcodeSettings, Config, Language, MAX_RECENT_PATHS, OutputFormat, StripLayout,
    SummarizerKind, UserSettings,
};
