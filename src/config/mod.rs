mod settings;

pub use settings::{CatalogConfig, LogConfig, LogFormat, Settings};
