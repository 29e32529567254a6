pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod report;
pub mod text;

pub use config::{ArxivSettings, HarvestConfig, RetrySettings, ZoteroSettings};
pub use error::{CoreError, Result};
pub use models::*;
pub use report::{FrequencyTable, render_report};
