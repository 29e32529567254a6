pub mod client;
pub mod normalize;
pub mod parser;
pub mod query;
pub mod scan;

pub use client::{ArxivClient, RecentRequest};
pub use normalize::{normalize_entry, published_at};
pub use parser::parse_feed;
pub use scan::{StopReason, WindowedOutcome, WindowedScan};
