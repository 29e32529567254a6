//! Paginated arXiv and Zotero harvesting for refharvest.

pub mod arxiv;
pub mod error;
pub mod fields;
pub mod http;
pub mod page;
pub mod zotero;

pub use error::{HarvestError, Result};
pub use http::{
    HttpResponse, ReqwestTransport, RetryPolicy, RetryingClient, Sleeper, TokioSleeper, Transport,
};
pub use page::{PageSource, RawPage, RawRecord};
