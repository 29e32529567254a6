pub mod record;
pub mod record_set;
pub mod snapshot;

pub use record::*;
pub use record_set::*;
pub use snapshot::*;
