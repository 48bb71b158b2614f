// Re-export all model types for ease of use

pub mod listing;
pub mod record;
pub mod storage;

pub use listing::*;
pub use record::*;
pub use storage::*;
