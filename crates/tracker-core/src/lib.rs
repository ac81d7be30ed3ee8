pub mod context;
pub mod error;
pub mod models;
pub mod pagination;
pub mod traits;

pub use context::{CallContext, ContextError};
pub use error::{ErrorCode, Result, TrackerError};
pub use models::*;
pub use pagination::{Pagination, DEFAULT_LIMIT, DEFAULT_OFFSET};
pub use traits::TrackerClient;
