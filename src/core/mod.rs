pub mod addr;
pub mod error;
pub mod types;

pub use error::{Result, SentinelError};
pub use types::{Endpoint, Member, ShardDeleteEvent, ShardEvent};
