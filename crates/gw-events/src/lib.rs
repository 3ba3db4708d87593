pub mod feed;
pub mod ids;
pub mod types;

pub use crate::feed::{Feed, FeedConfig, FeedError, FeedMessage, FeedSource, FeedSubscription};
pub use crate::ids::{ActivityId, ApiKeyId, IdError, ServerId, TeamId, TraceRecordId};
pub use crate::types::{ActivityEvent, ActivityStatus, FeedEntry, RequestTrace};
