use crate::types::{FeedEntry, RequestTrace};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An event with every trace captured for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActivityDetail {
    pub entry: FeedEntry,
    pub traces: Vec<RequestTrace>,
}
