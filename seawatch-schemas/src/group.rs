use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type GroupId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorGroup {
    pub id: GroupId,
    /// Unique across the deployment; also the first half of every member's codename.
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupFilters {
    pub top_limit: Option<usize>,
    pub from_date: Option<DateTime<Utc>>,
    pub till_date: Option<DateTime<Utc>>,
}
