use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A named, user-owned group of recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of a create-collection request
#[derive(Debug, Clone, Deserialize)]
pub struct NewCollection {
    pub user_id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Link row between a collection and one of its recommendations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CollectionRecommendation {
    pub collection_id: i32,
    pub recommendation_id: i32,
}

/// A recommendation row. Only `id` and `user_id` are meaningful here;
/// every other column is passed through to clients untouched.
pub type Recommendation = Value;

/// A collection together with the recommendations linked to it
#[derive(Debug, Clone, Serialize)]
pub struct CollectionWithRecommendations {
    #[serde(flatten)]
    pub collection: Collection,
    pub recommendations: Vec<Recommendation>,
}
