use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::store::{CollectionStore, Mutation, StoreTx, PINNED_COLLECTION_ID};
use crate::{
    error::{AppError, AppResult, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION},
    models::{Collection, CollectionRecommendation, NewCollection, Recommendation},
};

/// SQLSTATE for a negative LIMIT
const INVALID_LIMIT: &str = "2201W";
/// SQLSTATE for a negative OFFSET
const INVALID_OFFSET: &str = "2201X";

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeSet<i32>,
    collections: BTreeMap<i32, Collection>,
    recommendations: BTreeMap<i32, Value>,
    links: Vec<CollectionRecommendation>,
}

impl Tables {
    fn recommendation_owner(&self, recommendation_id: i32) -> Option<i64> {
        self.recommendations
            .get(&recommendation_id)
            .and_then(|row| row.get("user_id"))
            .and_then(Value::as_i64)
    }

    fn linked_ids(&self, collection_id: i32) -> impl Iterator<Item = i32> + '_ {
        self.links
            .iter()
            .filter(move |link| link.collection_id == collection_id)
            .map(|link| link.recommendation_id)
    }
}

fn constraint(code: &str, message: impl Into<String>) -> AppError {
    AppError::Store {
        code: Some(code.to_string()),
        message: message.into(),
    }
}

/// In-process [`CollectionStore`] enforcing the same keys and constraints as
/// the relational schema.
///
/// A unit of work holds the store lock and edits a private copy of the tables;
/// committing swaps the copy in, dropping it discards the copy.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user id that collections may reference
    pub async fn add_user(&self, user_id: i32) {
        self.tables.lock().await.users.insert(user_id);
    }

    /// Stores a recommendation row; the row must carry `id` and `user_id`.
    pub async fn add_recommendation(&self, row: Value) -> AppResult<()> {
        let id = row
            .get("id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
            .ok_or_else(|| constraint("23502", "recommendation row needs an integer id"))?;

        let mut tables = self.tables.lock().await;
        if tables.recommendations.contains_key(&id) {
            return Err(constraint(UNIQUE_VIOLATION, format!("recommendation {id} exists")));
        }
        tables.recommendations.insert(id, row);
        Ok(())
    }

    /// Committed collections
    pub async fn collections(&self) -> Vec<Collection> {
        self.tables.lock().await.collections.values().cloned().collect()
    }

    /// Committed links
    pub async fn links(&self) -> Vec<CollectionRecommendation> {
        self.tables.lock().await.links.clone()
    }
}

#[async_trait::async_trait]
impl CollectionStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn close(&self) {}

    fn name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait::async_trait]
impl StoreTx for MemoryTx {
    async fn insert_collection(
        &mut self,
        new_collection: &NewCollection,
    ) -> AppResult<Mutation<Collection>> {
        let tables = &mut self.working;

        if tables.collections.contains_key(&PINNED_COLLECTION_ID) {
            return Err(constraint(
                UNIQUE_VIOLATION,
                "duplicate key value violates unique constraint \"collections_pkey\"",
            ));
        }
        if tables
            .collections
            .values()
            .any(|c| c.name == new_collection.name)
        {
            return Err(constraint(
                UNIQUE_VIOLATION,
                "duplicate key value violates unique constraint \"collections_name_key\"",
            ));
        }
        if !tables.users.contains(&new_collection.user_id) {
            return Err(constraint(
                FOREIGN_KEY_VIOLATION,
                format!("user {} does not exist", new_collection.user_id),
            ));
        }

        let collection = Collection {
            id: PINNED_COLLECTION_ID,
            user_id: new_collection.user_id,
            name: new_collection.name.clone(),
            description: new_collection.description.clone(),
            created_at: Utc::now(),
        };
        tables.collections.insert(collection.id, collection.clone());

        Ok(Mutation::Applied(collection))
    }

    async fn find_owned_collection(
        &mut self,
        collection_id: i32,
        user_id: i32,
    ) -> AppResult<Option<Collection>> {
        Ok(self
            .working
            .collections
            .get(&collection_id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn collections_for_user(&mut self, user_id: i32) -> AppResult<Vec<Collection>> {
        Ok(self
            .working
            .collections
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn recommendation_owned_by(
        &mut self,
        recommendation_id: i32,
        user_id: i32,
    ) -> AppResult<bool> {
        Ok(self.working.recommendation_owner(recommendation_id) == Some(i64::from(user_id)))
    }

    async fn find_link(
        &mut self,
        collection_id: i32,
        recommendation_id: i32,
    ) -> AppResult<Option<CollectionRecommendation>> {
        Ok(self
            .working
            .links
            .iter()
            .find(|l| l.collection_id == collection_id && l.recommendation_id == recommendation_id)
            .cloned())
    }

    async fn insert_link(
        &mut self,
        collection_id: i32,
        recommendation_id: i32,
    ) -> AppResult<Mutation<CollectionRecommendation>> {
        let tables = &mut self.working;

        if !tables.collections.contains_key(&collection_id) {
            return Err(constraint(
                FOREIGN_KEY_VIOLATION,
                format!("collection {collection_id} does not exist"),
            ));
        }
        if !tables.recommendations.contains_key(&recommendation_id) {
            return Err(constraint(
                FOREIGN_KEY_VIOLATION,
                format!("recommendation {recommendation_id} does not exist"),
            ));
        }

        let link = CollectionRecommendation {
            collection_id,
            recommendation_id,
        };
        tables.links.push(link.clone());

        Ok(Mutation::Applied(link))
    }

    async fn delete_link(
        &mut self,
        collection_id: i32,
        recommendation_id: i32,
    ) -> AppResult<Mutation<u64>> {
        let links = &mut self.working.links;
        let before = links.len();
        links.retain(|l| !(l.collection_id == collection_id && l.recommendation_id == recommendation_id));
        Ok(Mutation::from_count((before - links.len()) as u64))
    }

    async fn delete_links_for_collection(
        &mut self,
        collection_id: i32,
    ) -> AppResult<Mutation<u64>> {
        let links = &mut self.working.links;
        let before = links.len();
        links.retain(|l| l.collection_id != collection_id);
        Ok(Mutation::from_count((before - links.len()) as u64))
    }

    async fn delete_collection(
        &mut self,
        collection_id: i32,
        user_id: i32,
    ) -> AppResult<Mutation<u64>> {
        let tables = &mut self.working;

        let owned = tables
            .collections
            .get(&collection_id)
            .is_some_and(|c| c.user_id == user_id);
        if !owned {
            return Ok(Mutation::NoRows);
        }
        if tables.linked_ids(collection_id).next().is_some() {
            return Err(constraint(
                FOREIGN_KEY_VIOLATION,
                format!("collection {collection_id} is still referenced"),
            ));
        }

        tables.collections.remove(&collection_id);
        Ok(Mutation::Applied(1))
    }

    async fn recommendations_in_collection(
        &mut self,
        collection_id: i32,
    ) -> AppResult<Vec<Recommendation>> {
        let tables = &self.working;
        let ids: BTreeSet<i32> = tables.linked_ids(collection_id).collect();

        Ok(ids
            .iter()
            .filter_map(|id| tables.recommendations.get(id))
            .cloned()
            .collect())
    }

    async fn count_links(&mut self, collection_id: i32) -> AppResult<i64> {
        Ok(self.working.linked_ids(collection_id).count() as i64)
    }

    async fn recommendations_page(
        &mut self,
        collection_id: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Recommendation>> {
        if limit < 0 {
            return Err(constraint(INVALID_LIMIT, "LIMIT must not be negative"));
        }
        if offset < 0 {
            return Err(constraint(INVALID_OFFSET, "OFFSET must not be negative"));
        }

        let tables = &self.working;
        let mut joined: Vec<(i32, Value)> = tables
            .links
            .iter()
            .filter(|link| link.collection_id == collection_id)
            .filter_map(|link| {
                let mut row = tables.recommendations.get(&link.recommendation_id)?.clone();
                if let Value::Object(fields) = &mut row {
                    fields.insert("collection_id".into(), link.collection_id.into());
                    fields.insert("recommendation_id".into(), link.recommendation_id.into());
                }
                Some((link.recommendation_id, row))
            })
            .collect();
        joined.sort_by_key(|(id, _)| *id);

        Ok(joined
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(_, row)| row)
            .collect())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
