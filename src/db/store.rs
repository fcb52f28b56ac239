use crate::{
    error::{AppError, AppResult},
    models::{Collection, CollectionRecommendation, NewCollection, Recommendation},
};

/// Primary key written by every collection insert.
///
/// The id is not generated: a second insert collides with the first and is
/// reported as a unique violation.
pub const PINNED_COLLECTION_ID: i32 = 1;

/// Outcome of a write statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<T> {
    /// The statement touched at least one row
    Applied(T),
    /// The statement ran cleanly but matched nothing
    NoRows,
}

impl<T> Mutation<T> {
    /// Wraps a `RETURNING` row that may be absent
    pub fn from_row(row: Option<T>) -> Self {
        match row {
            Some(row) => Mutation::Applied(row),
            None => Mutation::NoRows,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied(_))
    }

    /// Turns `NoRows` into a soft failure carrying `message`
    pub fn applied_or(self, message: &str) -> AppResult<T> {
        match self {
            Mutation::Applied(value) => Ok(value),
            Mutation::NoRows => Err(AppError::Unfulfilled(message.to_string())),
        }
    }
}

impl Mutation<u64> {
    /// Wraps an affected-row count
    pub fn from_count(rows_affected: u64) -> Self {
        if rows_affected > 0 {
            Mutation::Applied(rows_affected)
        } else {
            Mutation::NoRows
        }
    }
}

/// Process-wide handle onto the relational store.
///
/// Every request opens its own unit of work with [`CollectionStore::begin`];
/// nothing else is shared between requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CollectionStore: Send + Sync {
    /// Opens a unit of work. Dropping it without committing rolls it back.
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>>;

    /// Releases the store's connections
    async fn close(&self);

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// A single unit of work against the store.
///
/// Statements run in the order they are awaited; nothing is visible to other
/// units of work until [`StoreTx::commit`] succeeds.
#[async_trait::async_trait]
pub trait StoreTx: Send {
    /// Inserts a collection under [`PINNED_COLLECTION_ID`]
    async fn insert_collection(
        &mut self,
        new_collection: &NewCollection,
    ) -> AppResult<Mutation<Collection>>;

    /// The collection if it exists and belongs to `user_id`
    async fn find_owned_collection(
        &mut self,
        collection_id: i32,
        user_id: i32,
    ) -> AppResult<Option<Collection>>;

    async fn collections_for_user(&mut self, user_id: i32) -> AppResult<Vec<Collection>>;

    /// Whether the recommendation exists and belongs to `user_id`
    async fn recommendation_owned_by(
        &mut self,
        recommendation_id: i32,
        user_id: i32,
    ) -> AppResult<bool>;

    async fn find_link(
        &mut self,
        collection_id: i32,
        recommendation_id: i32,
    ) -> AppResult<Option<CollectionRecommendation>>;

    async fn insert_link(
        &mut self,
        collection_id: i32,
        recommendation_id: i32,
    ) -> AppResult<Mutation<CollectionRecommendation>>;

    async fn delete_link(
        &mut self,
        collection_id: i32,
        recommendation_id: i32,
    ) -> AppResult<Mutation<u64>>;

    /// Removes every link of a collection
    async fn delete_links_for_collection(&mut self, collection_id: i32)
        -> AppResult<Mutation<u64>>;

    async fn delete_collection(
        &mut self,
        collection_id: i32,
        user_id: i32,
    ) -> AppResult<Mutation<u64>>;

    /// Full recommendation rows linked to a collection
    async fn recommendations_in_collection(
        &mut self,
        collection_id: i32,
    ) -> AppResult<Vec<Recommendation>>;

    async fn count_links(&mut self, collection_id: i32) -> AppResult<i64>;

    /// A window of recommendation rows merged with their link columns
    async fn recommendations_page(
        &mut self,
        collection_id: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Recommendation>>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
