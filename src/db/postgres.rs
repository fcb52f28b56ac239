use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use super::store::{CollectionStore, Mutation, StoreTx, PINNED_COLLECTION_ID};
use crate::{
    error::AppResult,
    models::{Collection, CollectionRecommendation, NewCollection, Recommendation},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// [`CollectionStore`] backed by PostgreSQL; each unit of work is a transaction
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CollectionStore for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Open PostgreSQL transaction; rolled back by sqlx when dropped uncommitted
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl StoreTx for PgStoreTx {
    async fn insert_collection(
        &mut self,
        new_collection: &NewCollection,
    ) -> AppResult<Mutation<Collection>> {
        let row = sqlx::query_as::<_, Collection>(
            r#"
            INSERT INTO collections (id, user_id, name, description, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, user_id, name, description, created_at
            "#,
        )
        .bind(PINNED_COLLECTION_ID)
        .bind(new_collection.user_id)
        .bind(&new_collection.name)
        .bind(&new_collection.description)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(Mutation::from_row(row))
    }

    async fn find_owned_collection(
        &mut self,
        collection_id: i32,
        user_id: i32,
    ) -> AppResult<Option<Collection>> {
        let row = sqlx::query_as::<_, Collection>(
            r#"
            SELECT id, user_id, name, description, created_at
            FROM collections
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(collection_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn collections_for_user(&mut self, user_id: i32) -> AppResult<Vec<Collection>> {
        let rows = sqlx::query_as::<_, Collection>(
            r#"
            SELECT id, user_id, name, description, created_at
            FROM collections
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn recommendation_owned_by(
        &mut self,
        recommendation_id: i32,
        user_id: i32,
    ) -> AppResult<bool> {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM recommendations WHERE id = $1 AND user_id = $2)",
        )
        .bind(recommendation_id)
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(owned)
    }

    async fn find_link(
        &mut self,
        collection_id: i32,
        recommendation_id: i32,
    ) -> AppResult<Option<CollectionRecommendation>> {
        let row = sqlx::query_as::<_, CollectionRecommendation>(
            r#"
            SELECT collection_id, recommendation_id
            FROM collection_recommendations
            WHERE collection_id = $1 AND recommendation_id = $2
            "#,
        )
        .bind(collection_id)
        .bind(recommendation_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn insert_link(
        &mut self,
        collection_id: i32,
        recommendation_id: i32,
    ) -> AppResult<Mutation<CollectionRecommendation>> {
        let row = sqlx::query_as::<_, CollectionRecommendation>(
            r#"
            INSERT INTO collection_recommendations (collection_id, recommendation_id)
            VALUES ($1, $2)
            RETURNING collection_id, recommendation_id
            "#,
        )
        .bind(collection_id)
        .bind(recommendation_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(Mutation::from_row(row))
    }

    async fn delete_link(
        &mut self,
        collection_id: i32,
        recommendation_id: i32,
    ) -> AppResult<Mutation<u64>> {
        let result = sqlx::query(
            "DELETE FROM collection_recommendations WHERE collection_id = $1 AND recommendation_id = $2",
        )
        .bind(collection_id)
        .bind(recommendation_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(Mutation::from_count(result.rows_affected()))
    }

    async fn delete_links_for_collection(
        &mut self,
        collection_id: i32,
    ) -> AppResult<Mutation<u64>> {
        let result = sqlx::query("DELETE FROM collection_recommendations WHERE collection_id = $1")
            .bind(collection_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(Mutation::from_count(result.rows_affected()))
    }

    async fn delete_collection(
        &mut self,
        collection_id: i32,
        user_id: i32,
    ) -> AppResult<Mutation<u64>> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1 AND user_id = $2")
            .bind(collection_id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(Mutation::from_count(result.rows_affected()))
    }

    async fn recommendations_in_collection(
        &mut self,
        collection_id: i32,
    ) -> AppResult<Vec<Recommendation>> {
        // Rows go out as JSON so columns beyond id/user_id need no mapping here
        let rows = sqlx::query_scalar::<_, Recommendation>(
            r#"
            SELECT to_jsonb(r)
            FROM recommendations r
            WHERE r.id IN (
                SELECT recommendation_id FROM collection_recommendations WHERE collection_id = $1
            )
            ORDER BY r.id
            "#,
        )
        .bind(collection_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn count_links(&mut self, collection_id: i32) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM collection_recommendations WHERE collection_id = $1",
        )
        .bind(collection_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn recommendations_page(
        &mut self,
        collection_id: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Recommendation>> {
        let rows = sqlx::query_scalar::<_, Recommendation>(
            r#"
            SELECT to_jsonb(r) || to_jsonb(cr)
            FROM recommendations r
            JOIN collection_recommendations cr ON r.id = cr.recommendation_id
            WHERE cr.collection_id = $1
            ORDER BY r.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(collection_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let PgStoreTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
