use tracing::instrument;

use crate::{
    db::{CollectionStore, Mutation, StoreTx},
    error::{AppError, AppResult},
    models::{
        Collection, CollectionRecommendation, CollectionWithRecommendations, NewCollection,
        PageQuery, Pagination, RecommendationPage,
    },
};

pub const COLLECTION_NOT_OWNED: &str = "Collection not found or does not belong to the user";
pub const RECOMMENDATION_NOT_OWNED: &str = "Recommendation does not belong to the user";
pub const RECOMMENDATION_ALREADY_LINKED: &str = "Recommendation already exists in the collection";
pub const RECOMMENDATION_NOT_LINKED: &str = "Recommendation not found in the collection";
pub const NO_COLLECTIONS: &str = "No collections found for this user";

pub const CREATE_FAILED: &str = "Error: Failed creating a new collection";
pub const ADD_FAILED: &str = "Error: Failed to add recommendation to collection";
pub const REMOVE_FAILED: &str = "Error: Failed to remove Recommendation from collection";
pub const VIEW_FAILED: &str = "Error: Failed to fetch recommendation from collections as per provided details please give correct userId";
pub const DELETE_FAILED: &str = "Error: Failed to delete collection";
pub const PAGE_FAILED: &str = "Error: Something went wrong while viewing the pagination";

/// Loads the collection, failing with 404 unless `user_id` owns it
async fn owned_collection(
    tx: &mut dyn StoreTx,
    collection_id: i32,
    user_id: i32,
) -> AppResult<Collection> {
    tx.find_owned_collection(collection_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(COLLECTION_NOT_OWNED.to_string()))
}

/// Fails with 403 unless `user_id` owns the recommendation
async fn ensure_recommendation_owned(
    tx: &mut dyn StoreTx,
    recommendation_id: i32,
    user_id: i32,
) -> AppResult<()> {
    if tx.recommendation_owned_by(recommendation_id, user_id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(RECOMMENDATION_NOT_OWNED.to_string()))
    }
}

/// Creates a collection for `new_collection.user_id`.
///
/// Constraint violations (duplicate name or id, unknown user) come back as
/// store errors and are classified when turned into a response.
#[instrument(skip(store, new_collection), fields(user_id = new_collection.user_id))]
pub async fn create_collection(
    store: &dyn CollectionStore,
    new_collection: NewCollection,
) -> AppResult<Collection> {
    let mut tx = store.begin().await?;

    let collection = tx
        .insert_collection(&new_collection)
        .await?
        .applied_or(CREATE_FAILED)?;

    tx.commit().await?;

    tracing::info!(collection_id = collection.id, "Collection created");
    Ok(collection)
}

/// Links a recommendation to a collection after checking, in order, that the
/// user owns the collection (404), owns the recommendation (403) and that
/// the pair is not linked yet (409).
#[instrument(skip(store))]
pub async fn add_recommendation(
    store: &dyn CollectionStore,
    collection_id: i32,
    recommendation_id: i32,
    user_id: i32,
) -> AppResult<CollectionRecommendation> {
    let mut tx = store.begin().await?;

    owned_collection(tx.as_mut(), collection_id, user_id).await?;
    ensure_recommendation_owned(tx.as_mut(), recommendation_id, user_id).await?;

    if tx.find_link(collection_id, recommendation_id).await?.is_some() {
        return Err(AppError::Conflict(RECOMMENDATION_ALREADY_LINKED.to_string()));
    }

    let link = tx
        .insert_link(collection_id, recommendation_id)
        .await?
        .applied_or(ADD_FAILED)?;

    tx.commit().await?;

    tracing::info!("Recommendation added to collection");
    Ok(link)
}

/// Unlinks a recommendation from a collection. Same ownership checks as
/// [`add_recommendation`], but the link has to exist (404).
#[instrument(skip(store))]
pub async fn remove_recommendation(
    store: &dyn CollectionStore,
    collection_id: i32,
    recommendation_id: i32,
    user_id: i32,
) -> AppResult<()> {
    let mut tx = store.begin().await?;

    owned_collection(tx.as_mut(), collection_id, user_id).await?;
    ensure_recommendation_owned(tx.as_mut(), recommendation_id, user_id).await?;

    if tx.find_link(collection_id, recommendation_id).await?.is_none() {
        return Err(AppError::NotFound(RECOMMENDATION_NOT_LINKED.to_string()));
    }

    tx.delete_link(collection_id, recommendation_id)
        .await?
        .applied_or(REMOVE_FAILED)?;

    tx.commit().await?;

    tracing::info!("Recommendation removed from collection");
    Ok(())
}

/// Every collection of the user that holds at least one recommendation.
///
/// Empty collections are left out. A user with no collections at all is a
/// 404; a user whose collections are all empty is a soft failure.
#[instrument(skip(store))]
pub async fn collections_with_recommendations(
    store: &dyn CollectionStore,
    user_id: i32,
) -> AppResult<Vec<CollectionWithRecommendations>> {
    let mut tx = store.begin().await?;

    let collections = tx.collections_for_user(user_id).await?;
    if collections.is_empty() {
        return Err(AppError::NotFound(NO_COLLECTIONS.to_string()));
    }

    let mut populated = Vec::with_capacity(collections.len());
    for collection in collections {
        let recommendations = tx.recommendations_in_collection(collection.id).await?;
        if !recommendations.is_empty() {
            populated.push(CollectionWithRecommendations {
                collection,
                recommendations,
            });
        }
    }

    tx.commit().await?;

    tracing::info!(populated = populated.len(), "Fetched collections");

    if populated.is_empty() {
        return Err(AppError::Unfulfilled(VIEW_FAILED.to_string()));
    }
    Ok(populated)
}

/// Deletes a collection's links, then the collection itself.
///
/// The collection row is only removed when at least one link was removed
/// first, so a collection without links is never deleted and the call fails.
/// Any failure leaves both tables untouched.
#[instrument(skip(store))]
pub async fn delete_collection(
    store: &dyn CollectionStore,
    user_id: i32,
    collection_id: i32,
) -> AppResult<()> {
    let mut tx = store.begin().await?;

    owned_collection(tx.as_mut(), collection_id, user_id).await?;

    let removed = match tx.delete_links_for_collection(collection_id).await? {
        Mutation::Applied(links) => {
            tracing::debug!(links, "Removed collection links");
            tx.delete_collection(collection_id, user_id).await?
        }
        Mutation::NoRows => Mutation::NoRows,
    };

    removed.applied_or(DELETE_FAILED)?;

    tx.commit().await?;

    tracing::info!("Collection deleted");
    Ok(())
}

/// One page of a collection's recommendations with pagination metadata.
///
/// An empty page is reported as a soft failure, including pages past the end.
#[instrument(skip(store))]
pub async fn recommendation_page(
    store: &dyn CollectionStore,
    user_id: i32,
    collection_id: i32,
    query: PageQuery,
) -> AppResult<RecommendationPage> {
    let mut tx = store.begin().await?;

    owned_collection(tx.as_mut(), collection_id, user_id).await?;

    let total = tx.count_links(collection_id).await?;
    let recommendations = tx
        .recommendations_page(collection_id, query.limit, query.offset())
        .await?;

    tx.commit().await?;

    if recommendations.is_empty() {
        return Err(AppError::Unfulfilled(PAGE_FAILED.to_string()));
    }

    Ok(RecommendationPage {
        recommendations,
        pagination: Pagination::new(total, &query),
    })
}
