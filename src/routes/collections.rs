use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use super::AppState;
use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{
        ApiResponse, Collection, CollectionRecommendation, CollectionWithRecommendations,
        NewCollection, PageQuery, RecommendationPage,
    },
    services::collections,
};

/// Routes mounted under `/api/collections`
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/createNewCollectionByUserSelection",
            post(create_new_collection),
        )
        .route(
            "/:collection_id/addRecommendationsToCollection",
            post(add_recommendation),
        )
        .route(
            "/:collection_id/removeRecommendationsFromcollection/:recommendation_id",
            delete(remove_recommendation),
        )
        .route(
            "/:user_id/viewRecommendationsFromcollections",
            get(view_collections),
        )
        .route(
            "/:user_id/deletecollectionAndrecommendationsByUser/:collection_id",
            delete(delete_collection),
        )
        .route(
            "/:user_id/paginationViewAsPerUser/:collection_id/recommendations",
            get(paginate_collection),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRecommendationRequest {
    pub recommendation_id: i32,
    pub user_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRecommendationRequest {
    pub user_id: i32,
}

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

/// Handler for collection creation
pub async fn create_new_collection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<NewCollection>, JsonRejection>,
) -> AppResult<Created<Collection>> {
    let Json(request) = body?;
    tracing::info!(
        request_id = %request_id,
        user_id = request.user_id,
        "Creating collection"
    );

    let collection = collections::create_collection(state.store.as_ref(), request).await?;

    Ok(ApiResponse::created(
        "Successfully created a new collection",
        collection,
    ))
}

/// Handler for linking a recommendation to a collection
pub async fn add_recommendation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<AddRecommendationRequest>, JsonRejection>,
) -> AppResult<Created<CollectionRecommendation>> {
    let Path(collection_id) = path?;
    let Json(request) = body?;
    tracing::info!(
        request_id = %request_id,
        collection_id,
        recommendation_id = request.recommendation_id,
        "Adding recommendation to collection"
    );

    let link = collections::add_recommendation(
        state.store.as_ref(),
        collection_id,
        request.recommendation_id,
        request.user_id,
    )
    .await?;

    Ok(ApiResponse::created(
        "Recommendation added to collection successfully",
        link,
    ))
}

/// Handler for unlinking a recommendation from a collection
pub async fn remove_recommendation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<(i32, i32)>, PathRejection>,
    body: Result<Json<RemoveRecommendationRequest>, JsonRejection>,
) -> AppResult<Created<()>> {
    let Path((collection_id, recommendation_id)) = path?;
    let Json(request) = body?;
    tracing::info!(
        request_id = %request_id,
        collection_id,
        recommendation_id,
        "Removing recommendation from collection"
    );

    collections::remove_recommendation(
        state.store.as_ref(),
        collection_id,
        recommendation_id,
        request.user_id,
    )
    .await?;

    Ok(ApiResponse::done(
        "Recommendation removed from collection successfully",
    ))
}

/// Handler listing a user's collections with their recommendations
pub async fn view_collections(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<Created<Vec<CollectionWithRecommendations>>> {
    let Path(user_id) = path?;
    tracing::info!(request_id = %request_id, user_id, "Viewing collections");

    let collections =
        collections::collections_with_recommendations(state.store.as_ref(), user_id).await?;

    Ok(ApiResponse::created(
        "Successfully fetched the collections and their associated recommendations",
        collections,
    ))
}

/// Handler deleting a collection together with its links
pub async fn delete_collection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> AppResult<Created<()>> {
    let Path((user_id, collection_id)) = path?;
    tracing::info!(
        request_id = %request_id,
        user_id,
        collection_id,
        "Deleting collection"
    );

    collections::delete_collection(state.store.as_ref(), user_id, collection_id).await?;

    Ok(ApiResponse::done("Collection deleted successfully"))
}

/// Handler for the paginated view of one collection
pub async fn paginate_collection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<(i32, i32)>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<Created<RecommendationPage>> {
    let Path((user_id, collection_id)) = path?;
    let Query(query) = query?;
    tracing::info!(
        request_id = %request_id,
        user_id,
        collection_id,
        page = query.page,
        limit = query.limit,
        "Viewing collection page"
    );

    let page =
        collections::recommendation_page(state.store.as_ref(), user_id, collection_id, query)
            .await?;

    Ok(ApiResponse::created(
        "successfully created the pagination view",
        page,
    ))
}
