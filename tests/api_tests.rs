use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use collections_api::db::MemoryStore;
use collections_api::routes::{create_router, AppState};

const BASE: &str = "/api/collections";

/// Store with users 5 and 6, five recommendations owned by 5 and one by 6
async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_user(5).await;
    store.add_user(6).await;
    for (id, owner, title) in [
        (10, 5, "Dune"),
        (11, 5, "Emma"),
        (12, 5, "Ulysses"),
        (13, 5, "Beloved"),
        (14, 5, "Middlemarch"),
        (20, 6, "Solaris"),
    ] {
        store
            .add_recommendation(json!({ "id": id, "user_id": owner, "title": title }))
            .await
            .unwrap();
    }
    store
}

fn create_test_server(store: &MemoryStore) -> TestServer {
    let state = AppState::new(Arc::new(store.clone()));
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn create_books(server: &TestServer) {
    server
        .post(&format!("{BASE}/createNewCollectionByUserSelection"))
        .json(&json!({ "user_id": 5, "name": "Books", "description": "d" }))
        .await
        .assert_status(StatusCode::CREATED);
}

async fn link(
    server: &TestServer,
    collection_id: i32,
    recommendation_id: i32,
    user_id: i32,
) -> TestResponse {
    server
        .post(&format!("{BASE}/{collection_id}/addRecommendationsToCollection"))
        .json(&json!({ "recommendationId": recommendation_id, "userId": user_id }))
        .await
}

#[tokio::test]
async fn test_health_check() {
    let store = MemoryStore::new();
    let server = create_test_server(&store);
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let store = MemoryStore::new();
    let server = create_test_server(&store);
    let id = "6f1c2d3e-4b5a-4c6d-8e9f-0a1b2c3d4e5f";

    let response = server.get("/health").add_header("x-request-id", id).await;
    response.assert_header("x-request-id", id);

    let generated = server.get("/health").await;
    assert!(generated.maybe_header("x-request-id").is_some());
}

#[tokio::test]
async fn test_create_collection() {
    let store = seeded_store().await;
    let server = create_test_server(&store);

    let response = server
        .post(&format!("{BASE}/createNewCollectionByUserSelection"))
        .json(&json!({ "user_id": 5, "name": "Books", "description": "d" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "Successfully created a new collection");
    assert_eq!(body["data"]["name"], "Books");
    assert_eq!(body["data"]["user_id"], 5);
    assert_eq!(body["data"]["description"], "d");
}

#[tokio::test]
async fn test_create_second_collection_conflicts() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    // every insert reuses the same primary key
    let response = server
        .post(&format!("{BASE}/createNewCollectionByUserSelection"))
        .json(&json!({ "user_id": 5, "name": "Films", "description": null }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["status"], false);
    assert_eq!(
        body["message"],
        "A collection with the same name already exists.(duplicate key value violates unique constraint)"
    );
}

#[tokio::test]
async fn test_create_collection_for_unknown_user() {
    let store = seeded_store().await;
    let server = create_test_server(&store);

    let response = server
        .post(&format!("{BASE}/createNewCollectionByUserSelection"))
        .json(&json!({ "user_id": 99, "name": "Books", "description": "d" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body, json!({ "status": false, "message": "Invalid user ID provided." }));
}

#[tokio::test]
async fn test_add_recommendation() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    let response = link(&server, 1, 10, 5).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Recommendation added to collection successfully");
    assert_eq!(body["data"], json!({ "collection_id": 1, "recommendation_id": 10 }));
}

#[tokio::test]
async fn test_add_recommendation_to_foreign_collection() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    let response = link(&server, 1, 20, 6).await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({ "error": "Collection not found or does not belong to the user" })
    );
    assert!(store.links().await.is_empty());
}

#[tokio::test]
async fn test_add_foreign_recommendation() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    let response = link(&server, 1, 20, 5).await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body, json!({ "error": "Recommendation does not belong to the user" }));
}

#[tokio::test]
async fn test_add_duplicate_recommendation() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;
    link(&server, 1, 10, 5).await.assert_status(StatusCode::CREATED);

    let response = link(&server, 1, 10, 5).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body, json!({ "error": "Recommendation already exists in the collection" }));
    assert_eq!(store.links().await.len(), 1);
}

#[tokio::test]
async fn test_remove_recommendation() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;
    link(&server, 1, 10, 5).await.assert_status(StatusCode::CREATED);

    let response = server
        .delete(&format!("{BASE}/1/removeRecommendationsFromcollection/10"))
        .json(&json!({ "userId": 5 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({ "status": true, "message": "Recommendation removed from collection successfully" })
    );
    assert!(store.links().await.is_empty());
}

#[tokio::test]
async fn test_remove_unlinked_recommendation() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    let response = server
        .delete(&format!("{BASE}/1/removeRecommendationsFromcollection/10"))
        .json(&json!({ "userId": 5 }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body, json!({ "error": "Recommendation not found in the collection" }));
}

#[tokio::test]
async fn test_view_collections_with_recommendations() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;
    link(&server, 1, 10, 5).await.assert_status(StatusCode::CREATED);
    link(&server, 1, 11, 5).await.assert_status(StatusCode::CREATED);

    let response = server
        .get(&format!("{BASE}/5/viewRecommendationsFromcollections"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Books");
    assert_eq!(data[0]["recommendations"].as_array().unwrap().len(), 2);
    assert_eq!(data[0]["recommendations"][0]["title"], "Dune");
}

#[tokio::test]
async fn test_view_collections_all_empty() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    let response = server
        .get(&format!("{BASE}/5/viewRecommendationsFromcollections"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["status"], false);
    assert_eq!(
        body["message"],
        "Error: Failed to fetch recommendation from collections as per provided details please give correct userId"
    );
}

#[tokio::test]
async fn test_view_collections_unknown_user() {
    let store = seeded_store().await;
    let server = create_test_server(&store);

    let response = server
        .get(&format!("{BASE}/6/viewRecommendationsFromcollections"))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body, json!({ "error": "No collections found for this user" }));
}

#[tokio::test]
async fn test_delete_collection_without_links_fails_and_keeps_row() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    let response = server
        .delete(&format!("{BASE}/5/deletecollectionAndrecommendationsByUser/1"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({ "status": false, "message": "Error: Failed to delete collection" })
    );
    assert_eq!(store.collections().await.len(), 1);
}

#[tokio::test]
async fn test_delete_collection_with_links() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;
    link(&server, 1, 10, 5).await.assert_status(StatusCode::CREATED);

    let response = server
        .delete(&format!("{BASE}/5/deletecollectionAndrecommendationsByUser/1"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({ "status": true, "message": "Collection deleted successfully" })
    );
    assert!(store.collections().await.is_empty());
    assert!(store.links().await.is_empty());
}

#[tokio::test]
async fn test_delete_foreign_collection() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    let response = server
        .delete(&format!("{BASE}/6/deletecollectionAndrecommendationsByUser/1"))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination_first_page() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;
    for id in 10..=14 {
        link(&server, 1, id, 5).await.assert_status(StatusCode::CREATED);
    }

    let response = server
        .get(&format!("{BASE}/5/paginationViewAsPerUser/1/recommendations"))
        .add_query_param("page", 1)
        .add_query_param("limit", 2)
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "successfully created the pagination view");
    assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["recommendations"][0]["collection_id"], 1);
    assert_eq!(
        body["data"]["pagination"],
        json!({ "totalRecommendations": 5, "totalPages": 3, "currentPage": 1, "limit": 2 })
    );
}

#[tokio::test]
async fn test_pagination_defaults() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;
    for id in 10..=14 {
        link(&server, 1, id, 5).await.assert_status(StatusCode::CREATED);
    }

    let response = server
        .get(&format!("{BASE}/5/paginationViewAsPerUser/1/recommendations"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 5);
    assert_eq!(
        body["data"]["pagination"],
        json!({ "totalRecommendations": 5, "totalPages": 1, "currentPage": 1, "limit": 10 })
    );
}

#[tokio::test]
async fn test_pagination_out_of_range_page_fails() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;
    for id in 10..=14 {
        link(&server, 1, id, 5).await.assert_status(StatusCode::CREATED);
    }

    let response = server
        .get(&format!("{BASE}/5/paginationViewAsPerUser/1/recommendations"))
        .add_query_param("page", 100)
        .add_query_param("limit", 10)
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({ "status": false, "message": "Error: Something went wrong while viewing the pagination" })
    );
}

#[tokio::test]
async fn test_pagination_page_zero_is_classified() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;
    link(&server, 1, 10, 5).await.assert_status(StatusCode::CREATED);

    let response = server
        .get(&format!("{BASE}/5/paginationViewAsPerUser/1/recommendations"))
        .add_query_param("page", 0)
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "An unexpected error occurred. Please try again later."
    );
}

#[tokio::test]
async fn test_pagination_foreign_collection() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    let response = server
        .get(&format!("{BASE}/6/paginationViewAsPerUser/1/recommendations"))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination_with_largest_limit() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;
    link(&server, 1, 10, 5).await.assert_status(StatusCode::CREATED);

    let response = server
        .get(&format!("{BASE}/5/paginationViewAsPerUser/1/recommendations"))
        .add_query_param("limit", i64::MAX)
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["pagination"]["totalPages"], 1);
    assert_eq!(body["data"]["pagination"]["limit"], i64::MAX);
}

#[tokio::test]
async fn test_create_collection_missing_name_is_classified() {
    let store = seeded_store().await;
    let server = create_test_server(&store);

    let response = server
        .post(&format!("{BASE}/createNewCollectionByUserSelection"))
        .json(&json!({ "user_id": 5, "description": "d" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({ "status": false, "message": "An unexpected error occurred. Please try again later." })
    );
    assert!(store.collections().await.is_empty());
}

#[tokio::test]
async fn test_non_numeric_path_id_is_classified() {
    let store = seeded_store().await;
    let server = create_test_server(&store);

    let response = server
        .get(&format!("{BASE}/abc/viewRecommendationsFromcollections"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({ "status": false, "message": "An unexpected error occurred. Please try again later." })
    );
}

#[tokio::test]
async fn test_non_numeric_page_query_is_classified() {
    let store = seeded_store().await;
    let server = create_test_server(&store);
    create_books(&server).await;

    let response = server
        .get(&format!("{BASE}/5/paginationViewAsPerUser/1/recommendations"))
        .add_query_param("limit", "ten")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["status"], false);
}
