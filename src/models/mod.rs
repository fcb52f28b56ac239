pub mod collection;
pub mod pagination;
pub mod response;

pub use collection::{
    Collection, CollectionRecommendation, CollectionWithRecommendations, NewCollection,
    Recommendation,
};
pub use pagination::{PageQuery, Pagination, RecommendationPage};
pub use response::ApiResponse;
