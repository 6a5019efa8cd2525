pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::{require_auth, UserId};
pub use rest::{
    create_recommendation_handler, delete_recommendation_handler, get_recommendation_handler,
    list_recommendations_handler, prepare_attachment_handler, update_recommendation_handler,
};
