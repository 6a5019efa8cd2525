pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{strip_query, Recommendation, RecommendationUpdate};
pub use ports::{PortError, PortResult, RecommendationStore, UploadUrlIssuer};
pub use service::RecommendationService;
