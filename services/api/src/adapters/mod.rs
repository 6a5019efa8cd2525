pub mod s3;
pub mod store;

pub use s3::S3UrlIssuer;
pub use store::PgStore;
