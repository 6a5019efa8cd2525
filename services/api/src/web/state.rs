//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use crate::auth::JwtResolver;
use crate::config::Config;
use recommendations_core::service::RecommendationService;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The service wraps the process-wide store and upload-URL clients; nothing in
/// here is request-scoped or mutable.
#[derive(Clone)]
pub struct AppState {
    pub service: RecommendationService,
    pub resolver: JwtResolver,
    pub config: Arc<Config>,
}
