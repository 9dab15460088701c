pub mod auth;
pub mod config;
pub mod repository;
pub mod routes;
pub mod status;
pub mod store;

pub use auth::TokenVerifier;
pub use routes::app_router;
pub use store::ProjectStore;

/// Shared application state for handlers and middleware.
pub struct AppState {
    pub store: ProjectStore,
    pub token_verifier: TokenVerifier,
    /// Optional bearer token for the /status endpoint; None disables it.
    pub status_auth_token: Option<String>,
}
