/// API routes and handlers
pub mod admin;
pub mod assets;
pub mod content;
pub mod events;
pub mod extract;
pub mod feedback;
pub mod middleware;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(admin::routes())
        .merge(assets::routes())
        .merge(content::routes())
        .merge(events::routes())
        .merge(feedback::routes())
}
