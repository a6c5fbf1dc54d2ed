use axum::Router;
use sqlx::PgPool;

use crate::Config;

mod health;
mod stream;

// ---

pub fn router(pool: PgPool, config: Config) -> Router {
    // ---
    Router::new()
        .merge(stream::router())
        .merge(health::router())
        .with_state((pool, config))
}
