use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, services};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt_secret: String,
}

pub fn app(state: AppState) -> Router {
    let protected = Router::<AppState>::new()
        .route(
            "/shoes",
            get(services::list_shoes_handler).post(services::create_shoe_handler),
        )
        .route(
            "/shoes/{id}",
            patch(services::patch_shoe_handler).delete(services::delete_shoe_handler),
        )
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
