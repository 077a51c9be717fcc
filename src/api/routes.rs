use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::handlers::{
    AppState,
    admin::admin_reconcile,
    entities::{create_entity, delete_entity, get_entity, list_entities},
    ratings::{
        delete_rating, get_average, get_rating, get_summaries, list_ratings, recompute,
        record_rating, update_rating,
    },
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/entities/:kind", get(list_entities).post(create_entity))
        .route("/api/entities/:kind/:id", get(get_entity).delete(delete_entity))
        .route("/api/entities/:kind/:id/ratings", get(list_ratings).post(record_rating))
        .route("/api/entities/:kind/:id/average", get(get_average))
        .route("/api/entities/:kind/:id/recompute", post(recompute))
        .route("/api/summaries/:kind", get(get_summaries))
        .route("/api/ratings/:id", get(get_rating).put(update_rating).delete(delete_rating))
        .route("/api/admin/reconcile", post(admin_reconcile))
        .with_state(state)
}
