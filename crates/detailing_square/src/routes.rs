// --- File: crates/detailing_square/src/routes.rs ---

use crate::api::SquareApi;
use crate::handlers::{
    create_card_handler, create_payment_handler, list_payments_handler,
    list_team_members_handler, upsert_customer_handler, SquareState,
};
use axum::{
    routing::{get, post},
    Router,
};
use detailing_admin::SessionGuard;
use std::sync::Arc;

/// Creates a router containing the Square pass-through routes.
pub fn routes(square: Arc<dyn SquareApi>, guard: Arc<SessionGuard>) -> Router {
    let square_state = Arc::new(SquareState { square, guard });

    Router::new()
        .route("/cards", post(create_card_handler))
        .route(
            "/payments",
            post(create_payment_handler).get(list_payments_handler),
        )
        .route("/customers", post(upsert_customer_handler))
        .route("/square/team-members", get(list_team_members_handler))
        .with_state(square_state)
}
