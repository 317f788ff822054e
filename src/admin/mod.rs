//! Admin API: catalog maintenance and contribution review.
//!
//! Every route sits behind [`auth::admin_auth_middleware`]. Handlers pass the
//! backend admin secret from config to the procedures; it never appears in
//! responses.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/gifts", get(list_gifts).post(upsert_gift))
        .route("/admin/gifts/{id}", delete(delete_gift))
        .route("/admin/gifts/{id}/clear-reservation", post(clear_reservation))
        .route("/admin/gifts/{id}/status", put(update_gift_status))
        .route("/admin/pix-donations", get(list_donations))
        .route("/admin/pix-donations/{id}/status", put(update_donation_status))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
