//! Verification Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::mail::MailTransport;
use sqlx::PgPool;
use std::sync::Arc;

use crate::application::config::VerificationConfig;
use crate::domain::repository::{
    ItemRepository, ItemStores, Notifier, UserDirectory, VerificationLogRepository,
    VerificationRequestRepository,
};
use crate::domain::services::{RandomTokenIssuer, SystemClock};
use crate::infra::items::{PgItemRepository, pg_item_stores};
use crate::infra::notifier::EmailNotifier;
use crate::infra::postgres::{PgUserDirectory, PgVerificationRepository};
use crate::presentation::handlers::{self, VerificationAppState};
use crate::presentation::middleware::require_identity;

/// Create the verification router on PostgreSQL, sending mail through
/// `transport`
pub fn verification_router<T>(pool: PgPool, transport: T, config: VerificationConfig) -> Router
where
    T: MailTransport + Send + Sync + 'static,
{
    let config = Arc::new(config);
    let items: ItemStores<PgItemRepository> = pg_item_stores(&pool);

    let state = VerificationAppState {
        repo: Arc::new(PgVerificationRepository::new(pool.clone())),
        items: Arc::new(items),
        users: Arc::new(PgUserDirectory::new(pool)),
        notifier: Arc::new(EmailNotifier::new(transport, config.clone())),
        clock: Arc::new(SystemClock),
        tokens: Arc::new(RandomTokenIssuer::new(config.token_bytes)),
        config,
    };

    verification_router_generic(state)
}

/// Create a generic verification router for any set of implementations
pub fn verification_router_generic<R, I, U, N>(state: VerificationAppState<R, I, U, N>) -> Router
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync + 'static,
    I: ItemRepository + Send + Sync + 'static,
    U: UserDirectory + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    if !state.items.is_complete() {
        tracing::error!("Item store missing for at least one item kind; those requests will fail");
    }

    let owner_routes = Router::new()
        .route("/requests", post(handlers::create_request::<R, I, U, N>))
        .route(
            "/requests/{id}/timeline",
            get(handlers::request_timeline::<R, I, U, N>),
        )
        .route(
            "/items/{kind}/{id}/history",
            get(handlers::item_history::<R, I, U, N>),
        )
        .route(
            "/items/{kind}/{id}/withdraw",
            post(handlers::withdraw_pending::<R, I, U, N>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.config.clone(),
            require_identity,
        ));

    let token_routes = Router::new()
        .route("/token/{token}", get(handlers::review_by_token::<R, I, U, N>))
        .route("/token/{token}/approve", post(handlers::approve::<R, I, U, N>))
        .route("/token/{token}/reject", post(handlers::reject::<R, I, U, N>));

    owner_routes.merge(token_routes).with_state(state)
}
