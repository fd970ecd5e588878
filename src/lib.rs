//! Server library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod engine;
pub mod entities;
pub mod notifications;
pub mod repositories;
pub mod services;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, EngineOptions, auth, config};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use repositories::UnitOfWork;
use std::sync::Arc;

/// Crea il router principale dell'applicazione
pub fn create_router<U: UnitOfWork>(state: Arc<AppState<U>>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/trips", configure_trip_routes(state.clone()))
        .nest(
            "/trip-invitations",
            configure_trip_invitation_routes(state.clone()),
        )
        .nest("/friends", configure_friend_routes(state.clone()))
        .nest("/notifications", configure_notification_routes(state.clone()))
        .with_state(state)
}

/// Configura le routes per viaggi, membri e invio inviti
fn configure_trip_routes<U: UnitOfWork>(state: Arc<AppState<U>>) -> Router<Arc<AppState<U>>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", post(create_trip::<U>))
        .route("/{trip_id}/members", get(list_trip_members::<U>))
        .route(
            "/{trip_id}/members/{user_id}",
            delete(remove_trip_member::<U>),
        )
        .route("/{trip_id}/invitations", post(send_trip_invitation::<U>))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware::<U>,
        ))
}

/// Configura le routes per gli inviti ricevuti
fn configure_trip_invitation_routes<U: UnitOfWork>(
    state: Arc<AppState<U>>,
) -> Router<Arc<AppState<U>>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/pending", get(list_pending_trip_invitations::<U>))
        .route(
            "/{invitation_id}/{action}",
            post(respond_to_trip_invitation::<U>),
        )
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware::<U>,
        ))
}

/// Configura le routes per amicizie e richieste di amicizia
fn configure_friend_routes<U: UnitOfWork>(state: Arc<AppState<U>>) -> Router<Arc<AppState<U>>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_friends::<U>))
        .route("/invitations", post(add_friend::<U>))
        .route(
            "/invitations/pending",
            get(list_pending_friend_invitations::<U>),
        )
        .route(
            "/invitations/{invitation_id}/{action}",
            post(respond_to_friend_invitation::<U>),
        )
        .route("/{user_id}", delete(remove_friend::<U>))
        .route("/{user_id}/cooldown", get(get_cooldown_status::<U>))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware::<U>,
        ))
}

/// Configura lo stream delle notifiche
fn configure_notification_routes<U: UnitOfWork>(
    state: Arc<AppState<U>>,
) -> Router<Arc<AppState<U>>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/stream", get(notification_stream::<U>))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware::<U>,
        ))
}
