//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità; la logica
//! transazionale vive in `engine`.

pub mod friend;
pub mod notification;
pub mod trip;
pub mod trip_invitation;

// Re-exports per facilitare l'import
pub use friend::{
    add_friend, get_cooldown_status, list_friends, list_pending_friend_invitations,
    remove_friend, respond_to_friend_invitation,
};
pub use notification::notification_stream;
pub use trip::{create_trip, list_trip_members, remove_trip_member, send_trip_invitation};
pub use trip_invitation::{list_pending_trip_invitations, respond_to_trip_invitation};

use axum::{http::StatusCode, response::IntoResponse};

/// Root endpoint - health check
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
