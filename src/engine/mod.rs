//! Engine - Logica transazionale di membership, inviti ai viaggi e amicizie
//!
//! I servizi non conoscono axum: ricevono id già autenticati e un `RequestContext`,
//! aprono una Unit of Work, fanno commit e solo dopo inviano le notifiche.

pub mod clock;
pub mod context;
pub mod cooldown;
pub mod error;
pub mod friend;
pub mod membership;
pub mod trip_invitation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::RequestContext;
pub use cooldown::{CooldownPolicy, DEFAULT_COOLDOWN_SECS};
pub use error::ErrorCode;
pub use friend::FriendEngine;
pub use membership::MembershipEngine;
pub use trip_invitation::TripInvitationEngine;

use crate::notifications::NotifyError;

/// Risultato di un'operazione già committata, con l'esito della notifica successiva.
///
/// Una notifica fallita non rende fallita l'operazione: i dati restano salvati.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub value: T,
    pub notification: Result<(), NotifyError>,
}

impl<T> Committed<T> {
    pub fn notification_error(&self) -> Option<ErrorCode> {
        self.notification
            .as_ref()
            .err()
            .map(|_| ErrorCode::NotificationFailed)
    }
}
