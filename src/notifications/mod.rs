//! Notifications - Eventi consegnati agli utenti dopo il commit
//!
//! Il dispatch avviene sempre fuori dalla transazione: un fallimento viene loggato
//! e riportato al chiamante, ma non annulla mai i dati già salvati.

pub mod hub;

pub use hub::NotificationHub;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    TripInvitation {
        invitation_id: i32,
        sender_id: i32,
    },
    FriendInvitation {
        invitation_id: i32,
        sender_id: i32,
    },
    FriendInvitationAccepted {
        friend_id: i32,
    },
}

impl Notification {
    /// Nome dell'evento, usato anche come `event:` nello stream SSE
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::TripInvitation { .. } => "trip_invitation",
            Notification::FriendInvitation { .. } => "friend_invitation",
            Notification::FriendInvitationAccepted { .. } => "friend_invitation_accepted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notification dispatch is not available")]
    Unavailable,
}

/// Canale di consegna delle notifiche.
///
/// Sincrono e fire-and-forget: chi implementa non deve bloccare.
pub trait Notifier: Send + Sync {
    fn notify(&self, receiver_id: i32, notification: Notification) -> Result<(), NotifyError>;

    fn send_trip_invitation_notification(
        &self,
        receiver_id: i32,
        sender_id: i32,
        invitation_id: i32,
    ) -> Result<(), NotifyError> {
        self.notify(
            receiver_id,
            Notification::TripInvitation {
                invitation_id,
                sender_id,
            },
        )
    }

    fn send_friend_invitation_notification(
        &self,
        receiver_id: i32,
        sender_id: i32,
        invitation_id: i32,
    ) -> Result<(), NotifyError> {
        self.notify(
            receiver_id,
            Notification::FriendInvitation {
                invitation_id,
                sender_id,
            },
        )
    }

    fn send_friend_accepted_notification(
        &self,
        sender_id: i32,
        friend_id: i32,
    ) -> Result<(), NotifyError> {
        self.notify(sender_id, Notification::FriendInvitationAccepted { friend_id })
    }
}
