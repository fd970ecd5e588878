//! ErrorCode - Tassonomia chiusa degli esiti di errore dei servizi
//!
//! I servizi restituiscono solo questi codici, mai errori grezzi del database.
//! La traduzione in risposta HTTP (`core::error`) è un `match` esaustivo: un codice
//! nuovo non compila finché non ha il suo status.

use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Attore non autorizzato, oppure invito non più in uno stato azionabile
    #[error("FORBIDDEN")]
    Forbidden,
    #[error("TRIP_NOT_FOUND")]
    TripNotFound,
    #[error("USER_NOT_FOUND")]
    UserNotFound,
    #[error("TRIP_MEMBER_ALREADY_EXISTS")]
    TripMemberAlreadyExists,
    #[error("TRIP_INVITATION_ALREADY_EXISTS")]
    TripInvitationAlreadyExists,
    #[error("FRIEND_INVITATION_NOT_FOUND")]
    FriendInvitationNotFound,
    #[error("ADD_FRIEND_RECEIVER_NOT_FOUND")]
    AddFriendReceiverNotFound,
    #[error("ADD_FRIEND_IN_COOLDOWN")]
    AddFriendInCooldown,
    #[error("ADD_FRIEND_INVITATION_ALREADY_EXISTS")]
    AddFriendInvitationAlreadyExists,
    #[error("ADD_FRIEND_ALREADY_FRIEND")]
    AddFriendAlreadyFriend,
    /// Dati salvati, notifica non consegnata. Non è un fallimento dell'operazione.
    #[error("NOTIFICATION_FAILED")]
    NotificationFailed,
    #[error("REQUEST_TIMEOUT")]
    RequestTimeout,
    #[error("DB_DOWN")]
    DbDown,
    #[error("INTERNAL_SERVER_ERROR")]
    InternalServerError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::TripNotFound => "TRIP_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::TripMemberAlreadyExists => "TRIP_MEMBER_ALREADY_EXISTS",
            ErrorCode::TripInvitationAlreadyExists => "TRIP_INVITATION_ALREADY_EXISTS",
            ErrorCode::FriendInvitationNotFound => "FRIEND_INVITATION_NOT_FOUND",
            ErrorCode::AddFriendReceiverNotFound => "ADD_FRIEND_RECEIVER_NOT_FOUND",
            ErrorCode::AddFriendInCooldown => "ADD_FRIEND_IN_COOLDOWN",
            ErrorCode::AddFriendInvitationAlreadyExists => "ADD_FRIEND_INVITATION_ALREADY_EXISTS",
            ErrorCode::AddFriendAlreadyFriend => "ADD_FRIEND_ALREADY_FRIEND",
            ErrorCode::NotificationFailed => "NOTIFICATION_FAILED",
            ErrorCode::RequestTimeout => "REQUEST_TIMEOUT",
            ErrorCode::DbDown => "DB_DOWN",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Gli errori del database vengono loggati con il dettaglio completo e
/// collassati in un codice generico: al client non arriva nulla di interno.
impl From<sqlx::Error> for ErrorCode {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                error!(error = %err, "Database unavailable");
                ErrorCode::DbDown
            }
            _ => {
                error!(error = %err, "Unexpected database error");
                ErrorCode::InternalServerError
            }
        }
    }
}
