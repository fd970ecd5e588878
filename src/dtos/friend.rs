//! Friend DTOs - Data Transfer Objects per amicizie e richieste di amicizia

use crate::entities::FriendInvitation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body della POST /friends/invitations
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct AddFriendDTO {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

/// DTO per creare una richiesta di amicizia (interno)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateFriendInvitationDTO {
    pub sender_id: i32,
    pub receiver_id: i32,
    pub created_at: DateTime<Utc>,
}

/// DTO per registrare un cooldown dopo un rifiuto (interno)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateInvitationCooldownDTO {
    pub user_id_1: i32,
    pub user_id_2: i32,
    pub start_cooldown_millis: i64,
    pub cooldown_duration: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FriendInvitationDTO {
    pub invitation_id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
}

impl From<FriendInvitation> for FriendInvitationDTO {
    fn from(value: FriendInvitation) -> Self {
        Self {
            invitation_id: value.invitation_id,
            sender_id: value.sender_id,
            receiver_id: value.receiver_id,
            created_at: value.created_at,
            notification_error: None,
        }
    }
}

/// Un amico visto dal punto di vista dell'utente corrente
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FriendDTO {
    pub user_id: i32,
    pub friends_since: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CooldownStatusDTO {
    pub user_id: i32,
    pub in_cooldown: bool,
}
