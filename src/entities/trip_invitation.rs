//! TripInvitation entity - Entità invito a un viaggio

use super::enums::InvitationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TripInvitation {
    pub invitation_id: i32,
    pub trip_id: i32,
    pub sender_id: i32,   // membro che invita
    pub receiver_id: i32, // utente invitato
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}
