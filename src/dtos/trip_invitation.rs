//! Trip invitation DTOs - Data Transfer Objects per inviti ai viaggi

use crate::entities::{InvitationStatus, TripInvitation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body della POST /trips/{trip_id}/invitations
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SendTripInvitationDTO {
    #[validate(range(min = 1, message = "receiver_id must be a positive id"))]
    pub receiver_id: i32,
}

/// DTO per creare un nuovo invito (senza invitation_id e status)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateTripInvitationDTO {
    pub trip_id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TripInvitationDTO {
    pub invitation_id: i32,
    pub trip_id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    /// Valorizzato quando l'invito è salvato ma la notifica non è partita
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
}

impl From<TripInvitation> for TripInvitationDTO {
    fn from(value: TripInvitation) -> Self {
        Self {
            invitation_id: value.invitation_id,
            trip_id: value.trip_id,
            sender_id: value.sender_id,
            receiver_id: value.receiver_id,
            status: value.status,
            created_at: value.created_at,
            notification_error: None,
        }
    }
}
