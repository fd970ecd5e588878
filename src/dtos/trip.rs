//! Trip DTOs - Data Transfer Objects per viaggi e membri

use crate::entities::{Trip, TripMember, TripRole, TripStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body della POST /trips
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateTripDTO {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TripDTO {
    pub trip_id: i32,
    pub title: String,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Trip> for TripDTO {
    fn from(value: Trip) -> Self {
        Self {
            trip_id: value.trip_id,
            title: value.title,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

/// DTO per creare un membro (interno, usato dai repository)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateTripMemberDTO {
    pub trip_id: i32,
    pub user_id: i32,
    pub role: TripRole,
    pub member_since: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TripMemberDTO {
    pub trip_id: i32,
    pub user_id: i32,
    pub role: TripRole,
    pub member_since: DateTime<Utc>,
}

impl From<TripMember> for TripMemberDTO {
    fn from(value: TripMember) -> Self {
        Self {
            trip_id: value.trip_id,
            user_id: value.user_id,
            role: value.role,
            member_since: value.member_since,
        }
    }
}
