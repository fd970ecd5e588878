//! Trip entity - Entità viaggio

use super::enums::TripStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Trip {
    pub trip_id: i32,
    pub title: String,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
}
