//! TripMember entity - Entità membro di un viaggio

use super::enums::TripRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TripMember {
    pub trip_id: i32,
    pub user_id: i32,
    pub role: TripRole,
    pub member_since: DateTime<Utc>,
    // soft delete: la riga resta ma il membro non conta più
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TripMember {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}
