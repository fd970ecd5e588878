//! Enumerazioni - Tipi enumerati utilizzati nelle entità

use serde::{Deserialize, Serialize};

// ********************* ENUMERAZIONI UTILI **********************//

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "trip_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripRole {
    Administrator,
    Staff,
    NormalUser,
}

/// Stato del viaggio, aggiornato da un job esterno. Per gli inviti conta solo
/// la riga del viaggio, usata come bersaglio del lock.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    NotStarted,
    Ongoing,
    Ended,
}

/// Solo `Pending` viene salvato su db: gli altri stati esistono come assenza
/// della riga (cancellata) più l'effetto già applicato.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Denied,
    Withdrawn,
}
