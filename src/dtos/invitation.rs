//! Invitation DTOs - Azioni e risposte comuni a inviti di viaggio e di amicizia

use crate::entities::InvitationStatus;
use serde::{Deserialize, Serialize};

/// Azione dal path `/{invitation_id}/{action}`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvitationAction {
    Accept,
    Deny,
    Withdraw,
}

/// Esito di accept/deny/withdraw: la riga non esiste più, resta solo lo stato finale
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InvitationResolutionDTO {
    pub invitation_id: i32,
    pub status: InvitationStatus,
}
