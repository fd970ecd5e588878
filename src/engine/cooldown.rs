//! Cooldown policy - Finestra in cui due utenti non possono reinviarsi richieste di amicizia

use crate::dtos::CreateInvitationCooldownDTO;
use crate::entities::{InvitationCooldown, canonical_pair};
use std::time::Duration;

pub const DEFAULT_COOLDOWN_SECS: u64 = 24 * 60 * 60;

/// Durata fissa, uguale per ogni rifiuto indipendentemente da quelli precedenti
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    duration_millis: i64,
}

impl CooldownPolicy {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration_millis: i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn duration_millis(&self) -> i64 {
        self.duration_millis
    }

    /// Riga da inserire quando un invito tra `a` e `b` viene rifiutato all'istante `now_millis`
    pub fn record(&self, user_a: i32, user_b: i32, now_millis: i64) -> CreateInvitationCooldownDTO {
        let (user_id_1, user_id_2) = canonical_pair(user_a, user_b);
        CreateInvitationCooldownDTO {
            user_id_1,
            user_id_2,
            start_cooldown_millis: now_millis,
            cooldown_duration: self.duration_millis,
        }
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_COOLDOWN_SECS))
    }
}

/// Valuta l'ultimo cooldown della coppia: nessuna riga, nessun cooldown
pub fn is_cooling_down(latest: Option<&InvitationCooldown>, now_millis: i64) -> bool {
    latest.is_some_and(|cooldown| cooldown.is_active_at(now_millis))
}
