//! Friend entities - Amicizie, richieste di amicizia e cooldown

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relazione simmetrica: salvata con `user_id_1 < user_id_2`, ma le query
/// controllano sempre entrambi gli ordinamenti.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Friend {
    pub user_id_1: i32,
    pub user_id_2: i32,
    pub created_at: DateTime<Utc>,
}

impl Friend {
    /// Restituisce l'altro utente della coppia, se `user_id` ne fa parte
    pub fn other_than(&self, user_id: i32) -> Option<i32> {
        if self.user_id_1 == user_id {
            Some(self.user_id_2)
        } else if self.user_id_2 == user_id {
            Some(self.user_id_1)
        } else {
            None
        }
    }
}

/// Richiesta di amicizia: non ha stato, finché la riga esiste è pendente.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FriendInvitation {
    pub invitation_id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub created_at: DateTime<Utc>,
}

impl FriendInvitation {
    pub fn involves(&self, a: i32, b: i32) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Cooldown creato a ogni rifiuto. Mai aggiornato: conta solo l'ultimo
/// inserito per la coppia.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct InvitationCooldown {
    pub cooldown_id: i32,
    pub user_id_1: i32,
    pub user_id_2: i32,
    pub start_cooldown_millis: i64,
    pub cooldown_duration: i64, // millisecondi
}

impl InvitationCooldown {
    pub fn ends_at_millis(&self) -> i64 {
        self.start_cooldown_millis.saturating_add(self.cooldown_duration)
    }

    /// Attivo su `[start, start + duration)`
    pub fn is_active_at(&self, now_millis: i64) -> bool {
        now_millis < self.ends_at_millis()
    }
}

/// Coppia canonica (min, max) per confronti simmetrici
pub fn canonical_pair(a: i32, b: i32) -> (i32, i32) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cooldown(start: i64, duration: i64) -> InvitationCooldown {
        InvitationCooldown {
            cooldown_id: 1,
            user_id_1: 1,
            user_id_2: 2,
            start_cooldown_millis: start,
            cooldown_duration: duration,
        }
    }

    #[test]
    fn test_cooldown_window_is_half_open() {
        let c = cooldown(1_000, 500);
        assert!(c.is_active_at(1_000));
        assert!(c.is_active_at(1_499));
        assert!(!c.is_active_at(1_500));
        assert!(!c.is_active_at(10_000));
    }

    #[test]
    fn test_canonical_pair_and_involves() {
        assert_eq!(canonical_pair(7, 3), (3, 7));
        assert_eq!(canonical_pair(3, 7), (3, 7));

        let inv = FriendInvitation {
            invitation_id: 1,
            sender_id: 4,
            receiver_id: 9,
            created_at: Utc::now(),
        };
        assert!(inv.involves(4, 9));
        assert!(inv.involves(9, 4));
        assert!(!inv.involves(4, 5));
    }

    #[test]
    fn test_friend_other_than() {
        let f = Friend {
            user_id_1: 2,
            user_id_2: 5,
            created_at: Utc::now(),
        };
        assert_eq!(f.other_than(2), Some(5));
        assert_eq!(f.other_than(5), Some(2));
        assert_eq!(f.other_than(3), None);
    }
}
