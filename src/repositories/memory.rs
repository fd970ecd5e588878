//! MemoryStore - Unit of Work in memoria
//!
//! Backend usato in sviluppo (quando `DATABASE_URL` non è impostata) e nei test.
//! Ogni executor prende il lock dell'intero store per tutta la sua durata, quindi
//! le transazioni sono serializzate: più forte di un `SELECT ... FOR UPDATE` per riga,
//! ma con le stesse garanzie osservabili dai servizi.
//!
//! Una transazione lavora su una copia delle tabelle; il commit la sostituisce
//! all'originale, il drop la scarta (rollback).

use super::traits::{
    CooldownRepository, Executor, FriendInvitationRepository, FriendRepository,
    TripInvitationRepository, TripMemberRepository, TripRepository, UnitOfWork, UserRepository,
};
use crate::core::DevUser;
use crate::dtos::{
    CreateFriendInvitationDTO, CreateInvitationCooldownDTO, CreateTripInvitationDTO,
    CreateTripMemberDTO,
};
use crate::entities::{
    Friend, FriendInvitation, InvitationCooldown, InvitationStatus, Trip, TripInvitation,
    TripMember, TripRole, TripStatus, User, canonical_pair,
};
use chrono::{DateTime, Utc};
use sqlx::Error;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// Contenuto delle tabelle, esposto in sola lettura tramite `MemoryStore::snapshot`
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    pub users: BTreeMap<i32, User>,
    pub trips: BTreeMap<i32, Trip>,
    pub trip_members: Vec<TripMember>,
    pub trip_invitations: BTreeMap<i32, TripInvitation>,
    pub friends: Vec<Friend>,
    pub friend_invitations: BTreeMap<i32, FriendInvitation>,
    pub cooldowns: Vec<InvitationCooldown>,
    last_user_id: i32,
    last_trip_id: i32,
    last_trip_invitation_id: i32,
    last_friend_invitation_id: i32,
    last_cooldown_id: i32,
}

impl MemoryTables {
    pub fn live_members(&self, trip_id: i32) -> Vec<&TripMember> {
        self.trip_members
            .iter()
            .filter(|m| m.trip_id == trip_id && m.is_live())
            .collect()
    }

    fn find_live_member(&self, trip_id: i32, user_id: i32) -> Option<&TripMember> {
        self.trip_members
            .iter()
            .find(|m| m.trip_id == trip_id && m.user_id == user_id && m.is_live())
    }
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

fn constraint_violation(message: String) -> Error {
    warn!("{}", message);
    Error::Protocol(message)
}

#[derive(Debug, Default)]
struct Faults {
    fail_next_begin: AtomicBool,
    fail_next_commit: AtomicBool,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<MemoryTables>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copia dello stato corrente (attende eventuali transazioni aperte)
    pub async fn snapshot(&self) -> MemoryTables {
        self.tables.lock().await.clone()
    }

    /// Inserisce un utente con id esplicito (seed per sviluppo e test)
    pub async fn insert_user(&self, user_id: i32, email: &str, username: &str) -> User {
        let mut tables = self.tables.lock().await;
        let user = User {
            user_id,
            email: email.to_string(),
            username: username.to_string(),
        };
        tables.users.insert(user_id, user.clone());
        tables.last_user_id = tables.last_user_id.max(user_id);
        user
    }

    /// Carica gli utenti di sviluppo configurati con `DEV_USERS`
    pub async fn seed_dev_users(&self, users: &[DevUser]) {
        for user in users {
            self.insert_user(user.user_id, &user.email, &user.username)
                .await;
        }
        debug!(count = users.len(), "Dev users loaded");
    }

    /// Inserisce un viaggio con id esplicito e il suo amministratore
    pub async fn insert_trip(&self, trip_id: i32, title: &str, administrator_id: i32) -> Trip {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let trip = Trip {
            trip_id,
            title: title.to_string(),
            status: TripStatus::NotStarted,
            created_at: now,
        };
        tables.trips.insert(trip_id, trip.clone());
        tables.last_trip_id = tables.last_trip_id.max(trip_id);
        tables.trip_members.push(TripMember {
            trip_id,
            user_id: administrator_id,
            role: TripRole::Administrator,
            member_since: now,
            deleted_at: None,
        });
        trip
    }

    /// Aggiunge un membro vivo a un viaggio esistente (seed)
    pub async fn insert_member(&self, trip_id: i32, user_id: i32, role: TripRole) {
        let mut tables = self.tables.lock().await;
        tables.trip_members.push(TripMember {
            trip_id,
            user_id,
            role,
            member_since: Utc::now(),
            deleted_at: None,
        });
    }

    /// La prossima `begin` fallisce come se il pool fosse esaurito
    pub fn fail_next_begin(&self) {
        self.faults.fail_next_begin.store(true, Ordering::SeqCst);
    }

    /// Il prossimo commit di una transazione fallisce e le scritture vengono scartate
    pub fn fail_next_commit(&self) {
        self.faults.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

impl UnitOfWork for MemoryStore {
    type Executor = MemoryExecutor;

    async fn begin(&self) -> Result<MemoryExecutor, Error> {
        if self.faults.fail_next_begin.swap(false, Ordering::SeqCst) {
            warn!("Simulated begin failure");
            return Err(Error::PoolTimedOut);
        }
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryExecutor {
            guard,
            staged: Some(staged),
            faults: self.faults.clone(),
        })
    }

    async fn connect(&self) -> Result<MemoryExecutor, Error> {
        let guard = self.tables.clone().lock_owned().await;
        Ok(MemoryExecutor {
            guard,
            staged: None,
            faults: self.faults.clone(),
        })
    }
}

pub struct MemoryExecutor {
    guard: OwnedMutexGuard<MemoryTables>,
    // Some => transazione aperta
    staged: Option<MemoryTables>,
    faults: Arc<Faults>,
}

impl MemoryExecutor {
    fn tables(&mut self) -> &mut MemoryTables {
        match self.staged.as_mut() {
            Some(staged) => staged,
            None => &mut self.guard,
        }
    }
}

impl Executor for MemoryExecutor {
    fn in_transaction(&self) -> bool {
        self.staged.is_some()
    }

    async fn commit(mut self) -> Result<(), Error> {
        let Some(staged) = self.staged.take() else {
            return Ok(());
        };
        if self.faults.fail_next_commit.swap(false, Ordering::SeqCst) {
            warn!("Simulated commit failure, discarding staged writes");
            return Err(Error::Protocol("simulated commit failure".to_string()));
        }
        *self.guard = staged;
        debug!("Memory transaction committed");
        Ok(())
    }
}

impl UserRepository for MemoryExecutor {
    async fn read_user(&mut self, user_id: i32) -> Result<Option<User>, Error> {
        Ok(self.tables().users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn lock_user_pair(&mut self, _user_a: i32, _user_b: i32) -> Result<(), Error> {
        // l'executor possiede già il lock dell'intero store
        Ok(())
    }
}

impl TripRepository for MemoryExecutor {
    async fn create_trip(&mut self, title: &str, created_at: DateTime<Utc>) -> Result<Trip, Error> {
        let tables = self.tables();
        let trip = Trip {
            trip_id: next_id(&mut tables.last_trip_id),
            title: title.to_string(),
            status: TripStatus::NotStarted,
            created_at,
        };
        tables.trips.insert(trip.trip_id, trip.clone());
        Ok(trip)
    }

    async fn read_trip(&mut self, trip_id: i32) -> Result<Option<Trip>, Error> {
        Ok(self.tables().trips.get(&trip_id).cloned())
    }

    async fn lock_trip_for_update(&mut self, trip_id: i32) -> Result<Option<Trip>, Error> {
        Ok(self.tables().trips.get(&trip_id).cloned())
    }
}

impl TripMemberRepository for MemoryExecutor {
    async fn is_user_in_trip(&mut self, trip_id: i32, user_id: i32) -> Result<bool, Error> {
        Ok(self.tables().find_live_member(trip_id, user_id).is_some())
    }

    async fn is_user_trip_admin(&mut self, trip_id: i32, user_id: i32) -> Result<bool, Error> {
        Ok(self
            .tables()
            .find_live_member(trip_id, user_id)
            .is_some_and(|m| m.role == TripRole::Administrator))
    }

    async fn create_member(&mut self, data: &CreateTripMemberDTO) -> Result<TripMember, Error> {
        let tables = self.tables();
        if !tables.trips.contains_key(&data.trip_id) || !tables.users.contains_key(&data.user_id) {
            return Err(constraint_violation(format!(
                "foreign key violation on trip_members ({}, {})",
                data.trip_id, data.user_id
            )));
        }
        if tables.find_live_member(data.trip_id, data.user_id).is_some() {
            return Err(constraint_violation(format!(
                "duplicate entry on trip_members ({}, {})",
                data.trip_id, data.user_id
            )));
        }
        let member = TripMember {
            trip_id: data.trip_id,
            user_id: data.user_id,
            role: data.role,
            member_since: data.member_since,
            deleted_at: None,
        };
        tables.trip_members.push(member.clone());
        Ok(member)
    }

    async fn delete_member(
        &mut self,
        trip_id: i32,
        user_id: i32,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let member = self
            .tables()
            .trip_members
            .iter_mut()
            .find(|m| m.trip_id == trip_id && m.user_id == user_id && m.is_live());
        match member {
            Some(member) => {
                member.deleted_at = Some(deleted_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_members_by_trip(&mut self, trip_id: i32) -> Result<Vec<TripMember>, Error> {
        let mut members: Vec<TripMember> = self
            .tables()
            .live_members(trip_id)
            .into_iter()
            .cloned()
            .collect();
        members.sort_by_key(|m| (m.member_since, m.user_id));
        Ok(members)
    }
}

impl TripInvitationRepository for MemoryExecutor {
    async fn create_trip_invitation(
        &mut self,
        data: &CreateTripInvitationDTO,
    ) -> Result<TripInvitation, Error> {
        let tables = self.tables();
        if !tables.trips.contains_key(&data.trip_id)
            || !tables.users.contains_key(&data.receiver_id)
        {
            return Err(constraint_violation(format!(
                "foreign key violation on trip_invitations ({}, {})",
                data.trip_id, data.receiver_id
            )));
        }
        if tables
            .trip_invitations
            .values()
            .any(|i| i.trip_id == data.trip_id && i.receiver_id == data.receiver_id)
        {
            return Err(constraint_violation(format!(
                "duplicate entry on trip_invitations ({}, {})",
                data.trip_id, data.receiver_id
            )));
        }
        let invitation = TripInvitation {
            invitation_id: next_id(&mut tables.last_trip_invitation_id),
            trip_id: data.trip_id,
            sender_id: data.sender_id,
            receiver_id: data.receiver_id,
            status: InvitationStatus::Pending,
            created_at: data.created_at,
        };
        tables
            .trip_invitations
            .insert(invitation.invitation_id, invitation.clone());
        Ok(invitation)
    }

    async fn read_trip_invitation(
        &mut self,
        invitation_id: i32,
    ) -> Result<Option<TripInvitation>, Error> {
        Ok(self.tables().trip_invitations.get(&invitation_id).cloned())
    }

    async fn lock_trip_invitation(
        &mut self,
        invitation_id: i32,
    ) -> Result<Option<TripInvitation>, Error> {
        Ok(self.tables().trip_invitations.get(&invitation_id).cloned())
    }

    async fn find_live_trip_invitation(
        &mut self,
        trip_id: i32,
        receiver_id: i32,
    ) -> Result<Option<TripInvitation>, Error> {
        Ok(self
            .tables()
            .trip_invitations
            .values()
            .find(|i| i.trip_id == trip_id && i.receiver_id == receiver_id)
            .cloned())
    }

    async fn find_trip_invitations_for_receiver(
        &mut self,
        receiver_id: i32,
    ) -> Result<Vec<TripInvitation>, Error> {
        let mut invitations: Vec<TripInvitation> = self
            .tables()
            .trip_invitations
            .values()
            .filter(|i| i.receiver_id == receiver_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| {
            (b.created_at, b.invitation_id).cmp(&(a.created_at, a.invitation_id))
        });
        Ok(invitations)
    }

    async fn delete_trip_invitation(&mut self, invitation_id: i32) -> Result<bool, Error> {
        Ok(self
            .tables()
            .trip_invitations
            .remove(&invitation_id)
            .is_some())
    }
}

impl FriendRepository for MemoryExecutor {
    async fn are_friends(&mut self, user_a: i32, user_b: i32) -> Result<bool, Error> {
        Ok(self.tables().friends.iter().any(|f| {
            (f.user_id_1 == user_a && f.user_id_2 == user_b)
                || (f.user_id_1 == user_b && f.user_id_2 == user_a)
        }))
    }

    async fn create_friend(
        &mut self,
        user_a: i32,
        user_b: i32,
        created_at: DateTime<Utc>,
    ) -> Result<Friend, Error> {
        let (low, high) = canonical_pair(user_a, user_b);
        let tables = self.tables();
        if tables
            .friends
            .iter()
            .any(|f| f.user_id_1 == low && f.user_id_2 == high)
        {
            return Err(constraint_violation(format!(
                "duplicate entry on friends ({low}, {high})"
            )));
        }
        let friend = Friend {
            user_id_1: low,
            user_id_2: high,
            created_at,
        };
        tables.friends.push(friend.clone());
        Ok(friend)
    }

    async fn delete_friend(&mut self, user_a: i32, user_b: i32) -> Result<bool, Error> {
        let (low, high) = canonical_pair(user_a, user_b);
        let friends = &mut self.tables().friends;
        let before = friends.len();
        friends.retain(|f| canonical_pair(f.user_id_1, f.user_id_2) != (low, high));
        Ok(friends.len() < before)
    }

    async fn find_friends_of(&mut self, user_id: i32) -> Result<Vec<Friend>, Error> {
        Ok(self
            .tables()
            .friends
            .iter()
            .filter(|f| f.user_id_1 == user_id || f.user_id_2 == user_id)
            .cloned()
            .collect())
    }
}

impl FriendInvitationRepository for MemoryExecutor {
    async fn create_friend_invitation(
        &mut self,
        data: &CreateFriendInvitationDTO,
    ) -> Result<FriendInvitation, Error> {
        let tables = self.tables();
        if tables
            .friend_invitations
            .values()
            .any(|i| i.involves(data.sender_id, data.receiver_id))
        {
            return Err(constraint_violation(format!(
                "duplicate entry on friend_invitations ({}, {})",
                data.sender_id, data.receiver_id
            )));
        }
        let invitation = FriendInvitation {
            invitation_id: next_id(&mut tables.last_friend_invitation_id),
            sender_id: data.sender_id,
            receiver_id: data.receiver_id,
            created_at: data.created_at,
        };
        tables
            .friend_invitations
            .insert(invitation.invitation_id, invitation.clone());
        Ok(invitation)
    }

    async fn lock_friend_invitation(
        &mut self,
        invitation_id: i32,
    ) -> Result<Option<FriendInvitation>, Error> {
        Ok(self.tables().friend_invitations.get(&invitation_id).cloned())
    }

    async fn find_friend_invitation_between(
        &mut self,
        user_a: i32,
        user_b: i32,
    ) -> Result<Option<FriendInvitation>, Error> {
        Ok(self
            .tables()
            .friend_invitations
            .values()
            .find(|i| i.involves(user_a, user_b))
            .cloned())
    }

    async fn find_friend_invitations_for_receiver(
        &mut self,
        receiver_id: i32,
    ) -> Result<Vec<FriendInvitation>, Error> {
        Ok(self
            .tables()
            .friend_invitations
            .values()
            .rev()
            .filter(|i| i.receiver_id == receiver_id)
            .cloned()
            .collect())
    }

    async fn delete_friend_invitation(&mut self, invitation_id: i32) -> Result<bool, Error> {
        Ok(self
            .tables()
            .friend_invitations
            .remove(&invitation_id)
            .is_some())
    }
}

impl CooldownRepository for MemoryExecutor {
    async fn create_cooldown(
        &mut self,
        data: &CreateInvitationCooldownDTO,
    ) -> Result<InvitationCooldown, Error> {
        let tables = self.tables();
        let cooldown = InvitationCooldown {
            cooldown_id: next_id(&mut tables.last_cooldown_id),
            user_id_1: data.user_id_1,
            user_id_2: data.user_id_2,
            start_cooldown_millis: data.start_cooldown_millis,
            cooldown_duration: data.cooldown_duration,
        };
        tables.cooldowns.push(cooldown.clone());
        Ok(cooldown)
    }

    async fn latest_cooldown_between(
        &mut self,
        user_a: i32,
        user_b: i32,
    ) -> Result<Option<InvitationCooldown>, Error> {
        let pair = canonical_pair(user_a, user_b);
        Ok(self
            .tables()
            .cooldowns
            .iter()
            .filter(|c| canonical_pair(c.user_id_1, c.user_id_2) == pair)
            .max_by_key(|c| c.cooldown_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_user(1, "alice@example.com", "alice").await;
        store.insert_user(2, "bob@example.com", "bob").await;
        store.insert_trip(100, "Dolomiti", 1).await;
        store
    }

    fn invitation_dto(receiver_id: i32) -> CreateTripInvitationDTO {
        CreateTripInvitationDTO {
            trip_id: 100,
            sender_id: 1,
            receiver_id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_is_rolled_back() {
        let store = seeded().await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.create_trip_invitation(&invitation_dto(2)).await.unwrap();
            assert!(tx.in_transaction());
            // drop senza commit
        }

        assert!(store.snapshot().await.trip_invitations.is_empty());
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let store = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let created = tx.create_trip_invitation(&invitation_dto(2)).await.unwrap();
        tx.commit().await.unwrap();

        let mut conn = store.connect().await.unwrap();
        let read = conn.read_trip_invitation(created.invitation_id).await.unwrap();
        assert_eq!(read, Some(created));
    }

    #[tokio::test]
    async fn test_connection_writes_immediately_and_commit_is_noop() {
        let store = seeded().await;

        let mut conn = store.connect().await.unwrap();
        assert!(!conn.in_transaction());
        conn.create_friend(2, 1, Utc::now()).await.unwrap();
        conn.commit().await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.friends.len(), 1);
        assert_eq!(snapshot.friends[0].user_id_1, 1);
        assert_eq!(snapshot.friends[0].user_id_2, 2);
    }

    #[tokio::test]
    async fn test_simulated_commit_failure_discards_writes() {
        let store = seeded().await;
        store.fail_next_commit();

        let mut tx = store.begin().await.unwrap();
        tx.create_trip_invitation(&invitation_dto(2)).await.unwrap();
        assert!(tx.commit().await.is_err());

        assert!(store.snapshot().await.trip_invitations.is_empty());

        // il guasto vale una sola volta
        let mut tx = store.begin().await.unwrap();
        tx.create_trip_invitation(&invitation_dto(2)).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.snapshot().await.trip_invitations.len(), 1);
    }

    #[tokio::test]
    async fn test_simulated_begin_failure() {
        let store = seeded().await;
        store.fail_next_begin();

        assert!(matches!(store.begin().await, Err(Error::PoolTimedOut)));
        assert!(store.begin().await.is_ok());
    }

    #[tokio::test]
    async fn test_live_member_uniqueness_and_soft_delete() {
        let store = seeded().await;
        let mut conn = store.connect().await.unwrap();
        let dto = CreateTripMemberDTO {
            trip_id: 100,
            user_id: 2,
            role: TripRole::NormalUser,
            member_since: Utc::now(),
        };

        conn.create_member(&dto).await.unwrap();
        assert!(conn.create_member(&dto).await.is_err());

        assert!(conn.delete_member(100, 2, Utc::now()).await.unwrap());
        assert!(!conn.is_user_in_trip(100, 2).await.unwrap());
        assert!(!conn.delete_member(100, 2, Utc::now()).await.unwrap());

        // dopo il soft delete l'utente può rientrare
        conn.create_member(&dto).await.unwrap();
        assert!(conn.is_user_in_trip(100, 2).await.unwrap());
        assert_eq!(conn.find_members_by_trip(100).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_latest_cooldown_ignores_pair_order() {
        let store = seeded().await;
        let mut conn = store.connect().await.unwrap();

        for start in [10, 20] {
            conn.create_cooldown(&CreateInvitationCooldownDTO {
                user_id_1: if start == 10 { 1 } else { 2 },
                user_id_2: if start == 10 { 2 } else { 1 },
                start_cooldown_millis: start,
                cooldown_duration: 5,
            })
            .await
            .unwrap();
        }

        let latest = conn.latest_cooldown_between(1, 2).await.unwrap().unwrap();
        assert_eq!(latest.start_cooldown_millis, 20);
        assert!(conn.latest_cooldown_between(1, 3).await.unwrap().is_none());
    }
}
