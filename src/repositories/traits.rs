//! Repository traits
//!
//! Interfacce comuni per le operazioni su database. Ogni repository è implementato
//! una sola volta sull'*executor*, che può essere una connessione semplice oppure
//! una transazione aperta: chi chiama non deve mai distinguere i due casi.
//!
//! I metodi restituiscono `impl Future + Send` così che i servizi generici
//! possano essere usati dentro gli handler axum e dentro `tokio::spawn`.

use crate::dtos::{
    CreateFriendInvitationDTO, CreateInvitationCooldownDTO, CreateTripInvitationDTO,
    CreateTripMemberDTO,
};
use crate::entities::{
    Friend, FriendInvitation, InvitationCooldown, Trip, TripInvitation, TripMember, User,
};
use chrono::{DateTime, Utc};
use sqlx::Error;
use std::future::Future;

/// Unit of Work: punto di ingresso per ottenere un executor.
///
/// # Note
/// Una sola transazione per operazione logica, niente transazioni annidate.
pub trait UnitOfWork: Send + Sync + 'static {
    type Executor: Repositories;

    /// Apre una nuova transazione.
    ///
    /// # Returns
    /// * `Ok(Executor)` - Transazione aperta; se viene droppata senza `commit` fa rollback
    /// * `Err(sqlx::Error)` - Impossibile avviare la transazione
    fn begin(&self) -> impl Future<Output = Result<Self::Executor, Error>> + Send;

    /// Prende una connessione semplice (autocommit), per letture fuori transazione
    fn connect(&self) -> impl Future<Output = Result<Self::Executor, Error>> + Send;
}

/// Capacità comune a connessione e transazione
pub trait Executor: Send + Sized {
    /// `true` se l'executor è una transazione aperta
    fn in_transaction(&self) -> bool;

    /// Rende definitive tutte le scritture.
    ///
    /// Su una connessione semplice non fa nulla. Consuma l'executor: un rollback
    /// dopo il commit non è esprimibile.
    /// Il rollback è il drop dell'executor senza commit.
    fn commit(self) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Lettura degli utenti, gestiti da un servizio esterno
pub trait UserRepository {
    fn read_user(&mut self, user_id: i32)
    -> impl Future<Output = Result<Option<User>, Error>> + Send;

    fn find_user_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, Error>> + Send;

    /// Blocca le righe dei due utenti in ordine canonico (id crescente).
    ///
    /// Serializza le operazioni di amicizia sulla stessa coppia; l'ordine fisso
    /// evita deadlock tra richieste incrociate A→B e B→A.
    fn lock_user_pair(
        &mut self,
        user_a: i32,
        user_b: i32,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

pub trait TripRepository {
    fn create_trip(
        &mut self,
        title: &str,
        created_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Trip, Error>> + Send;

    fn read_trip(&mut self, trip_id: i32)
    -> impl Future<Output = Result<Option<Trip>, Error>> + Send;

    /// Legge il viaggio con lock esclusivo sulla riga (`SELECT ... FOR UPDATE`).
    ///
    /// # Note
    /// Ha effetto solo dentro una transazione: il lock dura fino a commit/rollback.
    fn lock_trip_for_update(
        &mut self,
        trip_id: i32,
    ) -> impl Future<Output = Result<Option<Trip>, Error>> + Send;
}

pub trait TripMemberRepository {
    /// `true` se esiste una membership non cancellata
    fn is_user_in_trip(
        &mut self,
        trip_id: i32,
        user_id: i32,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    /// `true` se esiste una membership non cancellata con ruolo administrator
    fn is_user_trip_admin(
        &mut self,
        trip_id: i32,
        user_id: i32,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    fn create_member(
        &mut self,
        data: &CreateTripMemberDTO,
    ) -> impl Future<Output = Result<TripMember, Error>> + Send;

    /// Soft delete della membership.
    ///
    /// # Returns
    /// * `Ok(true)` - Una riga viva è stata marcata come cancellata
    /// * `Ok(false)` - Nessun membro vivo con quella coppia
    fn delete_member(
        &mut self,
        trip_id: i32,
        user_id: i32,
        deleted_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Membri vivi del viaggio, in ordine di ingresso
    fn find_members_by_trip(
        &mut self,
        trip_id: i32,
    ) -> impl Future<Output = Result<Vec<TripMember>, Error>> + Send;
}

pub trait TripInvitationRepository {
    fn create_trip_invitation(
        &mut self,
        data: &CreateTripInvitationDTO,
    ) -> impl Future<Output = Result<TripInvitation, Error>> + Send;

    fn read_trip_invitation(
        &mut self,
        invitation_id: i32,
    ) -> impl Future<Output = Result<Option<TripInvitation>, Error>> + Send;

    /// Come `read_trip_invitation` ma con lock sulla riga: una accept e una deny
    /// concorrenti si serializzano e la seconda vede la riga già cancellata.
    fn lock_trip_invitation(
        &mut self,
        invitation_id: i32,
    ) -> impl Future<Output = Result<Option<TripInvitation>, Error>> + Send;

    /// Invito vivo per la coppia (trip, receiver), se esiste
    fn find_live_trip_invitation(
        &mut self,
        trip_id: i32,
        receiver_id: i32,
    ) -> impl Future<Output = Result<Option<TripInvitation>, Error>> + Send;

    fn find_trip_invitations_for_receiver(
        &mut self,
        receiver_id: i32,
    ) -> impl Future<Output = Result<Vec<TripInvitation>, Error>> + Send;

    fn delete_trip_invitation(
        &mut self,
        invitation_id: i32,
    ) -> impl Future<Output = Result<bool, Error>> + Send;
}

pub trait FriendRepository {
    /// Controlla entrambi gli ordinamenti della coppia
    fn are_friends(
        &mut self,
        user_a: i32,
        user_b: i32,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    fn create_friend(
        &mut self,
        user_a: i32,
        user_b: i32,
        created_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Friend, Error>> + Send;

    fn delete_friend(
        &mut self,
        user_a: i32,
        user_b: i32,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    fn find_friends_of(
        &mut self,
        user_id: i32,
    ) -> impl Future<Output = Result<Vec<Friend>, Error>> + Send;
}

pub trait FriendInvitationRepository {
    fn create_friend_invitation(
        &mut self,
        data: &CreateFriendInvitationDTO,
    ) -> impl Future<Output = Result<FriendInvitation, Error>> + Send;

    /// Legge la richiesta con lock sulla riga
    fn lock_friend_invitation(
        &mut self,
        invitation_id: i32,
    ) -> impl Future<Output = Result<Option<FriendInvitation>, Error>> + Send;

    /// Richiesta pendente tra i due utenti, in qualunque direzione
    fn find_friend_invitation_between(
        &mut self,
        user_a: i32,
        user_b: i32,
    ) -> impl Future<Output = Result<Option<FriendInvitation>, Error>> + Send;

    fn find_friend_invitations_for_receiver(
        &mut self,
        receiver_id: i32,
    ) -> impl Future<Output = Result<Vec<FriendInvitation>, Error>> + Send;

    fn delete_friend_invitation(
        &mut self,
        invitation_id: i32,
    ) -> impl Future<Output = Result<bool, Error>> + Send;
}

pub trait CooldownRepository {
    fn create_cooldown(
        &mut self,
        data: &CreateInvitationCooldownDTO,
    ) -> impl Future<Output = Result<InvitationCooldown, Error>> + Send;

    /// Ultimo cooldown creato per la coppia non ordinata
    fn latest_cooldown_between(
        &mut self,
        user_a: i32,
        user_b: i32,
    ) -> impl Future<Output = Result<Option<InvitationCooldown>, Error>> + Send;
}

/// Tutti i repository disponibili su un executor
pub trait Repositories:
    Executor
    + UserRepository
    + TripRepository
    + TripMemberRepository
    + TripInvitationRepository
    + FriendRepository
    + FriendInvitationRepository
    + CooldownRepository
{
}

impl<T> Repositories for T where
    T: Executor
        + UserRepository
        + TripRepository
        + TripMemberRepository
        + TripInvitationRepository
        + FriendRepository
        + FriendInvitationRepository
        + CooldownRepository
{
}
