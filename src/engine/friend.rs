//! FriendEngine - Richieste di amicizia e cooldown anti-spam
//!
//! Tutte le operazioni su una coppia di utenti bloccano le due righe utente in
//! ordine canonico: richieste incrociate A→B e B→A si serializzano senza deadlock.

use super::Committed;
use super::clock::Clock;
use super::context::RequestContext;
use super::cooldown::{CooldownPolicy, is_cooling_down};
use super::error::ErrorCode;
use crate::dtos::CreateFriendInvitationDTO;
use crate::entities::{Friend, FriendInvitation, InvitationStatus};
use crate::notifications::Notifier;
use crate::repositories::{
    CooldownRepository, Executor, FriendInvitationRepository, FriendRepository, UnitOfWork,
    UserRepository, is_unique_violation,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct FriendEngine<U: UnitOfWork> {
    store: Arc<U>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    cooldown: CooldownPolicy,
}

impl<U: UnitOfWork> FriendEngine<U> {
    pub fn new(
        store: Arc<U>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        cooldown: CooldownPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            cooldown,
        }
    }

    /// Invia una richiesta di amicizia all'utente con email `receiver_email`
    #[instrument(skip(self, ctx, receiver_email))]
    pub async fn add_friend(
        &self,
        ctx: &RequestContext,
        sender_id: i32,
        receiver_email: &str,
    ) -> Result<Committed<FriendInvitation>, ErrorCode> {
        let invitation = ctx
            .run(self.insert_invitation(sender_id, receiver_email))
            .await?;
        info!(
            invitation_id = invitation.invitation_id,
            receiver_id = invitation.receiver_id,
            "Friend invitation committed"
        );

        let notification = self.notifier.send_friend_invitation_notification(
            invitation.receiver_id,
            sender_id,
            invitation.invitation_id,
        );
        if let Err(e) = &notification {
            warn!(error = %e, "Friend invitation saved but notification failed");
        }

        Ok(Committed {
            value: invitation,
            notification,
        })
    }

    #[instrument(skip(self, ctx))]
    pub async fn accept_invitation(
        &self,
        ctx: &RequestContext,
        invitation_id: i32,
        acting_user_id: i32,
    ) -> Result<InvitationStatus, ErrorCode> {
        let invitation = ctx
            .run(self.create_friendship(invitation_id, acting_user_id))
            .await?;
        info!("Friend invitation accepted");

        // best effort: il mittente scopre comunque l'amicizia dalla lista amici
        if let Err(e) = self
            .notifier
            .send_friend_accepted_notification(invitation.sender_id, invitation.receiver_id)
        {
            warn!(error = %e, "Friend accepted notification failed");
        }
        Ok(InvitationStatus::Accepted)
    }

    /// Rifiuta la richiesta e avvia il cooldown della coppia
    #[instrument(skip(self, ctx))]
    pub async fn deny_invitation(
        &self,
        ctx: &RequestContext,
        invitation_id: i32,
        acting_user_id: i32,
    ) -> Result<InvitationStatus, ErrorCode> {
        ctx.run(self.deny_with_cooldown(invitation_id, acting_user_id))
            .await?;
        info!("Friend invitation denied");
        Ok(InvitationStatus::Denied)
    }

    /// Ritira la richiesta: nessun cooldown
    #[instrument(skip(self, ctx))]
    pub async fn withdraw_invitation(
        &self,
        ctx: &RequestContext,
        invitation_id: i32,
        acting_user_id: i32,
    ) -> Result<InvitationStatus, ErrorCode> {
        ctx.run(self.delete_as_sender(invitation_id, acting_user_id))
            .await?;
        info!("Friend invitation withdrawn");
        Ok(InvitationStatus::Withdrawn)
    }

    /// `true` se l'ultimo rifiuto tra i due utenti è ancora nella finestra di cooldown
    #[instrument(skip(self, ctx))]
    pub async fn is_in_cooldown(
        &self,
        ctx: &RequestContext,
        user_a: i32,
        user_b: i32,
    ) -> Result<bool, ErrorCode> {
        ctx.run(async move {
            let mut conn = self.store.connect().await?;
            Ok::<_, ErrorCode>(self.cooldown_active(&mut conn, user_a, user_b).await?)
        })
        .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn list_friends(
        &self,
        ctx: &RequestContext,
        user_id: i32,
    ) -> Result<Vec<Friend>, ErrorCode> {
        ctx.run(async move {
            let mut conn = self.store.connect().await?;
            Ok::<_, ErrorCode>(conn.find_friends_of(user_id).await?)
        })
        .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn list_pending_for_receiver(
        &self,
        ctx: &RequestContext,
        receiver_id: i32,
    ) -> Result<Vec<FriendInvitation>, ErrorCode> {
        ctx.run(async move {
            let mut conn = self.store.connect().await?;
            Ok::<_, ErrorCode>(conn.find_friend_invitations_for_receiver(receiver_id).await?)
        })
        .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn remove_friend(
        &self,
        ctx: &RequestContext,
        acting_user_id: i32,
        friend_id: i32,
    ) -> Result<(), ErrorCode> {
        ctx.run(self.delete_friendship(acting_user_id, friend_id))
            .await?;
        info!("Friendship removed");
        Ok(())
    }

    async fn cooldown_active<E>(
        &self,
        exec: &mut E,
        user_a: i32,
        user_b: i32,
    ) -> Result<bool, sqlx::Error>
    where
        E: CooldownRepository + Send,
    {
        let latest = exec.latest_cooldown_between(user_a, user_b).await?;
        Ok(is_cooling_down(latest.as_ref(), self.clock.now_millis()))
    }

    async fn insert_invitation(
        &self,
        sender_id: i32,
        receiver_email: &str,
    ) -> Result<FriendInvitation, ErrorCode> {
        // 1. destinatario per email, fuori dalla transazione: la connessione va
        // rilasciata prima di `begin`
        let receiver = {
            let mut conn = self.store.connect().await?;
            conn.find_user_by_email(receiver_email).await?
        };
        let Some(receiver) = receiver else {
            warn!("Receiver email not registered");
            return Err(ErrorCode::AddFriendReceiverNotFound);
        };
        let receiver_id = receiver.user_id;

        // 2. niente richieste a se stessi
        if receiver_id == sender_id {
            warn!("User tried to add themselves as friend");
            return Err(ErrorCode::AddFriendReceiverNotFound);
        }

        // lock della coppia come prima istruzione: le letture seguenti vedono il commit
        // di una richiesta incrociata che aveva il lock prima di noi
        let mut tx = self.store.begin().await?;
        tx.lock_user_pair(sender_id, receiver_id).await?;

        // 3. cooldown
        if self.cooldown_active(&mut tx, sender_id, receiver_id).await? {
            warn!(receiver_id, "Friend invitation blocked by cooldown");
            return Err(ErrorCode::AddFriendInCooldown);
        }

        // 4. richiesta pendente in una delle due direzioni
        if tx
            .find_friend_invitation_between(sender_id, receiver_id)
            .await?
            .is_some()
        {
            warn!(receiver_id, "Friend invitation already pending");
            return Err(ErrorCode::AddFriendInvitationAlreadyExists);
        }

        // 5. già amici
        if tx.are_friends(sender_id, receiver_id).await? {
            warn!(receiver_id, "Users are already friends");
            return Err(ErrorCode::AddFriendAlreadyFriend);
        }

        // 6. inserimento
        let invitation = match tx
            .create_friend_invitation(&CreateFriendInvitationDTO {
                sender_id,
                receiver_id,
                created_at: self.clock.now(),
            })
            .await
        {
            Ok(invitation) => invitation,
            Err(e) if is_unique_violation(&e) => {
                warn!("Unique constraint rejected duplicate friend invitation");
                return Err(ErrorCode::AddFriendInvitationAlreadyExists);
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(invitation)
    }

    async fn create_friendship(
        &self,
        invitation_id: i32,
        acting_user_id: i32,
    ) -> Result<FriendInvitation, ErrorCode> {
        let mut tx = self.store.begin().await?;

        // 1. richiesta con lock
        let Some(invitation) = tx.lock_friend_invitation(invitation_id).await? else {
            warn!("Friend invitation not found");
            return Err(ErrorCode::FriendInvitationNotFound);
        };

        // 2. solo il destinatario accetta
        if invitation.receiver_id != acting_user_id {
            warn!("Only the receiver can accept a friend invitation");
            return Err(ErrorCode::Forbidden);
        }

        // 3. amicizia, se non esiste già
        if tx
            .are_friends(invitation.sender_id, invitation.receiver_id)
            .await?
        {
            debug!("Friendship already present");
        } else {
            tx.create_friend(invitation.sender_id, invitation.receiver_id, self.clock.now())
                .await?;
        }

        // 4. cancellazione della richiesta
        tx.delete_friend_invitation(invitation_id).await?;

        tx.commit().await?;
        Ok(invitation)
    }

    async fn deny_with_cooldown(
        &self,
        invitation_id: i32,
        acting_user_id: i32,
    ) -> Result<(), ErrorCode> {
        let mut tx = self.store.begin().await?;

        // 1. richiesta con lock
        let Some(invitation) = tx.lock_friend_invitation(invitation_id).await? else {
            warn!("Friend invitation not found");
            return Err(ErrorCode::FriendInvitationNotFound);
        };

        // 2. solo il destinatario rifiuta
        if invitation.receiver_id != acting_user_id {
            warn!("Only the receiver can deny a friend invitation");
            return Err(ErrorCode::Forbidden);
        }

        // 3. cooldown e cancellazione nella stessa transazione
        let cooldown = self.cooldown.record(
            invitation.sender_id,
            invitation.receiver_id,
            self.clock.now_millis(),
        );
        tx.create_cooldown(&cooldown).await?;
        tx.delete_friend_invitation(invitation_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_as_sender(
        &self,
        invitation_id: i32,
        acting_user_id: i32,
    ) -> Result<(), ErrorCode> {
        let mut tx = self.store.begin().await?;

        let Some(invitation) = tx.lock_friend_invitation(invitation_id).await? else {
            warn!("Friend invitation not found");
            return Err(ErrorCode::FriendInvitationNotFound);
        };

        if invitation.sender_id != acting_user_id {
            warn!("Only the sender can withdraw a friend invitation");
            return Err(ErrorCode::Forbidden);
        }

        tx.delete_friend_invitation(invitation_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_friendship(
        &self,
        acting_user_id: i32,
        friend_id: i32,
    ) -> Result<(), ErrorCode> {
        let mut tx = self.store.begin().await?;

        tx.lock_user_pair(acting_user_id, friend_id).await?;
        if !tx.delete_friend(acting_user_id, friend_id).await? {
            warn!("Users are not friends");
            return Err(ErrorCode::Forbidden);
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::ManualClock;
    use crate::notifications::{Notification, NotificationHub};
    use crate::repositories::MemoryStore;
    use std::time::Duration;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    struct Fixture {
        store: MemoryStore,
        clock: Arc<ManualClock>,
        hub: Arc<NotificationHub>,
        engine: FriendEngine<MemoryStore>,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
            store
                .insert_user(id, &format!("{name}@example.com"), name)
                .await;
        }
        let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
        let hub = Arc::new(NotificationHub::new());
        let engine = FriendEngine::new(
            Arc::new(store.clone()),
            hub.clone(),
            clock.clone(),
            CooldownPolicy::default(),
        );
        Fixture {
            store,
            clock,
            hub,
            engine,
        }
    }

    #[tokio::test]
    async fn test_add_and_accept_friend() {
        let f = fixture().await;
        let ctx = RequestContext::background();
        let mut bob_inbox = f.hub.subscribe(2);
        let mut alice_inbox = f.hub.subscribe(1);

        let sent = f.engine.add_friend(&ctx, 1, "bob@example.com").await.unwrap();
        assert_eq!(sent.value.receiver_id, 2);
        assert!(matches!(
            bob_inbox.recv().await,
            Some(Notification::FriendInvitation { sender_id: 1, .. })
        ));

        let status = f
            .engine
            .accept_invitation(&ctx, sent.value.invitation_id, 2)
            .await
            .unwrap();
        assert_eq!(status, InvitationStatus::Accepted);
        assert_eq!(
            alice_inbox.recv().await,
            Some(Notification::FriendInvitationAccepted { friend_id: 2 })
        );

        let friends = f.engine.list_friends(&ctx, 2).await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].other_than(2), Some(1));
        assert!(f.store.snapshot().await.friend_invitations.is_empty());

        assert_eq!(
            f.engine
                .add_friend(&ctx, 2, "alice@example.com")
                .await
                .unwrap_err(),
            ErrorCode::AddFriendAlreadyFriend
        );
    }

    #[tokio::test]
    async fn test_add_friend_rejections() {
        let f = fixture().await;
        let ctx = RequestContext::background();

        assert_eq!(
            f.engine
                .add_friend(&ctx, 1, "nobody@example.com")
                .await
                .unwrap_err(),
            ErrorCode::AddFriendReceiverNotFound
        );
        assert_eq!(
            f.engine
                .add_friend(&ctx, 1, "alice@example.com")
                .await
                .unwrap_err(),
            ErrorCode::AddFriendReceiverNotFound
        );

        f.engine.add_friend(&ctx, 1, "bob@example.com").await.unwrap();
        // duplicato nella stessa direzione e in quella opposta
        assert_eq!(
            f.engine
                .add_friend(&ctx, 1, "bob@example.com")
                .await
                .unwrap_err(),
            ErrorCode::AddFriendInvitationAlreadyExists
        );
        assert_eq!(
            f.engine
                .add_friend(&ctx, 2, "alice@example.com")
                .await
                .unwrap_err(),
            ErrorCode::AddFriendInvitationAlreadyExists
        );
        assert_eq!(f.store.snapshot().await.friend_invitations.len(), 1);
    }

    #[tokio::test]
    async fn test_deny_starts_cooldown_until_expiry() {
        let f = fixture().await;
        let ctx = RequestContext::background();

        let id = f
            .engine
            .add_friend(&ctx, 1, "bob@example.com")
            .await
            .unwrap()
            .value
            .invitation_id;
        assert_eq!(
            f.engine.deny_invitation(&ctx, id, 2).await.unwrap(),
            InvitationStatus::Denied
        );

        let tables = f.store.snapshot().await;
        assert!(tables.friend_invitations.is_empty());
        assert_eq!(tables.cooldowns.len(), 1);

        assert!(f.engine.is_in_cooldown(&ctx, 1, 2).await.unwrap());
        assert!(f.engine.is_in_cooldown(&ctx, 2, 1).await.unwrap());
        assert_eq!(
            f.engine
                .add_friend(&ctx, 1, "bob@example.com")
                .await
                .unwrap_err(),
            ErrorCode::AddFriendInCooldown
        );
        // anche il destinatario è bloccato
        assert_eq!(
            f.engine
                .add_friend(&ctx, 2, "alice@example.com")
                .await
                .unwrap_err(),
            ErrorCode::AddFriendInCooldown
        );

        f.clock.advance(DAY - Duration::from_millis(1));
        assert!(f.engine.is_in_cooldown(&ctx, 1, 2).await.unwrap());

        f.clock.advance(Duration::from_millis(1));
        assert!(!f.engine.is_in_cooldown(&ctx, 1, 2).await.unwrap());
        f.engine.add_friend(&ctx, 1, "bob@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_withdraw_has_no_cooldown() {
        let f = fixture().await;
        let ctx = RequestContext::background();

        let id = f
            .engine
            .add_friend(&ctx, 1, "bob@example.com")
            .await
            .unwrap()
            .value
            .invitation_id;

        assert_eq!(
            f.engine.withdraw_invitation(&ctx, id, 2).await.unwrap_err(),
            ErrorCode::Forbidden
        );
        assert_eq!(
            f.engine.withdraw_invitation(&ctx, id, 1).await.unwrap(),
            InvitationStatus::Withdrawn
        );
        assert!(!f.engine.is_in_cooldown(&ctx, 1, 2).await.unwrap());
        f.engine.add_friend(&ctx, 1, "bob@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_resolution_of_missing_or_foreign_invitation() {
        let f = fixture().await;
        let ctx = RequestContext::background();

        assert_eq!(
            f.engine.accept_invitation(&ctx, 77, 2).await.unwrap_err(),
            ErrorCode::FriendInvitationNotFound
        );

        let id = f
            .engine
            .add_friend(&ctx, 1, "bob@example.com")
            .await
            .unwrap()
            .value
            .invitation_id;
        assert_eq!(
            f.engine.accept_invitation(&ctx, id, 3).await.unwrap_err(),
            ErrorCode::Forbidden
        );
        assert_eq!(
            f.engine.deny_invitation(&ctx, id, 1).await.unwrap_err(),
            ErrorCode::Forbidden
        );
        f.engine.accept_invitation(&ctx, id, 2).await.unwrap();
        assert_eq!(
            f.engine.accept_invitation(&ctx, id, 2).await.unwrap_err(),
            ErrorCode::FriendInvitationNotFound
        );
    }

    #[tokio::test]
    async fn test_deny_commit_failure_keeps_invitation_and_no_cooldown() {
        let f = fixture().await;
        let ctx = RequestContext::background();
        let id = f
            .engine
            .add_friend(&ctx, 1, "bob@example.com")
            .await
            .unwrap()
            .value
            .invitation_id;

        f.store.fail_next_commit();
        assert_eq!(
            f.engine.deny_invitation(&ctx, id, 2).await.unwrap_err(),
            ErrorCode::InternalServerError
        );

        let tables = f.store.snapshot().await;
        assert_eq!(tables.friend_invitations.len(), 1);
        assert!(tables.cooldowns.is_empty());
    }

    #[tokio::test]
    async fn test_remove_friend_and_pending_list() {
        let f = fixture().await;
        let ctx = RequestContext::background();

        let id = f
            .engine
            .add_friend(&ctx, 1, "bob@example.com")
            .await
            .unwrap()
            .value
            .invitation_id;
        f.engine.add_friend(&ctx, 3, "bob@example.com").await.unwrap();
        assert_eq!(
            f.engine.list_pending_for_receiver(&ctx, 2).await.unwrap().len(),
            2
        );

        f.engine.accept_invitation(&ctx, id, 2).await.unwrap();
        f.engine.remove_friend(&ctx, 1, 2).await.unwrap();
        assert!(f.engine.list_friends(&ctx, 1).await.unwrap().is_empty());
        assert_eq!(
            f.engine.remove_friend(&ctx, 1, 2).await.unwrap_err(),
            ErrorCode::Forbidden
        );
    }
}
