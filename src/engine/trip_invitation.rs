//! TripInvitationEngine - Macchina a stati degli inviti ai viaggi
//!
//! Solo `pending` viene salvato su database: accettazione, rifiuto e ritiro
//! cancellano la riga, e lo stato finale viene restituito al chiamante.

use super::Committed;
use super::clock::Clock;
use super::context::RequestContext;
use super::error::ErrorCode;
use crate::dtos::{CreateTripInvitationDTO, CreateTripMemberDTO};
use crate::entities::{InvitationStatus, TripInvitation, TripRole};
use crate::notifications::Notifier;
use crate::repositories::{
    Executor, TripInvitationRepository, TripMemberRepository, TripRepository, UnitOfWork,
    UserRepository, is_unique_violation,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Transizione richiesta su un invito pendente
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Accept,
    Deny,
    Withdraw,
}

impl Resolution {
    fn outcome(self) -> InvitationStatus {
        match self {
            Resolution::Accept => InvitationStatus::Accepted,
            Resolution::Deny => InvitationStatus::Denied,
            Resolution::Withdraw => InvitationStatus::Withdrawn,
        }
    }

    /// Accetta e rifiuta solo il destinatario, ritira solo il mittente
    fn is_allowed(self, invitation: &TripInvitation, acting_user_id: i32) -> bool {
        match self {
            Resolution::Accept | Resolution::Deny => invitation.receiver_id == acting_user_id,
            Resolution::Withdraw => invitation.sender_id == acting_user_id,
        }
    }
}

pub struct TripInvitationEngine<U: UnitOfWork> {
    store: Arc<U>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl<U: UnitOfWork> TripInvitationEngine<U> {
    pub fn new(store: Arc<U>, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Invita `receiver_id` nel viaggio `trip_id` per conto di `sender_id`.
    ///
    /// # Returns
    /// * `Ok(Committed)` - Invito salvato; `notification` riporta l'esito della notifica
    /// * `Err(ErrorCode)` - Nessuna scrittura è stata fatta
    #[instrument(skip(self, ctx))]
    pub async fn send_invitation(
        &self,
        ctx: &RequestContext,
        trip_id: i32,
        receiver_id: i32,
        sender_id: i32,
    ) -> Result<Committed<TripInvitation>, ErrorCode> {
        debug!("Sending trip invitation");

        let invitation = ctx
            .run(self.insert_invitation(trip_id, receiver_id, sender_id))
            .await?;
        info!(
            invitation_id = invitation.invitation_id,
            "Trip invitation committed"
        );

        // 8. notifica fuori dalla transazione, il fallimento non tocca i dati
        let notification = self.notifier.send_trip_invitation_notification(
            receiver_id,
            sender_id,
            invitation.invitation_id,
        );
        if let Err(e) = &notification {
            warn!(error = %e, "Trip invitation saved but notification failed");
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
        self.resolve(ctx, invitation_id, acting_user_id, Resolution::Accept)
            .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn deny_invitation(
        &self,
        ctx: &RequestContext,
        invitation_id: i32,
        acting_user_id: i32,
    ) -> Result<InvitationStatus, ErrorCode> {
        self.resolve(ctx, invitation_id, acting_user_id, Resolution::Deny)
            .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn withdraw_invitation(
        &self,
        ctx: &RequestContext,
        invitation_id: i32,
        acting_user_id: i32,
    ) -> Result<InvitationStatus, ErrorCode> {
        self.resolve(ctx, invitation_id, acting_user_id, Resolution::Withdraw)
            .await
    }

    /// Inviti pendenti ricevuti dall'utente
    #[instrument(skip(self, ctx))]
    pub async fn list_pending_for_receiver(
        &self,
        ctx: &RequestContext,
        receiver_id: i32,
    ) -> Result<Vec<TripInvitation>, ErrorCode> {
        ctx.run(async move {
            let mut conn = self.store.connect().await?;
            let invitations = conn.find_trip_invitations_for_receiver(receiver_id).await?;
            Ok::<_, ErrorCode>(invitations)
        })
        .await
    }

    async fn resolve(
        &self,
        ctx: &RequestContext,
        invitation_id: i32,
        acting_user_id: i32,
        resolution: Resolution,
    ) -> Result<InvitationStatus, ErrorCode> {
        let status = ctx
            .run(self.apply_resolution(invitation_id, acting_user_id, resolution))
            .await?;
        info!(?status, "Trip invitation resolved");
        Ok(status)
    }

    async fn insert_invitation(
        &self,
        trip_id: i32,
        receiver_id: i32,
        sender_id: i32,
    ) -> Result<TripInvitation, ErrorCode> {
        // 1. transazione: ogni return anticipato droppa `tx` e fa rollback
        let mut tx = self.store.begin().await?;

        // 2. lock del viaggio come prima istruzione: InnoDB fissa lo snapshot alla prima
        // lettura non bloccante, quindi le letture seguenti vedono il commit di chi
        // aveva il lock prima di noi
        let trip = tx.lock_trip_for_update(trip_id).await?;

        // 3. il mittente deve essere membro; precede il controllo sul viaggio, quindi
        // un viaggio inesistente risponde FORBIDDEN come per qualunque non membro
        if !tx.is_user_in_trip(trip_id, sender_id).await? {
            warn!("Sender is not a member of the trip");
            return Err(ErrorCode::Forbidden);
        }
        if trip.is_none() {
            warn!("Trip not found");
            return Err(ErrorCode::TripNotFound);
        }

        // 4. il destinatario deve esistere e non essere già membro
        if tx.read_user(receiver_id).await?.is_none() {
            warn!("Receiver not found");
            return Err(ErrorCode::UserNotFound);
        }
        if tx.is_user_in_trip(trip_id, receiver_id).await? {
            warn!("Receiver is already a member of the trip");
            return Err(ErrorCode::TripMemberAlreadyExists);
        }

        // 5. al massimo un invito vivo per (trip, receiver)
        if tx.find_live_trip_invitation(trip_id, receiver_id).await?.is_some() {
            warn!("Pending invitation already exists");
            return Err(ErrorCode::TripInvitationAlreadyExists);
        }

        // 6. inserimento; `uq_trip_invitations_receiver` respinge comunque un doppione
        let invitation = match tx
            .create_trip_invitation(&CreateTripInvitationDTO {
                trip_id,
                sender_id,
                receiver_id,
                created_at: self.clock.now(),
            })
            .await
        {
            Ok(invitation) => invitation,
            Err(e) if is_unique_violation(&e) => {
                warn!("Unique constraint rejected duplicate invitation");
                return Err(ErrorCode::TripInvitationAlreadyExists);
            }
            Err(e) => return Err(e.into()),
        };

        // 7. commit
        tx.commit().await?;
        Ok(invitation)
    }

    async fn apply_resolution(
        &self,
        invitation_id: i32,
        acting_user_id: i32,
        resolution: Resolution,
    ) -> Result<InvitationStatus, ErrorCode> {
        let mut tx = self.store.begin().await?;

        // 1. lettura con lock: accept e deny concorrenti si serializzano qui
        let Some(invitation) = tx.lock_trip_invitation(invitation_id).await? else {
            warn!("Invitation not found or already resolved");
            return Err(ErrorCode::Forbidden);
        };

        // 2. autorizzazione
        if !resolution.is_allowed(&invitation, acting_user_id) {
            warn!(
                sender_id = invitation.sender_id,
                receiver_id = invitation.receiver_id,
                "User not allowed to resolve this invitation"
            );
            return Err(ErrorCode::Forbidden);
        }

        // 3. solo un invito pendente è azionabile
        if invitation.status != InvitationStatus::Pending {
            warn!(status = ?invitation.status, "Invitation is not pending");
            return Err(ErrorCode::Forbidden);
        }

        // 4. accettazione: nuovo membro, se non lo è già
        if resolution == Resolution::Accept {
            if tx
                .is_user_in_trip(invitation.trip_id, invitation.receiver_id)
                .await?
            {
                debug!("Receiver already a member, skipping member creation");
            } else {
                tx.create_member(&CreateTripMemberDTO {
                    trip_id: invitation.trip_id,
                    user_id: invitation.receiver_id,
                    role: TripRole::NormalUser,
                    member_since: self.clock.now(),
                })
                .await?;
            }
        }

        // 5. la riga sparisce in tutti e tre i casi
        tx.delete_trip_invitation(invitation_id).await?;

        tx.commit().await?;
        Ok(resolution.outcome())
    }
}
