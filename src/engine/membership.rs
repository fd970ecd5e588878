//! MembershipEngine - Creazione viaggi e gestione dei membri

use super::clock::Clock;
use super::context::RequestContext;
use super::error::ErrorCode;
use crate::dtos::CreateTripMemberDTO;
use crate::entities::{Trip, TripMember, TripRole};
use crate::repositories::{Executor, TripMemberRepository, TripRepository, UnitOfWork};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct MembershipEngine<U: UnitOfWork> {
    store: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<U: UnitOfWork> MembershipEngine<U> {
    pub fn new(store: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Crea il viaggio e registra il creatore come amministratore, in un'unica transazione
    #[instrument(skip(self, ctx, title))]
    pub async fn create_trip(
        &self,
        ctx: &RequestContext,
        creator_id: i32,
        title: &str,
    ) -> Result<Trip, ErrorCode> {
        let trip = ctx.run(self.insert_trip_with_admin(creator_id, title)).await?;
        info!(trip_id = trip.trip_id, "Trip created");
        Ok(trip)
    }

    #[instrument(skip(self, ctx))]
    pub async fn list_members(
        &self,
        ctx: &RequestContext,
        trip_id: i32,
        acting_user_id: i32,
    ) -> Result<Vec<TripMember>, ErrorCode> {
        ctx.run(self.read_members(trip_id, acting_user_id)).await
    }

    /// Rimuove un membro (soft delete). Un amministratore può rimuovere chiunque,
    /// ogni membro può rimuovere se stesso.
    #[instrument(skip(self, ctx))]
    pub async fn remove_member(
        &self,
        ctx: &RequestContext,
        trip_id: i32,
        target_user_id: i32,
        acting_user_id: i32,
    ) -> Result<(), ErrorCode> {
        ctx.run(self.soft_delete_member(trip_id, target_user_id, acting_user_id))
            .await?;
        info!("Trip member removed");
        Ok(())
    }

    async fn insert_trip_with_admin(
        &self,
        creator_id: i32,
        title: &str,
    ) -> Result<Trip, ErrorCode> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let trip = tx.create_trip(title, now).await?;
        tx.create_member(&CreateTripMemberDTO {
            trip_id: trip.trip_id,
            user_id: creator_id,
            role: TripRole::Administrator,
            member_since: now,
        })
        .await?;

        tx.commit().await?;
        Ok(trip)
    }

    async fn read_members(
        &self,
        trip_id: i32,
        acting_user_id: i32,
    ) -> Result<Vec<TripMember>, ErrorCode> {
        let mut conn = self.store.connect().await?;

        if conn.read_trip(trip_id).await?.is_none() {
            debug!("Trip does not exist");
            return Err(ErrorCode::TripNotFound);
        }

        if !conn.is_user_in_trip(trip_id, acting_user_id).await? {
            warn!("User is not a member of the trip");
            return Err(ErrorCode::Forbidden);
        }

        Ok(conn.find_members_by_trip(trip_id).await?)
    }

    async fn soft_delete_member(
        &self,
        trip_id: i32,
        target_user_id: i32,
        acting_user_id: i32,
    ) -> Result<(), ErrorCode> {
        let mut tx = self.store.begin().await?;

        // 1. lock del viaggio: serializza con inviti e accettazioni concorrenti
        if tx.lock_trip_for_update(trip_id).await?.is_none() {
            return Err(ErrorCode::TripNotFound);
        }

        // 2. autorizzazione
        if acting_user_id != target_user_id
            && !tx.is_user_trip_admin(trip_id, acting_user_id).await?
        {
            warn!("Only administrators can remove other members");
            return Err(ErrorCode::Forbidden);
        }

        // 3. il target deve essere un membro vivo
        let members = tx.find_members_by_trip(trip_id).await?;
        let Some(target) = members.iter().find(|m| m.user_id == target_user_id) else {
            warn!("Target is not a member of the trip");
            return Err(ErrorCode::Forbidden);
        };

        // 4. l'ultimo amministratore non può uscire lasciando il viaggio senza admin
        let administrators = members
            .iter()
            .filter(|m| m.role == TripRole::Administrator)
            .count();
        if target.role == TripRole::Administrator && administrators == 1 && members.len() > 1 {
            warn!("Last administrator cannot leave a trip with other members");
            return Err(ErrorCode::Forbidden);
        }

        // 5. soft delete
        if !tx
            .delete_member(trip_id, target_user_id, self.clock.now())
            .await?
        {
            debug!("Member row already deleted");
            return Err(ErrorCode::Forbidden);
        }

        tx.commit().await?;
        Ok(())
    }
}
