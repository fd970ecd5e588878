//! Trip invitation services - Inviti ricevuti e risposta agli inviti

use crate::core::{AppError, AppState};
use crate::dtos::{InvitationAction, InvitationResolutionDTO, TripInvitationDTO};
use crate::entities::User;
use crate::repositories::UnitOfWork;
use axum::{
    Extension,
    extract::{Json, Path, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_pending_trip_invitations<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<TripInvitationDTO>>, AppError> {
    debug!("Listing pending trip invitations");

    let invitations = state
        .trip_invitations
        .list_pending_for_receiver(&state.request_context(), current_user.user_id)
        .await?;

    info!("Found {} pending invitations", invitations.len());
    Ok(Json(
        invitations.into_iter().map(TripInvitationDTO::from).collect(),
    ))
}

#[instrument(skip(state, current_user), fields(invitation_id = %invitation_id, action = ?action, user_id = %current_user.user_id))]
pub async fn respond_to_trip_invitation<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path((invitation_id, action)): Path<(i32, InvitationAction)>,
    Extension(current_user): Extension<User>,
) -> Result<Json<InvitationResolutionDTO>, AppError> {
    debug!("Responding to trip invitation");
    // 1. accept/deny spettano al destinatario, withdraw al mittente
    // 2. Accept crea la membership e cancella l'invito nella stessa transazione
    let ctx = state.request_context();
    let engine = &state.trip_invitations;
    let status = match action {
        InvitationAction::Accept => {
            engine
                .accept_invitation(&ctx, invitation_id, current_user.user_id)
                .await?
        }
        InvitationAction::Deny => {
            engine
                .deny_invitation(&ctx, invitation_id, current_user.user_id)
                .await?
        }
        InvitationAction::Withdraw => {
            engine
                .withdraw_invitation(&ctx, invitation_id, current_user.user_id)
                .await?
        }
    };

    Ok(Json(InvitationResolutionDTO {
        invitation_id,
        status,
    }))
}
