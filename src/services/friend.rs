//! Friend services - Richieste di amicizia, amici e cooldown

use crate::core::{AppError, AppState};
use crate::dtos::{
    AddFriendDTO, CooldownStatusDTO, FriendDTO, FriendInvitationDTO, InvitationAction,
    InvitationResolutionDTO,
};
use crate::entities::User;
use crate::repositories::UnitOfWork;
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

#[instrument(skip(state, current_user, body), fields(sender_id = %current_user.user_id))]
pub async fn add_friend<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<AddFriendDTO>,
) -> Result<(StatusCode, Json<FriendInvitationDTO>), AppError> {
    debug!("Sending friend invitation");
    // 1. Validare l'email
    // 2. Cooldown, richieste pendenti e amicizie esistenti vengono controllati
    //    sotto lock della coppia di utenti
    // 3. Notifica al destinatario dopo il commit
    body.validate()?;

    let sent = state
        .friends
        .add_friend(&state.request_context(), current_user.user_id, &body.email)
        .await?;

    let notification_error = sent.notification_error();
    let mut dto = FriendInvitationDTO::from(sent.value);
    dto.notification_error = notification_error.map(|code| code.as_str().to_string());

    info!(invitation_id = dto.invitation_id, "Friend invitation sent");
    Ok((StatusCode::CREATED, Json(dto)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_pending_friend_invitations<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<FriendInvitationDTO>>, AppError> {
    let invitations = state
        .friends
        .list_pending_for_receiver(&state.request_context(), current_user.user_id)
        .await?;

    Ok(Json(
        invitations
            .into_iter()
            .map(FriendInvitationDTO::from)
            .collect(),
    ))
}

#[instrument(skip(state, current_user), fields(invitation_id = %invitation_id, action = ?action, user_id = %current_user.user_id))]
pub async fn respond_to_friend_invitation<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path((invitation_id, action)): Path<(i32, InvitationAction)>,
    Extension(current_user): Extension<User>,
) -> Result<Json<InvitationResolutionDTO>, AppError> {
    debug!("Responding to friend invitation");
    // 1. accept/deny spettano al destinatario, withdraw al mittente
    // 2. Deny salva il cooldown e cancella la richiesta nella stessa transazione
    let ctx = state.request_context();
    let engine = &state.friends;
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

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_friends<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<FriendDTO>>, AppError> {
    let friends = state
        .friends
        .list_friends(&state.request_context(), current_user.user_id)
        .await?;

    Ok(Json(
        friends
            .into_iter()
            .filter_map(|f| {
                f.other_than(current_user.user_id).map(|user_id| FriendDTO {
                    user_id,
                    friends_since: f.created_at,
                })
            })
            .collect(),
    ))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, friend_id = %friend_id))]
pub async fn remove_friend<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(friend_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    state
        .friends
        .remove_friend(&state.request_context(), current_user.user_id, friend_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, other_id = %other_id))]
pub async fn get_cooldown_status<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(other_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Json<CooldownStatusDTO>, AppError> {
    let in_cooldown = state
        .friends
        .is_in_cooldown(&state.request_context(), current_user.user_id, other_id)
        .await?;

    Ok(Json(CooldownStatusDTO {
        user_id: other_id,
        in_cooldown,
    }))
}
