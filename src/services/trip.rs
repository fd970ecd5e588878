//! Trip services - Creazione viaggi, membri e invio degli inviti

use crate::core::{AppError, AppState};
use crate::dtos::{CreateTripDTO, SendTripInvitationDTO, TripDTO, TripInvitationDTO, TripMemberDTO};
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

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_trip<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateTripDTO>,
) -> Result<(StatusCode, Json<TripDTO>), AppError> {
    debug!("Creating trip");
    // 1. Validare il titolo
    // 2. Creare viaggio e membership da amministratore nella stessa transazione
    // 3. Ritornare il viaggio creato
    body.validate()?;

    let trip = state
        .trips
        .create_trip(&state.request_context(), current_user.user_id, &body.title)
        .await?;

    info!(trip_id = trip.trip_id, "Trip created");
    Ok((StatusCode::CREATED, Json(TripDTO::from(trip))))
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, user_id = %current_user.user_id))]
pub async fn list_trip_members<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(trip_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<TripMemberDTO>>, AppError> {
    debug!("Listing trip members");

    let members = state
        .trips
        .list_members(&state.request_context(), trip_id, current_user.user_id)
        .await?;

    debug!("Found {} members", members.len());
    Ok(Json(members.into_iter().map(TripMemberDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, target_user = %user_id, acting_user = %current_user.user_id))]
pub async fn remove_trip_member<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path((trip_id, user_id)): Path<(i32, i32)>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    debug!("Removing trip member");
    // 1. Un amministratore rimuove chiunque, un membro può solo uscire
    // 2. Soft delete della membership
    state
        .trips
        .remove_member(&state.request_context(), trip_id, user_id, current_user.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user, body), fields(trip_id = %trip_id, sender_id = %current_user.user_id))]
pub async fn send_trip_invitation<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(trip_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<SendTripInvitationDTO>,
) -> Result<(StatusCode, Json<TripInvitationDTO>), AppError> {
    debug!("Sending trip invitation");
    // 1. Validare il body
    // 2. Salvare l'invito (membership del mittente, lock del viaggio, unicità)
    // 3. La notifica parte dopo il commit: se fallisce l'invito resta valido
    //    e la risposta riporta NOTIFICATION_FAILED
    body.validate()?;

    let sent = state
        .trip_invitations
        .send_invitation(
            &state.request_context(),
            trip_id,
            body.receiver_id,
            current_user.user_id,
        )
        .await?;

    let notification_error = sent.notification_error();
    let mut dto = TripInvitationDTO::from(sent.value);
    dto.notification_error = notification_error.map(|code| code.as_str().to_string());

    info!(invitation_id = dto.invitation_id, "Trip invitation sent");
    Ok((StatusCode::CREATED, Json(dto)))
}
