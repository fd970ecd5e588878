//! Notification services - Stream SSE delle notifiche dell'utente

use crate::core::AppState;
use crate::entities::User;
use crate::repositories::UnitOfWork;
use axum::{
    Extension,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, instrument};

/// Apre lo stream: ogni notifica è un evento con nome `kind` e payload JSON.
/// Una nuova connessione dello stesso utente chiude la precedente.
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn notification_stream<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Extension(current_user): Extension<User>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.notifications.subscribe(current_user.user_id);
    info!("Notification stream opened");

    let stream = UnboundedReceiverStream::new(receiver).map(|notification| {
        Event::default()
            .event(notification.kind())
            .json_data(&notification)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
