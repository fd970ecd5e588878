//! NotificationHub - Mappa concorrente degli utenti online
//!
//! Ogni utente connesso allo stream ha un `UnboundedSender`; la consegna è un `send`
//! non bloccante. Un utente offline non è un errore: la notifica viene persa e
//! l'utente ritroverà l'invito nella lista dei pendenti. Uno stream chiuso dal client
//! conta come offline.

use super::{Notification, Notifier, NotifyError};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Default)]
pub struct NotificationHub {
    online_users: DashMap<i32, UnboundedSender<Notification>>,
    closed: AtomicBool,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra l'utente come online. Una sottoscrizione precedente dello stesso
    /// utente viene sostituita e il suo stream termina.
    #[instrument(skip(self))]
    pub fn subscribe(&self, user_id: i32) -> UnboundedReceiver<Notification> {
        let (tx, rx) = unbounded_channel();
        if self.online_users.insert(user_id, tx).is_some() {
            debug!("Replaced previous notification subscription");
        }
        info!(online = self.online_count(), "User subscribed to notifications");
        rx
    }

    pub fn online_count(&self) -> usize {
        self.online_users.len()
    }

    /// Chiude tutti gli stream e rifiuta le notifiche successive (shutdown)
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.online_users.clear();
        info!("Notification hub closed");
    }
}

impl Notifier for NotificationHub {
    #[instrument(skip(self, notification), fields(kind = notification.kind()))]
    fn notify(&self, receiver_id: i32, notification: Notification) -> Result<(), NotifyError> {
        if self.closed.load(Ordering::SeqCst) {
            warn!("Notification hub closed, dropping notification");
            return Err(NotifyError::Unavailable);
        }

        // clone del sender: il riferimento della DashMap non deve restare vivo durante la remove
        let Some(sender) = self
            .online_users
            .get(&receiver_id)
            .map(|entry| entry.value().clone())
        else {
            info!("Receiver offline, notification not delivered");
            return Ok(());
        };

        if sender.send(notification).is_err() {
            // il client ha chiuso lo stream: solo la sua sottoscrizione, non una più recente
            self.online_users
                .remove_if(&receiver_id, |_, current| current.same_channel(&sender));
            info!("Receiver stream closed, notification not delivered");
            return Ok(());
        }

        debug!("Notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_online_user_receives_notification() {
        let hub = NotificationHub::new();
        let mut rx = hub.subscribe(2);
        assert_eq!(hub.online_count(), 1);

        hub.send_trip_invitation_notification(2, 1, 10).unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Notification::TripInvitation {
                invitation_id: 10,
                sender_id: 1
            })
        );
    }

    #[test]
    fn test_offline_user_is_not_an_error() {
        let hub = NotificationHub::new();
        assert_eq!(hub.send_friend_accepted_notification(7, 8), Ok(()));
    }

    #[test]
    fn test_closed_stream_counts_as_offline() {
        let hub = NotificationHub::new();
        let rx = hub.subscribe(3);
        drop(rx);

        assert_eq!(hub.send_friend_invitation_notification(3, 1, 4), Ok(()));
        assert_eq!(hub.online_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_stream_does_not_drop_newer_subscription() {
        let hub = NotificationHub::new();
        let stale = hub.subscribe(6);
        let mut current = hub.subscribe(6);
        drop(stale);

        hub.send_friend_accepted_notification(6, 2).unwrap();
        assert_eq!(hub.online_count(), 1);
        assert_eq!(
            current.recv().await,
            Some(Notification::FriendInvitationAccepted { friend_id: 2 })
        );
    }

    #[test]
    fn test_closed_hub_rejects_notifications() {
        let hub = NotificationHub::new();
        let _rx = hub.subscribe(1);
        hub.close();
        assert_eq!(hub.online_count(), 0);
        assert_eq!(
            hub.send_trip_invitation_notification(1, 2, 3),
            Err(NotifyError::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_resubscribe_replaces_previous_stream() {
        let hub = NotificationHub::new();
        let mut first = hub.subscribe(5);
        let mut second = hub.subscribe(5);

        hub.send_friend_accepted_notification(5, 9).unwrap();

        assert_eq!(first.recv().await, None);
        assert_eq!(
            second.recv().await,
            Some(Notification::FriendInvitationAccepted { friend_id: 9 })
        );
    }
}
