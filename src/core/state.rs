//! Application State - Stato globale dell'applicazione
//!
//! Contiene la Unit of Work, i servizi costruiti sopra di essa e l'hub delle notifiche.

use crate::core::Config;
use crate::core::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::engine::{
    Clock, CooldownPolicy, FriendEngine, MembershipEngine, RequestContext, SystemClock,
    TripInvitationEngine,
};
use crate::notifications::{NotificationHub, Notifier};
use crate::repositories::UnitOfWork;
use std::sync::Arc;
use std::time::Duration;

/// Parametri dei servizi; nei test permettono orologio e notifier finti
pub struct EngineOptions {
    pub clock: Arc<dyn Clock>,
    /// `None` => le notifiche passano dall'hub dello stato
    pub notifier: Option<Arc<dyn Notifier>>,
    pub cooldown: CooldownPolicy,
    pub request_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            notifier: None,
            cooldown: CooldownPolicy::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState<U: UnitOfWork> {
    pub store: Arc<U>,

    pub trips: MembershipEngine<U>,
    pub trip_invitations: TripInvitationEngine<U>,
    pub friends: FriendEngine<U>,

    /// Utenti collegati allo stream delle notifiche
    pub notifications: Arc<NotificationHub>,

    /// Secret key per JWT token
    pub jwt_secret: String,

    pub request_timeout: Duration,
}

impl<U: UnitOfWork> AppState<U> {
    pub fn new(store: U, jwt_secret: String) -> Self {
        Self::with_options(store, jwt_secret, EngineOptions::default())
    }

    pub fn from_config(store: U, config: &Config) -> Self {
        Self::with_options(
            store,
            config.jwt_secret.clone(),
            EngineOptions {
                cooldown: CooldownPolicy::new(config.friend_invitation_cooldown),
                request_timeout: config.request_timeout,
                ..EngineOptions::default()
            },
        )
    }

    pub fn with_options(store: U, jwt_secret: String, options: EngineOptions) -> Self {
        let store = Arc::new(store);
        let notifications = Arc::new(NotificationHub::new());
        let notifier: Arc<dyn Notifier> = match options.notifier {
            Some(notifier) => notifier,
            None => notifications.clone(),
        };

        Self {
            trips: MembershipEngine::new(store.clone(), options.clock.clone()),
            trip_invitations: TripInvitationEngine::new(
                store.clone(),
                notifier.clone(),
                options.clock.clone(),
            ),
            friends: FriendEngine::new(store.clone(), notifier, options.clock, options.cooldown),
            store,
            notifications,
            jwt_secret,
            request_timeout: options.request_timeout,
        }
    }

    /// Contesto con la deadline di una richiesta HTTP
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}
