//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza l'accesso ai dati in tre parti:
//! - `traits`: Unit of Work, executor e un trait per ogni entità
//! - `mysql`: implementazione su sqlx/MySQL, usata in produzione
//! - `memory`: implementazione in memoria, usata in sviluppo e nei test
//!
//! I servizi non conoscono il backend: ricevono un `UnitOfWork`, aprono una
//! transazione con `begin()` e passano lo stesso executor a tutte le chiamate.

pub mod memory;
pub mod mysql;
pub mod traits;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{
    CooldownRepository, Executor, FriendInvitationRepository, FriendRepository, Repositories,
    TripInvitationRepository, TripMemberRepository, TripRepository, UnitOfWork, UserRepository,
};

pub use memory::{MemoryStore, MemoryTables};
pub use mysql::{MySqlExecutor, MySqlStore};

/// `true` se l'errore è una violazione di un vincolo UNIQUE
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
