//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod enums;
pub mod friend;
pub mod trip;
pub mod trip_invitation;
pub mod trip_member;
pub mod user;

// Re-exports per facilitare l'import
pub use enums::{InvitationStatus, TripRole, TripStatus};
pub use friend::{Friend, FriendInvitation, InvitationCooldown, canonical_pair};
pub use trip::Trip;
pub use trip_invitation::TripInvitation;
pub use trip_member::TripMember;
pub use user::User;
