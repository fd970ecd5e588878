//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server
//! e i DTO di creazione passati ai repository.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod friend;
pub mod invitation;
pub mod trip;
pub mod trip_invitation;

// Re-exports per facilitare l'import
pub use friend::{
    AddFriendDTO, CooldownStatusDTO, CreateFriendInvitationDTO, CreateInvitationCooldownDTO,
    FriendDTO, FriendInvitationDTO,
};
pub use invitation::{InvitationAction, InvitationResolutionDTO};
pub use trip::{CreateTripDTO, CreateTripMemberDTO, TripDTO, TripMemberDTO};
pub use trip_invitation::{CreateTripInvitationDTO, SendTripInvitationDTO, TripInvitationDTO};
