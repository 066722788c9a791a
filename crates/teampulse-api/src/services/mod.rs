pub mod invitation;
pub mod sweeper;

pub use invitation::{InvitationService, InvitationSettings};
pub use sweeper::ExpirySweeper;
