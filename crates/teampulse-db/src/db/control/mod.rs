pub mod invitation;
pub mod organization;
pub mod user;

pub use invitation::{InvitationRepository, InvitationStore};
pub use organization::OrganizationRepository;
pub use user::UserRepository;
