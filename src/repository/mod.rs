//! Database repository layer

pub mod project_repo;
pub mod scope;
pub mod ticket_repo;
pub mod user_repo;

pub use project_repo::ProjectRepository;
pub use scope::{Owned, OwnerScope};
pub use ticket_repo::TicketRepository;
pub use user_repo::{UserChanges, UserRepository};
