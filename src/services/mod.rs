//! Business logic services layer

pub mod auth_service;
pub mod project_service;
pub mod ticket_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use project_service::ProjectService;
pub use ticket_service::TicketService;
pub use user_service::UserService;
