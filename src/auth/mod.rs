pub mod credentials;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod roles;
pub mod session;

pub use handlers::router;
