//! SurrealDB repository implementations.

mod credential;
mod device;
mod token;
mod user;

pub use credential::SurrealCredentialRepository;
pub use device::SurrealDeviceRepository;
pub use token::SurrealTokenRepository;
pub use user::{SurrealUserRepository, verify_password};
