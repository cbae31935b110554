//! Saidso Auth — credential validation and account resolution,
//! capability-scoped bearer token issuance, refresh rotation, and the
//! single-use ephemeral credential flows.
//!
//! Every service in this crate is generic over the `saidso-core`
//! repository traits, so the auth layer has no dependency on the
//! database crate.

pub mod avatar;
pub mod config;
pub mod credential;
pub mod device;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod password;
pub mod rotator;
pub mod token;
pub mod username;

pub use config::AuthConfig;
pub use credential::CredentialService;
pub use device::DeviceRecorder;
pub use error::{AuthError, AuthResult};
pub use identity::{FederatedProfile, IdentityService, RegisterInput};
pub use issuer::{IssuedToken, TokenIssuer, TokenPair};
pub use rotator::{RefreshRotator, RotatedPair};
