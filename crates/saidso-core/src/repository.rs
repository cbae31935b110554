//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and return [`SaidsoResult`].
//! Implementations live in `saidso-db`; tests may provide in-memory
//! doubles.

use uuid::Uuid;

use crate::error::SaidsoResult;
use crate::models::{
    credential::{CreateCredential, CredentialPurpose, EphemeralCredential},
    device::{DeviceRecord, UpsertDevice},
    token::{CreateToken, Token},
    user::{CreateUser, UpdateUser, User},
};

pub trait UserRepository: Send + Sync {
    /// Create a user. Raw passwords are hashed by the implementation.
    /// Fails `AlreadyExists` on duplicate email or username.
    fn create(&self, input: CreateUser) -> impl Future<Output = SaidsoResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SaidsoResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = SaidsoResult<User>> + Send;
    fn get_by_federated_id(
        &self,
        federated_id: &str,
    ) -> impl Future<Output = SaidsoResult<User>> + Send;
    fn username_exists(&self, username: &str) -> impl Future<Output = SaidsoResult<bool>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = SaidsoResult<User>> + Send;
    /// Replace the stored password hash with a hash of `raw_password`.
    fn set_password(
        &self,
        id: Uuid,
        raw_password: &str,
    ) -> impl Future<Output = SaidsoResult<()>> + Send;
    /// Stamp `last_login_at = now`.
    fn record_login(&self, id: Uuid) -> impl Future<Output = SaidsoResult<()>> + Send;
}

pub trait TokenRepository: Send + Sync {
    fn create(&self, input: CreateToken) -> impl Future<Output = SaidsoResult<Token>> + Send;
    fn get_by_hash(&self, token_hash: &str) -> impl Future<Output = SaidsoResult<Token>> + Send;
    /// Atomically delete the row matching `token_hash` and return its
    /// prior value. Of any number of concurrent callers presenting the
    /// same digest, exactly one observes `Some`.
    fn take_by_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = SaidsoResult<Option<Token>>> + Send;
    /// Idempotent: deleting an absent token is not an error.
    fn delete(&self, id: Uuid) -> impl Future<Output = SaidsoResult<()>> + Send;
    /// Remove all expired rows; returns how many were dropped.
    fn delete_expired(&self) -> impl Future<Output = SaidsoResult<u64>> + Send;
}

pub trait CredentialRepository: Send + Sync {
    fn create(
        &self,
        input: CreateCredential,
    ) -> impl Future<Output = SaidsoResult<EphemeralCredential>> + Send;
    /// Delete every live credential for `(subject, purpose)`; returns
    /// the number removed. Guarantees the at-most-one-live invariant
    /// when called before insertion.
    fn purge(
        &self,
        subject: &str,
        purpose: CredentialPurpose,
    ) -> impl Future<Output = SaidsoResult<u64>> + Send;
    /// Atomically delete the credential matching `(token, purpose)`
    /// and return its prior value. Exactly one of any concurrent
    /// callers observes `Some` — this is what makes consumption
    /// exactly-once.
    fn take_by_token(
        &self,
        token: &str,
        purpose: CredentialPurpose,
    ) -> impl Future<Output = SaidsoResult<Option<EphemeralCredential>>> + Send;
    fn delete_expired(&self) -> impl Future<Output = SaidsoResult<u64>> + Send;
}

pub trait DeviceRepository: Send + Sync {
    /// Insert or refresh the `(user, ip, device_class)` row, stamping
    /// `last_active_at = now`.
    fn upsert(&self, input: UpsertDevice) -> impl Future<Output = SaidsoResult<()>> + Send;
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = SaidsoResult<Vec<DeviceRecord>>> + Send;
}
