//! Shared application state.

use saidso_auth::{
    AuthConfig, CredentialService, DeviceRecorder, IdentityService, RefreshRotator, TokenIssuer,
};
use saidso_db::DbManager;
use saidso_db::repository::{
    SurrealCredentialRepository, SurrealDeviceRepository, SurrealTokenRepository,
    SurrealUserRepository,
};
use surrealdb::engine::any::Any;

use crate::blob::LocalBlobStore;
use crate::config::ServerConfig;
use crate::google::GoogleOAuth;
use crate::notifier::MailNotifier;

pub type UserRepo = SurrealUserRepository<Any>;
pub type TokenRepo = SurrealTokenRepository<Any>;
pub type CredentialRepo = SurrealCredentialRepository<Any>;
pub type DeviceRepo = SurrealDeviceRepository<Any>;

#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityService<UserRepo>,
    pub issuer: TokenIssuer<TokenRepo>,
    pub rotator: RefreshRotator<TokenRepo>,
    pub credentials: CredentialService<CredentialRepo, MailNotifier>,
    pub devices: DeviceRecorder<DeviceRepo>,
    pub users: UserRepo,
    pub blobs: LocalBlobStore,
    pub google: Option<GoogleOAuth>,
    pub auth_config: AuthConfig,
}

impl AppState {
    /// Wire every service against the given database connection.
    pub fn build(db: &DbManager, config: &ServerConfig) -> Self {
        let client = db.client().clone();
        let auth_config = config.auth.clone();

        let users = match &auth_config.pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(client.clone(), pepper.clone()),
            None => SurrealUserRepository::new(client.clone()),
        };

        let issuer = TokenIssuer::new(
            SurrealTokenRepository::new(client.clone()),
            auth_config.clone(),
        );
        let notifier = MailNotifier::from_config(config);

        Self {
            identity: IdentityService::new(users.clone(), auth_config.clone()),
            rotator: RefreshRotator::new(issuer.clone()),
            credentials: CredentialService::new(
                SurrealCredentialRepository::new(client.clone()),
                notifier,
                auth_config.clone(),
            ),
            devices: DeviceRecorder::new(SurrealDeviceRepository::new(client)),
            issuer,
            users,
            blobs: LocalBlobStore::new(&config.avatar_storage_dir),
            google: config.google.as_ref().map(GoogleOAuth::new),
            auth_config,
        }
    }
}
