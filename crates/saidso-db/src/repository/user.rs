//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use saidso_core::error::SaidsoResult;
use saidso_core::models::user::{CreateUser, LoginMethod, UpdateUser, User};
use saidso_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    email: String,
    password_hash: Option<String>,
    username: Option<String>,
    name: String,
    country: Option<String>,
    avatar: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
    login_method: String,
    federated_id: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    is_profile_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: String,
    password_hash: Option<String>,
    username: Option<String>,
    name: String,
    country: Option<String>,
    avatar: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
    login_method: String,
    federated_id: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    is_profile_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_login_method(s: &str) -> Result<LoginMethod, DbError> {
    match s {
        "Password" => Ok(LoginMethod::Password),
        "Federated" => Ok(LoginMethod::Federated),
        other => Err(DbError::Migration(format!(
            "unknown login method: {other}"
        ))),
    }
}

fn login_method_to_string(m: &LoginMethod) -> &'static str {
    match m {
        LoginMethod::Password => "Password",
        LoginMethod::Federated => "Federated",
    }
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            username: self.username,
            name: self.name,
            country: self.country,
            avatar: self.avatar,
            email_verified_at: self.email_verified_at,
            login_method: parse_login_method(&self.login_method)?,
            federated_id: self.federated_id,
            last_login_at: self.last_login_at,
            is_profile_completed: self.is_profile_completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            username: self.username,
            name: self.name,
            country: self.country,
            avatar: self.avatar,
            email_verified_at: self.email_verified_at,
            login_method: parse_login_method(&self.login_method)?,
            federated_id: self.federated_id,
            last_login_at: self.last_login_at,
            is_profile_completed: self.is_profile_completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Migration(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Migration(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> SaidsoResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = match &input.password {
            Some(raw) => Some(hash_password(raw, self.pepper.as_deref())?),
            None => None,
        };

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email = $email, \
                 password_hash = $password_hash, \
                 username = $username, \
                 name = $name, \
                 country = NONE, \
                 avatar = $avatar, \
                 email_verified_at = $email_verified_at, \
                 login_method = $login_method, \
                 federated_id = $federated_id, \
                 last_login_at = NONE, \
                 is_profile_completed = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .bind(("username", input.username))
            .bind(("name", input.name))
            .bind(("avatar", input.avatar))
            .bind(("email_verified_at", input.email_verified_at))
            .bind((
                "login_method",
                login_method_to_string(&input.login_method).to_string(),
            ))
            .bind(("federated_id", input.federated_id))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> SaidsoResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, email: &str) -> SaidsoResult<User> {
        let email_owned = email.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email_owned}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn get_by_federated_id(&self, federated_id: &str) -> SaidsoResult<User> {
        let federated_id_owned = federated_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE federated_id = $federated_id",
            )
            .bind(("federated_id", federated_id_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("federated_id={federated_id_owned}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn username_exists(&self, username: &str) -> SaidsoResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE username = $username GROUP ALL",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> SaidsoResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.username.is_some() {
            sets.push("username = $username");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.country.is_some() {
            sets.push("country = $country");
        }
        if input.avatar.is_some() {
            sets.push("avatar = $avatar");
        }
        if input.email_verified_at.is_some() {
            sets.push("email_verified_at = $email_verified_at");
        }
        if input.login_method.is_some() {
            sets.push("login_method = $login_method");
        }
        if input.federated_id.is_some() {
            sets.push("federated_id = $federated_id");
        }
        if input.last_login_at.is_some() {
            sets.push("last_login_at = $last_login_at");
        }
        if input.is_profile_completed.is_some() {
            sets.push("is_profile_completed = $is_profile_completed");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('user', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(country) = input.country {
            // country is Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("country", country));
        }
        if let Some(avatar) = input.avatar {
            builder = builder.bind(("avatar", avatar));
        }
        if let Some(email_verified_at) = input.email_verified_at {
            builder = builder.bind(("email_verified_at", email_verified_at));
        }
        if let Some(ref login_method) = input.login_method {
            builder = builder.bind((
                "login_method",
                login_method_to_string(login_method).to_string(),
            ));
        }
        if let Some(federated_id) = input.federated_id {
            builder = builder.bind(("federated_id", federated_id));
        }
        if let Some(last_login_at) = input.last_login_at {
            builder = builder.bind(("last_login_at", last_login_at));
        }
        if let Some(is_profile_completed) = input.is_profile_completed {
            builder = builder.bind(("is_profile_completed", is_profile_completed));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn set_password(&self, id: Uuid, raw_password: &str) -> SaidsoResult<()> {
        let password_hash = hash_password(raw_password, self.pepper.as_deref())?;

        self.db
            .query(
                "UPDATE type::record('user', $id) SET \
                 password_hash = $password_hash, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn record_login(&self, id: Uuid) -> SaidsoResult<()> {
        self.db
            .query(
                "UPDATE type::record('user', $id) SET \
                 last_login_at = time::now(), updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}

/// Verify a password against an Argon2id hash.
///
/// Public for use by the auth layer.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, DbError> {
    use argon2::PasswordVerifier;

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| DbError::Migration(format!("invalid hash format: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DbError::Migration(format!("verify error: {e}"))),
    }
}
