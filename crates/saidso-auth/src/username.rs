//! Unique username generation for federated signups.

use saidso_core::repository::UserRepository;

use crate::error::AuthResult;

/// Maximum stored username length.
pub const MAX_USERNAME_LEN: usize = 20;
/// Base slug length, leaving room for a numeric suffix.
const MAX_BASE_LEN: usize = 15;

/// Slugify a display name: lowercase alphanumerics with single dashes
/// for separator runs. Falls back to `"user"` when nothing survives.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() { "user".into() } else { slug }
}

/// Derive a unique username from a display name.
///
/// The slug is truncated to 15 characters, then an increasing integer
/// suffix starting at 1 is appended until no collision remains.
pub async fn generate_unique<U: UserRepository>(users: &U, display_name: &str) -> AuthResult<String> {
    let mut base = slugify(display_name);
    base.truncate(MAX_BASE_LEN);

    let mut candidate = base.clone();
    let mut counter: u32 = 1;

    while users.username_exists(&candidate).await? {
        candidate = format!("{base}{counter}");
        candidate.truncate(MAX_USERNAME_LEN);
        counter += 1;
    }

    Ok(candidate)
}
