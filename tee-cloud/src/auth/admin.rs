//! Administrator credentials from configuration
//!
//! The submitted username and password are compared as HMAC-SHA256 tags
//! with `verify_slice`, which runs in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    key: Vec<u8>,
    username_tag: Vec<u8>,
    password_tag: Vec<u8>,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl AdminCredentials {
    /// `key` only scopes the tags; any non-empty secret works.
    pub fn new(username: &str, password: &str, key: &[u8]) -> Self {
        let username = username.trim().to_lowercase();
        Self {
            username_tag: tag(key, username.as_bytes()).unwrap_or_default(),
            password_tag: tag(key, password.as_bytes()).unwrap_or_default(),
            key: key.to_vec(),
            username,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Admin login is disabled while either credential is blank.
    pub fn is_enabled(&self) -> bool {
        !self.username.is_empty() && !self.password_tag.is_empty()
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let username = username.trim().to_lowercase();
        // Evaluate both so timing does not reveal which one matched
        let user_ok = matches_tag(&self.key, username.as_bytes(), &self.username_tag);
        let pass_ok = matches_tag(&self.key, password.as_bytes(), &self.password_tag);
        user_ok & pass_ok
    }
}

fn tag(key: &[u8], value: &[u8]) -> Option<Vec<u8>> {
    if value.is_empty() {
        return None;
    }
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(value);
    Some(mac.finalize().into_bytes().to_vec())
}

fn matches_tag(key: &[u8], value: &[u8], expected: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(value);
    mac.verify_slice(expected).is_ok()
}
