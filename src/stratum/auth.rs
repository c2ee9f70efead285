// src/stratum/auth.rs
//! Credential checks for pool miners.

use std::collections::HashMap;

/// Decides whether a username/password pair may mine on the pool
pub trait Authenticator: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Fixed username/password table
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    credentials: HashMap<String, String>,
}

impl StaticAuthenticator {
    pub fn new(credentials: HashMap<String, String>) -> Self {
        StaticAuthenticator { credentials }
    }
}

impl Authenticator for StaticAuthenticator {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.credentials
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}

/// Accepts any non-empty username
///
/// Only used when the configuration asks for an open pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAuthenticator;

impl Authenticator for OpenAuthenticator {
    fn verify(&self, username: &str, _password: &str) -> bool {
        !username.trim().is_empty()
    }
}
