//! API key lookup.
//!
//! Keys come from an environment variable first, for headless runs, then
//! from the OS keychain. The resolved [`ApiKey`] is handed to the client
//! explicitly; nothing here is global.

use log::{debug, warn};

use std::{fmt::Debug, process::Command};

use crate::error::ReportError;

/// Where to look for one service's API key.
#[derive(Clone, Copy, Debug)]
pub struct CredentialSpec {
    /// Human-readable service name, for error messages.
    pub name: &'static str,
    pub env_var: &'static str,
    /// Keychain service and account names.
    pub service: &'static str,
    pub account: &'static str,
}

pub const STATS_CREDENTIAL: CredentialSpec = CredentialSpec {
    name: "dist analytics",
    env_var: "DIST_ANALYTICS_KEY",
    service: "dist-analytics",
    account: "api_key",
};

pub const ORDERS_CREDENTIAL: CredentialSpec = CredentialSpec {
    name: "LemonSqueezy",
    env_var: "LEMONSQUEEZY_API_KEY",
    service: "lemonsqueezy",
    account: "api_key",
};

/// A bearer token. Its `Debug` output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// A store of named secrets.
pub trait SecretStore {
    fn lookup(&self, service: &str, account: &str) -> Option<String>;
}

/// The macOS login keychain, read through the `security` tool.
#[derive(Clone, Copy, Debug, Default)]
pub struct Keychain;

impl SecretStore for Keychain {
    fn lookup(&self, service: &str, account: &str) -> Option<String> {
        debug!("looking up {service}/{account} in keychain");
        let output = Command::new("security")
            .args(["find-generic-password", "-s", service, "-a", account, "-w"])
            .output();
        match output {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                debug!("keychain lookup exited with {}", output.status);
                None
            }
            Err(e) => {
                warn!("can't run security tool: {e}");
                None
            }
        }
    }
}

impl CredentialSpec {
    /// Resolves the key from `env`, falling back to `store`.
    ///
    /// Blank values count as missing in both places.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::CredentialMissing`] if neither source has a key.
    pub fn resolve<E, S>(&self, env: E, store: &S) -> Result<ApiKey, ReportError>
    where
        E: Fn(&str) -> Option<String>,
        S: SecretStore + ?Sized,
    {
        let non_blank = |key: String| {
            let key = key.trim();
            (!key.is_empty()).then(|| ApiKey::new(key))
        };
        if let Some(key) = env(self.env_var).and_then(non_blank) {
            debug!("using {} key from {}", self.name, self.env_var);
            return Ok(key);
        }
        store
            .lookup(self.service, self.account)
            .and_then(non_blank)
            .ok_or(ReportError::CredentialMissing {
                name: self.name,
                env_var: self.env_var,
                service: self.service,
                account: self.account,
            })
    }

    /// Resolves the key from the process environment and the keychain.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::CredentialMissing`] if neither source has a key.
    pub fn resolve_default(&self) -> Result<ApiKey, ReportError> {
        self.resolve(|var| std::env::var(var).ok(), &Keychain)
    }
}
