use thiserror::Error;

/// How much of an unusable response body to show in an error message.
pub const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(
        "no {name} API key found\n  \
         Set {env_var} env var, or add to keychain:\n  \
         security add-generic-password -s {service} -a {account} -w YOUR_KEY"
    )]
    CredentialMissing {
        name: &'static str,
        env_var: &'static str,
        service: &'static str,
        account: &'static str,
    },

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected http status {status}: {snippet}")]
    Status {
        status: reqwest::StatusCode,
        snippet: String,
    },

    #[error("bad API response: {snippet}")]
    MalformedResponse {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Returns the start of `body`, for diagnosing a bad response.
#[must_use]
pub fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_CHARS).collect()
}
