use log::debug;
use reqwest::{blocking::Client as HttpClient, header::ACCEPT, Url};
use serde::de::DeserializeOwned;

use std::time::Duration;

use crate::{
    credentials::ApiKey,
    error::{snippet, ReportError},
};

/// How long to wait for any single response.
pub const TIMEOUT: Duration = Duration::from_secs(15);

/// A blocking HTTP client for one API, authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct Client {
    http: HttpClient,
    base_url: String,
    key: ApiKey,
}

impl Client {
    /// Creates a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be initialised.
    pub fn new(base_url: impl Into<String>, key: ApiKey) -> Result<Self, ReportError> {
        let http = HttpClient::builder().timeout(TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!("initialised client for {base_url}");
        Ok(Self {
            http,
            base_url,
            key,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches `path` with the given query parameters and returns the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the request fails or times
    /// out, or the server answers with a non-success status.
    pub fn get_text(
        &self,
        path: &str,
        params: &[(&str, String)],
        accept: Option<&str>,
    ) -> Result<String, ReportError> {
        let raw = format!("{}{path}", self.base_url);
        let url = Url::parse_with_params(&raw, params).map_err(|e| ReportError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })?;
        debug!("GET {url}");
        let mut request = self.http.get(url).bearer_auth(self.key.expose());
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = request.send()?;
        let status = response.status();
        debug!("received status {status}");
        let body = response.text()?;
        if !status.is_success() {
            return Err(ReportError::Status {
                status,
                snippet: snippet(&body),
            });
        }
        Ok(body)
    }

    /// Fetches `path` and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// As for [`Self::get_text`], plus [`ReportError::MalformedResponse`] if
    /// the body isn't the expected JSON.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        accept: Option<&str>,
    ) -> Result<T, ReportError> {
        let body = self.get_text(path, params, accept)?;
        parse_json(&body)
    }
}

/// Decodes a response body, keeping the start of the body if it's unusable.
///
/// # Errors
///
/// Returns [`ReportError::MalformedResponse`] if `body` isn't valid JSON of
/// the expected shape.
pub fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ReportError> {
    serde_json::from_str(body).map_err(|source| ReportError::MalformedResponse {
        snippet: snippet(body),
        source,
    })
}
