//! HTTP client for the Inki key server

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use tracing::{debug, info, warn};

use inki_core::{encode, Key, SigningIdentity};

use crate::error::{ClientError, Result};

/// A `user@host[:port]` submission target, as typed on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub user: String,
    /// Server root, e.g. `http://keys.example.com:3000`
    pub server: String,
}

impl FromStr for Target {
    type Err = ClientError;

    /// Parse `[scheme://]user@host[:port]`; the scheme defaults to `http`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ClientError::InvalidTarget(s.to_string());

        let (scheme, rest) = match s.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => ("http", s),
        };

        let (user, host) = rest.rsplit_once('@').ok_or_else(invalid)?;
        let host = host.trim_end_matches('/');
        if user.is_empty() || host.is_empty() || host.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            user: user.to_string(),
            server: format!("{}://{}", scheme, host),
        })
    }
}

/// Client for submitting and fetching keys
#[derive(Debug, Clone)]
pub struct KeyClient {
    base_url: String,
    http: Client,
}

impl KeyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Use a preconfigured `reqwest` client (timeouts, proxies, ...)
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    /// Sign every key and submit them as one batch.
    ///
    /// The server accepts all of them or none; the accepted keys are returned.
    pub async fn add_keys(&self, keys: &[Key], identity: &SigningIdentity) -> Result<Vec<Key>> {
        if keys.is_empty() {
            return Err(ClientError::Envelope("no keys to submit".into()));
        }
        let body = signed_request(keys, identity)?;

        for key in keys {
            info!(
                user = %key.user,
                expires = %key.expires,
                fingerprint = %key.fingerprint(),
                "Submitting key"
            );
        }

        let response = self
            .http
            .post(self.url(&["api", "v1", "keys"])?)
            .body(body)
            .send()
            .await?;
        decode(response).await
    }

    /// Submit a single key valid until `expires`
    pub async fn add_key(
        &self,
        user: &str,
        public_key: &str,
        expires: DateTime<Utc>,
        identity: &SigningIdentity,
    ) -> Result<Vec<Key>> {
        let key = Key::new(user, public_key.trim(), expires);
        self.add_keys(&[key], identity).await
    }

    /// Every key on the server
    pub async fn list_keys(&self) -> Result<Vec<Key>> {
        self.get(&["api", "v1", "keys"]).await
    }

    pub async fn user_keys(&self, user: &str) -> Result<Vec<Key>> {
        self.get(&["api", "v1", "user", user, "keys"]).await
    }

    /// One of `user`'s keys by fingerprint; `None` when the server has no match
    pub async fn user_key(&self, user: &str, fingerprint: &str) -> Result<Option<Key>> {
        match self.get(&["api", "v1", "user", user, "key", fingerprint]).await {
            Ok(key) => Ok(Some(key)),
            Err(ClientError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `authorized_keys` text for `user`.
    ///
    /// Keys are re-validated locally; invalid or expired ones are skipped
    /// unless `include_expired` is set, in which case only syntactically
    /// invalid keys are dropped.
    pub async fn authorized_keys(&self, user: &str, include_expired: bool) -> Result<String> {
        let keys = self.user_keys(user).await?;
        Ok(render_authorized_keys(&keys, Utc::now(), include_expired))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments)?;
        debug!(url = %url, "GET");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let invalid = || ClientError::InvalidUrl(self.base_url.clone());

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Clearsign each key's canonical payload into one envelope stream
pub fn signed_request(keys: &[Key], identity: &SigningIdentity) -> Result<Vec<u8>> {
    let payloads: Vec<String> = keys.iter().map(Key::canonical_payload).collect();
    Ok(encode(&payloads, identity)?)
}

/// Render keys as `authorized_keys` lines, in order
pub fn render_authorized_keys(keys: &[Key], now: DateTime<Utc>, include_expired: bool) -> String {
    let mut out = String::new();
    for key in keys {
        let check = match key.validate_at(now) {
            Err(inki_core::KeyValidationError::Expired(_)) if include_expired => Ok(()),
            other => other,
        };

        match check {
            Ok(()) => {
                out.push_str(key.authorized_key_line());
                out.push('\n');
            }
            Err(e) => {
                warn!(user = %key.user, expires = %key.expires, error = %e, "Skipping key");
            }
        }
    }
    out
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}
