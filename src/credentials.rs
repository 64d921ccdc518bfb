//! Service-account credentials and OAuth 2.0 access tokens.
//!
//! Tokens are obtained with the JWT-bearer grant: an RS256-signed assertion
//! naming the service account and the requested scopes is exchanged at the
//! key's `token_uri` for a short-lived access token.

use crate::error::CommentsError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a Google service-account key file the tool needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// A parsed key file together with its ready-to-use signing key.
pub struct Credentials {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
}

impl Credentials {
    /// Reads and validates a service-account key file.
    ///
    /// Every failure here is a `CommentsError::Credentials`, and nothing here
    /// touches the network.
    pub fn from_file(path: &Path) -> Result<Self, CommentsError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CommentsError::Credentials(format!(
                "cannot read credentials file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content).map_err(|e| match e {
            CommentsError::Credentials(msg) => {
                CommentsError::Credentials(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parses and validates service-account key JSON.
    pub fn from_json(json: &str) -> Result<Self, CommentsError> {
        let key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| CommentsError::Credentials(format!("invalid key file: {e}")))?;

        if key.key_type != "service_account" {
            return Err(CommentsError::Credentials(format!(
                "expected a service_account key, found type '{}'",
                key.key_type
            )));
        }

        if key.client_email.trim().is_empty() {
            return Err(CommentsError::Credentials(
                "client_email is empty".to_string(),
            ));
        }

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| CommentsError::Credentials(format!("invalid private_key: {e}")))?;

        Ok(Self { key, signing_key })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    pub fn token_uri(&self) -> &str {
        &self.key.token_uri
    }

    /// Signs a JWT-bearer assertion for the given scopes, issued at `now`.
    pub fn sign_assertion(
        &self,
        scopes: &[&str],
        now: DateTime<Utc>,
    ) -> Result<String, CommentsError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: scopes.join(" "),
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| CommentsError::Credentials(format!("cannot sign token request: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// OAuth 2.0 access token with its expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// True if the token is expired or expires within the refresh margin.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

/// Parses a token endpoint response.
/// Kept apart from the HTTP call so the status handling can be tested.
pub fn parse_token_response(
    status: u16,
    body: &str,
    now: DateTime<Utc>,
) -> Result<AccessToken, CommentsError> {
    let value: Option<Value> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let detail = value
            .as_ref()
            .and_then(|v| {
                let error = v.get("error")?.as_str()?;
                let description = v
                    .get("error_description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("");
                Some(format!("{error} {description}").trim().to_string())
            })
            .unwrap_or_else(|| body.trim().to_string());
        return Err(CommentsError::UpstreamAuth(format!(
            "token endpoint returned status {status}: {detail}"
        )));
    }

    let value = value.ok_or_else(|| {
        CommentsError::UpstreamAuth("token endpoint returned invalid JSON".to_string())
    })?;

    let token = value
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            CommentsError::UpstreamAuth("missing access_token in token response".to_string())
        })?
        .to_string();

    let expires_in = value
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(ASSERTION_LIFETIME_SECS);

    let expires_at = Some(expires_in)
        .filter(|secs| *secs >= 0)
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            CommentsError::UpstreamAuth(format!(
                "invalid expires_in {expires_in} in token response"
            ))
        })?;

    Ok(AccessToken { token, expires_at })
}

/// Builds the JWT-bearer token exchange: a form POST to the key's `token_uri`.
pub fn build_token_request(
    http: &reqwest::blocking::Client,
    token_uri: &str,
    assertion: &str,
) -> reqwest::Result<reqwest::blocking::Request> {
    let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)];
    http.post(token_uri).form(&params).build()
}

/// Source of bearer tokens for API requests.
pub trait TokenProvider {
    fn access_token(&self) -> Result<String, CommentsError>;
}

/// Exchanges signed assertions for access tokens, caching the current one.
pub struct ServiceAccountAuth {
    credentials: Credentials,
    scopes: Vec<&'static str>,
    http: reqwest::blocking::Client,
    cached: RefCell<Option<AccessToken>>,
}

impl ServiceAccountAuth {
    pub fn new(
        credentials: Credentials,
        scopes: Vec<&'static str>,
        http: reqwest::blocking::Client,
    ) -> Self {
        Self {
            credentials,
            scopes,
            http,
            cached: RefCell::new(None),
        }
    }

    fn request_token(&self) -> Result<AccessToken, CommentsError> {
        let now = Utc::now();
        let assertion = self.credentials.sign_assertion(&self.scopes, now)?;

        debug!(
            token_uri = self.credentials.token_uri(),
            scopes = ?self.scopes,
            "Requesting access token"
        );

        let response =
            build_token_request(&self.http, self.credentials.token_uri(), &assertion)
                .and_then(|request| self.http.execute(request))
                .map_err(|e| CommentsError::UpstreamAuth(format!("token request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            CommentsError::UpstreamAuth(format!("cannot read token response: {e}"))
        })?;

        parse_token_response(status, &body, now)
    }
}

impl TokenProvider for ServiceAccountAuth {
    fn access_token(&self) -> Result<String, CommentsError> {
        if let Some(token) = self.cached.borrow().as_ref() {
            if !token.is_expired(Utc::now()) {
                return Ok(token.token.clone());
            }
        }

        let token = self.request_token()?;
        info!(
            client_email = self.credentials.client_email(),
            expires_at = %token.expires_at,
            "Obtained access token"
        );
        let value = token.token.clone();
        *self.cached.borrow_mut() = Some(token);
        Ok(value)
    }
}
