//! Bearer tokens for the Drive API.
//!
//! A service account signs an RS256 assertion and trades it at the token
//! endpoint; the resulting token is shared by every clone of the
//! [`Authenticator`] until shortly before it expires.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{DriveError, Result};
use crate::models::{ServiceAccountCredentials, TokenResponse};

/// Google OAuth2 token endpoint, used when the key file names none.
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Full read/write access to the account's files.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME: Duration = Duration::from_secs(3600);
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct Assertion<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

impl<'a> Assertion<'a> {
    fn new(credentials: &'a ServiceAccountCredentials, audience: &'a str, now: u64) -> Self {
        Self {
            iss: &credentials.client_email,
            scope: DRIVE_SCOPE,
            aud: audience,
            iat: now,
            exp: now + ASSERTION_LIFETIME.as_secs(),
        }
    }

    fn sign(&self, private_key_pem: &str) -> Result<String> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), self, &key)?)
    }
}

#[derive(Clone)]
struct IssuedToken {
    value: String,
    expires_at: SystemTime,
}

impl IssuedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > SystemTime::now() + EXPIRY_MARGIN
    }
}

#[derive(Clone)]
enum TokenSource {
    ServiceAccount(Arc<ServiceAccountCredentials>),
    Static(String),
}

/// Produces bearer tokens for the Drive API.
#[derive(Clone)]
pub struct Authenticator {
    source: TokenSource,
    http: Client,
    issued: Arc<RwLock<Option<IssuedToken>>>,
}

impl Authenticator {
    /// Load a service account key file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Parse a service account key already in memory.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Create an authenticator from parsed credentials.
    pub fn new(credentials: ServiceAccountCredentials) -> Self {
        Self::with_source(TokenSource::ServiceAccount(Arc::new(credentials)))
    }

    /// Use an access token issued elsewhere. It is never refreshed.
    pub fn from_access_token(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DriveError::AuthenticationError(
                "access token is empty".to_string(),
            ));
        }
        Ok(Self::with_source(TokenSource::Static(token)))
    }

    fn with_source(source: TokenSource) -> Self {
        Self {
            source,
            http: Client::new(),
            issued: Arc::new(RwLock::new(None)),
        }
    }

    /// Email of the service account, if this authenticator signs its own tokens.
    pub fn client_email(&self) -> Option<&str> {
        match &self.source {
            TokenSource::ServiceAccount(creds) => Some(&creds.client_email),
            TokenSource::Static(_) => None,
        }
    }

    /// A token valid for at least another minute.
    pub async fn access_token(&self) -> Result<String> {
        let credentials = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount(creds) => creds,
        };

        if let Some(token) = self.issued.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.exchange(credentials).await?;
        let value = token.value.clone();
        *self.issued.write().await = Some(token);
        Ok(value)
    }

    async fn exchange(&self, credentials: &ServiceAccountCredentials) -> Result<IssuedToken> {
        let token_uri = credentials.token_uri.as_deref().unwrap_or(TOKEN_URI);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let jwt = Assertion::new(credentials, token_uri, now).sign(&credentials.private_key)?;
        debug!(token_uri, client_email = %credentials.client_email, "exchanging assertion");

        let response = self
            .http
            .post(token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", jwt.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::TokenRefreshError(format!("{}: {}", status, body)));
        }

        let granted: TokenResponse = response.json().await?;
        Ok(IssuedToken {
            value: granted.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(granted.expires_in),
        })
    }
}
