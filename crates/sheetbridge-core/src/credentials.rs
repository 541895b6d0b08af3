//! Service-account credentials and bearer token exchange.
//!
//! Google service accounts authenticate by signing a short-lived RS256 JWT
//! with their private key and trading it at the token endpoint for an OAuth
//! access token. [`TokenSource`] performs that exchange on first use and
//! caches the result until shortly before it expires.

use std::{fmt, path::Path};

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use ring::signature::RsaKeyPair;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{ConfigError, SheetsError};

/// Default OAuth token endpoint for Google service accounts.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Static credentials used to reach the spreadsheet.
#[derive(Clone)]
pub enum Credentials {
    /// A service account that signs JWTs to obtain access tokens.
    ServiceAccount(ServiceAccount),
    /// A pre-issued OAuth access token, used as-is.
    AccessToken(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceAccount(account) => f.debug_tuple("ServiceAccount").field(account).finish(),
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"<redacted>").finish(),
        }
    }
}

/// The subset of a Google service account key needed for token exchange.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: u64,
}

impl ServiceAccount {
    /// Creates a service account from an email and PEM private key.
    ///
    /// Keys copied out of `.env` files often carry literal `\n` sequences in
    /// place of line breaks; those are turned back into newlines.
    pub fn new(client_email: impl Into<String>, private_key: &str) -> Self {
        Self {
            client_email: client_email.into(),
            private_key: normalize_private_key(private_key),
            token_uri: default_token_uri(),
        }
    }

    /// Parses a JSON service account key as downloaded from the Google Cloud
    /// console.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KeyFile`] if the JSON is malformed or lacks
    /// `client_email` / `private_key`.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let mut account: Self = serde_json::from_str(input)?;
        account.private_key = normalize_private_key(&account.private_key);
        Ok(account)
    }

    /// Reads and parses a JSON service account key file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::KeyFile`] if it cannot be parsed.
    pub fn from_key_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Overrides the token endpoint.
    #[must_use]
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Builds the signed JWT assertion presented to the token endpoint.
    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, SheetsError> {
        let claims = JwtClaims {
            iss: &self.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{header_b64}.{claims_b64}");

        let key_pair = load_key_pair(&self.private_key)?;

        // PKCS#1 v1.5 with SHA-256 (RS256)
        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| SheetsError::Auth("failed to sign JWT assertion".to_string()))?;

        let signature_b64 = BASE64_URL_SAFE_NO_PAD.encode(&signature);
        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Exchanges a freshly signed assertion for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Auth`] if the key cannot be used or the token
    /// endpoint rejects the assertion, and [`SheetsError::Http`] on transport
    /// failures.
    pub async fn fetch_access_token(
        &self,
        http: &reqwest::Client,
    ) -> Result<AccessToken, SheetsError> {
        let assertion = self.signed_assertion(Utc::now())?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = http.post(&self.token_uri).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        Ok(response.json::<AccessToken>().await?)
    }
}

fn normalize_private_key(key: &str) -> String {
    key.replace("\\n", "\n").trim().to_string()
}

fn load_key_pair(pem: &str) -> Result<RsaKeyPair, SheetsError> {
    let mut reader = std::io::Cursor::new(pem.as_bytes());
    let item = rustls_pemfile::read_one(&mut reader)
        .map_err(|e| SheetsError::Auth(format!("invalid PEM private key: {e}")))?;

    match item {
        Some(rustls_pemfile::Item::Pkcs8Key(der)) => RsaKeyPair::from_pkcs8(der.secret_pkcs8_der())
            .map_err(|e| SheetsError::Auth(format!("rejected pkcs8 private key: {e}"))),
        Some(rustls_pemfile::Item::Pkcs1Key(der)) => RsaKeyPair::from_der(der.secret_pkcs1_der())
            .map_err(|e| SheetsError::Auth(format!("rejected pkcs1 private key: {e}"))),
        _ => Err(SheetsError::Auth(
            "private key is not an RSA key in PEM format".to_string(),
        )),
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Hands out bearer tokens for [`Credentials`], caching service account
/// tokens until they are about to expire.
///
/// Concurrent callers that find the cache stale wait on the same refresh
/// rather than each hitting the token endpoint.
#[derive(Debug)]
pub struct TokenSource {
    credentials: Credentials,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(credentials: Credentials, http: reqwest::Client) -> Self {
        Self {
            credentials,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Returns a bearer token, exchanging credentials if needed.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`ServiceAccount::fetch_access_token`].
    pub async fn token(&self) -> Result<String, SheetsError> {
        let account = match &self.credentials {
            Credentials::AccessToken(token) => return Ok(token.clone()),
            Credentials::ServiceAccount(account) => account,
        };

        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref()
            && token.is_fresh(now)
        {
            return Ok(token.token.clone());
        }

        let fresh = account.fetch_access_token(&self.http).await?;
        debug!(
            client_email = %account.client_email,
            expires_in = fresh.expires_in,
            "Fetched service account access token"
        );

        let lifetime = i64::try_from(fresh.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::hours(1));
        let token = fresh.access_token;
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: now + lifetime,
        });

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, method, path},
    };

    use super::*;

    const TEST_KEY: &str = include_str!("../tests/fixtures/test_key.pem");
    const TEST_KEY_PKCS1: &str = include_str!("../tests/fixtures/test_key_pkcs1.pem");

    fn decode_segment(segment: &str) -> Value {
        let bytes = BASE64_URL_SAFE_NO_PAD.decode(segment).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn token_response(token: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "expires_in": 3599,
            "token_type": "Bearer"
        }))
    }

    #[test]
    fn test_new_normalizes_escaped_newlines() {
        let escaped = TEST_KEY.replace('\n', "\\n");
        let account = ServiceAccount::new("bot@example.iam.gserviceaccount.com", &escaped);

        assert_eq!(account.private_key, TEST_KEY.trim());
        assert_eq!(account.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_from_json_defaults_token_uri() {
        let key = json!({
            "type": "service_account",
            "client_email": "bot@example.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
        });
        let account = ServiceAccount::from_json(&key.to_string()).unwrap();

        assert_eq!(account.client_email, "bot@example.iam.gserviceaccount.com");
        assert_eq!(account.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_from_json_missing_private_key_fails() {
        let err = ServiceAccount::from_json(r#"{"client_email": "bot@example.com"}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `private_key`"));
    }

    #[test]
    fn test_from_key_file_reads_json() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let key = json!({
            "client_email": "bot@example.com",
            "private_key": TEST_KEY,
            "token_uri": "https://tokens.example.com/token",
        });
        std::fs::write(file.path(), key.to_string()).unwrap();

        let account = ServiceAccount::from_key_file(file.path()).unwrap();
        assert_eq!(account.token_uri, "https://tokens.example.com/token");
    }

    #[test]
    fn test_from_key_file_missing_file_reports_path() {
        let err = ServiceAccount::from_key_file(Path::new("/nonexistent/key.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/key.json"));
    }

    #[test]
    fn test_signed_assertion_has_rs256_header_and_claims() {
        let account = ServiceAccount::new("bot@example.com", TEST_KEY)
            .with_token_uri("https://tokens.example.com/token");
        let now = Utc::now();

        let jwt = account.signed_assertion(now).unwrap();
        let parts: Vec<&str> = jwt.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header = decode_segment(parts[0]);
        assert_eq!(header, json!({"alg": "RS256", "typ": "JWT"}));

        let claims = decode_segment(parts[1]);
        assert_eq!(claims["iss"], "bot@example.com");
        assert_eq!(claims["scope"], SPREADSHEETS_SCOPE);
        assert_eq!(claims["aud"], "https://tokens.example.com/token");
        assert_eq!(claims["iat"], now.timestamp());
        assert_eq!(claims["exp"], now.timestamp() + 3600);

        // 2048-bit key -> 256-byte signature
        let signature = BASE64_URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        assert_eq!(signature.len(), 256);
    }

    #[test]
    fn test_signed_assertion_accepts_pkcs1_key() {
        let account = ServiceAccount::new("bot@example.com", TEST_KEY_PKCS1);
        assert!(account.signed_assertion(Utc::now()).is_ok());
    }

    #[test]
    fn test_signed_assertion_rejects_garbage_key() {
        let account = ServiceAccount::new("bot@example.com", "not a key");
        let err = account.signed_assertion(Utc::now()).unwrap_err();
        assert!(matches!(err, SheetsError::Auth(_)));
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let token = format!("{:?}", Credentials::AccessToken("ya29.secret".to_string()));
        assert!(!token.contains("ya29.secret"));

        let account = format!(
            "{:?}",
            Credentials::ServiceAccount(ServiceAccount::new("bot@example.com", TEST_KEY))
        );
        assert!(account.contains("bot@example.com"));
        assert!(!account.contains("PRIVATE KEY"));
    }

    #[tokio::test]
    async fn test_fetch_access_token_posts_jwt_bearer_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .and(body_string_contains("assertion="))
            .respond_with(token_response("ya29.fresh"))
            .expect(1)
            .mount(&server)
            .await;

        let account = ServiceAccount::new("bot@example.com", TEST_KEY)
            .with_token_uri(format!("{}/token", server.uri()));
        let token = account
            .fetch_access_token(&reqwest::Client::new())
            .await
            .unwrap();

        assert_eq!(token.access_token, "ya29.fresh");
        assert_eq!(token.expires_in, 3599);
    }

    #[tokio::test]
    async fn test_fetch_access_token_rejection_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let account = ServiceAccount::new("bot@example.com", TEST_KEY)
            .with_token_uri(format!("{}/token", server.uri()));
        let err = account
            .fetch_access_token(&reqwest::Client::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SheetsError::Auth(_)));
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_token_source_caches_service_account_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(token_response("ya29.cached"))
            .expect(1)
            .mount(&server)
            .await;

        let account = ServiceAccount::new("bot@example.com", TEST_KEY)
            .with_token_uri(format!("{}/token", server.uri()));
        let source = TokenSource::new(Credentials::ServiceAccount(account), reqwest::Client::new());

        assert_eq!(source.token().await.unwrap(), "ya29.cached");
        assert_eq!(source.token().await.unwrap(), "ya29.cached");
    }

    #[tokio::test]
    async fn test_token_source_returns_static_access_token() {
        let source = TokenSource::new(
            Credentials::AccessToken("ya29.static".to_string()),
            reqwest::Client::new(),
        );
        assert_eq!(source.token().await.unwrap(), "ya29.static");
    }

    #[test]
    fn test_cached_token_freshness_respects_refresh_margin() {
        let now = Utc::now();
        let token = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(!token.is_fresh(now));

        let token = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::minutes(10),
        };
        assert!(token.is_fresh(now));
    }
}
