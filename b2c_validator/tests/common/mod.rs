//! Shared fixtures: a stand-in B2C provider and a token mint

#![allow(dead_code)]

use b2c_jose::b64::Base64Url;
use b2c_jose::clock::UnixTime;
use b2c_jose::jwt::{Claims, Headers, Jwt};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_NAME: &str = "contoso";
pub const TENANT_ID: &str = "tid-1";
pub const APP_ID: &str = "abc123";
pub const POLICY: &str = "B2C_1_signup";
pub const KEY_ID: &str = "k1";

pub const METADATA_PATH: &str = "/contoso/B2C_1_signup/v2.0/.well-known/openid-configuration";
pub const JWKS_PATH: &str = "/contoso/B2C_1_signup/discovery/v2.0/keys";

const PRIVATE_KEY_PKCS8: &[u8] = include_bytes!("../data/key.pk8");
const JWKS_DOCUMENT: &str = include_str!("../data/jwks.json");

/// A wiremock server posing as the tenant's B2C endpoints
pub struct MockProvider {
    pub server: MockServer,
}

impl MockProvider {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// The URL a validator should use in place of the derived well-known
    /// configuration URL
    pub fn metadata_url(&self) -> String {
        format!("{}{METADATA_PATH}", self.server.uri())
    }

    /// Serves a metadata document pointing at this server's JWKS endpoint
    pub async fn with_metadata(&self) {
        Mock::given(method("GET"))
            .and(path(METADATA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": format!("https://{TENANT_NAME}.b2clogin.com/{TENANT_ID}/v2.0/"),
                "jwks_uri": format!("{}{JWKS_PATH}", self.server.uri()),
            })))
            .mount(&self.server)
            .await;
    }

    /// Serves a metadata document that lacks a `jwks_uri`
    pub async fn with_metadata_missing_jwks_uri(&self) {
        Mock::given(method("GET"))
            .and(path(METADATA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": format!("https://{TENANT_NAME}.b2clogin.com/{TENANT_ID}/v2.0/"),
            })))
            .mount(&self.server)
            .await;
    }

    /// Serves the checked-in JWKS document
    pub async fn with_jwks(&self) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(JWKS_DOCUMENT, "application/json"),
            )
            .mount(&self.server)
            .await;
    }

    /// Serves an error from the JWKS endpoint
    pub async fn with_jwks_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Serves a body from the JWKS endpoint that is not a key set
    pub async fn with_jwks_garbage(&self) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("certainly not a key set"))
            .mount(&self.server)
            .await;
    }

    /// Serves an error from the metadata endpoint
    pub async fn with_metadata_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(METADATA_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// How many requests this server has seen for `p`
    pub async fn requests_to(&self, p: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.url.path() == p)
            .count()
    }
}

/// The issuer the test tenant stamps into its tokens
pub fn issuer() -> String {
    format!("https://{TENANT_NAME}.b2clogin.com/{TENANT_ID}/v2.0")
}

/// A fully valid claim set relative to `now`
pub fn valid_claims(now: UnixTime) -> Claims {
    Claims::new()
        .with_audience(APP_ID)
        .with_issuer(issuer())
        .with_subject("user1")
        .with_issued_at(UnixTime(now.0 - 10))
        .with_not_before(UnixTime(now.0 - 10))
        .with_expiration(UnixTime(now.0 + 3600))
}

/// The header the test tenant stamps onto its tokens
pub fn signed_headers() -> Headers {
    Headers::new("RS256").with_key_id(KEY_ID)
}

/// Signs `message` with the checked-in test key (RS256)
pub fn sign(message: &[u8]) -> Vec<u8> {
    let key = ring::signature::RsaKeyPair::from_pkcs8(PRIVATE_KEY_PKCS8)
        .expect("test key is a valid PKCS#8 document");

    let mut signature = vec![0; key.public().modulus_len()];
    key.sign(
        &ring::signature::RSA_PKCS1_SHA256,
        &ring::rand::SystemRandom::new(),
        message,
        &mut signature,
    )
    .expect("test key signs");

    signature
}

/// Mints a token signed by the checked-in test key
pub fn mint(headers: &Headers, claims: &Claims) -> Jwt {
    let h_raw = Base64Url::from_raw(serde_json::to_vec(headers).expect("headers serialize"));
    let p_raw = Base64Url::from_raw(serde_json::to_vec(claims).expect("claims serialize"));

    let message = format!("{h_raw}.{p_raw}");
    let signature = Base64Url::from_raw(sign(message.as_bytes()));

    Jwt::new(format!("{message}.{signature}"))
}
