//! The reasons a validation attempt can fail

use b2c_jose::error::JwtVerifyError;
use thiserror::Error;

/// The underlying cause of a failed document fetch
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// The endpoint answered with a non-success status
    #[error("unexpected response status {0}")]
    Status(reqwest::StatusCode),

    /// The request could not be completed
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The document could not be parsed
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// An error occurring while obtaining the current signing keys
#[derive(Debug, Error)]
pub(crate) enum KeyStoreError {
    /// The metadata document could not be retrieved or understood
    #[error("failed to fetch the provider metadata document")]
    ConfigFetchFailed(#[source] FetchFailure),

    /// The metadata document does not name a JWKS endpoint
    #[error("provider metadata does not declare a `jwks_uri`")]
    JwksUriMissing,

    /// The key-set document could not be retrieved
    #[error("failed to fetch the signing key set")]
    CertsFetchFailed(#[source] FetchFailure),

    /// The key-set document is not a parseable JWKS
    #[error("signing key set is not a valid JWKS document")]
    BadKeySetFormat(#[source] serde_json::Error),

    /// A fetch ran out of time
    #[error("key fetch timed out")]
    RequestTimeout(#[source] reqwest::Error),
}

/// The reasons a token can be rejected
///
/// Every failure of [`Validator::check`][crate::Validator::check] is
/// exactly one of these kinds, so a caller can branch on whether the
/// provider was unreachable, the token was forged, or it has merely
/// expired.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The token does not split into three non-empty dot-separated
    /// segments, or its header segment cannot be decoded
    #[error("malformed token")]
    MalformedToken,

    /// The token header is missing the required type, algorithm, or key
    /// identifier
    #[error("bad header format: {0}")]
    BadHeaderFormat(&'static str),

    /// The payload is missing required claims, cannot be decoded, or its
    /// issuer is not shaped like a B2C issuer URL
    #[error("bad payload format: {0}")]
    BadPayloadFormat(&'static str),

    /// The provider metadata document could not be retrieved or understood
    #[error("failed to fetch the provider metadata document")]
    ConfigFetchFailed(#[source] FetchFailure),

    /// The provider metadata does not declare a `jwks_uri`
    #[error("provider metadata does not declare a `jwks_uri`")]
    JwksUriMissing,

    /// The signing key set could not be retrieved
    #[error("failed to fetch the signing key set")]
    CertsFetchFailed(#[source] FetchFailure),

    /// The signing key set is not a parseable JWKS document
    #[error("signing key set is not a valid JWKS document")]
    BadKeySetFormat(#[source] serde_json::Error),

    /// No available key validates the token signature
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// The `aud` claim does not match the configured app registration
    #[error("invalid audience")]
    InvalidAudience,

    /// The issuer's tenant name or tenant ID does not match the
    /// configuration
    #[error("invalid issuer")]
    InvalidIssuer,

    /// The token expired before now
    #[error("token expired")]
    TokenExpired,

    /// The token is not valid until a future time
    #[error("token not yet valid")]
    TokenNotYetValid,

    /// A key fetch ran out of time
    #[error("key fetch timed out")]
    RequestTimeout(#[source] reqwest::Error),
}

impl From<KeyStoreError> for ValidationError {
    fn from(err: KeyStoreError) -> Self {
        match err {
            KeyStoreError::ConfigFetchFailed(source) => Self::ConfigFetchFailed(source),
            KeyStoreError::JwksUriMissing => Self::JwksUriMissing,
            KeyStoreError::CertsFetchFailed(source) => Self::CertsFetchFailed(source),
            KeyStoreError::BadKeySetFormat(source) => Self::BadKeySetFormat(source),
            KeyStoreError::RequestTimeout(source) => Self::RequestTimeout(source),
        }
    }
}

impl From<JwtVerifyError> for ValidationError {
    fn from(err: JwtVerifyError) -> Self {
        match err {
            JwtVerifyError::MalformedToken(_)
            | JwtVerifyError::MalformedTokenHeader(_)
            | JwtVerifyError::MalformedTokenSignature(_) => Self::MalformedToken,
            JwtVerifyError::MalformedTokenPayload(_) => {
                Self::BadPayloadFormat("payload is not a JSON object")
            }
            JwtVerifyError::JwkVerifyError(_) => Self::SignatureInvalid,
        }
    }
}
