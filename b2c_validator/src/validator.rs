//! The token validation pipeline

use once_cell::sync::Lazy;
use regex::Regex;

use b2c_jose::clock::{Clock, System, UnixTime};
use b2c_jose::jwt::{Claims, Decomposed, Headers};
use b2c_jose::{jwa, JwtRef};

use crate::config::ValidatorConfig;
use crate::error::ValidationError;
use crate::keystore::KeyStore;

/// The shape of a B2C issuer URL, capturing the tenant-name and tenant-ID
/// parts
///
/// Live issuers may carry a trailing slash; both forms are accepted.
static ISSUER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://([^/.]+)\.b2clogin\.com/([^/]+)/v2\.0/?$")
        .expect("issuer pattern is a valid regex")
});

/// Validates identity tokens for a single B2C tenant and policy
///
/// One validator owns one key cache; share a validator (behind an `Arc`)
/// rather than constructing one per request, or every request pays for a
/// key fetch.
///
/// The clock is generic so tests can pin "now"; see
/// [`with_clock`][Self::with_clock].
#[derive(Debug)]
#[must_use]
pub struct Validator<C = System> {
    config: ValidatorConfig,
    keys: KeyStore,
    clock: C,
}

impl Validator<System> {
    /// Constructs a validator that reads the system clock
    pub fn new(config: ValidatorConfig) -> Self {
        Self::with_clock(config, System)
    }
}

impl<C> Validator<C>
where
    C: Clock,
{
    /// Constructs a validator with the provided clock
    ///
    /// Tests use this with a [`TestClock`][b2c_jose::clock::TestClock] to
    /// drive claim windows and key-cache freshness deterministically.
    pub fn with_clock(config: ValidatorConfig, clock: C) -> Self {
        let keys = KeyStore::new(&config);
        Self {
            config,
            keys,
            clock,
        }
    }

    /// A view of the validator's configuration
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Proves a token authentic and valid, returning its claims
    ///
    /// The header is checked before any network traffic; the signing keys
    /// are fetched (or read from cache) only for tokens that could
    /// plausibly verify. Payload claims are checked strictly in order:
    /// required-claim presence and issuer shape, audience, expiry,
    /// not-before, issuer tenant. The first failure wins.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] kind naming exactly why the token
    /// was rejected or why the signing keys could not be obtained.
    pub async fn check(&self, token: &JwtRef) -> Result<Claims, ValidationError> {
        let decomposed: Decomposed<Headers> = token.decompose()?;

        verify_header(decomposed.untrusted_header())?;

        let now = self.clock.now();
        let cached = self.keys.signing_keys(now).await?;

        let key = {
            let header = decomposed.untrusted_header();
            cached.jwks.find_key(header.kid(), header.x5t())
        }
        .ok_or_else(|| {
            let header = decomposed.untrusted_header();
            tracing::debug!(kid = ?header.kid(), x5t = ?header.x5t(), "no matching signing key");
            ValidationError::SignatureInvalid
        })?;

        let validated = decomposed.verify::<Claims, _>(key, jwa::Algorithm::RS256)?;

        verify_payload(&self.config, validated.claims(), now)?;

        let (_, claims) = validated.extract();
        Ok(claims)
    }
}

/// Checks the shape of a token header before any key is consulted
fn verify_header(header: &Headers) -> Result<(), ValidationError> {
    if header.typ() != Some("JWT") {
        return Err(ValidationError::BadHeaderFormat("`typ` must be \"JWT\""));
    }

    if header.alg() != Some("RS256") {
        return Err(ValidationError::BadHeaderFormat("`alg` must be \"RS256\""));
    }

    if header.kid().is_none() && header.x5t().is_none() {
        return Err(ValidationError::BadHeaderFormat(
            "a `kid` or `x5t` key identifier is required",
        ));
    }

    Ok(())
}

/// Checks the payload claims of a signature-verified token
///
/// The order is fixed and each failure short-circuits: presence and
/// issuer shape, then audience, then expiry before not-before, then the
/// issuer's tenant parts. The tenant name compares case-insensitively;
/// the tenant ID is exact.
fn verify_payload(
    config: &ValidatorConfig,
    claims: &Claims,
    now: UnixTime,
) -> Result<(), ValidationError> {
    let aud = claims
        .aud()
        .ok_or(ValidationError::BadPayloadFormat("missing required `aud` claim"))?;
    let exp = claims
        .exp()
        .ok_or(ValidationError::BadPayloadFormat("missing required `exp` claim"))?;
    let nbf = claims
        .nbf()
        .ok_or(ValidationError::BadPayloadFormat("missing required `nbf` claim"))?;
    claims
        .sub()
        .ok_or(ValidationError::BadPayloadFormat("missing required `sub` claim"))?;
    let iss = claims
        .iss()
        .ok_or(ValidationError::BadPayloadFormat("missing required `iss` claim"))?;
    claims
        .iat()
        .ok_or(ValidationError::BadPayloadFormat("missing required `iat` claim"))?;

    let issuer_parts = ISSUER_PATTERN.captures(iss.as_str()).ok_or(
        ValidationError::BadPayloadFormat("issuer is not shaped like a B2C issuer URL"),
    )?;

    if aud != config.audience() {
        return Err(ValidationError::InvalidAudience);
    }

    if exp < now {
        return Err(ValidationError::TokenExpired);
    }

    if nbf > now {
        return Err(ValidationError::TokenNotYetValid);
    }

    let tenant_name = &issuer_parts[1];
    let tenant_id = &issuer_parts[2];

    if !tenant_name.eq_ignore_ascii_case(config.tenant_name()) {
        return Err(ValidationError::InvalidIssuer);
    }

    if tenant_id != config.tenant_id() {
        return Err(ValidationError::InvalidIssuer);
    }

    Ok(())
}
