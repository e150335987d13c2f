//! Decomposition and verification of JSON Web Tokens (JWT)
//!
//! The specifications for this standard can be found in [RFC7519][].
//!
//! Unencrypted JWTs appear as a three-part base64-encoded string, where
//! each part is separated by a `.`:
//!
//! ```text
//! eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJ1c2VyMSJ9.USqt…
//! ```
//!
//! The first section is the header, used to elect the key that verifies
//! the token's authenticity. The second is the payload of claims; nothing
//! in it should be trusted before the signature has been validated. The
//! third is the binary signature over the first two sections.
//!
//! [RFC7519]: https://tools.ietf.org/html/rfc7519

use std::fmt;

use aliri_braid::braid;
use serde::{Deserialize, Serialize};

use crate::b64::Base64Url;
use crate::clock::UnixTime;
use crate::{error, jwa, jwk, jws};

/// An audience
#[braid(serde, ref_doc = "A borrowed reference to an [`Audience`]")]
pub struct Audience;

/// An issuer of JWTs
#[braid(serde, ref_doc = "A borrowed reference to an [`Issuer`]")]
pub struct Issuer;

/// The subject of a JWT
#[braid(serde, ref_doc = "A borrowed reference to a [`Subject`]")]
pub struct Subject;

/// A JSON Web Token
///
/// This type provides custom implementations of [`Display`][JwtRef#impl-Display] and
/// [`Debug`][JwtRef#impl-Debug] to prevent unintentional disclosures of sensitive values.
/// See the documentation on those trait implementations on the [`JwtRef`] type for more
/// information.
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ord = "omit",
    ref_doc = "\
    A borrowed reference to a JSON Web Token ([`Jwt`])\n\
    \n\
    This type provides custom implementations of [`Display`][Self#impl-Display] and \
    [`Debug`][Self#impl-Debug] to prevent unintentional disclosures of sensitive values. \
    See the documentation on those trait implementations for more information.
    "
)]
#[must_use]
pub struct Jwt;

/// By default, this type hides its contents and prints a placeholder.
/// The alternate debug format, i.e. `{:#?}`, prints the header and payload
/// sections but always elides the token's signature.
impl fmt::Debug for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            match self.0.rfind('.') {
                Some(last_period) => write!(f, "\"{}…\"", &self.0[..=last_period]),
                None => f.write_str("\"…\""),
            }
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

/// By default, this type hides its contents and prints a placeholder.
/// The alternate format, i.e. `{:#}`, prints the header and payload
/// sections but always elides the token's signature.
impl fmt::Display for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            match self.0.rfind('.') {
                Some(last_period) => write!(f, "{}…", &self.0[..=last_period]),
                None => f.write_str("…"),
            }
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

/// The header section of a token, as it appeared on the wire
///
/// Values are carried verbatim; deciding which of them are acceptable is
/// the verifying party's policy decision, made before the signature is
/// checked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Headers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<jwk::KeyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x5t: Option<jwk::Thumbprint>,
}

impl Headers {
    /// Constructs a `JWT`-typed header naming the given signing algorithm
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            typ: Some(String::from("JWT")),
            alg: Some(alg.into()),
            kid: None,
            x5t: None,
        }
    }

    /// Sets the ID of the signing key
    pub fn with_key_id(self, kid: impl Into<jwk::KeyId>) -> Self {
        Self {
            kid: Some(kid.into()),
            ..self
        }
    }

    /// Sets the thumbprint of the certificate bearing the signing key
    pub fn with_thumbprint(self, x5t: impl Into<jwk::Thumbprint>) -> Self {
        Self {
            x5t: Some(x5t.into()),
            ..self
        }
    }

    /// Clears the token type
    pub fn without_type(self) -> Self {
        Self { typ: None, ..self }
    }

    /// The declared token type
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.typ.as_deref()
    }

    /// The declared signing algorithm
    #[must_use]
    pub fn alg(&self) -> Option<&str> {
        self.alg.as_deref()
    }

    /// The ID of the signing key
    #[must_use]
    pub fn kid(&self) -> Option<&jwk::KeyIdRef> {
        self.kid.as_deref()
    }

    /// The thumbprint of the certificate bearing the signing key
    #[must_use]
    pub fn x5t(&self) -> Option<&jwk::ThumbprintRef> {
        self.x5t.as_deref()
    }
}

/// The claims carried by a B2C identity token
///
/// Claims without a dedicated field are preserved untouched in
/// [`additional`][Self::additional].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<Issuer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<UnixTime>,
    #[serde(flatten)]
    additional: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// Constructs a new, empty set of claims
    #[must_use]
    pub fn new() -> Self {
        Self {
            aud: None,
            iss: None,
            sub: None,
            iat: None,
            nbf: None,
            exp: None,
            additional: serde_json::Map::new(),
        }
    }

    /// Sets the `aud` claim
    pub fn with_audience(mut self, aud: impl Into<Audience>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    /// Sets the `iss` claim
    pub fn with_issuer(mut self, iss: impl Into<Issuer>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Sets the `sub` claim
    pub fn with_subject(mut self, sub: impl Into<Subject>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Sets the `iat` claim
    pub fn with_issued_at(mut self, time: UnixTime) -> Self {
        self.iat = Some(time);
        self
    }

    /// Sets the `nbf` claim
    pub fn with_not_before(mut self, time: UnixTime) -> Self {
        self.nbf = Some(time);
        self
    }

    /// Sets the `exp` claim
    pub fn with_expiration(mut self, time: UnixTime) -> Self {
        self.exp = Some(time);
        self
    }

    /// Adds a claim without a dedicated field
    pub fn with_additional(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.additional.insert(name.into(), value.into());
        self
    }

    /// The audience the token was issued for
    #[must_use]
    pub fn aud(&self) -> Option<&AudienceRef> {
        self.aud.as_deref()
    }

    /// The authority that issued the token
    #[must_use]
    pub fn iss(&self) -> Option<&IssuerRef> {
        self.iss.as_deref()
    }

    /// The subject the token authenticates
    #[must_use]
    pub fn sub(&self) -> Option<&SubjectRef> {
        self.sub.as_deref()
    }

    /// When the token was issued
    #[must_use]
    pub fn iat(&self) -> Option<UnixTime> {
        self.iat
    }

    /// The time before which the token must be rejected
    #[must_use]
    pub fn nbf(&self) -> Option<UnixTime> {
        self.nbf
    }

    /// The time after which the token must be rejected
    #[must_use]
    pub fn exp(&self) -> Option<UnixTime> {
        self.exp
    }

    /// The claims without a dedicated field, keyed by claim name
    #[must_use]
    pub fn additional(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.additional
    }

    /// Looks up a claim without a dedicated field by name
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.additional.get(name)
    }
}

impl Default for Claims {
    fn default() -> Self {
        Self::new()
    }
}

/// The validated headers and claims of a JWT
///
/// This type can _only_ be generated within this crate to assert that the
/// headers and claims held by this type have passed signature
/// verification.
#[derive(Clone, Debug, PartialEq)]
pub struct Validated<C = Claims, H = Headers> {
    headers: H,
    claims: C,
}

impl<C, H> Validated<C, H> {
    /// Extracts the header and claims from the token
    pub fn extract(self) -> (H, C) {
        (self.headers, self.claims)
    }

    /// The validated token headers
    pub fn headers(&self) -> &H {
        &self.headers
    }

    /// The validated token claims
    pub fn claims(&self) -> &C {
        &self.claims
    }
}

/// A decomposed JWT
///
/// This structure is suitable for inspection to determine which key
/// should be used to validate the JWT.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct Decomposed<'a, H = Headers> {
    pub(crate) header: H,
    pub(crate) message: &'a str,
    pub(crate) payload: &'a str,
    pub(crate) signature: Base64Url,
}

macro_rules! expect_two {
    ($iter:expr) => {{
        let mut i = $iter;
        match (i.next(), i.next(), i.next()) {
            (Some(first), Some(second), None) => Some((first, second)),
            _ => None,
        }
    }};
}

impl JwtRef {
    /// Decomposes the JWT into its parts, preparing it for later processing.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWT does not carry three non-empty
    /// dot-separated segments or if the header segment cannot be decoded.
    pub fn decompose<H>(&self) -> Result<Decomposed<H>, error::JwtVerifyError>
    where
        H: for<'de> Deserialize<'de>,
    {
        let (s_str, message) =
            expect_two!(self.as_str().rsplitn(2, '.')).ok_or_else(error::malformed_jwt)?;
        let (p_str, h_str) =
            expect_two!(message.rsplitn(2, '.')).ok_or_else(error::malformed_jwt)?;

        if h_str.is_empty() || p_str.is_empty() || s_str.is_empty() {
            return Err(error::malformed_jwt().into());
        }

        let h_raw = Base64Url::from_encoded(h_str).map_err(error::malformed_jwt_header)?;
        let signature = Base64Url::from_encoded(s_str).map_err(error::malformed_jwt_signature)?;
        let header: H =
            serde_json::from_slice(h_raw.as_slice()).map_err(error::malformed_jwt_header)?;

        Ok(Decomposed {
            header,
            message,
            payload: p_str,
            signature,
        })
    }
}

impl<'a, H> Decomposed<'a, H> {
    /// Verifies the token signature with `key` and decodes the payload
    ///
    /// The algorithm is supplied by the caller rather than read back out
    /// of the untrusted header.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature does not match or if the payload
    /// section cannot be decoded.
    pub fn verify<C, V>(
        self,
        key: &V,
        alg: jwa::Algorithm,
    ) -> Result<Validated<C, H>, error::JwtVerifyError>
    where
        C: for<'de> Deserialize<'de>,
        V: jws::Verifier<Algorithm = jwa::Algorithm>,
        error::JwtVerifyError: From<V::Error>,
    {
        key.verify(alg, self.message.as_bytes(), self.signature.as_slice())?;

        let p_raw = Base64Url::from_encoded(self.payload).map_err(error::malformed_jwt_payload)?;

        let claims: C =
            serde_json::from_slice(p_raw.as_slice()).map_err(error::malformed_jwt_payload)?;

        Ok(Validated {
            headers: self.header,
            claims,
        })
    }

    /// The untrusted headers of the JWT
    ///
    /// **WARNING:** *These headers have not been validated and should not be trusted.*
    /// An adversary can place arbitrary data into the header and payload of a JWT.
    /// Trusting this data or using it to directly authenticate the JWT can lead to
    /// security vulnerabilities. To validate the token, use the [`verify()`][Self::verify] method.
    pub fn untrusted_header(&self) -> &H {
        &self.header
    }

    /// The untrusted message of the JWT
    ///
    /// This contains the encoded header and payload of the JWT, separated by a `.`.
    pub fn untrusted_message(&self) -> &'a str {
        self.message
    }

    /// The raw signature of the JWT
    pub fn signature(&self) -> &Base64Url {
        &self.signature
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::test;

    #[test]
    fn decomposes_a_three_segment_token() -> Result<()> {
        let token = test::rsa::mint(
            &Headers::new("RS256").with_key_id(test::rsa::TEST_KEY_ID),
            &Claims::new().with_subject("user1"),
        );

        let decomposed: Decomposed = token.decompose()?;
        assert_eq!(decomposed.untrusted_header().alg(), Some("RS256"));
        assert_eq!(
            decomposed.untrusted_header().kid(),
            Some(jwk::KeyIdRef::from_str(test::rsa::TEST_KEY_ID))
        );
        Ok(())
    }

    #[test]
    fn rejects_a_two_segment_token() {
        let token = JwtRef::from_str("eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJ1c2VyMSJ9");
        let err = token.decompose::<Headers>().unwrap_err();
        assert!(matches!(err, error::JwtVerifyError::MalformedToken(_)));
    }

    #[test]
    fn rejects_an_empty_payload_segment() {
        let token = JwtRef::from_str("eyJhbGciOiJSUzI1NiJ9..c2ln");
        let err = token.decompose::<Headers>().unwrap_err();
        assert!(matches!(err, error::JwtVerifyError::MalformedToken(_)));
    }

    #[test]
    fn rejects_an_empty_signature_segment() {
        let token = JwtRef::from_str("eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJ1c2VyMSJ9.");
        let err = token.decompose::<Headers>().unwrap_err();
        assert!(matches!(err, error::JwtVerifyError::MalformedToken(_)));
    }

    #[test]
    fn rejects_a_header_that_is_not_json() {
        let token = JwtRef::from_str("bm90LWpzb24.eyJzdWIiOiJ1c2VyMSJ9.c2ln");
        let err = token.decompose::<Headers>().unwrap_err();
        assert!(matches!(
            err,
            error::JwtVerifyError::MalformedTokenHeader(_)
        ));
    }

    #[test]
    fn verifies_a_signed_token_and_returns_its_claims() -> Result<()> {
        let claims = Claims::new()
            .with_subject("user1")
            .with_expiration(UnixTime(2_000_000_000))
            .with_additional("name", "A. User");
        let token = test::rsa::mint(
            &Headers::new("RS256").with_key_id(test::rsa::TEST_KEY_ID),
            &claims,
        );

        let key: crate::Jwk = serde_json::from_str(test::rsa::JWK)?;

        let decomposed: Decomposed = token.decompose()?;
        let validated: Validated = decomposed.verify(&key, jwa::Algorithm::RS256)?;

        assert_eq!(validated.claims(), &claims);
        assert_eq!(validated.headers().typ(), Some("JWT"));
        Ok(())
    }

    #[test]
    fn rejects_a_forged_signature() -> Result<()> {
        let token = test::rsa::mint(
            &Headers::new("RS256").with_key_id(test::rsa::TEST_KEY_ID),
            &Claims::new().with_subject("user1"),
        );

        let forged = {
            let message = token.as_str().rsplit_once('.').expect("minted token").0;
            Jwt::new(format!("{message}.{}", Base64Url::from_raw(vec![0xAB; 256])))
        };

        let key: crate::Jwk = serde_json::from_str(test::rsa::JWK)?;

        let decomposed: Decomposed = forged.decompose()?;
        let err = decomposed
            .verify::<Claims, _>(&key, jwa::Algorithm::RS256)
            .unwrap_err();
        assert!(matches!(err, error::JwtVerifyError::JwkVerifyError(_)));
        Ok(())
    }

    #[test]
    fn token_display_and_debug_redact_by_default() {
        let token = Jwt::new("header.payload.signature".to_string());

        assert_eq!(format!("{token}"), "***JWT***");
        assert_eq!(format!("{token:?}"), "***JWT***");
        assert_eq!(format!("{token:#}"), "header.payload.…");
    }

    #[test]
    fn claims_round_trip_through_json() -> Result<()> {
        let claims = Claims::new()
            .with_audience("abc123")
            .with_issuer("https://contoso.b2clogin.com/tid-1/v2.0")
            .with_subject("user1")
            .with_issued_at(UnixTime(10))
            .with_not_before(UnixTime(10))
            .with_expiration(UnixTime(3600))
            .with_additional("tfp", "B2C_1_signup");

        let json = serde_json::to_string(&claims)?;
        let parsed: Claims = serde_json::from_str(&json)?;

        assert_eq!(parsed, claims);
        assert_eq!(parsed.claim("tfp"), Some(&serde_json::json!("B2C_1_signup")));
        Ok(())
    }
}
