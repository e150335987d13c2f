//! JSON Web Key (JWK) implementation
//!
//! The specifications for JSON Web Keys can be found in [RFC7517][].
//!
//! The B2C signing endpoint serves RSA keys identified by a key ID
//! (`kid`), a certificate thumbprint (`x5t`), or both.
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517

use aliri_braid::braid;
use serde::Deserialize;

use crate::jws::{self, Verifier as _};
use crate::{error, jwa};

/// An identifier for a JWK
#[braid(serde, ref_doc = "A borrowed reference to a JWK identifier ([`KeyId`])")]
pub struct KeyId;

/// The SHA-1 thumbprint (`x5t`) of the certificate bearing a JWK
#[braid(
    serde,
    ref_doc = "A borrowed reference to a certificate thumbprint ([`Thumbprint`])"
)]
pub struct Thumbprint;

/// An identified JSON Web Key
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[must_use]
pub struct Jwk {
    #[serde(default)]
    kid: Option<KeyId>,
    #[serde(default)]
    x5t: Option<Thumbprint>,
    #[serde(default, rename = "use")]
    usage: Option<jwa::Usage>,
    #[serde(default)]
    alg: Option<jwa::Algorithm>,
    #[serde(flatten)]
    key: Key,
}

impl Jwk {
    /// The key ID
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.kid.as_deref()
    }

    /// The certificate thumbprint
    #[must_use]
    pub fn thumbprint(&self) -> Option<&ThumbprintRef> {
        self.x5t.as_deref()
    }

    /// The intended usage of the key
    #[must_use]
    pub fn usage(&self) -> Option<jwa::Usage> {
        self.usage
    }

    /// The algorithm to be used with this JWK
    #[must_use]
    pub fn algorithm(&self) -> Option<jwa::Algorithm> {
        self.alg
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: impl Into<KeyId>) -> Self {
        Self {
            kid: Some(kid.into()),
            ..self
        }
    }

    /// Sets the certificate thumbprint
    pub fn with_thumbprint(self, x5t: impl Into<Thumbprint>) -> Self {
        Self {
            x5t: Some(x5t.into()),
            ..self
        }
    }

    /// Sets the key's usage
    pub fn with_usage(self, usage: jwa::Usage) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    /// Sets the algorithm this key may verify
    pub fn with_algorithm(self, alg: jwa::Algorithm) -> Self {
        Self {
            alg: Some(alg),
            ..self
        }
    }
}

impl From<jwa::Rsa> for Jwk {
    fn from(key: jwa::Rsa) -> Self {
        Self {
            kid: None,
            x5t: None,
            usage: None,
            alg: None,
            key: Key::Rsa(key),
        }
    }
}

impl jws::Verifier for Jwk {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        if self.usage == Some(jwa::Usage::Encryption) {
            return false;
        }
        if let Some(key_alg) = self.alg {
            if key_alg != alg {
                return false;
            }
        }

        self.key.is_compatible(alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if self.usage == Some(jwa::Usage::Encryption) {
            return Err(error::jwk_usage_mismatch().into());
        }
        if let Some(key_alg) = self.alg {
            if key_alg != alg {
                return Err(error::incompatible_algorithm(alg).into());
            }
        }

        match &self.key {
            Key::Rsa(rsa) => Ok(rsa.verify(alg, data, signature)?),
        }
    }
}

/// The algorithm-specific parameters of a JWK
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "kty")]
enum Key {
    /// An RSA public key
    #[serde(rename = "RSA")]
    Rsa(jwa::Rsa),
}

impl Key {
    fn is_compatible(&self, _alg: jwa::Algorithm) -> bool {
        match self {
            Self::Rsa(_) => true,
        }
    }
}
