//! RSA JSON Web Algorithm implementations
//!
//! Azure AD B2C signs identity tokens with RS256. The other PKCS#1 v1.5
//! members of the RSA family are recognized so that a key set which
//! advertises them still parses; whether any of them is acceptable for a
//! given token is the caller's policy decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::b64::Base64Url;
use crate::{error, jws};

/// RSA signing algorithms usable for token verification
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum Algorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
}

impl Algorithm {
    fn verification_params(self) -> &'static ring::signature::RsaParameters {
        match self {
            Self::RS256 => &ring::signature::RSA_PKCS1_2048_8192_SHA256,
            Self::RS384 => &ring::signature::RSA_PKCS1_2048_8192_SHA384,
            Self::RS512 => &ring::signature::RSA_PKCS1_2048_8192_SHA512,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
        };

        f.write_str(s)
    }
}

/// The intended use for a JWK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum Usage {
    /// The key is intended for signing and verification
    #[serde(rename = "sig")]
    Signing,

    /// The key is intended for encryption
    #[serde(rename = "enc")]
    Encryption,
}

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyDto")]
pub struct Rsa {
    /// The public modulus
    #[serde(rename = "n")]
    modulus: Base64Url,

    /// The public exponent
    #[serde(rename = "e")]
    exponent: Base64Url,
}

impl Rsa {
    /// Constructs a public key from the modulus and exponent
    ///
    /// # Errors
    ///
    /// The modulus and exponent were not valid as a public key.
    pub fn from_components(
        modulus: impl Into<Base64Url>,
        exponent: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let modulus = modulus.into();
        let exponent = exponent.into();
        if modulus.as_slice().len() != 256 {
            return Err(error::key_rejected("key modulus must be 2048 bits"));
        }

        Ok(Self { modulus, exponent })
    }

    /// The public key's modulus
    pub fn modulus(&self) -> &Base64Url {
        &self.modulus
    }

    /// The public key's exponent
    pub fn exponent(&self) -> &Base64Url {
        &self.exponent
    }
}

impl jws::Verifier for Rsa {
    type Algorithm = Algorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.verification_params(), data, signature)
            .map_err(|_| error::signature_mismatch())
    }
}

impl TryFrom<PublicKeyDto> for Rsa {
    type Error = error::KeyRejected;

    fn try_from(dto: PublicKeyDto) -> Result<Self, Self::Error> {
        Self::from_components(dto.modulus, dto.exponent)
    }
}

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
struct PublicKeyDto {
    /// The public modulus
    #[serde(rename = "n")]
    modulus: Base64Url,

    /// The public exponent
    #[serde(rename = "e")]
    exponent: Base64Url,
}
