//! Base64url byte buffers
//!
//! JWT segments and JWK parameters are encoded with the URL-safe base64
//! alphabet without padding ([RFC7515, appendix C][]).
//!
//! [RFC7515, appendix C]: https://tools.ietf.org/html/rfc7515#appendix-C

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A byte buffer that encodes and decodes as unpadded base64url text
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[must_use]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Wraps raw bytes
    #[inline]
    pub fn from_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Decodes unpadded base64url text into a buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid unpadded base64url.
    pub fn from_encoded(enc: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self(URL_SAFE_NO_PAD.decode(enc)?))
    }

    /// A view of the underlying bytes
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Unwraps the underlying buffer
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Base64Url {
    #[inline]
    fn from(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "b64!({})", URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl fmt::Display for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl Serialize for Base64Url {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let enc = String::deserialize(deserializer)?;
        Self::from_encoded(&enc).map_err(de::Error::custom)
    }
}
