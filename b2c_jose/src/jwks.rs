use serde::Deserialize;

use crate::{jwk, Jwk};

/// A JSON Web Key Set (JWKS)
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Jwks {
    #[serde(deserialize_with = "deserialize_keys")]
    keys: Vec<Jwk>,
}

impl Jwks {
    /// Adds a key to the set
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// A view of the keys in this set
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// Finds the verification key named by a token header
    ///
    /// A `kid` match is preferred; the `x5t` thumbprint is consulted when
    /// no key carries the requested ID.
    pub fn find_key(
        &self,
        kid: Option<&jwk::KeyIdRef>,
        x5t: Option<&jwk::ThumbprintRef>,
    ) -> Option<&Jwk> {
        if let Some(kid) = kid {
            if let Some(key) = self.keys.iter().find(|k| k.key_id() == Some(kid)) {
                return Some(key);
            }
        }

        if let Some(x5t) = x5t {
            if let Some(key) = self.keys.iter().find(|k| k.thumbprint() == Some(x5t)) {
                return Some(key);
            }
        }

        None
    }
}

fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<Jwk>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct MaybeJwksVisitor;

    impl<'de> serde::de::Visitor<'de> for MaybeJwksVisitor {
        type Value = Vec<Jwk>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a list of JWK objects")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut values = Vec::with_capacity(seq.size_hint().unwrap_or_default());
            let mut index = 0_usize;

            while let Some(value) = seq.next_element()? {
                match value {
                    MaybeJwk::Jwk(jwk) => values.push(jwk),
                    MaybeJwk::Unknown(key) => {
                        tracing::warn!(
                            jwks.idx = index,
                            jwk.kid = ?key.kid,
                            "jwk.use" = ?key.r#use,
                            jwk.alg = ?key.alg,
                            "ignoring unsupported JWK"
                        );
                    }
                }
                index += 1;
            }

            Ok(values)
        }
    }

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum MaybeJwk {
        Jwk(Jwk),
        Unknown(JwkLike),
    }

    #[derive(serde::Deserialize)]
    struct JwkLike {
        #[serde(default)]
        kid: Option<jwk::KeyId>,
        #[serde(rename = "use", default)]
        r#use: Option<String>,
        #[serde(default)]
        alg: Option<String>,
    }

    deserializer.deserialize_seq(MaybeJwksVisitor)
}
