//! JOSE primitives backing the Azure AD B2C token validator
//!
//! This crate implements the slice of the Javascript/JSON Object Signing
//! and Encryption (JOSE) standards that validating a B2C identity token
//! requires:
//!
//! * JSON Web Signature (JWS) verification: [RFC7515][]
//! * JSON Web Key (JWK) and key sets: [RFC7517][]
//! * The RSA members of the JSON Web Algorithms (JWA) registry: [RFC7518][]
//! * JSON Web Token (JWT) decomposition and claims: [RFC7519][]
//!
//! Everything here is pure computation. Fetching key sets from the
//! identity provider, caching them, and deciding which header and claim
//! values are acceptable for a tenant are the `b2c_validator` crate's
//! business.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod b64;
pub mod clock;
pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jws;
pub mod jwt;


#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::Jwks;
#[doc(inline)]
pub use jwt::{Jwt, JwtRef};
