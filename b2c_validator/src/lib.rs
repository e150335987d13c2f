//! Validation of Azure AD B2C identity tokens
//!
//! A [`Validator`] proves that an identity token presented by a client was
//! issued by the configured B2C tenant before any of its claims are
//! trusted. One call to [`Validator::check`] runs the whole pipeline:
//!
//! 1. decompose the token into header, payload, and signature segments,
//! 2. check the header shape (`typ`, `alg`, and a key identifier),
//! 3. obtain the tenant's current signing keys, fetching and caching them
//!    from the provider's well-known configuration when stale,
//! 4. verify the RS256 signature against the selected key, and
//! 5. check the payload claims (presence, audience, time window, issuer)
//!    in a fixed order.
//!
//! The first failure aborts the pipeline with one of the
//! [`ValidationError`] kinds, so callers can tell a provider outage from a
//! forged or merely expired token.
//!
//! Authorization is out of scope: a successful check says who the token
//! speaks for, not what the bearer may do.
//!
//! # Feature flags
//!
//! This crate does not automatically enable TLS support in `reqwest`
//! itself. If your application already uses `reqwest` with some TLS
//! settings (native/OpenSSL/rustls), then this crate will use those
//! settings automatically. However, if the only reason you are using
//! `reqwest` is transitively through this crate, you may need to enable
//! the `default-tls` or `rustls-tls` feature to enable support for calling
//! out to the provider's HTTPS endpoints.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod config;
mod error;
mod keystore;
mod validator;

pub use config::ValidatorConfig;
pub use error::{FetchFailure, ValidationError};
pub use validator::Validator;

#[doc(no_inline)]
pub use b2c_jose::jwt::{Claims, Jwt, JwtRef};
