use std::time::Duration;

use b2c_jose::jwt::{Audience, AudienceRef};

/// How long a fetched key set remains fresh by default
const DEFAULT_KEY_EXPIRY: Duration = Duration::from_secs(3600);

/// Describes the tenant, policy, and app registration that tokens must
/// have been issued for
///
/// The provider's well-known configuration URL is derived from the tenant
/// and policy names; [`with_metadata_url`][Self::with_metadata_url] can
/// point the validator at a stand-in provider instead.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct ValidatorConfig {
    tenant_name: String,
    tenant_id: String,
    audience: Audience,
    policy_name: String,
    key_expiry: Duration,
    metadata_url: Option<String>,
}

impl ValidatorConfig {
    /// Configuration for one tenant, policy, and app registration
    ///
    /// `app_id` is the application (client) ID that valid tokens carry as
    /// their `aud` claim.
    pub fn new(
        tenant_name: impl Into<String>,
        tenant_id: impl Into<String>,
        app_id: impl Into<Audience>,
        policy_name: impl Into<String>,
    ) -> Self {
        Self {
            tenant_name: tenant_name.into(),
            tenant_id: tenant_id.into(),
            audience: app_id.into(),
            policy_name: policy_name.into(),
            key_expiry: DEFAULT_KEY_EXPIRY,
            metadata_url: None,
        }
    }

    /// Sets how long a fetched key set remains fresh (default one hour)
    pub fn with_key_expiry(self, key_expiry: Duration) -> Self {
        Self { key_expiry, ..self }
    }

    /// Overrides the derived well-known configuration URL
    ///
    /// Intended for exercising a validator against a local stand-in
    /// provider in tests.
    pub fn with_metadata_url(self, url: impl Into<String>) -> Self {
        Self {
            metadata_url: Some(url.into()),
            ..self
        }
    }

    /// The URL of the OpenID Connect metadata document for this tenant
    /// and policy
    #[must_use]
    pub fn metadata_url(&self) -> String {
        self.metadata_url.clone().unwrap_or_else(|| {
            format!(
                "https://{tenant}.b2clogin.com/{tenant}.onmicrosoft.com/{policy}/v2.0/.well-known/openid-configuration",
                tenant = self.tenant_name,
                policy = self.policy_name,
            )
        })
    }

    /// The tenant's name (the subdomain of `b2clogin.com`)
    #[must_use]
    pub fn tenant_name(&self) -> &str {
        &self.tenant_name
    }

    /// The tenant's directory ID
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// The audience valid tokens are issued for
    #[must_use]
    pub fn audience(&self) -> &AudienceRef {
        &self.audience
    }

    /// The user-flow policy tokens are issued under
    #[must_use]
    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    /// How long a fetched key set remains fresh
    #[must_use]
    pub fn key_expiry(&self) -> Duration {
        self.key_expiry
    }
}
