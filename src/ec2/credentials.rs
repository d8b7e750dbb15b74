use std::fmt;

use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use tracing::{debug, info};

use crate::error::{CheckError, Result};

/// Access key pair used to sign requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Resolves credentials for the target region
    ///
    /// Resolution priority:
    /// 1. Explicit key pair from Config (CLI args or AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY)
    /// 2. AWS SDK default chain (environment, shared profile, SSO, IMDS)
    ///
    /// A key pair with only one half set is an error.
    pub async fn resolve(
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        profile: Option<&str>,
        region: &str,
    ) -> Result<Self> {
        match (access_key_id, secret_access_key) {
            (Some(id), Some(secret)) => {
                debug!("Using explicitly configured access key pair");
                Ok(Self::new(id, secret))
            }
            (None, None) => Self::from_default_chain(profile, region).await,
            _ => Err(CheckError::Credentials(
                "access key id and secret access key must be set together".to_string(),
            )),
        }
    }

    async fn from_default_chain(profile: Option<&str>, region: &str) -> Result<Self> {
        debug!(
            profile = ?profile,
            region = %region,
            "Resolving credentials from AWS SDK default chain"
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        let provider = config
            .credentials_provider()
            .ok_or_else(|| {
                CheckError::Credentials("no credentials provider configured".to_string())
            })?;

        let resolved = provider
            .provide_credentials()
            .await
            .map_err(|e| CheckError::Credentials(e.to_string()))?;

        info!(
            has_session_token = resolved.session_token().is_some(),
            "Resolved AWS credentials from default chain"
        );

        Ok(Self {
            access_key_id: resolved.access_key_id().to_string(),
            secret_access_key: resolved.secret_access_key().to_string(),
            session_token: resolved.session_token().map(str::to_string),
        })
    }
}
