use std::time::Duration;

use clap::Parser;

use crate::ec2::{ClientOptions, SignatureAlgorithm, default_host};

#[derive(Parser, Clone)]
#[command(
    name = "ec2-status-check",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT"), " ", env!("BUILD_DATE"), ")"),
    about = "Nagios-compatible EC2 instance status check for a single region"
)]
pub struct Config {
    /// AWS region to check (e.g. us-east-1)
    pub region: String,

    /// Access key id used to sign the request (falls back to the AWS default credential chain)
    #[arg(
        long,
        env = "AWS_ACCESS_KEY_ID",
        hide_env_values = true,
        requires = "secret_access_key"
    )]
    pub access_key_id: Option<String>,

    /// Secret access key used to sign the request
    #[arg(
        long,
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true,
        requires = "access_key_id"
    )]
    pub secret_access_key: Option<String>,

    /// Shared config profile for the AWS default credential chain
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// HMAC digest for request signing: SHA256 or SHA1
    #[arg(long, env = "SIGNATURE_ALGORITHM", default_value = "SHA256")]
    pub signature_algorithm: SignatureAlgorithm,

    /// Override the regional endpoint URL (default: https://ec2.<region>.amazonaws.com)
    #[arg(long, env = "EC2_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Accept any server certificate (INSECURE, disables chain and hostname validation)
    #[arg(long, env = "INSECURE_SKIP_TLS_VERIFY", default_value = "false")]
    pub insecure_skip_tls_verify: bool,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value = "30")]
    pub timeout_seconds: u64,

    /// Log format: json or pretty
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Log level (logs go to stderr, stdout carries only the check result)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Config {
    pub fn try_from_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Host shown in connection error messages
    pub fn endpoint_label(&self) -> String {
        match &self.endpoint_url {
            Some(url) => reqwest::Url::parse(url)
                .ok()
                .and_then(|u| {
                    u.host_str().map(|host| match u.port() {
                        Some(port) => format!("{}:{}", host, port),
                        None => host.to_string(),
                    })
                })
                .unwrap_or_else(|| url.clone()),
            None => default_host(&self.region),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.timeout_seconds),
            insecure_skip_tls_verify: self.insecure_skip_tls_verify,
        }
    }

    pub fn display(&self) {
        let has_static_keys = self.access_key_id.is_some() && self.secret_access_key.is_some();
        let credential_source = if has_static_keys {
            "static"
        } else {
            "default-chain"
        };

        tracing::info!(
            region = %self.region,
            endpoint = %self.endpoint_label(),
            credential_source = credential_source,
            profile = ?self.profile,
            signature_algorithm = %self.signature_algorithm,
            insecure_skip_tls_verify = self.insecure_skip_tls_verify,
            timeout_seconds = self.timeout_seconds,
            log_format = %self.log_format,
            log_level = %self.log_level,
            "Configuration initialized"
        );
    }
}
