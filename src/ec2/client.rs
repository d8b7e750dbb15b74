use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_TYPE, HOST};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use super::credentials::Credentials;
use super::signer::{RequestParameters, RequestSigner, SignatureAlgorithm};
use crate::error::{CheckError, Result};

pub const API_VERSION: &str = "2011-12-15";
pub const SIGNATURE_VERSION: u32 = 2;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Regional EC2 query endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    host: String,
}

impl Endpoint {
    pub fn for_region(region: &str) -> Result<Self> {
        Self::parse(&format!("https://{}/", default_host(region)))
    }

    /// Parses an endpoint URL; the signing host keeps any non-default port
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: String| CheckError::Endpoint {
            endpoint: raw.to_string(),
            reason,
        };

        let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(invalid("missing host".to_string())),
        };
        url.set_path("/");

        Ok(Self { url, host })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}

pub fn default_host(region: &str) -> String {
    format!("ec2.{}.amazonaws.com", region)
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub insecure_skip_tls_verify: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            insecure_skip_tls_verify: false,
        }
    }
}

pub struct Ec2Client {
    http: Client,
    endpoint: Endpoint,
    credentials: Credentials,
    signer: RequestSigner,
}

impl Ec2Client {
    pub fn new(
        endpoint: Endpoint,
        credentials: Credentials,
        algorithm: SignatureAlgorithm,
        options: &ClientOptions,
    ) -> Result<Self> {
        if options.insecure_skip_tls_verify {
            warn!(
                endpoint = %endpoint,
                "TLS certificate verification is DISABLED for the EC2 endpoint"
            );
        }

        let http = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure_skip_tls_verify)
            .build()?;

        let signer = RequestSigner::new(
            credentials.secret_access_key.clone(),
            endpoint.host(),
            algorithm,
        );

        debug!(
            endpoint = %endpoint.url(),
            signature_method = %algorithm.signature_method(),
            timeout_seconds = options.timeout.as_secs(),
            "EC2 query client initialized"
        );

        Ok(Self {
            http,
            endpoint,
            credentials,
            signer,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Common query parameters merged with the action-specific ones
    pub fn build_params(
        &self,
        action: &str,
        extra: &RequestParameters,
        timestamp: DateTime<Utc>,
    ) -> RequestParameters {
        let mut params = RequestParameters::new();
        params.insert("Action".to_string(), action.to_string());
        params.insert("Version".to_string(), API_VERSION.to_string());
        params.insert(
            "Timestamp".to_string(),
            timestamp.format(TIMESTAMP_FORMAT).to_string(),
        );
        params.insert(
            "SignatureVersion".to_string(),
            SIGNATURE_VERSION.to_string(),
        );
        params.insert(
            "SignatureMethod".to_string(),
            self.signer.algorithm().signature_method(),
        );
        params.insert(
            "AWSAccessKeyId".to_string(),
            self.credentials.access_key_id.clone(),
        );
        if let Some(token) = &self.credentials.session_token {
            params.insert("SecurityToken".to_string(), token.clone());
        }

        params.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }

    /// Parameters with the `Signature` entry appended
    pub fn signed_params(
        &self,
        action: &str,
        extra: &RequestParameters,
        timestamp: DateTime<Utc>,
    ) -> Result<RequestParameters> {
        let mut params = self.build_params(action, extra, timestamp);
        let signature = self.signer.sign(&params)?;
        params.insert("Signature".to_string(), signature);
        Ok(params)
    }

    /// Sends one signed query and returns the raw body whatever the HTTP status
    pub async fn query(&self, action: &str, extra: &RequestParameters) -> Result<String> {
        let params = self.signed_params(action, extra, Utc::now())?;

        debug!(
            endpoint = %self.endpoint.url(),
            api_action = action,
            "Sending EC2 query API request"
        );

        let start_time = std::time::Instant::now();

        let response = self
            .http
            .post(self.endpoint.url().clone())
            .header(HOST, self.endpoint.host())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        info!(
            endpoint = %self.endpoint,
            api_action = action,
            http_status = status.as_u16(),
            response_bytes = body.len(),
            response_time_ms = start_time.elapsed().as_millis(),
            "Received EC2 query API response"
        );

        Ok(body)
    }
}
