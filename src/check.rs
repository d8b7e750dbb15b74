use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::ec2::{
    self, Credentials, DESCRIBE_INSTANCE_STATUS, Ec2Client, Endpoint, RequestParameters,
};
use crate::nagios::Report;

/// Runs one status check and turns every outcome into a report
pub async fn run(config: &Config) -> Report {
    let endpoint_label = config.endpoint_label();

    match query_and_evaluate(config).await {
        Ok(report) => {
            info!(
                region = %config.region,
                status = %report.status,
                "Status check completed"
            );
            report
        }
        Err(e) => {
            error!(
                endpoint = %endpoint_label,
                error = %format!("{:#}", e),
                "Status check could not be evaluated"
            );
            connection_error(&endpoint_label, &e)
        }
    }
}

async fn query_and_evaluate(config: &Config) -> Result<Report> {
    let endpoint = match &config.endpoint_url {
        Some(url) => Endpoint::parse(url)?,
        None => Endpoint::for_region(&config.region)?,
    };

    let credentials = Credentials::resolve(
        config.access_key_id.as_deref(),
        config.secret_access_key.as_deref(),
        config.profile.as_deref(),
        &config.region,
    )
    .await
    .context("Failed to resolve AWS credentials")?;

    let client = Ec2Client::new(
        endpoint,
        credentials,
        config.signature_algorithm,
        &config.client_options(),
    )
    .context("Failed to build EC2 client")?;

    let body = client
        .query(DESCRIBE_INSTANCE_STATUS, &RequestParameters::new())
        .await
        .with_context(|| {
            format!(
                "Failed to call {} on {}",
                DESCRIBE_INSTANCE_STATUS,
                client.endpoint()
            )
        })?;

    debug!(response_bytes = body.len(), "Evaluating response body");

    ec2::evaluate(&body).context("Failed to parse DescribeInstanceStatus response")
}

fn connection_error(endpoint: &str, error: &anyhow::Error) -> Report {
    Report::critical(format!("Error connecting to {} *** {:#}", endpoint, error))
}
