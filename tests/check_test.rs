use clap::Parser;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use ec2_status_check::check;
use ec2_status_check::config::Config;
use ec2_status_check::ec2::{RequestParameters, RequestSigner, SignatureAlgorithm};
use ec2_status_check::nagios::NagiosStatus;

const SECRET: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";

const HEALTHY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeInstanceStatusResponse xmlns="http://ec2.amazonaws.com/doc/2011-12-15/">
    <requestId>3be1508e-c444-4fef-89cc-0b1223c4f02fEXAMPLE</requestId>
    <instanceStatusSet>
        <item>
            <instanceId>i-283f9f47</instanceId>
            <availabilityZone>us-east-1d</availabilityZone>
            <instanceState><code>16</code><name>running</name></instanceState>
            <systemStatus>
                <status>ok</status>
                <details><item><name>reachability</name><status>passed</status></item></details>
            </systemStatus>
            <instanceStatus>
                <status>ok</status>
                <details><item><name>reachability</name><status>passed</status></item></details>
            </instanceStatus>
        </item>
        <item>
            <instanceId>i-1a2b3c4d</instanceId>
            <availabilityZone>us-east-1a</availabilityZone>
            <instanceState><code>16</code><name>running</name></instanceState>
            <systemStatus><status>ok</status></systemStatus>
            <instanceStatus><status>ok</status></instanceStatus>
        </item>
    </instanceStatusSet>
</DescribeInstanceStatusResponse>"#;

const IMPAIRED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeInstanceStatusResponse xmlns="http://ec2.amazonaws.com/doc/2011-12-15/">
    <requestId>3be1508e-c444-4fef-89cc-0b1223c4f02fEXAMPLE</requestId>
    <instanceStatusSet>
        <item>
            <instanceId>i-d8e3f1a2</instanceId>
            <availabilityZone>us-east-1b</availabilityZone>
            <systemStatus>
                <status>impaired</status>
                <details><item><name>reachability</name><status>failed</status></item></details>
            </systemStatus>
            <instanceStatus><status>ok</status></instanceStatus>
            <eventsSet>
                <item>
                    <code>system-retirement</code>
                    <description>The instance is running on degraded hardware</description>
                </item>
            </eventsSet>
        </item>
    </instanceStatusSet>
</DescribeInstanceStatusResponse>"#;

const AUTH_FAILURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Response><Errors><Error><Code>AuthFailure</Code><Message>AWS was not able to validate the provided access credentials</Message></Error></Errors><RequestID>59dbff89-35bd-4eac-99ed-be587EXAMPLE</RequestID></Response>"#;

fn config(endpoint: &str, extra: &[&str]) -> Config {
    let args = [
        "ec2-status-check",
        "us-east-1",
        "--endpoint-url",
        endpoint,
        "--access-key-id",
        "AKIDEXAMPLE",
        "--secret-access-key",
        SECRET,
    ];
    Config::try_parse_from(args.iter().chain(extra.iter()).copied()).unwrap()
}

fn decode_form(body: &str) -> RequestParameters {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| {
            let decode = |s: &str| urlencoding::decode(&s.replace('+', " ")).unwrap().into_owned();
            (decode(k), decode(v))
        })
        .collect()
}

/// Recomputes the signature the way EC2 would and compares it
struct ValidSignature {
    host: String,
    algorithm: SignatureAlgorithm,
}

impl Match for ValidSignature {
    fn matches(&self, request: &Request) -> bool {
        let Ok(body) = std::str::from_utf8(&request.body) else {
            return false;
        };
        let mut params = decode_form(body);
        let Some(signature) = params.remove("Signature") else {
            return false;
        };

        RequestSigner::new(SECRET, self.host.clone(), self.algorithm)
            .sign(&params)
            .is_ok_and(|expected| expected == signature)
    }
}

async fn mount(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("Action=DescribeInstanceStatus"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn host_of(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

#[tokio::test]
async fn test_healthy_instances_report_ok() {
    let server = MockServer::start().await;
    mount(&server, 200, HEALTHY).await;

    let report = check::run(&config(&server.uri(), &[])).await;

    assert_eq!(report.status, NagiosStatus::Ok);
    assert_eq!(report.message, "OK - 2 healthy servers");
}

#[tokio::test]
async fn test_impaired_instance_reports_critical() {
    let server = MockServer::start().await;
    mount(&server, 200, IMPAIRED).await;

    let report = check::run(&config(&server.uri(), &[])).await;

    assert_eq!(report.status, NagiosStatus::Critical);
    assert_eq!(
        report.message,
        "us-east-1b:i-d8e3f1a2:reachability-failed, \
         us-east-1b:i-d8e3f1a2:system-retirement:The instance is running on degraded hardware"
    );
}

#[tokio::test]
async fn test_api_error_body_is_evaluated_regardless_of_http_status() {
    let server = MockServer::start().await;
    mount(&server, 401, AUTH_FAILURE).await;

    let report = check::run(&config(&server.uri(), &[])).await;

    assert_eq!(report.status, NagiosStatus::Critical);
    assert_eq!(
        report.message,
        "AuthFailure:AWS was not able to validate the provided access credentials"
    );
}

#[tokio::test]
async fn test_malformed_body_reports_connection_error() {
    let server = MockServer::start().await;
    mount(&server, 503, "Service Unavailable").await;

    let report = check::run(&config(&server.uri(), &[])).await;

    assert_eq!(report.status, NagiosStatus::Critical);
    let prefix = format!("Error connecting to {} *** ", host_of(&server));
    assert!(
        report.message.starts_with(&prefix),
        "unexpected message: {}",
        report.message
    );
    assert!(report.message.contains("malformed XML response"));
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_connection_error() {
    let report = check::run(&config("http://127.0.0.1:1", &["--timeout-seconds", "5"])).await;

    assert_eq!(report.status, NagiosStatus::Critical);
    assert!(
        report
            .message
            .starts_with("Error connecting to 127.0.0.1:1 *** "),
        "unexpected message: {}",
        report.message
    );
    assert!(report.message.contains("HTTP request failed"));
}

#[tokio::test]
async fn test_request_is_signed_with_sha256_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("SignatureMethod=HmacSHA256"))
        .and(body_string_contains("SignatureVersion=2"))
        .and(body_string_contains("Version=2011-12-15"))
        .and(body_string_contains("AWSAccessKeyId=AKIDEXAMPLE"))
        .and(header("host", host_of(&server).as_str()))
        .and(ValidSignature {
            host: host_of(&server),
            algorithm: SignatureAlgorithm::Sha256,
        })
        .respond_with(ResponseTemplate::new(200).set_body_string(HEALTHY))
        .expect(1)
        .mount(&server)
        .await;

    let report = check::run(&config(&server.uri(), &[])).await;

    assert_eq!(report.status, NagiosStatus::Ok);
}

#[tokio::test]
async fn test_request_is_signed_with_sha1_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("SignatureMethod=HmacSHA1"))
        .and(ValidSignature {
            host: host_of(&server),
            algorithm: SignatureAlgorithm::Sha1,
        })
        .respond_with(ResponseTemplate::new(200).set_body_string(HEALTHY))
        .expect(1)
        .mount(&server)
        .await;

    let report = check::run(&config(&server.uri(), &["--signature-algorithm", "SHA1"])).await;

    assert_eq!(report.status, NagiosStatus::Ok);
}

#[tokio::test]
async fn test_same_response_gives_same_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IMPAIRED))
        .expect(2)
        .mount(&server)
        .await;

    let config = config(&server.uri(), &[]);
    let first = check::run(&config).await;
    let second = check::run(&config).await;

    assert_eq!(first, second);
}
