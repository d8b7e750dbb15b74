mod client;
mod credentials;
mod signer;
mod status;

pub use client::{
    API_VERSION, ClientOptions, Ec2Client, Endpoint, SIGNATURE_VERSION, default_host,
};
pub use credentials::Credentials;
pub use signer::{RequestParameters, RequestSigner, SignatureAlgorithm, canonical_query_string};
pub use status::{
    ApiError, DescribeInstanceStatusResponse, InstanceEvent, InstanceStatusRecord, StatusCheck,
    StatusSummary, evaluate,
};

pub const DESCRIBE_INSTANCE_STATUS: &str = "DescribeInstanceStatus";
