use tracing::{debug, warn};

use crate::error::Result;
use crate::nagios::Report;
use crate::xml::{self, Element};

const STATUS_OK: &str = "ok";
const RESPONSE_ROOT: &str = "DescribeInstanceStatusResponse";
const ERROR_ROOT: &str = "Response";

/// `Errors/Error` entry of a failed query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn from_element(el: &Element) -> Self {
        Self {
            code: el.text_at("Code").to_string(),
            message: el.text_at("Message").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCheck {
    pub name: String,
    pub status: String,
}

/// `systemStatus` or `instanceStatus` block of an item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub status: String,
    pub details: Vec<StatusCheck>,
}

impl StatusSummary {
    fn from_element(el: Option<&Element>) -> Self {
        let Some(el) = el else {
            return Self::default();
        };

        Self {
            status: el.text_at("status").to_string(),
            details: el
                .find_all("details/item")
                .into_iter()
                .map(|check| StatusCheck {
                    name: check.text_at("name").to_string(),
                    status: check.text_at("status").to_string(),
                })
                .collect(),
        }
    }

    /// Exact match on `ok`; `impaired`, `initializing`, `insufficient-data` and
    /// `not-applicable` are all not ok
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceEvent {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceStatusRecord {
    pub instance_id: String,
    pub availability_zone: String,
    pub system_status: StatusSummary,
    pub instance_status: StatusSummary,
    /// `None` when the item has no `eventsSet` element
    pub events: Option<Vec<InstanceEvent>>,
}

impl InstanceStatusRecord {
    fn from_element(item: &Element) -> Self {
        Self {
            instance_id: item.text_at("instanceId").to_string(),
            availability_zone: item.text_at("availabilityZone").to_string(),
            system_status: StatusSummary::from_element(item.child("systemStatus")),
            instance_status: StatusSummary::from_element(item.child("instanceStatus")),
            events: item.child("eventsSet").map(|set| {
                set.find_all("item")
                    .into_iter()
                    .map(|event| InstanceEvent {
                        code: event.text_at("code").to_string(),
                        description: event.text_at("description").to_string(),
                    })
                    .collect()
            }),
        }
    }

    /// Failed sub-checks of non-ok summaries, then scheduled events
    pub fn anomalies(&self) -> Vec<String> {
        let mut anomalies = Vec::new();

        for summary in [&self.system_status, &self.instance_status] {
            if summary.is_ok() {
                continue;
            }
            for check in &summary.details {
                anomalies.push(format!(
                    "{}:{}:{}-{}",
                    self.availability_zone, self.instance_id, check.name, check.status
                ));
            }
        }

        for event in self.events.iter().flatten() {
            anomalies.push(format!(
                "{}:{}:{}:{}",
                self.availability_zone, self.instance_id, event.code, event.description
            ));
        }

        anomalies
    }
}

/// Parsed `DescribeInstanceStatus` reply, or the `Response` error envelope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeInstanceStatusResponse {
    pub errors: Vec<ApiError>,
    pub instances: Vec<InstanceStatusRecord>,
    pub next_token: Option<String>,
    pub request_id: Option<String>,
}

impl DescribeInstanceStatusResponse {
    pub fn from_xml(body: &str) -> Result<Self> {
        let root = xml::parse(body)?;
        let mut response = Self::default();

        match root.name.as_str() {
            ERROR_ROOT => {
                response.errors = root
                    .find_all("Errors/Error")
                    .into_iter()
                    .map(ApiError::from_element)
                    .collect();
                response.request_id = non_empty(root.text_at("RequestID"));
            }
            RESPONSE_ROOT => {
                response.instances = root
                    .find_all("instanceStatusSet/item")
                    .into_iter()
                    .map(InstanceStatusRecord::from_element)
                    .collect();
                response.next_token = non_empty(root.text_at("nextToken"));
                response.request_id = non_empty(root.text_at("requestId"));
            }
            other => {
                warn!(
                    root_element = %other,
                    "Unexpected root element in EC2 response, nothing to evaluate"
                );
            }
        }

        debug!(
            request_id = ?response.request_id,
            api_errors = response.errors.len(),
            instance_count = response.instances.len(),
            "Parsed DescribeInstanceStatus response"
        );

        Ok(response)
    }

    /// Error list in document order: API errors first, then per-instance anomalies
    pub fn error_list(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("{}:{}", e.code, e.message))
            .chain(self.instances.iter().flat_map(|i| i.anomalies()))
            .collect()
    }

    /// Every item counts as a server, whatever its status
    pub fn server_count(&self) -> usize {
        self.instances.len()
    }

    pub fn report(&self) -> Report {
        if self.next_token.is_some() {
            warn!(
                evaluated_instances = self.instances.len(),
                "Response is paginated, only the first page of instance statuses was evaluated"
            );
        }

        let errors = self.error_list();
        if !errors.is_empty() {
            warn!(
                error_count = errors.len(),
                total_checked = self.server_count(),
                "Status check failures detected"
            );
            return Report::critical(errors.join(", "));
        }

        debug!(
            total_checked = self.server_count(),
            "All instance status checks passed"
        );
        Report::ok(format!("OK - {} healthy servers", self.server_count()))
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Parses a response body and classifies it
pub fn evaluate(body: &str) -> Result<Report> {
    Ok(DescribeInstanceStatusResponse::from_xml(body)?.report())
}
