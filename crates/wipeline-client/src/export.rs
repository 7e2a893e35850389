//! Report-export API client.
//!
//! Talks to the management console's export endpoint: one POST per
//! extraction window, carrying a query document in a multipart form, with
//! basic auth. The query construction and response classification are pure
//! functions; only [`ExportClient::fetch`] touches the network.
//!
//! # Examples
//!
//! ```no_run
//! use wipeline_client::{ClientConfig, ExportClient};
//!
//! let config = ClientConfig::new("https://console.example/ws/report/export", "svc", "secret");
//! let client = ExportClient::new(config).unwrap();
//! // fetch() is async; drive it from the pipeline's runtime
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use wipeline_domain::{
    format_boundary, ExportResponse, ReportDocument, ReportNode, ReportSource, Window,
};

use crate::ClientError;

/// Default upper bound on one export request (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Name of the multipart form part carrying the query document
pub const REQUEST_PART: &str = "xmlRequest";

/// Body marker the console uses when a window holds no reports
const NO_REPORTS_MARKER: &str = "no reports found";

/// Configuration for the export client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Export endpoint URL
    pub url: String,

    /// Basic-auth username
    pub username: String,

    /// Basic-auth password
    pub password: String,

    /// Upper bound on one export request (seconds)
    pub timeout_secs: u64,

    /// Accept self-signed TLS certificates; leave off unless the console
    /// genuinely needs it
    pub accept_invalid_certs: bool,

    /// Optional place filter added to every export query
    pub place: Option<String>,
}

impl ClientConfig {
    /// Create a configuration with default timeout and strict TLS
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: false,
            place: None,
        }
    }

    /// Restrict every export query to one place value
    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Allow self-signed TLS certificates
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("export URL must not be empty".to_string());
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("export URL must be http(s)".to_string());
        }
        if self.username.is_empty() {
            return Err("username must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// HTTP implementation of [`ReportSource`].
///
/// One instance is reused across extraction cycles; the underlying
/// connection pool belongs to the embedded reqwest client.
#[derive(Debug)]
pub struct ExportClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl ExportClient {
    /// Build a client from a validated configuration
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate().map_err(ClientError::Config)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl ReportSource for ExportClient {
    type Error = ClientError;

    async fn fetch(&self, window: &Window) -> Result<ExportResponse, ClientError> {
        info!(
            from = %format_boundary(window.from),
            to = %format_boundary(window.to),
            "requesting export window"
        );
        let request_document = build_request_document(window, self.config.place.as_deref());
        debug!(request = %request_document, "export query document");

        let form = reqwest::multipart::Form::new().text(REQUEST_PART, request_document);
        let response = self
            .client
            .post(&self.config.url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Communication(format!("request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Communication(format!("failed to read response body: {}", e)))?;
        classify_response(status, body)
    }
}

/// Build the export query document for one window.
///
/// The query asks for original-mode reports whose report date falls in
/// `[from, to)`, plus an equality filter on the place field when one is
/// configured.
pub fn build_request_document(window: &Window, place: Option<&str>) -> String {
    let mut export = ReportNode::new("export-report")
        .with_child(ReportNode::new("report").with_attr("mode", "original"))
        .with_child(search(
            "report.report_date",
            &format_boundary(window.from),
            "gte",
            "date",
        ))
        .with_child(search(
            "report.report_date",
            &format_boundary(window.to),
            "lt",
            "date",
        ));
    if let Some(place) = place {
        export = export.with_child(search("user_data.fields.place", place, "eq", "string"));
    }
    ReportDocument {
        root: ReportNode::new("request").with_child(export),
    }
    .render()
}

fn search(path: &str, value: &str, operator: &str, datatype: &str) -> ReportNode {
    ReportNode::new("search")
        .with_attr("path", path)
        .with_attr("value", value)
        .with_attr("operator", operator)
        .with_attr("datatype", datatype)
        .with_attr("conjunction", "true")
}

/// Classify an export response by status code and body.
///
/// A 200 carries the report collection. A non-200 whose body mentions that
/// no reports were found is a successful empty window; any other non-200 is
/// a hard failure carrying status and body.
pub fn classify_response(status: u16, body: String) -> Result<ExportResponse, ClientError> {
    if status == 200 {
        return Ok(ExportResponse::Reports(body));
    }
    if body.to_lowercase().contains(NO_REPORTS_MARKER) {
        return Ok(ExportResponse::NoReports);
    }
    Err(ClientError::Api { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wipeline_domain::parse_boundary;

    fn window() -> Window {
        Window {
            from: parse_boundary("2024-05-01 12:00:00").unwrap(),
            to: parse_boundary("2024-05-01 13:00:00").unwrap(),
        }
    }

    #[test]
    fn test_request_document_contains_window_searches() {
        let document = build_request_document(&window(), None);
        assert!(document.contains("<report mode=\"original\"/>"));
        assert!(document.contains(
            "path=\"report.report_date\" value=\"2024-05-01 12:00:00\" operator=\"gte\""
        ));
        assert!(document.contains(
            "path=\"report.report_date\" value=\"2024-05-01 13:00:00\" operator=\"lt\""
        ));
        assert!(!document.contains("user_data.fields.place"));
    }

    #[test]
    fn test_request_document_with_place_filter() {
        let document = build_request_document(&window(), Some("Warehouse 7"));
        assert!(document.contains(
            "path=\"user_data.fields.place\" value=\"Warehouse 7\" operator=\"eq\" datatype=\"string\""
        ));
    }

    #[test]
    fn test_request_document_parses_back() {
        let rendered = build_request_document(&window(), Some("W"));
        let document = ReportDocument::parse(&rendered).unwrap();
        assert_eq!(document.root.tag, "request");
        let export = document.root.child("export-report").unwrap();
        assert_eq!(export.children.len(), 4);
    }

    #[test]
    fn test_classify_ok_response() {
        let result = classify_response(200, "<root><report/></root>".to_string()).unwrap();
        assert_eq!(
            result,
            ExportResponse::Reports("<root><report/></root>".to_string())
        );
    }

    #[test]
    fn test_classify_no_reports_sentinel() {
        let result = classify_response(404, "Error: NO REPORTS FOUND.".to_string()).unwrap();
        assert_eq!(result, ExportResponse::NoReports);
        let result = classify_response(500, "no reports found for query".to_string()).unwrap();
        assert_eq!(result, ExportResponse::NoReports);
    }

    #[test]
    fn test_classify_sentinel_only_checked_on_failure() {
        // A 200 body is always the report payload, whatever it says
        let result = classify_response(200, "no reports found".to_string()).unwrap();
        assert_eq!(result, ExportResponse::Reports("no reports found".to_string()));
    }

    #[test]
    fn test_classify_hard_failure() {
        let err = classify_response(401, "Unauthorized".to_string()).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, .. }));
    }

    #[test]
    fn test_config_validation() {
        assert!(ClientConfig::new("https://c.example/export", "svc", "pw")
            .validate()
            .is_ok());
        assert!(ClientConfig::new("", "svc", "pw").validate().is_err());
        assert!(ClientConfig::new("ftp://c.example", "svc", "pw").validate().is_err());
        assert!(ClientConfig::new("https://c.example", "", "pw").validate().is_err());
        assert!(ClientConfig::new("https://c.example", "svc", "pw")
            .with_timeout_secs(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let err = ExportClient::new(ClientConfig::new("", "svc", "pw")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_client_builds_with_valid_config() {
        let config = ClientConfig::new("https://c.example/export", "svc", "pw")
            .with_timeout_secs(30)
            .with_accept_invalid_certs(true)
            .with_place("Warehouse 7");
        let client = ExportClient::new(config).unwrap();
        assert_eq!(client.config().place.as_deref(), Some("Warehouse 7"));
    }
}
