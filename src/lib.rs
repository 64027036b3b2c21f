//! RISC16 Submission Client
//!
//! A headless client for the RISC16 code-upload tool: it loads the submission
//! page into an in-memory document, posts the upload form to the backend,
//! renders the JSON answer (compiled code, test results, end machine state)
//! into the page regions and asks a host-supplied highlighter to decorate the
//! code with the RISC16 grammar.
//!
//! # Example
//!
//! ```no_run
//! use risc16_submit::{ClientConfig, SubmissionClient};
//! use risc16_submit::dom::{Document, FieldValue};
//! use risc16_submit::highlight::MarkupHighlighter;
//! use risc16_submit::platform::NoopPlatform;
//! use risc16_submit::transport::HttpTransport;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let transport = HttpTransport::new(config.clone())?;
//! let page = transport.fetch_page("http://127.0.0.1:5000/")?;
//!
//! let mut client = SubmissionClient::new(
//!     config,
//!     Document::parse(&page)?,
//!     Arc::new(transport),
//!     Arc::new(MarkupHighlighter::new("code_result")),
//!     &NoopPlatform::new(),
//! );
//! client.set_field("code_area", FieldValue::Text("movi r1, 3\nhalt".into()))?;
//! let payload = client.submit()?;
//! println!("{:?}", payload.tests_results);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

pub mod error;
pub use error::{Error, Result};

pub mod dom;
pub mod highlight;
pub mod payload;
pub mod theme;

// Host surface (alerts, color scheme)
pub mod platform;

pub mod transport;

pub mod client;
pub use client::{OutgoingRequest, SubmissionClient};

// Background dispatch with oneshot completion
pub mod async_api;
pub use async_api::PendingSubmission;

/// Default endpoint of the submission backend
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/submit";

/// Message shown when a submission fails in transport
pub const DEFAULT_ALERT_MESSAGE: &str = "Something went wrong with your request.";

/// Element ids the client reads or writes
///
/// Only `form` is required; every other region is updated when present and
/// skipped otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct DomIds {
    pub form: String,
    pub submit_button: String,
    pub code_result: String,
    pub tests_results: String,
    pub end_state: String,
    pub theme_switch: String,
}

impl Default for DomIds {
    fn default() -> Self {
        Self {
            form: "submit_code".to_string(),
            submit_button: "submit_button".to_string(),
            code_result: "code_result".to_string(),
            tests_results: "tests_results".to_string(),
            end_state: "end_state".to_string(),
            theme_switch: "theme-switch".to_string(),
        }
    }
}

/// Configuration for the submission client
///
/// # Examples
///
/// ```
/// let cfg = risc16_submit::ClientConfig::default();
/// assert_eq!(cfg.endpoint, "http://127.0.0.1:5000/submit");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URL the form is posted to
    pub endpoint: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// User agent string to send with requests
    pub user_agent: String,
    /// Extra HTTP headers
    pub headers: HashMap<String, String>,
    /// Alert text on transport failure
    pub alert_message: String,
    /// Class marking the submit control as busy
    pub loading_class: String,
    pub ids: DomIds,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 30000,
            user_agent: concat!("risc16-submit/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
            alert_message: DEFAULT_ALERT_MESSAGE.to_string(),
            loading_class: "button--loading".to_string(),
            ids: DomIds::default(),
        }
    }
}

impl ClientConfig {
    /// Check the endpoint is an absolute http(s) URL and the timeout is usable
    #[cfg(feature = "http")]
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| Error::Config(format!("endpoint {:?}: {}", self.endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "endpoint must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be greater than zero".into()));
        }
        Ok(())
    }
}
