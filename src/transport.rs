//! Network side of a submission.
//!
//! [`Transport`] is the seam between the client lifecycle and the wire. Any
//! HTTP status counts as a delivered response; only failures to obtain a body
//! at all are errors.

use crate::dom::{FieldValue, FormData};
use crate::Result;

#[cfg(feature = "http")]
use crate::{ClientConfig, Error};
#[cfg(feature = "http")]
use reqwest::blocking::{multipart, Client};
#[cfg(feature = "http")]
use std::time::Duration;

/// Sends an encoded form and returns the raw response body
pub trait Transport: Send + Sync {
    /// POST `form` as multipart to `url`. Errors only when no response body
    /// could be obtained.
    fn post_form(&self, url: &str, form: &FormData) -> Result<String>;
}

/// Human readable summary of a form, for logs
pub fn describe(form: &FormData) -> String {
    form.fields
        .iter()
        .map(|f| match &f.value {
            FieldValue::Text(v) => format!("{}={:?}", f.name, v),
            FieldValue::File(Some(p)) => format!("{}=@{}", f.name, p.display()),
            FieldValue::File(None) => format!("{}=@<none>", f.name),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// reqwest-backed transport
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// GET a page and return its body (used to load the submission page)
    pub fn fetch_page(&self, url: &str) -> Result<String> {
        let mut req = self.client.get(url).header("User-Agent", self.config.user_agent.clone());
        for (k, v) in &self.config.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        let resp = req
            .send()
            .map_err(|e| Error::Page(format!("Failed to fetch {}: {}", url, e)))?;
        resp.text()
            .map_err(|e| Error::Page(format!("Failed to read response body: {}", e)))
    }

    fn encode(form: &FormData) -> Result<multipart::Form> {
        let mut out = multipart::Form::new();
        for field in &form.fields {
            out = match &field.value {
                FieldValue::Text(v) => out.text(field.name.clone(), v.clone()),
                FieldValue::File(Some(path)) => {
                    let bytes = std::fs::read(path).map_err(|e| {
                        Error::Transport(format!("Failed to read {}: {}", path.display(), e))
                    })?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    out.part(field.name.clone(), multipart::Part::bytes(bytes).file_name(file_name))
                }
                // Browsers still send an empty part for an untouched file input
                FieldValue::File(None) => {
                    out.part(field.name.clone(), multipart::Part::bytes(Vec::new()).file_name(""))
                }
            };
        }
        Ok(out)
    }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    fn post_form(&self, url: &str, form: &FormData) -> Result<String> {
        let body = Self::encode(form)?;
        let mut req = self
            .client
            .post(url)
            .header("User-Agent", self.config.user_agent.clone())
            .multipart(body);
        for (k, v) in &self.config.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let resp = req
            .send()
            .map_err(|e| Error::Transport(format!("POST {} failed: {}", url, e)))?;
        let status = resp.status();
        if !status.is_success() {
            log::warn!("{} answered with status {}", url, status);
        }
        resp.text()
            .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))
    }
}
