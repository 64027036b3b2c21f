//! Submission lifecycle.
//!
//! A submission is split in two halves so it can be driven either inline or
//! from an event loop:
//!
//! - [`SubmissionClient::begin`] collects the form, marks the submission in
//!   flight and puts the submit control into its loading state.
//! - [`SubmissionClient::settle`] applies the transport outcome: a body goes
//!   through [`SubmissionClient::on_success`], a transport error through
//!   [`SubmissionClient::on_failure`].
//!
//! [`SubmissionClient::submit`] runs both halves around a blocking
//! [`Transport`] call.

use crate::dom::{Document, FieldValue, FormData};
use crate::highlight::{Grammar, Highlighter};
use crate::payload::{Rendered, ResponsePayload};
use crate::platform::{Alerter, PlatformApi};
use crate::theme::{Theme, ThemeState};
use crate::transport::{self, Transport};
use crate::{ClientConfig, Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A request that has been started but not settled
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub url: String,
    pub form: FormData,
}

pub struct SubmissionClient {
    config: ClientConfig,
    document: Document,
    pub(crate) transport: Arc<dyn Transport>,
    highlighter: Arc<dyn Highlighter>,
    alerter: Box<dyn Alerter>,
    theme: ThemeState,
    in_flight: bool,
    /// Set once the handle of a dispatched submission is dropped
    pub(crate) released: Option<Arc<AtomicBool>>,
}

impl SubmissionClient {
    /// Attach the client to a loaded page. Runs the page-load steps: the
    /// initial highlight pass and theme initialisation from the host's
    /// color-scheme preference.
    pub fn new(
        config: ClientConfig,
        document: Document,
        transport: Arc<dyn Transport>,
        highlighter: Arc<dyn Highlighter>,
        platform: &dyn PlatformApi,
    ) -> Self {
        let theme = ThemeState::from_preference(platform.media_query().as_ref());
        let mut client = Self {
            config,
            document,
            transport,
            highlighter,
            alerter: platform.alerter(),
            theme,
            in_flight: false,
            released: None,
        };
        client.highlight();
        client
            .theme
            .apply_initial(&mut client.document, &client.config.ids.theme_switch);
        client
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn theme(&self) -> Theme {
        self.theme.mode()
    }

    /// Whether a submission is waiting for its outcome
    pub fn is_in_flight(&self) -> bool {
        self.in_flight && !self.handle_released()
    }

    /// Give up on the unsettled submission and restore the submit control.
    /// Returns whether there was one.
    pub fn abandon(&mut self) -> bool {
        if !self.in_flight {
            return false;
        }
        log::warn!("abandoning unsettled submission");
        self.finish();
        true
    }

    /// Set a field of the submission form before submitting
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
        let form = self.config.ids.form.clone();
        self.document.set_field(&form, name, value)
    }

    /// Start a submission: collect the form and enter the loading state.
    ///
    /// Rejected with [`Error::SubmissionInFlight`] while a previous
    /// submission is unsettled, unless its [`PendingSubmission`] handle has
    /// been dropped. A missing form leaves all state untouched.
    ///
    /// [`PendingSubmission`]: crate::PendingSubmission
    pub fn begin(&mut self) -> Result<OutgoingRequest> {
        if self.in_flight {
            if !self.handle_released() {
                log::warn!("submission rejected: previous request still pending");
                return Err(Error::SubmissionInFlight);
            }
            log::warn!("previous submission was dropped before it settled");
            self.finish();
        }
        let form = self.document.form_data(&self.config.ids.form)?;
        self.in_flight = true;
        self.set_loading(true);
        log::debug!("POST {} {}", self.config.endpoint, transport::describe(&form));
        Ok(OutgoingRequest {
            url: self.config.endpoint.clone(),
            form,
        })
    }

    /// Apply the outcome of the request issued by [`begin`](Self::begin)
    pub fn settle(&mut self, outcome: Result<String>) -> Result<ResponsePayload> {
        match outcome {
            Ok(body) => self.on_success(&body),
            Err(err) => {
                log::error!("submission failed: {}", err);
                self.on_failure();
                Err(err)
            }
        }
    }

    /// Submit the form and wait for the response on this thread
    pub fn submit(&mut self) -> Result<ResponsePayload> {
        let request = self.begin()?;
        let outcome = self.transport.post_form(&request.url, &request.form);
        self.settle(outcome)
    }

    /// Handle a delivered response body: render, re-highlight, leave the
    /// loading state. A body that is not a JSON object is reported as
    /// [`Error::Payload`] without any alert; the control is restored either way.
    pub fn on_success(&mut self, raw: &str) -> Result<ResponsePayload> {
        let payload = match ResponsePayload::parse(raw) {
            Ok(p) => p,
            Err(err) => {
                log::error!("unusable response payload: {}", err);
                self.finish();
                return Err(err);
            }
        };
        log::debug!("payload: {:?}", payload);

        self.render(&payload);
        self.highlight();
        self.finish();
        Ok(payload)
    }

    /// Handle a transport failure: alert once, leave the loading state. No retry.
    pub fn on_failure(&mut self) {
        self.alerter.alert(&self.config.alert_message);
        self.finish();
    }

    /// Write the payload into the page regions. Each field updates its region
    /// only when both exist.
    pub fn render(&mut self, payload: &ResponsePayload) {
        let ids = &self.config.ids;
        if let Some(code) = &payload.code_content {
            self.document.set_text_content(&ids.code_result, code);
        }
        if let Some(state) = &payload.end_state {
            self.document.set_text_content(&ids.end_state, state);
        }
        if let Some(results) = &payload.tests_results {
            match results.render() {
                Rendered::Markup(html) => self.document.set_inner_html(&ids.tests_results, &html),
                Rendered::Text(text) => self.document.set_text_content(&ids.tests_results, &text),
            };
        }
    }

    /// Ask the host highlighter to decorate the displayed code
    pub fn highlight(&mut self) {
        if let Err(e) = self
            .highlighter
            .highlight(&mut self.document, Grammar::risc16())
        {
            log::warn!("highlighter failed: {}", e);
        }
    }

    /// Flip the light/dark mode
    pub fn switch_mode(&mut self) -> Theme {
        let control = self.config.ids.theme_switch.clone();
        self.theme.switch_mode(&mut self.document, &control)
    }

    pub(crate) fn finish(&mut self) {
        self.in_flight = false;
        self.released = None;
        self.set_loading(false);
    }

    fn handle_released(&self) -> bool {
        self.released
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Acquire))
    }

    fn set_loading(&mut self, loading: bool) {
        let class = self.config.loading_class.clone();
        if let Some(button) = self.document.element_mut(&self.config.ids.submit_button) {
            button.set_disabled(loading);
            if loading {
                button.add_class(&class);
            } else {
                button.remove_class(&class);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::RecordingHighlighter;
    use crate::platform::{ColorScheme, NoopPlatform, RecordingAlerter, RecordingPlatform};
    use std::sync::Mutex;

    const PAGE: &str = r#"<html><body>
<form id="submit_code"><input name="exo" value="mult"><button id="submit_button">Run</button></form>
<pre id="code_result"></pre><div id="tests_results"></div><pre id="end_state"></pre>
<button id="theme-switch">☀️</button>
</body></html>"#;

    /// Replays canned outcomes and records requests
    struct CannedTransport {
        outcome: Mutex<Vec<Result<String>>>,
        seen: Mutex<Vec<OutgoingRequest>>,
    }

    impl CannedTransport {
        fn new(outcomes: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                outcome: Mutex::new(outcomes),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for CannedTransport {
        fn post_form(&self, url: &str, form: &FormData) -> Result<String> {
            self.seen.lock().unwrap().push(OutgoingRequest {
                url: url.to_string(),
                form: form.clone(),
            });
            self.outcome.lock().unwrap().remove(0)
        }
    }

    fn client(transport: Arc<dyn Transport>) -> (SubmissionClient, Arc<RecordingAlerter>) {
        let platform = RecordingPlatform::new(None);
        let alerts = platform.alerts();
        let c = SubmissionClient::new(
            ClientConfig::default(),
            Document::parse(PAGE).unwrap(),
            transport,
            Arc::new(RecordingHighlighter::new()),
            &platform,
        );
        (c, alerts)
    }

    fn button_busy(c: &SubmissionClient) -> bool {
        let b = c.document().element("submit_button").unwrap();
        assert_eq!(b.is_disabled(), b.has_class("button--loading"));
        b.is_disabled()
    }

    #[test]
    fn begin_enters_loading_state_until_settled() {
        let (mut c, _) = client(CannedTransport::new(vec![]));
        let req = c.begin().unwrap();
        assert_eq!(req.url, crate::DEFAULT_ENDPOINT);
        assert_eq!(req.form.get("exo"), Some("mult"));
        assert!(button_busy(&c));
        assert!(c.is_in_flight());

        c.settle(Ok(r#"{"code_content": "halt"}"#.into())).unwrap();
        assert!(!button_busy(&c));
        assert!(!c.is_in_flight());
    }

    #[test]
    fn second_submission_is_rejected_while_pending() {
        let (mut c, _) = client(CannedTransport::new(vec![]));
        c.begin().unwrap();
        assert!(matches!(c.begin(), Err(Error::SubmissionInFlight)));
        assert!(matches!(c.submit(), Err(Error::SubmissionInFlight)));
        assert!(button_busy(&c));
    }

    #[test]
    fn submit_issues_exactly_one_request_and_renders() {
        let transport = CannedTransport::new(vec![Ok(r#"{
            "code_content": "movi r1, 3",
            "end_state": "r1=3",
            "tests_results": [{"test": true, "result_str": "ok", "instr_count": 3}]
        }"#
        .into())]);
        let (mut c, alerts) = client(transport.clone());
        c.submit().unwrap();

        assert_eq!(transport.seen.lock().unwrap().len(), 1);
        let doc = c.document();
        assert_eq!(doc.element("code_result").unwrap().text_content(), "movi r1, 3");
        assert_eq!(doc.element("end_state").unwrap().text_content(), "r1=3");
        assert_eq!(
            doc.element("tests_results").unwrap().inner_html(),
            "<p>✓ ok (3 instruction(s))</p>"
        );
        assert!(alerts.take_messages().is_empty());
        assert!(!button_busy(&c));
    }

    #[test]
    fn transport_failure_alerts_once_and_restores_control() {
        let transport = CannedTransport::new(vec![Err(Error::Transport("refused".into()))]);
        let (mut c, alerts) = client(transport);
        assert!(matches!(c.submit(), Err(Error::Transport(_))));
        assert_eq!(alerts.take_messages(), vec![crate::DEFAULT_ALERT_MESSAGE.to_string()]);
        assert!(!button_busy(&c));
        assert!(!c.is_in_flight());
    }

    #[test]
    fn malformed_payload_is_quiet_and_recoverable() {
        let transport = CannedTransport::new(vec![
            Ok("<html>Internal Server Error</html>".into()),
            Ok(r#"{"tests_results": "2/2 passed"}"#.into()),
        ]);
        let (mut c, alerts) = client(transport);
        assert!(matches!(c.submit(), Err(Error::Payload(_))));
        assert!(alerts.take_messages().is_empty());
        assert!(!button_busy(&c));

        c.submit().unwrap();
        let results = c.document().element("tests_results").unwrap();
        assert_eq!(results.content(), &crate::dom::Content::Text("2/2 passed".into()));
    }

    #[test]
    fn missing_regions_are_skipped() {
        let page = r#"<html><body><form id="submit_code"></form><pre id="code_result"></pre></body></html>"#;
        let mut c = SubmissionClient::new(
            ClientConfig::default(),
            Document::parse(page).unwrap(),
            CannedTransport::new(vec![Ok(
                r#"{"code_content": "nop", "end_state": "pc=1", "tests_results": "ok"}"#.into(),
            )]),
            Arc::new(RecordingHighlighter::new()),
            &NoopPlatform::new(),
        );
        let payload = c.submit().unwrap();
        assert_eq!(payload.end_state.as_deref(), Some("pc=1"));
        assert!(c.document().element("end_state").is_none());
        assert_eq!(c.document().element("code_result").unwrap().text_content(), "nop");
    }

    #[test]
    fn bad_results_still_render_code_and_end_state() {
        let transport = CannedTransport::new(vec![Ok(
            r#"{"code_content": "halt", "end_state": "pc=1", "tests_results": [{"test": true, "result_str": "ok"}]}"#.into(),
        )]);
        let (mut c, alerts) = client(transport);
        c.document_mut().set_text_content("tests_results", "previous");
        c.submit().unwrap();

        let doc = c.document();
        assert_eq!(doc.element("code_result").unwrap().text_content(), "halt");
        assert_eq!(doc.element("end_state").unwrap().text_content(), "pc=1");
        assert_eq!(doc.element("tests_results").unwrap().text_content(), "previous");
        assert!(alerts.take_messages().is_empty());
        assert!(!button_busy(&c));
    }

    #[test]
    fn null_field_clears_region() {
        let transport = CannedTransport::new(vec![Ok(r#"{"end_state": null}"#.into())]);
        let (mut c, _) = client(transport);
        c.document_mut().set_text_content("end_state", "pc=4");
        c.document_mut().set_text_content("code_result", "halt");
        c.submit().unwrap();
        assert_eq!(c.document().element("end_state").unwrap().text_content(), "");
        assert_eq!(c.document().element("code_result").unwrap().text_content(), "halt");
    }

    #[test]
    fn abandon_restores_control() {
        let (mut c, _) = client(CannedTransport::new(vec![Ok("{}".into())]));
        assert!(!c.abandon());
        c.begin().unwrap();
        assert!(c.abandon());
        assert!(!button_busy(&c));
        assert!(!c.is_in_flight());
        c.submit().unwrap();
    }

    #[test]
    fn missing_form_sends_nothing() {
        let transport = CannedTransport::new(vec![]);
        let mut c = SubmissionClient::new(
            ClientConfig::default(),
            Document::parse("<html><body></body></html>").unwrap(),
            transport.clone(),
            Arc::new(RecordingHighlighter::new()),
            &NoopPlatform::new(),
        );
        assert!(matches!(c.submit(), Err(Error::ElementNotFound(_))));
        assert!(!c.is_in_flight());
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn highlighter_runs_on_load_and_after_each_render() {
        let highlighter = Arc::new(RecordingHighlighter::new());
        let mut c = SubmissionClient::new(
            ClientConfig::default(),
            Document::parse(PAGE).unwrap(),
            CannedTransport::new(vec![Ok("{}".into()), Err(Error::Transport("down".into()))]),
            highlighter.clone(),
            &NoopPlatform::new(),
        );
        assert_eq!(highlighter.calls(), 1);
        c.submit().unwrap();
        assert_eq!(highlighter.calls(), 2);
        let _ = c.submit();
        assert_eq!(highlighter.calls(), 2);
    }

    #[test]
    fn dark_preference_is_applied_on_attach() {
        let platform = NoopPlatform::with_color_scheme(ColorScheme::Dark);
        let mut c = SubmissionClient::new(
            ClientConfig::default(),
            Document::parse(PAGE).unwrap(),
            CannedTransport::new(vec![]),
            Arc::new(RecordingHighlighter::new()),
            &platform,
        );
        assert_eq!(c.theme(), Theme::Dark);
        assert!(c.document().has_root_class("dark"));
        assert_eq!(c.switch_mode(), Theme::Light);
        assert_eq!(
            c.document().element("theme-switch").unwrap().text_content(),
            crate::theme::SUN_GLYPH
        );
    }
}
