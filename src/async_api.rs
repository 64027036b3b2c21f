//! Event-driven submission.
//!
//! The transport call runs on a dedicated worker thread so the caller is free
//! while the request is pending; the outcome comes back through a oneshot
//! channel and is applied with [`SubmissionClient::settle`].

use crate::client::SubmissionClient;
use crate::payload::ResponsePayload;
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;

/// Handle to a request running in the background
///
/// Dropping the handle without settling its outcome releases the client:
/// the next submission restores the control and goes ahead.
pub struct PendingSubmission {
    rx: Option<oneshot::Receiver<Result<String>>>,
    released: Arc<AtomicBool>,
}

impl PendingSubmission {
    /// Wait for the transport outcome
    pub async fn outcome(mut self) -> Result<String> {
        match self.rx.take() {
            Some(rx) => rx.await.map_err(canceled)?,
            None => Err(Error::Transport("Submission outcome already taken".into())),
        }
    }

    /// Blocking variant for callers outside an async runtime
    pub fn wait(mut self) -> Result<String> {
        match self.rx.take() {
            Some(rx) => rx.blocking_recv().map_err(canceled)?,
            None => Err(Error::Transport("Submission outcome already taken".into())),
        }
    }
}

impl Drop for PendingSubmission {
    fn drop(&mut self) {
        self.released.store(true, Ordering::Release);
    }
}

fn canceled(e: oneshot::error::RecvError) -> Error {
    Error::Transport(format!("Submission worker canceled: {}", e))
}

impl SubmissionClient {
    /// Enter the loading state and send the form from a worker thread.
    ///
    /// The client stays in flight until the returned handle's outcome is
    /// passed to [`settle`](SubmissionClient::settle) or the handle is
    /// dropped; further dispatches are rejected meanwhile.
    pub fn dispatch(&mut self) -> Result<PendingSubmission> {
        let request = self.begin()?;
        let transport = self.transport.clone();
        let (tx, rx) = oneshot::channel();

        let spawned = thread::Builder::new()
            .name("risc16-submit-worker".into())
            .spawn(move || {
                let res = transport.post_form(&request.url, &request.form);
                // Receiver gone means nobody will settle; nothing left to do
                let _ = tx.send(res);
            });
        if let Err(e) = spawned {
            log::error!("failed to start submission worker: {}", e);
            self.finish();
            return Err(Error::Transport(format!("Failed to start submission worker: {}", e)));
        }

        let released = Arc::new(AtomicBool::new(false));
        self.released = Some(released.clone());
        Ok(PendingSubmission { rx: Some(rx), released })
    }

    /// Dispatch, await the outcome and settle it
    pub async fn submit_async(&mut self) -> Result<ResponsePayload> {
        let pending = self.dispatch()?;
        let outcome = pending.outcome().await;
        self.settle(outcome)
    }
}
