use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use arcade_core::model::{AttemptId, AttemptSubmission};

use crate::recorder::AttemptRecorder;

/// Where the background save of a finished attempt stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// Nothing was recorded (no recorder, quit, or torn down).
    Skipped,
    Pending,
    Saved {
        attempt_id: AttemptId,
        total_points: i64,
    },
    /// The recorder rejected the attempt; shown to the player, never retried.
    Failed { message: String },
}

impl PersistStatus {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, PersistStatus::Pending)
    }
}

/// Receiving end of a spawned recording task.
#[derive(Debug)]
pub struct PersistHandle {
    status: PersistStatus,
    rx: Option<oneshot::Receiver<PersistStatus>>,
}

impl PersistHandle {
    #[must_use]
    pub fn skipped() -> Self {
        Self::settled(PersistStatus::Skipped)
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::settled(PersistStatus::Failed {
            message: message.into(),
        })
    }

    fn settled(status: PersistStatus) -> Self {
        Self { status, rx: None }
    }

    /// Submit the attempt and credit points on the ambient tokio runtime.
    ///
    /// Returns immediately; outside a runtime the handle is already `Failed`.
    #[must_use]
    pub fn spawn(
        recorder: Arc<dyn AttemptRecorder>,
        submission: AttemptSubmission,
        credit: i64,
    ) -> Self {
        let Ok(runtime) = Handle::try_current() else {
            log::error!(
                "cannot record attempt for {}: no async runtime",
                submission.challenge_id
            );
            return Self::failed("could not save your result: no async runtime available");
        };

        let (tx, rx) = oneshot::channel();
        runtime.spawn(async move {
            let status = record(recorder.as_ref(), submission, credit).await;
            // The session may have been dropped; nobody is left to tell.
            let _ = tx.send(status);
        });

        Self {
            status: PersistStatus::Pending,
            rx: Some(rx),
        }
    }

    /// Latest known status without blocking.
    pub fn poll(&mut self) -> &PersistStatus {
        if let Some(rx) = self.rx.as_mut() {
            match rx.try_recv() {
                Ok(status) => {
                    self.status = status;
                    self.rx = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Closed) => {
                    self.status = interrupted();
                    self.rx = None;
                }
            }
        }
        &self.status
    }

    /// Wait for the recording task to settle.
    pub async fn wait(&mut self) -> PersistStatus {
        if let Some(rx) = self.rx.take() {
            self.status = rx.await.unwrap_or_else(|_| interrupted());
        }
        self.status.clone()
    }
}

fn interrupted() -> PersistStatus {
    PersistStatus::Failed {
        message: "saving your result was interrupted".into(),
    }
}

async fn record(
    recorder: &dyn AttemptRecorder,
    submission: AttemptSubmission,
    credit: i64,
) -> PersistStatus {
    let challenge_id = submission.challenge_id.clone();
    let record = match recorder.submit_attempt(submission).await {
        Ok(record) => record,
        Err(err) => {
            log::error!("submitting attempt for {challenge_id} failed: {err}");
            return PersistStatus::Failed {
                message: err.to_string(),
            };
        }
    };

    match recorder.add_points(credit).await {
        Ok(total_points) => PersistStatus::Saved {
            attempt_id: record.id,
            total_points,
        },
        Err(err) => {
            log::error!("crediting {credit} points for {challenge_id} failed: {err}");
            PersistStatus::Failed {
                message: err.to_string(),
            }
        }
    }
}
