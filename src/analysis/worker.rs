use crate::analysis::error::WorkflowError;
use crate::analysis::types::AnalysisResponse;
use std::future::Future;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// Monotonic request counter. A reply is applied only while its token is
/// still the current one.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    pub fn advance(&mut self) -> RequestToken {
        self.current += 1;
        RequestToken(self.current)
    }

    /// Makes every token issued so far stale.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.current
    }
}

#[derive(Debug)]
pub enum WorkerEvent {
    Analysis {
        token: RequestToken,
        outcome: Result<AnalysisResponse, WorkflowError>,
    },
    Download {
        token: RequestToken,
        outcome: Result<PathBuf, WorkflowError>,
    },
    Sheets {
        token: RequestToken,
        outcome: Result<Vec<String>, WorkflowError>,
    },
}

/// Runs `job` to completion on its own thread with a current-thread runtime
/// and posts the resulting event. `on_runtime_failure` builds the event sent
/// when the runtime itself cannot start.
pub fn spawn_worker<F, Fut>(
    sender: Sender<WorkerEvent>,
    job: F,
    on_runtime_failure: impl FnOnce(String) -> WorkerEvent + Send + 'static,
) where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = WorkerEvent>,
{
    std::thread::spawn(move || {
        let event = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(job()),
            Err(e) => {
                log::error!("Failed to start worker runtime: {}", e);
                on_runtime_failure(e.to_string())
            }
        };
        if sender.send(event).is_err() {
            log::debug!("Worker finished after the receiver was dropped");
        }
    });
}
