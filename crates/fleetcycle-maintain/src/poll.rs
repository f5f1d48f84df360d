//! Poll-until-terminal loop for asynchronous command results.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use fleetcycle_core::{CommandStatus, CycleResult, PollDecision};

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// The terminal status observed.
    pub status: CommandStatus,
    /// Status fetches made.
    pub polls: u32,
    /// Sleeps taken between fetches (one per non-terminal status).
    pub waits: u32,
}

impl PollReport {
    pub fn succeeded(&self) -> bool {
        self.status.decision() == PollDecision::Succeeded
    }
}

/// Fetch statuses until one is terminal, sleeping `interval` after each
/// non-terminal status. The interval is constant; there is no backoff.
///
/// A fetch error ends the loop immediately.
pub async fn poll_until_terminal<F, Fut>(interval: Duration, mut fetch: F) -> CycleResult<PollReport>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CycleResult<CommandStatus>>,
{
    let mut polls = 0;
    let mut waits = 0;
    loop {
        let status = fetch().await?;
        polls += 1;
        match status.decision() {
            PollDecision::Continue => {
                debug!(%status, polls, "command not finished yet");
                tokio::time::sleep(interval).await;
                waits += 1;
            }
            PollDecision::Succeeded | PollDecision::Failed => {
                return Ok(PollReport {
                    status,
                    polls,
                    waits,
                });
            }
        }
    }
}
