//! Reboot maintenance: stop, start, then hold for the cool-down.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use fleetcycle_core::call::{bounded, unbounded};
use fleetcycle_core::{ComputeApi, CycleResult, InstanceId};

pub struct RebootAction {
    api: Arc<dyn ComputeApi>,
    api_timeout: Duration,
    cool_down: Duration,
}

impl RebootAction {
    pub fn new(api: Arc<dyn ComputeApi>, api_timeout: Duration, cool_down: Duration) -> Self {
        Self {
            api,
            api_timeout,
            cool_down,
        }
    }

    /// Stop the instance, start it again, and wait out the cool-down.
    ///
    /// Any failing step aborts; the instance may be left stopped.
    pub async fn run(&self, instance: &InstanceId) -> CycleResult<()> {
        let target = instance.as_str();
        info!(%instance, "instance will restart");

        bounded("stop instance", target, self.api_timeout, self.api.stop(instance)).await?;
        debug!(%instance, "waiting for instance to stop");
        unbounded("wait instance stopped", target, self.api.wait_stopped(instance)).await?;

        bounded("start instance", target, self.api_timeout, self.api.start(instance)).await?;
        debug!(%instance, "waiting for instance status ok");
        unbounded("wait instance status ok", target, self.api.wait_status_ok(instance)).await?;

        // Status checks can pass before the application is ready.
        debug!(%instance, cool_down = ?self.cool_down, "cooling down");
        tokio::time::sleep(self.cool_down).await;

        info!(%instance, "instance restarted");
        Ok(())
    }
}
