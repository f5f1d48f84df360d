//! Orchestrator: drives each instance through its maintenance cycle.
//!
//! Instances are processed strictly in sequence. For one instance the
//! phases never overlap: the action starts only after every balancer has
//! confirmed the drain, and restore starts only after the action (including
//! its cool-down) has returned.

use std::time::Duration;

use tracing::{debug, info, warn};

use fleetcycle_balancer::{Coordinator, FleetMembership};
use fleetcycle_core::{CyclePhase, CycleResult, InstanceId, MaintenanceOutcome};
use fleetcycle_maintain::MaintenanceAction;

use crate::report::{CycleRecord, Progress, Stage};

pub struct Orchestrator<'a> {
    fleet: &'a FleetMembership,
    action: &'a MaintenanceAction,
    stabilization: Duration,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        fleet: &'a FleetMembership,
        action: &'a MaintenanceAction,
        stabilization: Duration,
    ) -> Self {
        Self {
            fleet,
            action,
            stabilization,
        }
    }

    /// Cycle every instance in the fleet. Stops at the first failure;
    /// `progress` then names the instance and phase that failed.
    pub async fn run(&self, progress: &mut Progress) -> CycleResult<()> {
        let total = self.fleet.instances.len();
        info!(instances = total, action = self.action.label(), "starting maintenance run");

        for (index, instance) in self.fleet.instances.iter().enumerate() {
            debug!(%instance, position = index + 1, total, "next instance");
            self.cycle(instance, progress).await?;
        }

        progress.enter(Stage::Finished);
        info!(instances = total, "maintenance run completed");
        Ok(())
    }

    /// Walk one instance from `Discovered` to `Done`.
    async fn cycle(&self, instance: &InstanceId, progress: &mut Progress) -> CycleResult<()> {
        let coordinator = Coordinator::new(self.fleet);
        let mut phase = CyclePhase::Discovered;
        progress.begin_cycle();

        while !phase.is_terminal() {
            progress.enter(Stage::Cycling {
                instance: instance.clone(),
                phase,
            });

            if let Err(err) = self.step(&coordinator, instance, phase, progress).await {
                warn!(%instance, %phase, error = %err, "instance cycle failed");
                progress.finish_cycle(
                    instance,
                    MaintenanceOutcome::Failed {
                        reason: err.to_string(),
                    },
                );
                return Err(err);
            }

            let Some(next) = phase.next() else { break };
            debug!(%instance, from = %phase, to = %next, "phase complete");
            phase = next;
        }

        let record = progress.finish_cycle(instance, MaintenanceOutcome::Succeeded);
        info!(
            %instance,
            balancers = record.balancers,
            elapsed = ?record.elapsed,
            "instance cycle done"
        );
        Ok(())
    }

    async fn step(
        &self,
        coordinator: &Coordinator<'_>,
        instance: &InstanceId,
        phase: CyclePhase,
        progress: &mut Progress,
    ) -> CycleResult<()> {
        match phase {
            CyclePhase::Discovered | CyclePhase::Done | CyclePhase::Failed => Ok(()),
            CyclePhase::Draining => {
                progress.drained(coordinator.drain(instance).await?);
                Ok(())
            }
            CyclePhase::Acting => self.action.perform(instance).await,
            CyclePhase::Restoring => coordinator.restore(instance).await.map(|_| ()),
            CyclePhase::Stabilizing => {
                debug!(%instance, interval = ?self.stabilization, "stabilizing");
                tokio::time::sleep(self.stabilization).await;
                Ok(())
            }
        }
    }
}
