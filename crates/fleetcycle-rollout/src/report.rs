//! Run progress, report, and failure types.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use fleetcycle_core::{CycleError, CyclePhase, InstanceId, MaintenanceOutcome};

/// What the run was doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum Stage {
    Validating,
    Resolving,
    Cycling {
        instance: InstanceId,
        phase: CyclePhase,
    },
    Finished,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validating => f.write_str("configuration"),
            Stage::Resolving => f.write_str("membership resolution"),
            Stage::Cycling { instance, phase } => write!(f, "instance {instance} ({phase})"),
            Stage::Finished => f.write_str("finish"),
        }
    }
}

/// Result of one instance's cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleRecord {
    pub instance: InstanceId,
    #[serde(flatten)]
    pub outcome: MaintenanceOutcome,
    /// Balancers the instance was drained from and restored to.
    pub balancers: usize,
    pub elapsed: Duration,
}

/// Progress of a run, updated as it goes and readable after it stops,
/// including when the deadline cut it short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub records: Vec<CycleRecord>,
    in_flight: Option<InFlight>,
}

/// The instance cycle that has started but not yet been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    started: Instant,
    balancers: usize,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            stage: Stage::Validating,
            records: Vec::new(),
            in_flight: None,
        }
    }
}

impl Progress {
    pub fn enter(&mut self, stage: Stage) {
        self.stage = stage;
    }

    /// Instances that completed their full cycle, in order.
    pub fn completed(&self) -> Vec<InstanceId> {
        self.records
            .iter()
            .filter(|r| r.outcome.is_success())
            .map(|r| r.instance.clone())
            .collect()
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.in_flight = Some(InFlight {
            started: Instant::now(),
            balancers: 0,
        });
    }

    pub(crate) fn drained(&mut self, balancers: usize) {
        if let Some(cycle) = &mut self.in_flight {
            cycle.balancers = balancers;
        }
    }

    /// Record the outcome of the cycle in flight.
    pub(crate) fn finish_cycle(
        &mut self,
        instance: &InstanceId,
        outcome: MaintenanceOutcome,
    ) -> &CycleRecord {
        let (elapsed, balancers) = match self.in_flight.take() {
            Some(cycle) => (cycle.started.elapsed(), cycle.balancers),
            None => (Duration::ZERO, 0),
        };
        self.records.push(CycleRecord {
            instance: instance.clone(),
            outcome,
            balancers,
            elapsed,
        });
        &self.records[self.records.len() - 1]
    }

    /// Close a cycle that was cut off before it could record itself.
    /// Does nothing outside an instance cycle.
    pub(crate) fn abandon(&mut self, reason: &str) {
        if self.in_flight.is_none() {
            return;
        }
        let Stage::Cycling { instance, .. } = &self.stage else {
            return;
        };
        let instance = instance.clone();
        self.finish_cycle(
            &instance,
            MaintenanceOutcome::Failed {
                reason: reason.to_string(),
            },
        );
    }
}

/// A run where every instance completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub records: Vec<CycleRecord>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn instances(&self) -> Vec<InstanceId> {
        self.records.iter().map(|r| r.instance.clone()).collect()
    }
}

/// A run that stopped early.
#[derive(Debug, Error)]
#[error("run stopped during {}: {source}", .progress.stage)]
pub struct RunFailure {
    pub progress: Progress,
    #[source]
    pub source: CycleError,
}

impl RunFailure {
    pub fn new(progress: Progress, source: CycleError) -> Self {
        Self { progress, source }
    }

    pub fn stage(&self) -> &Stage {
        &self.progress.stage
    }

    /// Instances that completed before the failure.
    pub fn completed(&self) -> Vec<InstanceId> {
        self.progress.completed()
    }
}
