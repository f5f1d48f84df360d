//! fleetcycle-rollout: the maintenance run.
//!
//! Instances are cycled strictly one at a time. Each goes through
//! `Discovered → Draining → Acting → Restoring → Stabilizing → Done`;
//! the first failure stops the whole run. Membership resolution and every
//! cycle share a single deadline.
//!
//! # Components
//!
//! - **`controller`**: `Orchestrator`, the per-instance state machine
//! - **`report`**: run progress, report, and failure types
//! - **`run`**: wiring from `RunConfig` + providers to a finished run

pub mod controller;
pub mod report;
pub mod run;

pub use controller::Orchestrator;
pub use report::{CycleRecord, Progress, RunFailure, RunReport, Stage};
pub use run::{Providers, plan, run_maintenance};
