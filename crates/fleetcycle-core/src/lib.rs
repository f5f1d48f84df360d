//! fleetcycle-core: shared vocabulary for zero-downtime fleet maintenance.
//!
//! Everything the orchestration crates agree on lives here:
//!
//! - **`types`**: instance identifiers, balancer kinds, command statuses,
//!   per-instance cycle phases
//! - **`config`**: the `cycle.toml` run configuration
//! - **`error`**: the error taxonomy shared by every phase of a run
//! - **`call`**: bounded and unbounded provider call wrappers
//! - **`provider`**: capability traits for the cloud collaborators
//!   (classic balancers, target groups, compute, remote command)
//!
//! With the `testing` feature, **`fake`** provides `FakeCloud`, a scripted
//! in-memory implementation of every provider trait.

pub mod call;
pub mod config;
pub mod error;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use config::{MaintenanceConfig, RunConfig, TimingConfig, Timings, parse_duration};
pub use error::{CycleError, CycleResult, ProviderError, ProviderResult};
pub use provider::{
    ClassicBalancerApi, CommandRequest, ComputeApi, ProviderFuture, RemoteCommandApi,
    TargetGroupApi,
};
pub use types::*;
