//! Entry points: configuration and providers in, finished run out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use fleetcycle_balancer::{BalancerGroup, ClassicGroup, FleetMembership, FleetPlan, TargetGroups};
use fleetcycle_core::{
    ClassicBalancerApi, ComputeApi, CycleError, CycleResult, RemoteCommandApi, RunConfig,
    TargetGroupApi, Timings,
};
use fleetcycle_maintain::MaintenanceAction;

use crate::controller::Orchestrator;
use crate::report::{Progress, RunFailure, RunReport, Stage};

/// The cloud collaborators a run talks to.
#[derive(Clone)]
pub struct Providers {
    pub classic: Arc<dyn ClassicBalancerApi>,
    pub target_groups: Arc<dyn TargetGroupApi>,
    pub compute: Arc<dyn ComputeApi>,
    pub remote: Arc<dyn RemoteCommandApi>,
}

impl Providers {
    /// One value implementing every provider trait, shared four ways.
    pub fn uniform<P>(provider: P) -> Self
    where
        P: ClassicBalancerApi + TargetGroupApi + ComputeApi + RemoteCommandApi + 'static,
    {
        let provider = Arc::new(provider);
        Self {
            classic: provider.clone(),
            target_groups: provider.clone(),
            compute: provider.clone(),
            remote: provider,
        }
    }

    fn groups(&self, api_timeout: Duration) -> Vec<Arc<dyn BalancerGroup>> {
        let classic: Arc<dyn BalancerGroup> =
            Arc::new(ClassicGroup::new(self.classic.clone(), api_timeout));
        let target_groups: Arc<dyn BalancerGroup> =
            Arc::new(TargetGroups::new(self.target_groups.clone(), api_timeout));
        vec![classic, target_groups]
    }
}

/// Run maintenance across every healthy instance behind the configured
/// balancers.
///
/// Resolution and all instance cycles share `run_timeout`. On expiry the
/// in-flight step is abandoned, the instance it belonged to is recorded as
/// failed, and the failure carries the progress made so far.
pub async fn run_maintenance(
    config: &RunConfig,
    providers: &Providers,
) -> Result<RunReport, RunFailure> {
    let started = Instant::now();
    let mut progress = Progress::default();

    let timings = match config.validate() {
        Ok(timings) => timings,
        Err(err) => return Err(RunFailure::new(progress, err)),
    };

    info!(
        region = %config.region,
        balancers = config.balancers.len(),
        budget = ?timings.run_timeout,
        "maintenance run starting"
    );

    let outcome = tokio::time::timeout(
        timings.run_timeout,
        drive(config, &timings, providers, &mut progress),
    )
    .await;

    let result = match outcome {
        Ok(result) => result,
        Err(_elapsed) => {
            let err = CycleError::DeadlineExceeded {
                budget: timings.run_timeout,
            };
            progress.abandon(&err.to_string());
            Err(err)
        }
    };

    match result {
        Ok(()) => {
            let elapsed = started.elapsed();
            info!(instances = progress.records.len(), ?elapsed, "maintenance run succeeded");
            Ok(RunReport {
                records: progress.records,
                elapsed,
            })
        }
        Err(err) => {
            error!(stage = %progress.stage, error = %err, "maintenance run failed");
            Err(RunFailure::new(progress, err))
        }
    }
}

async fn drive(
    config: &RunConfig,
    timings: &Timings,
    providers: &Providers,
    progress: &mut Progress,
) -> CycleResult<()> {
    progress.enter(Stage::Resolving);
    let fleet = FleetMembership::resolve(providers.groups(timings.api_timeout), &config.balancers)
        .await?;

    let action = MaintenanceAction::from_config(
        &config.maintenance,
        timings,
        providers.compute.clone(),
        providers.remote.clone(),
    );
    Orchestrator::new(&fleet, &action, timings.stabilization)
        .run(progress)
        .await
}

/// Resolve membership without changing anything.
pub async fn plan(config: &RunConfig, providers: &Providers) -> CycleResult<FleetPlan> {
    let timings = config.validate()?;
    let resolve = FleetMembership::resolve(providers.groups(timings.api_timeout), &config.balancers);
    match tokio::time::timeout(timings.run_timeout, resolve).await {
        Ok(fleet) => Ok(fleet?.plan()),
        Err(_elapsed) => Err(CycleError::DeadlineExceeded {
            budget: timings.run_timeout,
        }),
    }
}
