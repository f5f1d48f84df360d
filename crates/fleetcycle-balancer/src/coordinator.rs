//! Drain/restore coordinator: concurrent fan-out across an instance's balancers.

use futures_util::future::try_join_all;
use tracing::info;

use fleetcycle_core::{CycleResult, InstanceId};

use crate::resolver::FleetMembership;

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Deregister and wait until out of rotation.
    Drain,
    /// Register and wait until serving again.
    Restore,
}

/// Drains and restores single instances against a resolved fleet.
#[derive(Debug, Clone, Copy)]
pub struct Coordinator<'f> {
    fleet: &'f FleetMembership,
}

impl<'f> Coordinator<'f> {
    pub fn new(fleet: &'f FleetMembership) -> Self {
        Self { fleet }
    }

    /// Take `instance` out of every balancer it belongs to.
    /// Returns the number of balancers acted on.
    pub async fn drain(&self, instance: &InstanceId) -> CycleResult<usize> {
        self.apply(Transition::Drain, instance).await
    }

    /// Put `instance` back into every balancer it was drained from.
    pub async fn restore(&self, instance: &InstanceId) -> CycleResult<usize> {
        self.apply(Transition::Restore, instance).await
    }

    /// One concurrent unit per (balancer, instance) pair, both kinds in the
    /// same wave. The first failing unit fails the call; units already done
    /// are not rolled back.
    pub async fn apply(&self, transition: Transition, instance: &InstanceId) -> CycleResult<usize> {
        let memberships = self.fleet.memberships_of(instance);
        info!(
            %instance,
            ?transition,
            balancers = memberships.len(),
            "changing balancer membership"
        );

        let units = memberships.iter().map(|m| {
            let balancer = m.balancer.balancer_id.as_str();
            match transition {
                Transition::Drain => m.group.drain(balancer, instance),
                Transition::Restore => m.group.restore(balancer, instance),
            }
        });
        try_join_all(units).await?;

        info!(%instance, ?transition, "balancer membership confirmed");
        Ok(memberships.len())
    }
}
