//! The balancer capability interface and its two variants.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use fleetcycle_core::call::{bounded, unbounded};
use fleetcycle_core::{
    BalancerKind, ClassicBalancerApi, CycleResult, InstanceId, MemberHealth, TargetGroupApi,
};

/// Boxed future alias for balancer group operations.
pub type GroupFuture<'a, T> = Pin<Box<dyn Future<Output = CycleResult<T>> + Send + 'a>>;

/// One kind of load balancer, seen through the operations the orchestrator needs.
pub trait BalancerGroup: Send + Sync {
    fn kind(&self) -> BalancerKind;

    /// Resolve a configured name to the id that later calls address.
    /// `None` when no such balancer exists.
    fn resolve<'a>(&'a self, name: &'a str) -> GroupFuture<'a, Option<String>>;

    /// Instances currently reporting this kind's healthy state.
    fn healthy_members<'a>(&'a self, balancer: &'a str) -> GroupFuture<'a, Vec<InstanceId>>;

    /// Deregister and wait until the balancer confirms the instance is out.
    fn drain<'a>(&'a self, balancer: &'a str, instance: &'a InstanceId) -> GroupFuture<'a, ()>;

    /// Register and wait until the balancer confirms the instance is serving.
    fn restore<'a>(&'a self, balancer: &'a str, instance: &'a InstanceId) -> GroupFuture<'a, ()>;
}

fn healthy(kind: BalancerKind, members: Vec<MemberHealth>) -> Vec<InstanceId> {
    members
        .into_iter()
        .filter(|m| kind.is_healthy(&m.state))
        .map(|m| m.instance_id)
        .collect()
}

fn unit_target(balancer: &str, instance: &InstanceId) -> String {
    format!("{balancer}/{instance}")
}

/// Classic balancers, addressed by name.
pub struct ClassicGroup {
    api: Arc<dyn ClassicBalancerApi>,
    api_timeout: Duration,
}

impl ClassicGroup {
    pub fn new(api: Arc<dyn ClassicBalancerApi>, api_timeout: Duration) -> Self {
        Self { api, api_timeout }
    }
}

impl BalancerGroup for ClassicGroup {
    fn kind(&self) -> BalancerKind {
        BalancerKind::Classic
    }

    fn resolve<'a>(&'a self, name: &'a str) -> GroupFuture<'a, Option<String>> {
        Box::pin(async move {
            let described = bounded(
                "describe balancer",
                name,
                self.api_timeout,
                self.api.describe_balancer(name),
            )
            .await;
            match described {
                Ok(()) => Ok(Some(name.to_string())),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    fn healthy_members<'a>(&'a self, balancer: &'a str) -> GroupFuture<'a, Vec<InstanceId>> {
        Box::pin(async move {
            let members = bounded(
                "describe instance health",
                balancer,
                self.api_timeout,
                self.api.instance_health(balancer),
            )
            .await?;
            Ok(healthy(BalancerKind::Classic, members))
        })
    }

    fn drain<'a>(&'a self, balancer: &'a str, instance: &'a InstanceId) -> GroupFuture<'a, ()> {
        Box::pin(async move {
            let target = unit_target(balancer, instance);
            bounded(
                "deregister instance",
                &target,
                self.api_timeout,
                self.api.deregister(balancer, instance),
            )
            .await?;
            debug!(%balancer, %instance, "waiting for classic deregistration");
            unbounded(
                "wait instance deregistered",
                &target,
                self.api.wait_deregistered(balancer, instance),
            )
            .await
        })
    }

    fn restore<'a>(&'a self, balancer: &'a str, instance: &'a InstanceId) -> GroupFuture<'a, ()> {
        Box::pin(async move {
            let target = unit_target(balancer, instance);
            bounded(
                "register instance",
                &target,
                self.api_timeout,
                self.api.register(balancer, instance),
            )
            .await?;
            debug!(%balancer, %instance, "waiting for classic in-service");
            unbounded(
                "wait instance in service",
                &target,
                self.api.wait_in_service(balancer, instance),
            )
            .await
        })
    }
}

/// Target groups, resolved from the owning balancer's name.
pub struct TargetGroups {
    api: Arc<dyn TargetGroupApi>,
    api_timeout: Duration,
}

impl TargetGroups {
    pub fn new(api: Arc<dyn TargetGroupApi>, api_timeout: Duration) -> Self {
        Self { api, api_timeout }
    }
}

impl BalancerGroup for TargetGroups {
    fn kind(&self) -> BalancerKind {
        BalancerKind::TargetGroup
    }

    fn resolve<'a>(&'a self, name: &'a str) -> GroupFuture<'a, Option<String>> {
        Box::pin(async move {
            let resolved = bounded(
                "resolve target group",
                name,
                self.api_timeout,
                self.api.resolve_target_group(name),
            )
            .await;
            match resolved {
                Ok(target_group) => Ok(Some(target_group)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    fn healthy_members<'a>(&'a self, balancer: &'a str) -> GroupFuture<'a, Vec<InstanceId>> {
        Box::pin(async move {
            let members = bounded(
                "describe target health",
                balancer,
                self.api_timeout,
                self.api.target_health(balancer),
            )
            .await?;
            Ok(healthy(BalancerKind::TargetGroup, members))
        })
    }

    fn drain<'a>(&'a self, balancer: &'a str, instance: &'a InstanceId) -> GroupFuture<'a, ()> {
        Box::pin(async move {
            let target = unit_target(balancer, instance);
            bounded(
                "deregister target",
                &target,
                self.api_timeout,
                self.api.deregister_target(balancer, instance),
            )
            .await?;
            debug!(target_group = %balancer, %instance, "waiting for target deregistration");
            unbounded(
                "wait target deregistered",
                &target,
                self.api.wait_target_deregistered(balancer, instance),
            )
            .await
        })
    }

    fn restore<'a>(&'a self, balancer: &'a str, instance: &'a InstanceId) -> GroupFuture<'a, ()> {
        Box::pin(async move {
            let target = unit_target(balancer, instance);
            bounded(
                "register target",
                &target,
                self.api_timeout,
                self.api.register_target(balancer, instance),
            )
            .await?;
            debug!(target_group = %balancer, %instance, "waiting for target in-service");
            unbounded(
                "wait target in service",
                &target,
                self.api.wait_target_in_service(balancer, instance),
            )
            .await
        })
    }
}
