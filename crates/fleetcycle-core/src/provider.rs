//! Capability traits for the cloud collaborators.
//!
//! The orchestrator never talks to a cloud SDK directly. Each collaborator
//! is an object-safe trait returning boxed futures so implementations can be
//! swapped (AWS adapters in production, `FakeCloud` in tests) behind an
//! `Arc<dyn ...>`.
//!
//! `wait_*` methods block until the provider's own wait policy confirms the
//! transition or gives up. Callers impose no extra per-wait timeout; the
//! overall run deadline cancels them by dropping the future.

use std::future::Future;
use std::pin::Pin;

use crate::error::ProviderResult;
use crate::types::{AgentInfo, InstanceId, MemberHealth};

/// Boxed future alias for provider calls.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = ProviderResult<T>> + Send + 'a>>;

/// Legacy load balancers addressed by name.
pub trait ClassicBalancerApi: Send + Sync {
    /// Succeeds if the balancer exists, `ProviderError::NotFound` otherwise.
    fn describe_balancer<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, ()>;

    /// Every registered instance and its reported state.
    fn instance_health<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, Vec<MemberHealth>>;

    fn deregister<'a>(&'a self, name: &'a str, instance: &'a InstanceId) -> ProviderFuture<'a, ()>;

    fn wait_deregistered<'a>(
        &'a self,
        name: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()>;

    fn register<'a>(&'a self, name: &'a str, instance: &'a InstanceId) -> ProviderFuture<'a, ()>;

    fn wait_in_service<'a>(
        &'a self,
        name: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()>;
}

/// Target groups behind newer-style balancers.
pub trait TargetGroupApi: Send + Sync {
    /// Resolve the target group owned by a balancer name.
    /// `ProviderError::NotFound` when no such balancer exists.
    fn resolve_target_group<'a>(&'a self, balancer_name: &'a str) -> ProviderFuture<'a, String>;

    fn target_health<'a>(&'a self, target_group: &'a str)
    -> ProviderFuture<'a, Vec<MemberHealth>>;

    fn deregister_target<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()>;

    fn wait_target_deregistered<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()>;

    fn register_target<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()>;

    fn wait_target_in_service<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()>;
}

/// Instance power control.
pub trait ComputeApi: Send + Sync {
    fn stop<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()>;
    fn wait_stopped<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()>;
    fn start<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()>;
    fn wait_status_ok<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()>;
}

/// A command to dispatch on one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub document: String,
    pub instance: InstanceId,
    pub body: String,
    pub execution_timeout: String,
}

/// Remote command execution through an on-instance agent.
pub trait RemoteCommandApi: Send + Sync {
    /// Agent registration for an instance, `None` if it never registered.
    fn describe_agent<'a>(&'a self, instance: &'a InstanceId)
    -> ProviderFuture<'a, Option<AgentInfo>>;

    /// Dispatch a command and return its execution id.
    fn send_command<'a>(&'a self, request: &'a CommandRequest) -> ProviderFuture<'a, String>;

    /// Raw status string of a dispatched command on one instance.
    fn command_status<'a>(
        &'a self,
        command_id: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, String>;
}
