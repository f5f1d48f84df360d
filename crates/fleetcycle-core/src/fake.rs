//! Scripted in-memory cloud for tests.
//!
//! `FakeCloud` implements every provider trait against shared in-memory
//! state and records each call as a line in an ordered log
//! (`"clb.deregister web-clb i-1"`, `"ec2.stop i-1"`, ...), so tests can
//! assert both the calls made and their order. Individual calls can be made
//! to fail or to hang forever.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    ClassicBalancerApi, CommandRequest, ComputeApi, ProviderFuture, RemoteCommandApi,
    TargetGroupApi,
};
use crate::types::{AgentInfo, InstanceId, MemberHealth};

#[derive(Debug, Default)]
struct FakeState {
    classic: BTreeMap<String, Vec<MemberHealth>>,
    /// balancer name → target group id
    load_balancers: BTreeMap<String, String>,
    target_groups: BTreeMap<String, Vec<MemberHealth>>,
    agents: HashMap<InstanceId, AgentInfo>,
    command_scripts: HashMap<InstanceId, VecDeque<String>>,
    failures: HashMap<String, ProviderError>,
    hangs: HashSet<String>,
    calls: Vec<String>,
    next_command: u32,
}

/// Shared, cloneable handle to the in-memory cloud.
#[derive(Debug, Clone, Default)]
pub struct FakeCloud {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a classic balancer with `(instance, state)` members.
    pub fn with_classic(self, name: &str, members: &[(&str, &str)]) -> Self {
        self.state()
            .classic
            .insert(name.to_string(), to_members(members));
        self
    }

    /// Add a newer-style balancer owning one target group.
    pub fn with_target_group(
        self,
        balancer: &str,
        target_group: &str,
        members: &[(&str, &str)],
    ) -> Self {
        {
            let mut state = self.state();
            state
                .load_balancers
                .insert(balancer.to_string(), target_group.to_string());
            state
                .target_groups
                .insert(target_group.to_string(), to_members(members));
        }
        self
    }

    /// Register a remote-command agent for an instance.
    pub fn with_agent(self, instance: &str, ping_status: &str) -> Self {
        self.state().agents.insert(
            InstanceId::from(instance),
            AgentInfo {
                ping_status: ping_status.to_string(),
            },
        );
        self
    }

    /// Statuses returned, in order, by successive status polls for an
    /// instance. The last one repeats once the script runs out.
    pub fn with_command_script(self, instance: &str, statuses: &[&str]) -> Self {
        self.state().command_scripts.insert(
            InstanceId::from(instance),
            statuses.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Make the call with this exact log line fail.
    pub fn fail_on(self, call: &str, error: ProviderError) -> Self {
        self.state().failures.insert(call.to_string(), error);
        self
    }

    /// Make the call with this exact log line never complete.
    pub fn hang_on(self, call: &str) -> Self {
        self.state().hangs.insert(call.to_string());
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Calls whose log line starts with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Current member state on a classic balancer.
    pub fn classic_state(&self, name: &str, instance: &str) -> Option<String> {
        member_state(self.state().classic.get(name)?, instance)
    }

    /// Current member state in a target group.
    pub fn target_state(&self, target_group: &str, instance: &str) -> Option<String> {
        member_state(self.state().target_groups.get(target_group)?, instance)
    }

    /// Log the call, then apply any scripted hang or failure.
    async fn step(&self, call: String) -> ProviderResult<()> {
        let (hang, failure) = {
            let mut state = self.state();
            state.calls.push(call.clone());
            (state.hangs.contains(&call), state.failures.get(&call).cloned())
        };
        if hang {
            std::future::pending::<()>().await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn set_classic_state(&self, name: &str, instance: &InstanceId, to: &str) {
        if let Some(members) = self.state().classic.get_mut(name) {
            set_member_state(members, instance, to);
        }
    }

    fn set_target_state(&self, target_group: &str, instance: &InstanceId, to: &str) {
        if let Some(members) = self.state().target_groups.get_mut(target_group) {
            set_member_state(members, instance, to);
        }
    }
}

fn to_members(members: &[(&str, &str)]) -> Vec<MemberHealth> {
    members
        .iter()
        .map(|(id, state)| MemberHealth::new(*id, *state))
        .collect()
}

fn member_state(members: &[MemberHealth], instance: &str) -> Option<String> {
    members
        .iter()
        .find(|m| m.instance_id.as_str() == instance)
        .map(|m| m.state.clone())
}

fn set_member_state(members: &mut Vec<MemberHealth>, instance: &InstanceId, to: &str) {
    match members.iter_mut().find(|m| &m.instance_id == instance) {
        Some(member) => member.state = to.to_string(),
        None => members.push(MemberHealth::new(instance.clone(), to)),
    }
}

impl ClassicBalancerApi for FakeCloud {
    fn describe_balancer<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.step(format!("clb.describe {name}")).await?;
            if self.state().classic.contains_key(name) {
                Ok(())
            } else {
                Err(ProviderError::NotFound(format!("load balancer {name}")))
            }
        })
    }

    fn instance_health<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, Vec<MemberHealth>> {
        Box::pin(async move {
            self.step(format!("clb.health {name}")).await?;
            self.state()
                .classic
                .get(name)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(format!("load balancer {name}")))
        })
    }

    fn deregister<'a>(&'a self, name: &'a str, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.step(format!("clb.deregister {name} {instance}")).await?;
            self.set_classic_state(name, instance, "OutOfService");
            Ok(())
        })
    }

    fn wait_deregistered<'a>(
        &'a self,
        name: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(self.step(format!("clb.wait_deregistered {name} {instance}")))
    }

    fn register<'a>(&'a self, name: &'a str, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.step(format!("clb.register {name} {instance}")).await?;
            self.set_classic_state(name, instance, "InService");
            Ok(())
        })
    }

    fn wait_in_service<'a>(
        &'a self,
        name: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(self.step(format!("clb.wait_in_service {name} {instance}")))
    }
}

impl TargetGroupApi for FakeCloud {
    fn resolve_target_group<'a>(&'a self, balancer_name: &'a str) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            self.step(format!("tg.resolve {balancer_name}")).await?;
            self.state()
                .load_balancers
                .get(balancer_name)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(format!("load balancer {balancer_name}")))
        })
    }

    fn target_health<'a>(
        &'a self,
        target_group: &'a str,
    ) -> ProviderFuture<'a, Vec<MemberHealth>> {
        Box::pin(async move {
            self.step(format!("tg.health {target_group}")).await?;
            self.state()
                .target_groups
                .get(target_group)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(format!("target group {target_group}")))
        })
    }

    fn deregister_target<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.step(format!("tg.deregister {target_group} {instance}"))
                .await?;
            self.set_target_state(target_group, instance, "unused");
            Ok(())
        })
    }

    fn wait_target_deregistered<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(self.step(format!("tg.wait_deregistered {target_group} {instance}")))
    }

    fn register_target<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.step(format!("tg.register {target_group} {instance}"))
                .await?;
            self.set_target_state(target_group, instance, "healthy");
            Ok(())
        })
    }

    fn wait_target_in_service<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(self.step(format!("tg.wait_in_service {target_group} {instance}")))
    }
}

impl ComputeApi for FakeCloud {
    fn stop<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(self.step(format!("ec2.stop {instance}")))
    }

    fn wait_stopped<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(self.step(format!("ec2.wait_stopped {instance}")))
    }

    fn start<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(self.step(format!("ec2.start {instance}")))
    }

    fn wait_status_ok<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(self.step(format!("ec2.wait_status_ok {instance}")))
    }
}

impl RemoteCommandApi for FakeCloud {
    fn describe_agent<'a>(
        &'a self,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, Option<AgentInfo>> {
        Box::pin(async move {
            self.step(format!("ssm.describe {instance}")).await?;
            Ok(self.state().agents.get(instance).cloned())
        })
    }

    fn send_command<'a>(&'a self, request: &'a CommandRequest) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            self.step(format!(
                "ssm.send {} {} {}",
                request.document, request.instance, request.execution_timeout
            ))
            .await?;
            let mut state = self.state();
            state.next_command += 1;
            Ok(format!("cmd-{}", state.next_command))
        })
    }

    fn command_status<'a>(
        &'a self,
        command_id: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            self.step(format!("ssm.status {command_id} {instance}"))
                .await?;
            let mut state = self.state();
            let status = match state.command_scripts.get_mut(instance) {
                Some(script) if script.len() > 1 => script.pop_front(),
                Some(script) => script.front().cloned(),
                None => None,
            };
            Ok(status.unwrap_or_else(|| "Success".to_string()))
        })
    }
}
