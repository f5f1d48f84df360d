//! Shared types used across fleetcycle crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider-assigned instance identifier (e.g. `i-0abc...`).
///
/// Opaque to the orchestrator; only equality and ordering matter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The two load-balancer models that coexist in a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BalancerKind {
    /// Legacy balancer addressed by name; members are `InService`/`OutOfService`.
    Classic,
    /// Target group resolved from a balancer name; members are `healthy`/`unhealthy`.
    TargetGroup,
}

impl BalancerKind {
    /// The only member state that counts as serving traffic.
    pub fn healthy_state(&self) -> &'static str {
        match self {
            BalancerKind::Classic => "InService",
            BalancerKind::TargetGroup => "healthy",
        }
    }

    /// Health predicate for a member state reported by this kind of balancer.
    pub fn is_healthy(&self, state: &str) -> bool {
        state == self.healthy_state()
    }

    pub fn label(&self) -> &'static str {
        match self {
            BalancerKind::Classic => "classic",
            BalancerKind::TargetGroup => "target-group",
        }
    }
}

impl fmt::Display for BalancerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One registered member of a balancer and the state it reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberHealth {
    pub instance_id: InstanceId,
    pub state: String,
}

impl MemberHealth {
    pub fn new(instance_id: impl Into<InstanceId>, state: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            state: state.into(),
        }
    }
}

/// Remote-command agent registration record for an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub ping_status: String,
}

impl AgentInfo {
    pub fn is_online(&self) -> bool {
        self.ping_status == "Online"
    }
}

/// Status of a dispatched remote command on one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    Pending,
    InProgress,
    Success,
    DeliveryTimedOut,
    ExecutionTimedOut,
    Failed,
    Cancelled,
    Undeliverable,
    Terminated,
    /// A status outside the known vocabulary, kept verbatim.
    Unknown(String),
}

/// What the poll loop should do after observing a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    Continue,
    Succeeded,
    Failed,
}

impl CommandStatus {
    /// Parse a provider status string.
    ///
    /// Accepts both the compact (`InProgress`) and the detail
    /// (`In Progress`, `Delivery Timed Out`) spellings.
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "pending" => CommandStatus::Pending,
            "inprogress" => CommandStatus::InProgress,
            "success" => CommandStatus::Success,
            "deliverytimedout" => CommandStatus::DeliveryTimedOut,
            "executiontimedout" | "timedout" => CommandStatus::ExecutionTimedOut,
            "failed" => CommandStatus::Failed,
            "cancelled" | "canceled" => CommandStatus::Cancelled,
            "undeliverable" => CommandStatus::Undeliverable,
            "terminated" => CommandStatus::Terminated,
            _ => CommandStatus::Unknown(raw.to_string()),
        }
    }

    /// Classify a status. Unrecognized statuses fail closed.
    pub fn decision(&self) -> PollDecision {
        match self {
            CommandStatus::Pending | CommandStatus::InProgress => PollDecision::Continue,
            CommandStatus::Success => PollDecision::Succeeded,
            CommandStatus::DeliveryTimedOut
            | CommandStatus::ExecutionTimedOut
            | CommandStatus::Failed
            | CommandStatus::Cancelled
            | CommandStatus::Undeliverable
            | CommandStatus::Terminated
            | CommandStatus::Unknown(_) => PollDecision::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.decision() != PollDecision::Continue
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Pending => f.write_str("Pending"),
            CommandStatus::InProgress => f.write_str("InProgress"),
            CommandStatus::Success => f.write_str("Success"),
            CommandStatus::DeliveryTimedOut => f.write_str("DeliveryTimedOut"),
            CommandStatus::ExecutionTimedOut => f.write_str("ExecutionTimedOut"),
            CommandStatus::Failed => f.write_str("Failed"),
            CommandStatus::Cancelled => f.write_str("Cancelled"),
            CommandStatus::Undeliverable => f.write_str("Undeliverable"),
            CommandStatus::Terminated => f.write_str("Terminated"),
            CommandStatus::Unknown(raw) => write!(f, "Unknown({raw})"),
        }
    }
}

/// A dispatched remote command, tracked until it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExecution {
    pub command_id: String,
    pub instance_id: InstanceId,
    pub status: CommandStatus,
}

/// Where an instance is in its maintenance cycle.
///
/// `Discovered → Draining → Acting → Restoring → Stabilizing → Done`,
/// or `Failed` from any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CyclePhase {
    Discovered,
    Draining,
    Acting,
    Restoring,
    Stabilizing,
    Done,
    Failed,
}

impl CyclePhase {
    /// The phase that follows a successful step, or `None` once terminal.
    pub fn next(&self) -> Option<CyclePhase> {
        match self {
            CyclePhase::Discovered => Some(CyclePhase::Draining),
            CyclePhase::Draining => Some(CyclePhase::Acting),
            CyclePhase::Acting => Some(CyclePhase::Restoring),
            CyclePhase::Restoring => Some(CyclePhase::Stabilizing),
            CyclePhase::Stabilizing => Some(CyclePhase::Done),
            CyclePhase::Done | CyclePhase::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CyclePhase::Done | CyclePhase::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CyclePhase::Discovered => "discovered",
            CyclePhase::Draining => "draining",
            CyclePhase::Acting => "acting",
            CyclePhase::Restoring => "restoring",
            CyclePhase::Stabilizing => "stabilizing",
            CyclePhase::Done => "done",
            CyclePhase::Failed => "failed",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-instance result of a maintenance cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum MaintenanceOutcome {
    Succeeded,
    Failed { reason: String },
}

impl MaintenanceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MaintenanceOutcome::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_predicate_differs_by_kind() {
        assert!(BalancerKind::Classic.is_healthy("InService"));
        assert!(!BalancerKind::Classic.is_healthy("OutOfService"));
        assert!(!BalancerKind::Classic.is_healthy("healthy"));

        assert!(BalancerKind::TargetGroup.is_healthy("healthy"));
        assert!(!BalancerKind::TargetGroup.is_healthy("unhealthy"));
        assert!(!BalancerKind::TargetGroup.is_healthy("draining"));
        assert!(!BalancerKind::TargetGroup.is_healthy("InService"));
    }

    #[test]
    fn command_status_accepts_detail_spellings() {
        assert_eq!(CommandStatus::parse("In Progress"), CommandStatus::InProgress);
        assert_eq!(CommandStatus::parse("InProgress"), CommandStatus::InProgress);
        assert_eq!(
            CommandStatus::parse("Delivery Timed Out"),
            CommandStatus::DeliveryTimedOut
        );
        assert_eq!(
            CommandStatus::parse("Execution Timed Out"),
            CommandStatus::ExecutionTimedOut
        );
        assert_eq!(CommandStatus::parse("Canceled"), CommandStatus::Cancelled);
        assert_eq!(CommandStatus::parse("Cancelled"), CommandStatus::Cancelled);
    }

    #[test]
    fn command_status_decisions() {
        assert_eq!(CommandStatus::Pending.decision(), PollDecision::Continue);
        assert_eq!(CommandStatus::InProgress.decision(), PollDecision::Continue);
        assert_eq!(CommandStatus::Success.decision(), PollDecision::Succeeded);
        for failed in [
            "DeliveryTimedOut",
            "ExecutionTimedOut",
            "Failed",
            "Cancelled",
            "Undeliverable",
            "Terminated",
        ] {
            assert_eq!(CommandStatus::parse(failed).decision(), PollDecision::Failed);
        }
    }

    #[test]
    fn unknown_status_fails_closed() {
        let status = CommandStatus::parse("Delayed-ish");
        assert_eq!(status, CommandStatus::Unknown("Delayed-ish".to_string()));
        assert_eq!(status.decision(), PollDecision::Failed);
        assert!(status.is_terminal());
    }

    #[test]
    fn cycle_phase_walks_to_done() {
        let mut phase = CyclePhase::Discovered;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            phase = next;
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                CyclePhase::Discovered,
                CyclePhase::Draining,
                CyclePhase::Acting,
                CyclePhase::Restoring,
                CyclePhase::Stabilizing,
                CyclePhase::Done,
            ]
        );
        assert!(CyclePhase::Failed.next().is_none());
    }

    #[test]
    fn agent_online_is_exact() {
        assert!(AgentInfo { ping_status: "Online".into() }.is_online());
        assert!(!AgentInfo { ping_status: "ConnectionLost".into() }.is_online());
    }
}
