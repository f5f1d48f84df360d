//! The maintenance action chosen for a run.

use std::sync::Arc;

use fleetcycle_core::{
    ComputeApi, CycleResult, InstanceId, MaintenanceConfig, RemoteCommandApi, Timings,
};

use crate::command::{CommandAction, CommandSpec};
use crate::reboot::RebootAction;

/// Maintenance performed on each instance while it is out of rotation.
pub enum MaintenanceAction {
    Reboot(RebootAction),
    RemoteCommand(CommandAction),
}

impl MaintenanceAction {
    /// Build the configured variant. Only the collaborator that variant
    /// needs is used.
    pub fn from_config(
        config: &MaintenanceConfig,
        timings: &Timings,
        compute: Arc<dyn ComputeApi>,
        remote: Arc<dyn RemoteCommandApi>,
    ) -> Self {
        match config {
            MaintenanceConfig::Reboot => MaintenanceAction::Reboot(RebootAction::new(
                compute,
                timings.api_timeout,
                timings.cool_down,
            )),
            MaintenanceConfig::RemoteCommand {
                document,
                command,
                execution_timeout,
            } => MaintenanceAction::RemoteCommand(CommandAction::new(
                remote,
                CommandSpec {
                    document: document.clone(),
                    body: command.clone(),
                    execution_timeout: execution_timeout.clone(),
                },
                timings.api_timeout,
                timings.poll_interval,
                timings.cool_down,
            )),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MaintenanceAction::Reboot(_) => "reboot",
            MaintenanceAction::RemoteCommand(_) => "remote-command",
        }
    }

    /// Perform the action, including its cool-down hold.
    pub async fn perform(&self, instance: &InstanceId) -> CycleResult<()> {
        match self {
            MaintenanceAction::Reboot(action) => action.run(instance).await,
            MaintenanceAction::RemoteCommand(action) => action.run(instance).await.map(|_| ()),
        }
    }
}
