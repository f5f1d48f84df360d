//! Remote-command maintenance: check the agent, dispatch, poll to a
//! terminal status, then hold for the cool-down.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use fleetcycle_core::call::bounded;
use fleetcycle_core::{
    CommandExecution, CommandRequest, CommandStatus, CycleError, CycleResult, InstanceId,
    RemoteCommandApi,
};

use crate::poll::poll_until_terminal;

/// What to run on each instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub document: String,
    pub body: String,
    pub execution_timeout: String,
}

pub struct CommandAction {
    api: Arc<dyn RemoteCommandApi>,
    spec: CommandSpec,
    api_timeout: Duration,
    poll_interval: Duration,
    cool_down: Duration,
}

impl CommandAction {
    pub fn new(
        api: Arc<dyn RemoteCommandApi>,
        spec: CommandSpec,
        api_timeout: Duration,
        poll_interval: Duration,
        cool_down: Duration,
    ) -> Self {
        Self {
            api,
            spec,
            api_timeout,
            poll_interval,
            cool_down,
        }
    }

    /// Run the command on `instance` and wait for it to finish.
    ///
    /// Fails without dispatching if the agent is absent or not online.
    pub async fn run(&self, instance: &InstanceId) -> CycleResult<CommandExecution> {
        info!(%instance, document = %self.spec.document, "instance will execute remote command");
        self.check_agent(instance).await?;

        let request = CommandRequest {
            document: self.spec.document.clone(),
            instance: instance.clone(),
            body: self.spec.body.clone(),
            execution_timeout: self.spec.execution_timeout.clone(),
        };
        let command_id = bounded(
            "send command",
            instance.as_str(),
            self.api_timeout,
            self.api.send_command(&request),
        )
        .await?;
        info!(%instance, %command_id, "waiting for command execution to complete");

        // A command is never done at dispatch time.
        tokio::time::sleep(self.poll_interval).await;

        let target = format!("{command_id}/{instance}");
        let (target, id) = (target.as_str(), command_id.as_str());
        let report = poll_until_terminal(self.poll_interval, move || {
            async move {
                let raw = bounded(
                    "get command status",
                    target,
                    self.api_timeout,
                    self.api.command_status(id, instance),
                )
                .await?;
                Ok(CommandStatus::parse(&raw))
            }
        })
        .await?;

        if !report.succeeded() {
            warn!(%instance, %command_id, status = %report.status, "command failed");
            return Err(CycleError::CommandFailed {
                instance: instance.clone(),
                command_id,
                status: report.status,
            });
        }

        debug!(%instance, polls = report.polls, cool_down = ?self.cool_down, "cooling down");
        tokio::time::sleep(self.cool_down).await;

        info!(%instance, %command_id, "command executed");
        Ok(CommandExecution {
            command_id,
            instance_id: instance.clone(),
            status: report.status,
        })
    }

    async fn check_agent(&self, instance: &InstanceId) -> CycleResult<()> {
        let agent = bounded(
            "describe agent",
            instance.as_str(),
            self.api_timeout,
            self.api.describe_agent(instance),
        )
        .await?;

        match agent {
            None => Err(CycleError::AgentNotRegistered {
                instance: instance.clone(),
            }),
            Some(info) if !info.is_online() => Err(CycleError::AgentOffline {
                instance: instance.clone(),
                ping_status: info.ping_status,
            }),
            Some(_) => Ok(()),
        }
    }
}
