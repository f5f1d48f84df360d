//! Remote command through the SSM agent.

use aws_sdk_ssm::Client;
use aws_sdk_ssm::operation::get_command_invocation::GetCommandInvocationOutput;
use aws_sdk_ssm::types::{InstanceInformationFilter, InstanceInformationFilterKey};
use tracing::debug;

use fleetcycle_core::{
    AgentInfo, CommandRequest, InstanceId, ProviderError, ProviderFuture, RemoteCommandApi,
};

use crate::api_error;

/// How long SSM may take to deliver a command before giving up on it.
const DELIVERY_TIMEOUT_SECS: i32 = 600;

#[derive(Debug, Clone)]
pub struct SsmCommands {
    client: Client,
}

impl SsmCommands {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// The detailed status when present (`Delivery Timed Out`), the compact
/// one otherwise.
fn invocation_status(out: &GetCommandInvocationOutput) -> Option<String> {
    out.status_details()
        .filter(|d| !d.trim().is_empty())
        .map(str::to_string)
        .or_else(|| out.status().map(|s| s.as_str().to_string()))
}

impl RemoteCommandApi for SsmCommands {
    fn describe_agent<'a>(
        &'a self,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, Option<AgentInfo>> {
        Box::pin(async move {
            let filter = InstanceInformationFilter::builder()
                .key(InstanceInformationFilterKey::InstanceIds)
                .value_set(instance.as_str())
                .build()
                .map_err(api_error)?;
            let out = self
                .client
                .describe_instance_information()
                .instance_information_filter_list(filter)
                .send()
                .await
                .map_err(api_error)?;
            Ok(out.instance_information_list().first().map(|info| AgentInfo {
                ping_status: info
                    .ping_status()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default(),
            }))
        })
    }

    fn send_command<'a>(&'a self, request: &'a CommandRequest) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            let out = self
                .client
                .send_command()
                .document_name(&request.document)
                .instance_ids(request.instance.as_str())
                .parameters("commands", vec![request.body.clone()])
                .parameters("executionTimeout", vec![request.execution_timeout.clone()])
                .timeout_seconds(DELIVERY_TIMEOUT_SECS)
                .send()
                .await
                .map_err(api_error)?;
            out.command()
                .and_then(|c| c.command_id())
                .map(str::to_string)
                .ok_or_else(|| ProviderError::Api("send command returned no command id".into()))
        })
    }

    fn command_status<'a>(
        &'a self,
        command_id: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            let resp = self
                .client
                .get_command_invocation()
                .command_id(command_id)
                .instance_id(instance.as_str())
                .send()
                .await;
            match resp {
                Ok(out) => invocation_status(&out).ok_or_else(|| {
                    ProviderError::Api(format!("invocation {command_id} on {instance} has no status"))
                }),
                // The invocation record can lag behind the dispatch.
                Err(err)
                    if err
                        .as_service_error()
                        .is_some_and(|e| e.is_invocation_does_not_exist()) =>
                {
                    debug!(%command_id, %instance, "invocation not visible yet");
                    Ok("Pending".to_string())
                }
                Err(err) => Err(api_error(err)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ssm::types::CommandInvocationStatus;

    #[test]
    fn detail_wins_over_compact_status() {
        let out = GetCommandInvocationOutput::builder()
            .status(CommandInvocationStatus::TimedOut)
            .status_details("Delivery Timed Out")
            .build();
        assert_eq!(invocation_status(&out).as_deref(), Some("Delivery Timed Out"));
    }

    #[test]
    fn compact_status_when_detail_missing() {
        let out = GetCommandInvocationOutput::builder()
            .status(CommandInvocationStatus::InProgress)
            .build();
        assert_eq!(invocation_status(&out).as_deref(), Some("InProgress"));

        let empty = GetCommandInvocationOutput::builder().build();
        assert_eq!(invocation_status(&empty), None);
    }
}
