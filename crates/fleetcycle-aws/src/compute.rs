//! EC2 instance power control.

use aws_sdk_ec2::Client;
use aws_sdk_ec2::client::Waiters;
use tracing::debug;

use fleetcycle_core::{ComputeApi, InstanceId, ProviderFuture};

use crate::api_error;
use crate::wait::WaitPolicy;

#[derive(Debug, Clone)]
pub struct Ec2Compute {
    client: Client,
    wait: WaitPolicy,
}

impl Ec2Compute {
    pub fn new(client: Client, wait: WaitPolicy) -> Self {
        Self { client, wait }
    }
}

impl ComputeApi for Ec2Compute {
    fn stop<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .stop_instances()
                .instance_ids(instance.as_str())
                .force(true)
                .send()
                .await
                .map_err(api_error)?;
            Ok(())
        })
    }

    fn wait_stopped<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .wait_until_instance_stopped()
                .instance_ids(instance.as_str())
                .wait(self.wait.max_wait)
                .await
                .map_err(api_error)?;
            debug!(%instance, "instance stopped");
            Ok(())
        })
    }

    fn start<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .start_instances()
                .instance_ids(instance.as_str())
                .send()
                .await
                .map_err(api_error)?;
            Ok(())
        })
    }

    fn wait_status_ok<'a>(&'a self, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            // Passes once both the instance and the system checks report ok.
            self.client
                .wait_until_instance_status_ok()
                .instance_ids(instance.as_str())
                .wait(self.wait.max_wait)
                .await
                .map_err(api_error)?;
            debug!(%instance, "instance status ok");
            Ok(())
        })
    }
}
