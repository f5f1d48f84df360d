//! ELBv2 target groups, resolved from their owning balancer's name.

use aws_sdk_elasticloadbalancingv2::Client;
use aws_sdk_elasticloadbalancingv2::client::Waiters;
use aws_sdk_elasticloadbalancingv2::types::{TargetDescription, TargetHealthDescription};
use tracing::debug;

use fleetcycle_core::{
    InstanceId, MemberHealth, ProviderError, ProviderFuture, ProviderResult, TargetGroupApi,
};

use crate::api_error;
use crate::wait::WaitPolicy;

#[derive(Debug, Clone)]
pub struct TargetGroupElb {
    client: Client,
    wait: WaitPolicy,
}

impl TargetGroupElb {
    pub fn new(client: Client, wait: WaitPolicy) -> Self {
        Self { client, wait }
    }

    async fn load_balancer_arn(&self, name: &str) -> ProviderResult<String> {
        let resp = self.client.describe_load_balancers().names(name).send().await;
        let out = match resp {
            Ok(out) => out,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_load_balancer_not_found_exception()) =>
            {
                return Err(ProviderError::NotFound(format!("load balancer {name}")));
            }
            Err(err) => return Err(api_error(err)),
        };
        out.load_balancers()
            .first()
            .and_then(|lb| lb.load_balancer_arn())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::NotFound(format!("load balancer {name}")))
    }
}

fn target(instance: &InstanceId) -> ProviderResult<TargetDescription> {
    TargetDescription::builder()
        .id(instance.as_str())
        .build()
        .map_err(api_error)
}

fn member(description: &TargetHealthDescription) -> Option<MemberHealth> {
    let id = description.target()?.id();
    let state = description.target_health()?.state()?;
    Some(MemberHealth::new(id, state.as_str()))
}

impl TargetGroupApi for TargetGroupElb {
    fn resolve_target_group<'a>(&'a self, balancer_name: &'a str) -> ProviderFuture<'a, String> {
        Box::pin(async move {
            let arn = self.load_balancer_arn(balancer_name).await?;
            let out = self
                .client
                .describe_target_groups()
                .load_balancer_arn(&arn)
                .send()
                .await
                .map_err(api_error)?;
            let groups = out.target_groups();
            if groups.len() > 1 {
                debug!(
                    balancer = %balancer_name,
                    target_groups = groups.len(),
                    "balancer owns several target groups, using the first"
                );
            }
            groups
                .first()
                .and_then(|tg| tg.target_group_arn())
                .map(str::to_string)
                .ok_or_else(|| {
                    ProviderError::NotFound(format!("target group of load balancer {balancer_name}"))
                })
        })
    }

    fn target_health<'a>(
        &'a self,
        target_group: &'a str,
    ) -> ProviderFuture<'a, Vec<MemberHealth>> {
        Box::pin(async move {
            let out = self
                .client
                .describe_target_health()
                .target_group_arn(target_group)
                .send()
                .await
                .map_err(api_error)?;
            Ok(out
                .target_health_descriptions()
                .iter()
                .filter_map(member)
                .collect())
        })
    }

    fn deregister_target<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .deregister_targets()
                .target_group_arn(target_group)
                .targets(target(instance)?)
                .send()
                .await
                .map_err(api_error)?;
            Ok(())
        })
    }

    fn wait_target_deregistered<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .wait_until_target_deregistered()
                .target_group_arn(target_group)
                .targets(target(instance)?)
                .wait(self.wait.max_wait)
                .await
                .map_err(api_error)?;
            debug!(%target_group, %instance, "target deregistered");
            Ok(())
        })
    }

    fn register_target<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .register_targets()
                .target_group_arn(target_group)
                .targets(target(instance)?)
                .send()
                .await
                .map_err(api_error)?;
            Ok(())
        })
    }

    fn wait_target_in_service<'a>(
        &'a self,
        target_group: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .wait_until_target_in_service()
                .target_group_arn(target_group)
                .targets(target(instance)?)
                .wait(self.wait.max_wait)
                .await
                .map_err(api_error)?;
            debug!(%target_group, %instance, "target in service");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_elasticloadbalancingv2::types::{TargetHealth, TargetHealthStateEnum};

    #[test]
    fn member_reads_target_id_and_state() {
        let description = TargetHealthDescription::builder()
            .target(target(&InstanceId::from("i-1")).unwrap())
            .target_health(
                TargetHealth::builder()
                    .state(TargetHealthStateEnum::Draining)
                    .build(),
            )
            .build();
        assert_eq!(member(&description), Some(MemberHealth::new("i-1", "draining")));
    }

    #[test]
    fn member_without_health_is_skipped() {
        let description = TargetHealthDescription::builder()
            .target(target(&InstanceId::from("i-1")).unwrap())
            .build();
        assert_eq!(member(&description), None);
    }
}
