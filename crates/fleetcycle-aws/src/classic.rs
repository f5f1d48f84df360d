//! Classic load balancers.

use aws_sdk_elasticloadbalancing::Client;
use aws_sdk_elasticloadbalancing::client::Waiters;
use aws_sdk_elasticloadbalancing::types::{Instance, InstanceState};
use tracing::debug;

use fleetcycle_core::{ClassicBalancerApi, InstanceId, MemberHealth, ProviderError, ProviderFuture};

use crate::api_error;
use crate::wait::WaitPolicy;

#[derive(Debug, Clone)]
pub struct ClassicElb {
    client: Client,
    wait: WaitPolicy,
}

impl ClassicElb {
    pub fn new(client: Client, wait: WaitPolicy) -> Self {
        Self { client, wait }
    }
}

fn instance_ref(instance: &InstanceId) -> Instance {
    Instance::builder().instance_id(instance.as_str()).build()
}

fn member(state: &InstanceState) -> Option<MemberHealth> {
    Some(MemberHealth::new(state.instance_id()?, state.state()?))
}

impl ClassicBalancerApi for ClassicElb {
    fn describe_balancer<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let resp = self
                .client
                .describe_load_balancers()
                .load_balancer_names(name)
                .send()
                .await;
            match resp {
                Ok(out) if out.load_balancer_descriptions().is_empty() => {
                    Err(ProviderError::NotFound(format!("load balancer {name}")))
                }
                Ok(_) => Ok(()),
                Err(err)
                    if err
                        .as_service_error()
                        .is_some_and(|e| e.is_access_point_not_found_exception()) =>
                {
                    Err(ProviderError::NotFound(format!("load balancer {name}")))
                }
                Err(err) => Err(api_error(err)),
            }
        })
    }

    fn instance_health<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, Vec<MemberHealth>> {
        Box::pin(async move {
            let out = self
                .client
                .describe_instance_health()
                .load_balancer_name(name)
                .send()
                .await
                .map_err(api_error)?;
            Ok(out.instance_states().iter().filter_map(member).collect())
        })
    }

    fn deregister<'a>(&'a self, name: &'a str, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .deregister_instances_from_load_balancer()
                .load_balancer_name(name)
                .instances(instance_ref(instance))
                .send()
                .await
                .map_err(api_error)?;
            Ok(())
        })
    }

    fn wait_deregistered<'a>(
        &'a self,
        name: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            // OutOfService, or no longer known to the balancer.
            self.client
                .wait_until_instance_deregistered()
                .load_balancer_name(name)
                .instances(instance_ref(instance))
                .wait(self.wait.max_wait)
                .await
                .map_err(api_error)?;
            debug!(balancer = %name, %instance, "instance deregistered");
            Ok(())
        })
    }

    fn register<'a>(&'a self, name: &'a str, instance: &'a InstanceId) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .register_instances_with_load_balancer()
                .load_balancer_name(name)
                .instances(instance_ref(instance))
                .send()
                .await
                .map_err(api_error)?;
            Ok(())
        })
    }

    fn wait_in_service<'a>(
        &'a self,
        name: &'a str,
        instance: &'a InstanceId,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .wait_until_instance_in_service()
                .load_balancer_name(name)
                .instances(instance_ref(instance))
                .wait(self.wait.max_wait)
                .await
                .map_err(api_error)?;
            debug!(balancer = %name, %instance, "instance in service");
            Ok(())
        })
    }
}
