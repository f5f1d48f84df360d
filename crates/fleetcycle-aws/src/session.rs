//! Shared SDK configuration and the adapter set built from it.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::info;

use crate::classic::ClassicElb;
use crate::command::SsmCommands;
use crate::compute::Ec2Compute;
use crate::target_group::TargetGroupElb;
use crate::wait::WaitPolicy;

/// Every adapter, built from one SDK configuration.
#[derive(Debug, Clone)]
pub struct AwsCloud {
    pub classic: ClassicElb,
    pub target_groups: TargetGroupElb,
    pub compute: Ec2Compute,
    pub commands: SsmCommands,
}

impl AwsCloud {
    /// Load credentials from the default provider chain for `region`.
    pub async fn connect(region: &str, wait: WaitPolicy) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        info!(%region, "aws session configured");
        Self::from_config(&config, wait)
    }

    pub fn from_config(config: &SdkConfig, wait: WaitPolicy) -> Self {
        Self {
            classic: ClassicElb::new(aws_sdk_elasticloadbalancing::Client::new(config), wait),
            target_groups: TargetGroupElb::new(
                aws_sdk_elasticloadbalancingv2::Client::new(config),
                wait,
            ),
            compute: Ec2Compute::new(aws_sdk_ec2::Client::new(config), wait),
            commands: SsmCommands::new(aws_sdk_ssm::Client::new(config)),
        }
    }
}
