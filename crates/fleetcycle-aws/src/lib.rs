//! fleetcycle-aws: provider adapters backed by the AWS SDK for Rust.
//!
//! One adapter per capability trait in `fleetcycle-core`:
//!
//! - **`classic`**: `ClassicElb`, classic load balancers
//! - **`target_group`**: `TargetGroupElb`, ELBv2 target groups
//! - **`compute`**: `Ec2Compute`, instance stop/start
//! - **`command`**: `SsmCommands`, remote command through the SSM agent
//!
//! Every `wait_*` primitive runs the SDK's own waiter for that condition,
//! bounded by a shared `WaitPolicy`.

pub mod classic;
pub mod command;
pub mod compute;
pub mod session;
pub mod target_group;
pub mod wait;

pub use classic::ClassicElb;
pub use command::SsmCommands;
pub use compute::Ec2Compute;
pub use session::AwsCloud;
pub use target_group::TargetGroupElb;
pub use wait::WaitPolicy;

use fleetcycle_core::ProviderError;

/// Flatten an SDK error, including its source chain, into an API error.
pub(crate) fn api_error<E>(err: E) -> ProviderError
where
    E: std::error::Error,
{
    ProviderError::Api(aws_sdk_ec2::error::DisplayErrorContext(err).to_string())
}
