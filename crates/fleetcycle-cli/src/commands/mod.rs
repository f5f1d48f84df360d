pub mod init;
pub mod plan;
pub mod run;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};

use fleetcycle_aws::{AwsCloud, WaitPolicy};
use fleetcycle_core::RunConfig;
use fleetcycle_rollout::Providers;

/// Where the run configuration comes from, plus command-line overrides.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Path to cycle.toml.
    #[arg(short, long, default_value = "cycle.toml")]
    pub config: PathBuf,
    /// Override the configured region.
    #[arg(long)]
    pub region: Option<String>,
    /// Override the configured balancers; repeat for several.
    #[arg(long = "balancer")]
    pub balancers: Vec<String>,
}

impl ConfigArgs {
    pub fn load(&self) -> anyhow::Result<RunConfig> {
        let mut config = RunConfig::from_file(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if !self.balancers.is_empty() {
            config.balancers = self.balancers.clone();
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub async fn aws_providers(region: &str) -> Providers {
    let cloud = AwsCloud::connect(region, WaitPolicy::default()).await;
    Providers {
        classic: Arc::new(cloud.classic),
        target_groups: Arc::new(cloud.target_groups),
        compute: Arc::new(cloud.compute),
        remote: Arc::new(cloud.commands),
    }
}
