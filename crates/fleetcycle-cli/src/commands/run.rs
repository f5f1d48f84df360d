use anyhow::Context;
use tracing::info;

use fleetcycle_core::MaintenanceOutcome;
use fleetcycle_rollout::{CycleRecord, run_maintenance};

use super::{ConfigArgs, aws_providers};

pub async fn run(args: &ConfigArgs) -> anyhow::Result<()> {
    let config = args.load()?;
    let providers = aws_providers(&config.region).await;

    match run_maintenance(&config, &providers).await {
        Ok(report) => {
            for record in &report.records {
                println!("{}", format_record(record));
            }
            info!(
                instances = report.records.len(),
                elapsed = ?report.elapsed,
                "all instances cycled"
            );
            Ok(())
        }
        Err(failure) => {
            for record in &failure.progress.records {
                println!("{}", format_record(record));
            }
            Err(failure).context("maintenance run did not complete")
        }
    }
}

pub fn format_record(record: &CycleRecord) -> String {
    match &record.outcome {
        MaintenanceOutcome::Succeeded => format!(
            "✓ {} cycled through {} balancer(s) in {:.1?}",
            record.instance, record.balancers, record.elapsed
        ),
        MaintenanceOutcome::Failed { reason } => {
            format!("✗ {} failed after {:.1?}: {reason}", record.instance, record.elapsed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn records_render_one_line_each() {
        let done = CycleRecord {
            instance: "i-1".into(),
            outcome: MaintenanceOutcome::Succeeded,
            balancers: 2,
            elapsed: Duration::from_secs(90),
        };
        assert_eq!(format_record(&done), "✓ i-1 cycled through 2 balancer(s) in 90.0s");

        let failed = CycleRecord {
            instance: "i-2".into(),
            outcome: MaintenanceOutcome::Failed {
                reason: "boom".into(),
            },
            balancers: 1,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(format_record(&failed), "✗ i-2 failed after 1.5s: boom");
    }
}
