use std::fmt::Write;

use fleetcycle_balancer::FleetPlan;
use fleetcycle_rollout::plan as resolve_plan;

use super::{ConfigArgs, OutputFormat, aws_providers};

pub async fn plan(args: &ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = args.load()?;
    let providers = aws_providers(&config.region).await;
    let plan = resolve_plan(&config, &providers).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => print!("{}", format_plan(&plan)),
    }
    Ok(())
}

pub fn format_plan(plan: &FleetPlan) -> String {
    let mut out = String::new();
    if plan.instances.is_empty() {
        out.push_str("No healthy instances behind the configured balancers.\n");
        return out;
    }

    let _ = writeln!(out, "{} instance(s) will be cycled in this order:", plan.instances.len());
    for (position, planned) in plan.instances.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", position + 1, planned.instance);
        for balancer in &planned.balancers {
            if balancer.name == balancer.balancer_id {
                let _ = writeln!(out, "       {} {}", balancer.kind, balancer.name);
            } else {
                let _ = writeln!(
                    out,
                    "       {} {} ({})",
                    balancer.kind, balancer.name, balancer.balancer_id
                );
            }
        }
    }
    out
}
