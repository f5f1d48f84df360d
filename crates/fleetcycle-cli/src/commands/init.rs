use std::path::Path;

use anyhow::bail;

use fleetcycle_core::RunConfig;

pub fn init(path: &str, region: &str, balancers: &[String], force: bool) -> anyhow::Result<()> {
    let output = Path::new(path);
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let balancers = if balancers.is_empty() {
        vec!["web-clb".to_string(), "web-alb".to_string()]
    } else {
        balancers.to_vec()
    };
    let config = RunConfig::scaffold(region, &balancers);
    std::fs::write(output, config.to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
