use std::{env, process::Command};

use anyhow::{Context, Result, bail};
use log::info;

use crate::cli::InstallArgs;

/// Runs `cargo install csv-sieve` with the requested flags. The
/// `CSV_SIEVE_CARGO` environment variable substitutes another executable for
/// `cargo`, so the command can be exercised without a real install.
pub fn execute(args: &InstallArgs) -> Result<()> {
    let cargo = env::var("CSV_SIEVE_CARGO").unwrap_or_else(|_| "cargo".to_string());

    let mut install_args: Vec<String> = vec!["install".into(), "csv-sieve".into()];
    if let Some(version) = &args.version {
        install_args.push("--version".into());
        install_args.push(version.clone());
    }
    for (flag, enabled) in [("--force", args.force), ("--locked", args.locked)] {
        if enabled {
            install_args.push(flag.into());
        }
    }
    if let Some(root) = &args.root {
        install_args.push("--root".into());
        install_args.push(root.display().to_string());
    }

    info!("Running `{cargo} {}`", install_args.join(" "));
    let status = Command::new(&cargo)
        .args(&install_args)
        .status()
        .with_context(|| format!("Spawning `{cargo}` to install csv-sieve"))?;
    if !status.success() {
        bail!("cargo install exited with {status}");
    }
    info!("Installed csv-sieve");
    Ok(())
}
