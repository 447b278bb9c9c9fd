pub mod check;
pub mod sync;

use anyhow::{bail, Result};
use colored::Colorize;

use rmmsync_api::HttpApi;
use rmmsync_core::{config, Config, ConfigError};
use rmmsync_engine::{preflight, Mirror};
use rmmsync_git::GitRepo;

/// Load the environment config, printing per-variable hints on failure.
pub fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => Ok(config),
        Err(err) => {
            eprintln!("{} {err}", "✗".red());
            if let ConfigError::MissingVars { vars } = &err {
                for var in vars {
                    if let Some(hint) = config::variable_hint(var) {
                        eprintln!("  - {hint}");
                    }
                }
            }
            bail!(err)
        }
    }
}

/// Run the preflight gate, printing findings. Errors abort with non-zero.
pub fn run_preflight(config: &Config, api: &HttpApi) -> Result<()> {
    println!("\n===== Step 0: General Prep =====");
    let mirror = Mirror::new(&config.repo_path);
    let repo = GitRepo::new(&config.repo_path, &config.branch);

    match preflight(config, api, &mirror, &repo) {
        Ok(warnings) => {
            for warning in warnings {
                println!("{} {warning}", "!".yellow());
            }
            println!("{} Preflight checks passed.", "✓".green());
        }
        Err(err) => {
            eprintln!("{} {err}", "✗".red());
            bail!("preflight failed");
        }
    }
    println!("===== End of Step 0: General Prep =====");
    Ok(())
}

/// Announce which toggles are off, mirroring the operator's env settings.
pub fn print_disabled_toggles(config: &Config) {
    if config.branch != "master" {
        println!("Git Pull Branch: {}", config.branch);
    }
    let toggles = config.toggles;
    if !toggles.git_pull {
        println!("Git Pull is disabled.");
    }
    if !toggles.git_push {
        println!("Git Push is disabled.");
    }
    if !toggles.writeback {
        println!("Writeback is disabled.");
    }
    if !toggles.write_to_file {
        println!("Write to file is disabled.");
    }
}
