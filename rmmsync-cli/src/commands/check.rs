//! `rmmsync check` — preflight gate only.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use rmmsync_api::HttpApi;

use super::{load_config, print_disabled_toggles, run_preflight};

/// Arguments for `rmmsync check`.
#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config()?;
        print_disabled_toggles(&config);

        let api = HttpApi::new(&config.api_base, &config.api_token);
        run_preflight(&config, &api)?;
        println!(
            "{} Ready to sync '{}' against {}",
            "✓".green(),
            config.repo_path.display(),
            config.api_base
        );
        Ok(())
    }
}
