//! Configuration management commands.

use clap::{Args, Subcommand};
use wardrobe_overlay::Config;

use super::{config_path, get_config, output_result, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Configuration is stored in ~/.wardrobe/config.yaml. Missing fields take
/// their defaults, so the file only needs the values you change.
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration
    #[command(alias = "view")]
    Show,
    /// Write a configuration file with all defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Show => {
                let cfg = get_config(cli)?;
                output_result(&cfg, cli.output.as_deref(), cli.json)
            }
            ConfigSubcommand::Init { force } => {
                let path = config_path(cli)?;
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists, use --force to overwrite",
                        path.display()
                    );
                }
                Config::default().save(&path)?;
                print_success(&format!("Wrote default config to {}", path.display()));
                Ok(())
            }
            ConfigSubcommand::Path => {
                println!("{}", config_path(cli)?.display());
                Ok(())
            }
        }
    }
}
