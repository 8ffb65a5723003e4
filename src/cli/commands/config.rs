use clap::Subcommand;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Print the configuration resolved from the environment (secret omitted)")]
    Show,

    #[command(about = "Validate the configuration resolved from the environment")]
    Check,
}

pub fn handle(cmd: ConfigCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => output_success(
            output_format,
            &format!("{:?} configuration", config.environment),
            Some(serde_json::to_value(config)?),
        ),
        ConfigCommands::Check => {
            config.validate()?;
            output_success(output_format, "Configuration is valid", None)
        }
    }
}
