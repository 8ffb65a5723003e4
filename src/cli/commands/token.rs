use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_jwt, Claims, TokenVerifier};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a token signed with the configured secret")]
    Issue {
        #[arg(help = "Subject (user id)")]
        subject: String,
        #[arg(long, default_value = "user", help = "Role claim (admin, manager, user)")]
        role: String,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },

    #[command(about = "Verify a token and print its claims")]
    Inspect {
        #[arg(help = "Bearer token")]
        token: String,
    },
}

pub fn handle(cmd: TokenCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { subject, role, hours } => {
            let role: crate::store::Role = role.parse()?;
            let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
            let claims = Claims::new(subject, role.as_str(), hours);
            let token = generate_jwt(&claims, &config.security.jwt_secret)?;

            match output_format {
                OutputFormat::Json => output_success(
                    output_format,
                    "Token issued",
                    Some(json!({ "token": token, "claims": claims })),
                ),
                // Bare token so it can be captured with $(...)
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        TokenCommands::Inspect { token } => {
            let verifier = TokenVerifier::new(&config.security.jwt_secret, config.security.jwt_leeway_secs);
            let claims = verifier.verify(token.trim())?;
            output_success(output_format, "Token is valid", Some(serde_json::to_value(claims)?))
        }
    }
}
