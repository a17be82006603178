use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "jobport", about = "Job portal for field-service businesses", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "jobport.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Initialize the Jobport data directory and configuration
    Init {
        /// Data directory path
        #[arg(long, default_value = "/var/lib/jobport")]
        data_dir: String,
    },
    /// Store the upstream OAuth refresh token obtained during app authorization
    SeedToken {
        /// The refresh token value
        refresh_token: String,
    },
    /// Show configuration and upstream integration status
    Status {
        /// Perform a live request against the upstream API
        #[arg(long)]
        check_upstream: bool,
    },
    /// Start the portal web server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            commands::init::run(&data_dir).await?;
        }
        Commands::SeedToken { refresh_token } => {
            commands::seed_token::run(&cli.config, &refresh_token).await?;
        }
        Commands::Status { check_upstream } => {
            commands::status::run(&cli.config, check_upstream).await?;
        }
        Commands::Serve { port } => {
            commands::serve::run(&cli.config, port).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn cli_parse_init_defaults() {
        let cli = Cli::parse_from(["jobport", "init"]);
        assert_eq!(cli.config, "jobport.toml");
        match cli.command {
            Commands::Init { data_dir } => {
                assert_eq!(data_dir, "/var/lib/jobport");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn cli_parse_init_custom() {
        let cli = Cli::parse_from([
            "jobport",
            "--config",
            "/etc/jobport.toml",
            "init",
            "--data-dir",
            "/opt/jobport",
        ]);
        assert_eq!(cli.config, "/etc/jobport.toml");
        match cli.command {
            Commands::Init { data_dir } => {
                assert_eq!(data_dir, "/opt/jobport");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn cli_parse_seed_token() {
        let cli = Cli::parse_from(["jobport", "seed-token", "rt-abc123"]);
        match cli.command {
            Commands::SeedToken { refresh_token } => {
                assert_eq!(refresh_token, "rt-abc123");
            }
            _ => panic!("expected SeedToken command"),
        }
    }

    #[test]
    fn cli_parse_status() {
        let cli = Cli::parse_from(["jobport", "status"]);
        match cli.command {
            Commands::Status { check_upstream } => {
                assert!(!check_upstream);
            }
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn cli_parse_status_check_upstream() {
        let cli = Cli::parse_from(["jobport", "status", "--check-upstream"]);
        match cli.command {
            Commands::Status { check_upstream } => {
                assert!(check_upstream);
            }
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn cli_parse_serve_defaults() {
        let cli = Cli::parse_from(["jobport", "serve"]);
        match cli.command {
            Commands::Serve { port } => {
                assert_eq!(port, 8080);
            }
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn cli_parse_serve_custom_port() {
        let cli = Cli::parse_from(["jobport", "serve", "--port", "3000"]);
        match cli.command {
            Commands::Serve { port } => {
                assert_eq!(port, 3000);
            }
            _ => panic!("expected Serve command"),
        }
    }
}
