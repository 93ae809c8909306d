use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "jobboard")]
#[command(author, version, about = "Job board catalogue API")]
#[command(after_help = "Examples:
  jobboard migrate
  jobboard serve --port 8080
  jobboard create-admin --name Ada --email ada@example.com --password 's3cret-pass' --super
  jobboard check-counters")]
pub struct Config {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Secret used to sign bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// OpenAI API key for generating descriptions; generation is disabled without it
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Custom path to the config.toml file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the REST API
    Serve {
        /// Interface to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Apply pending database migrations
    Migrate,
    /// Show database statistics
    Stats,
    /// Compare stored job counters with the actual number of jobs
    CheckCounters,
    /// Create an admin account
    #[command(after_help = "Example: jobboard create-admin --name Ada --email ada@example.com --password 's3cret-pass'")]
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        /// Grant the super-admin role
        #[arg(long = "super")]
        super_admin: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["jobboard", "--database-url", "postgres://localhost/jobboard"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_serve_arguments() {
        let config = parse(&["serve", "--host", "127.0.0.1", "--port", "8080"]);
        match config.command {
            Command::Serve { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8080);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_create_admin_arguments() {
        let config = parse(&[
            "create-admin",
            "--name",
            "Ada",
            "--email",
            "ada@example.com",
            "--password",
            "correct horse",
            "--super",
            "--config",
            "/tmp/jobboard.toml",
        ]);
        assert_eq!(config.config, Some(PathBuf::from("/tmp/jobboard.toml")));
        match config.command {
            Command::CreateAdmin {
                name, super_admin, ..
            } => {
                assert_eq!(name, "Ada");
                assert!(super_admin);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let result = Config::try_parse_from([
            "jobboard",
            "--database-url",
            "postgres://localhost/jobboard",
            "harvest",
        ]);
        assert!(result.is_err());
    }
}
