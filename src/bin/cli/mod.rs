use alidnsctl::provider::DEFAULT_ENDPOINT;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

macro_rules! env_prefix {
    () => {
        "ALIDNS_"
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// AccessKey id to authenticate with
    #[arg(long, value_name = "ID", env = "ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: String,

    /// AccessKey secret to authenticate with
    #[arg(
        long,
        value_name = "SECRET",
        env = "ACCESS_KEY_SECRET",
        hide_env_values = true
    )]
    pub access_key_secret: String,

    /// Alibaba Cloud DNS API endpoint
    #[arg(
        long,
        value_name = "URL",
        default_value = DEFAULT_ENDPOINT,
        env = concat!(env_prefix!(), "ENDPOINT")
    )]
    pub endpoint: String,

    /// Output format
    #[arg(
        value_enum,
        short = 'o',
        long,
        default_value_t = OutputFormat::Json,
        env = concat!(env_prefix!(), "OUTPUT")
    )]
    pub output: OutputFormat,

    /// Set the loglevel of the application
    #[arg(
        value_enum,
        short = 'l',
        long,
        default_value_t = Loglevel::Warn,
        value_name = "LEVEL",
        env = concat!(env_prefix!(), "LOGLEVEL")
    )]
    pub loglevel: Loglevel,

    /// Do not make any changes to the DNS records, only show what would happen
    #[arg(long, short = 'd', action, default_value_t = false)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Subcommand)]
pub enum Command {
    /// List the records of a hostname, or of the whole zone if a registered domain is given
    Get {
        /// Only list records of this type
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        record_type: Option<String>,
        hostname: String,
    },
    /// Make the records of a hostname hold exactly the given values
    ///
    /// Records already holding a value are kept, stale records are updated in place and
    /// the surplus is deleted or created. Without a type, the type is detected from the values
    /// (A, AAAA or CNAME). If the values don't share one detectable type, records of every type
    /// at the name are reconciled, so TXT or MX records there can be rewritten or deleted.
    /// Pass --type to avoid this. Passing no values (or only empty ones) does nothing.
    Set {
        /// Record type to manage
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        record_type: Option<String>,
        /// TTL in seconds for created and updated records
        #[arg(long, value_name = "SECONDS")]
        ttl: Option<u32>,
        hostname: String,
        values: Vec<String>,
    },
    /// Delete records of a hostname holding the given values, or all of them with --all
    Del {
        /// Delete all records of the hostname (of the given type, if set)
        #[arg(long, action, default_value_t = false, conflicts_with = "values")]
        all: bool,
        /// Record type to delete
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        record_type: Option<String>,
        hostname: String,
        #[arg(required_unless_present = "all")]
        values: Vec<String>,
    },
    /// Inspect the domains of the account
    #[command(subcommand)]
    Domains(DomainsCommand),
    /// Manage single records by id
    #[command(subcommand)]
    Records(RecordsCommand),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Subcommand)]
pub enum DomainsCommand {
    /// List all domains
    List,
    /// Show details about a domain
    #[command(visible_alias = "get")]
    Info { domain: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Subcommand)]
pub enum RecordsCommand {
    /// Show a single record
    Get { id: String },
    /// Enable a record
    Enable { id: String },
    /// Disable a record
    Disable { id: String },
    /// Delete a record
    #[command(visible_alias = "delete")]
    Remove { id: String },
}

/// How to print command results
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum)]
pub enum OutputFormat {
    Json,
}

/// Used to set the applications loglevel
// This is essentially a re-creation of log:Level. However, that enum doesn't derive ValueEnum, so we have to do it manually here
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum)]
pub enum Loglevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
impl From<Loglevel> for LevelFilter {
    fn from(ll: Loglevel) -> Self {
        match ll {
            Loglevel::Error => LevelFilter::Error,
            Loglevel::Warn => LevelFilter::Warn,
            Loglevel::Info => LevelFilter::Info,
            Loglevel::Debug => LevelFilter::Debug,
            Loglevel::Trace => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut full = vec![
            "alidnsctl",
            "--access-key-id",
            "id",
            "--access-key-secret",
            "secret",
        ];
        full.extend_from_slice(args);
        Cli::try_parse_from(full)
    }

    #[test]
    fn should_be_valid_command() {
        Cli::command().debug_assert();
    }

    #[test]
    fn should_parse_set() {
        let cli = parse(&[
            "set",
            "-t",
            "A",
            "--ttl",
            "600",
            "www.example.com",
            "1.1.1.1",
            "2.2.2.2",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Set {
                record_type: Some("A".to_owned()),
                ttl: Some(600),
                hostname: "www.example.com".to_owned(),
                values: vec!["1.1.1.1".to_owned(), "2.2.2.2".to_owned()],
            }
        );
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(!cli.dry_run);
    }

    #[test]
    fn should_warn_about_mixed_types_in_set_help() {
        let cmd = Cli::command();
        let help = cmd
            .find_subcommand("set")
            .and_then(|set| set.get_long_about())
            .map(|about| about.to_string())
            .unwrap();
        assert!(help.contains("records of every type"));
        assert!(help.contains("--type"));
    }

    #[test]
    fn should_parse_set_without_values() {
        let cli = parse(&["set", "www.example.com"]).unwrap();
        assert!(matches!(cli.command, Command::Set { values, .. } if values.is_empty()));
    }

    #[test]
    fn should_require_values_or_all_for_del() {
        assert!(parse(&["del", "www.example.com"]).is_err());
        assert!(parse(&["del", "--all", "www.example.com", "1.1.1.1"]).is_err());

        let cli = parse(&["del", "--all", "--type", "TXT", "www.example.com"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Del {
                all: true,
                record_type: Some("TXT".to_owned()),
                hostname: "www.example.com".to_owned(),
                values: vec![],
            }
        );
    }

    #[test]
    fn should_parse_domain_info_alias() {
        let cli = parse(&["domains", "get", "example.com"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Domains(DomainsCommand::Info {
                domain: "example.com".to_owned()
            })
        );
    }

    #[test]
    fn should_parse_record_commands() {
        let cli = parse(&["-d", "records", "delete", "123"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Records(RecordsCommand::Remove {
                id: "123".to_owned()
            })
        );
        assert!(cli.dry_run);
    }

    #[test]
    fn should_map_loglevel() {
        let cli = parse(&["-l", "debug", "domains", "list"]).unwrap();
        assert_eq!(LevelFilter::from(cli.loglevel), LevelFilter::Debug);
    }
}
