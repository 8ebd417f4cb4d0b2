//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use smailnail_core::DataFormat;
use smailnail_imap::Security;

#[derive(Debug, Parser)]
#[command(name = "smailnail", version, about = "Run YAML mail rules against an IMAP mailbox")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log filter, e.g. `debug` or `smailnail_core=trace` (overrides RUST_LOG)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run rule files against a mailbox
    Run(RunArgs),
    /// Check rule files without connecting
    Validate {
        /// Rule files
        #[arg(required = true, value_name = "RULE")]
        rules: Vec<PathBuf>,
    },
    /// Generate test emails from template configurations
    Mailgen(MailgenArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Rule files, run in order
    #[arg(required = true, value_name = "RULE")]
    pub rules: Vec<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Render matches without running the rules' actions
    #[arg(long)]
    pub no_actions: bool,
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// IMAP server host
    #[arg(long, env = "SMAILNAIL_SERVER")]
    pub server: String,

    /// IMAP server port (default from --security)
    #[arg(long, env = "SMAILNAIL_PORT")]
    pub port: Option<u16>,

    /// Login name
    #[arg(long, env = "SMAILNAIL_USERNAME")]
    pub username: String,

    /// Password
    #[arg(long, env = "SMAILNAIL_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Mailbox to select
    #[arg(long, env = "SMAILNAIL_MAILBOX", default_value = "INBOX")]
    pub mailbox: String,

    /// Transport security
    #[arg(long, env = "SMAILNAIL_SECURITY", value_enum, default_value_t = SecurityArg::Tls)]
    pub security: SecurityArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SecurityArg {
    /// TLS from the first byte (port 993)
    Tls,
    /// STARTTLS upgrade (port 143)
    Starttls,
    /// No encryption, for local test servers (port 143)
    Plain,
}

impl From<SecurityArg> for Security {
    fn from(arg: SecurityArg) -> Self {
        match arg {
            SecurityArg::Tls => Self::Implicit,
            SecurityArg::Starttls => Self::StartTls,
            SecurityArg::Plain => Self::None,
        }
    }
}

#[derive(Debug, Args)]
pub struct MailgenArgs {
    /// Template configuration files
    #[arg(short, long = "config", required = true, value_name = "FILE")]
    pub configs: Vec<PathBuf>,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Format for printed and `output` files
    #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Directory for `output` files and `--write-files`
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Also write each email as `<output-dir>/<rule>/email_<i>.txt`
    #[arg(long)]
    pub write_files: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for DataFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Yaml => Self::Yaml,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_defaults() {
        let cli = Cli::try_parse_from([
            "smailnail",
            "run",
            "rules/a.yaml",
            "--server",
            "imap.example.com",
            "--username",
            "ann",
            "--password",
            "secret",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.connection.mailbox, "INBOX");
        assert_eq!(args.connection.security, SecurityArg::Tls);
        assert!(!args.no_actions);
    }

    #[test]
    fn parses_mailgen() {
        let cli = Cli::try_parse_from([
            "smailnail", "mailgen", "-c", "a.yaml", "-c", "b.yaml", "--seed", "7", "-f", "yaml",
        ])
        .unwrap();
        let Command::Mailgen(args) = cli.command else {
            panic!("expected mailgen");
        };
        assert_eq!(args.configs.len(), 2);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.format, FormatArg::Yaml);
    }
}
