//! `smailnail` - run YAML mail rules against an IMAP mailbox.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use smailnail_core::{
    DataFormat, MailGenerator, Rule, TemplateConfig, compile, load_rule, process_rule,
    write_message_files,
};
use smailnail_imap::{Client, Config, ImapStream, Selected};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command, ConnectionArgs, MailgenArgs, RunArgs};

const DEFAULT_FILTER: &str = "smailnail=info,smailnail_core=info,smailnail_imap=warn";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Validate { rules } => cmd_validate(&rules),
        Command::Mailgen(args) => cmd_mailgen(&args),
    }
}

/// Logs go to stderr so stdout carries only rendered output.
fn init_logging(level: Option<&str>) {
    let filter = level
        .and_then(|l| EnvFilter::try_new(l).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_rules(paths: &[PathBuf]) -> Result<Vec<Rule>> {
    paths
        .iter()
        .map(|path| {
            load_rule(path).with_context(|| format!("failed to load rule {}", path.display()))
        })
        .collect()
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let rules = load_rules(&args.rules)?;
    let mut mailbox = open_mailbox(&args.connection).await?;

    let mut out = std::io::stdout();
    for rule in &rules {
        process_rule(&mut mailbox, rule, &mut out, !args.no_actions)
            .await
            .with_context(|| format!("rule '{}' failed", rule.name))?;
    }

    mailbox.logout().await.context("logout failed")?;
    Ok(())
}

async fn open_mailbox(
    args: &ConnectionArgs,
) -> Result<Client<ImapStream, Selected>> {
    let mut builder = Config::builder(&args.server).security(args.security.into());
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    let config = builder.build();

    info!(server = %config.host, port = config.port, "connecting");
    let client = Client::connect(&config)
        .await
        .with_context(|| format!("failed to connect to {}:{}", config.host, config.port))?;
    let client = client
        .login(&args.username, &args.password)
        .await
        .with_context(|| format!("failed to log in as {}", args.username))?;
    let mailbox = client
        .select(&args.mailbox)
        .await
        .with_context(|| format!("failed to select {}", args.mailbox))?;
    info!(
        mailbox = %args.mailbox,
        exists = mailbox.status().exists,
        "mailbox selected"
    );
    Ok(mailbox)
}

fn cmd_validate(paths: &[PathBuf]) -> Result<()> {
    let rules = load_rules(paths)?;
    let mut out = std::io::stdout().lock();
    for (path, rule) in paths.iter().zip(&rules) {
        let compiled = compile(&rule.search, Some(&rule.output.pagination()))
            .with_context(|| format!("rule '{}' does not compile", rule.name))?;
        debug!(rule = %rule.name, criteria = ?compiled.criteria, "compiled");
        writeln!(out, "{}: ok ({})", path.display(), rule.name)?;
    }
    Ok(())
}

fn cmd_mailgen(args: &MailgenArgs) -> Result<()> {
    let mut rng = args
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let format = DataFormat::from(args.format);

    for path in &args.configs {
        let config = TemplateConfig::load(path)
            .with_context(|| format!("failed to load template config {}", path.display()))?;
        let generator = MailGenerator::new(&config)
            .with_context(|| format!("invalid template config {}", path.display()))?;
        let batches = generator
            .generate(&mut rng)
            .with_context(|| format!("generation failed for {}", path.display()))?;

        for batch in batches {
            let encoded = format.encode(&batch.emails)?;
            match &batch.output {
                Some(output) => {
                    let target = args.output_dir.join(output);
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&target, encoded)
                        .with_context(|| format!("failed to write {}", target.display()))?;
                    info!(rule = %batch.rule, file = %target.display(), emails = batch.emails.len(), "wrote emails");
                }
                None => std::io::stdout().write_all(encoded.as_bytes())?,
            }
            if args.write_files {
                let dir = args.output_dir.join(&batch.rule);
                let files = write_message_files(&batch.emails, &dir)
                    .with_context(|| format!("failed to write emails to {}", dir.display()))?;
                info!(rule = %batch.rule, files = files.len(), dir = %dir.display(), "wrote message files");
            }
        }
    }
    Ok(())
}
