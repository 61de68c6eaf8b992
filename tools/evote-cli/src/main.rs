//! # E-Vote CLI
//!
//! Runs an invocation script against a fresh in-memory ledger and prints one
//! result line per command:
//!
//! ```text
//! $ evote-cli ballot.txt
//! 2 submit InitLedger -> ok
//! 3 submit CastVote rom -> ok 5f2c...e1
//! 4 evaluate GetOption rom -> ok {"docType":"option","key":"rom","name":"Rom","votes":1}
//! ```

mod script;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use evote_contract::prelude::{
    ContractConfig, ContractError, Gateway, InMemoryLedger, VotingContract,
};
use evote_telemetry::{init_logging, log_event, log_tx_event, TelemetryConfig};

use script::{parse_script, Command, Mode};

const COMPONENT: &str = "evote-cli";

/// Run e-vote contract invocation scripts.
#[derive(Parser, Debug)]
#[command(name = "evote-cli", version)]
#[command(about = "Run e-vote contract invocations against an in-memory ledger")]
struct Args {
    /// Script file with one `submit|evaluate Function args...` per line (stdin if omitted)
    script: Option<PathBuf>,

    /// Option names seeded by InitLedger, comma separated
    #[arg(long, value_delimiter = ',')]
    seed: Vec<String>,

    /// Voter monitor key
    #[arg(long)]
    voter_monitor_key: Option<String>,

    /// Continue after a failed command
    #[arg(long)]
    keep_going: bool,

    /// Emit JSON formatted logs
    #[arg(long)]
    json_logs: bool,

    /// Log filter, overrides EVOTE_LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn telemetry_config(&self) -> TelemetryConfig {
        let mut config = TelemetryConfig::from_env();
        config.service_name = COMPONENT.to_string();
        config.json_logs |= self.json_logs;
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }
        config
    }

    fn contract_config(&self) -> ContractConfig {
        let mut config = ContractConfig::from_env();
        let seed: Vec<String> = self
            .seed
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !seed.is_empty() {
            config.seed_options = seed;
        }
        if let Some(key) = &self.voter_monitor_key {
            config.voter_monitor_key.clone_from(key);
        }
        config
    }

    fn read_script(&self) -> Result<String> {
        match &self.script {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read script {}", path.display())),
            None => {
                let mut source = String::new();
                io::stdin()
                    .read_to_string(&mut source)
                    .context("Failed to read script from stdin")?;
                Ok(source)
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.telemetry_config()).context("Failed to initialize logging")?;

    let source = args.read_script()?;
    let commands = parse_script(&source).context("Failed to parse script")?;

    let gateway = Gateway::open(
        Arc::new(InMemoryLedger::new()),
        VotingContract::new(args.contract_config()),
    );
    log_event!(info, COMPONENT, "Running script", commands = commands.len());

    let failures = run(&gateway, &commands, args.keep_going).await;
    gateway.close();

    let stats = gateway.stats().await;
    log_event!(
        info,
        COMPONENT,
        "Script finished",
        committed = stats.committed,
        evaluated = stats.evaluated,
        rejected = stats.rejected,
        conflicts = stats.conflicts
    );

    if failures > 0 {
        bail!("{failures} command(s) failed");
    }
    Ok(())
}

/// Execute commands in order. Returns the number of failed commands.
async fn run(gateway: &Gateway, commands: &[Command], keep_going: bool) -> usize {
    let mut failures = 0;

    for command in commands {
        let args = command.arg_refs();
        let result = match command.mode {
            Mode::Submit => submit(gateway, &command.function, &args).await,
            Mode::Evaluate => gateway.evaluate(&command.function, &args).await,
        };

        let label = format!(
            "{} {} {} {}",
            command.line,
            command.mode,
            command.function,
            command.args.join(" ")
        );
        match result {
            Ok(payload) if payload.is_empty() => println!("{} -> ok", label.trim_end()),
            Ok(payload) => {
                println!("{} -> ok {}", label.trim_end(), String::from_utf8_lossy(&payload));
            }
            Err(e) => {
                failures += 1;
                println!("{} -> error: {e}", label.trim_end());
                log_event!(
                    warn,
                    COMPONENT,
                    "Command failed",
                    line = command.line,
                    function = %command.function,
                    retryable = e.is_retryable()
                );
                if !keep_going {
                    break;
                }
            }
        }
    }

    failures
}

async fn submit(gateway: &Gateway, function: &str, args: &[&str]) -> Result<Vec<u8>, ContractError> {
    let endorsement = gateway.endorse(function, args).await?;
    let payload = endorsement.payload.clone();
    let receipt = gateway.commit(endorsement).await?;
    log_tx_event!(
        debug,
        COMPONENT,
        "Command committed",
        receipt.tx_id,
        height = receipt.height,
        writes = receipt.writes
    );
    Ok(payload)
}
