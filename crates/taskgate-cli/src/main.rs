//! taskgate - トークンデコードゲートの呼び出し側サンプル
//!
//! コア（taskgate-core）は判定だけを返します。ここでは
//! 設定ファイルの読み込み、ログ初期化、理由コードから利用者向け
//! フィードバックへの変換を行います。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, TimeDelta};
use clap::{Parser, Subcommand};
use taskgate_core::{DecodedTask, SafeDecoder, TokenEncoder};
use tokio::io::AsyncReadExt;
use tracing::info;

mod batch;
mod config;
mod feedback;

use config::CliConfig;
use feedback::AttackResult;

#[derive(Parser)]
#[command(name = "taskgate")]
#[command(about = "Decode untrusted task tokens through an allowlist gate")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "TASKGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode one token and print the verdict as JSON
    Decode { token: String },

    /// Decode one token per line from a file (or `-` for stdin)
    Batch {
        #[arg(default_value = "-")]
        input: String,
    },

    /// Mint a token for a task scheduled relative to now
    Mint {
        #[arg(long)]
        name: String,

        #[arg(long)]
        action: String,

        /// Seconds from now; negative values produce an already-expired token
        #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
        delay_secs: i64,

        /// Schema version to tag the token with (defaults to the accepted one)
        #[arg(long)]
        version: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::load(cli.config.as_deref()).await?;

    match cli.command {
        Command::Decode { token } => {
            let decoder = SafeDecoder::new(config.decoder)?;
            let result = AttackResult::from_verdict(decoder.verdict(&token));
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Batch { input } => {
            let text = read_input(&input).await?;
            let decoder = Arc::new(SafeDecoder::new(config.decoder)?);
            for result in batch::decode_lines(decoder, &text).await? {
                println!("{}", serde_json::to_string(&result)?);
            }
        }
        Command::Mint {
            name,
            action,
            delay_secs,
            version,
        } => {
            let delay = TimeDelta::try_seconds(delay_secs)
                .with_context(|| format!("delay of {delay_secs} seconds is out of range"))?;
            let when = Local::now()
                .naive_local()
                .checked_add_signed(delay)
                .context("requested execution time is out of range")?;
            let version = version.unwrap_or(config.decoder.schema_version);

            let task = DecodedTask::new(name, action, when);
            info!(requested_execution_time = %when, version, "minting token");
            println!("{}", TokenEncoder::encode_with_version(&task, version));
        }
    }

    Ok(())
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("failed to read stdin")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {input}"))
}
