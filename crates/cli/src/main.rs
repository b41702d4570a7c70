//! # Keyreg CLI
//!
//! 運用者向けのコマンドラインツール。
//!
//! ## サブコマンド
//! - `migrate`: v1ジェネシス文書を現行スキーマに変換
//! - `inspect`: ジェネシス文書を読み込み、登録ノードと認証状態を表示
//! - `verify-cert`: Attestation証明書を検証し、NodeIdを表示
//! - `fetch-bootstrap`: Gatewayからノードのブートストラップ入力を取得

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use keyreg_crypto::{verifier_for, AttestationVerifier};

#[derive(Debug, Parser)]
#[command(author, version, about = "Keyreg node registration tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Migrate a v1 genesis document to the current schema
    Migrate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Load a genesis document and print node registrations
    Inspect {
        #[arg(long)]
        genesis: PathBuf,
        /// Verify certificates with the mock verifier
        #[arg(long)]
        mock: bool,
    },
    /// Verify an attestation certificate and print the derived node id
    VerifyCert {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        mock: bool,
    },
    /// Fetch bootstrap material for a node from a gateway
    FetchBootstrap {
        #[arg(long)]
        gateway: String,
        #[arg(long)]
        node_id: String,
        /// Write the material to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// `--mock` に応じて検証器を選ぶ。
fn select_verifier(mock: bool) -> Result<Box<dyn AttestationVerifier>> {
    Ok(verifier_for(if mock { "mock" } else { "aws_nitro" })?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Migrate { input, output } => {
            let count = commands::migrate::run(&input, &output)?;
            println!("{count}件の登録レコードを {} に書き出しました", output.display());
        }
        Command::Inspect { genesis, mock } => {
            let raw = std::fs::read(&genesis)?;
            print!("{}", commands::inspect::run(&raw, select_verifier(mock)?)?);
        }
        Command::VerifyCert { file, mock } => {
            let certificate = std::fs::read(&file)?;
            let node_id = commands::verify_cert::run(&certificate, select_verifier(mock)?.as_ref())?;
            println!("{node_id}");
        }
        Command::FetchBootstrap {
            gateway,
            node_id,
            output,
        } => {
            let client = reqwest::Client::new();
            let material = commands::fetch_bootstrap::run(&client, &gateway, &node_id).await?;
            let json = serde_json::to_string_pretty(&material)?;
            match output {
                Some(path) => std::fs::write(&path, json)?,
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}
