use anyhow::{bail, Context};
use clap::Parser;
use plant_doctor::{cli, client, config, render, shell};
use cli::{Cli, Commands};
use client::HttpDiagnosisClient;
use config::Config;
use shell::Shell;
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().context("設定の読み込みに失敗")?;
    let api_base = match cli.api_base.as_deref() {
        Some(url) => config::validate_api_base(url)?,
        None => config.api_base(),
    };
    tracing::debug!(api_base = %api_base, "接続先");

    match cli.command {
        Commands::Analyze { paths, json, expand_all } => {
            let client = HttpDiagnosisClient::new(&api_base)?;
            let mut shell = Shell::new(client);
            if json {
                shell = shell.quiet();
            }
            if expand_all {
                shell = shell.expand_all();
            }

            let summary = shell.run_batch(&paths, json).await?;
            if !json {
                println!(
                    "✅ 解析完了: 成功 {}件 / 失敗 {}件",
                    summary.succeeded, summary.failed
                );
            }
            if summary.failed > 0 {
                bail!("{}件の解析に失敗しました", summary.failed);
            }
        }

        Commands::Health => {
            let client = HttpDiagnosisClient::new(&api_base)?;
            let mut shell = Shell::new(client);
            let probe = shell.probe_backend().await;

            println!("接続先: {}", api_base);
            println!("{}", render::render_backend_status(shell.backend()));
            match probe {
                Ok(report) => {
                    if let Some(message) = report.message {
                        println!("  {}", message);
                    }
                }
                Err(e) => bail!("診断サービスに接続できません: {}", e.user_message()),
            }
        }

        Commands::Interactive => {
            let client = HttpDiagnosisClient::new(&api_base)?;
            Shell::new(client).run_interactive().await?;
        }

        Commands::Config { set_api_base, show } => {
            let mut config = config;

            if let Some(url) = set_api_base {
                config.set_api_base(url)?;
                println!("✔ 接続先を設定しました");
            }

            if show {
                println!("設定:");
                println!("  ファイル: {}", Config::config_path()?.display());
                println!(
                    "  接続先(設定): {}",
                    config.api_base.as_deref().unwrap_or("未設定")
                );
                println!("  接続先(実際): {}", config.api_base());
            }
        }
    }

    Ok(())
}
