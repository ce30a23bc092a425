use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plant-doctor")]
#[command(about = "植物の写真・動画からAIで病気を診断するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 診断サービスのURL（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub api_base: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真/動画を解析して診断結果を表示
    Analyze {
        /// ファイルまたはフォルダのパス
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,

        /// すべての節を開いて表示
        #[arg(short, long)]
        expand_all: bool,
    },

    /// 診断サービスの接続確認
    Health,

    /// 対話モード（履歴の閲覧・再表示）
    Interactive,

    /// 設定を表示/編集
    Config {
        /// 診断サービスのURLを設定
        #[arg(long)]
        set_api_base: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "plant-doctor",
            "analyze",
            "a.jpg",
            "photos",
            "--json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Analyze { paths, json, expand_all } => {
                assert_eq!(paths, vec![PathBuf::from("a.jpg"), PathBuf::from("photos")]);
                assert!(json);
                assert!(!expand_all);
            }
            _ => panic!("analyze のはず"),
        }
    }

    #[test]
    fn test_analyze_requires_path() {
        assert!(Cli::try_parse_from(["plant-doctor", "analyze"]).is_err());
    }

    #[test]
    fn test_global_api_base() {
        let cli =
            Cli::try_parse_from(["plant-doctor", "health", "--api-base", "http://127.0.0.1:9"])
                .unwrap();
        assert_eq!(cli.api_base.as_deref(), Some("http://127.0.0.1:9"));
        assert!(matches!(cli.command, Commands::Health));
    }
}
