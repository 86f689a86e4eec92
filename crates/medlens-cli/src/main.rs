//! medlens - medical image analysis assistant CLI

mod config;
mod ui;

use clap::Parser;
use medlens_ai::{GeminiClient, ModelConfig};
use medlens_pipeline::Analyzer;
use medlens_tui::Theme;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// medlens - medical image analysis assistant
#[derive(Parser, Debug)]
#[command(name = "medlens")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Analyze a single image and print the report (non-interactive)
    #[arg(short, long)]
    analyze: Option<PathBuf>,

    /// Model to use (default: gemini-2.0-flash-exp)
    #[arg(short, long)]
    model: Option<String>,

    /// Color theme (dark, light)
    #[arg(long)]
    theme: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("medlens=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file; CLI args take precedence
    let cfg = config::Config::load();

    let model_id = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| "gemini-2.0-flash-exp".to_string());

    // Missing credentials are fatal at startup
    let Some(api_key) = cfg.get_api_key() else {
        eprintln!("Error: No Google API key found");
        eprintln!();
        eprintln!("Set your API key with: export GOOGLE_API_KEY=your-key");
        eprintln!("Or add it to the config file: medlens --init-config");
        std::process::exit(1);
    };

    let client = GeminiClient::with_model(api_key, ModelConfig::with_id(&model_id));
    let analyzer = Analyzer::new(Arc::new(client));

    // Non-interactive mode
    if let Some(ref path) = args.analyze {
        let report = analyzer.analyze(path, &CancellationToken::new()).await;
        println!("{}", report);
        return Ok(());
    }

    // TUI mode
    let theme_name = args.theme.or(cfg.theme.clone()).unwrap_or_default();
    let theme = Theme::by_name(&theme_name);

    ui::run_tui(analyzer, model_id, theme).await
}
