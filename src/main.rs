//! minirag - CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use minirag::{
    cli::{Args, Commands, Verbosity, DEFAULT_QUERY},
    build_prompt, Config, ResponseGenerator, StaticRetriever,
};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbosity());

    if let Err(e) = run(&args).await {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the verbosity flags
fn init_logging(verbosity: Verbosity) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .format_timestamp(None)
        .init();
}

async fn run(args: &Args) -> Result<()> {
    args.validate().map_err(anyhow::Error::msg)?;

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    match &args.command {
        Some(Commands::Prompt { query }) => {
            let query = query.as_deref().unwrap_or(DEFAULT_QUERY);
            println!("{}", build_prompt(&StaticRetriever::new(), query));
        }
        Some(Commands::Config) => {
            show_config(args.config.as_deref(), &config)?;
        }
        None => {
            answer(args, &config).await?;
        }
    }

    Ok(())
}

async fn answer(args: &Args, config: &Config) -> Result<()> {
    let query = args.query();
    let pb = spinner(args.verbosity());

    pb.set_message(format!("Loading model ({})...", config.backend.as_str()));
    let result = async {
        let generator = ResponseGenerator::new(config).await?;
        pb.set_message(format!("Generating with {}...", generator.model_name()));
        generator.generate_response(query).await
    }
    .await;
    pb.finish_and_clear();

    let response = result.context("Failed to generate a response")?;
    println!("Resposta gerada: {}", response);

    Ok(())
}

fn spinner(verbosity: Verbosity) -> ProgressBar {
    if !verbosity.show_progress() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn show_config(explicit: Option<&Path>, config: &Config) -> Result<()> {
    let source = explicit.map(Path::to_path_buf).or_else(Config::default_path);
    if let Some(path) = source {
        let note = if path.exists() { "" } else { " (not present, using defaults)" };
        println!("{}", format!("# {}{}", path.display(), note).dimmed());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
