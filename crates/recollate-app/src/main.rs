use std::fs;
use std::path::PathBuf;
use std::process;

use tracing_subscriber::{filter::LevelFilter, fmt};

use recollate_app::cli::{Cli, Commands, ExplainArgs, ReconstructArgs};
use recollate_app::config::{self, AppConfig};
use recollate_app::engine::Engine;
use recollate_app::error::AppError;
use recollate_app::{report, server};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(log_level(&cli));

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn log_level(cli: &Cli) -> LevelFilter {
    match cli.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init_tracing(level: LevelFilter) {
    let subscriber = fmt().with_max_level(level).with_target(false).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Some(Commands::Serve(_)) => {
            let cfg = config::load()?;
            server::run(&cfg).await?;
        }
        Some(Commands::Reconstruct(args)) => run_reconstruct(args).await?,
        Some(Commands::Explain(args)) => run_explain(args).await?,
        None => Cli::print_help(),
    }
    Ok(())
}

fn load_config(catalog_override: Option<PathBuf>) -> Result<AppConfig, AppError> {
    let mut cfg = config::load()?;
    if catalog_override.is_some() {
        cfg.catalog.path = catalog_override;
    }
    Ok(cfg)
}

async fn run_reconstruct(args: ReconstructArgs) -> Result<(), AppError> {
    let cfg = load_config(args.catalog)?;
    let engine = Engine::from_config(&cfg)?;

    let bytes = fs::read(&args.input)?;
    let (reordered, result) = engine.reconstruct(&bytes).await?;

    let output = args.output.unwrap_or_else(|| {
        let mut path = args.input.clone();
        path.set_extension("reordered.pdf");
        path
    });
    fs::write(&output, reordered)?;

    println!(
        "{} -> {} ({} pages, {} at {:.2})",
        args.input.display(),
        output.display(),
        result.final_order.len(),
        result.selected.method,
        result.selected.confidence
    );
    Ok(())
}

async fn run_explain(args: ExplainArgs) -> Result<(), AppError> {
    let cfg = load_config(args.catalog)?;
    let engine = Engine::from_config(&cfg)?;

    let bytes = fs::read(&args.input)?;
    let result = engine.analyze(&bytes).await?;
    print!("{}", report::render(&result));
    Ok(())
}
