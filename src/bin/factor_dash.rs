use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use factor_dash::core::{AnalysisKind, FittedModel};
use factor_dash::telemetry::init_default_tracing;
use factor_dash::{AppOptions, Dashboard, DashError, DashResult};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "factor-dash")]
#[command(about = "Serve an interactive dashboard for a fitted factorial analysis")]
#[command(version)]
struct Args {
    /// Fitted model exported as JSON
    #[arg(short, long)]
    model: PathBuf,

    /// Analysis kind the model must be (pca, ca, mca, famd, mfa, mfaqual, mfamix, mfact)
    #[arg(short, long)]
    kind: Option<String>,

    /// Application options as JSON; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(long)]
    title: Option<String>,

    /// TrueType font used for text in PNG and JPEG exports
    #[arg(long)]
    font: Option<PathBuf>,

    /// Do not open a browser tab
    #[arg(long, default_value = "false")]
    no_browser: bool,
}

fn main() -> ExitCode {
    let _ = init_default_tracing();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "factor-dash failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> DashResult<()> {
    let options = options(&args)?;
    let model = FittedModel::from_json_compat_str(&read(&args.model)?)?;
    let expected = match args.kind.as_deref() {
        Some(code) => AnalysisKind::from_code(code)?,
        None => model.kind,
    };
    info!(model = %args.model.display(), kind = %expected, "loading dashboard");
    Dashboard::new(model, expected, options)?.run()
}

fn options(args: &Args) -> DashResult<AppOptions> {
    let mut options = match &args.config {
        Some(path) => AppOptions::from_json_str(&read(path)?)?,
        None => AppOptions::default(),
    };
    if let Some(host) = &args.host {
        options = options.with_host(host.clone());
    }
    if let Some(port) = args.port {
        options = options.with_port(port);
    }
    if let Some(title) = &args.title {
        options = options.with_title(title.clone());
    }
    if let Some(font) = &args.font {
        options = options.with_bitmap_font(font.clone());
    }
    if args.no_browser {
        options = options.with_launch_browser(false);
    }
    Ok(options)
}

fn read(path: &Path) -> DashResult<String> {
    fs::read_to_string(path)
        .map_err(|e| DashError::Configuration(format!("failed to read {}: {e}", path.display())))
}
