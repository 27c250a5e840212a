//! Device Mockup
//!
//! Command line front end and HTTP service for composing app screenshots into
//! device frames.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, App, HttpServer, middleware};
use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use device_mockup::api;
use device_mockup::config::Settings;
use device_mockup::domain::{find_spec, Background, StatusBarStyle, DEVICES};
use device_mockup::engine::{LayoutOptions, ScreenshotSource};
use device_mockup::{AppState, Mockup, MockupOutput, MockupRequest, OutputMode};

#[derive(Parser, Debug)]
#[command(name = "device-mockup", version, about = "Generate mock ups from app screenshots")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose screenshots into one mock up image.
    Compose(ComposeArgs),
    /// List supported devices and their keys.
    Devices,
    /// Run the HTTP service.
    Serve,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Screenshot for a device, as `<key>=<path>` (e.g. `iphone_x=shot.png`).
    #[arg(short, long = "device", value_parser = parse_device_arg)]
    devices: Vec<(String, PathBuf)>,

    /// Width of resulting image.
    #[arg(short, long)]
    width: Option<u32>,

    /// Height of resulting image.
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Background of resulting image as a css color string.
    #[arg(short, long, value_parser = parse_background)]
    background: Option<Background>,

    /// Style of status bar to add (none/light/dark). Only devices with status bar assets use it.
    #[arg(short, long)]
    status_bar: Option<String>,

    /// Region width fraction used by devices that lock the layout on portrait canvases.
    #[arg(long)]
    padding_x: Option<f64>,

    /// Region height fraction used by devices that lock the layout on landscape canvases.
    #[arg(long)]
    padding_y: Option<f64>,

    /// File to write resulting image to.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory with device frame assets.
    #[arg(long)]
    assets: Option<PathBuf>,
}

fn parse_device_arg(s: &str) -> Result<(String, PathBuf), String> {
    let (key, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <device>=<path>, got '{s}'"))?;
    if path.is_empty() {
        return Err(format!("no screenshot path given for '{key}'"));
    }
    Ok((key.trim().to_string(), PathBuf::from(path)))
}

fn parse_background(s: &str) -> Result<Background, String> {
    s.parse()
}

fn valid_keys() -> String {
    DEVICES
        .iter()
        .map(|spec| spec.cli_key())
        .collect::<Vec<_>>()
        .join(", ")
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("device_mockup=info".parse()?)
        .add_directive("actix_web=info".parse()?);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(matches!(cli.cmd, Command::Serve))?;

    let settings = Settings::load().context("load configuration")?;

    match cli.cmd {
        Command::Compose(args) => cmd_compose(settings, args).await,
        Command::Devices => cmd_devices(),
        Command::Serve => cmd_serve(settings).await,
    }
}

async fn cmd_compose(settings: Settings, args: ComposeArgs) -> anyhow::Result<()> {
    let mut screenshots = HashMap::new();
    for (key, path) in args.devices {
        let Some(spec) = find_spec(&key) else {
            bail!("'{key}' is not a known device (valid devices: {})", valid_keys());
        };
        screenshots.insert(spec.name.to_string(), ScreenshotSource::Path(path));
    }
    if screenshots.is_empty() {
        bail!("No screenshot provided for valid device ({}).", valid_keys());
    }

    let defaults = settings
        .defaults
        .layout_options()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration defaults")?;
    let status_bar = match args.status_bar.as_deref() {
        Some(style) => StatusBarStyle::parse(style).map_err(anyhow::Error::msg)?,
        None => defaults.status_bar,
    };
    let options = LayoutOptions {
        width: args.width.unwrap_or(defaults.width),
        height: args.height.unwrap_or(defaults.height),
        background: args.background.unwrap_or(defaults.background),
        status_bar,
        padding_x: args.padding_x.unwrap_or(defaults.padding_x),
        padding_y: args.padding_y.unwrap_or(defaults.padding_y),
    };
    let output = args.output.unwrap_or(settings.output.path);
    let assets = args.assets.unwrap_or(settings.assets.path);

    let mockup = Mockup::init(&assets)
        .await
        .with_context(|| format!("load device assets from '{}'", assets.display()))?;

    let request = MockupRequest::new(screenshots)
        .with_options(options)
        .with_output(OutputMode::File(output));

    match mockup.up(request).await? {
        MockupOutput::Written(path) => eprintln!("Saved to {}", path.display()),
        MockupOutput::Image(_) => {}
    }
    Ok(())
}

fn cmd_devices() -> anyhow::Result<()> {
    for spec in DEVICES {
        let status_bar = if spec.supports_status_bar() { "  (status bar)" } else { "" };
        println!(
            "{:<14} --device {}=<path>   {}x{}{}",
            spec.name,
            spec.cli_key(),
            spec.screen.w,
            spec.screen.h,
            status_bar
        );
    }
    Ok(())
}

async fn cmd_serve(settings: Settings) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting device-mockup v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    // Load all device frames into memory at startup
    let mockup = Arc::new(
        Mockup::init(&settings.assets.path)
            .await
            .context("load device assets")?,
    );
    info!("Loaded {} devices", mockup.catalog().device_count());

    let workers = settings.server.workers.unwrap_or_else(|| num_cpus::get() * 2);

    // Create shared application state
    let app_state = web::Data::new(
        AppState::new(settings, mockup).context("build HTTP client")?,
    );

    // Configure and start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "device-mockup"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION")))
            )
            // Routes
            .configure(api::configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("bind {bind_addr}"))?
    .run()
    .await?;

    Ok(())
}
