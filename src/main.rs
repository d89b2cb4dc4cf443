mod api;
mod logging;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mdflow_config::Settings;
use mdflow_experiments::ExperimentService;
use mdflow_workflow::SimulationParams;

/// mdflow - submit molecular-dynamics simulations to a workflow engine
#[derive(Parser)]
#[command(name = "mdflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the settings file (default: <config dir>/mdflow/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Workflow engine URL, overriding the settings file
  #[arg(long, global = true)]
  engine_url: Option<String>,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Serve the JSON API
  Serve {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
  },

  /// Submit a simulation and print the new experiment
  Submit {
    #[command(flatten)]
    params: ParamArgs,

    /// Keep polling until the archive is available
    #[arg(long)]
    wait: bool,
  },

  /// Print the workflow description a submission would send
  Render {
    #[command(flatten)]
    params: ParamArgs,
  },

  /// Check whether an artifact URL is available yet
  Status {
    /// Artifact URL to probe
    url: String,
  },
}

#[derive(Args)]
struct ParamArgs {
  /// Number of molecules
  #[arg(long, default_value_t = 1000)]
  molecules: u32,

  /// Temperature in degrees Celsius
  #[arg(long, default_value_t = 85)]
  temperature: i32,

  /// Simulated end time in seconds
  #[arg(long, default_value_t = 5.5)]
  end_time: f64,

  /// Also render a movie of the run
  #[arg(long)]
  movie: bool,
}

impl From<ParamArgs> for SimulationParams {
  fn from(args: ParamArgs) -> Self {
    Self {
      molecules: args.molecules,
      temperature: args.temperature,
      simulation_end_time: args.end_time,
      record_movie: args.movie,
    }
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::setup_logging(cli.verbose);

  let mut settings = load_settings(cli.config.as_deref(), cli.engine_url)?;

  match cli.command {
    Some(Commands::Serve { listen }) => run(serve(settings, listen)),
    Some(Commands::Submit { params, wait }) => {
      // The CLI waits explicitly instead of polling in the background.
      settings.poll.auto_watch = false;
      run(submit(settings, params.into(), wait))
    }
    Some(Commands::Render { params }) => run(render(settings, params.into())),
    Some(Commands::Status { url }) => run(status(settings, url)),
    None => {
      println!("mdflow - use --help to see available commands");
      Ok(())
    }
  }
}

fn run<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(future)
}

fn load_settings(path: Option<&std::path::Path>, engine_url: Option<String>) -> Result<Settings> {
  let mut settings = match path {
    Some(path) => Settings::load(path)
      .with_context(|| format!("failed to load settings: {}", path.display()))?,
    None => match dirs::config_dir() {
      Some(dir) => {
        let path = dir.join("mdflow").join("config.json");
        Settings::load_or_default(&path)
          .with_context(|| format!("failed to load settings: {}", path.display()))?
      }
      None => Settings::default(),
    },
  };

  if let Some(url) = engine_url {
    settings.engine.url = url;
  }
  settings.validate().context("invalid settings")?;
  Ok(settings)
}

fn build_service(settings: &Settings) -> Result<ExperimentService> {
  ExperimentService::from_settings(settings).context("failed to create experiment service")
}

async fn serve(settings: Settings, listen: SocketAddr) -> Result<()> {
  let service = Arc::new(build_service(&settings)?);
  let app = api::router(service.clone());

  let listener = tokio::net::TcpListener::bind(listen)
    .await
    .with_context(|| format!("failed to bind {}", listen))?;
  info!(address = %listen, engine = %settings.engine.url, "serving experiment API");

  let cancel = CancellationToken::new();
  tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
  tokio::spawn(sweep_expired(
    service.clone(),
    settings.cache.retention(),
    cancel.clone(),
  ));

  axum::serve(listener, app)
    .with_graceful_shutdown(cancel.cancelled_owned())
    .await
    .context("API server failed")?;

  service.shutdown();
  Ok(())
}

async fn submit(settings: Settings, params: SimulationParams, wait: bool) -> Result<()> {
  let service = build_service(&settings)?;
  let submitted = service
    .submit(params)
    .await
    .context("failed to submit experiment")?;

  eprintln!(
    "Submitted experiment {} at {}",
    submitted.record.id,
    submitted.record.display_stamp()
  );
  println!("{}", serde_json::to_string_pretty(&submitted)?);

  if !wait {
    return Ok(());
  }

  let Some(handle) = service
    .poller()
    .watch(&submitted.record.id, &submitted.artifact_url)
  else {
    return Ok(());
  };

  eprintln!("Waiting for {}", submitted.artifact_url);
  let cancel = CancellationToken::new();
  tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

  tokio::select! {
    outcome = handle => {
      let outcome = outcome.context("poll task failed")?;
      eprintln!("Experiment {}: {:?}", submitted.record.id, outcome);
    }
    _ = cancel.cancelled() => {
      service.shutdown();
      eprintln!("Stopped waiting for experiment {}", submitted.record.id);
    }
  }
  Ok(())
}

async fn render(settings: Settings, params: SimulationParams) -> Result<()> {
  let service = build_service(&settings)?;
  let (filenames, description) = service
    .render_preview(&params)
    .context("failed to render workflow")?;

  eprintln!("Archive: {}", filenames.archive_filename);
  println!("{}", serde_json::to_string_pretty(&description)?);
  Ok(())
}

async fn status(settings: Settings, url: String) -> Result<()> {
  let service = build_service(&settings)?;
  let status = service.check_artifact(&url).await;
  println!("{}", serde_json::json!({ "resource": url, "status": status }));
  Ok(())
}

/// Drop expired experiments even when no new submissions arrive.
async fn sweep_expired(service: Arc<ExperimentService>, every: Duration, cancel: CancellationToken) {
  let mut ticker = tokio::time::interval(every);
  ticker.tick().await;
  loop {
    tokio::select! {
      _ = cancel.cancelled() => return,
      _ = ticker.tick() => {
        let purged = service.store().purge_expired();
        if purged > 0 {
          debug!(purged, "swept expired experiments");
        }
      }
    }
  }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
  match tokio::signal::ctrl_c().await {
    Ok(()) => {
      info!("interrupt received, shutting down");
      cancel.cancel();
    }
    Err(e) => warn!(error = %e, "failed to listen for interrupt"),
  }
}
