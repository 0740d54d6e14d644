//! Headless QuickView.
//!
//! Loads an EAM data/connectivity pair (or the synthetic demo dataset),
//! optionally restores a saved session, renders every active view to PNG
//! and writes the resulting session state next to the snapshots.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eam_reader::{DataReader, SyntheticReader};
use pipeline::Pipeline;
use quickview_common::SavedState;
use renderer::{HeadlessBackend, PresetTable};
use view_manager::{Session, ViewManager};

use config::{Args, ServiceConfig};

/// File names bound to the synthetic reader in demo mode.
const DEMO_DATA_FILE: &str = "demo.eam.h0.nc";
const DEMO_CONN_FILE: &str = "demo.scrip.nc";

const STATE_FILE_NAME: &str = "state.json";

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let config = ServiceConfig::build(&args)?;
    info!(
        output_dir = %config.output_dir.display(),
        projection = %config.pipeline.default_projection,
        "Starting QuickView"
    );

    let presets = PresetTable::with_files(&config.preset_files).context("Failed to load colormap presets")?;
    let backend = HeadlessBackend::new(Arc::new(presets))
        .with_default_colormap(config.views.default_colormap.clone());

    let mut pipeline = Pipeline::new(config.pipeline.clone(), make_reader(&args)?)?;
    pipeline.set_globe_mode(config.globe_mode);
    let views = ViewManager::new(backend, config.views.clone())?;
    let mut session = Session::new(pipeline, views);

    match &args.state {
        Some(path) => restore_state(&mut session, &args, &args.resolve(path))?,
        None => start_fresh(&mut session, &args)?,
    }

    if let Some(t) = args.time {
        session.set_time(t)?;
    }

    let written = write_snapshots(&mut session, &config.output_dir)?;
    let state_path = config.output_dir.join(STATE_FILE_NAME);
    session
        .export_state()
        .write_to(&state_path)
        .with_context(|| format!("Failed to write {}", state_path.display()))?;

    info!(
        snapshots = written,
        state = %state_path.display(),
        "Done"
    );
    Ok(())
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    match args.log_format.to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init(),
        "text" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
        other => bail!("Unknown log format '{}' (expected json or text)", other),
    }
    .map_err(|e| anyhow::anyhow!(e))
}

fn make_reader(args: &Args) -> Result<Box<dyn DataReader>> {
    if args.demo {
        return Ok(Box::new(SyntheticReader::demo()));
    }

    #[cfg(feature = "native")]
    {
        Ok(Box::new(eam_reader::NetCdfReader::new()))
    }

    #[cfg(not(feature = "native"))]
    {
        bail!("Reading EAM files requires the `native` feature; use --demo for the synthetic dataset")
    }
}

/// Data and connectivity paths from the flags, or the demo names.
fn input_files(args: &Args) -> Result<(PathBuf, PathBuf)> {
    match (&args.data, &args.conn) {
        (Some(data), Some(conn)) => Ok((args.resolve(data), args.resolve(conn))),
        _ if args.demo => Ok((PathBuf::from(DEMO_DATA_FILE), PathBuf::from(DEMO_CONN_FILE))),
        _ => bail!("Both --data and --conn are required (or use --demo)"),
    }
}

fn start_fresh(session: &mut Session<HeadlessBackend>, args: &Args) -> Result<()> {
    let (data_file, conn_file) = input_files(args)?;
    session
        .load_data(&data_file, &conn_file)
        .with_context(|| format!("Failed to load {}", data_file.display()))?;

    let requested = if args.variables.is_empty() {
        match session.pipeline().available_variables().ordered().first() {
            Some(first) => vec![first.clone()],
            None => bail!("{} has no displayable variables", data_file.display()),
        }
    } else {
        args.variables.clone()
    };

    let unknown = session.select_variables_by_name(&requested);
    if unknown.len() == requested.len() {
        bail!("None of the requested variables are available: {:?}", unknown);
    }

    if let Some(projection) = &args.projection {
        session.set_projection(projection)?;
    }
    session.rebuild()?;
    Ok(())
}

fn restore_state(session: &mut Session<HeadlessBackend>, args: &Args, path: &Path) -> Result<()> {
    let mut saved =
        SavedState::read_from(path).with_context(|| format!("Failed to read state file {}", path.display()))?;

    // Explicit files take precedence over the ones recorded in the state
    if args.data.is_some() || args.conn.is_some() || args.demo {
        let (data_file, conn_file) = input_files(args)?;
        saved.data_file = Some(data_file.display().to_string());
        saved.conn_file = Some(conn_file.display().to_string());
    }
    if let Some(projection) = &args.projection {
        saved.projection = projection.clone();
    }
    if !args.variables.is_empty() {
        warn!("--variables is ignored when restoring a state file");
    }

    session
        .import_state(&saved)
        .with_context(|| format!("Failed to restore {}", path.display()))?;
    info!(state = %path.display(), views = session.views().state().len(), "Session restored");
    Ok(())
}

/// Render every active view to `<output_dir>/<variable>.png`.
fn write_snapshots(session: &mut Session<HeadlessBackend>, output_dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let images = session.views_mut().render_all()?;
    for (variable, image) in &images {
        let path = output_dir.join(format!("{}.png", variable));
        let png = image.to_png()?;
        std::fs::write(&path, &png).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(variable = %variable, path = %path.display(), bytes = png.len(), "Snapshot written");
    }
    Ok(images.len())
}
