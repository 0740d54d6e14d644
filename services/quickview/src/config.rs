//! Service configuration: command line, environment and session file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use pipeline::PipelineConfig;
use view_manager::ViewDefaults;

#[derive(Parser, Debug)]
#[command(name = "quickview")]
#[command(about = "Render EAM atmosphere variables on cubed-sphere grids to PNG")]
pub struct Args {
    /// Connectivity (SCRIP) file
    #[arg(short, long, env = "QUICKVIEW_CONN_FILE")]
    pub conn: Option<PathBuf>,

    /// EAM data file
    #[arg(short, long, env = "QUICKVIEW_DATA_FILE")]
    pub data: Option<PathBuf>,

    /// Saved session state to restore
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Directory relative paths are resolved against
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Use the built-in synthetic dataset instead of files
    #[arg(long)]
    pub demo: bool,

    /// YAML session file with output and rendering settings
    #[arg(long, env = "QUICKVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where snapshots and the exported state are written
    #[arg(long, env = "QUICKVIEW_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated variables to show (default: first surface variable)
    #[arg(long, value_delimiter = ',')]
    pub variables: Vec<String>,

    /// Map projection
    #[arg(long)]
    pub projection: Option<String>,

    /// Timestep index
    #[arg(long)]
    pub time: Option<usize>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format: json or text
    #[arg(long, default_value = "text")]
    pub log_format: String,
}

impl Args {
    /// Resolve `path` against the working directory unless absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }
}

/// Snapshot size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSize {
    pub width: usize,
    pub height: usize,
}

/// Settings read from the YAML session file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFile {
    pub output_dir: Option<PathBuf>,
    pub snapshot: Option<SnapshotSize>,
    /// ParaView JSON colormap preset files
    pub preset_files: Vec<PathBuf>,
    pub globe_mode: bool,
    pub pipeline: Option<PipelineConfig>,
    pub views: Option<ViewDefaults>,
}

/// Load a YAML session file.
pub fn load_session_file<P: AsRef<Path>>(path: P) -> Result<SessionFile> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read session file {:?}", path.as_ref()))?;
    let file: SessionFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse session file {:?}", path.as_ref()))?;
    Ok(file)
}

/// Effective configuration after environment, session file and flags.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub output_dir: PathBuf,
    pub preset_files: Vec<PathBuf>,
    pub globe_mode: bool,
    pub pipeline: PipelineConfig,
    pub views: ViewDefaults,
}

impl ServiceConfig {
    pub fn build(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => load_session_file(args.resolve(path))?,
            None => SessionFile::default(),
        };

        let mut pipeline = file.pipeline.unwrap_or_else(PipelineConfig::from_env);
        if let Some(projection) = &args.projection {
            pipeline.default_projection = projection.clone();
        }
        if let Some(coastlines) = &pipeline.coastline_file {
            pipeline.coastline_file = Some(args.resolve(coastlines));
        }
        pipeline.validate().map_err(anyhow::Error::msg).context("Invalid pipeline configuration")?;

        let mut views = file.views.unwrap_or_else(ViewDefaults::from_env);
        if let Some(size) = file.snapshot {
            views.viewport_width = size.width;
            views.viewport_height = size.height;
        }
        views.validate().map_err(anyhow::Error::msg).context("Invalid view configuration")?;

        let output_dir = args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from("quickview-output"));

        Ok(Self {
            output_dir: args.resolve(&output_dir),
            preset_files: file.preset_files.iter().map(|p| args.resolve(p)).collect(),
            globe_mode: file.globe_mode,
            pipeline,
            views,
        })
    }
}
