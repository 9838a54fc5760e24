//! Cavelabel: bounding-box labelling and dataset checks for YOLO training.
//!
//! Cavelabel builds the `images/<split>` + `labels/<split>` directory pair a
//! YOLO trainer consumes. A human draws boxes on each image through an
//! interactive loop; boxes are stored one label file per image as
//! `class_id cx cy w h` with normalized coordinates. Before training, the
//! consistency check confirms every image has exactly one well-formed label
//! file and no label file is orphaned.
//!
//! # Modules
//!
//! - [`geom`]: pixel and normalized boxes, and the codec between them
//! - [`store`]: reading and atomically writing label files
//! - [`session`]: labelling state for one image, with undo/redo
//! - [`check`]: images/labels consistency checking
//! - [`controller`]: the interactive loop across an image list
//! - [`config`]: class list and dataset layout
//! - [`error`]: error types for cavelabel operations

pub mod check;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod geom;
pub mod session;
pub mod store;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use config::{ClassList, DatasetLayout, DEFAULT_SPLIT};
use controller::Controller;
pub use error::LabelError;

/// The cavelabel CLI application.
#[derive(Parser)]
#[command(name = "cavelabel")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Draw bounding boxes on a split's images, one image at a time.
    Label(LabelArgs),
    /// Check that images and label files pair up and parse.
    Check(CheckArgs),
}

/// Dataset selection shared by every subcommand.
#[derive(clap::Args)]
struct DatasetArgs {
    /// Dataset root containing images/ and labels/.
    dataset: PathBuf,

    /// Split directory under images/ and labels/.
    #[arg(long, default_value = DEFAULT_SPLIT)]
    split: String,

    /// Class file (data.yaml style YAML, or one name per line).
    /// Defaults to <dataset>/data.yaml, then <dataset>/classes.txt.
    #[arg(long, env = "CAVELABEL_CLASSES")]
    classes: Option<PathBuf>,
}

impl DatasetArgs {
    fn load(&self) -> Result<(DatasetLayout, Arc<ClassList>), LabelError> {
        let classes = ClassList::discover(&self.dataset, self.classes.as_deref())?;
        let layout = DatasetLayout::new(&self.dataset, &self.split);
        Ok((layout, Arc::new(classes)))
    }
}

/// Arguments for the label subcommand.
#[derive(clap::Args)]
struct LabelArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// 1-based number of the image to open first.
    #[arg(long, default_value_t = 1)]
    start: usize,
}

/// Arguments for the check subcommand.
#[derive(clap::Args)]
struct CheckArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the cavelabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Label(args)) => run_label(args),
        Some(Commands::Check(args)) => run_check(args),
        None => {
            println!("cavelabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Bounding-box labelling and dataset checks for YOLO training.");
            println!();
            println!("Run 'cavelabel --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the label subcommand.
fn run_label(args: LabelArgs) -> Result<(), LabelError> {
    let (layout, classes) = args.dataset.load()?;
    let mut controller = Controller::from_layout(&layout, classes)?;

    let start = args.start.saturating_sub(1);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let summary = controller.run(start, stdin.lock(), stdout.lock())?;

    log::info!(
        "labelling finished: {} label file(s) written{}",
        summary.commits,
        if summary.discarded_changes {
            ", unsaved edits discarded"
        } else {
            ""
        }
    );
    Ok(())
}

/// Execute the check subcommand.
fn run_check(args: CheckArgs) -> Result<(), LabelError> {
    let (layout, classes) = args.dataset.load()?;
    let report = check::check(&layout.images_dir(), &layout.labels_dir(), classes.len())?;

    match args.output {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print!("{}", report),
    }

    if report.is_consistent() {
        Ok(())
    } else {
        Err(LabelError::CheckFailed { report })
    }
}
