//! vigil command line host.
//!
//! `vigil check` analyzes the given paths (or every project) once and prints
//! the resulting annotations. `vigil watch` keeps running and analyzes
//! changes as they land on disk.

mod engine;
mod watch;
mod workspace;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use vigil_annotations::{AnnotationRecord, AnnotationSeverity, AnnotationStore};
use vigil_config::{ConfigStore, TomlConfigStore};
use vigil_primitives::{ProjectId, Resource, ResourceTree, Scope};
use vigil_review::{ReviewContext, ReviewObserver, ReviewService, TaskSummary};
use vigil_worker::JobScheduler;

use crate::engine::CommandEngine;
use crate::workspace::{FsResourceTree, discover_projects, resource_for_path};

/// vigil command line arguments.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Incremental static analysis for a workspace of projects")]
struct Args {
	/// Workspace root; defaults to the current directory
	#[arg(short, long, value_name = "PATH", global = true)]
	workspace: Option<PathBuf>,

	/// Analyzer program speaking the JSON-lines protocol
	#[arg(long, value_name = "PROGRAM", default_value = "vigil-analyzer", global = true)]
	engine: String,

	/// Extra argument passed to the analyzer before the file list
	#[arg(long = "engine-arg", value_name = "ARG", global = true, allow_hyphen_values = true)]
	engine_args: Vec<String>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Analyze paths once and print annotations
	Check {
		/// Projects, folders or files to analyze; every project when empty
		paths: Vec<PathBuf>,
	},
	/// Analyze changes as they happen until interrupted
	Watch {
		/// Quiet period before a batch of changes is analyzed
		#[arg(long, value_name = "MS", default_value_t = 500)]
		debounce_ms: u64,
	},
}

/// Logs job progress and summaries.
struct LogObserver;

impl ReviewObserver for LogObserver {
	fn on_progress(&self, project: &ProjectId, total: usize, completed: usize) {
		tracing::debug!(project = %project, total, completed, "cli.progress");
	}

	fn on_task_summary(&self, summary: &TaskSummary) {
		info!(
			project = %summary.project,
			files = summary.files,
			annotations = summary.annotations,
			processing_errors = summary.processing_errors,
			cancelled = summary.cancelled,
			failed = summary.failed,
			duration_ms = summary.duration.as_millis() as u64,
			"cli.task_finished"
		);
	}
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	let root = match args.workspace {
		Some(root) => root,
		None => std::env::current_dir().context("resolving current directory")?,
	};
	let root = root.canonicalize().with_context(|| format!("opening workspace {}", root.display()))?;
	info!(root = %root.display(), "starting vigil");

	let config = Arc::new(TomlConfigStore::open(&root).context("loading workspace preferences")?);
	let tree = Arc::new(FsResourceTree::new(&root, Arc::clone(&config) as Arc<dyn ConfigStore>));
	let engine = Arc::new(CommandEngine::new(args.engine, args.engine_args, &root));
	let preferences = config.preferences();
	let service = Arc::new(
		ReviewService::new(ReviewContext {
			config: Arc::clone(&config) as Arc<dyn ConfigStore>,
			tree: Arc::clone(&tree) as Arc<dyn ResourceTree>,
			engine,
			store: Arc::new(AnnotationStore::new()),
			scheduler: JobScheduler::new(preferences.max_concurrency),
		})
		.with_observer(Arc::new(LogObserver)),
	);

	match args.command {
		Command::Check { paths } => check(&service, &root, &paths).await,
		Command::Watch { debounce_ms } => {
			watch_workspace(service, config, tree, Duration::from_millis(debounce_ms)).await?;
			Ok(ExitCode::SUCCESS)
		}
	}
}

async fn check(service: &ReviewService, root: &Path, paths: &[PathBuf]) -> Result<ExitCode> {
	let resources: Vec<Resource> = if paths.is_empty() {
		discover_projects(root)?.into_iter().map(Resource::project).collect()
	} else {
		paths.iter().map(|path| resource_for_path(root, path)).collect::<Result<_>>()?
	};
	if resources.is_empty() {
		bail!("no projects found under {}", root.display());
	}

	let report = service.trigger(&Scope::Resources(resources), true)?;
	service.await_idle().await;

	let store = service.store();
	for path in store.files() {
		for record in store.get(&path).iter() {
			println!("{}", format_record(record));
		}
	}
	for skipped in &report.skipped {
		eprintln!("{}: skipped, {} files exceed the incremental limit of {}", skipped.project, skipped.file_count, skipped.max_incremental_count);
	}

	let errors = store.error_count();
	eprintln!("{} errors, {} warnings", errors, store.warning_count());
	Ok(if errors > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

async fn watch_workspace(service: Arc<ReviewService>, config: Arc<TomlConfigStore>, tree: Arc<FsResourceTree>, debounce: Duration) -> Result<()> {
	let stop = CancellationToken::new();
	let watcher = tokio::task::spawn_blocking({
		let stop = stop.clone();
		let service = Arc::clone(&service);
		move || watch::run(service, config, tree, debounce, stop)
	});

	tokio::select! {
		result = tokio::signal::ctrl_c() => result.context("listening for interrupt")?,
		_ = stop.cancelled() => {}
	}
	info!("shutting down");
	stop.cancel();
	service.scheduler().shutdown();
	service.await_idle().await;
	watcher.await.context("watch thread panicked")?
}

fn format_record(record: &AnnotationRecord) -> String {
	let severity = match record.severity {
		AnnotationSeverity::Error => "error",
		AnnotationSeverity::Warning => "warning",
		AnnotationSeverity::Info => "info",
	};
	let attributes = &record.attributes;
	format!("{}:{}: {} [{}] {}", record.path.display(), attributes.line, severity, attributes.rule, attributes.message)
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("VIGIL_LOG").unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("vigil=debug,info")
		} else {
			EnvFilter::new("warn,vigil=info")
		}
	});
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
