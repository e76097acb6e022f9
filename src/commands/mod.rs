//! Command dispatch and handlers.
//!
//! Every handler renders its output to a `String`; [`dispatch`] decides
//! whether that goes to stdout or to a file.

pub mod download;
pub mod export;
pub mod impact;
pub mod list_objects;
pub mod search;
pub mod show_coupling;
pub mod summary;

use std::path::Path;

use crate::cli::{Cli, Command, SourceArgs};
use crate::config::{AnalysisPolicy, Settings};
use crate::context::ServiceContext;
use crate::error::{Result, SleuthError};
use crate::graph::Graph;
use crate::loader::{LoadOptions, LoadedMetadata, MetadataLoader};

/// Settings, policy and ports shared by every command.
pub struct Session {
    /// Environment settings.
    pub settings: Settings,
    /// Analysis thresholds.
    pub policy: AnalysisPolicy,
    /// Port implementations.
    pub ctx: ServiceContext,
}

impl Session {
    /// Builds a live session, reading the policy file at `policy_path` if given.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Config`] for malformed settings or policy and
    /// [`SleuthError::Io`] if the policy file cannot be read.
    pub fn live(policy_path: Option<&Path>) -> Result<Self> {
        let settings = Settings::from_env()?;
        let ctx = ServiceContext::live(&settings)?;
        let policy = match policy_path {
            Some(path) => read_policy(&ctx, path)?,
            None => AnalysisPolicy::default(),
        };
        Ok(Self { settings, policy, ctx })
    }

    /// Loads metadata, blocking on a single-threaded runtime.
    ///
    /// # Errors
    ///
    /// Propagates loader errors and [`SleuthError::Internal`] if the runtime
    /// cannot start.
    pub fn load(&self, options: &LoadOptions) -> Result<LoadedMetadata> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SleuthError::Internal(format!("failed to start runtime: {e}")))?;
        let loaded = runtime.block_on(MetadataLoader::new(&self.ctx, &self.settings).load(options))?;
        tracing::info!(origin = %loaded.origin, "metadata loaded");
        Ok(loaded)
    }

    /// Loads metadata from `source` and builds its graph.
    ///
    /// # Errors
    ///
    /// Propagates loader and graph-builder errors.
    pub fn graph(&self, source: &SourceArgs) -> Result<Graph> {
        Graph::build(self.load(&source.load_options())?.export)
    }

    /// Prints `text` or writes it to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Io`] if the file cannot be written.
    pub fn emit(&self, text: &str, output: Option<&Path>) -> Result<()> {
        match output {
            Some(path) => {
                self.ctx
                    .fs
                    .write(path, text)
                    .map_err(|e| SleuthError::Io(format!("{}: {e}", path.display())))?;
                println!("Written to {}", path.display());
            }
            None => println!("{text}"),
        }
        Ok(())
    }
}

fn read_policy(ctx: &ServiceContext, path: &Path) -> Result<AnalysisPolicy> {
    let text = ctx
        .fs
        .read_to_string(path)
        .map_err(|e| SleuthError::Io(format!("{}: {e}", path.display())))?;
    let policy = AnalysisPolicy::from_yaml_str(&text)?;
    tracing::debug!(path = %path.display(), "loaded analysis policy");
    Ok(policy)
}

/// Dispatch a parsed command line to its handler.
///
/// # Errors
///
/// Returns the first error raised while loading metadata, analyzing it or
/// writing output.
pub fn dispatch(cli: &Cli) -> Result<()> {
    let session = Session::live(cli.policy.as_deref())?;
    dispatch_with_session(&cli.command, &session)
}

/// Dispatch a command against an existing session.
///
/// # Errors
///
/// Returns the first error raised by the handler.
pub fn dispatch_with_session(command: &Command, session: &Session) -> Result<()> {
    match command {
        Command::SearchObject { identifier, no_fields, source } => {
            let text = search::object(session, source, identifier, !*no_fields)?;
            session.emit(&text, None)
        }
        Command::SearchField { identifier, source } => {
            session.emit(&search::field(session, source, identifier)?, None)
        }
        Command::ListObjects { sort_by_rows, source } => {
            session.emit(&list_objects::run(session, source, *sort_by_rows)?, None)
        }
        Command::ShowCoupling { identifier, source } => {
            session.emit(&show_coupling::run(session, source, identifier)?, None)
        }
        Command::DownloadMetadata { output, app_id, refresh } => {
            let message = download::run(session, app_id.as_deref(), output.as_deref(), *refresh)?;
            session.emit(&message, None)
        }
        Command::ImpactAnalysis { identifier, format, output, source } => {
            let text = impact::run(session, source, identifier, *format)?;
            session.emit(&text, output.as_deref())
        }
        Command::AppSummary { format, output, source } => {
            session.emit(&summary::run(session, source, *format)?, output.as_deref())
        }
        Command::ExportSchema { format, output, source } => {
            session.emit(&export::run(session, source, (*format).into())?, output.as_deref())
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use super::Session;
    use crate::adapters::live::clock::SystemClock;
    use crate::adapters::live::filesystem::DiskFileSystem;
    use crate::adapters::live::metadata::HttpMetadataApi;
    use crate::cli::SourceArgs;
    use crate::config::{AnalysisPolicy, Settings};
    use crate::context::ServiceContext;

    /// A session reading from disk whose API points nowhere.
    pub(crate) fn session() -> Session {
        let settings = Settings::default();
        Session {
            ctx: ServiceContext {
                clock: Box::new(SystemClock),
                fs: Box::new(DiskFileSystem),
                api: Box::new(HttpMetadataApi::new("http://127.0.0.1:9", None).unwrap()),
            },
            settings,
            policy: AnalysisPolicy::default(),
        }
    }

    /// Source arguments naming the bundled sample export.
    pub(crate) fn sample_source() -> SourceArgs {
        SourceArgs {
            file: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_app.json")),
            ..SourceArgs::default()
        }
    }
}
