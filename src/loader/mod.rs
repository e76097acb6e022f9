//! Metadata acquisition from a local file, the download cache or the API.

pub mod cache;

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::error::{Result, SleuthError};
use crate::model::AppExport;

/// Where to get metadata from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// A local export file; takes precedence over everything else.
    pub file: Option<PathBuf>,
    /// Application id overriding `KNACK_APP_ID`.
    pub app_id: Option<String>,
    /// Skip the cache lookup but still write a new cache file.
    pub refresh: bool,
    /// Neither read nor write the cache.
    pub no_cache: bool,
}

/// Where loaded metadata came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOrigin {
    /// Read from a file named on the command line.
    File(PathBuf),
    /// Read from a cache file.
    Cache {
        /// The cache file.
        path: PathBuf,
        /// Age of the download in minutes.
        age_minutes: i64,
    },
    /// Downloaded from the API.
    Api {
        /// The application id.
        app_id: String,
        /// The cache file written, if any.
        cached_to: Option<PathBuf>,
    },
}

impl fmt::Display for MetadataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Cache { path, age_minutes } => {
                #[allow(clippy::cast_precision_loss)]
                let hours = *age_minutes as f64 / 60.0;
                write!(f, "cache {} (age: {hours:.1}h)", path.display())
            }
            Self::Api { app_id, .. } => write!(f, "API (application {app_id})"),
        }
    }
}

/// A parsed export together with its raw document.
#[derive(Debug, Clone)]
pub struct LoadedMetadata {
    /// Typed export.
    pub export: AppExport,
    /// The document exactly as read or downloaded.
    pub raw: Value,
    /// Source of the document.
    pub origin: MetadataOrigin,
}

/// Resolves [`LoadOptions`] against the configured ports.
pub struct MetadataLoader<'a> {
    ctx: &'a ServiceContext,
    settings: &'a Settings,
}

impl<'a> MetadataLoader<'a> {
    /// Creates a loader over `ctx` configured by `settings`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, settings: &'a Settings) -> Self {
        Self { ctx, settings }
    }

    /// Loads metadata as directed by `options`.
    ///
    /// # Errors
    ///
    /// - [`SleuthError::NotFound`] if the named file does not exist.
    /// - [`SleuthError::Config`] if neither a file nor an application id is available.
    /// - [`SleuthError::Fetch`] if the download fails.
    /// - [`SleuthError::Validation`] if the document does not parse as an export.
    pub async fn load(&self, options: &LoadOptions) -> Result<LoadedMetadata> {
        if let Some(path) = &options.file {
            return self.load_file(path);
        }

        let app_id = self.app_id(options)?;
        if !options.refresh && !options.no_cache {
            if let Some(loaded) = self.load_cached(&app_id) {
                return Ok(loaded);
            }
        }
        self.download(&app_id, !options.no_cache).await
    }

    /// The application id from `options`, else from settings.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Config`] if neither provides one.
    pub fn app_id(&self, options: &LoadOptions) -> Result<String> {
        options
            .app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| self.settings.app_id.clone())
            .ok_or_else(|| {
                SleuthError::Config(
                    "an application id is required; pass FILE, --app-id or set KNACK_APP_ID".into(),
                )
            })
    }

    fn load_file(&self, path: &Path) -> Result<LoadedMetadata> {
        if !self.ctx.fs.exists(path) {
            return Err(SleuthError::NotFound(format!("file {}", path.display())));
        }
        let text = self.ctx.fs.read_to_string(path).map_err(|e| SleuthError::Io(e.to_string()))?;
        let (export, raw) = parse(&text)?;
        tracing::info!(path = %path.display(), "loaded metadata from file");
        Ok(LoadedMetadata { export, raw, origin: MetadataOrigin::File(path.to_path_buf()) })
    }

    fn load_cached(&self, app_id: &str) -> Option<LoadedMetadata> {
        let now = self.ctx.clock.now();
        let entry = cache::newest(self.ctx.fs.as_ref(), &self.settings.cache_dir, app_id)?;
        if !entry.is_fresh(now, self.settings.cache_ttl_hours) {
            tracing::info!(path = %entry.path.display(), "cache expired");
            return None;
        }

        let parsed = self
            .ctx
            .fs
            .read_to_string(&entry.path)
            .map_err(|e| SleuthError::Io(e.to_string()))
            .and_then(|text| parse(&text));
        match parsed {
            Ok((export, raw)) => {
                let age_minutes = entry.age(now).num_minutes();
                tracing::info!(path = %entry.path.display(), age_minutes, "using cached metadata");
                Some(LoadedMetadata {
                    export,
                    raw,
                    origin: MetadataOrigin::Cache { path: entry.path, age_minutes },
                })
            }
            Err(e) => {
                tracing::warn!(path = %entry.path.display(), error = %e, "unreadable cache; fetching from API");
                None
            }
        }
    }

    async fn download(&self, app_id: &str, write_cache: bool) -> Result<LoadedMetadata> {
        tracing::info!(app_id, "fetching metadata from API");
        let body = self
            .ctx
            .api
            .fetch_application(app_id)
            .await
            .map_err(|e| SleuthError::Fetch(e.to_string()))?;
        let (export, raw) = parse(&body)?;

        let cached_to = if write_cache { self.write_cache(app_id, &raw) } else { None };
        Ok(LoadedMetadata {
            export,
            raw,
            origin: MetadataOrigin::Api { app_id: app_id.to_string(), cached_to },
        })
    }

    fn write_cache(&self, app_id: &str, raw: &Value) -> Option<PathBuf> {
        let path = self.settings.cache_dir.join(cache::file_name(app_id, self.ctx.clock.now()));
        let written = serde_json::to_string_pretty(raw)
            .map_err(|e| e.to_string())
            .and_then(|text| self.ctx.fs.write(&path, &text).map_err(|e| e.to_string()));
        match written {
            Ok(()) => {
                tracing::info!(path = %path.display(), "cached metadata");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to write cache");
                None
            }
        }
    }
}

fn parse(text: &str) -> Result<(AppExport, Value)> {
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| SleuthError::Validation(format!("not valid JSON: {e}")))?;
    let export = AppExport::from_value(raw.clone())?;
    Ok((export, raw))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::model::fixtures::SAMPLE_APP_JSON;
    use crate::ports::clock::Clock;
    use crate::ports::filesystem::FileSystem;
    use crate::ports::metadata::{FetchFuture, MetadataApi};
    use crate::ports::{PortError, PortResult};

    /// In-memory filesystem shared between the test and the loader.
    #[derive(Clone, Default)]
    struct MemFs {
        files: Arc<Mutex<HashMap<PathBuf, String>>>,
    }

    impl MemFs {
        fn insert(&self, path: &str, contents: &str) {
            self.files.lock().unwrap().insert(PathBuf::from(path), contents.to_string());
        }

        fn paths(&self) -> Vec<PathBuf> {
            let mut paths: Vec<PathBuf> = self.files.lock().unwrap().keys().cloned().collect();
            paths.sort();
            paths
        }
    }

    impl FileSystem for MemFs {
        fn read_to_string(&self, path: &Path) -> PortResult<String> {
            let files = self.files.lock().unwrap();
            files.get(path).cloned().ok_or_else(|| format!("File not found: {}", path.display()).into())
        }

        fn write(&self, path: &Path, contents: &str) -> PortResult<()> {
            self.files.lock().unwrap().insert(path.to_path_buf(), contents.to_string());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn list_dir(&self, path: &Path) -> PortResult<Vec<String>> {
            let files = self.files.lock().unwrap();
            let mut names: Vec<String> = files
                .keys()
                .filter(|k| k.parent() == Some(path))
                .filter_map(|k| k.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect();
            names.sort();
            Ok(names)
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Serves a canned body and counts calls.
    #[derive(Clone)]
    struct FakeApi {
        response: std::result::Result<String, String>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeApi {
        fn ok(body: &str) -> Self {
            Self { response: Ok(body.to_string()), calls: Arc::default() }
        }

        fn failing(message: &str) -> Self {
            Self { response: Err(message.to_string()), calls: Arc::default() }
        }
    }

    impl MetadataApi for FakeApi {
        fn fetch_application(&self, _app_id: &str) -> FetchFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.response.clone();
            Box::pin(async move {
                response.map_err(PortError::from)
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn context(fs: &MemFs, api: &FakeApi) -> ServiceContext {
        ServiceContext {
            clock: Box::new(FixedClock(now())),
            fs: Box::new(fs.clone()),
            api: Box::new(api.clone()),
        }
    }

    fn settings() -> Settings {
        Settings {
            app_id: Some("app_tracker_01".into()),
            cache_dir: PathBuf::from("/cache"),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn file_takes_precedence() {
        let fs = MemFs::default();
        fs.insert("/data/app.json", SAMPLE_APP_JSON);
        let api = FakeApi::ok("{}");
        let ctx = context(&fs, &api);
        let settings = settings();
        let options = LoadOptions { file: Some("/data/app.json".into()), ..LoadOptions::default() };

        let loaded = MetadataLoader::new(&ctx, &settings).load(&options).await.unwrap();
        assert_eq!(loaded.export.application.name, "Project Tracker");
        assert_eq!(loaded.origin, MetadataOrigin::File("/data/app.json".into()));
        assert_eq!(loaded.raw["application"]["id"], "app_tracker_01");
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let fs = MemFs::default();
        let ctx = context(&fs, &FakeApi::ok("{}"));
        let settings = settings();
        let options = LoadOptions { file: Some("/nope.json".into()), ..LoadOptions::default() };

        let err = MetadataLoader::new(&ctx, &settings).load(&options).await.unwrap_err();
        assert!(matches!(err, SleuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn no_app_id_is_a_config_error() {
        let fs = MemFs::default();
        let ctx = context(&fs, &FakeApi::ok("{}"));
        let settings = Settings::default();

        let err = MetadataLoader::new(&ctx, &settings).load(&LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, SleuthError::Config(_)));
    }

    #[tokio::test]
    async fn download_writes_cache_named_by_clock() {
        let fs = MemFs::default();
        let api = FakeApi::ok(SAMPLE_APP_JSON);
        let ctx = context(&fs, &api);
        let settings = settings();

        let loaded = MetadataLoader::new(&ctx, &settings).load(&LoadOptions::default()).await.unwrap();
        let expected = PathBuf::from("/cache/app_tracker_01_app_metadata_202406151200.json");
        assert_eq!(
            loaded.origin,
            MetadataOrigin::Api { app_id: "app_tracker_01".into(), cached_to: Some(expected.clone()) }
        );
        assert_eq!(fs.paths(), vec![expected]);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fresh_cache_skips_the_api() {
        let fs = MemFs::default();
        fs.insert("/cache/app_tracker_01_app_metadata_202406150100.json", SAMPLE_APP_JSON);
        let api = FakeApi::failing("should not be called");
        let ctx = context(&fs, &api);
        let settings = settings();

        let loaded = MetadataLoader::new(&ctx, &settings).load(&LoadOptions::default()).await.unwrap();
        assert!(matches!(loaded.origin, MetadataOrigin::Cache { age_minutes: 660, .. }));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_cache_and_refresh_go_to_the_api() {
        let fs = MemFs::default();
        fs.insert("/cache/app_tracker_01_app_metadata_202406131200.json", SAMPLE_APP_JSON);
        let api = FakeApi::ok(SAMPLE_APP_JSON);
        let ctx = context(&fs, &api);
        let settings = settings();
        let loader = MetadataLoader::new(&ctx, &settings);

        let loaded = loader.load(&LoadOptions::default()).await.unwrap();
        assert!(matches!(loaded.origin, MetadataOrigin::Api { .. }));

        // The download above is now the newest and fresh; refresh still bypasses it.
        let refresh = LoadOptions { refresh: true, ..LoadOptions::default() };
        loader.load(&refresh).await.unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn corrupt_cache_falls_through() {
        let fs = MemFs::default();
        fs.insert("/cache/app_tracker_01_app_metadata_202406151100.json", "{not json");
        let api = FakeApi::ok(SAMPLE_APP_JSON);
        let ctx = context(&fs, &api);
        let settings = settings();

        let loaded = MetadataLoader::new(&ctx, &settings).load(&LoadOptions::default()).await.unwrap();
        assert!(matches!(loaded.origin, MetadataOrigin::Api { .. }));
    }

    #[tokio::test]
    async fn no_cache_neither_reads_nor_writes() {
        let fs = MemFs::default();
        fs.insert("/cache/app_tracker_01_app_metadata_202406151100.json", SAMPLE_APP_JSON);
        let api = FakeApi::ok(SAMPLE_APP_JSON);
        let ctx = context(&fs, &api);
        let settings = settings();
        let options = LoadOptions { no_cache: true, ..LoadOptions::default() };

        let loaded = MetadataLoader::new(&ctx, &settings).load(&options).await.unwrap();
        assert_eq!(
            loaded.origin,
            MetadataOrigin::Api { app_id: "app_tracker_01".into(), cached_to: None }
        );
        assert_eq!(fs.paths().len(), 1);
    }

    #[tokio::test]
    async fn api_failure_is_a_fetch_error() {
        let fs = MemFs::default();
        let ctx = context(&fs, &FakeApi::failing("503 Service Unavailable"));
        let settings = settings();

        let err = MetadataLoader::new(&ctx, &settings).load(&LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, SleuthError::Fetch(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn invalid_document_is_a_validation_error() {
        let fs = MemFs::default();
        fs.insert("/bad.json", r#"{"app": {}}"#);
        let ctx = context(&fs, &FakeApi::ok("{}"));
        let settings = settings();
        let options = LoadOptions { file: Some("/bad.json".into()), ..LoadOptions::default() };

        let err = MetadataLoader::new(&ctx, &settings).load(&options).await.unwrap_err();
        assert!(matches!(err, SleuthError::Validation(_)));
    }

    #[test]
    fn explicit_app_id_overrides_settings() {
        let fs = MemFs::default();
        let ctx = context(&fs, &FakeApi::ok("{}"));
        let settings = settings();
        let loader = MetadataLoader::new(&ctx, &settings);
        let options = LoadOptions { app_id: Some("other".into()), ..LoadOptions::default() };
        assert_eq!(loader.app_id(&options).unwrap(), "other");
        assert_eq!(loader.app_id(&LoadOptions::default()).unwrap(), "app_tracker_01");
    }
}
