//! `knack-sleuth download-metadata` command.

use std::path::{Path, PathBuf};

use super::Session;
use crate::error::{Result, SleuthError};
use crate::loader::{LoadOptions, MetadataLoader, MetadataOrigin};

/// Fetches metadata (from cache or API) and saves the raw document.
///
/// Writes to `output`, or `<app_id>_metadata.json` in the working directory.
/// Returns a one-line confirmation.
///
/// # Errors
///
/// Returns [`SleuthError::Config`] if no application id is available,
/// loader errors, and [`SleuthError::Io`] if the file cannot be written.
pub fn run(
    session: &Session,
    app_id: Option<&str>,
    output: Option<&Path>,
    refresh: bool,
) -> Result<String> {
    let options =
        LoadOptions { file: None, app_id: app_id.map(str::to_string), refresh, no_cache: false };
    let app_id = MetadataLoader::new(&session.ctx, &session.settings).app_id(&options)?;
    let loaded = session.load(&options)?;

    let path = output.map_or_else(|| PathBuf::from(format!("{app_id}_metadata.json")), Path::to_path_buf);
    let text = serde_json::to_string_pretty(&loaded.raw)?;
    session
        .ctx
        .fs
        .write(&path, &text)
        .map_err(|e| SleuthError::Io(format!("{}: {e}", path.display())))?;

    let source = match &loaded.origin {
        MetadataOrigin::Cache { .. } => "cache",
        _ => "API",
    };
    Ok(format!(
        "Saved metadata for {} ({} objects, {} scenes) from {source} to {}",
        loaded.export.application.name,
        loaded.export.application.objects.len(),
        loaded.export.application.scenes.len(),
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::session;

    #[test]
    fn requires_an_app_id() {
        let err = run(&session(), None, None, false).unwrap_err();
        assert!(matches!(err, SleuthError::Config(_)));
    }

    #[test]
    fn copies_fresh_cache_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M");
        let sample = std::fs::read_to_string(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_app.json"),
        )
        .unwrap();
        std::fs::write(dir.path().join(format!("app_1_app_metadata_{stamp}.json")), sample).unwrap();

        let mut session = session();
        session.settings.cache_dir = dir.path().to_path_buf();
        let output = dir.path().join("saved.json");
        let message = run(&session, Some("app_1"), Some(&output), false).unwrap();

        assert!(message.contains("from cache"));
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(saved["application"]["id"], "app_tracker_01");
    }
}
