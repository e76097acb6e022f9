//! Download cache naming and freshness.
//!
//! Cache files live flat in one directory and are named
//! `<app_id>_app_metadata_<YYYYMMDDHHMM>.json`, the timestamp being the UTC
//! minute of the download.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::ports::filesystem::FileSystem;

const STAMP_FORMAT: &str = "%Y%m%d%H%M";

/// A cache file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Full path of the file.
    pub path: PathBuf,
    /// When the metadata was downloaded.
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Age of the entry relative to `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    /// Whether the entry is younger than `ttl_hours`.
    ///
    /// A lifetime too large to represent never expires.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_hours: i64) -> bool {
        Duration::try_hours(ttl_hours).is_none_or(|ttl| self.age(now) < ttl)
    }
}

/// File name for a download of `app_id` made at `at`.
#[must_use]
pub fn file_name(app_id: &str, at: DateTime<Utc>) -> String {
    format!("{app_id}_app_metadata_{}.json", at.format(STAMP_FORMAT))
}

/// Download time encoded in `name`, if it is a cache file of `app_id`.
#[must_use]
pub fn parse_file_name(app_id: &str, name: &str) -> Option<DateTime<Utc>> {
    let stamp = name
        .strip_prefix(app_id)?
        .strip_prefix("_app_metadata_")?
        .strip_suffix(".json")?;
    if stamp.len() != 12 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok().map(|naive| naive.and_utc())
}

/// The most recent cache file of `app_id` in `dir`.
///
/// A missing or unreadable directory yields `None`.
pub fn newest(fs: &dyn FileSystem, dir: &Path, app_id: &str) -> Option<CacheEntry> {
    let names = match fs.list_dir(dir) {
        Ok(names) => names,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "cache directory not readable");
            return None;
        }
    };
    names
        .iter()
        .filter_map(|name| {
            parse_file_name(app_id, name)
                .map(|fetched_at| CacheEntry { path: dir.join(name), fetched_at })
        })
        .max_by_key(|entry| entry.fetched_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn name_encodes_utc_minute() {
        assert_eq!(file_name("abc", at(2024, 3, 5, 7, 9)), "abc_app_metadata_202403050709.json");
        assert_eq!(
            parse_file_name("abc", "abc_app_metadata_202403050709.json"),
            Some(at(2024, 3, 5, 7, 9))
        );
    }

    #[test]
    fn foreign_and_malformed_names_are_ignored() {
        assert_eq!(parse_file_name("abc", "xyz_app_metadata_202403050709.json"), None);
        assert_eq!(parse_file_name("abc", "abc_app_metadata_2024030507.json"), None);
        assert_eq!(parse_file_name("abc", "abc_app_metadata_20240305070x.json"), None);
        assert_eq!(parse_file_name("abc", "abc_app_metadata_202413050709.json"), None);
        assert_eq!(parse_file_name("abc", "abc_metadata.json"), None);
    }

    #[test]
    fn freshness_is_strict() {
        let entry = CacheEntry { path: PathBuf::from("x"), fetched_at: at(2024, 1, 1, 0, 0) };
        assert!(entry.is_fresh(at(2024, 1, 1, 23, 59), 24));
        assert!(!entry.is_fresh(at(2024, 1, 2, 0, 0), 24));
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let entry = CacheEntry { path: PathBuf::from("x"), fetched_at: at(2024, 1, 1, 0, 0) };
        assert!(entry.is_fresh(at(2030, 1, 1, 0, 0), i64::MAX));
        assert!(entry.is_fresh(at(2030, 1, 1, 0, 0), crate::config::MAX_CACHE_TTL_HOURS));
        assert!(!entry.is_fresh(at(2024, 1, 1, 0, 0), 0));
    }

    #[test]
    fn newest_picks_latest_stamp() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "app1_app_metadata_202401010000.json",
            "app1_app_metadata_202401020000.json",
            "app2_app_metadata_202401030000.json",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        let fs = crate::adapters::live::filesystem::DiskFileSystem;
        let entry = newest(&fs, dir.path(), "app1").unwrap();
        assert_eq!(entry.path, dir.path().join("app1_app_metadata_202401020000.json"));
        assert!(newest(&fs, &dir.path().join("missing"), "app1").is_none());
    }
}
