use crate::Result;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Create a directory and any missing parents.
pub(crate) async fn make_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Unable to create directory at {}", path.to_string_lossy()))
}

pub(crate) async fn canonicalize(path: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", path.to_string_lossy()))
}

/// Eight random hex characters.
fn random_suffix() -> String {
    let mut s = Uuid::new_v4().simple().to_string();
    s.truncate(8);
    s
}

/// A new inventory item id, e.g. `item-1760700000000-9f1c2b3a`. Unique in practice, not by
/// construction.
pub(crate) fn generate_item_id(now: DateTime<Utc>) -> String {
    format!("item-{}-{}", now.timestamp_millis(), random_suffix())
}

/// Identifies one run of the importer. Transaction ids for the run are derived from it.
pub(crate) fn generate_batch_id(now: DateTime<Utc>) -> String {
    format!("{}-{}", now.timestamp_millis(), random_suffix())
}

/// A new id for a checkout transaction.
pub(crate) fn generate_checkout_id(now: DateTime<Utc>) -> String {
    format!("checkout-{}-{}", now.timestamp_millis(), random_suffix())
}

/// Formats a timestamp for storage. Fixed precision and a `Z` suffix keep stored timestamps
/// ordered when compared as text.
pub(crate) fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The instant `days` days before `now`. Errors when that falls outside the range chrono can
/// represent, which a large `--days` or checkout limit can reach.
pub(crate) fn days_before(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|delta| now.checked_sub_signed(delta))
        .with_context(|| format!("A window of {days} days reaches too far into the past"))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_item_id() {
        let now = Utc::now();
        let a = generate_item_id(now);
        let b = generate_item_id(now);
        assert!(a.starts_with(&format!("item-{}-", now.timestamp_millis())));
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamp_round_trip() {
        let now = Utc::now();
        let s = timestamp(now);
        assert!(s.ends_with('Z'));
        let parsed = parse_timestamp(&s).unwrap();
        assert_eq!(timestamp(parsed), s);
    }

    #[test]
    fn test_days_before() {
        let now = Utc::now();
        assert_eq!(days_before(now, 0).unwrap(), now);
        assert_eq!(days_before(now, 7).unwrap(), now - TimeDelta::days(7));
        let err = days_before(now, u32::MAX).unwrap_err();
        assert!(err.to_string().contains("too far into the past"));
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a").join("b.txt");
        make_dir(path.parent().unwrap()).await.unwrap();
        write(&path, "hello").await.unwrap();
        assert_eq!(read(&path).await.unwrap(), "hello");
    }
}
