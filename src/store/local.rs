//! # Local Filesystem Version Store
//!
//! A directory-backed versioned bucket. Layout under `root`:
//!
//! ```text
//! <bucket>/bucket.json              provisioning record
//! <bucket>/history.jsonl            one version or delete marker per line
//! <bucket>/blobs/<version_id>       content of each version
//! <bucket>/thaws/<version_id>.json  thaw requests for cold versions
//! ```
//!
//! History lines are appended in arrival order, which is not necessarily
//! timestamp order. A cold version becomes readable as soon as a thaw record
//! exists for it.
//!
//! The source history is parsed once per handle and kept as an index;
//! appends made through the handle drop it. Writers using another handle
//! are not seen until the next append through this one.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::backend::{EventSource, RecoverySink, TierProbe};
use super::errors::{StoreError, StoreResult};
use super::event::{Cursor, EventPage, StorageTier, TierStatus, VersionEvent, MAX_PAGE_SIZE};
use super::target::{Destination, ThawOptions, ThawTier};

const HISTORY_FILE: &str = "history.jsonl";
const BUCKET_FILE: &str = "bucket.json";
const BLOBS_DIR: &str = "blobs";
const THAWS_DIR: &str = "thaws";

/// One line of `history.jsonl`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryRecord {
    #[serde(flatten)]
    event: VersionEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    etag: Option<String>,
}

/// Parsed source history, in file order
#[derive(Debug, Default)]
struct HistoryIndex {
    records: Vec<HistoryRecord>,
    by_version: HashMap<String, usize>,
}

impl HistoryIndex {
    fn build(records: Vec<HistoryRecord>) -> Self {
        let by_version = records
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.event.version_id.clone(), idx))
            .collect();
        Self { records, by_version }
    }

    fn get(&self, key: &str, version_id: &str) -> Option<&HistoryRecord> {
        self.by_version
            .get(version_id)
            .map(|&idx| &self.records[idx])
            .filter(|r| r.event.key == key)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ThawRecord {
    key: String,
    version_id: String,
    tier: ThawTier,
    retention_days: u32,
    requested_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BucketRecord {
    name: String,
    #[serde(default)]
    region: Option<String>,
    created_at: DateTime<Utc>,
}

/// Filesystem-backed versioned bucket store
#[derive(Debug)]
pub struct LocalVersionStore {
    root: PathBuf,
    bucket: String,
    page_size: usize,
    /// Serialises history appends made through this handle
    journal: Mutex<()>,
    index: RwLock<Option<Arc<HistoryIndex>>>,
}

impl LocalVersionStore {
    /// Open the store for `bucket` under `root`
    ///
    /// The bucket directory is not required to exist yet; listing a missing
    /// bucket fails with `BucketNotFound`.
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            page_size: MAX_PAGE_SIZE,
            journal: Mutex::new(()),
            index: RwLock::new(None),
        }
    }

    /// Override the listing page size (clamped to 1..=MAX_PAGE_SIZE)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    fn history_path(&self, bucket: &str) -> PathBuf {
        self.bucket_dir(bucket).join(HISTORY_FILE)
    }

    fn blob_path(&self, bucket: &str, version_id: &str) -> PathBuf {
        self.bucket_dir(bucket).join(BLOBS_DIR).join(version_id)
    }

    fn thaw_path(&self, bucket: &str, version_id: &str) -> PathBuf {
        self.bucket_dir(bucket)
            .join(THAWS_DIR)
            .join(format!("{}.json", version_id))
    }

    /// Calculate the etag recorded for content
    pub fn calculate_etag(data: &[u8]) -> String {
        format!("{:x}", Sha256::digest(data))
    }

    /// Write a new version of `key` into the source bucket
    pub async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        tier: StorageTier,
        at: DateTime<Utc>,
    ) -> StoreResult<VersionEvent> {
        validate_key(key)?;
        let bucket = self.bucket.clone();
        fs::create_dir_all(self.bucket_dir(&bucket).join(BLOBS_DIR)).await?;
        self.append_version(&bucket, key, data, tier, at).await
    }

    /// Record a delete marker for `key` in the source bucket
    pub async fn delete_object(&self, key: &str, at: DateTime<Utc>) -> StoreResult<VersionEvent> {
        validate_key(key)?;
        fs::create_dir_all(self.bucket_dir(&self.bucket)).await?;

        let event = VersionEvent::delete_marker(key, new_version_id(), at);
        let record = HistoryRecord {
            event: event.clone(),
            etag: None,
        };
        self.append_record(&self.bucket, &record).await?;
        Ok(event)
    }

    async fn append_version(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        tier: StorageTier,
        at: DateTime<Utc>,
    ) -> StoreResult<VersionEvent> {
        let event = VersionEvent::version(key, new_version_id(), at, tier);
        fs::write(self.blob_path(bucket, &event.version_id), data).await?;

        let record = HistoryRecord {
            event: event.clone(),
            etag: Some(Self::calculate_etag(data)),
        };
        self.append_record(bucket, &record).await?;
        Ok(event)
    }

    async fn append_record(&self, bucket: &str, record: &HistoryRecord) -> StoreResult<()> {
        let mut line =
            serde_json::to_string(record).map_err(|e| StoreError::Internal(e.to_string()))?;
        line.push('\n');

        let _guard = self.journal.lock().await;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path(bucket))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        if bucket == self.bucket {
            *self.index.write().await = None;
        }
        Ok(())
    }

    /// Source history index, parsed on first use
    async fn history(&self) -> StoreResult<Arc<HistoryIndex>> {
        if let Some(index) = self.index.read().await.as_ref() {
            return Ok(Arc::clone(index));
        }

        let mut slot = self.index.write().await;
        if let Some(index) = slot.as_ref() {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(HistoryIndex::build(self.read_history(&self.bucket).await?));
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    async fn read_history(&self, bucket: &str) -> StoreResult<Vec<HistoryRecord>> {
        if fs::metadata(self.bucket_dir(bucket)).await.is_err() {
            return Err(StoreError::BucketNotFound(bucket.to_string()));
        }

        let content = match fs::read_to_string(self.history_path(bucket)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|e| StoreError::CorruptHistory {
                    bucket: bucket.to_string(),
                    line: idx + 1,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn find_record(&self, key: &str, version_id: &str) -> StoreResult<HistoryRecord> {
        validate_version_id(version_id)?;
        self.history()
            .await?
            .get(key, version_id)
            .cloned()
            .ok_or_else(|| StoreError::ObjectNotFound {
                key: key.to_string(),
                version_id: version_id.to_string(),
            })
    }

    async fn has_thaw_record(&self, version_id: &str) -> bool {
        fs::metadata(self.thaw_path(&self.bucket, version_id))
            .await
            .is_ok()
    }

    /// Look up a live (non delete-marker) version that can be read now
    async fn readable_version(&self, key: &str, version_id: &str) -> StoreResult<HistoryRecord> {
        let record = self.find_record(key, version_id).await?;

        if record.event.is_delete_marker {
            return Err(StoreError::ObjectNotFound {
                key: key.to_string(),
                version_id: version_id.to_string(),
            });
        }

        if record.event.storage_tier == StorageTier::Cold && !self.has_thaw_record(version_id).await
        {
            return Err(StoreError::NotRestorable {
                key: key.to_string(),
                version_id: version_id.to_string(),
            });
        }

        Ok(record)
    }
}

#[async_trait]
impl EventSource for LocalVersionStore {
    async fn list_version_events(
        &self,
        prefix: &str,
        cursor: Option<&Cursor>,
    ) -> StoreResult<EventPage> {
        let offset = match cursor {
            Some(c) => c
                .as_str()
                .parse::<usize>()
                .map_err(|_| StoreError::InvalidCursor(c.to_string()))?,
            None => 0,
        };

        let index = self.history().await?;
        let records = &index.records;
        if offset > records.len() {
            return Err(StoreError::InvalidCursor(offset.to_string()));
        }

        let in_prefix = |pos: &usize| records[*pos].event.key.starts_with(prefix);
        let mut positions = (offset..records.len()).filter(in_prefix);
        let events: Vec<VersionEvent> = positions
            .by_ref()
            .take(self.page_size)
            .map(|pos| records[pos].event.clone())
            .collect();

        match positions.next() {
            Some(next) => Ok(EventPage::with_next(events, Cursor::new(next.to_string()))),
            None => Ok(EventPage::last(events)),
        }
    }
}

#[async_trait]
impl TierProbe for LocalVersionStore {
    async fn probe_tier(&self, key: &str, version_id: &str) -> StoreResult<TierStatus> {
        let record = self.find_record(key, version_id).await?;

        if record.event.storage_tier == StorageTier::Standard || self.has_thaw_record(version_id).await
        {
            Ok(TierStatus::readable())
        } else {
            Ok(TierStatus::frozen())
        }
    }
}

#[async_trait]
impl RecoverySink for LocalVersionStore {
    async fn ensure_destination(&self, destination: &Destination) -> StoreResult<()> {
        match destination {
            Destination::Directory { path } => {
                fs::create_dir_all(path).await?;
            }
            Destination::Bucket { name, .. } => {
                validate_key(name)?;
                let dir = self.bucket_dir(name);
                fs::create_dir_all(dir.join(BLOBS_DIR)).await?;

                let marker = dir.join(BUCKET_FILE);
                if fs::metadata(&marker).await.is_err() {
                    let record = BucketRecord {
                        name: name.clone(),
                        region: destination.region_hint().map(str::to_string),
                        created_at: Utc::now(),
                    };
                    let json = serde_json::to_vec_pretty(&record)
                        .map_err(|e| StoreError::Internal(e.to_string()))?;
                    fs::write(&marker, json).await?;
                }
            }
        }
        Ok(())
    }

    async fn fetch_or_copy(
        &self,
        key: &str,
        version_id: &str,
        destination: &Destination,
    ) -> StoreResult<()> {
        validate_key(key)?;
        let record = self.readable_version(key, version_id).await?;

        let data = fs::read(self.blob_path(&self.bucket, version_id))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => StoreError::ObjectNotFound {
                    key: key.to_string(),
                    version_id: version_id.to_string(),
                },
                _ => StoreError::IoError(e.to_string()),
            })?;

        if let Some(expected) = &record.etag {
            if &Self::calculate_etag(&data) != expected {
                return Err(StoreError::ChecksumMismatch(format!("{}@{}", key, version_id)));
            }
        }

        match destination {
            Destination::Directory { path } => {
                let target = path.join(key);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(&target, &data).await?;
            }
            Destination::Bucket { name, .. } => {
                if fs::metadata(self.bucket_dir(name)).await.is_err() {
                    return Err(StoreError::BucketNotFound(name.clone()));
                }
                fs::create_dir_all(self.bucket_dir(name).join(BLOBS_DIR)).await?;
                self.append_version(name, key, &data, StorageTier::Standard, Utc::now())
                    .await?;
            }
        }

        Ok(())
    }

    async fn request_thaw(
        &self,
        key: &str,
        version_id: &str,
        options: ThawOptions,
    ) -> StoreResult<()> {
        let record = self.find_record(key, version_id).await?;
        if record.event.is_delete_marker {
            return Err(StoreError::ObjectNotFound {
                key: key.to_string(),
                version_id: version_id.to_string(),
            });
        }

        let thaw = ThawRecord {
            key: key.to_string(),
            version_id: version_id.to_string(),
            tier: options.tier,
            retention_days: options.retention_days.get(),
            requested_at: Utc::now(),
        };
        let json =
            serde_json::to_vec_pretty(&thaw).map_err(|e| StoreError::Internal(e.to_string()))?;

        let path = self.thaw_path(&self.bucket, version_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, json).await?;
        Ok(())
    }
}

fn new_version_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Version ids name a single file under `blobs/` and `thaws/`
fn validate_version_id(version_id: &str) -> StoreResult<()> {
    let mut components = Path::new(version_id).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || version_id.contains(['/', '\\']) {
        return Err(StoreError::InvalidPath(version_id.to_string()));
    }
    Ok(())
}

/// Reject keys that would escape the bucket or destination directory
fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidPath(key.to_string()));
    }

    let escapes = Path::new(key)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes || key.contains('\\') {
        return Err(StoreError::InvalidPath(key.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::num::NonZeroU32;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn thaw_options() -> ThawOptions {
        ThawOptions::new(ThawTier::Bulk, NonZeroU32::new(3).unwrap())
    }

    // === Listing ===

    #[tokio::test]
    async fn test_list_missing_bucket() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "absent");

        let result = store.list_version_events("", None).await;
        assert!(matches!(result, Err(StoreError::BucketNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_prefix_and_paginates() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src").with_page_size(2);

        for i in 0..5 {
            store
                .put_object(&format!("logs/{}", i), b"x", StorageTier::Standard, at(2024, 1, 1))
                .await
                .unwrap();
        }
        store
            .put_object("other/z", b"x", StorageTier::Standard, at(2024, 1, 1))
            .await
            .unwrap();

        let mut cursor = None;
        let mut seen = Vec::new();
        let mut pages = 0;
        loop {
            let page = store
                .list_version_events("logs/", cursor.as_ref())
                .await
                .unwrap();
            pages += 1;
            assert!(page.events.len() <= 2);
            seen.extend(page.events.into_iter().map(|e| e.key));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|k| k.starts_with("logs/")));
    }

    #[tokio::test]
    async fn test_list_rejects_bad_cursor() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        store
            .put_object("a", b"x", StorageTier::Standard, at(2024, 1, 1))
            .await
            .unwrap();

        let result = store
            .list_version_events("", Some(&Cursor::new("not-a-number")))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidCursor(_))));
    }

    #[tokio::test]
    async fn test_corrupt_history_line() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(HISTORY_FILE), "{not json}\n").unwrap();

        let store = LocalVersionStore::new(temp.path(), "src");
        let result = store.list_version_events("", None).await;
        assert!(matches!(result, Err(StoreError::CorruptHistory { line: 1, .. })));
    }

    // === History index ===

    #[tokio::test]
    async fn test_history_parsed_once_per_handle() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        let v = store
            .put_object("a", b"x", StorageTier::Standard, at(2024, 1, 1))
            .await
            .unwrap();

        store.list_version_events("", None).await.unwrap();
        std::fs::remove_file(temp.path().join("src").join(HISTORY_FILE)).unwrap();

        let status = store.probe_tier("a", &v.version_id).await.unwrap();
        assert!(status.already_thawed_or_standard);
        let page = store.list_version_events("", None).await.unwrap();
        assert_eq!(page.events.len(), 1);
    }

    #[tokio::test]
    async fn test_append_refreshes_index() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        store
            .put_object("a", b"x", StorageTier::Standard, at(2024, 1, 1))
            .await
            .unwrap();
        assert_eq!(store.list_version_events("", None).await.unwrap().events.len(), 1);

        let d = store.delete_object("a", at(2024, 1, 2)).await.unwrap();

        let page = store.list_version_events("", None).await.unwrap();
        assert_eq!(page.events.len(), 2);
        assert!(page.events[1].is_delete_marker);
        assert_eq!(page.events[1].version_id, d.version_id);
    }

    #[tokio::test]
    async fn test_cursor_skips_keys_outside_prefix() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src").with_page_size(1);
        for key in ["logs/a", "other/x", "other/y", "logs/b"] {
            store
                .put_object(key, b"x", StorageTier::Standard, at(2024, 1, 1))
                .await
                .unwrap();
        }

        let first = store.list_version_events("logs/", None).await.unwrap();
        assert_eq!(first.events[0].key, "logs/a");
        let cursor = first.next_cursor.unwrap();
        assert_eq!(cursor.as_str(), "3");

        let second = store.list_version_events("logs/", Some(&cursor)).await.unwrap();
        assert_eq!(second.events[0].key, "logs/b");
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_many_lookups_on_large_history() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        let mut versions = Vec::new();
        for i in 0..500 {
            let v = store
                .put_object(&format!("k{}", i), b"x", StorageTier::Standard, at(2024, 1, 1))
                .await
                .unwrap();
            versions.push(v);
        }

        let dest = Destination::directory(temp.path().join("out"));
        store.ensure_destination(&dest).await.unwrap();
        for v in &versions {
            store.fetch_or_copy(&v.key, &v.version_id, &dest).await.unwrap();
        }

        assert!(temp.path().join("out").join("k499").exists());
    }

    // === Tier probe and thaw ===

    #[tokio::test]
    async fn test_probe_cold_before_and_after_thaw() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        let v = store
            .put_object("cold/a", b"frozen", StorageTier::Cold, at(2024, 1, 1))
            .await
            .unwrap();

        let status = store.probe_tier("cold/a", &v.version_id).await.unwrap();
        assert!(!status.already_thawed_or_standard);

        store
            .request_thaw("cold/a", &v.version_id, thaw_options())
            .await
            .unwrap();

        let status = store.probe_tier("cold/a", &v.version_id).await.unwrap();
        assert!(status.already_thawed_or_standard);
    }

    #[tokio::test]
    async fn test_probe_unknown_version() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        store
            .put_object("a", b"x", StorageTier::Standard, at(2024, 1, 1))
            .await
            .unwrap();

        let result = store.probe_tier("a", "nope").await;
        assert!(matches!(result, Err(StoreError::ObjectNotFound { .. })));
    }

    // === Copy ===

    #[tokio::test]
    async fn test_copy_to_directory() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path().join("root"), "src");
        let v = store
            .put_object("logs/a.txt", b"hello", StorageTier::Standard, at(2024, 1, 1))
            .await
            .unwrap();

        let dest = Destination::directory(temp.path().join("out"));
        store.ensure_destination(&dest).await.unwrap();
        store
            .fetch_or_copy("logs/a.txt", &v.version_id, &dest)
            .await
            .unwrap();

        let copied = std::fs::read(temp.path().join("out").join("logs/a.txt")).unwrap();
        assert_eq!(copied, b"hello");
    }

    #[tokio::test]
    async fn test_copy_to_bucket_appends_version() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        let v = store
            .put_object("a", b"payload", StorageTier::Standard, at(2024, 1, 1))
            .await
            .unwrap();

        let dest = Destination::bucket("restored", Some("eu-west-1".into()));
        store.ensure_destination(&dest).await.unwrap();
        store.fetch_or_copy("a", &v.version_id, &dest).await.unwrap();

        let restored = LocalVersionStore::new(temp.path(), "restored");
        let page = restored.list_version_events("", None).await.unwrap();
        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].key, "a");
        assert_ne!(page.events[0].version_id, v.version_id);

        let marker = std::fs::read_to_string(temp.path().join("restored").join(BUCKET_FILE)).unwrap();
        assert!(marker.contains("eu-west-1"));
    }

    #[tokio::test]
    async fn test_copy_to_unprovisioned_bucket_fails() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        let v = store
            .put_object("a", b"x", StorageTier::Standard, at(2024, 1, 1))
            .await
            .unwrap();

        let result = store
            .fetch_or_copy("a", &v.version_id, &Destination::bucket("nowhere", None))
            .await;
        assert!(matches!(result, Err(StoreError::BucketNotFound(_))));
    }

    #[tokio::test]
    async fn test_copy_cold_without_thaw_fails() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        let v = store
            .put_object("a", b"x", StorageTier::Cold, at(2024, 1, 1))
            .await
            .unwrap();

        let dest = Destination::directory(temp.path().join("out"));
        let result = store.fetch_or_copy("a", &v.version_id, &dest).await;
        assert!(matches!(result, Err(StoreError::NotRestorable { .. })));
    }

    #[tokio::test]
    async fn test_copy_detects_checksum_mismatch() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        let v = store
            .put_object("a", b"original", StorageTier::Standard, at(2024, 1, 1))
            .await
            .unwrap();

        std::fs::write(temp.path().join("src").join(BLOBS_DIR).join(&v.version_id), b"tampered")
            .unwrap();

        let dest = Destination::directory(temp.path().join("out"));
        let result = store.fetch_or_copy("a", &v.version_id, &dest).await;
        assert!(matches!(result, Err(StoreError::ChecksumMismatch(_))));
    }

    #[tokio::test]
    async fn test_copy_delete_marker_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        let d = store.delete_object("a", at(2024, 1, 1)).await.unwrap();

        let dest = Destination::directory(temp.path().join("out"));
        let result = store.fetch_or_copy("a", &d.version_id, &dest).await;
        assert!(matches!(result, Err(StoreError::ObjectNotFound { .. })));
    }

    // === Key validation ===

    #[test]
    fn test_validate_key() {
        assert!(validate_key("logs/2024/a.txt").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("logs/../../escape").is_err());
        assert!(validate_key("/absolute").is_err());
        assert!(validate_key("win\\path").is_err());
    }

    #[test]
    fn test_validate_version_id() {
        assert!(validate_version_id("0f3a9c").is_ok());
        assert!(validate_version_id("").is_err());
        assert!(validate_version_id("..").is_err());
        assert!(validate_version_id("../../x").is_err());
        assert!(validate_version_id("a/b").is_err());
        assert!(validate_version_id("/abs").is_err());
        assert!(validate_version_id("a\\b").is_err());
    }

    #[tokio::test]
    async fn test_traversing_version_id_in_history_rejected() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src");
        std::fs::create_dir_all(&dir).unwrap();
        let line = serde_json::json!({
            "key": "a",
            "version_id": "../../escaped",
            "last_modified": "2024-01-01T00:00:00Z",
            "storage_tier": "cold",
            "is_delete_marker": false,
        });
        std::fs::write(dir.join(HISTORY_FILE), format!("{}\n", line)).unwrap();

        let store = LocalVersionStore::new(temp.path(), "src");
        let thaw = store.request_thaw("a", "../../escaped", thaw_options()).await;
        assert!(matches!(thaw, Err(StoreError::InvalidPath(_))));

        let probe = store.probe_tier("a", "../../escaped").await;
        assert!(matches!(probe, Err(StoreError::InvalidPath(_))));

        let dest = Destination::directory(temp.path().join("out"));
        let copy = store.fetch_or_copy("a", "../../escaped", &dest).await;
        assert!(matches!(copy, Err(StoreError::InvalidPath(_))));

        assert!(!temp.path().join("escaped.json").exists());
        assert!(!temp.path().parent().unwrap().join("escaped.json").exists());
    }

    #[tokio::test]
    async fn test_ensure_destination_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = LocalVersionStore::new(temp.path(), "src");
        let dest = Destination::bucket("restored", None);

        store.ensure_destination(&dest).await.unwrap();
        store.ensure_destination(&dest).await.unwrap();

        assert!(temp.path().join("restored").join(BUCKET_FILE).exists());
    }
}
