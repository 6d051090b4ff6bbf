//! Disk-backed store for bus images.
//!
//! Files live flat in one directory under generated names and are exposed to
//! clients under `public_path`. Removal is always best-effort: callers get a
//! [`CleanupOutcome`] back instead of an error.

use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use common::metrics::{UPLOADS_STORED_TOTAL, UPLOAD_CLEANUPS_TOTAL, UPLOAD_CLEANUP_FAILURES_TOTAL};
use configs::UploadConfig;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];
pub const REJECTED_TYPE_MESSAGE: &str = "Only .png, .jpg and .jpeg format allowed!";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw image as received from a client, before it touches the disk.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A file written by [`UploadStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub file_name: String,
    pub url: String,
}

/// Result of a best-effort removal.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed,
    AlreadyGone,
    /// The URL is the placeholder or points outside the store.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    public_path: String,
    public_base_url: Option<String>,
    placeholder_url: String,
    max_file_bytes: u64,
}

impl UploadStore {
    pub fn from_config(cfg: &UploadConfig) -> Self {
        Self {
            dir: cfg.dir.clone(),
            public_path: cfg.public_path.clone(),
            public_base_url: cfg.public_base_url.clone(),
            placeholder_url: cfg.placeholder_url.clone(),
            max_file_bytes: cfg.max_file_bytes,
        }
    }

    pub fn dir(&self) -> &Path { &self.dir }
    pub fn public_path(&self) -> &str { &self.public_path }
    pub fn placeholder_url(&self) -> &str { &self.placeholder_url }
    pub fn max_file_bytes(&self) -> u64 { self.max_file_bytes }

    pub fn is_placeholder(&self, url: &str) -> bool {
        url == self.placeholder_url
    }

    /// Check name and declared content type; returns the lowercased extension.
    pub fn check_kind(&self, file_name: &str, content_type: Option<&str>) -> Result<String, UploadError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let mime = content_type.map(|c| c.trim().to_ascii_lowercase()).unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) || !ALLOWED_CONTENT_TYPES.contains(&mime.as_str()) {
            return Err(UploadError::Rejected(REJECTED_TYPE_MESSAGE.to_string()));
        }
        Ok(ext)
    }

    pub fn check_size(&self, len: u64) -> Result<(), UploadError> {
        if len > self.max_file_bytes {
            return Err(UploadError::Rejected(format!(
                "File too large: limit is {} bytes",
                self.max_file_bytes
            )));
        }
        Ok(())
    }

    /// Kind and size checks together; returns the extension the file will be stored with.
    pub fn check(&self, image: &ImageUpload) -> Result<String, UploadError> {
        let ext = self.check_kind(&image.file_name, image.content_type.as_deref())?;
        self.check_size(image.bytes.len() as u64)?;
        Ok(ext)
    }

    /// Validate and write the image under a fresh unique name.
    pub async fn save(&self, image: &ImageUpload) -> Result<StoredImage, UploadError> {
        let ext = self.check(image)?;

        fs::create_dir_all(&self.dir).await?;
        let file_name = generate_file_name(&ext);
        fs::write(self.dir.join(&file_name), &image.bytes).await?;

        UPLOADS_STORED_TOTAL.inc();
        info!(file = %file_name, bytes = image.bytes.len(), "upload_stored");
        let url = self.url_for(&file_name);
        Ok(StoredImage { file_name, url })
    }

    pub fn url_for(&self, file_name: &str) -> String {
        let base = self.public_base_url.as_deref().unwrap_or("");
        format!("{}{}/{}", base, self.public_path, file_name)
    }

    /// Map a public URL back onto the disk; `None` for anything not under this store.
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        if url.is_empty() || self.is_placeholder(url) {
            return None;
        }
        let rest = match &self.public_base_url {
            Some(base) if url.starts_with(base.as_str()) => &url[base.len()..],
            _ => url,
        };
        let name = rest.strip_prefix(self.public_path.as_str())?.strip_prefix('/')?;
        // flat directory: reject anything that is not a bare file name
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return None;
        }
        Some(self.dir.join(name))
    }

    /// Remove a file stored during a request that did not complete.
    pub async fn discard(&self, stored: &StoredImage) -> CleanupOutcome {
        let outcome = remove_file(&self.dir.join(&stored.file_name)).await;
        record_cleanup("discard", &stored.url, &outcome);
        outcome
    }

    /// Remove the file a record used to own. Placeholder and foreign URLs are skipped.
    pub async fn release(&self, url: &str) -> CleanupOutcome {
        let outcome = match self.path_for_url(url) {
            Some(path) => remove_file(&path).await,
            None => CleanupOutcome::Skipped,
        };
        record_cleanup("release", url, &outcome);
        outcome
    }

    /// Names of all stored files, sorted.
    pub async fn list_files(&self) -> Result<Vec<String>, UploadError> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn generate_file_name(ext: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(100_000_000..1_000_000_000);
    format!("{millis}-{suffix}.{ext}")
}

async fn remove_file(path: &Path) -> CleanupOutcome {
    match fs::remove_file(path).await {
        Ok(()) => CleanupOutcome::Removed,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CleanupOutcome::AlreadyGone,
        Err(e) => CleanupOutcome::Failed(e.to_string()),
    }
}

fn record_cleanup(action: &str, url: &str, outcome: &CleanupOutcome) {
    match outcome {
        CleanupOutcome::Removed => {
            UPLOAD_CLEANUPS_TOTAL.inc();
            info!(action, url, "upload_cleanup");
        }
        CleanupOutcome::Failed(reason) => {
            UPLOAD_CLEANUP_FAILURES_TOTAL.inc();
            warn!(action, url, reason = %reason, "upload_cleanup_failed");
        }
        CleanupOutcome::AlreadyGone | CleanupOutcome::Skipped => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn store_in_tmp() -> UploadStore {
        let cfg = UploadConfig {
            dir: std::env::temp_dir().join(format!("bus_uploads_{}", Uuid::new_v4())),
            ..UploadConfig::default()
        };
        UploadStore::from_config(&cfg)
    }

    fn png(bytes: usize) -> ImageUpload {
        ImageUpload { file_name: "Bus.PNG".into(), content_type: Some("image/png".into()), bytes: vec![7u8; bytes] }
    }

    #[tokio::test]
    async fn save_then_release_removes_file() -> Result<(), anyhow::Error> {
        let store = store_in_tmp();
        let stored = store.save(&png(64)).await?;
        assert!(stored.file_name.ends_with(".png"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.file_name));
        assert_eq!(store.list_files().await?, vec![stored.file_name.clone()]);

        assert_eq!(store.release(&stored.url).await, CleanupOutcome::Removed);
        assert_eq!(store.release(&stored.url).await, CleanupOutcome::AlreadyGone);
        assert!(store.list_files().await?.is_empty());

        let _ = tokio::fs::remove_dir_all(store.dir()).await;
        Ok(())
    }

    #[tokio::test]
    async fn rejects_wrong_type_and_size_without_writing() -> Result<(), anyhow::Error> {
        let store = store_in_tmp();

        let gif = ImageUpload { file_name: "a.gif".into(), content_type: Some("image/gif".into()), bytes: vec![1] };
        assert!(matches!(store.save(&gif).await, Err(UploadError::Rejected(_))));

        let spoofed = ImageUpload { file_name: "a.png".into(), content_type: Some("text/plain".into()), bytes: vec![1] };
        assert!(matches!(store.save(&spoofed).await, Err(UploadError::Rejected(_))));

        let big = png(5_000_001);
        assert!(matches!(store.save(&big).await, Err(UploadError::Rejected(_))));

        assert!(store.list_files().await?.is_empty());
        Ok(())
    }

    #[test]
    fn generated_names_follow_pattern() {
        let name = generate_file_name("jpg");
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "jpg");
        let (millis, suffix) = stem.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 9);
    }

    #[tokio::test]
    async fn release_skips_placeholder_and_foreign_urls() {
        let store = store_in_tmp();
        assert_eq!(store.release(store.placeholder_url()).await, CleanupOutcome::Skipped);
        assert_eq!(store.release("https://elsewhere.example/x.png").await, CleanupOutcome::Skipped);
        assert_eq!(store.release("/uploads/../secret.png").await, CleanupOutcome::Skipped);
    }

    #[test]
    fn url_mapping_honours_base_url() {
        let cfg = UploadConfig {
            public_base_url: Some("https://cdn.example.com".into()),
            ..UploadConfig::default()
        };
        let store = UploadStore::from_config(&cfg);
        let url = store.url_for("1-123456789.png");
        assert_eq!(url, "https://cdn.example.com/uploads/1-123456789.png");
        assert_eq!(store.path_for_url(&url), Some(PathBuf::from("uploads/1-123456789.png")));
        assert_eq!(store.path_for_url("/uploads/1-123456789.png"), Some(PathBuf::from("uploads/1-123456789.png")));
    }
}
