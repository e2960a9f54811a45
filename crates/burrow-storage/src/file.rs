use async_trait::async_trait;
use burrow_core::storage::Result;
use burrow_core::{LinkRecord, LinkStatus, ShortToken, Storage, StorageError};
use burrow_generator::{Generator, RandomGenerator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One line of the link file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredLine {
    short_url: ShortToken,
    original_url: String,
    user_id: String,
    status: LinkStatus,
}

impl StoredLine {
    fn into_record(self) -> LinkRecord {
        LinkRecord {
            token: self.short_url,
            original_url: self.original_url,
            owner_id: self.user_id,
            status: self.status,
        }
    }
}

impl From<LinkRecord> for StoredLine {
    fn from(record: LinkRecord) -> Self {
        Self {
            short_url: record.token,
            original_url: record.original_url,
            user_id: record.owner_id,
            status: record.status,
        }
    }
}

/// Flat file implementation of the [`Storage`] trait.
///
/// The file holds one JSON object per line. Inserts append a line; deletes
/// rewrite the whole file through a temporary sibling that is renamed over
/// the original. Every operation takes the store lock, so only one runs at a
/// time.
#[derive(Debug)]
pub struct FileStore<G = RandomGenerator> {
    path: PathBuf,
    lock: Mutex<()>,
    generator: G,
}

impl FileStore<RandomGenerator> {
    /// Opens the store at `path`, creating an empty file if it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_generator(path, RandomGenerator::new()).await
    }
}

impl<G: Generator> FileStore<G> {
    pub async fn open_with_generator(path: impl Into<PathBuf>, generator: G) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        info!(path = %path.display(), "file storage opened");
        Ok(Self {
            path,
            lock: Mutex::new(()),
            generator,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> Result<String> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Reads and parses every line, in file order.
    async fn read_lines(&self) -> Result<Vec<StoredLine>> {
        let content = self.read_raw().await?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| self.parse_line(index, line))
            .collect()
    }

    fn parse_line(&self, index: usize, line: &str) -> Result<StoredLine> {
        serde_json::from_str(line).map_err(|e| {
            StorageError::InvalidData(format!(
                "{}:{}: {e}",
                self.path.display(),
                index + 1
            ))
        })
    }

    async fn append(&self, line: StoredLine) -> Result<()> {
        let mut encoded = encode(&line)?;
        encoded.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(encoded.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Replaces the file content in one rename so a crash leaves either the
    /// old or the new file behind.
    async fn replace(&self, content: &str) -> Result<()> {
        let tmp_path = self.tmp_path();

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn encode(line: &StoredLine) -> Result<String> {
    serde_json::to_string(line).map_err(|e| StorageError::InvalidData(e.to_string()))
}

#[async_trait]
impl<G: Generator> Storage for FileStore<G> {
    async fn get(&self, token: &ShortToken) -> Result<String> {
        let _guard = self.lock.lock().await;

        let line = self
            .read_lines()
            .await?
            .into_iter()
            .find(|line| &line.short_url == token)
            .ok_or_else(|| StorageError::NotFound(token.clone()))?;

        if line.status == LinkStatus::Deleted {
            return Err(StorageError::Gone(token.clone()));
        }

        Ok(line.original_url)
    }

    async fn add(&self, original_url: &str, owner_id: &str) -> Result<ShortToken> {
        let _guard = self.lock.lock().await;

        let existing = self.read_lines().await?.into_iter().find(|line| {
            line.status == LinkStatus::Created && line.original_url == original_url
        });
        if let Some(line) = existing {
            return Err(StorageError::DuplicateUrl(line.short_url));
        }

        let token = self.generator.generate();
        self.append(LinkRecord::new(token.clone(), original_url, owner_id).into())
            .await?;

        debug!(token = %token, owner_id, "link added");
        Ok(token)
    }

    async fn items_of_user(&self, owner_id: &str) -> Result<Vec<LinkRecord>> {
        let _guard = self.lock.lock().await;

        Ok(self
            .read_lines()
            .await?
            .into_iter()
            .filter(|line| line.user_id == owner_id)
            .map(StoredLine::into_record)
            .collect())
    }

    async fn delete(&self, tokens: &[ShortToken], owner_id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let targets: HashSet<&ShortToken> = tokens.iter().collect();
        let content = self.read_raw().await?;
        let mut rewritten = String::with_capacity(content.len());
        let mut changed = 0usize;

        // untouched lines, blank ones included, are copied with their terminator
        for (index, raw) in content.split_inclusive('\n').enumerate() {
            let body = raw.trim_end_matches('\n').trim_end_matches('\r');
            if body.trim().is_empty() {
                rewritten.push_str(raw);
                continue;
            }

            let mut line = self.parse_line(index, body)?;
            if line.user_id == owner_id
                && line.status == LinkStatus::Created
                && targets.contains(&line.short_url)
            {
                line.status = LinkStatus::Deleted;
                rewritten.push_str(&encode(&line)?);
                rewritten.push_str(&raw[body.len()..]);
                changed += 1;
            } else {
                rewritten.push_str(raw);
            }
        }

        if changed == 0 {
            return Ok(());
        }

        self.replace(&rewritten).await?;
        debug!(owner_id, changed, "links deleted");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        fs::metadata(&self.path).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
