//! File-backed interaction store, one JSON-lines file per session

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{sort_chronologically, Interaction, InteractionStore, Result, StoreStats};

/// Appends to `<dir>/<session>.jsonl` and fsyncs before acknowledging
pub struct JsonlInteractionStore {
    dir: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl JsonlInteractionStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", encode_file_stem(session_id)))
    }

    /// Per-file lock; the map lock is only held while fetching it
    async fn file_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn read_file(path: &Path) -> Result<Vec<Interaction>> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut interactions = Vec::new();

        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Interaction>(line) {
                Ok(interaction) => interactions.push(interaction),
                Err(e) => warn!("Skipping corrupt line {} in {:?}: {}", n + 1, path, e),
            }
        }

        Ok(interactions)
    }
}

/// Percent-encodes everything but ASCII alphanumerics, `-` and `.`
///
/// Distinct session ids always map to distinct file names.
fn encode_file_stem(session_id: &str) -> String {
    let mut stem = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' => stem.push(byte as char),
            _ => stem.push_str(&format!("%{:02X}", byte)),
        }
    }
    // keep "." and ".." from naming directories
    if stem.is_empty() || stem.bytes().all(|b| b == b'.') {
        stem = stem.replace('.', "%2E");
        stem.insert_str(0, "%");
    }
    stem
}

#[async_trait]
impl InteractionStore for JsonlInteractionStore {
    async fn append(&self, interaction: &Interaction) -> Result<()> {
        let path = self.session_path(&interaction.session_id);
        let lock = self.file_lock(&path).await;
        let _guard = lock.lock().await;

        tokio::fs::create_dir_all(&self.dir).await?;

        let mut line = serde_json::to_string(interaction)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;

        debug!("Appended interaction to {:?}", path);
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Interaction>> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let lock = self.file_lock(&path).await;
        let _guard = lock.lock().await;

        let mut interactions: Vec<Interaction> = Self::read_file(&path)
            .await?
            .into_iter()
            .filter(|i| i.session_id == session_id)
            .collect();
        sort_chronologically(&mut interactions);
        Ok(interactions)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let mut stats = StoreStats::default();
        if !self.dir.exists() {
            return Ok(stats);
        }

        let mut sessions = HashSet::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            for interaction in Self::read_file(&path).await? {
                sessions.insert(interaction.session_id);
                stats.interactions += 1;
            }
        }

        stats.sessions = sessions.len();
        Ok(stats)
    }
}
