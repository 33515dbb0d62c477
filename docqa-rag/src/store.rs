//! The in-memory knowledge base and its on-disk layout.
//!
//! A [`KnowledgeBase`] pairs a [`FlatIndex`] with the chunks its vectors were
//! computed from: position `i` in the index is chunk `i`. [`IndexStore`]
//! persists it as two artifacts in one directory:
//!
//! - `vectors.json`: an [`IndexManifest`] plus the row-major vector buffer
//! - `chunks.json`: the chunk texts and their sources, by position
//!
//! Both are written together and must be loaded together. Each carries the
//! same content fingerprint, so a vector artifact from one save next to a
//! chunk artifact from another is rejected on load.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::index::{FlatIndex, VectorIndex};

/// File name of the vector artifact.
pub const VECTORS_FILE: &str = "vectors.json";
/// File name of the chunk artifact.
pub const CHUNKS_FILE: &str = "chunks.json";

const FORMAT_VERSION: u32 = 2;

/// Vectors and the chunks they were embedded from, aligned by position.
///
/// `index.len() == chunks.len()` holds for every value of this type.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    index: FlatIndex,
    chunks: Vec<Chunk>,
    embedding_model: String,
}

impl KnowledgeBase {
    /// Create an empty knowledge base for vectors of the given dimensionality.
    pub fn new(dimensions: usize, embedding_model: impl Into<String>) -> Self {
        Self {
            index: FlatIndex::new(dimensions),
            chunks: Vec::new(),
            embedding_model: embedding_model.into(),
        }
    }

    /// Assemble a knowledge base from an index and its chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexCorrupt`] if the counts disagree.
    pub fn from_parts(
        index: FlatIndex,
        chunks: Vec<Chunk>,
        embedding_model: impl Into<String>,
    ) -> Result<Self> {
        if index.len() != chunks.len() {
            return Err(RagError::IndexCorrupt(format!(
                "{} vectors but {} chunks",
                index.len(),
                chunks.len()
            )));
        }
        Ok(Self { index, chunks, embedding_model: embedding_model.into() })
    }

    /// Append chunks with their embeddings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexCorrupt`] if the counts disagree, or
    /// [`RagError::DimensionMismatch`] if a vector has the wrong length.
    /// Nothing is appended on error.
    pub fn extend(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(RagError::IndexCorrupt(format!(
                "{} embeddings returned for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        self.index.add(vectors)?;
        self.chunks.extend(chunks);
        Ok(())
    }

    /// The vector index.
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// All chunks, by position.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The chunk at `position`.
    pub fn chunk(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Dimensionality of the stored vectors.
    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }

    /// The embedding model the vectors were produced with.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

/// Metadata stored with the vector artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    /// Layout version of the artifacts.
    pub format_version: u32,
    /// Dimensionality of every vector.
    pub dimensions: usize,
    /// Number of vectors.
    pub count: usize,
    /// Embedding model used at ingest time.
    pub embedding_model: String,
    /// When the index was written.
    pub created_at: DateTime<Utc>,
    /// SHA-256 over the vectors and chunks, repeated in the chunk artifact.
    pub fingerprint: String,
}

#[derive(Serialize)]
struct VectorArtifactRef<'a> {
    manifest: IndexManifest,
    data: &'a [f32],
}

#[derive(Deserialize)]
struct VectorArtifact {
    manifest: IndexManifest,
    data: Vec<f32>,
}

#[derive(Serialize)]
struct ChunkArtifactRef<'a> {
    fingerprint: &'a str,
    count: usize,
    chunks: &'a [Chunk],
}

#[derive(Deserialize)]
struct ChunkArtifact {
    fingerprint: String,
    count: usize,
    chunks: Vec<Chunk>,
}

/// Reads and writes a [`KnowledgeBase`] under a directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    /// Create a store rooted at `dir`. Nothing is touched until save or load.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the artifacts.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether both artifacts are present.
    pub async fn exists(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.vectors_path()).await?
            && tokio::fs::try_exists(self.chunks_path()).await?)
    }

    /// Write both artifacts, replacing any previous index.
    ///
    /// Each artifact is written to a temporary file first and both are
    /// renamed into place only after both writes succeed.
    pub async fn save(&self, kb: &KnowledgeBase) -> Result<IndexManifest> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let fingerprint = fingerprint(kb.index().as_slice(), &serde_json::to_vec(kb.chunks())?);
        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            dimensions: kb.dimensions(),
            count: kb.len(),
            embedding_model: kb.embedding_model().to_string(),
            created_at: Utc::now(),
            fingerprint,
        };

        let vectors = serde_json::to_vec(&VectorArtifactRef {
            manifest: manifest.clone(),
            data: kb.index().as_slice(),
        })?;
        let chunks = serde_json::to_vec(&ChunkArtifactRef {
            fingerprint: &manifest.fingerprint,
            count: kb.len(),
            chunks: kb.chunks(),
        })?;

        let vectors_tmp = self.dir.join(format!("{VECTORS_FILE}.tmp"));
        let chunks_tmp = self.dir.join(format!("{CHUNKS_FILE}.tmp"));
        tokio::fs::write(&vectors_tmp, vectors).await?;
        tokio::fs::write(&chunks_tmp, chunks).await?;
        tokio::fs::rename(&vectors_tmp, self.vectors_path()).await?;
        tokio::fs::rename(&chunks_tmp, self.chunks_path()).await?;

        info!(dir = %self.dir.display(), count = manifest.count, "saved index");
        Ok(manifest)
    }

    /// Load both artifacts and check that they agree.
    ///
    /// # Errors
    ///
    /// - [`RagError::IndexMissing`] if neither artifact exists
    /// - [`RagError::IndexCorrupt`] if only one exists, their counts disagree,
    ///   or they come from different saves
    pub async fn load(&self) -> Result<KnowledgeBase> {
        let vectors_path = self.vectors_path();
        let chunks_path = self.chunks_path();
        let has_vectors = tokio::fs::try_exists(&vectors_path).await?;
        let has_chunks = tokio::fs::try_exists(&chunks_path).await?;

        match (has_vectors, has_chunks) {
            (false, false) => return Err(RagError::IndexMissing { dir: self.dir.clone() }),
            (true, false) => {
                return Err(RagError::IndexCorrupt(format!(
                    "{} exists without {}",
                    vectors_path.display(),
                    chunks_path.display()
                )));
            }
            (false, true) => {
                return Err(RagError::IndexCorrupt(format!(
                    "{} exists without {}",
                    chunks_path.display(),
                    vectors_path.display()
                )));
            }
            (true, true) => {}
        }

        let vectors: VectorArtifact = serde_json::from_slice(&tokio::fs::read(&vectors_path).await?)?;
        let chunks: ChunkArtifact = serde_json::from_slice(&tokio::fs::read(&chunks_path).await?)?;
        let manifest = vectors.manifest;

        if manifest.format_version != FORMAT_VERSION {
            return Err(RagError::IndexCorrupt(format!(
                "unsupported index format version {}",
                manifest.format_version
            )));
        }
        if manifest.count != chunks.count || chunks.count != chunks.chunks.len() {
            return Err(RagError::IndexCorrupt(format!(
                "vector artifact holds {} entries but chunk artifact holds {} ({} declared)",
                manifest.count,
                chunks.chunks.len(),
                chunks.count
            )));
        }

        if manifest.fingerprint != chunks.fingerprint {
            return Err(RagError::IndexCorrupt(format!(
                "{} and {} were written by different saves",
                vectors_path.display(),
                chunks_path.display()
            )));
        }

        let index = FlatIndex::from_raw(manifest.dimensions, manifest.count, vectors.data)?;
        debug!(dir = %self.dir.display(), count = manifest.count, "loaded index");
        KnowledgeBase::from_parts(index, chunks.chunks, manifest.embedding_model)
    }

    fn vectors_path(&self) -> PathBuf {
        self.dir.join(VECTORS_FILE)
    }

    fn chunks_path(&self) -> PathBuf {
        self.dir.join(CHUNKS_FILE)
    }
}

/// Hex SHA-256 of the little-endian vector buffer followed by the serialized chunks.
fn fingerprint(data: &[f32], chunks_json: &[u8]) -> String {
    let mut hasher = Sha256::new();
    for value in data {
        hasher.update(value.to_le_bytes());
    }
    hasher.update(chunks_json);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, ordinal: usize) -> Chunk {
        Chunk { text: text.to_string(), source_id: "a.txt".to_string(), ordinal }
    }

    fn sample() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new(2, "test-model");
        kb.extend(vec![chunk("first", 0), chunk("second", 1)], vec![vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        kb
    }

    #[test]
    fn extend_rejects_count_mismatch() {
        let mut kb = KnowledgeBase::new(2, "m");
        let err = kb.extend(vec![chunk("a", 0)], vec![]).unwrap_err();
        assert!(matches!(err, RagError::IndexCorrupt(_)));
        assert!(kb.is_empty());
    }

    #[test]
    fn from_parts_rejects_count_mismatch() {
        let index = FlatIndex::from_raw(2, 1, vec![1.0, 0.0]).unwrap();
        assert!(KnowledgeBase::from_parts(index, vec![], "m").is_err());
    }

    #[tokio::test]
    async fn round_trips_through_disk() {
        let temp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(temp.path().join("index"));
        let kb = sample();

        let manifest = store.save(&kb).await.unwrap();
        assert_eq!(manifest.count, 2);
        assert!(store.exists().await.unwrap());

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, kb);
        assert_eq!(loaded.embedding_model(), "test-model");
    }

    #[tokio::test]
    async fn missing_directory_is_index_missing() {
        let temp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(temp.path().join("nope"));
        assert!(!store.exists().await.unwrap());
        assert!(matches!(store.load().await, Err(RagError::IndexMissing { .. })));
    }

    #[tokio::test]
    async fn one_artifact_without_the_other_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(temp.path());
        store.save(&sample()).await.unwrap();
        std::fs::remove_file(temp.path().join(CHUNKS_FILE)).unwrap();

        assert!(matches!(store.load().await, Err(RagError::IndexCorrupt(_))));
    }

    #[tokio::test]
    async fn disagreeing_counts_are_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(temp.path());
        store.save(&sample()).await.unwrap();

        let other = IndexStore::new(temp.path().join("other"));
        let mut bigger = sample();
        bigger.extend(vec![chunk("third", 2)], vec![vec![0.6, 0.8]]).unwrap();
        other.save(&bigger).await.unwrap();
        std::fs::copy(
            temp.path().join("other").join(CHUNKS_FILE),
            temp.path().join(CHUNKS_FILE),
        )
        .unwrap();

        assert!(matches!(store.load().await, Err(RagError::IndexCorrupt(_))));
    }

    #[tokio::test]
    async fn vectors_from_another_save_of_the_same_size_are_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(temp.path());
        store.save(&sample()).await.unwrap();

        let other = IndexStore::new(temp.path().join("other"));
        let mut swapped = KnowledgeBase::new(2, "test-model");
        swapped
            .extend(vec![chunk("first", 0), chunk("second", 1)], vec![vec![0.0, 1.0], vec![1.0, 0.0]])
            .unwrap();
        other.save(&swapped).await.unwrap();
        std::fs::copy(
            temp.path().join("other").join(VECTORS_FILE),
            temp.path().join(VECTORS_FILE),
        )
        .unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, RagError::IndexCorrupt(msg) if msg.contains("different saves")));
    }

    #[tokio::test]
    async fn identical_content_shares_a_fingerprint() {
        let temp = tempfile::tempdir().unwrap();
        let first = IndexStore::new(temp.path().join("a")).save(&sample()).await.unwrap();
        let second = IndexStore::new(temp.path().join("b")).save(&sample()).await.unwrap();
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.fingerprint.len(), 64);
    }
}
