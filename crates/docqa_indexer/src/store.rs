use std::path::Path;

use chrono::{DateTime, Utc};
use docqa_domain::{Chunk, ChunkVector, Error, Result, RetrievedChunk};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::manifest::{
    DistanceMetric, IndexManifest, MANIFEST_FILE, MANIFEST_VERSION, chunks_file_name,
    is_data_file, vectors_file_name,
};

const MANIFEST_TMP_FILE: &str = "manifest.json.tmp";

/// In-memory exact nearest-neighbor index over the chunk vectors of one
/// collection.
///
/// All vectors share one dimension and were produced by one embedding model.
/// Persisted as a generation of data files plus a manifest that points at it.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    model_id: String,
    dimension: usize,
    metric: DistanceMetric,
    created_at: DateTime<Utc>,
    entries: Vec<ChunkVector>,
}

impl VectorIndex {
    /// Builds a fresh index. Fails on empty input.
    pub fn create(vectors: Vec<ChunkVector>, model_id: impl Into<String>) -> Result<Self> {
        let Some(first) = vectors.first() else {
            return Err(Error::EmptyInput("no vectors to index".to_string()));
        };
        let dimension = first.dimension();
        if dimension == 0 {
            return Err(Error::Validation(
                "vectors must have at least one dimension".to_string(),
            ));
        }
        check_dimension(dimension, &vectors)?;

        Ok(Self {
            model_id: model_id.into(),
            dimension,
            metric: DistanceMetric::default(),
            created_at: Utc::now(),
            entries: vectors,
        })
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Adds vectors produced by `model_id`, which must be the model the index
    /// was built with.
    pub fn append(&mut self, vectors: Vec<ChunkVector>, model_id: &str) -> Result<()> {
        if model_id != self.model_id {
            return Err(Error::ModelMismatch {
                indexed: self.model_id.clone(),
                requested: model_id.to_string(),
            });
        }
        check_dimension(self.dimension, &vectors)?;
        self.entries.extend(vectors);
        Ok(())
    }

    /// Returns the `k` entries nearest to `vector`, nearest first.
    ///
    /// `k` larger than the index returns every entry. Equal distances are
    /// ordered by chunk sequence index, then by insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(Error::InvalidK);
        }
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch { expected: self.dimension, actual: vector.len() });
        }

        let mut scored = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (self.metric.distance(vector, &entry.vector), position))
            .collect::<Vec<_>>();
        scored.sort_by(|(a, pa), (b, pb)| {
            a.total_cmp(b)
                .then_with(|| {
                    let sa = self.entries[*pa].chunk.sequence_index;
                    let sb = self.entries[*pb].chunk.sequence_index;
                    sa.cmp(&sb)
                })
                .then(pa.cmp(pb))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, position)| {
                RetrievedChunk::new(self.entries[position].chunk.clone(), distance)
            })
            .collect())
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn entries(&self) -> &[ChunkVector] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads the manifest in `dir`, if there is one.
    pub async fn read_manifest(dir: &Path) -> Result<Option<IndexManifest>> {
        let path = dir.join(MANIFEST_FILE);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::corruption(&path, format!("unreadable manifest: {e}"))),
        };
        let manifest: IndexManifest = serde_json::from_slice(&raw)
            .map_err(|e| Error::corruption(&path, format!("invalid manifest: {e}")))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(Error::corruption(
                &path,
                format!("unsupported manifest version {}", manifest.version),
            ));
        }
        Ok(Some(manifest))
    }

    /// Loads the index saved in `dir`.
    ///
    /// Without a manifest there is no index, whatever other files exist.
    pub async fn load(dir: &Path) -> Result<Self> {
        let Some(manifest) = Self::read_manifest(dir).await? else {
            let name = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string());
            return Err(Error::IndexNotFound(name));
        };

        let chunks_raw = read_data_file(dir, &manifest.chunks_file, &manifest.chunks_sha256).await?;
        let vectors_raw =
            read_data_file(dir, &manifest.vectors_file, &manifest.vectors_sha256).await?;

        let chunks_path = dir.join(&manifest.chunks_file);
        let chunks: Vec<Chunk> = serde_json::from_slice(&chunks_raw)
            .map_err(|e| Error::corruption(&chunks_path, format!("invalid chunk records: {e}")))?;
        if chunks.len() != manifest.vector_count {
            return Err(Error::corruption(
                &chunks_path,
                format!("expected {} chunk records, found {}", manifest.vector_count, chunks.len()),
            ));
        }

        let vectors_path = dir.join(&manifest.vectors_file);
        let expected_len = manifest
            .vector_count
            .checked_mul(manifest.dimension)
            .and_then(|n| n.checked_mul(size_of::<f32>()))
            .ok_or_else(|| {
                Error::corruption(
                    &vectors_path,
                    format!(
                        "{} vectors of dimension {} exceed the addressable size",
                        manifest.vector_count, manifest.dimension
                    ),
                )
            })?;
        if manifest.dimension == 0 || vectors_raw.len() != expected_len {
            return Err(Error::corruption(
                &vectors_path,
                format!("expected {expected_len} bytes of vector data, found {}", vectors_raw.len()),
            ));
        }

        let values = vectors_raw
            .chunks_exact(size_of::<f32>())
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect::<Vec<_>>();
        let entries = chunks
            .into_iter()
            .zip(values.chunks_exact(manifest.dimension))
            .map(|(chunk, vector)| ChunkVector::new(chunk, vector.to_vec()))
            .collect::<Vec<_>>();

        debug!(dir = %dir.display(), vectors = entries.len(), generation = %manifest.generation, "Loaded index");
        Ok(Self {
            model_id: manifest.model_id,
            dimension: manifest.dimension,
            metric: manifest.metric,
            created_at: manifest.created_at,
            entries,
        })
    }

    /// Persists the index to `dir`, creating the directory if needed.
    ///
    /// Data files are written and synced under a new generation before the
    /// manifest is swapped in with a rename, so a crash leaves either the
    /// previous index or this one. Data files of older generations are
    /// removed afterwards.
    pub async fn save(&self, dir: &Path) -> Result<IndexManifest> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::storage(dir, e))?;

        let generation = Uuid::new_v4().simple().to_string();
        let chunks_file = chunks_file_name(&generation);
        let vectors_file = vectors_file_name(&generation);

        let chunks = serde_json::to_vec(&self.entries.iter().map(|e| &e.chunk).collect::<Vec<_>>())
            .map_err(|e| Error::storage(dir.join(&chunks_file), std::io::Error::other(e)))?;
        let vectors = self
            .entries
            .iter()
            .flat_map(|e| e.vector.iter().flat_map(|x| x.to_le_bytes()))
            .collect::<Vec<u8>>();

        write_synced(&dir.join(&chunks_file), &chunks).await?;
        write_synced(&dir.join(&vectors_file), &vectors).await?;

        let manifest = IndexManifest {
            version: MANIFEST_VERSION,
            model_id: self.model_id.clone(),
            dimension: self.dimension,
            metric: self.metric,
            vector_count: self.entries.len(),
            created_at: self.created_at,
            updated_at: Utc::now(),
            generation: generation.clone(),
            chunks_sha256: sha256_hex(&chunks),
            vectors_sha256: sha256_hex(&vectors),
            chunks_file,
            vectors_file,
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| Error::storage(dir.join(MANIFEST_FILE), std::io::Error::other(e)))?;

        let tmp = dir.join(MANIFEST_TMP_FILE);
        write_synced(&tmp, &manifest_json).await?;
        tokio::fs::rename(&tmp, dir.join(MANIFEST_FILE))
            .await
            .map_err(|e| Error::storage(dir.join(MANIFEST_FILE), e))?;
        if let Ok(handle) = tokio::fs::File::open(dir).await
            && let Err(e) = handle.sync_all().await
        {
            warn!(dir = %dir.display(), error = %e, "Failed to sync index directory");
        }

        remove_stale_generations(dir, &generation).await;
        debug!(dir = %dir.display(), vectors = manifest.vector_count, generation = %generation, "Saved index");
        Ok(manifest)
    }
}

fn check_dimension(expected: usize, vectors: &[ChunkVector]) -> Result<()> {
    match vectors.iter().find(|v| v.dimension() != expected) {
        Some(v) => Err(Error::DimensionMismatch { expected, actual: v.dimension() }),
        None => Ok(()),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

async fn read_data_file(dir: &Path, name: &str, sha256: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    if !is_data_file(name) || name.contains(['/', '\\']) {
        return Err(Error::corruption(&path, "manifest references an invalid data file"));
    }
    let raw = tokio::fs::read(&path)
        .await
        .map_err(|e| Error::corruption(&path, format!("unreadable data file: {e}")))?;
    if sha256_hex(&raw) != sha256 {
        return Err(Error::corruption(&path, "checksum mismatch"));
    }
    Ok(raw)
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| Error::storage(path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| Error::storage(path, e))?;
    file.sync_all().await.map_err(|e| Error::storage(path, e))
}

/// Best effort: the new manifest is already in place, so a leftover file
/// only costs disk space.
async fn remove_stale_generations(dir: &Path, generation: &str) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_data_file(&name) && !name.contains(generation) {
            if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                warn!(file = %entry.path().display(), error = %e, "Failed to remove stale index file");
            }
        }
    }
}
