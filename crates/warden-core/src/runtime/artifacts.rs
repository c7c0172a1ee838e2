// crates/warden-core/src/runtime/artifacts.rs
// ============================================================================
// Module: Warden In-Memory Artifact Store
// Description: Reference content-addressed ArtifactStore.
// Purpose: Hold run outputs too large or binary for the event log.
// Dependencies: crate::interfaces, sha2
// ============================================================================

//! ## Overview
//! Artifacts are addressed by the lowercase hex SHA-256 of their content, so
//! storing identical bytes twice yields the same reference and one copy.
//! Metadata rides alongside as a sidecar, preserved exactly as supplied with
//! the size filled in by the store. Content round-trips byte-for-byte.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::PoisonError;

use sha2::Digest;
use sha2::Sha256;

use crate::interfaces::ArtifactError;
use crate::interfaces::ArtifactMetadata;
use crate::interfaces::ArtifactRef;
use crate::interfaces::ArtifactStore;

// ============================================================================
// SECTION: In-Memory Artifact Store
// ============================================================================

/// One stored artifact: content plus its metadata sidecar.
#[derive(Debug, Clone)]
struct StoredArtifact {
    /// Exact content bytes.
    content: Vec<u8>,
    /// Metadata sidecar with size filled in.
    metadata: ArtifactMetadata,
}

/// Reference [`ArtifactStore`] keyed by content digest.
///
/// # Invariants
/// - Identical content maps to one stored copy under one reference.
/// - Retrieval returns exactly the bytes that were stored.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    /// Stored artifacts keyed by hex digest.
    artifacts: Mutex<BTreeMap<String, StoredArtifact>>,
}

impl InMemoryArtifactStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        let artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        artifacts.len()
    }

    /// Returns true when no artifacts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Computes the content-addressed reference for a byte sequence.
    #[must_use]
    pub fn digest(content: &[u8]) -> ArtifactRef {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        ArtifactRef { digest: hex }
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn store(
        &self,
        content: &[u8],
        metadata: ArtifactMetadata,
    ) -> Result<ArtifactRef, ArtifactError> {
        let artifact = Self::digest(content);
        let metadata = ArtifactMetadata {
            size: u64::try_from(content.len()).unwrap_or(u64::MAX),
            ..metadata
        };
        let mut artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        artifacts
            .insert(artifact.digest.clone(), StoredArtifact { content: content.to_vec(), metadata });
        Ok(artifact)
    }

    fn retrieve(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, ArtifactError> {
        let artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        artifacts
            .get(&artifact.digest)
            .map(|stored| stored.content.clone())
            .ok_or_else(|| ArtifactError::NotFound(artifact.digest.clone()))
    }

    fn exists(&self, artifact: &ArtifactRef) -> Result<bool, ArtifactError> {
        let artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(artifacts.contains_key(&artifact.digest))
    }

    fn delete(&self, artifact: &ArtifactRef) -> Result<(), ArtifactError> {
        let mut artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        artifacts
            .remove(&artifact.digest)
            .map(|_| ())
            .ok_or_else(|| ArtifactError::NotFound(artifact.digest.clone()))
    }

    fn metadata(&self, artifact: &ArtifactRef) -> Result<ArtifactMetadata, ArtifactError> {
        let artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        artifacts
            .get(&artifact.digest)
            .map(|stored| stored.metadata.clone())
            .ok_or_else(|| ArtifactError::NotFound(artifact.digest.clone()))
    }
}
