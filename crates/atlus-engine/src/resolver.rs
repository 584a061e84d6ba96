//! Canonical answer and puzzle input lookup.
//!
//! Answers live in per-variant artifacts at
//! `<root>/level<N>/problem_set/<variant>.json`, a JSON object whose
//! `output` field is the expected answer. The matching puzzle input handed
//! to participants is plain text at `<root>/level<N>/inputs/<variant>.txt`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use atlus_types::{level_slug, InputVariantId, LevelId};
use serde::Deserialize;

/// Errors resolving a canonical answer.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no artifact for level {level}, variant {input_variant_id}")]
    NotFound {
        level: LevelId,
        input_variant_id: InputVariantId,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed answer artifact {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of canonical answers. Implementations hold no per-request state.
pub trait AnswerResolver: Send + Sync {
    /// The canonical answer for `level` as seen by `input_variant_id`.
    fn resolve(
        &self,
        level: LevelId,
        input_variant_id: InputVariantId,
    ) -> Result<String, ResolveError>;
}

impl<R: AnswerResolver + ?Sized> AnswerResolver for Arc<R> {
    fn resolve(
        &self,
        level: LevelId,
        input_variant_id: InputVariantId,
    ) -> Result<String, ResolveError> {
        (**self).resolve(level, input_variant_id)
    }
}

/// On-disk answer artifact.
#[derive(Debug, Deserialize)]
struct ProblemSet {
    output: String,
}

/// Reads answer artifacts from a puzzles directory.
#[derive(Debug, Clone)]
pub struct FileAnswerResolver {
    root: PathBuf,
}

impl FileAnswerResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact for one level and variant.
    pub fn artifact_path(&self, level: LevelId, input_variant_id: InputVariantId) -> PathBuf {
        self.root
            .join(level_slug(level))
            .join("problem_set")
            .join(format!("{input_variant_id}.json"))
    }
}

impl AnswerResolver for FileAnswerResolver {
    fn resolve(
        &self,
        level: LevelId,
        input_variant_id: InputVariantId,
    ) -> Result<String, ResolveError> {
        let path = self.artifact_path(level, input_variant_id);
        let bytes = read_artifact(&path, level, input_variant_id)?;
        let problem_set: ProblemSet = serde_json::from_slice(&bytes)
            .map_err(|source| ResolveError::Malformed { path, source })?;
        Ok(problem_set.output)
    }
}

/// Reads per-variant puzzle inputs from a puzzles directory.
#[derive(Debug, Clone)]
pub struct FileInputResolver {
    root: PathBuf,
}

impl FileInputResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn input_path(&self, level: LevelId, input_variant_id: InputVariantId) -> PathBuf {
        self.root
            .join(level_slug(level))
            .join("inputs")
            .join(format!("{input_variant_id}.txt"))
    }

    /// The puzzle input `input_variant_id` receives for `level`, verbatim.
    pub fn input(
        &self,
        level: LevelId,
        input_variant_id: InputVariantId,
    ) -> Result<String, ResolveError> {
        let path = self.input_path(level, input_variant_id);
        let bytes = read_artifact(&path, level, input_variant_id)?;
        String::from_utf8(bytes).map_err(|e| ResolveError::Io {
            path,
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }
}

/// Read a per-variant file, mapping a missing file to `NotFound`.
fn read_artifact(
    path: &Path,
    level: LevelId,
    input_variant_id: InputVariantId,
) -> Result<Vec<u8>, ResolveError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ResolveError::NotFound {
            level,
            input_variant_id,
        }),
        Err(source) => Err(ResolveError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// In-memory answers keyed by `(level, variant)`.
#[derive(Debug, Clone, Default)]
pub struct StaticAnswerResolver {
    answers: HashMap<(LevelId, InputVariantId), String>,
}

impl StaticAnswerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an answer, builder style.
    pub fn with_answer(
        mut self,
        level: LevelId,
        input_variant_id: InputVariantId,
        answer: impl Into<String>,
    ) -> Self {
        self.insert(level, input_variant_id, answer);
        self
    }

    pub fn insert(
        &mut self,
        level: LevelId,
        input_variant_id: InputVariantId,
        answer: impl Into<String>,
    ) {
        self.answers.insert((level, input_variant_id), answer.into());
    }
}

impl AnswerResolver for StaticAnswerResolver {
    fn resolve(
        &self,
        level: LevelId,
        input_variant_id: InputVariantId,
    ) -> Result<String, ResolveError> {
        self.answers
            .get(&(level, input_variant_id))
            .cloned()
            .ok_or(ResolveError::NotFound {
                level,
                input_variant_id,
            })
    }
}
