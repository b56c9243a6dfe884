//! Durable phase artifacts
//!
//! One YAML file per [`PhaseId`] under the handoff directory. Writes go to a
//! temporary sibling first and are renamed into place, so a reader never
//! sees a half-written artifact.

use super::documents::PhaseDocument;
use crate::error::HandoffError;
use crate::yaml::parse_yaml;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Key of a persisted artifact
///
/// Besides the six phase documents, discovery's exploration report, the
/// detailed module analysis and the assembled final document have their own
/// artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseId {
    Discovery,
    Exploration,
    FileAnalysis,
    ModuleAnalysis,
    ModuleDetail,
    Synthesis,
    Examples,
    Faq,
    Final,
}

impl PhaseId {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseId::Discovery => "discovery",
            PhaseId::Exploration => "exploration",
            PhaseId::FileAnalysis => "file_analysis",
            PhaseId::ModuleAnalysis => "module_analysis",
            PhaseId::ModuleDetail => "module_detail",
            PhaseId::Synthesis => "synthesis",
            PhaseId::Examples => "examples",
            PhaseId::Faq => "faq",
            PhaseId::Final => "final",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.yaml", self.as_str())
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HandoffStore {
    dir: PathBuf,
}

impl HandoffStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, phase: PhaseId) -> PathBuf {
        self.dir.join(phase.file_name())
    }

    pub fn contains(&self, phase: PhaseId) -> bool {
        self.path_for(phase).is_file()
    }

    /// Drop every artifact left by an earlier run
    pub async fn reset(&self) -> Result<(), HandoffError> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(HandoffError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        }
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| HandoffError::Io {
                path: self.dir.clone(),
                source,
            })
    }

    /// Write `document` as the artifact for `phase`, replacing any prior one
    pub async fn save<T: Serialize>(
        &self,
        phase: PhaseId,
        document: &T,
    ) -> Result<PathBuf, HandoffError> {
        let yaml = serde_yaml::to_string(document).map_err(|source| HandoffError::Serialize {
            phase: phase.to_string(),
            source,
        })?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| HandoffError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.path_for(phase);
        let staging = self.dir.join(format!(".{}.tmp", phase.as_str()));
        fs::write(&staging, yaml.as_bytes())
            .await
            .map_err(|source| HandoffError::Io {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, &path)
            .await
            .map_err(|source| HandoffError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(phase = %phase, path = %path.display(), bytes = yaml.len(), "Saved handoff artifact");
        Ok(path)
    }

    /// Read the artifact for `phase`; `None` when none has been written
    pub async fn load<T: DeserializeOwned>(&self, phase: PhaseId) -> Result<Option<T>, HandoffError> {
        let path = self.path_for(phase);
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(HandoffError::Io { path, source }),
        };
        parse_yaml(&text)
            .map(Some)
            .map_err(|source| HandoffError::Deserialize { path, source })
    }

    pub async fn store<D: PhaseDocument>(&self, document: &D) -> Result<PathBuf, HandoffError> {
        self.save(D::ID, document).await
    }

    pub async fn fetch<D: PhaseDocument>(&self) -> Result<Option<D>, HandoffError> {
        self.load(D::ID).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::documents::{ModuleDetail, ModuleDetailSet};

    fn detail(name: &str) -> ModuleDetailSet {
        ModuleDetailSet {
            modules: vec![ModuleDetail {
                name: name.to_string(),
                analysis: format!("{} handles requests", name),
            }],
            architecture: None,
        }
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path().join(".handoffs"));

        let path = store.store(&detail("api")).await.unwrap();
        assert!(path.ends_with("module_detail.yaml"));
        assert!(store.contains(PhaseId::ModuleDetail));

        let loaded: ModuleDetailSet = store.fetch().await.unwrap().unwrap();
        assert_eq!(loaded, detail("api"));
    }

    #[tokio::test]
    async fn test_save_overwrites_prior_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());

        store.store(&detail("old")).await.unwrap();
        store.store(&detail("new")).await.unwrap();

        let loaded: ModuleDetailSet = store.fetch().await.unwrap().unwrap();
        assert_eq!(loaded.modules[0].name, "new");
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());
        let loaded: Option<ModuleDetailSet> = store.load(PhaseId::ModuleDetail).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_wrong_shape_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path());
        std::fs::write(store.path_for(PhaseId::ModuleDetail), "- just\n- a list\n").unwrap();

        let err = store.fetch::<ModuleDetailSet>().await.unwrap_err();
        assert!(matches!(err, HandoffError::Deserialize { .. }));
    }

    #[tokio::test]
    async fn test_reset_clears_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandoffStore::new(dir.path().join("h"));
        store.store(&detail("api")).await.unwrap();

        store.reset().await.unwrap();
        assert!(store.dir().is_dir());
        assert!(!store.contains(PhaseId::ModuleDetail));
    }
}
