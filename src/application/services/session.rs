//! Network session
//!
//! One registry together with the configured scorer, analytics options and
//! export target. This is what the shell drives.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::services::network::NetworkRegistry;
use crate::application::services::sentiment::{LexiconAnalyzer, SentimentScorer};
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::{ExportConfig, Settings};
use crate::domain::UserSentiment;
use crate::infrastructure::traits::FileSystem;
use crate::util::path::export_path;

pub struct NetworkSession {
    registry: NetworkRegistry,
    scorer: SentimentScorer<LexiconAnalyzer>,
    max_iterations: usize,
    export: ExportConfig,
    fs: Arc<dyn FileSystem>,
}

impl NetworkSession {
    /// Create an empty session; configured lexicon words override built-in ones.
    pub fn new(settings: &Settings, fs: Arc<dyn FileSystem>) -> Self {
        let analyzer = LexiconAnalyzer::new()
            .with_words(settings.sentiment.words.iter().map(|(w, s)| (w, *s)));
        Self {
            registry: NetworkRegistry::new(),
            scorer: SentimentScorer::new(analyzer),
            max_iterations: settings.analytics.max_iterations,
            export: settings.export.clone(),
            fs,
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NetworkRegistry {
        &mut self.registry
    }

    pub fn communities(&self) -> Vec<BTreeSet<String>> {
        self.registry.detect_communities(self.max_iterations)
    }

    pub fn centrality(&self) -> BTreeMap<String, f64> {
        self.registry.centrality()
    }

    pub fn sentiment(&self, name: &str) -> ApplicationResult<f64> {
        Ok(self.registry.score_user(name, &self.scorer)?)
    }

    pub fn sentiments(&self) -> Vec<UserSentiment> {
        self.registry.analyze_sentiments(&self.scorer)
    }

    /// Write the hierarchy as Graphviz to `<export dir>/<filename>.dot`.
    ///
    /// Without a filename (or with a blank one) the configured default is used.
    /// Returns the written path.
    pub fn export_tree(&self, filename: Option<&str>) -> ApplicationResult<PathBuf> {
        let dot = self.registry.export_dot()?;
        let stem = filename
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.export.default_filename);
        let path = export_path(&self.export.dir, stem);
        debug!("export_tree: {} users -> {}", self.registry.len(), path.display());

        self.fs
            .ensure_parent(&path)
            .with_path_context("create export directory", &path)?;
        self.fs
            .write(&path, &dot)
            .with_path_context("write export", &path)?;
        info!("exported tree to {}", path.display());
        Ok(path)
    }
}
