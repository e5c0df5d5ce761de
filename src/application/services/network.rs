//! Network registry
//!
//! Owns every user and keeps the introduction hierarchy and the relationship
//! graph in lockstep. Each mutating call validates its input before touching
//! any structure, so a rejected call leaves the network exactly as it was.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, instrument, warn};

use crate::application::services::analytics;
use crate::application::services::sentiment::{PolarityAnalyzer, SentimentScorer};
use crate::domain::{
    DomainError, DomainResult, GraphSnapshot, HierarchyTree, InsertOutcome, ProfileUpdate,
    RelationshipGraph, Removal, TreeView, User, UserInfo, UserSentiment,
};

/// Name-keyed registry over the hierarchy tree and relationship graph.
#[derive(Debug, Default)]
pub struct NetworkRegistry {
    users: HashMap<String, User>,
    tree: HierarchyTree,
    graph: RelationshipGraph,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.users.contains_key(lookup_key(name))
    }

    pub fn user(&self, name: &str) -> Option<&User> {
        self.users.get(lookup_key(name))
    }

    /// All user names, sorted.
    pub fn names(&self) -> BTreeSet<&str> {
        self.users.keys().map(String::as_str).collect()
    }

    pub fn tree(&self) -> &HierarchyTree {
        &self.tree
    }

    pub fn graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    fn user_or_err(&self, name: &str) -> DomainResult<&User> {
        let name = lookup_key(name);
        self.users
            .get(name)
            .ok_or_else(|| DomainError::UnknownUser(name.to_string()))
    }

    /// Add a user, optionally introduced by `parent`.
    ///
    /// An unknown parent is not fatal: the user becomes a root and the outcome
    /// carries `UnknownParent` for the caller to report.
    #[instrument(level = "debug", skip(self))]
    pub fn insert(&mut self, name: &str, parent: Option<&str>) -> DomainResult<InsertOutcome> {
        let name = validate_name(name)?;
        if self.users.contains_key(name) {
            return Err(DomainError::DuplicateUser(name.to_string()));
        }
        let parent = parent.map(str::trim).filter(|p| !p.is_empty());
        let parent_idx = parent.and_then(|p| self.tree.index_of(p));

        self.users.insert(name.to_string(), User::new(name));
        self.graph.add_node(name);
        self.tree.insert_node(name, parent_idx);

        let outcome = match (parent, parent_idx) {
            (Some(p), Some(_)) => {
                self.graph.add_edge(p, name);
                InsertOutcome::Child {
                    parent: p.to_string(),
                }
            }
            (Some(p), None) => {
                warn!("parent {} not found, adding {} without parent", p, name);
                InsertOutcome::Fallback {
                    reason: DomainError::UnknownParent(p.to_string()),
                }
            }
            (None, _) => InsertOutcome::Root,
        };
        debug!("insert: {} -> {:?}", name, outcome);
        debug_assert!(self.check_consistency().is_ok());
        Ok(outcome)
    }

    /// Delete a user and splice its children into its place.
    ///
    /// Children of a root become roots; children of any other node move to
    /// that node's parent. The graph node goes away with all incident edges.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, name: &str) -> DomainResult<Removal> {
        let name = lookup_key(name);
        if !self.users.contains_key(name) {
            return Err(DomainError::UnknownUser(name.to_string()));
        }
        let detached = self
            .tree
            .remove_node(name)
            .ok_or_else(|| DomainError::Inconsistent(format!("{} missing from tree", name)))?;
        self.graph.remove_node(name);
        self.users.remove(name);

        debug!(
            "remove: {} (parent: {:?}, relocated: {:?})",
            name, detached.parent, detached.children
        );
        debug_assert!(self.check_consistency().is_ok());
        Ok(Removal {
            name: detached.name,
            former_parent: detached.parent,
            relocated: detached.children,
        })
    }

    #[instrument(level = "trace", skip(self))]
    pub fn search(&self, name: &str) -> DomainResult<UserInfo> {
        let name = lookup_key(name);
        let user = self.user_or_err(name)?;
        Ok(UserInfo {
            name: user.name.clone(),
            parent: self.tree.parent_of(name).map(str::to_string),
            children: self
                .tree
                .children_of(name)
                .into_iter()
                .map(str::to_string)
                .collect(),
            interactions: user.interactions().to_vec(),
            profile_image: user.profile_image.clone(),
            bio: user.bio.clone(),
        })
    }

    /// Lazily rendered forest; `EmptyNetwork` if there is nothing to draw.
    pub fn render_tree(&self) -> DomainResult<TreeView<'_>> {
        if self.is_empty() {
            return Err(DomainError::EmptyNetwork);
        }
        Ok(TreeView::new(&self.tree))
    }

    #[instrument(level = "debug", skip(self, text))]
    pub fn add_interaction(&mut self, name: &str, text: &str) -> DomainResult<()> {
        let name = lookup_key(name);
        let user = self
            .users
            .get_mut(name)
            .ok_or_else(|| DomainError::UnknownUser(name.to_string()))?;
        user.add_interaction(text);
        debug!("add_interaction: {} now has {}", name, user.interactions().len());
        Ok(())
    }

    /// Update profile fields; blank replacements keep the current value.
    ///
    /// A new name re-keys the user map, tree node and graph node together.
    #[instrument(level = "debug", skip(self))]
    pub fn edit_profile(&mut self, name: &str, update: &ProfileUpdate) -> DomainResult<UserInfo> {
        let name = lookup_key(name);
        self.user_or_err(name)?;
        let new_name = match update.name() {
            Some(new) if new != name => {
                if self.users.contains_key(new) {
                    return Err(DomainError::NameTaken(new.to_string()));
                }
                Some(new)
            }
            _ => None,
        };

        let current = match new_name {
            Some(new) => {
                self.rekey(name, new);
                new
            }
            None => name,
        };
        if let Some(user) = self.users.get_mut(current) {
            user.apply_profile(update);
        }
        debug_assert!(self.check_consistency().is_ok());
        self.search(current)
    }

    /// Callers have checked that `old` exists and `new` is free.
    fn rekey(&mut self, old: &str, new: &str) {
        if let Some(mut user) = self.users.remove(old) {
            user.name = new.to_string();
            self.users.insert(new.to_string(), user);
        }
        self.tree.rename_node(old, new);
        self.graph.rename_node(old, new);
        debug!("rekey: {} -> {}", old, new);
    }

    /// Parent → child pairs of the hierarchy, in pre-order.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.tree.edges()
    }

    /// Graphviz description of the hierarchy.
    pub fn export_dot(&self) -> DomainResult<String> {
        if self.is_empty() {
            return Err(DomainError::EmptyNetwork);
        }
        let mut dot = String::from("digraph tree {\n");
        for (_, node) in self.tree.iter() {
            dot.push_str(&format!("    {};\n", dot_id(&node.name)));
        }
        for (parent, child) in self.edges() {
            dot.push_str(&format!("    {} -> {};\n", dot_id(&parent), dot_id(&child)));
        }
        dot.push_str("}\n");
        Ok(dot)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    pub fn detect_communities(&self, max_iterations: usize) -> Vec<BTreeSet<String>> {
        analytics::detect_communities(&self.snapshot(), max_iterations)
    }

    pub fn centrality(&self) -> BTreeMap<String, f64> {
        analytics::centrality(&self.snapshot())
    }

    pub fn score_user<A: PolarityAnalyzer>(
        &self,
        name: &str,
        scorer: &SentimentScorer<A>,
    ) -> DomainResult<f64> {
        scorer.score_user(self.user_or_err(name)?)
    }

    /// Mean polarity of every user, sorted by name.
    pub fn analyze_sentiments<A: PolarityAnalyzer>(
        &self,
        scorer: &SentimentScorer<A>,
    ) -> Vec<UserSentiment> {
        self.names()
            .into_iter()
            .filter_map(|name| self.users.get(name))
            .map(|user| UserSentiment {
                name: user.name.clone(),
                score: scorer.score_user(user).ok(),
            })
            .collect()
    }

    /// Verify that the user map, tree and graph describe the same network.
    pub fn check_consistency(&self) -> DomainResult<()> {
        let users = self.names();
        if users != self.graph.nodes() {
            return Err(DomainError::Inconsistent(
                "user map and graph hold different names".to_string(),
            ));
        }
        let tree_nodes: BTreeSet<&str> = self.tree.names_iter().collect();
        if users != tree_nodes {
            return Err(DomainError::Inconsistent(
                "user map and tree hold different names".to_string(),
            ));
        }
        if let Some((key, _)) = self.users.iter().find(|(key, user)| **key != user.name) {
            return Err(DomainError::Inconsistent(format!("stale key {}", key)));
        }
        self.tree.check().map_err(DomainError::Inconsistent)
    }
}

/// Names are stored trimmed; every lookup trims the same way.
fn lookup_key(name: &str) -> &str {
    name.trim()
}

fn validate_name(name: &str) -> DomainResult<&str> {
    let trimmed = lookup_key(name);
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

fn dot_id(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_padded_name_when_inserting_then_name_is_trimmed() {
        let mut registry = NetworkRegistry::new();
        registry.insert("  Ana ", None).unwrap();
        assert!(registry.contains("Ana"));
    }

    #[test]
    fn given_padded_name_when_looking_up_then_same_user_is_found() {
        let mut registry = NetworkRegistry::new();
        registry.insert(" Ana ", None).unwrap();
        registry.insert("Bruno", Some(" Ana")).unwrap();

        assert_eq!(registry.search(" Ana ").unwrap().children, vec!["Bruno"]);
        registry.add_interaction("Bruno ", "hello").unwrap();
        assert_eq!(registry.user(" Bruno").unwrap().interactions().len(), 1);
        let info = registry
            .edit_profile(" Bruno ", &ProfileUpdate::default().with_bio("hi"))
            .unwrap();
        assert_eq!(info.name, "Bruno");

        let removal = registry.remove(" Ana ").unwrap();

        assert_eq!(removal.name, "Ana");
        assert!(!registry.contains("Ana"));
        assert!(registry.tree().is_root("Bruno"));
    }

    #[test]
    fn given_blank_name_when_inserting_then_rejected_without_change() {
        let mut registry = NetworkRegistry::new();
        let err = registry.insert("   ", None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidName(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn given_blank_parent_when_inserting_then_user_is_root() {
        let mut registry = NetworkRegistry::new();
        let outcome = registry.insert("Ana", Some("")).unwrap();
        assert_eq!(outcome, InsertOutcome::Root);
    }

    #[test]
    fn given_user_as_own_parent_when_inserting_then_falls_back_to_root() {
        let mut registry = NetworkRegistry::new();
        let outcome = registry.insert("Ana", Some("Ana")).unwrap();
        assert_eq!(
            outcome.warning(),
            Some(&DomainError::UnknownParent("Ana".to_string()))
        );
        assert!(registry.tree().is_root("Ana"));
        assert!(registry.check_consistency().is_ok());
    }

    #[test]
    fn given_quotes_in_name_when_exporting_then_dot_escapes_them() {
        let mut registry = NetworkRegistry::new();
        registry.insert("a\"b", None).unwrap();
        let dot = registry.export_dot().unwrap();
        assert!(dot.contains("\"a\\\"b\";"));
    }
}
