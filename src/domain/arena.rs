use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

/// Tree node in the arena-based hierarchy structure.
///
/// Parent and children are arena indices, so nodes never own each other.
#[derive(Debug)]
pub struct TreeNode {
    /// Name of the user this node belongs to
    pub name: String,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in insertion order
    pub children: Vec<Index>,
}

/// A node that was taken out of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedNode {
    pub name: String,
    pub parent: Option<String>,
    /// Former children, now attached to `parent` (or roots)
    pub children: Vec<String>,
}

/// Arena-based forest of introduction relationships.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Roots are kept in an ordered list so the forest renders deterministically.
#[derive(Debug)]
pub struct HierarchyTree {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Name lookup
    by_name: HashMap<String, Index>,
    /// Parentless nodes, in the order they became roots
    roots: Vec<Index>,
}

impl Default for HierarchyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_name: HashMap::new(),
            roots: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<Index> {
        self.by_name.get(name).copied()
    }

    /// Insert a node below `parent`, or as a new root.
    ///
    /// The caller guarantees `name` is not yet present and `parent` is live.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, name: &str, parent: Option<Index>) -> Index {
        debug_assert!(!self.contains(name), "duplicate tree node {name}");
        let parent = parent.filter(|&p| self.arena.contains(p));
        let node = TreeNode {
            name: name.to_string(),
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);
        self.by_name.insert(name.to_string(), node_idx);

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.roots.push(node_idx),
        }

        node_idx
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn node(&self, name: &str) -> Option<&TreeNode> {
        self.index_of(name).and_then(|idx| self.arena.get(idx))
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.node(name)
            .and_then(|node| node.parent)
            .and_then(|p| self.arena.get(p))
            .map(|p| p.name.as_str())
    }

    pub fn children_of(&self, name: &str) -> Vec<&str> {
        self.node(name)
            .map(|node| self.names(&node.children))
            .unwrap_or_default()
    }

    pub fn root_indices(&self) -> &[Index] {
        &self.roots
    }

    pub fn roots(&self) -> Vec<&str> {
        self.names(&self.roots)
    }

    pub fn is_root(&self, name: &str) -> bool {
        self.node(name).is_some_and(|node| node.parent.is_none())
    }

    fn names(&self, indices: &[Index]) -> Vec<&str> {
        indices
            .iter()
            .filter_map(|&idx| self.arena.get(idx))
            .map(|node| node.name.as_str())
            .collect()
    }

    /// Remove a node and repair the hierarchy around it.
    ///
    /// Children of a non-root move to the removed node's parent, taking its
    /// place among the siblings. Children of a root become roots, taking its
    /// place in the root list.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_node(&mut self, name: &str) -> Option<DetachedNode> {
        let idx = self.by_name.remove(name)?;
        let node = self.arena.remove(idx)?;

        for &child_idx in &node.children {
            if let Some(child) = self.arena.get_mut(child_idx) {
                child.parent = node.parent;
            }
        }

        let siblings = match node.parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        match siblings.iter().position(|&i| i == idx) {
            Some(pos) => {
                siblings.splice(pos..=pos, node.children.iter().copied());
            }
            None => siblings.extend(node.children.iter().copied()),
        }

        let parent = node
            .parent
            .and_then(|p| self.arena.get(p))
            .map(|p| p.name.clone());
        let children = self
            .names(&node.children)
            .into_iter()
            .map(str::to_string)
            .collect();

        Some(DetachedNode {
            name: node.name,
            parent,
            children,
        })
    }

    /// Change the name stored for a node. Links are index based and stay intact.
    #[instrument(level = "trace", skip(self))]
    pub fn rename_node(&mut self, old: &str, new: &str) -> bool {
        if self.contains(new) {
            return false;
        }
        let Some(idx) = self.by_name.remove(old) else {
            return false;
        };
        if let Some(node) = self.arena.get_mut(idx) {
            node.name = new.to_string();
        }
        self.by_name.insert(new.to_string(), idx);
        true
    }

    /// Pre-order traversal over the whole forest, roots in root-list order.
    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Parent → child name pairs, in pre-order.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.iter()
            .flat_map(|(_, node)| {
                self.names(&node.children)
                    .into_iter()
                    .map(move |child| (node.name.clone(), child.to_string()))
            })
            .collect()
    }

    pub fn names_iter(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Verify link symmetry, root bookkeeping and acyclicity.
    pub fn check(&self) -> Result<(), String> {
        for (idx, node) in self.arena.iter() {
            if self.by_name.get(&node.name) != Some(&idx) {
                return Err(format!("name index out of date for {}", node.name));
            }
            match node.parent {
                Some(p) => {
                    let parent = self
                        .arena
                        .get(p)
                        .ok_or_else(|| format!("{} points to a dead parent", node.name))?;
                    if !parent.children.contains(&idx) {
                        return Err(format!("{} missing from its parent's children", node.name));
                    }
                }
                None if !self.roots.contains(&idx) => {
                    return Err(format!("{} is parentless but not a root", node.name));
                }
                None => {}
            }
            for &child in &node.children {
                if self.arena.get(child).and_then(|c| c.parent) != Some(idx) {
                    return Err(format!("child link of {} is not mirrored", node.name));
                }
            }
            // a chain longer than the node count must revisit a node
            let mut steps = 0;
            let mut cursor = node.parent;
            while let Some(p) = cursor {
                steps += 1;
                if steps > self.arena.len() {
                    return Err(format!("cycle through {}", node.name));
                }
                cursor = self.arena.get(p).and_then(|n| n.parent);
            }
        }
        if self.by_name.len() != self.arena.len() {
            return Err("name index size differs from arena".to_string());
        }
        Ok(())
    }
}

pub struct TreeIterator<'a> {
    tree: &'a HierarchyTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a HierarchyTree) -> Self {
        // Push roots in reverse order for left-to-right traversal
        let stack = tree.root_indices().iter().rev().copied().collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
