use std::fmt;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::HierarchyTree;

pub trait TreeNodeConvert {
    /// One `termtree::Tree` per root, in root-list order.
    fn to_tree_strings(&self) -> Vec<Tree<String>>;
}

impl TreeNodeConvert for HierarchyTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_strings(&self) -> Vec<Tree<String>> {
        fn build_tree(arena: &HierarchyTree, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = arena.get_node(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = arena.get_node(child_idx) {
                        let mut child_tree = Tree::new(child.name.clone());
                        build_tree(arena, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }
        }

        self.root_indices()
            .iter()
            .filter_map(|&root_idx| {
                let root = self.get_node(root_idx)?;
                let mut tree = Tree::new(root.name.clone());
                build_tree(self, root_idx, &mut tree);
                Some(tree)
            })
            .collect()
    }
}

/// Lazily rendered view of the hierarchy.
///
/// Nothing is built until the view is formatted. Each root of the forest is
/// rendered as its own tree.
#[derive(Clone, Copy)]
pub struct TreeView<'a> {
    tree: &'a HierarchyTree,
}

impl<'a> TreeView<'a> {
    pub fn new(tree: &'a HierarchyTree) -> Self {
        Self { tree }
    }

    pub fn root_count(&self) -> usize {
        self.tree.root_indices().len()
    }
}

impl fmt::Display for TreeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tree in self.tree.to_tree_strings() {
            let rendered = tree.to_string();
            f.write_str(&rendered)?;
            if !rendered.ends_with('\n') {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TreeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeView")
            .field("roots", &self.tree.roots())
            .finish()
    }
}
