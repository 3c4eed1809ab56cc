//! Category-tree navigation.
//!
//! Products are filed under leaf categories of a recursive tree. Pickers
//! walk that tree one level at a time: show the current level, descend into
//! a branch, go back, and accept a choice only once a leaf is reached.

use crate::types::{Category, CategoryId};

/// Read-only view over the category forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTree {
    roots: Vec<Category>,
}

impl CategoryTree {
    /// Wrap the root categories returned by the backend.
    #[must_use]
    pub const fn new(roots: Vec<Category>) -> Self {
        Self { roots }
    }

    /// Top-level categories.
    #[must_use]
    pub fn roots(&self) -> &[Category] {
        &self.roots
    }

    /// Total number of categories at every depth.
    #[must_use]
    pub fn len(&self) -> usize {
        fn count(nodes: &[Category]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.children)).sum()
        }
        count(&self.roots)
    }

    /// Whether the tree has no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find a category anywhere in the tree.
    #[must_use]
    pub fn find(&self, id: &CategoryId) -> Option<&Category> {
        self.path_to(id).and_then(|path| path.last().copied())
    }

    /// Categories from the root down to `id`, inclusive.
    #[must_use]
    pub fn path_to(&self, id: &CategoryId) -> Option<Vec<&Category>> {
        let mut path = Vec::new();
        path_in(&self.roots, id, &mut path).then_some(path)
    }

    /// Direct children of `parent`, or the roots when `parent` is `None`.
    ///
    /// Returns `None` if `parent` is not in the tree.
    #[must_use]
    pub fn children_of(&self, parent: Option<&CategoryId>) -> Option<&[Category]> {
        match parent {
            None => Some(&self.roots),
            Some(id) => self.find(id).map(|c| c.children.as_slice()),
        }
    }

    /// Every leaf category, depth-first.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Category> {
        fn collect<'a>(nodes: &'a [Category], out: &mut Vec<&'a Category>) {
            for node in nodes {
                if node.is_leaf() {
                    out.push(node);
                } else {
                    collect(&node.children, out);
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.roots, &mut out);
        out
    }
}

fn path_in<'a>(nodes: &'a [Category], id: &CategoryId, path: &mut Vec<&'a Category>) -> bool {
    for node in nodes {
        path.push(node);
        if &node.id == id || path_in(&node.children, id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Outcome of [`CategoryBrowser::choose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseStep<'a> {
    /// The chosen category has children; the browser now lists them.
    Descended,
    /// The chosen category is a leaf and is the final selection.
    Selected(&'a Category),
}

/// Stepwise navigation over a [`CategoryTree`].
#[derive(Debug, Clone)]
pub struct CategoryBrowser<'a> {
    tree: &'a CategoryTree,
    trail: Vec<&'a Category>,
}

impl<'a> CategoryBrowser<'a> {
    /// Start at the roots.
    #[must_use]
    pub const fn new(tree: &'a CategoryTree) -> Self {
        Self {
            tree,
            trail: Vec::new(),
        }
    }

    /// Categories offered at the current level.
    #[must_use]
    pub fn options(&self) -> &'a [Category] {
        let tree: &'a CategoryTree = self.tree;
        self.trail
            .last()
            .copied()
            .map_or_else(|| tree.roots(), |c| c.children.as_slice())
    }

    /// Names from the root to the current level.
    #[must_use]
    pub fn breadcrumb(&self) -> Vec<&'a str> {
        self.trail.iter().map(|c| c.name.as_str()).collect()
    }

    /// Depth of the current level (0 at the roots).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.trail.len()
    }

    /// Pick one of the current options.
    ///
    /// Returns `None` if `id` is not offered at this level.
    pub fn choose(&mut self, id: &CategoryId) -> Option<BrowseStep<'a>> {
        let chosen = self.options().iter().find(|c| &c.id == id)?;
        if chosen.is_leaf() {
            return Some(BrowseStep::Selected(chosen));
        }
        self.trail.push(chosen);
        Some(BrowseStep::Descended)
    }

    /// Go up one level. Returns `false` when already at the roots.
    pub fn back(&mut self) -> bool {
        self.trail.pop().is_some()
    }

    /// Return to the roots.
    pub fn reset(&mut self) {
        self.trail.clear();
    }
}
