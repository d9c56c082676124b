//! Merkle tree construction and incremental diffing (C4).
//!
//! Grounded in the `MerkleNode`/`build_merkle_tree`/`compute_diff` shape
//! found in the pack's Titan-AI indexer crate, generalized to the full
//! build/diff/statistics contract this engine requires. Internal nodes
//! carry only child hashes, never a parent back-pointer, per the "no cyclic
//! ownership" design note: the tree is rebuilt from a flat node set keyed
//! by hash.

use crate::domain::hashing::hash_hex;
use crate::domain::types::{BlobOrTree, GitHubFileNode, MerkleNode};
use std::collections::HashMap;

/// Result of diffing two Merkle trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Paths present in both trees whose leaf hash differs.
    pub changed_paths: Vec<String>,
    /// Paths present only in the new tree.
    pub new_paths: Vec<String>,
    /// Paths present only in the old tree.
    pub deleted_paths: Vec<String>,
}

/// Aggregate shape statistics for a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStatistics {
    /// Total node count, leaves and internal nodes combined.
    pub total_nodes: usize,
    /// Number of leaf nodes, one per file.
    pub leaf_nodes: usize,
    /// Number of internal (hash-combining) nodes.
    pub internal_nodes: usize,
    /// Number of levels from leaves to root, inclusive.
    pub height: usize,
}

/// A balanced binary tree over per-file content hashes.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    root: Option<String>,
    nodes: HashMap<String, MerkleNode>,
    leaves: HashMap<String, String>,
    height: usize,
}

impl MerkleTree {
    /// Build a tree over `files` (path, content-hash pairs) in the given
    /// input order. The caller is responsible for choosing a stable order;
    /// sorting by path lexicographically (as the orchestrator does) makes
    /// the result deterministic across runs.
    pub fn build(files: &[(String, String)]) -> Self {
        if files.is_empty() {
            return Self {
                root: None,
                nodes: HashMap::new(),
                leaves: HashMap::new(),
                height: 0,
            };
        }

        let mut nodes = HashMap::new();
        let mut leaves = HashMap::new();
        let mut level: Vec<MerkleNode> = files
            .iter()
            .map(|(path, sha)| {
                leaves.insert(path.clone(), sha.clone());
                let node = MerkleNode {
                    hash: sha.clone(),
                    path: path.clone(),
                    is_leaf: true,
                    file_id: None,
                    left_hash: None,
                    right_hash: None,
                };
                nodes.insert(node.hash.clone(), node.clone());
                node
            })
            .collect();

        let mut height = 1;
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut i = 0;
            while i < level.len() {
                let left = &level[i];
                let right = if i + 1 < level.len() {
                    &level[i + 1]
                } else {
                    &level[i] // odd tail: duplicate the last node
                };
                let combined = hash_hex(format!("{}{}", left.hash, right.hash).as_bytes());
                let parent = MerkleNode {
                    hash: combined.clone(),
                    path: format!("{}_{}", left.path, right.path),
                    is_leaf: false,
                    file_id: None,
                    left_hash: Some(left.hash.clone()),
                    right_hash: Some(right.hash.clone()),
                };
                nodes.insert(parent.hash.clone(), parent.clone());
                next.push(parent);
                i += 2;
            }
            level = next;
            height += 1;
        }

        let root = level.into_iter().next().map(|n| n.hash);
        Self {
            root,
            nodes,
            leaves,
            height,
        }
    }

    /// Build directly from a raw hosted-git tree listing: each blob's path
    /// and git SHA becomes a leaf pair, sorted by path for determinism.
    /// Tree entries carry no content hash of their own and are skipped.
    pub fn build_from_listing(nodes: &[GitHubFileNode]) -> Self {
        let mut pairs: Vec<(String, String)> = nodes
            .iter()
            .filter(|n| n.node_type == BlobOrTree::Blob)
            .map(|n| (n.path.clone(), n.sha.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Self::build(&pairs)
    }

    /// The root hash, if the tree has at least one leaf.
    pub fn root_hash(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Look up a node by hash (used to reconstruct a tree from a persisted
    /// flat node set, see `from_nodes`).
    pub fn node(&self, hash: &str) -> Option<&MerkleNode> {
        self.nodes.get(hash)
    }

    /// Rebuild a tree purely from its persisted node set plus the known
    /// root hash, as the repository layer does when loading a project's
    /// previous tree for diffing.
    pub fn from_nodes(root: Option<String>, nodes: Vec<MerkleNode>) -> Self {
        let mut leaves = HashMap::new();
        let mut map = HashMap::new();
        let mut leaf_count = 0usize;
        for node in nodes {
            if node.is_leaf {
                leaves.insert(node.path.clone(), node.hash.clone());
                leaf_count += 1;
            }
            map.insert(node.hash.clone(), node);
        }
        let height = if leaf_count == 0 {
            0
        } else {
            (leaf_count as f64).log2().ceil() as usize + 1
        };
        Self {
            root,
            nodes: map,
            leaves,
            height,
        }
    }

    /// The flat node set, suitable for persistence (`ProjectRepository::save_merkle_nodes`).
    pub fn nodes(&self) -> impl Iterator<Item = &MerkleNode> {
        self.nodes.values()
    }

    /// Diff two trees by comparing their leaf path/hash sets.
    ///
    /// Root-hash equality short-circuits to an empty diff; otherwise this
    /// walks the leaf sets of both trees, which is equivalent to the
    /// lock-step subtree traversal described in the design (a matching
    /// subtree hash anywhere below the root means every leaf path under it
    /// is already known to be unchanged).
    pub fn diff(old: &MerkleTree, new: &MerkleTree) -> DiffResult {
        if old.root == new.root {
            return DiffResult::default();
        }

        let mut changed: Vec<String> = old
            .leaves
            .iter()
            .filter_map(|(path, old_hash)| match new.leaves.get(path) {
                Some(new_hash) if new_hash != old_hash => Some(path.clone()),
                _ => None,
            })
            .collect();
        changed.sort();

        let mut new_paths: Vec<String> = new
            .leaves
            .keys()
            .filter(|p| !old.leaves.contains_key(*p))
            .cloned()
            .collect();
        new_paths.sort();

        let mut deleted_paths: Vec<String> = old
            .leaves
            .keys()
            .filter(|p| !new.leaves.contains_key(*p))
            .cloned()
            .collect();
        deleted_paths.sort();

        DiffResult {
            changed_paths: changed,
            new_paths,
            deleted_paths,
        }
    }

    /// Shape statistics for monitoring/debugging.
    pub fn statistics(&self) -> TreeStatistics {
        let leaf_nodes = self.leaves.len();
        let total_nodes = self.nodes.len();
        TreeStatistics {
            total_nodes,
            leaf_nodes,
            internal_nodes: total_nodes.saturating_sub(leaf_nodes),
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(p, h)| (p.to_string(), h.to_string()))
            .collect()
    }

    #[test]
    fn build_is_deterministic() {
        let f = files(&[("a.py", "h1"), ("b.py", "h2"), ("c.md", "h3")]);
        let t1 = MerkleTree::build(&f);
        let t2 = MerkleTree::build(&f);
        assert_eq!(t1.root_hash(), t2.root_hash());
    }

    #[test]
    fn odd_count_duplicates_last_leaf() {
        let f = files(&[("a.py", "h1"), ("b.py", "h2"), ("c.md", "h3")]);
        let t = MerkleTree::build(&f);
        // Level 1: (h1,h2) -> p1, (h3,h3) -> p2. Root = hash(p1 + p2).
        let p1 = hash_hex(b"h1h2");
        let p2 = hash_hex(b"h3h3");
        let expected_root = hash_hex(format!("{p1}{p2}").as_bytes());
        assert_eq!(t.root_hash(), Some(expected_root.as_str()));
    }

    #[test]
    fn single_file_change_is_localized() {
        let old = MerkleTree::build(&files(&[("a.py", "h1"), ("b.py", "h2")]));
        let new = MerkleTree::build(&files(&[("a.py", "h1-changed"), ("b.py", "h2")]));
        let diff = MerkleTree::diff(&old, &new);
        assert_eq!(diff.changed_paths, vec!["a.py".to_string()]);
        assert!(diff.new_paths.is_empty());
        assert!(diff.deleted_paths.is_empty());
    }

    #[test]
    fn symmetric_difference_on_disjoint_additions_and_removals() {
        let old = MerkleTree::build(&files(&[("a.py", "h1"), ("b.py", "h2")]));
        let new = MerkleTree::build(&files(&[("a.py", "h1"), ("c.py", "h3")]));
        let diff = MerkleTree::diff(&old, &new);
        assert!(diff.changed_paths.is_empty());
        assert_eq!(diff.new_paths, vec!["c.py".to_string()]);
        assert_eq!(diff.deleted_paths, vec!["b.py".to_string()]);
    }

    #[test]
    fn identical_trees_have_empty_diff() {
        let f = files(&[("a.py", "h1")]);
        let t = MerkleTree::build(&f);
        let diff = MerkleTree::diff(&t, &t);
        assert_eq!(diff, DiffResult::default());
    }

    #[test]
    fn from_nodes_round_trips_for_diffing() {
        let f = files(&[("a.py", "h1"), ("b.py", "h2"), ("c.md", "h3")]);
        let original = MerkleTree::build(&f);
        let nodes: Vec<MerkleNode> = original.nodes().cloned().collect();
        let rebuilt = MerkleTree::from_nodes(original.root_hash().map(str::to_string), nodes);
        assert_eq!(rebuilt.root_hash(), original.root_hash());
        assert_eq!(
            MerkleTree::diff(&original, &rebuilt),
            DiffResult::default()
        );
    }

    fn git_node(path: &str, sha: &str, node_type: BlobOrTree) -> GitHubFileNode {
        GitHubFileNode {
            path: path.to_string(),
            mode: "100644".to_string(),
            node_type,
            sha: sha.to_string(),
            size: Some(10),
            url: format!("https://example.test/{path}"),
        }
    }

    #[test]
    fn build_from_listing_skips_tree_entries() {
        let listing = vec![
            git_node("src", "dir-sha", BlobOrTree::Tree),
            git_node("src/a.py", "h1", BlobOrTree::Blob),
            git_node("src/b.py", "h2", BlobOrTree::Blob),
        ];
        let from_listing = MerkleTree::build_from_listing(&listing);
        let expected = MerkleTree::build(&files(&[("src/a.py", "h1"), ("src/b.py", "h2")]));
        assert_eq!(from_listing.root_hash(), expected.root_hash());
    }
}
