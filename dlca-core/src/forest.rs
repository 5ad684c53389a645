//! Union-find forest over particle ids.
//!
//! `find` uses iterative path halving: every node visited on the way to the
//! root is re-pointed at its grandparent. `union` links the root of the
//! smaller tree under the root of the larger one (union-by-size). Together
//! they give an amortized cost of O(α(n)) per operation, where α is the
//! inverse Ackermann function, so effectively constant for any lattice that
//! fits in memory. Without compression the depth is still bounded by
//! O(log n) thanks to union-by-size.

use crate::types::{Label, Pid};

#[derive(Debug, Clone)]
pub struct Forest {
    parent: Vec<Pid>,
    /// Tree size, only meaningful at roots.
    size: Vec<usize>,
}

impl Forest {
    /// Creates `len` singleton trees; particle `i` is its own label.
    ///
    /// ### Parameters
    /// - `len` - Number of particles.
    pub fn with_len(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    /// Number of particles in the forest.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Returns `true` if the forest holds no particles.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Returns `true` if `pid` is the root of its tree.
    #[inline]
    pub fn is_root(&self, pid: Pid) -> bool {
        self.parent[pid] == pid
    }

    /// Returns the label of the cluster containing `pid`, compressing the path.
    ///
    /// ### Parameters
    /// - `pid` - Any particle id below [`Forest::len`].
    ///
    /// ### Returns
    /// The root of `pid`'s tree.
    ///
    /// Compression only rewrites parent pointers inside the same tree, so
    /// the returned label is stable between unions.
    pub fn find(&mut self, mut pid: Pid) -> Label {
        while self.parent[pid] != pid {
            let grandparent = self.parent[self.parent[pid]];
            self.parent[pid] = grandparent;
            pid = grandparent;
        }
        pid
    }

    /// Same result as [`Forest::find`] without touching the forest.
    pub fn find_no_compress(&self, mut pid: Pid) -> Label {
        while self.parent[pid] != pid {
            pid = self.parent[pid];
        }
        pid
    }

    /// Number of particles in the tree rooted at `label`.
    ///
    /// ### Panics
    /// Panics if `label` is not a root.
    pub fn size(&self, label: Label) -> usize {
        assert!(self.is_root(label), "{label} is not a cluster label");
        self.size[label]
    }

    /// Merges the trees rooted at `a` and `b` and returns the surviving label.
    ///
    /// The smaller tree goes under the larger one; on a tie `a` survives.
    ///
    /// ### Parameters
    /// - `a`, `b` - Two distinct roots.
    ///
    /// ### Returns
    /// The root of the merged tree, either `a` or `b`.
    ///
    /// ### Panics
    /// Panics if `a == b` or if either is not a root.
    pub fn union(&mut self, a: Label, b: Label) -> Label {
        assert_ne!(a, b, "cannot unite cluster {a} with itself");
        assert!(self.is_root(a), "{a} is not a cluster label");
        assert!(self.is_root(b), "{b} is not a cluster label");

        let (root, child) = if self.size[a] >= self.size[b] {
            (a, b)
        } else {
            (b, a)
        };
        self.parent[child] = root;
        self.size[root] += self.size[child];
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation() {
        let mut forest = Forest::with_len(10);

        assert_eq!(forest.len(), 10);
        for pid in 0..10 {
            assert_eq!(forest.find(pid), pid);
            assert_eq!(forest.size(pid), 1);
        }
    }

    #[test]
    fn union_and_find() {
        let mut forest = Forest::with_len(4);
        let a = forest.union(0, 2);
        let b = forest.union(3, 1);
        let c = forest.union(a, b);

        let label = forest.find(0);
        assert_eq!(label, c);
        assert_eq!(forest.find(1), label);
        assert_eq!(forest.find(2), label);
        assert_eq!(forest.find(3), label);
        assert_eq!(forest.size(label), 4);
    }

    #[test]
    fn union_by_size_keeps_larger_root() {
        let mut forest = Forest::with_len(5);
        let big = forest.union(1, 2);
        let big = forest.union(big, 3);
        assert_eq!(big, 1);

        // The singleton is passed first but the larger tree survives.
        assert_eq!(forest.union(4, big), big);
        assert_eq!(forest.size(big), 4);
        assert!(!forest.is_root(4));
    }

    #[test]
    fn tie_keeps_first_argument() {
        let mut forest = Forest::with_len(2);
        assert_eq!(forest.union(1, 0), 1);
    }

    #[test]
    fn compression() {
        let mut forest = Forest::with_len(4);
        // Build the chain 0 -> 1 -> 2 by hand, then hang it under 3.
        forest.parent[0] = 1;
        forest.parent[1] = 2;
        forest.parent[2] = 3;

        forest.find(0);
        assert_eq!(forest.parent[0], 2);
        assert_eq!(forest.find(0), 3);
    }

    #[test]
    fn find_is_idempotent() {
        let mut forest = Forest::with_len(8);
        let l = forest.union(0, 1);
        let r = forest.union(2, 3);
        forest.union(l, r);

        for pid in 0..8 {
            let first = forest.find(pid);
            let second = forest.find(pid);
            assert_eq!(first, second);
            assert_eq!(first, forest.find_no_compress(pid));
        }
    }

    #[test]
    #[should_panic(expected = "with itself")]
    fn union_with_self_panics() {
        let mut forest = Forest::with_len(3);
        forest.union(1, 1);
    }

    #[test]
    #[should_panic(expected = "not a cluster label")]
    fn union_with_non_root_panics() {
        let mut forest = Forest::with_len(3);
        let root = forest.union(0, 1);
        let other = if root == 0 { 1 } else { 0 };
        forest.union(other, 2);
    }
}
