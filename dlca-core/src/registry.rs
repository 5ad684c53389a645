use crate::types::{Label, Pid};

/// Per-cluster particle lists plus the set of surviving labels.
///
/// Lists are intrusive singly linked lists stored in flat arrays indexed by
/// particle id (`next`) and by label (`head`, `tail`, `len`). Splicing two
/// clusters rewires one `next` pointer, so it costs O(1) regardless of
/// cluster size.
///
/// The surviving labels live in a dense `Vec` so a random cluster can be
/// drawn by index. `slot[label]` is the position of `label` in that `Vec`,
/// which makes retiring a label a swap-with-last-and-pop. Cluster order is
/// irrelevant, so the reordering this causes is harmless.
#[derive(Debug, Clone)]
pub struct Registry {
    next: Vec<Option<Pid>>,
    head: Vec<Option<Pid>>,
    tail: Vec<Option<Pid>>,
    len: Vec<usize>,
    labels: Vec<Label>,
    slot: Vec<Option<usize>>,
}

impl Registry {
    /// Creates `n` singleton clusters, cluster `i` holding particle `i`.
    pub fn singletons(n: usize) -> Self {
        Self {
            next: vec![None; n],
            head: (0..n).map(Some).collect(),
            tail: (0..n).map(Some).collect(),
            len: vec![1; n],
            labels: (0..n).collect(),
            slot: (0..n).map(Some).collect(),
        }
    }

    /// Surviving labels, in no particular order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Number of surviving clusters.
    pub fn num_clusters(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn contains(&self, label: Label) -> bool {
        self.slot.get(label).is_some_and(|s| s.is_some())
    }

    /// Number of particles in cluster `label`.
    ///
    /// ### Panics
    /// Panics if `label` is not a surviving label.
    pub fn size(&self, label: Label) -> usize {
        self.assert_alive(label);
        self.len[label]
    }

    /// Iterates over the particles of cluster `label`.
    ///
    /// ### Panics
    /// Panics if `label` is not a surviving label.
    pub fn members(&self, label: Label) -> Members<'_> {
        self.assert_alive(label);
        Members {
            next: &self.next,
            cursor: self.head[label],
            remaining: self.len[label],
        }
    }

    /// Moves every particle of `loser` into `survivor` and retires `loser`.
    ///
    /// The caller decides which label survives; the engine passes the root
    /// chosen by [`crate::forest::Forest::union`].
    ///
    /// ### Panics
    /// Panics if the labels are equal or either is not surviving.
    pub fn splice(&mut self, survivor: Label, loser: Label) {
        assert_ne!(survivor, loser, "cannot splice cluster {survivor} into itself");
        self.assert_alive(survivor);
        self.assert_alive(loser);

        if let (Some(last), Some(first)) = (self.tail[survivor], self.head[loser]) {
            self.next[last] = Some(first);
            self.tail[survivor] = self.tail[loser];
        }
        self.len[survivor] += self.len[loser];

        self.head[loser] = None;
        self.tail[loser] = None;
        self.len[loser] = 0;
        self.retire(loser);
    }

    fn retire(&mut self, label: Label) {
        let Some(pos) = self.slot[label].take() else {
            return;
        };
        self.labels.swap_remove(pos);
        if let Some(&moved) = self.labels.get(pos) {
            self.slot[moved] = Some(pos);
        }
    }

    fn assert_alive(&self, label: Label) {
        assert!(
            self.contains(label),
            "cluster {label} is not a surviving label"
        );
    }
}

/// Iterator over the particles of one cluster, see [`Registry::members`].
#[derive(Debug, Clone)]
pub struct Members<'a> {
    next: &'a [Option<Pid>],
    cursor: Option<Pid>,
    remaining: usize,
}

impl Iterator for Members<'_> {
    type Item = Pid;

    fn next(&mut self) -> Option<Pid> {
        if self.remaining == 0 {
            return None;
        }
        let pid = self.cursor?;
        self.cursor = self.next[pid];
        self.remaining -= 1;
        Some(pid)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Members<'_> {}
