use std::cmp::min;
use std::fmt::Debug;

type HeapIndex = usize;

const HEAP_ARITY: usize = 4usize;
#[inline(always)]
#[must_use]
fn up(i: usize) -> usize {
    crate::heap_primitives::index_parent::<HEAP_ARITY>(i)
}
#[inline(always)]
#[must_use]
fn down_left(i: usize) -> usize {
    crate::heap_primitives::index_first_child::<HEAP_ARITY>(i)
}
#[inline(always)]
#[must_use]
fn down_right(i: usize) -> usize {
    crate::heap_primitives::index_last_child::<HEAP_ARITY>(i)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeapEntry<R> {
    pub rank: R,
    /// The identity of this entry, an index into some external arena.
    pub key: usize,
}

/// Indexed Heap
///
/// A min-heap of `(rank, key)` entries that remembers where each key lives in
/// the heap, so entries can be found, re-ranked and removed by key without a
/// linear search.
///
/// Keys are small dense integers (indices into an arena owned by the caller),
/// so the slot table is a `Vec` and not a map.
///
/// ```pseudocode
/// for (i, e) in self.heap.enumerate():
///   assert_eq(self.slots[e.key], Some(i))
/// ```
#[derive(Debug)]
#[cfg_attr(feature = "inspect", derive(Clone))]
pub struct IndexedHeap<R>
where
    R: Ord + Copy + Debug,
{
    heap: Vec<HeapEntry<R>>,
    /// Where each key is in `heap`, if it's there at all.
    slots: Vec<Option<HeapIndex>>,
}

impl<R> IndexedHeap<R>
where
    R: Ord + Copy + Debug,
{
    pub fn new() -> Self {
        Self {
            heap: vec![],
            slots: vec![],
        }
    }
    pub fn with_capacity(s: usize) -> Self {
        Self {
            heap: Vec::with_capacity(s),
            slots: Vec::with_capacity(s),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    #[inline(always)]
    fn slot(&self, key: usize) -> Option<HeapIndex> {
        self.slots.get(key).copied().flatten()
    }

    #[inline(always)]
    pub fn contains(&self, key: usize) -> bool {
        self.slot(key).is_some()
    }

    pub fn rank(&self, key: usize) -> Option<R> {
        self.slot(key).map(|i| self.heap[i].rank)
    }

    /// Adds a new key.
    ///
    /// Returns where it landed.
    pub fn push(&mut self, key: usize, rank: R) -> HeapIndex {
        debug_assert!(!self.contains(key), "Key {key} is already in the heap");
        self.verify_heap();

        if key >= self.slots.len() {
            self.slots.resize(key + 1, None);
        }
        let heap_index = self.heap.len(); // Future heap_index
        self.heap.push(HeapEntry { rank, key });
        self.sync(heap_index);
        let heap_index = self.sift_up(heap_index);

        self.verify_heap();
        heap_index
    }

    /// Removes the entry with the lowest rank.
    pub fn pop(&mut self) -> Option<HeapEntry<R>> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("Pop");

        self.verify_heap();
        if self.heap.len() > 1 {
            self.sink_top_to_last();
        }
        let top = self.heap.pop()?;
        self.slots[top.key] = None;

        self.verify_heap();
        Some(top)
    }

    /// Gives an existing key a better (or equal) rank.
    ///
    /// Returns its new position, or `None` if the key isn't in the heap.
    pub fn improve(&mut self, key: usize, rank: R) -> Option<HeapIndex> {
        let i = self.slot(key)?;
        debug_assert!(
            rank <= self.heap[i].rank,
            "{rank:?} is worse than {:?}",
            self.heap[i].rank
        );
        self.heap[i].rank = rank;
        let i = self.sift_up(i);

        self.verify_heap();
        Some(i)
    }

    /// Removes a key, wherever it is.
    ///
    /// Returns the rank it had.
    pub fn remove(&mut self, key: usize) -> Option<R> {
        let i = self.slot(key)?;
        let last = self.heap.len() - 1;
        self.heap.swap(i, last);
        let removed = self.heap.pop()?;
        self.slots[key] = None;

        if i < self.heap.len() {
            self.sync(i);
            let i = self.sift_up(i);
            self.sift_down(i);
        }

        self.verify_heap();
        Some(removed.rank)
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify_heap(&self) {
        // All good... (hopefully)
    }

    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify_heap(&self) {
        // Every entry,
        for (i, e) in self.heap.iter().enumerate() {
            // - Has the right slot set.
            debug_assert_eq!(self.slot(e.key), Some(i));

            // - Goes after its parent entry, if any.
            if i == 0 {
                continue;
            }
            let p = up(i);
            debug_assert!(
                self.heap[p].rank <= e.rank,
                "Entry[{p}]={:?} !<= child [{i}]={e:?}. Out of heap of len={}",
                self.heap[p],
                self.heap.len(),
            );
        }
        // Every slot points back to its key.
        for (key, slot) in self.slots.iter().enumerate() {
            if let Some(i) = slot {
                debug_assert_eq!(self.heap[*i].key, key);
            }
        }
    }

    // Implementation details

    /// Records the position of the entry at `i`.
    #[inline(always)]
    fn sync(&mut self, i: HeapIndex) {
        let key = self.heap[i].key;
        self.slots[key] = Some(i);
    }

    /// The child with the lowest rank within `first..end`.
    ///
    /// Ties go to the left-most child.
    #[inline(always)]
    fn best_child(&self, first: HeapIndex, end: HeapIndex) -> HeapIndex {
        debug_assert!(first < end);
        let mut best = first;
        for child in (first + 1)..end {
            if self.heap[child].rank < self.heap[best].rank {
                best = child;
            }
        }
        best
    }

    /// Moves the top entry to the end of the array, keeping the rest a heap.
    ///
    /// Works by sinking a hole from the top to the last level, pulling up the
    /// best child on each level, and then filling the hole with the last
    /// entry. The top entry rides the hole down and is left at the end.
    fn sink_top_to_last(&mut self) {
        #[cfg(feature = "coz_profile")]
        coz::scope!("SinkTop");

        debug_assert!(self.heap.len() > 1, "Why are you calling this?");
        let last = self.heap.len() - 1;

        let mut hole = 0;
        loop {
            let first = down_left(hole);
            // The last entry fills the hole later, it can't be pulled up.
            if first >= last {
                break;
            }
            let child = self.best_child(first, min(down_right(hole) + 1, last));
            self.heap.swap(hole, child);
            self.sync(hole);
            hole = child;
        }
        if hole != last {
            self.heap.swap(hole, last);
            self.sync(hole);
            self.sift_up(hole);
        }
    }

    /// Raises an entry
    /// Returns it's new index
    #[inline(always)]
    fn sift_up(&mut self, mut pos: HeapIndex) -> HeapIndex {
        debug_assert!(pos < self.heap.len(), "Index out of bounds...");

        while pos > 0 {
            let parent = up(pos);
            if self.heap[parent].rank <= self.heap[pos].rank {
                break;
            }
            self.heap.swap(parent, pos);
            self.sync(parent);
            self.sync(pos);
            pos = parent;
        }
        pos
    }

    /// Lowers an entry
    /// Returns it's new index
    #[inline(always)]
    fn sift_down(&mut self, mut pos: HeapIndex) -> HeapIndex {
        let len = self.heap.len();
        debug_assert!(pos < len, "Index out of bounds...");

        loop {
            let first = down_left(pos);
            if first >= len {
                break;
            }
            let child = self.best_child(first, min(down_right(pos) + 1, len));
            if self.heap[pos].rank <= self.heap[child].rank {
                break;
            }
            self.heap.swap(pos, child);
            self.sync(pos);
            self.sync(child);
            pos = child;
        }
        pos
    }
}

impl<R> Default for IndexedHeap<R>
where
    R: Ord + Copy + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
