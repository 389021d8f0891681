//! Arena-backed local-id relabeling.
//!
//! `Relabeler` assigns fresh, dense local ids in first-seen order. It keeps two flat
//! arrays:
//! - `order`: the arena of parent ids, indexed by the new local id;
//! - `lookup`: parent id -> new local id, with `UNSEEN` for parent ids not yet assigned.
//!
//! Both are reused across nano-batches; `clear` only rewinds the entries that were
//! touched, so relabeling a nano-batch stays \(O(\text{nodes} + \text{edges})\).

const UNSEEN: usize = usize::MAX;

pub(crate) struct Relabeler {
    order: Vec<usize>,
    lookup: Vec<usize>,
}

impl Relabeler {
    /// Creates a relabeler over a parent id space of `parent_len` ids.
    pub(crate) fn new(parent_len: usize) -> Self {
        Self {
            order: Vec::new(),
            lookup: vec![UNSEEN; parent_len],
        }
    }

    /// Number of ids assigned so far.
    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Local id of `parent`, if assigned.
    #[inline(always)]
    pub(crate) fn get(&self, parent: usize) -> Option<usize> {
        match self.lookup[parent] {
            UNSEEN => None,
            local => Some(local),
        }
    }

    /// Returns the local id of `parent`, assigning the next one if unseen.
    #[inline]
    pub(crate) fn intern(&mut self, parent: usize) -> usize {
        let slot = &mut self.lookup[parent];
        if *slot == UNSEEN {
            *slot = self.order.len();
            self.order.push(parent);
        }
        *slot
    }

    /// Parent ids in local-id order.
    #[inline(always)]
    pub(crate) fn order(&self) -> &[usize] {
        &self.order
    }

    /// Forgets every assignment, leaving the arena ready for the next nano-batch.
    pub(crate) fn clear(&mut self) {
        for &parent in &self.order {
            self.lookup[parent] = UNSEEN;
        }
        self.order.clear();
    }
}
