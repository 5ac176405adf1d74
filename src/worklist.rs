//! The search frontier: a deduplicating min-priority queue of programs.

use fxhash::FxHashSet;
use priority_queue::DoublePriorityQueue;

use crate::ast::Pgm;

/// Queue ordering: cheapest first, then shallowest, then oldest. The
/// insertion sequence number makes ordering among ties deterministic instead
/// of relying on any stability of the underlying container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Priority {
    cost: u64,
    depth: u64,
    seq: u64,
}

/// Pending programs ordered by [`Priority`], with a membership set that
/// remembers every program ever enqueued. The set never shrinks, so a
/// program reached again through a different derivation is not re-explored.
pub struct Worklist {
    queue: DoublePriorityQueue<Pgm, Priority>,
    seen: FxHashSet<Pgm>,
    next_seq: u64,
}

impl Default for Worklist {
    fn default() -> Worklist {
        Worklist::new()
    }
}

impl Worklist {
    pub fn new() -> Worklist {
        Worklist {
            queue: DoublePriorityQueue::new(),
            seen: FxHashSet::default(),
            next_seq: 0,
        }
    }

    /// Enqueue every program not structurally seen before.
    pub fn put(&mut self, pgms: impl IntoIterator<Item = Pgm>) {
        for pgm in pgms {
            if !self.seen.insert(pgm.clone()) {
                continue;
            }
            let priority = Priority {
                cost: pgm.cost(),
                depth: pgm.depth(),
                seq: self.next_seq,
            };
            self.next_seq += 1;
            self.queue.push(pgm, priority);
        }
    }

    /// Remove and return the minimum-keyed program, or `None` when the
    /// frontier is empty.
    pub fn get(&mut self) -> Option<Pgm> {
        self.queue.pop_min().map(|(pgm, _)| pgm)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct programs ever enqueued.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
