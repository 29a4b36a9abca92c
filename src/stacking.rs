//! The stacking engine.
//!
//! Two orderings are maintained, both bottom-to-top. The *unconstrained*
//! order reflects only explicit raise/lower actions (new entries append on
//! top). The *constrained* order is derived from it on every update by
//! partitioning entries into layers, keeping the unconstrained relative
//! order within each layer, and then enforcing that no transient ever sits
//! below one of its main windows.
//!
//! Layer and transiency lookups are passed in as closures so the engine
//! stays independent of the window arena and directly testable.
//!
//! Recomputation can be blocked with a nesting counter; the dirty flag is
//! latched and a single recomputation runs when the counter returns to
//! zero.

use std::collections::HashSet;

use crate::types::{DeletedId, Layer, WindowId};

/// One slot in a stacking order: a live window, or the placeholder a
/// destroyed window leaves behind while effects finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackEntry {
    Window(WindowId),
    Deleted(DeletedId),
}

#[derive(Debug, Default)]
pub struct StackingOrder {
    /// Bottom-to-top, raise/lower order only.
    unconstrained: Vec<StackEntry>,
    /// Bottom-to-top, layering and transiency applied.
    constrained: Vec<StackEntry>,
    blocks: u32,
    dirty: bool,
}

impl StackingOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The effective order, bottom to top.
    pub fn constrained(&self) -> &[StackEntry] {
        &self.constrained
    }

    /// The raise/lower order, bottom to top.
    pub fn unconstrained(&self) -> &[StackEntry] {
        &self.unconstrained
    }

    /// Live windows in effective order, bottom to top.
    pub fn windows_bottom_to_top(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.constrained.iter().filter_map(|entry| match entry {
            StackEntry::Window(id) => Some(*id),
            StackEntry::Deleted(_) => None,
        })
    }

    pub fn position(&self, entry: StackEntry) -> Option<usize> {
        self.constrained.iter().position(|e| *e == entry)
    }

    pub fn contains(&self, entry: StackEntry) -> bool {
        self.unconstrained.contains(&entry)
    }

    /// Appends a new entry on top of the unconstrained order.
    pub fn add(&mut self, entry: StackEntry) {
        if self.unconstrained.contains(&entry) {
            warn!("entry {entry:?} already in the stacking order");
            return;
        }
        self.unconstrained.push(entry);
    }

    /// Removes an entry from both orders.
    pub fn remove(&mut self, entry: StackEntry) {
        self.unconstrained.retain(|e| *e != entry);
        self.constrained.retain(|e| *e != entry);
    }

    /// Swaps an entry in place in both orders, used to substitute a deleted
    /// placeholder for a destroyed window.
    pub fn replace(&mut self, old: StackEntry, new: StackEntry) {
        for e in &mut self.unconstrained {
            if *e == old {
                *e = new;
            }
        }
        for e in &mut self.constrained {
            if *e == old {
                *e = new;
            }
        }
    }

    /// Moves `entries` (a window plus its transient subtree) to the top of
    /// the unconstrained order, preserving their current relative order.
    pub fn raise(&mut self, entries: &[StackEntry]) {
        let mut lifted: Vec<StackEntry> = self
            .unconstrained
            .iter()
            .copied()
            .filter(|e| entries.contains(e))
            .collect();
        self.unconstrained.retain(|e| !entries.contains(e));
        self.unconstrained.append(&mut lifted);
    }

    /// Moves an entry to the bottom of the unconstrained order.
    pub fn lower(&mut self, entry: StackEntry) {
        if !self.unconstrained.contains(&entry) {
            return;
        }
        self.unconstrained.retain(|e| *e != entry);
        self.unconstrained.insert(0, entry);
    }

    // =========================================================================
    // Update blocking
    // =========================================================================

    pub fn block_updates(&mut self) {
        self.blocks += 1;
    }

    /// Leaves a blocked scope. Returns `true` when the caller should run
    /// [`StackingOrder::update`] now.
    #[must_use]
    pub fn unblock_updates(&mut self) -> bool {
        if self.blocks == 0 {
            warn!("stacking update blocker underflow");
            return false;
        }
        self.blocks -= 1;
        self.blocks == 0 && self.dirty
    }

    pub fn is_blocked(&self) -> bool {
        self.blocks > 0
    }

    // =========================================================================
    // Recomputation
    // =========================================================================

    /// Recomputes the constrained order.
    ///
    /// `layer_of` gives each entry's layer; `main_clients_of` gives a
    /// window's immediate main windows. While blocked, only latches the
    /// dirty flag. Returns `true` when the constrained order changed.
    pub fn update(
        &mut self,
        layer_of: impl Fn(StackEntry) -> Layer,
        main_clients_of: impl Fn(WindowId) -> Vec<WindowId>,
    ) -> bool {
        if self.blocks > 0 {
            self.dirty = true;
            return false;
        }
        self.dirty = false;

        // A duplicate entry would corrupt every downstream consumer;
        // correct it in place.
        let mut seen = HashSet::new();
        self.unconstrained.retain(|e| {
            if seen.insert(*e) {
                true
            } else {
                warn!("duplicate stacking entry {e:?}; removing");
                false
            }
        });

        let mut layers: [Vec<StackEntry>; Layer::ALL.len()] =
            std::array::from_fn(|_| Vec::new());
        for entry in &self.unconstrained {
            layers[layer_of(*entry).index()].push(*entry);
        }
        let mut order: Vec<StackEntry> = layers.into_iter().flatten().collect();

        enforce_transient_constraint(&mut order, &main_clients_of);

        if order == self.constrained {
            return false;
        }
        self.constrained = order;
        true
    }

    #[cfg(test)]
    pub(crate) fn verify_invariants(&self) {
        assert_eq!(self.unconstrained.len(), self.constrained.len());
        let unconstrained: HashSet<_> = self.unconstrained.iter().collect();
        let constrained: HashSet<_> = self.constrained.iter().collect();
        assert_eq!(unconstrained.len(), self.unconstrained.len());
        assert_eq!(constrained.len(), self.constrained.len());
        assert_eq!(unconstrained, constrained);
    }
}

/// Moves every transient that sits below one of its main windows to
/// immediately above its highest main, repeating until stable.
///
/// The pass count is bounded; a graph that keeps oscillating (only possible
/// with a corrupted, cyclic transiency graph) is reported and left as-is.
fn enforce_transient_constraint(
    order: &mut Vec<StackEntry>,
    main_clients_of: &impl Fn(WindowId) -> Vec<WindowId>,
) {
    let max_moves = order.len() * order.len();
    let mut moves = 0;

    'restart: loop {
        for i in 0..order.len() {
            let StackEntry::Window(window) = order[i] else {
                continue;
            };

            let highest_main = main_clients_of(window)
                .into_iter()
                .filter_map(|main| {
                    order
                        .iter()
                        .position(|e| *e == StackEntry::Window(main))
                })
                .max();

            if let Some(main_pos) = highest_main {
                if main_pos > i {
                    // After removing `i`, the main shifts down by one, so
                    // inserting at `main_pos` lands directly above it.
                    let entry = order.remove(i);
                    order.insert(main_pos, entry);

                    moves += 1;
                    if moves > max_moves {
                        warn!("transient stacking constraint did not converge; giving up");
                        return;
                    }
                    continue 'restart;
                }
            }
        }
        return;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn win(id: u64) -> StackEntry {
        StackEntry::Window(WindowId(id))
    }

    struct Graph {
        layers: HashMap<StackEntry, Layer>,
        mains: HashMap<WindowId, Vec<WindowId>>,
    }

    impl Graph {
        fn new() -> Self {
            Self {
                layers: HashMap::new(),
                mains: HashMap::new(),
            }
        }

        fn layer(&self, entry: StackEntry) -> Layer {
            self.layers.get(&entry).copied().unwrap_or(Layer::Normal)
        }

        fn mains(&self, id: WindowId) -> Vec<WindowId> {
            self.mains.get(&id).cloned().unwrap_or_default()
        }

        fn update(&self, order: &mut StackingOrder) -> bool {
            order.update(|e| self.layer(e), |id| self.mains(id))
        }
    }

    #[test]
    fn layers_partition_the_order() {
        let mut order = StackingOrder::new();
        let mut graph = Graph::new();

        order.add(win(1));
        order.add(win(2));
        order.add(win(3));
        graph.layers.insert(win(1), Layer::Dock);
        graph.layers.insert(win(3), Layer::Below);

        graph.update(&mut order);
        assert_eq!(order.constrained(), [win(3), win(2), win(1)]);
        order.verify_invariants();
    }

    #[test]
    fn transient_never_below_its_main() {
        let mut order = StackingOrder::new();
        let mut graph = Graph::new();

        // Dialog 2 is transient for 1 but was explicitly lowered.
        order.add(win(1));
        order.add(win(2));
        order.add(win(3));
        graph.mains.insert(WindowId(2), vec![WindowId(1)]);
        order.lower(win(2));

        graph.update(&mut order);
        let pos_main = order.position(win(1)).unwrap();
        let pos_transient = order.position(win(2)).unwrap();
        assert!(pos_transient > pos_main);
        // Directly above its main.
        assert_eq!(pos_transient, pos_main + 1);
    }

    #[test]
    fn raising_a_window_carries_its_transient_subtree() {
        let mut order = StackingOrder::new();
        let mut graph = Graph::new();

        // A with transients B, C (C transient for B); D unrelated.
        for id in 1..=4 {
            order.add(win(id));
        }
        graph.mains.insert(WindowId(2), vec![WindowId(1)]);
        graph.mains.insert(WindowId(3), vec![WindowId(2)]);

        order.raise(&[win(4)]);
        graph.update(&mut order);
        assert_eq!(order.constrained(), [win(1), win(2), win(3), win(4)]);

        order.raise(&[win(1), win(2), win(3)]);
        graph.update(&mut order);
        // The subtree is contiguous on top, prior relative order kept.
        assert_eq!(order.constrained(), [win(4), win(1), win(2), win(3)]);
    }

    #[test]
    fn duplicate_entries_are_corrected() {
        let mut order = StackingOrder::new();
        let graph = Graph::new();

        order.add(win(1));
        // Inject a duplicate behind the public API's back.
        order.unconstrained.push(win(1));

        graph.update(&mut order);
        assert_eq!(order.constrained(), [win(1)]);
        order.verify_invariants();
    }

    #[test]
    fn blocked_updates_coalesce() {
        let mut order = StackingOrder::new();
        let graph = Graph::new();

        order.add(win(1));
        order.block_updates();
        order.block_updates();

        assert!(!graph.update(&mut order));
        assert!(order.constrained().is_empty());

        assert!(!order.unblock_updates());
        assert!(order.unblock_updates());
        assert!(graph.update(&mut order));
        assert_eq!(order.constrained(), [win(1)]);
    }

    #[test]
    fn deleted_placeholder_keeps_its_layer_slot() {
        let mut order = StackingOrder::new();
        let mut graph = Graph::new();

        order.add(win(1));
        order.add(win(2));
        graph.update(&mut order);

        let placeholder = StackEntry::Deleted(DeletedId(7));
        order.replace(win(1), placeholder);
        graph.layers.insert(placeholder, Layer::Normal);
        graph.update(&mut order);

        assert_eq!(order.constrained(), [placeholder, win(2)]);
        order.remove(placeholder);
        assert_eq!(order.constrained(), [win(2)]);
    }

    #[test]
    fn forced_transiency_cycle_does_not_hang() {
        let mut order = StackingOrder::new();
        let mut graph = Graph::new();

        order.add(win(1));
        order.add(win(2));
        graph.mains.insert(WindowId(1), vec![WindowId(2)]);
        graph.mains.insert(WindowId(2), vec![WindowId(1)]);

        // Must terminate; the resulting order is unspecified.
        graph.update(&mut order);
        order.verify_invariants();
    }
}
