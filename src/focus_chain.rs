//! Per-desktop focus history.
//!
//! One chain per desktop, most recently focused first, plus a
//! desktop-agnostic most-recently-used list for switcher-style consumers.
//! Windows on all desktops appear in every chain. The chain itself knows
//! nothing about window state; callers pass a predicate for "can be
//! activated right now" so the chain stays trivially testable.

use std::collections::HashMap;

use crate::types::{Desktop, Desktops, WindowId};

/// How a focus chain update should reposition a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChainChange {
    /// The window was activated; move it to the front.
    MakeFirst,
    /// The window appeared; append it to the back.
    AddBack,
    /// The window went away or stopped being a focus candidate.
    Remove,
}

#[derive(Debug, Default)]
pub struct FocusChain {
    /// Most recently focused first, per desktop.
    chains: HashMap<Desktop, Vec<WindowId>>,
    /// Most recently focused first, across all desktops.
    mru: Vec<WindowId>,
    desktop_count: u32,
}

impl FocusChain {
    pub fn new(desktop_count: u32) -> Self {
        let mut chain = Self {
            chains: HashMap::new(),
            mru: Vec::new(),
            desktop_count: 0,
        };
        chain.set_desktop_count(desktop_count);
        chain
    }

    pub fn set_desktop_count(&mut self, count: u32) {
        for desktop in 1..=count {
            self.chains.entry(Desktop(desktop)).or_default();
        }
        self.chains.retain(|desktop, _| desktop.0 <= count);
        self.desktop_count = count;
    }

    /// Updates the window's position in the chains it belongs to.
    pub fn update(&mut self, window: WindowId, desktops: &Desktops, change: FocusChainChange) {
        for (desktop, chain) in &mut self.chains {
            chain.retain(|id| *id != window);
            match change {
                FocusChainChange::MakeFirst if desktops.contains(*desktop) => {
                    chain.insert(0, window);
                }
                FocusChainChange::AddBack if desktops.contains(*desktop) => {
                    chain.push(window);
                }
                _ => (),
            }
        }

        self.mru.retain(|id| *id != window);
        match change {
            FocusChainChange::MakeFirst => self.mru.insert(0, window),
            FocusChainChange::AddBack => self.mru.push(window),
            FocusChainChange::Remove => (),
        }
    }

    /// Removes the window from every chain.
    pub fn remove(&mut self, window: WindowId) {
        self.update(window, &Desktops::All, FocusChainChange::Remove);
    }

    /// The most recent chain entry on `desktop` accepted by `candidate_ok`.
    pub fn get_for_activation(
        &self,
        desktop: Desktop,
        candidate_ok: impl Fn(WindowId) -> bool,
    ) -> Option<WindowId> {
        self.chains
            .get(&desktop)?
            .iter()
            .copied()
            .find(|id| candidate_ok(*id))
    }

    /// All windows ever focused, most recent first.
    pub fn most_recently_used(&self) -> &[WindowId] {
        &self.mru
    }

    pub fn chain(&self, desktop: Desktop) -> &[WindowId] {
        self.chains
            .get(&desktop)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.mru.contains(&window)
    }

    #[cfg(test)]
    pub(crate) fn verify_invariants(&self) {
        use std::collections::HashSet;

        assert_eq!(self.chains.len(), self.desktop_count as usize);
        for chain in self.chains.values() {
            let unique: HashSet<_> = chain.iter().collect();
            assert_eq!(unique.len(), chain.len(), "chains must not contain duplicates");
            for id in chain {
                assert!(self.mru.contains(id), "chain entries must be in the MRU list");
            }
        }
        let unique: HashSet<_> = self.mru.iter().collect();
        assert_eq!(unique.len(), self.mru.len(), "MRU must not contain duplicates");
    }
}
