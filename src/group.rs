//! Transiency relations, application groups, and tab groups.
//!
//! All relations are stored as ID sets and resolved through the workspace
//! arena. The graph is defensive about external inconsistency: a
//! transient-for reference to the window itself falls back to
//! group-transiency (or to no relation at all), and every transitive walk
//! carries a visited set so that a corrupted graph can never recurse
//! forever.

use std::collections::{HashMap, HashSet};

use crate::types::{GroupId, TabGroupId, WindowId};

/// What a window is transient for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransientFor {
    /// Not a transient.
    #[default]
    None,
    /// Transient for one specific window.
    Window(WindowId),
    /// Transient for every other member of an application group.
    Group(GroupId),
}

/// A set of windows belonging to one client application instance.
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    /// Key the embedder identifies the application by.
    key: String,
    /// First window that established the group, while it is still a member.
    leader: Option<WindowId>,
    members: Vec<WindowId>,
}

impl Group {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn leader(&self) -> Option<WindowId> {
        self.leader
    }

    pub fn members(&self) -> &[WindowId] {
        &self.members
    }
}

/// A set of windows sharing one visible slot.
#[derive(Debug)]
pub struct TabGroup {
    id: TabGroupId,
    members: Vec<WindowId>,
    /// The one member that is visible.
    current: WindowId,
}

impl TabGroup {
    pub fn id(&self) -> TabGroupId {
        self.id
    }

    pub fn members(&self) -> &[WindowId] {
        &self.members
    }

    pub fn current(&self) -> WindowId {
        self.current
    }
}

/// The transiency and grouping state for all managed windows.
#[derive(Debug, Default)]
pub struct TransiencyGraph {
    /// What each window is transient for.
    parents: HashMap<WindowId, TransientFor>,
    /// Direct transients of each window (not including group transients).
    children: HashMap<WindowId, Vec<WindowId>>,
    groups: HashMap<GroupId, Group>,
    window_group: HashMap<WindowId, GroupId>,
    tab_groups: HashMap<TabGroupId, TabGroup>,
    window_tab_group: HashMap<WindowId, TabGroupId>,
    group_id_counter: u64,
    tab_group_id_counter: u64,
}

impl TransiencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Transiency
    // =========================================================================

    /// Sets what `window` is transient for.
    ///
    /// Inconsistent input is resolved here rather than propagated: a
    /// self-reference falls back to group-transiency when the window has a
    /// group (otherwise to no relation), and a reference that would create a
    /// cycle is dropped.
    pub fn set_transient_for(&mut self, window: WindowId, target: TransientFor) {
        let target = match target {
            TransientFor::Window(main) if main == window => {
                warn!("window {window} transient for itself; falling back to group transiency");
                match self.window_group.get(&window) {
                    Some(group) => TransientFor::Group(*group),
                    None => TransientFor::None,
                }
            }
            TransientFor::Window(main) if self.all_main_clients(main).contains(&window) => {
                warn!("transient-for {window} -> {main} would create a cycle; dropping relation");
                TransientFor::None
            }
            other => other,
        };

        self.detach_from_parent(window);

        if let TransientFor::Window(main) = target {
            self.children.entry(main).or_default().push(window);
        }
        if target == TransientFor::None {
            self.parents.remove(&window);
        } else {
            self.parents.insert(window, target);
        }
    }

    pub fn transient_for(&self, window: WindowId) -> TransientFor {
        self.parents.get(&window).copied().unwrap_or_default()
    }

    pub fn is_transient(&self, window: WindowId) -> bool {
        !self.main_clients(window).is_empty()
    }

    /// Immediate main windows of `window`.
    ///
    /// More than one entry only for group transients, which are subordinate
    /// to every other member of their group.
    pub fn main_clients(&self, window: WindowId) -> Vec<WindowId> {
        match self.transient_for(window) {
            TransientFor::None => Vec::new(),
            TransientFor::Window(main) => vec![main],
            TransientFor::Group(group) => self
                .groups
                .get(&group)
                .map(|g| {
                    g.members
                        .iter()
                        .copied()
                        .filter(|member| *member != window)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Transitive closure of [`TransiencyGraph::main_clients`], deduplicated.
    ///
    /// Terminates even on a cyclic graph; the cycle is reported and skipped.
    pub fn all_main_clients(&self, window: WindowId) -> Vec<WindowId> {
        let mut result = Vec::new();
        let mut visited = HashSet::from([window]);
        let mut queue = self.main_clients(window);

        while let Some(main) = queue.pop() {
            if !visited.insert(main) {
                if main == window {
                    warn!("transiency cycle through window {window}; breaking walk");
                }
                continue;
            }
            result.push(main);
            queue.extend(self.main_clients(main));
        }

        result
    }

    /// Direct transients of `window`, including group transients of its
    /// group.
    pub fn transients(&self, window: WindowId) -> Vec<WindowId> {
        let mut result: Vec<WindowId> =
            self.children.get(&window).cloned().unwrap_or_default();

        if let Some(group) = self.window_group.get(&window) {
            if let Some(group) = self.groups.get(group) {
                for member in &group.members {
                    if *member != window
                        && self.transient_for(*member) == TransientFor::Group(group.id)
                        && !result.contains(member)
                    {
                        result.push(*member);
                    }
                }
            }
        }

        result
    }

    /// Whether `window` has `candidate` among its transients.
    ///
    /// With `indirect`, walks the whole subtree; the visited set guards
    /// against externally induced cycles.
    pub fn has_transient(&self, window: WindowId, candidate: WindowId, indirect: bool) -> bool {
        if !indirect {
            return self.transients(window).contains(&candidate);
        }

        let mut visited = HashSet::from([window]);
        let mut queue = self.transients(window);
        while let Some(child) = queue.pop() {
            if child == candidate {
                return true;
            }
            if !visited.insert(child) {
                continue;
            }
            queue.extend(self.transients(child));
        }
        false
    }

    /// The transient subtree of `window`, including itself, in an
    /// unspecified order.
    pub fn transient_subtree(&self, window: WindowId) -> Vec<WindowId> {
        let mut result = vec![window];
        let mut idx = 0;
        while idx < result.len() {
            let current = result[idx];
            idx += 1;
            for child in self.transients(current) {
                if !result.contains(&child) {
                    result.push(child);
                }
            }
        }
        result
    }

    fn detach_from_parent(&mut self, window: WindowId) {
        if let Some(TransientFor::Window(main)) = self.parents.get(&window) {
            if let Some(children) = self.children.get_mut(main) {
                children.retain(|child| *child != window);
            }
        }
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Adds `window` to the group identified by `key`, creating the group
    /// (with `window` as leader) if it does not exist yet.
    pub fn join_group(&mut self, window: WindowId, key: &str) -> GroupId {
        self.leave_group(window);

        if let Some(group) = self.groups.values_mut().find(|g| g.key == key) {
            group.members.push(window);
            let id = group.id;
            self.window_group.insert(window, id);
            return id;
        }

        self.group_id_counter += 1;
        let id = GroupId(self.group_id_counter);
        self.groups.insert(
            id,
            Group {
                id,
                key: key.to_owned(),
                leader: Some(window),
                members: vec![window],
            },
        );
        self.window_group.insert(window, id);
        id
    }

    /// Removes `window` from its group; the group persists until the last
    /// member leaves.
    pub fn leave_group(&mut self, window: WindowId) {
        let Some(group_id) = self.window_group.remove(&window) else {
            return;
        };
        let Some(group) = self.groups.get_mut(&group_id) else {
            return;
        };

        group.members.retain(|member| *member != window);
        if group.members.is_empty() {
            self.groups.remove(&group_id);
            return;
        }
        if group.leader == Some(window) {
            group.leader = group.members.first().copied();
            self.check_group_transients(group_id);
        }
    }

    pub fn group_of(&self, window: WindowId) -> Option<&Group> {
        self.window_group
            .get(&window)
            .and_then(|id| self.groups.get(id))
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Re-evaluates group-transient relations after a leader change.
    ///
    /// A group transient in a group it is the only member of has nothing to
    /// be subordinate to; the relation is dropped.
    pub fn check_group_transients(&mut self, group: GroupId) {
        let Some(members) = self.groups.get(&group).map(|g| g.members.clone()) else {
            return;
        };

        for member in &members {
            if self.transient_for(*member) == TransientFor::Group(group) && members.len() == 1 {
                debug!("dropping group transiency of sole group member {member}");
                self.parents.remove(member);
            }
        }
    }

    // =========================================================================
    // Tab groups
    // =========================================================================

    /// Creates a tab group over `members`, making `current` visible.
    ///
    /// Returns `None` for degenerate input (fewer than two members, or
    /// `current` not among them).
    pub fn create_tab_group(
        &mut self,
        members: Vec<WindowId>,
        current: WindowId,
    ) -> Option<TabGroupId> {
        if members.len() < 2 || !members.contains(&current) {
            warn!("refusing degenerate tab group over {} members", members.len());
            return None;
        }
        if members.iter().any(|m| self.window_tab_group.contains_key(m)) {
            warn!("refusing tab group with members already in another tab group");
            return None;
        }

        self.tab_group_id_counter += 1;
        let id = TabGroupId(self.tab_group_id_counter);
        for member in &members {
            self.window_tab_group.insert(*member, id);
        }
        self.tab_groups.insert(
            id,
            TabGroup {
                id,
                members,
                current,
            },
        );
        Some(id)
    }

    /// Makes `window` its tab group's visible member.
    ///
    /// Returns the previously current member when the switch happened.
    pub fn set_tab_current(&mut self, window: WindowId) -> Option<WindowId> {
        let id = self.window_tab_group.get(&window)?;
        let tab_group = self.tab_groups.get_mut(id)?;
        if tab_group.current == window {
            return None;
        }
        let previous = tab_group.current;
        tab_group.current = window;
        Some(previous)
    }

    /// Removes `window` from its tab group.
    ///
    /// Returns the member that becomes current when the removed window was
    /// the visible one. A tab group shrinking to one member dissolves.
    pub fn leave_tab_group(&mut self, window: WindowId) -> Option<WindowId> {
        let id = self.window_tab_group.remove(&window)?;
        let tab_group = self.tab_groups.get_mut(&id)?;

        tab_group.members.retain(|member| *member != window);

        let mut new_current = None;
        if tab_group.current == window {
            new_current = tab_group.members.first().copied();
            if let Some(current) = new_current {
                tab_group.current = current;
            }
        }

        if tab_group.members.len() < 2 {
            let remaining = self.tab_groups.remove(&id).map(|g| g.members).unwrap_or_default();
            for member in remaining {
                self.window_tab_group.remove(&member);
            }
        }

        new_current
    }

    pub fn tab_group(&self, id: TabGroupId) -> Option<&TabGroup> {
        self.tab_groups.get(&id)
    }

    pub fn tab_group_of(&self, window: WindowId) -> Option<&TabGroup> {
        self.window_tab_group
            .get(&window)
            .and_then(|id| self.tab_groups.get(id))
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Detaches `window` from every relation before its arena slot is freed.
    ///
    /// Children of `window` lose their transient relation; group and tab
    /// group membership end.
    pub fn remove_window(&mut self, window: WindowId) -> RemovedRelations {
        self.detach_from_parent(window);
        self.parents.remove(&window);

        let orphans = self.children.remove(&window).unwrap_or_default();
        for orphan in &orphans {
            self.parents.remove(orphan);
        }

        let new_tab_current = self.leave_tab_group(window);
        self.leave_group(window);

        RemovedRelations {
            orphans,
            new_tab_current,
        }
    }

    /// Test-only direct parent write that skips the consistency checks, for
    /// exercising the cycle guards.
    #[cfg(test)]
    pub(crate) fn force_parent(&mut self, window: WindowId, main: WindowId) {
        self.parents.insert(window, TransientFor::Window(main));
        self.children.entry(main).or_default().push(window);
    }
}

/// Fallout of removing a window from the graph.
#[derive(Debug, Default)]
pub struct RemovedRelations {
    /// Former direct transients whose relation was cleared.
    pub orphans: Vec<WindowId>,
    /// Tab group member that became visible in the removed window's place.
    pub new_tab_current: Option<WindowId>,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn is_transient_iff_main_clients_nonempty() {
        let mut graph = TransiencyGraph::new();
        let (a, b) = (WindowId(1), WindowId(2));

        assert!(!graph.is_transient(b));
        assert!(graph.main_clients(b).is_empty());

        graph.set_transient_for(b, TransientFor::Window(a));
        assert!(graph.is_transient(b));
        assert_eq!(graph.main_clients(b), vec![a]);

        graph.set_transient_for(b, TransientFor::None);
        assert!(!graph.is_transient(b));
    }

    #[test]
    fn self_reference_falls_back() {
        let mut graph = TransiencyGraph::new();
        let a = WindowId(1);

        graph.set_transient_for(a, TransientFor::Window(a));
        assert_eq!(graph.transient_for(a), TransientFor::None);

        let group = graph.join_group(a, "app");
        graph.set_transient_for(a, TransientFor::Window(a));
        assert_eq!(graph.transient_for(a), TransientFor::Group(group));
        // A sole member has no other members to be subordinate to.
        assert!(graph.main_clients(a).is_empty());
    }

    #[test]
    fn cycle_creating_relation_is_dropped() {
        let mut graph = TransiencyGraph::new();
        let (a, b, c) = (WindowId(1), WindowId(2), WindowId(3));

        graph.set_transient_for(b, TransientFor::Window(a));
        graph.set_transient_for(c, TransientFor::Window(b));
        graph.set_transient_for(a, TransientFor::Window(c));

        assert_eq!(graph.transient_for(a), TransientFor::None);
        assert_eq!(graph.all_main_clients(c), vec![b, a]);
    }

    #[test]
    fn group_transients_subordinate_to_all_other_members() {
        let mut graph = TransiencyGraph::new();
        let (a, b, c) = (WindowId(1), WindowId(2), WindowId(3));

        let group = graph.join_group(a, "app");
        graph.join_group(b, "app");
        graph.join_group(c, "app");
        graph.set_transient_for(c, TransientFor::Group(group));

        let mut mains = graph.main_clients(c);
        mains.sort();
        assert_eq!(mains, vec![a, b]);
        assert!(graph.has_transient(a, c, false));
        assert!(graph.has_transient(b, c, false));
    }

    #[test]
    fn leader_changes_when_leader_leaves() {
        let mut graph = TransiencyGraph::new();
        let (a, b) = (WindowId(1), WindowId(2));

        graph.join_group(a, "app");
        graph.join_group(b, "app");
        assert_eq!(graph.group_of(b).unwrap().leader(), Some(a));

        graph.remove_window(a);
        assert_eq!(graph.group_of(b).unwrap().leader(), Some(b));
    }

    #[test]
    fn removal_detaches_everything() {
        let mut graph = TransiencyGraph::new();
        let (a, b, c) = (WindowId(1), WindowId(2), WindowId(3));

        graph.set_transient_for(b, TransientFor::Window(a));
        graph.set_transient_for(c, TransientFor::Window(b));
        graph.join_group(b, "app");

        let removed = graph.remove_window(b);
        assert_eq!(removed.orphans, vec![c]);
        assert!(!graph.is_transient(c));
        assert!(graph.transients(a).is_empty());
        assert!(graph.group_of(b).is_none());
    }

    #[test]
    fn indirect_has_transient_survives_forced_cycle() {
        let mut graph = TransiencyGraph::new();
        let (a, b, c) = (WindowId(1), WindowId(2), WindowId(3));

        graph.force_parent(b, a);
        graph.force_parent(c, b);
        graph.force_parent(a, c);

        assert!(graph.has_transient(a, c, true));
        assert!(!graph.has_transient(a, WindowId(99), true));
    }

    #[test]
    fn tab_group_keeps_exactly_one_current() {
        let mut graph = TransiencyGraph::new();
        let (a, b, c) = (WindowId(1), WindowId(2), WindowId(3));

        let id = graph.create_tab_group(vec![a, b, c], a).unwrap();
        assert_eq!(graph.tab_group(id).unwrap().current(), a);

        assert_eq!(graph.set_tab_current(b), Some(a));
        assert_eq!(graph.tab_group(id).unwrap().current(), b);

        // Removing the current member promotes another.
        assert_eq!(graph.leave_tab_group(b), Some(a));
        // Two members remain, the group persists.
        assert_eq!(graph.tab_group(id).unwrap().members().len(), 2);

        // Shrinking to one member dissolves the group.
        graph.leave_tab_group(a);
        assert!(graph.tab_group(id).is_none());
        assert!(graph.tab_group_of(c).is_none());
    }

    proptest! {
        /// `all_main_clients` terminates and returns no duplicates even on
        /// an adversarially cyclic graph.
        #[test]
        fn all_main_clients_terminates_without_duplicates(
            edges in prop::collection::vec((0u64..16, 0u64..16), 0..64),
            start in 0u64..16,
        ) {
            let mut graph = TransiencyGraph::new();
            for (child, main) in edges {
                graph.force_parent(WindowId(child), WindowId(main));
            }

            let mains = graph.all_main_clients(WindowId(start));
            let unique: HashSet<_> = mains.iter().copied().collect();
            prop_assert_eq!(unique.len(), mains.len());
            prop_assert!(!mains.contains(&WindowId(start)));
        }

        /// `has_transient` with `indirect` terminates on any graph.
        #[test]
        fn has_transient_terminates(
            edges in prop::collection::vec((0u64..16, 0u64..16), 0..64),
            start in 0u64..16,
            needle in 0u64..16,
        ) {
            let mut graph = TransiencyGraph::new();
            for (child, main) in edges {
                graph.force_parent(WindowId(child), WindowId(main));
            }
            let _ = graph.has_transient(WindowId(start), WindowId(needle), true);
        }
    }
}
