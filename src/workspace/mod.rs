//! The workspace: window registry and orchestrator.
//!
//! [`Workspace`] owns every collection (window arena, stacking order, focus
//! chains, transiency graph, tab groups) and is the only entry point for
//! external events. Operations mutate state synchronously and append
//! [`Notification`]s describing the observable fallout; the embedder drains
//! the queue after each call and forwards the effects to its protocol and
//! rendering layers.
//!
//! Cross-collection operations are split across submodules the same way the
//! window splits its geometry and mode logic: `manage` for the window
//! lifecycle, `activation` for focus and restacking, `desktops` for
//! desktop, activity and show-desktop handling, and `move_resize` (a top
//! level module) for the interactive grab state machine.

mod activation;
mod desktops;
mod manage;

use std::collections::HashMap;
use std::rc::Rc;

use smithay::utils::{Logical, Point, Rectangle};

pub use manage::WindowAttributes;

use crate::clock::Clock;
use crate::focus_chain::FocusChain;
use crate::group::TransiencyGraph;
use crate::move_resize::MoveResize;
use crate::stacking::{StackEntry, StackingOrder};
use crate::types::{
    Activity, DeletedId, Desktop, Layer, MappingState, QuickTileMode, Screen, Shade, WindowId,
    WindowKind,
};
use crate::window::Window;
use crate::Options;

/// An observable effect of a workspace operation, drained by the embedder
/// after each call.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A window's frame geometry committed.
    GeometryCommitted {
        window: WindowId,
        geometry: Rectangle<f64, Logical>,
    },
    /// The constrained stacking order changed.
    StackingChanged { order: Vec<StackEntry> },
    /// A window became shown or hidden.
    VisibilityChanged { window: WindowId, visible: bool },
    /// The active window changed.
    ActiveChanged { window: Option<WindowId> },
    /// A window needs redrawing for a state change with no geometry of its
    /// own (demands-attention, electric border preview).
    RepaintRequested { window: WindowId },
    /// The client should acknowledge a resize step with this serial.
    ResizeSyncRequested { window: WindowId, serial: u64 },
}

/// A destroyed window still referenced by the stacking order while closing
/// effects run.
#[derive(Debug)]
pub(crate) struct Deleted {
    /// The layer the window died with.
    pub(crate) layer: Layer,
}

#[derive(Debug)]
pub struct Workspace {
    pub(crate) windows: HashMap<WindowId, Window>,
    pub(crate) deleted: HashMap<DeletedId, Deleted>,
    pub(crate) stacking: StackingOrder,
    pub(crate) focus_chain: FocusChain,
    pub(crate) transients: TransiencyGraph,

    pub(crate) active: Option<WindowId>,
    pub(crate) current_desktop: Desktop,
    pub(crate) desktop_count: u32,
    pub(crate) current_activity: Activity,
    pub(crate) showing_desktop: bool,

    pub(crate) screens: Vec<Screen>,
    pub(crate) move_resize: Option<MoveResize>,
    pub(crate) notifications: Vec<Notification>,

    pub(crate) clock: Clock,
    pub(crate) options: Rc<Options>,

    window_id_counter: u64,
    deleted_id_counter: u64,
}

impl Workspace {
    pub fn new(options: Rc<Options>, clock: Clock, screens: Vec<Screen>, desktop_count: u32) -> Self {
        let mut screens = screens;
        if screens.is_empty() {
            warn!("no screens supplied; using a placeholder screen");
            let geometry = Rectangle::new(Point::from((0., 0.)), (1280., 720.).into());
            screens.push(Screen {
                geometry,
                work_area: geometry,
            });
        }
        let desktop_count = desktop_count.max(1);

        Self {
            windows: HashMap::new(),
            deleted: HashMap::new(),
            stacking: StackingOrder::new(),
            focus_chain: FocusChain::new(desktop_count),
            transients: TransiencyGraph::new(),
            active: None,
            current_desktop: Desktop(1),
            desktop_count,
            current_activity: Activity::new("default"),
            showing_desktop: false,
            screens,
            move_resize: None,
            notifications: Vec::new(),
            clock,
            options,
            window_id_counter: 0,
            deleted_id_counter: 0,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    pub fn active_window(&self) -> Option<WindowId> {
        self.active
    }

    pub fn current_desktop(&self) -> Desktop {
        self.current_desktop
    }

    pub fn desktop_count(&self) -> u32 {
        self.desktop_count
    }

    pub fn current_activity(&self) -> &Activity {
        &self.current_activity
    }

    pub fn is_showing_desktop(&self) -> bool {
        self.showing_desktop
    }

    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    /// The constrained stacking order, bottom to top.
    pub fn stacking_order(&self) -> &[StackEntry] {
        self.stacking.constrained()
    }

    /// The topmost mapped window containing `point`.
    pub fn topmost_at(&self, point: Point<f64, Logical>) -> Option<WindowId> {
        self.stacking
            .windows_bottom_to_top()
            .filter(|id| {
                self.windows
                    .get(id)
                    .is_some_and(|win| win.is_mapped() && win.frame_geometry().contains(point))
            })
            .last()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // =========================================================================
    // Screens and areas
    // =========================================================================

    /// Replaces the known screens, re-evaluating everything derived from
    /// screen geometry.
    pub fn set_screens(&mut self, screens: Vec<Screen>) {
        if screens.is_empty() {
            warn!("ignoring empty screen list");
            return;
        }
        self.screens = screens;

        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        let mut restack = false;
        for id in ids {
            let Workspace {
                windows, screens, ..
            } = self;
            if let Some(win) = windows.get_mut(&id) {
                restack |= win.check_legacy_fullscreen(screens);
            }
        }
        if restack {
            self.update_stacking();
        }
    }

    pub(crate) fn screen_at(&self, point: Point<f64, Logical>) -> Screen {
        self.screens
            .iter()
            .copied()
            .find(|screen| screen.geometry.contains(point))
            .unwrap_or_else(|| self.primary_screen())
    }

    pub(crate) fn primary_screen(&self) -> Screen {
        self.screens.first().copied().unwrap_or(Screen {
            geometry: Rectangle::default(),
            work_area: Rectangle::default(),
        })
    }

    /// The screen a window belongs to, by its frame center.
    pub(crate) fn screen_for(&self, id: WindowId) -> Screen {
        let Some(win) = self.windows.get(&id) else {
            return self.primary_screen();
        };
        let rect = win.target_geometry();
        let center = Point::from((
            rect.loc.x + rect.size.w / 2.,
            rect.loc.y + rect.size.h / 2.,
        ));
        self.screen_at(center)
    }

    /// The work area maximize and tile operations on `id` target.
    pub(crate) fn area_for(&self, id: WindowId) -> Rectangle<f64, Logical> {
        self.screen_for(id).work_area
    }

    // =========================================================================
    // Stacking recomputation
    // =========================================================================

    /// Recomputes cached layers and the constrained order, emitting one
    /// `StackingChanged` when the order actually changed.
    pub(crate) fn update_stacking(&mut self) {
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        for id in ids {
            if self.windows.get(&id).is_some_and(|w| w.cached_layer().is_none()) {
                let layer = self.compute_layer(id);
                if let Some(win) = self.windows.get_mut(&id) {
                    win.set_cached_layer(layer);
                }
            }
        }

        let Workspace {
            windows,
            deleted,
            transients,
            stacking,
            ..
        } = self;
        let changed = stacking.update(
            |entry| match entry {
                StackEntry::Window(id) => windows
                    .get(&id)
                    .and_then(|win| win.cached_layer())
                    .unwrap_or(Layer::Normal),
                StackEntry::Deleted(id) => {
                    deleted.get(&id).map(|d| d.layer).unwrap_or(Layer::Normal)
                }
            },
            |id| transients.main_clients(id),
        );

        if changed {
            let order = self.stacking.constrained().to_vec();
            self.notifications.push(Notification::StackingChanged { order });
        }
    }

    /// Runs `f` with stacking recomputation blocked, so that N restack
    /// requests inside produce at most one recomputation.
    pub(crate) fn with_stacking_blocked(&mut self, f: impl FnOnce(&mut Self)) {
        self.stacking.block_updates();
        f(self);
        if self.stacking.unblock_updates() {
            self.update_stacking();
        }
    }

    /// The stacking layer of a window, from its mode flags and rules.
    pub(crate) fn compute_layer(&self, id: WindowId) -> Layer {
        let Some(win) = self.windows.get(&id) else {
            return Layer::Normal;
        };
        if let Some(layer) = win.rules().forced_layer {
            return layer;
        }
        if let Some(layer) = win.kind().forced_layer() {
            return layer;
        }
        if win.is_fullscreen() && self.fullscreen_is_active(id) {
            return Layer::ActiveFullscreen;
        }
        if win.kind() == WindowKind::Dock {
            return if win.keep_below() {
                Layer::Below
            } else {
                Layer::Dock
            };
        }
        // keep-above wins when both flags ended up set.
        if win.keep_above() {
            return Layer::Above;
        }
        if win.keep_below() {
            return Layer::Below;
        }
        Layer::Normal
    }

    /// Whether a fullscreen window is promoted to the active fullscreen
    /// layer: it is active itself, or the active window belongs to it
    /// (transient of it, or same application group).
    fn fullscreen_is_active(&self, id: WindowId) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        if active == id {
            return true;
        }
        if self.transients.has_transient(id, active, true) {
            return true;
        }
        match (self.transients.group_of(id), self.transients.group_of(active)) {
            (Some(a), Some(b)) => a.id() == b.id(),
            _ => false,
        }
    }

    /// Fullscreen promotion depends on the active window; drop those caches
    /// whenever activation changes.
    pub(crate) fn invalidate_fullscreen_layers(&mut self) {
        for win in self.windows.values_mut() {
            if win.is_fullscreen() {
                win.invalidate_layer();
            }
        }
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Whether a window should currently be mapped.
    pub(crate) fn should_be_shown(&self, win: &Window) -> bool {
        if !win.is_shown(true) {
            return false;
        }
        if !win.is_on_desktop(self.current_desktop) {
            return false;
        }
        if !win.is_on_activity(&self.current_activity) {
            return false;
        }
        if self.showing_desktop
            && !matches!(win.kind(), WindowKind::Desktop | WindowKind::Dock)
        {
            return false;
        }
        true
    }

    /// Recomputes every window's mapping state, emitting one
    /// `VisibilityChanged` per actual change.
    pub(crate) fn update_visibility(&mut self) {
        let mut ids: Vec<WindowId> = self.windows.keys().copied().collect();
        ids.sort();

        for id in ids {
            let visible = self
                .windows
                .get(&id)
                .is_some_and(|win| self.should_be_shown(win));
            let Some(win) = self.windows.get_mut(&id) else {
                continue;
            };

            match (visible, win.mapping()) {
                (true, MappingState::Mapped) => (),
                (true, _) => {
                    win.map();
                    self.notifications.push(Notification::VisibilityChanged {
                        window: id,
                        visible: true,
                    });
                }
                (false, MappingState::Mapped) => {
                    let kept = win.effect_reference();
                    win.unmap(kept);
                    self.notifications.push(Notification::VisibilityChanged {
                        window: id,
                        visible: false,
                    });
                }
                // The effect released its reference while hidden.
                (false, MappingState::Kept) if !win.effect_reference() => win.unmap(false),
                (false, _) => (),
            }
        }
    }

    /// Hides or unhides a window independently of its own state.
    pub fn set_hidden(&mut self, id: WindowId, hidden: bool) {
        let Some(win) = self.windows.get_mut(&id) else {
            warn!("set_hidden: unknown window {id}");
            return;
        };
        if win.is_hidden() == hidden {
            return;
        }
        win.set_hidden_flag(hidden);
        self.update_visibility();
        if hidden && self.active == Some(id) {
            self.activate_next();
        }
    }

    // =========================================================================
    // Effect references
    // =========================================================================

    /// Marks whether an external effect still needs the window rendered.
    ///
    /// While referenced, hiding transitions to [`MappingState::Kept`]
    /// instead of unmapping.
    pub fn set_effect_reference(&mut self, id: WindowId, referenced: bool) {
        let Some(win) = self.windows.get_mut(&id) else {
            warn!("set_effect_reference: unknown window {id}");
            return;
        };
        win.set_effect_reference(referenced);
        if !referenced && win.mapping() == MappingState::Kept {
            win.unmap(false);
        }
    }

    pub fn effects_done(&mut self, id: WindowId) {
        self.set_effect_reference(id, false);
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Applies a client-driven geometry change.
    pub fn set_window_geometry(&mut self, id: WindowId, rect: Rectangle<f64, Logical>) {
        if !rect_is_sane(rect) {
            warn!("rejecting invalid geometry {rect:?} for window {id}");
            return;
        }

        let restack = {
            let Workspace {
                windows,
                screens,
                notifications,
                ..
            } = self;
            let Some(win) = windows.get_mut(&id) else {
                warn!("set_window_geometry: unknown window {id}");
                return;
            };
            if win.set_frame_geometry(rect) {
                notifications.push(Notification::GeometryCommitted {
                    window: id,
                    geometry: win.frame_geometry(),
                });
            }
            win.check_legacy_fullscreen(screens)
        };
        if restack {
            self.update_stacking();
        }
    }

    /// Updates the decoration insets reported by the decoration
    /// collaborator.
    pub fn set_deco_insets(&mut self, id: WindowId, insets: crate::types::Insets) {
        if let Some(win) = self.windows.get_mut(&id) {
            win.set_deco_insets(insets);
        }
    }

    /// Toggles the window border, re-evaluating legacy fullscreen.
    pub fn set_no_border(&mut self, id: WindowId, no_border: bool) {
        let restack = {
            let Workspace {
                windows, screens, ..
            } = self;
            let Some(win) = windows.get_mut(&id) else {
                warn!("set_no_border: unknown window {id}");
                return;
            };
            win.set_no_border(no_border);
            win.check_legacy_fullscreen(screens)
        };
        if restack {
            self.update_stacking();
        }
    }

    /// Runs `f` with geometry updates on `id` blocked, emitting the single
    /// coalesced commit afterwards.
    pub(crate) fn with_geometry_blocked(&mut self, id: WindowId, f: impl FnOnce(&mut Self)) {
        if let Some(win) = self.windows.get_mut(&id) {
            win.block_geometry_updates();
        }
        f(self);
        if let Some(win) = self.windows.get_mut(&id) {
            if let Some(geometry) = win.unblock_geometry_updates() {
                self.notifications.push(Notification::GeometryCommitted {
                    window: id,
                    geometry,
                });
            }
        }
    }

    // =========================================================================
    // Window modes
    // =========================================================================

    pub fn set_maximize(&mut self, id: WindowId, horizontal: bool, vertical: bool) {
        let Some(win) = self.windows.get(&id) else {
            warn!("set_maximize: unknown window {id}");
            return;
        };
        if (horizontal || vertical) && !win.is_maximizable() {
            debug!("window {id} is not maximizable");
            return;
        }
        let area = self.area_for(id);
        if let Some(win) = self.windows.get_mut(&id) {
            if win.set_maximize(horizontal, vertical, area) {
                let geometry = win.frame_geometry();
                self.notifications.push(Notification::GeometryCommitted {
                    window: id,
                    geometry,
                });
            }
        }
    }

    pub fn set_fullscreen(&mut self, id: WindowId, on: bool) {
        if !self.windows.contains_key(&id) {
            warn!("set_fullscreen: unknown window {id}");
            return;
        }
        let screen = self.screen_for(id).geometry;
        if let Some(win) = self.windows.get_mut(&id) {
            if win.set_fullscreen(on, screen) {
                let geometry = win.frame_geometry();
                self.notifications.push(Notification::GeometryCommitted {
                    window: id,
                    geometry,
                });
            }
        }
        self.update_stacking();
    }

    /// Applies a quick-tile request; a mask that normalizes to maximize is
    /// routed to [`Workspace::set_maximize`].
    pub fn quick_tile(&mut self, id: WindowId, mode: QuickTileMode) {
        let mode = mode.normalized();
        if mode == QuickTileMode::MAXIMIZE {
            self.set_maximize(id, true, true);
            return;
        }
        let Some(win) = self.windows.get(&id) else {
            warn!("quick_tile: unknown window {id}");
            return;
        };
        if !mode.is_empty() && !win.is_resizable() {
            debug!("window {id} is not tileable");
            return;
        }
        let area = self.area_for(id);
        if let Some(win) = self.windows.get_mut(&id) {
            if win.set_quick_tile(mode, area) {
                let geometry = win.frame_geometry();
                self.notifications.push(Notification::GeometryCommitted {
                    window: id,
                    geometry,
                });
            }
        }
    }

    pub fn set_shade(&mut self, id: WindowId, shade: Shade) {
        if let Some(win) = self.windows.get_mut(&id) {
            if win.set_shade(shade) {
                let geometry = win.frame_geometry();
                self.notifications.push(Notification::GeometryCommitted {
                    window: id,
                    geometry,
                });
            }
        } else {
            warn!("set_shade: unknown window {id}");
        }
    }

    pub fn set_keep_above(&mut self, id: WindowId, keep_above: bool) {
        if let Some(win) = self.windows.get_mut(&id) {
            win.set_keep_above(keep_above);
            self.update_stacking();
        }
    }

    pub fn set_keep_below(&mut self, id: WindowId, keep_below: bool) {
        if let Some(win) = self.windows.get_mut(&id) {
            win.set_keep_below(keep_below);
            self.update_stacking();
        }
    }

    // =========================================================================
    // Tab groups
    // =========================================================================

    /// Groups `members` into one visible slot, with `current` shown.
    pub fn create_tab_group(
        &mut self,
        members: Vec<WindowId>,
        current: WindowId,
    ) -> Option<crate::types::TabGroupId> {
        if members.iter().any(|m| !self.windows.contains_key(m)) {
            warn!("refusing tab group over unknown windows");
            return None;
        }
        let id = self.transients.create_tab_group(members, current)?;
        self.sync_tab_flags();
        self.update_visibility();
        Some(id)
    }

    /// Makes `id` its tab group's visible member, handing it focus when the
    /// previously visible member was active.
    pub fn set_tab_current(&mut self, id: WindowId) {
        let Some(previous) = self.transients.set_tab_current(id) else {
            return;
        };
        self.sync_tab_flags();
        self.update_visibility();
        if self.active == Some(previous) {
            self.activate(id);
        }
    }

    pub fn remove_from_tab_group(&mut self, id: WindowId) {
        if self.transients.leave_tab_group(id).is_some() || self.windows.contains_key(&id) {
            self.sync_tab_flags();
            self.update_visibility();
        }
    }

    /// Re-derives every window's tab group flags from the graph.
    pub(crate) fn sync_tab_flags(&mut self) {
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        for id in ids {
            let (group, current) = match self.transients.tab_group_of(id) {
                Some(group) => (Some(group.id()), group.current() == id),
                None => (None, false),
            };
            if let Some(win) = self.windows.get_mut(&id) {
                win.set_tab_group(group);
                win.set_tab_current(current);
            }
        }
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    #[cfg(test)]
    pub(crate) fn verify_invariants(&self) {
        use std::collections::HashSet;

        // The active window is live and can hold focus.
        if let Some(active) = self.active {
            let win = self.windows.get(&active).expect("active window must be live");
            assert!(win.accepts_focus(), "active window must accept focus");
        }

        // The stacking order is a dup-free total order over live windows
        // and deleted placeholders.
        let expected: HashSet<StackEntry> = self
            .windows
            .keys()
            .map(|id| StackEntry::Window(*id))
            .chain(self.deleted.keys().map(|id| StackEntry::Deleted(*id)))
            .collect();
        let unconstrained: HashSet<StackEntry> =
            self.stacking.unconstrained().iter().copied().collect();
        assert_eq!(
            unconstrained.len(),
            self.stacking.unconstrained().len(),
            "stacking order must not contain duplicates"
        );
        assert_eq!(unconstrained, expected, "stacking must cover exactly the live entries");
        self.stacking.verify_invariants();

        // Transients sit above all of their main windows.
        for (i, entry) in self.stacking.constrained().iter().enumerate() {
            let StackEntry::Window(id) = entry else {
                continue;
            };
            for main in self.transients.main_clients(*id) {
                if let Some(pos) = self.stacking.position(StackEntry::Window(main)) {
                    assert!(pos < i, "transient {id} must stack above its main {main}");
                }
            }
        }

        // Focus chain entries refer to live windows.
        for id in self.focus_chain.most_recently_used() {
            assert!(self.windows.contains_key(id), "focus chain entry {id} must be live");
        }
        self.focus_chain.verify_invariants();

        // Tab groups have exactly one current member and flags match.
        for win in self.windows.values() {
            match self.transients.tab_group_of(win.id()) {
                Some(group) => {
                    assert_eq!(win.tab_group(), Some(group.id()));
                    assert_eq!(win.is_tab_current(), group.current() == win.id());
                }
                None => assert_eq!(win.tab_group(), None),
            }
        }

        // Blockers never stay engaged between entry points.
        assert!(!self.stacking.is_blocked(), "stacking blocker must be released");
        for win in self.windows.values() {
            assert!(
                !win.geometry_blocked(),
                "geometry blocker on {} must be released",
                win.id()
            );
        }
    }
}

pub(crate) fn rect_is_sane(rect: Rectangle<f64, Logical>) -> bool {
    rect.loc.x.is_finite()
        && rect.loc.y.is_finite()
        && rect.size.w.is_finite()
        && rect.size.h.is_finite()
        && rect.size.w > 0.
        && rect.size.h > 0.
}
