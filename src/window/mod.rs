//! The managed window entity.
//!
//! One [`Window`] exists per managed top-level surface. It owns its own
//! geometry (committed, pending, and the restore rectangles for
//! maximize/fullscreen/shade/quick-tile), its mode flags, and its
//! desktop/activity membership. Relations to other windows (transiency,
//! groups, tab groups) are stored as IDs and resolved through the workspace
//! arena, so releasing a window is "remove the ID from every referencing
//! set, then free the slot" with no dangling references.

mod geometry;
mod modes;

use smithay::utils::{Logical, Rectangle};

pub(crate) use geometry::PendingUpdate;
pub(crate) use modes::quick_tile_geometry;

use crate::types::{
    Activities, Activity, Desktop, Desktops, FullScreenMode, Insets, Layer, MappingState,
    MaximizeMode, QuickTileMode, ResolvedRules, Shade, SizeHints, TabGroupId, WindowId, WindowKind,
};

#[derive(Debug)]
pub struct Window {
    id: WindowId,
    kind: WindowKind,
    rules: ResolvedRules,
    size_hints: SizeHints,

    /// Decoration insets reported by the decoration collaborator.
    ///
    /// Only effective while the window is decorated.
    deco_insets: Insets,
    no_border: bool,

    /// Committed frame rectangle.
    frame_geometry: Rectangle<f64, Logical>,
    /// Frame rectangle accumulated while geometry updates are blocked.
    pending_geometry: Rectangle<f64, Logical>,
    pending_update: PendingUpdate,
    geometry_blocks: u32,

    /// Geometry to restore when maximize is dropped.
    restore_maximize: Option<Rectangle<f64, Logical>>,
    /// Geometry to restore when fullscreen is dropped.
    restore_fullscreen: Option<Rectangle<f64, Logical>>,
    /// Geometry to restore when the quick tile is dropped.
    restore_quick_tile: Option<Rectangle<f64, Logical>>,
    /// Frame height to restore when the shade is dropped.
    restore_shade_height: Option<f64>,

    mapping: MappingState,
    minimized: bool,
    /// Hidden by the workspace (show-desktop, desktop switch), independent of
    /// the window's own state.
    hidden: bool,
    /// An external effect still references the window; hiding keeps it
    /// rendered instead of unmapping.
    effect_reference: bool,
    shade: Shade,
    maximize_mode: MaximizeMode,
    fullscreen_mode: FullScreenMode,
    quick_tile: QuickTileMode,
    /// Index into the tile ratio cycle, so repeated identical tile requests
    /// step deterministically.
    tile_cycle_idx: usize,
    keep_above: bool,
    keep_below: bool,
    demands_attention: bool,
    /// The client participates in the resize synchronization handshake.
    supports_resize_sync: bool,

    desktops: Desktops,
    activities: Activities,

    tab_group: Option<TabGroupId>,
    /// Whether this window is its tab group's visible member.
    tab_current: bool,

    /// Cached stacking layer; `None` means it must be recomputed.
    cached_layer: Option<Layer>,
}

impl Window {
    pub fn new(
        id: WindowId,
        kind: WindowKind,
        frame_geometry: Rectangle<f64, Logical>,
        rules: ResolvedRules,
        size_hints: SizeHints,
    ) -> Self {
        let no_border = rules.forced_no_border.unwrap_or(false);
        Self {
            id,
            kind,
            rules,
            size_hints,
            deco_insets: Insets::default(),
            no_border,
            frame_geometry,
            pending_geometry: frame_geometry,
            pending_update: PendingUpdate::None,
            geometry_blocks: 0,
            restore_maximize: None,
            restore_fullscreen: None,
            restore_quick_tile: None,
            restore_shade_height: None,
            mapping: MappingState::Withdrawn,
            minimized: false,
            hidden: false,
            effect_reference: false,
            shade: Shade::None,
            maximize_mode: MaximizeMode::empty(),
            fullscreen_mode: FullScreenMode::None,
            quick_tile: QuickTileMode::empty(),
            tile_cycle_idx: 0,
            keep_above: false,
            keep_below: false,
            demands_attention: false,
            supports_resize_sync: false,
            desktops: Desktops::On(Vec::new()),
            activities: Activities::All,
            tab_group: None,
            tab_current: false,
            cached_layer: None,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn rules(&self) -> &ResolvedRules {
        &self.rules
    }

    pub fn size_hints(&self) -> &SizeHints {
        &self.size_hints
    }

    pub fn set_size_hints(&mut self, hints: SizeHints) {
        self.size_hints = hints;
    }

    pub fn is_decorated(&self) -> bool {
        self.kind.is_decoratable() && !self.no_border
    }

    /// Decoration insets, zero when undecorated.
    pub fn insets(&self) -> Insets {
        if self.is_decorated() {
            self.deco_insets
        } else {
            Insets::default()
        }
    }

    pub fn set_deco_insets(&mut self, insets: Insets) {
        self.deco_insets = insets;
    }

    pub fn no_border(&self) -> bool {
        self.no_border
    }

    pub fn set_no_border(&mut self, no_border: bool) {
        self.no_border = self.rules.forced_no_border.unwrap_or(no_border);
    }

    // =========================================================================
    // Mapping state
    // =========================================================================

    pub fn mapping(&self) -> MappingState {
        self.mapping
    }

    pub fn is_mapped(&self) -> bool {
        self.mapping == MappingState::Mapped
    }

    pub(crate) fn map(&mut self) {
        self.mapping = MappingState::Mapped;
    }

    pub(crate) fn unmap(&mut self, kept: bool) {
        match self.mapping {
            MappingState::Mapped => {
                self.mapping = if kept {
                    MappingState::Kept
                } else {
                    MappingState::Unmapped
                };
            }
            MappingState::Kept if !kept => self.mapping = MappingState::Unmapped,
            _ => (),
        }
    }

    pub(crate) fn withdraw(&mut self) {
        self.mapping = MappingState::Withdrawn;
    }

    /// Whether the external effect reference keeps hidden windows rendered.
    pub fn effect_reference(&self) -> bool {
        self.effect_reference
    }

    pub(crate) fn set_effect_reference(&mut self, referenced: bool) {
        self.effect_reference = referenced;
    }

    // =========================================================================
    // Shown state
    // =========================================================================

    /// Whether the window counts as shown.
    ///
    /// Minimized, shaded (unless the caller accepts shaded windows as shown),
    /// workspace-hidden, and non-current tab group members are not shown.
    /// Desktop and activity visibility are the workspace's concern, not part
    /// of this check.
    pub fn is_shown(&self, shaded_is_shown: bool) -> bool {
        if self.minimized || self.hidden {
            return false;
        }
        if self.shade == Shade::Normal && !shaded_is_shown {
            return false;
        }
        if self.tab_group.is_some() && !self.tab_current {
            return false;
        }
        true
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub(crate) fn set_minimized_flag(&mut self, minimized: bool) {
        self.minimized = minimized;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub(crate) fn set_hidden_flag(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    // =========================================================================
    // Layer flags
    // =========================================================================

    pub fn keep_above(&self) -> bool {
        self.keep_above
    }

    pub fn keep_below(&self) -> bool {
        self.keep_below
    }

    pub fn set_keep_above(&mut self, keep_above: bool) {
        if keep_above {
            self.keep_below = false;
        }
        self.keep_above = keep_above;
        self.invalidate_layer();
    }

    pub fn set_keep_below(&mut self, keep_below: bool) {
        if keep_below {
            self.keep_above = false;
        }
        self.keep_below = keep_below;
        self.invalidate_layer();
    }

    pub fn demands_attention(&self) -> bool {
        self.demands_attention
    }

    pub fn supports_resize_sync(&self) -> bool {
        self.supports_resize_sync
    }

    pub(crate) fn set_supports_resize_sync(&mut self, supported: bool) {
        self.supports_resize_sync = supported;
    }

    pub(crate) fn set_demands_attention(&mut self, demands: bool) {
        self.demands_attention = demands;
    }

    pub(crate) fn cached_layer(&self) -> Option<Layer> {
        self.cached_layer
    }

    pub(crate) fn set_cached_layer(&mut self, layer: Layer) {
        self.cached_layer = Some(layer);
    }

    pub(crate) fn invalidate_layer(&mut self) {
        self.cached_layer = None;
    }

    // =========================================================================
    // Desktops and activities
    // =========================================================================

    pub fn desktops(&self) -> &Desktops {
        &self.desktops
    }

    pub(crate) fn set_desktops(&mut self, desktops: Desktops) {
        self.desktops = desktops;
    }

    pub fn is_on_desktop(&self, desktop: Desktop) -> bool {
        self.desktops.contains(desktop)
    }

    pub fn activities(&self) -> &Activities {
        &self.activities
    }

    pub(crate) fn set_activities(&mut self, activities: Activities) {
        self.activities = activities;
    }

    pub fn is_on_activity(&self, activity: &Activity) -> bool {
        self.activities.contains(activity)
    }

    // =========================================================================
    // Tab group
    // =========================================================================

    pub fn tab_group(&self) -> Option<TabGroupId> {
        self.tab_group
    }

    pub(crate) fn set_tab_group(&mut self, tab_group: Option<TabGroupId>) {
        self.tab_group = tab_group;
        if tab_group.is_none() {
            self.tab_current = false;
        }
    }

    pub fn is_tab_current(&self) -> bool {
        self.tab_current
    }

    pub(crate) fn set_tab_current(&mut self, current: bool) {
        self.tab_current = current;
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    pub fn is_movable(&self) -> bool {
        self.kind.is_movable()
            && !self.rules.fixed_position
            && self.fullscreen_mode == FullScreenMode::None
    }

    pub fn is_resizable(&self) -> bool {
        self.kind.is_resizable()
            && !self.rules.fixed_size
            && self.fullscreen_mode == FullScreenMode::None
            && self.shade != Shade::Normal
    }

    pub fn is_closeable(&self) -> bool {
        self.kind.is_closeable()
    }

    pub fn is_minimizable(&self) -> bool {
        self.kind.is_minimizable()
    }

    pub fn is_maximizable(&self) -> bool {
        self.kind.is_maximizable() && !self.rules.fixed_size
    }

    pub fn accepts_focus(&self) -> bool {
        self.kind.is_focusable() && !self.rules.never_focus
    }
}
