//! Shared types for the window management core.

use std::fmt;

use smithay::utils::{Logical, Rectangle, Size};

/// Unique ID of a managed window, stable for the window's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique ID of a deleted-window placeholder in the stacking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeletedId(pub u64);

impl fmt::Display for DeletedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique ID of an application window group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique ID of a tab group (windows sharing one visible slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabGroupId(pub u64);

impl fmt::Display for TabGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Virtual desktop index, starting from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Desktop(pub u32);

impl fmt::Display for Desktop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Activity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Activity(pub String);

impl Activity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Desktop membership of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desktops {
    /// The window shows on every desktop.
    All,
    /// The window shows on these desktops only.
    On(Vec<Desktop>),
}

impl Desktops {
    pub fn contains(&self, desktop: Desktop) -> bool {
        match self {
            Desktops::All => true,
            Desktops::On(list) => list.contains(&desktop),
        }
    }

    pub fn is_on_all(&self) -> bool {
        matches!(self, Desktops::All)
    }
}

/// Activity membership of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activities {
    All,
    On(Vec<Activity>),
}

impl Activities {
    pub fn contains(&self, activity: &Activity) -> bool {
        match self {
            Activities::All => true,
            Activities::On(list) => list.contains(activity),
        }
    }

    pub fn is_on_all(&self) -> bool {
        matches!(self, Activities::All)
    }
}

/// Coarse stacking category, ordered from back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Desktop,
    Below,
    Normal,
    Dock,
    Above,
    Notification,
    ActiveFullscreen,
    OnScreenDisplay,
    Tooltip,
}

impl Layer {
    /// All layers, back to front.
    pub const ALL: [Layer; 9] = [
        Layer::Desktop,
        Layer::Below,
        Layer::Normal,
        Layer::Dock,
        Layer::Above,
        Layer::Notification,
        Layer::ActiveFullscreen,
        Layer::OnScreenDisplay,
        Layer::Tooltip,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Kind of a managed window.
///
/// Behavior differences between kinds are capability lookups on this tag
/// rather than separate window types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Normal,
    Dialog,
    Utility,
    Desktop,
    Dock,
    Splash,
    Notification,
    OnScreenDisplay,
    Tooltip,
}

impl WindowKind {
    pub fn is_movable(self) -> bool {
        matches!(
            self,
            WindowKind::Normal | WindowKind::Dialog | WindowKind::Utility
        )
    }

    pub fn is_resizable(self) -> bool {
        matches!(
            self,
            WindowKind::Normal | WindowKind::Dialog | WindowKind::Utility
        )
    }

    pub fn is_closeable(self) -> bool {
        matches!(
            self,
            WindowKind::Normal | WindowKind::Dialog | WindowKind::Utility | WindowKind::Dock
        )
    }

    pub fn is_decoratable(self) -> bool {
        matches!(
            self,
            WindowKind::Normal | WindowKind::Dialog | WindowKind::Utility
        )
    }

    pub fn is_focusable(self) -> bool {
        matches!(
            self,
            WindowKind::Normal | WindowKind::Dialog | WindowKind::Utility | WindowKind::Desktop
        )
    }

    pub fn is_minimizable(self) -> bool {
        matches!(self, WindowKind::Normal | WindowKind::Dialog)
    }

    pub fn is_maximizable(self) -> bool {
        matches!(self, WindowKind::Normal)
    }

    /// The layer this kind is pinned to, if any.
    ///
    /// Kinds returning `None` compute their layer from mode flags instead.
    pub fn forced_layer(self) -> Option<Layer> {
        match self {
            WindowKind::Desktop => Some(Layer::Desktop),
            WindowKind::Notification => Some(Layer::Notification),
            WindowKind::OnScreenDisplay => Some(Layer::OnScreenDisplay),
            WindowKind::Tooltip => Some(Layer::Tooltip),
            _ => None,
        }
    }
}

/// Mapping state of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    /// Not yet managed, or released.
    Withdrawn,
    /// Shown on screen.
    Mapped,
    /// Hidden, no longer rendered.
    Unmapped,
    /// Hidden, but still rendered for an ongoing effect.
    Kept,
}

bitflags::bitflags! {
    /// Maximization state, per axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaximizeMode: u8 {
        const HORIZONTAL = 1;
        const VERTICAL = 1 << 1;
        const FULL = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

/// Fullscreen state of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullScreenMode {
    #[default]
    None,
    /// Fullscreen requested through the protocol; freely togglable.
    Client,
    /// Fullscreen inferred from a borderless window covering a whole screen.
    ///
    /// One-way: only the client changing its own geometry or border leaves
    /// this state.
    Legacy,
}

/// Shade state of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shade {
    #[default]
    None,
    /// Rolled up to the titlebar.
    Normal,
    /// Logically shaded but temporarily shown at full height.
    Partial,
}

bitflags::bitflags! {
    /// Quick-tile state as a combinable edge mask.
    ///
    /// `LEFT | RIGHT` and `TOP | BOTTOM` are not meaningful tiles; they
    /// normalize to [`QuickTileMode::MAXIMIZE`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QuickTileMode: u8 {
        const LEFT = 1;
        const RIGHT = 1 << 1;
        const TOP = 1 << 2;
        const BOTTOM = 1 << 3;
        const MAXIMIZE = Self::LEFT.bits()
            | Self::RIGHT.bits()
            | Self::TOP.bits()
            | Self::BOTTOM.bits();
    }
}

impl QuickTileMode {
    /// Collapses contradictory masks to a maximize request.
    pub fn normalized(self) -> Self {
        if self.contains(Self::LEFT | Self::RIGHT) || self.contains(Self::TOP | Self::BOTTOM) {
            Self::MAXIMIZE
        } else {
            self
        }
    }
}

bitflags::bitflags! {
    /// Edges involved in an interactive resize.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResizeEdge: u8 {
        const TOP = 1;
        const BOTTOM = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

/// Decoration insets around the client area, in logical pixels.
///
/// All zero when the window has no decoration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Size constraints a client declares for its window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeHints {
    /// Minimum frame size.
    pub min: Size<f64, Logical>,
    /// Maximum frame size; infinite components mean unconstrained.
    pub max: Size<f64, Logical>,
    /// Resize increments; sizes snap to `base + k * increments`.
    pub increments: Size<f64, Logical>,
    /// Base size for increment calculations.
    pub base: Size<f64, Logical>,
    /// Allowed width/height ratio range, if any.
    pub aspect: Option<(f64, f64)>,
}

impl Default for SizeHints {
    fn default() -> Self {
        Self {
            min: Size::from((1., 1.)),
            max: Size::from((f64::INFINITY, f64::INFINITY)),
            increments: Size::from((1., 1.)),
            base: Size::from((0., 0.)),
            aspect: None,
        }
    }
}

/// Window rules resolved by the embedder before a window is managed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedRules {
    /// Geometry forced by a rule, applied instead of placement.
    pub forced_geometry: Option<Rectangle<f64, Logical>>,
    /// Border presence forced by a rule.
    pub forced_no_border: Option<bool>,
    /// Desktop forced by a rule.
    pub forced_desktop: Option<Desktop>,
    /// Layer forced by a rule, overriding the computed one.
    pub forced_layer: Option<Layer>,
    /// The window may not be moved interactively.
    pub fixed_position: bool,
    /// The window may not be resized interactively.
    pub fixed_size: bool,
    /// The window may never take focus.
    pub never_focus: bool,
}

/// A screen known to the workspace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    /// Full screen geometry.
    pub geometry: Rectangle<f64, Logical>,
    /// Screen geometry minus panels and other reserved areas.
    pub work_area: Rectangle<f64, Logical>,
}
