//! Window management core.
//!
//! Strata is the policy layer of a stacking window manager: it decides which
//! window is active, how windows are layered, how they respond to interactive
//! move/resize and quick-tiling, and how desktop and activity switches
//! propagate to window visibility. It deliberately owns no transport and no
//! rendering: external events (window created, pointer moved, desktop
//! switched) enter through [`Workspace`] methods, and the resulting effects
//! come back out as [`Notification`]s that the embedder drains after each
//! call and forwards to its protocol and compositing layers.
//!
//! The core is single-threaded and sans-I/O. Everything that looks like a
//! timer (the resize synchronization handshake) is an explicit deadline
//! checked from [`Workspace::tick()`], driven by a [`Clock`] handle that
//! tests can control directly.
//!
//! Two nestable blockers exist to coalesce observable effects, never to
//! reorder causal events: the per-window geometry update blocker (N nested
//! geometry changes produce exactly one commit) and the workspace-wide
//! stacking update blocker (N restack requests produce exactly one
//! recomputation).

#[macro_use]
extern crate tracing;

use std::time::Duration;

pub mod clock;
pub mod focus_chain;
pub mod group;
pub mod move_resize;
pub mod stacking;
pub mod types;
pub mod window;
pub mod workspace;

pub use clock::Clock;
pub use group::TransientFor;
pub use move_resize::GrabMode;
pub use stacking::StackEntry;
pub use types::{
    Activities, Activity, Desktop, Desktops, FullScreenMode, Layer, MappingState, MaximizeMode,
    QuickTileMode, ResizeEdge, Shade, WindowId, WindowKind,
};
pub use window::Window;
pub use workspace::{Notification, WindowAttributes, Workspace};

/// Configurable properties of the core.
///
/// Parsing and persistence live outside the core; the embedder constructs
/// this from whatever configuration system it uses.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Distance in logical pixels at which a moved window snaps to screen and
    /// work area borders.
    pub border_snap_zone: f64,
    /// Distance in logical pixels at which a moved window snaps to the edges
    /// of other windows.
    pub window_snap_zone: f64,
    /// Distance from a screen edge at which an interactive move engages a
    /// provisional quick tile or maximize.
    pub electric_border_range: f64,
    /// Whether dragging a window to the top screen edge maximizes it.
    pub electric_border_maximize: bool,
    /// Whether dragging a window to a side screen edge tiles it.
    pub electric_border_tiling: bool,
    /// Restrict focus chain candidates to the screen of the active window.
    pub separate_screen_focus: bool,
    /// Refuse activation requests while another window holds focus, marking
    /// the requester as demanding attention instead.
    pub focus_stealing_prevention: bool,
    /// How long a resize step waits for the client's sync acknowledgment
    /// before proceeding best-effort.
    pub resize_sync_timeout: Duration,
    /// Deadline after which a stuck sync handshake is forcibly released for
    /// the rest of the interaction.
    pub resize_sync_failsafe: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            border_snap_zone: 10.,
            window_snap_zone: 10.,
            electric_border_range: 20.,
            electric_border_maximize: true,
            electric_border_tiling: true,
            separate_screen_focus: false,
            focus_stealing_prevention: false,
            resize_sync_timeout: Duration::from_millis(250),
            resize_sync_failsafe: Duration::from_millis(1000),
        }
    }
}
