//! Maximize, fullscreen, shade and quick-tile state.
//!
//! Every mode saves a restore rectangle on entry and recovers it on exit.
//! Maximize and quick-tile are mutually exclusive: engaging one clears the
//! other, and the restore base carries over so that un-setting whichever was
//! engaged last still recovers the original pre-mode geometry.

use smithay::utils::{Logical, Rectangle};

use super::Window;
use crate::types::{FullScreenMode, MaximizeMode, QuickTileMode, Screen, Shade, WindowKind};

/// Tile sizes stepped through by repeated identical quick-tile requests,
/// as a fraction of the work area.
pub(crate) const QUICK_TILE_RATIOS: [f64; 3] = [0.5, 1. / 3., 2. / 3.];

impl Window {
    // =========================================================================
    // Maximize
    // =========================================================================

    pub fn maximize_mode(&self) -> MaximizeMode {
        self.maximize_mode
    }

    /// Sets the maximization state per axis.
    ///
    /// Returns `true` when a geometry change committed immediately.
    pub(crate) fn set_maximize(
        &mut self,
        horizontal: bool,
        vertical: bool,
        area: Rectangle<f64, Logical>,
    ) -> bool {
        if self.fullscreen_mode != FullScreenMode::None {
            debug!("ignoring maximize request for fullscreen window {}", self.id);
            return false;
        }

        let mut target = MaximizeMode::empty();
        if horizontal {
            target |= MaximizeMode::HORIZONTAL;
        }
        if vertical {
            target |= MaximizeMode::VERTICAL;
        }

        if target == self.maximize_mode && self.quick_tile.is_empty() {
            return false;
        }

        // Maximize supersedes a quick tile; the tile's restore base carries
        // over so un-maximizing recovers the pre-tile geometry.
        if !target.is_empty() && !self.quick_tile.is_empty() {
            let restore = self.restore_quick_tile.take();
            self.quick_tile = QuickTileMode::empty();
            self.tile_cycle_idx = 0;
            if self.restore_maximize.is_none() {
                self.restore_maximize = restore;
            }
        }

        if !target.is_empty() && self.restore_maximize.is_none() {
            self.restore_maximize = Some(self.target_geometry());
        }

        let base = self.restore_maximize.unwrap_or(self.target_geometry());
        let mut rect = base;
        if target.contains(MaximizeMode::HORIZONTAL) {
            rect.loc.x = area.loc.x;
            rect.size.w = area.size.w;
        }
        if target.contains(MaximizeMode::VERTICAL) {
            rect.loc.y = area.loc.y;
            rect.size.h = area.size.h;
        }
        if target.is_empty() {
            rect = self.restore_maximize.take().unwrap_or(rect);
        }

        self.maximize_mode = target;
        self.set_frame_geometry(rect)
    }

    // =========================================================================
    // Fullscreen
    // =========================================================================

    pub fn fullscreen_mode(&self) -> FullScreenMode {
        self.fullscreen_mode
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen_mode != FullScreenMode::None
    }

    /// Whether the normal fullscreen toggle applies to this window.
    ///
    /// Legacy fullscreen is inferred, not requested, and is deliberately not
    /// togglable through this API.
    pub fn is_fullscreenable(&self) -> bool {
        match self.fullscreen_mode {
            FullScreenMode::Legacy => false,
            FullScreenMode::Client => true,
            FullScreenMode::None => self.kind.is_resizable() && !self.rules.fixed_size,
        }
    }

    /// Toggles protocol-declared fullscreen.
    ///
    /// Returns `true` when a geometry change committed immediately.
    pub(crate) fn set_fullscreen(&mut self, on: bool, screen: Rectangle<f64, Logical>) -> bool {
        match (self.fullscreen_mode, on) {
            (FullScreenMode::Legacy, _) => {
                debug!(
                    "ignoring fullscreen toggle for legacy fullscreen window {}",
                    self.id
                );
                false
            }
            (FullScreenMode::Client, true) => self.set_frame_geometry(screen),
            (FullScreenMode::Client, false) => {
                self.fullscreen_mode = FullScreenMode::None;
                self.invalidate_layer();
                let rect = self
                    .restore_fullscreen
                    .take()
                    .unwrap_or(self.target_geometry());
                self.set_frame_geometry(rect)
            }
            (FullScreenMode::None, false) => false,
            (FullScreenMode::None, true) => {
                if !self.is_fullscreenable() {
                    return false;
                }
                self.restore_fullscreen = Some(self.target_geometry());
                self.fullscreen_mode = FullScreenMode::Client;
                self.invalidate_layer();
                self.set_frame_geometry(screen)
            }
        }
    }

    /// Re-evaluates the legacy fullscreen heuristic after a client-driven
    /// geometry or border change.
    ///
    /// A borderless normal window covering an entire screen enters
    /// [`FullScreenMode::Legacy`]; it leaves only when that stops holding.
    pub(crate) fn check_legacy_fullscreen(&mut self, screens: &[Screen]) -> bool {
        let covers_screen = screens
            .iter()
            .any(|screen| screen.geometry == self.target_geometry());

        match self.fullscreen_mode {
            FullScreenMode::None
                if !self.is_decorated() && self.kind == WindowKind::Normal && covers_screen =>
            {
                debug!("window {} entered legacy fullscreen", self.id);
                self.fullscreen_mode = FullScreenMode::Legacy;
                self.invalidate_layer();
                true
            }
            FullScreenMode::Legacy if self.is_decorated() || !covers_screen => {
                debug!("window {} left legacy fullscreen", self.id);
                self.fullscreen_mode = FullScreenMode::None;
                self.invalidate_layer();
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // Shade
    // =========================================================================

    pub fn shade(&self) -> Shade {
        self.shade
    }

    pub fn is_shaded(&self) -> bool {
        self.shade != Shade::None
    }

    pub fn is_shadeable(&self) -> bool {
        self.is_decorated() && self.deco_insets.top > 0.
    }

    /// Sets the shade state.
    ///
    /// Returns `true` when a geometry change committed immediately.
    pub(crate) fn set_shade(&mut self, shade: Shade) -> bool {
        if shade != Shade::None && !self.is_shadeable() {
            return false;
        }
        if shade == self.shade {
            return false;
        }

        let mut rect = self.target_geometry();
        match shade {
            Shade::Normal => {
                if self.restore_shade_height.is_none() {
                    self.restore_shade_height = Some(rect.size.h);
                }
                rect.size.h = self.shaded_height();
            }
            Shade::Partial => {
                // Logically shaded, temporarily at full height.
                rect.size.h = self
                    .restore_shade_height
                    .unwrap_or(rect.size.h)
                    .max(rect.size.h);
            }
            Shade::None => {
                rect.size.h = self.restore_shade_height.take().unwrap_or(rect.size.h);
            }
        }

        self.shade = shade;
        self.set_frame_geometry(rect)
    }

    // =========================================================================
    // Quick tile
    // =========================================================================

    pub fn quick_tile_mode(&self) -> QuickTileMode {
        self.quick_tile
    }

    /// Applies a quick-tile request.
    ///
    /// `mode` must not normalize to maximize; the workspace routes that case
    /// to [`Window::set_maximize`]. Requesting the mode the window is already
    /// in steps to the next ratio in [`QUICK_TILE_RATIOS`]. Returns `true`
    /// when a geometry change committed immediately.
    pub(crate) fn set_quick_tile(
        &mut self,
        mode: QuickTileMode,
        area: Rectangle<f64, Logical>,
    ) -> bool {
        debug_assert_ne!(mode.normalized(), QuickTileMode::MAXIMIZE);

        if mode.is_empty() {
            if self.quick_tile.is_empty() {
                return false;
            }
            self.quick_tile = QuickTileMode::empty();
            self.tile_cycle_idx = 0;
            let rect = self
                .restore_quick_tile
                .take()
                .unwrap_or(self.target_geometry());
            return self.set_frame_geometry(rect);
        }

        // A tile supersedes maximize; the maximize restore base carries over.
        if !self.maximize_mode.is_empty() {
            let restore = self.restore_maximize.take();
            self.maximize_mode = MaximizeMode::empty();
            if self.restore_quick_tile.is_none() {
                self.restore_quick_tile = restore;
            }
        }

        if self.quick_tile == mode {
            self.tile_cycle_idx = (self.tile_cycle_idx + 1) % QUICK_TILE_RATIOS.len();
        } else {
            self.tile_cycle_idx = 0;
        }

        if self.quick_tile.is_empty() && self.restore_quick_tile.is_none() {
            self.restore_quick_tile = Some(self.target_geometry());
        }

        self.quick_tile = mode;
        let rect = quick_tile_geometry(mode, area, QUICK_TILE_RATIOS[self.tile_cycle_idx]);
        self.set_frame_geometry(rect)
    }

    /// Applies a confirmed electric-border tile with an explicit restore
    /// base (the pre-drag geometry), bypassing the ratio cycle.
    pub(crate) fn apply_electric_tile(
        &mut self,
        mode: QuickTileMode,
        area: Rectangle<f64, Logical>,
        restore: Rectangle<f64, Logical>,
    ) -> bool {
        debug_assert_ne!(mode.normalized(), QuickTileMode::MAXIMIZE);

        self.maximize_mode = MaximizeMode::empty();
        self.restore_maximize = None;
        self.restore_quick_tile = Some(restore);
        self.quick_tile = mode;
        self.tile_cycle_idx = 0;
        self.set_frame_geometry(quick_tile_geometry(mode, area, QUICK_TILE_RATIOS[0]))
    }

    /// Seeds the maximize restore base, used when an electric-border
    /// maximize is confirmed so un-maximizing recovers the pre-drag
    /// geometry.
    pub(crate) fn set_restore_maximize(&mut self, restore: Rectangle<f64, Logical>) {
        self.restore_maximize = Some(restore);
    }
}

/// Geometry for a quick-tile mode within a work area.
///
/// The ratio applies to the tiled axes; untiled axes span the full area.
/// Never degenerates below one logical pixel.
pub(crate) fn quick_tile_geometry(
    mode: QuickTileMode,
    area: Rectangle<f64, Logical>,
    ratio: f64,
) -> Rectangle<f64, Logical> {
    let mut rect = area;
    let w = f64::max(1., area.size.w * ratio);
    let h = f64::max(1., area.size.h * ratio);

    if mode.contains(QuickTileMode::LEFT) {
        rect.size.w = w;
    } else if mode.contains(QuickTileMode::RIGHT) {
        rect.loc.x = area.loc.x + area.size.w - w;
        rect.size.w = w;
    }

    if mode.contains(QuickTileMode::TOP) {
        rect.size.h = h;
    } else if mode.contains(QuickTileMode::BOTTOM) {
        rect.loc.y = area.loc.y + area.size.h - h;
        rect.size.h = h;
    }

    rect
}

#[cfg(test)]
mod tests {
    use smithay::utils::{Point, Rectangle, Size};

    use super::*;
    use crate::types::{ResolvedRules, SizeHints, WindowId};

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rectangle<f64, Logical> {
        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    fn window() -> Window {
        Window::new(
            WindowId(1),
            WindowKind::Normal,
            rect(10., 20., 300., 200.),
            ResolvedRules::default(),
            SizeHints::default(),
        )
    }

    fn area() -> Rectangle<f64, Logical> {
        rect(0., 0., 1280., 720.)
    }

    #[test]
    fn maximize_round_trips_through_restore() {
        let mut win = window();
        let original = win.frame_geometry();

        assert!(win.set_maximize(true, true, area()));
        assert_eq!(win.frame_geometry(), area());
        assert_eq!(win.maximize_mode(), MaximizeMode::FULL);

        assert!(win.set_maximize(false, false, area()));
        assert_eq!(win.frame_geometry(), original);
        assert!(win.maximize_mode().is_empty());
    }

    #[test]
    fn single_axis_maximize_keeps_other_axis() {
        let mut win = window();

        win.set_maximize(false, true, area());
        let geo = win.frame_geometry();
        assert_eq!(geo.loc.x, 10.);
        assert_eq!(geo.size.w, 300.);
        assert_eq!(geo.loc.y, 0.);
        assert_eq!(geo.size.h, 720.);
    }

    #[test]
    fn tile_then_maximize_then_unmaximize_restores_pre_tile_geometry() {
        let mut win = window();
        let original = win.frame_geometry();

        win.set_quick_tile(QuickTileMode::LEFT, area());
        win.set_maximize(true, true, area());
        assert!(win.quick_tile_mode().is_empty());

        win.set_maximize(false, false, area());
        assert_eq!(win.frame_geometry(), original);
    }

    #[test]
    fn maximize_then_tile_then_untile_restores_pre_maximize_geometry() {
        let mut win = window();
        let original = win.frame_geometry();

        win.set_maximize(true, true, area());
        win.set_quick_tile(QuickTileMode::LEFT, area());
        assert!(win.maximize_mode().is_empty());

        win.set_quick_tile(QuickTileMode::empty(), area());
        assert_eq!(win.frame_geometry(), original);
    }

    #[test]
    fn repeated_tile_requests_cycle_deterministically() {
        let mut win = window();

        let mut seen = Vec::new();
        for _ in 0..QUICK_TILE_RATIOS.len() + 1 {
            win.set_quick_tile(QuickTileMode::LEFT, area());
            let geo = win.frame_geometry();
            assert!(geo.size.w >= 1.);
            assert!(geo.size.h >= 1.);
            seen.push(geo);
        }

        // The cycle wraps around to the first geometry.
        assert_eq!(seen[0], seen[QUICK_TILE_RATIOS.len()]);
        assert_ne!(seen[0], seen[1]);
    }

    #[test]
    fn fullscreen_restores_and_legacy_is_not_togglable() {
        let mut win = window();
        let original = win.frame_geometry();
        let screen = area();

        assert!(win.set_fullscreen(true, screen));
        assert_eq!(win.fullscreen_mode(), FullScreenMode::Client);
        assert!(win.set_fullscreen(false, screen));
        assert_eq!(win.frame_geometry(), original);

        // A borderless window covering the screen becomes legacy fullscreen.
        win.set_no_border(true);
        win.set_frame_geometry(screen);
        let screens = [crate::types::Screen {
            geometry: screen,
            work_area: screen,
        }];
        assert!(win.check_legacy_fullscreen(&screens));
        assert_eq!(win.fullscreen_mode(), FullScreenMode::Legacy);
        assert!(!win.is_fullscreenable());
        assert!(!win.set_fullscreen(false, screen));
        assert_eq!(win.fullscreen_mode(), FullScreenMode::Legacy);

        // Only the client's own change leaves it.
        win.set_frame_geometry(rect(0., 0., 640., 480.));
        assert!(win.check_legacy_fullscreen(&screens));
        assert_eq!(win.fullscreen_mode(), FullScreenMode::None);
    }

    #[test]
    fn shade_shrinks_to_titlebar_and_restores() {
        let mut win = window();
        win.set_deco_insets(crate::types::Insets {
            left: 1.,
            top: 24.,
            right: 1.,
            bottom: 1.,
        });

        assert!(win.set_shade(Shade::Normal));
        assert_eq!(win.frame_geometry().size.h, 24.);
        assert!(!win.is_shown(false));
        assert!(win.is_shown(true));

        assert!(win.set_shade(Shade::None));
        assert_eq!(win.frame_geometry().size.h, 200.);
    }

    #[test]
    fn undecorated_window_is_not_shadeable() {
        let mut win = window();
        win.set_no_border(true);
        assert!(!win.set_shade(Shade::Normal));
        assert_eq!(win.shade(), Shade::None);
    }
}
