//! Frame geometry and the nestable geometry update blocker.
//!
//! While the blocker nesting count is above zero, geometry setters only
//! update the pending rectangle and latch a dirty level. When the count
//! returns to zero, exactly one commit is produced from the final pending
//! rectangle, collapsing N intermediate changes into one observable update.

use smithay::utils::{Logical, Rectangle};

use super::Window;

/// Dirty level latched while geometry updates are blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingUpdate {
    None,
    Normal,
    /// Commit even if the rectangle ended up unchanged.
    Forced,
}

impl Window {
    /// Committed frame rectangle.
    pub fn frame_geometry(&self) -> Rectangle<f64, Logical> {
        self.frame_geometry
    }

    /// The rectangle the window is headed for: pending while blocked,
    /// committed otherwise.
    pub fn target_geometry(&self) -> Rectangle<f64, Logical> {
        if self.geometry_blocks > 0 {
            self.pending_geometry
        } else {
            self.frame_geometry
        }
    }

    pub fn geometry_blocked(&self) -> bool {
        self.geometry_blocks > 0
    }

    /// Enters a geometry blocker scope.
    pub(crate) fn block_geometry_updates(&mut self) {
        if self.geometry_blocks == 0 {
            self.pending_geometry = self.frame_geometry;
            self.pending_update = PendingUpdate::None;
        }
        self.geometry_blocks += 1;
    }

    /// Leaves a geometry blocker scope.
    ///
    /// Returns the coalesced commit once the outermost scope exits and a
    /// change is pending.
    pub(crate) fn unblock_geometry_updates(&mut self) -> Option<Rectangle<f64, Logical>> {
        if self.geometry_blocks == 0 {
            warn!("geometry blocker underflow on window {}", self.id);
            return None;
        }

        self.geometry_blocks -= 1;
        if self.geometry_blocks > 0 {
            return None;
        }

        let pending = self.pending_update;
        self.pending_update = PendingUpdate::None;
        match pending {
            PendingUpdate::None => None,
            PendingUpdate::Normal if self.pending_geometry == self.frame_geometry => None,
            PendingUpdate::Normal | PendingUpdate::Forced => {
                self.frame_geometry = self.pending_geometry;
                Some(self.frame_geometry)
            }
        }
    }

    /// Sets the frame rectangle.
    ///
    /// Returns `true` when the change committed immediately; while blocked,
    /// the change is deferred and `false` is returned.
    pub(crate) fn set_frame_geometry(&mut self, rect: Rectangle<f64, Logical>) -> bool {
        self.set_frame_geometry_impl(rect, false)
    }

    /// Like [`Window::set_frame_geometry`], but commits even when the
    /// rectangle is unchanged.
    pub(crate) fn set_frame_geometry_forced(&mut self, rect: Rectangle<f64, Logical>) -> bool {
        self.set_frame_geometry_impl(rect, true)
    }

    fn set_frame_geometry_impl(&mut self, rect: Rectangle<f64, Logical>, forced: bool) -> bool {
        if self.geometry_blocks > 0 {
            self.pending_geometry = rect;
            self.pending_update = if forced {
                PendingUpdate::Forced
            } else {
                match self.pending_update {
                    PendingUpdate::Forced => PendingUpdate::Forced,
                    _ => PendingUpdate::Normal,
                }
            };
            return false;
        }

        if rect == self.frame_geometry && !forced {
            return false;
        }

        self.frame_geometry = rect;
        true
    }

    /// Moves the frame without resizing it.
    pub(crate) fn move_frame(&mut self, loc: smithay::utils::Point<f64, Logical>) -> bool {
        let mut rect = self.target_geometry();
        rect.loc = loc;
        self.set_frame_geometry(rect)
    }

    /// Frame height when shaded: just the titlebar.
    pub(crate) fn shaded_height(&self) -> f64 {
        f64::max(1., self.deco_insets.top)
    }
}

#[cfg(test)]
mod tests {
    use smithay::utils::{Point, Rectangle, Size};

    use crate::types::{ResolvedRules, SizeHints, WindowId, WindowKind};
    use crate::window::Window;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rectangle<f64, smithay::utils::Logical> {
        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    fn window() -> Window {
        Window::new(
            WindowId(1),
            WindowKind::Normal,
            rect(0., 0., 100., 100.),
            ResolvedRules::default(),
            SizeHints::default(),
        )
    }

    #[test]
    fn unblocked_set_commits_immediately() {
        let mut win = window();
        assert!(win.set_frame_geometry(rect(10., 10., 100., 100.)));
        assert_eq!(win.frame_geometry(), rect(10., 10., 100., 100.));
    }

    #[test]
    fn nested_blocks_coalesce_to_one_commit_with_last_rect() {
        let mut win = window();

        win.block_geometry_updates();
        win.block_geometry_updates();
        win.block_geometry_updates();

        assert!(!win.set_frame_geometry(rect(10., 0., 100., 100.)));
        assert!(!win.set_frame_geometry(rect(20., 0., 100., 100.)));
        assert!(!win.set_frame_geometry(rect(30., 0., 100., 100.)));

        // Committed geometry is untouched while blocked.
        assert_eq!(win.frame_geometry(), rect(0., 0., 100., 100.));
        assert_eq!(win.target_geometry(), rect(30., 0., 100., 100.));

        assert_eq!(win.unblock_geometry_updates(), None);
        assert_eq!(win.unblock_geometry_updates(), None);
        assert_eq!(
            win.unblock_geometry_updates(),
            Some(rect(30., 0., 100., 100.))
        );
        assert_eq!(win.frame_geometry(), rect(30., 0., 100., 100.));
    }

    #[test]
    fn reverting_to_original_rect_commits_nothing() {
        let mut win = window();
        win.block_geometry_updates();
        win.set_frame_geometry(rect(10., 0., 100., 100.));
        win.set_frame_geometry(rect(0., 0., 100., 100.));
        assert_eq!(win.unblock_geometry_updates(), None);
    }

    #[test]
    fn forced_update_commits_even_when_unchanged() {
        let mut win = window();
        win.block_geometry_updates();
        win.set_frame_geometry_forced(rect(0., 0., 100., 100.));
        assert_eq!(
            win.unblock_geometry_updates(),
            Some(rect(0., 0., 100., 100.))
        );
    }

    #[test]
    fn underflow_is_defensively_ignored() {
        let mut win = window();
        assert_eq!(win.unblock_geometry_updates(), None);
    }
}
