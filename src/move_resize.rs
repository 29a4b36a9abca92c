//! Interactive move and resize.
//!
//! The grab is a small state machine living on the workspace: at most one
//! grab exists at a time, motion events are interpreted against the
//! geometry and pointer position captured at grab start, and release either
//! commits (finalizing an engaged electric tile) or cancels back to the
//! pre-grab geometry.
//!
//! Resize steps run a synchronization handshake with clients that support
//! it: each committed step carries a serial the client acknowledges, and
//! further steps are withheld while an ack is outstanding. Two deadlines
//! guard against unresponsive clients, both evaluated from
//! [`Workspace::tick`]: a per-step timeout that proceeds best-effort, and a
//! fail-safe that disables the handshake for the rest of the grab.

use std::time::Duration;

use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::types::{QuickTileMode, ResizeEdge, SizeHints, WindowId};
use crate::window::quick_tile_geometry;
use crate::workspace::{Notification, Workspace};

/// What an interactive grab does with pointer motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabMode {
    Move,
    Resize(ResizeEdge),
}

/// A provisional electric-border tile, previewed but not applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ElectricPreview {
    mode: QuickTileMode,
    geometry: Rectangle<f64, Logical>,
}

#[derive(Debug)]
struct ResizeSync {
    serial: u64,
    awaiting_ack: bool,
    sent_at: Duration,
    last_ack: Duration,
    /// The fail-safe tripped; no more sync requests this grab.
    failed: bool,
}

/// State of the one interactive grab.
#[derive(Debug)]
pub(crate) struct MoveResize {
    window: WindowId,
    mode: GrabMode,
    start_geometry: Rectangle<f64, Logical>,
    start_pointer: Point<f64, Logical>,
    /// Skip the keep-on-screen clamp.
    unrestricted: bool,
    electric: Option<ElectricPreview>,
    sync: Option<ResizeSync>,
    /// Motion withheld while a sync ack is outstanding; only the latest
    /// matters.
    pending_motion: Option<Point<f64, Logical>>,
}

impl MoveResize {
    pub(crate) fn window(&self) -> WindowId {
        self.window
    }
}

/// Minimum strip of a restricted-moved window kept inside the work area.
const MIN_VISIBLE: f64 = 25.;

/// The resize edges a pointer position on the frame corresponds to, for
/// decoration border hit-testing.
pub fn resize_edges_at(
    frame: Rectangle<f64, Logical>,
    point: Point<f64, Logical>,
    corner: f64,
) -> ResizeEdge {
    let mut edges = ResizeEdge::empty();
    if point.x - frame.loc.x <= corner {
        edges |= ResizeEdge::LEFT;
    } else if frame.loc.x + frame.size.w - point.x <= corner {
        edges |= ResizeEdge::RIGHT;
    }
    if point.y - frame.loc.y <= corner {
        edges |= ResizeEdge::TOP;
    } else if frame.loc.y + frame.size.h - point.y <= corner {
        edges |= ResizeEdge::BOTTOM;
    }
    edges
}

impl Workspace {
    /// Starts an interactive grab on `id`.
    ///
    /// Returns `false` when another grab is active or the window does not
    /// support the requested interaction.
    pub fn begin_move_resize(
        &mut self,
        id: WindowId,
        pointer: Point<f64, Logical>,
        mode: GrabMode,
        unrestricted: bool,
    ) -> bool {
        if self.move_resize.is_some() {
            debug!("refusing grab on {id}: another grab is active");
            return false;
        }
        let Some(win) = self.windows.get(&id) else {
            warn!("begin_move_resize: unknown window {id}");
            return false;
        };
        let allowed = match mode {
            GrabMode::Move => win.is_movable(),
            GrabMode::Resize(edges) => !edges.is_empty() && win.is_resizable(),
        };
        if !allowed {
            debug!("window {id} does not support {mode:?}");
            return false;
        }

        let now = self.clock.now();
        let sync = (matches!(mode, GrabMode::Resize(_)) && win.supports_resize_sync()).then(
            || ResizeSync {
                serial: 0,
                awaiting_ack: false,
                sent_at: now,
                last_ack: now,
                failed: false,
            },
        );

        trace!("starting {mode:?} grab on window {id}");
        self.move_resize = Some(MoveResize {
            window: id,
            mode,
            start_geometry: win.frame_geometry(),
            start_pointer: pointer,
            unrestricted,
            electric: None,
            sync,
            pending_motion: None,
        });
        self.raise(id);
        true
    }

    pub fn interactive_grab(&self) -> Option<(WindowId, GrabMode)> {
        self.move_resize.as_ref().map(|grab| (grab.window, grab.mode))
    }

    /// The provisional electric tile the embedder should preview, if any.
    pub fn electric_preview(&self) -> Option<(QuickTileMode, Rectangle<f64, Logical>)> {
        self.move_resize
            .as_ref()
            .and_then(|grab| grab.electric)
            .map(|preview| (preview.mode, preview.geometry))
    }

    /// Feeds pointer motion into the active grab.
    pub fn move_resize_motion(&mut self, pointer: Point<f64, Logical>) {
        let Some(grab) = &self.move_resize else {
            return;
        };
        match grab.mode {
            GrabMode::Move => self.move_motion(pointer),
            GrabMode::Resize(edges) => self.resize_motion(pointer, edges),
        }
    }

    /// Ends the grab. Cancel restores the pre-grab geometry; commit
    /// finalizes an engaged electric tile or maximize. Either way the
    /// window sees exactly one coalesced geometry commit.
    pub fn finish_move_resize(&mut self, cancel: bool) {
        let Some(grab) = self.move_resize.take() else {
            debug!("finish_move_resize without an active grab");
            return;
        };
        let id = grab.window;
        if !self.windows.contains_key(&id) {
            return;
        }
        trace!("finishing grab on window {id} (cancel: {cancel})");

        let area = self.area_for(id);
        self.with_geometry_blocked(id, |ws| {
            let Some(win) = ws.windows.get_mut(&id) else {
                return;
            };
            if cancel {
                win.set_frame_geometry(grab.start_geometry);
            } else if let Some(preview) = grab.electric {
                if preview.mode == QuickTileMode::MAXIMIZE {
                    win.set_restore_maximize(grab.start_geometry);
                    win.set_maximize(true, true, area);
                } else {
                    win.apply_electric_tile(preview.mode, area, grab.start_geometry);
                }
            }
        });

        if grab.electric.is_some() {
            // Clear the preview overlay.
            self.notifications
                .push(Notification::RepaintRequested { window: id });
        }
    }

    // =========================================================================
    // Move
    // =========================================================================

    fn move_motion(&mut self, pointer: Point<f64, Logical>) {
        let (id, start_geometry, start_pointer, unrestricted, prev_electric) = {
            let Some(grab) = &self.move_resize else {
                return;
            };
            (
                grab.window,
                grab.start_geometry,
                grab.start_pointer,
                grab.unrestricted,
                grab.electric,
            )
        };
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let titlebar = win.insets().top;

        let mut rect = start_geometry;
        rect.loc.x += pointer.x - start_pointer.x;
        rect.loc.y += pointer.y - start_pointer.y;
        rect.loc = self.snap_move(id, rect);
        if !unrestricted {
            rect.loc = self.clamp_restricted(rect, titlebar);
        }

        let electric = self.electric_at(id, pointer);
        if let Some(grab) = &mut self.move_resize {
            grab.electric = electric;
        }
        if electric != prev_electric {
            self.notifications
                .push(Notification::RepaintRequested { window: id });
        }

        let committed = self
            .windows
            .get_mut(&id)
            .is_some_and(|win| win.move_frame(rect.loc));
        if committed {
            if let Some(win) = self.windows.get(&id) {
                self.notifications.push(Notification::GeometryCommitted {
                    window: id,
                    geometry: win.frame_geometry(),
                });
            }
        }
    }

    /// Snaps a moved rectangle to work area borders and to the edges of
    /// other mapped windows.
    fn snap_move(
        &self,
        id: WindowId,
        rect: Rectangle<f64, Logical>,
    ) -> Point<f64, Logical> {
        let mut loc = rect.loc;
        let work = self.work_area_of(rect);

        let border_zone = self.options.border_snap_zone;
        if border_zone > 0. {
            let right = work.loc.x + work.size.w;
            let bottom = work.loc.y + work.size.h;
            if (loc.x - work.loc.x).abs() <= border_zone {
                loc.x = work.loc.x;
            } else if (right - (loc.x + rect.size.w)).abs() <= border_zone {
                loc.x = right - rect.size.w;
            }
            if (loc.y - work.loc.y).abs() <= border_zone {
                loc.y = work.loc.y;
            } else if (bottom - (loc.y + rect.size.h)).abs() <= border_zone {
                loc.y = bottom - rect.size.h;
            }
        }

        let window_zone = self.options.window_snap_zone;
        if window_zone > 0. {
            for other in self.windows.values() {
                if other.id() == id || !other.is_mapped() {
                    continue;
                }
                let og = other.frame_geometry();
                let overlap_v =
                    loc.y < og.loc.y + og.size.h && og.loc.y < loc.y + rect.size.h;
                let overlap_h =
                    loc.x < og.loc.x + og.size.w && og.loc.x < loc.x + rect.size.w;

                if overlap_v {
                    let other_right = og.loc.x + og.size.w;
                    if (loc.x - other_right).abs() <= window_zone {
                        loc.x = other_right;
                    } else if ((loc.x + rect.size.w) - og.loc.x).abs() <= window_zone {
                        loc.x = og.loc.x - rect.size.w;
                    }
                }
                if overlap_h {
                    let other_bottom = og.loc.y + og.size.h;
                    if (loc.y - other_bottom).abs() <= window_zone {
                        loc.y = other_bottom;
                    } else if ((loc.y + rect.size.h) - og.loc.y).abs() <= window_zone {
                        loc.y = og.loc.y - rect.size.h;
                    }
                }
            }
        }

        loc
    }

    /// Keeps a restricted move grabbable: the titlebar may not leave the
    /// work area vertically, and a minimum strip stays visible
    /// horizontally.
    fn clamp_restricted(
        &self,
        rect: Rectangle<f64, Logical>,
        titlebar: f64,
    ) -> Point<f64, Logical> {
        let work = self.work_area_of(rect);
        let titlebar = titlebar.max(10.);
        let mut loc = rect.loc;

        loc.y = loc.y.max(work.loc.y);
        loc.y = loc.y.min(work.loc.y + work.size.h - titlebar);
        loc.x = loc.x.max(work.loc.x + MIN_VISIBLE - rect.size.w);
        loc.x = loc.x.min(work.loc.x + work.size.w - MIN_VISIBLE);
        loc
    }

    fn work_area_of(&self, rect: Rectangle<f64, Logical>) -> Rectangle<f64, Logical> {
        let center = Point::from((
            rect.loc.x + rect.size.w / 2.,
            rect.loc.y + rect.size.h / 2.,
        ));
        self.screen_at(center).work_area
    }

    /// The provisional tile for a pointer position near screen edges: top
    /// edge maximizes, sides tile halves, corners tile quarters.
    fn electric_at(
        &self,
        id: WindowId,
        pointer: Point<f64, Logical>,
    ) -> Option<ElectricPreview> {
        if !self.options.electric_border_maximize && !self.options.electric_border_tiling {
            return None;
        }
        let win = self.windows.get(&id)?;

        let screen = self.screen_at(pointer);
        let g = screen.geometry;
        let range = self.options.electric_border_range;

        let mut mode = QuickTileMode::empty();
        if self.options.electric_border_tiling && win.is_resizable() {
            if pointer.x <= g.loc.x + range {
                mode |= QuickTileMode::LEFT;
            } else if pointer.x >= g.loc.x + g.size.w - range {
                mode |= QuickTileMode::RIGHT;
            }
            if pointer.y >= g.loc.y + g.size.h - range {
                mode |= QuickTileMode::BOTTOM;
            }
        }
        if pointer.y <= g.loc.y + range {
            if mode.is_empty() {
                if self.options.electric_border_maximize && win.is_maximizable() {
                    return Some(ElectricPreview {
                        mode: QuickTileMode::MAXIMIZE,
                        geometry: screen.work_area,
                    });
                }
            } else if self.options.electric_border_tiling {
                mode |= QuickTileMode::TOP;
            }
        }

        if mode.is_empty() {
            None
        } else {
            Some(ElectricPreview {
                mode,
                geometry: quick_tile_geometry(mode, screen.work_area, 0.5),
            })
        }
    }

    // =========================================================================
    // Resize
    // =========================================================================

    fn resize_motion(&mut self, pointer: Point<f64, Logical>, edges: ResizeEdge) {
        let (id, start_geometry, start_pointer, unrestricted) = {
            let Some(grab) = &mut self.move_resize else {
                return;
            };
            if grab.sync.as_ref().is_some_and(|sync| sync.awaiting_ack) {
                grab.pending_motion = Some(pointer);
                return;
            }
            (
                grab.window,
                grab.start_geometry,
                grab.start_pointer,
                grab.unrestricted,
            )
        };
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let hints = *win.size_hints();

        let dx = pointer.x - start_pointer.x;
        let dy = pointer.y - start_pointer.y;

        let mut rect = start_geometry;
        if edges.contains(ResizeEdge::LEFT) {
            rect.loc.x += dx;
            rect.size.w -= dx;
        }
        if edges.contains(ResizeEdge::RIGHT) {
            rect.size.w += dx;
        }
        if edges.contains(ResizeEdge::TOP) {
            rect.loc.y += dy;
            rect.size.h -= dy;
        }
        if edges.contains(ResizeEdge::BOTTOM) {
            rect.size.h += dy;
        }

        rect = self.snap_resize(id, rect, edges);
        if !unrestricted {
            rect = self.clamp_resize_restricted(rect, edges);
        }

        rect.size = constrain_resize(rect.size, &hints, edges);
        // Moved edges stay anchored to the opposite edge after
        // constraining.
        if edges.contains(ResizeEdge::LEFT) {
            rect.loc.x = start_geometry.loc.x + start_geometry.size.w - rect.size.w;
        }
        if edges.contains(ResizeEdge::TOP) {
            rect.loc.y = start_geometry.loc.y + start_geometry.size.h - rect.size.h;
        }

        let committed = self
            .windows
            .get_mut(&id)
            .is_some_and(|win| win.set_frame_geometry(rect));
        if !committed {
            return;
        }
        if let Some(win) = self.windows.get(&id) {
            self.notifications.push(Notification::GeometryCommitted {
                window: id,
                geometry: win.frame_geometry(),
            });
        }

        let now = self.clock.now();
        let mut request = None;
        if let Some(grab) = &mut self.move_resize {
            if let Some(sync) = &mut grab.sync {
                if !sync.failed {
                    sync.serial += 1;
                    sync.awaiting_ack = true;
                    sync.sent_at = now;
                    request = Some(sync.serial);
                }
            }
        }
        if let Some(serial) = request {
            trace!("requesting resize sync {serial} from window {id}");
            self.notifications
                .push(Notification::ResizeSyncRequested { window: id, serial });
        }
    }

    /// Snaps the dragged edges to work area borders and to the facing edges
    /// of other mapped windows.
    fn snap_resize(
        &self,
        id: WindowId,
        rect: Rectangle<f64, Logical>,
        edges: ResizeEdge,
    ) -> Rectangle<f64, Logical> {
        let work = self.work_area_of(rect);
        let mut left = rect.loc.x;
        let mut top = rect.loc.y;
        let mut right = left + rect.size.w;
        let mut bottom = top + rect.size.h;

        let border_zone = self.options.border_snap_zone;
        if border_zone > 0. {
            let work_right = work.loc.x + work.size.w;
            let work_bottom = work.loc.y + work.size.h;
            if edges.contains(ResizeEdge::LEFT) && (left - work.loc.x).abs() <= border_zone {
                left = work.loc.x;
            }
            if edges.contains(ResizeEdge::RIGHT) && (work_right - right).abs() <= border_zone {
                right = work_right;
            }
            if edges.contains(ResizeEdge::TOP) && (top - work.loc.y).abs() <= border_zone {
                top = work.loc.y;
            }
            if edges.contains(ResizeEdge::BOTTOM) && (work_bottom - bottom).abs() <= border_zone {
                bottom = work_bottom;
            }
        }

        let window_zone = self.options.window_snap_zone;
        if window_zone > 0. {
            for other in self.windows.values() {
                if other.id() == id || !other.is_mapped() {
                    continue;
                }
                let og = other.frame_geometry();
                let overlap_v = top < og.loc.y + og.size.h && og.loc.y < bottom;
                let overlap_h = left < og.loc.x + og.size.w && og.loc.x < right;

                if overlap_v {
                    let other_right = og.loc.x + og.size.w;
                    if edges.contains(ResizeEdge::LEFT) && (left - other_right).abs() <= window_zone
                    {
                        left = other_right;
                    }
                    if edges.contains(ResizeEdge::RIGHT) && (right - og.loc.x).abs() <= window_zone
                    {
                        right = og.loc.x;
                    }
                }
                if overlap_h {
                    let other_bottom = og.loc.y + og.size.h;
                    if edges.contains(ResizeEdge::TOP) && (top - other_bottom).abs() <= window_zone
                    {
                        top = other_bottom;
                    }
                    if edges.contains(ResizeEdge::BOTTOM) && (bottom - og.loc.y).abs() <= window_zone
                    {
                        bottom = og.loc.y;
                    }
                }
            }
        }

        Rectangle::new(
            Point::from((left, top)),
            Size::from(((right - left).max(1.), (bottom - top).max(1.))),
        )
    }

    /// Keeps the dragged edges of a restricted resize inside the work area.
    fn clamp_resize_restricted(
        &self,
        rect: Rectangle<f64, Logical>,
        edges: ResizeEdge,
    ) -> Rectangle<f64, Logical> {
        let work = self.work_area_of(rect);
        let mut left = rect.loc.x;
        let mut top = rect.loc.y;
        let mut right = left + rect.size.w;
        let mut bottom = top + rect.size.h;

        if edges.contains(ResizeEdge::LEFT) {
            left = left.max(work.loc.x);
        }
        if edges.contains(ResizeEdge::RIGHT) {
            right = right.min(work.loc.x + work.size.w);
        }
        if edges.contains(ResizeEdge::TOP) {
            top = top.max(work.loc.y);
        }
        if edges.contains(ResizeEdge::BOTTOM) {
            bottom = bottom.min(work.loc.y + work.size.h);
        }

        Rectangle::new(
            Point::from((left, top)),
            Size::from(((right - left).max(1.), (bottom - top).max(1.))),
        )
    }

    /// The client acknowledged a resize sync step.
    pub fn resize_sync_ack(&mut self, serial: u64) {
        let now = self.clock.now();
        let mut flush = None;
        if let Some(grab) = &mut self.move_resize {
            if let Some(sync) = &mut grab.sync {
                if sync.failed {
                    debug!("ignoring resize sync ack {serial}: the fail-safe tripped");
                    return;
                }
                if sync.serial != serial {
                    debug!("stale resize sync ack {serial} (expected {})", sync.serial);
                    return;
                }
                sync.awaiting_ack = false;
                sync.last_ack = now;
                flush = grab.pending_motion.take();
            }
        }
        if let Some(pointer) = flush {
            self.move_resize_motion(pointer);
        }
    }

    /// Evaluates time-based state against the clock; the embedder calls
    /// this from its event loop.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let timeout = self.options.resize_sync_timeout;
        let failsafe = self.options.resize_sync_failsafe;

        let mut flush = None;
        if let Some(grab) = &mut self.move_resize {
            if let Some(sync) = &mut grab.sync {
                if sync.awaiting_ack {
                    if now.saturating_sub(sync.last_ack) >= failsafe {
                        warn!(
                            "window {} stopped acknowledging resize syncs; disabling the handshake",
                            grab.window
                        );
                        sync.failed = true;
                        sync.awaiting_ack = false;
                        flush = grab.pending_motion.take();
                    } else if now.saturating_sub(sync.sent_at) >= timeout {
                        debug!(
                            "resize sync {} timed out on window {}; proceeding",
                            sync.serial, grab.window
                        );
                        sync.awaiting_ack = false;
                        flush = grab.pending_motion.take();
                    }
                }
            }
        }
        if let Some(pointer) = flush {
            self.move_resize_motion(pointer);
        }
    }
}

/// Constrains a resize candidate: increments first, then the aspect ratio
/// clamped on the dragged axis, then min/max bounds.
fn constrain_resize(
    size: Size<f64, Logical>,
    hints: &SizeHints,
    edges: ResizeEdge,
) -> Size<f64, Logical> {
    let mut w = size.w;
    let mut h = size.h;

    let iw = hints.increments.w.max(1.);
    let ih = hints.increments.h.max(1.);
    w = hints.base.w + ((w - hints.base.w) / iw).round() * iw;
    h = hints.base.h + ((h - hints.base.h) / ih).round() * ih;

    if let Some((min_aspect, max_aspect)) = hints.aspect {
        let horizontal = edges.intersects(ResizeEdge::LEFT | ResizeEdge::RIGHT);
        let vertical = edges.intersects(ResizeEdge::TOP | ResizeEdge::BOTTOM);
        if horizontal && !vertical {
            w = w.clamp(h * min_aspect, h * max_aspect);
        } else if vertical && !horizontal {
            h = h.clamp(w / max_aspect, w / min_aspect);
        } else if horizontal && vertical {
            let aspect = (w / h).clamp(min_aspect, max_aspect);
            h = w / aspect;
        }
    }

    w = w.clamp(hints.min.w, hints.max.w);
    h = h.clamp(hints.min.h, hints.max.h);
    Size::from((w, h))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::clock::Clock;
    use crate::types::Screen;
    use crate::workspace::WindowAttributes;
    use crate::Options;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rectangle<f64, Logical> {
        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    fn workspace() -> (Workspace, Clock) {
        let clock = Clock::new();
        let screen = Screen {
            geometry: rect(0., 0., 1280., 720.),
            work_area: rect(0., 0., 1280., 700.),
        };
        let ws = Workspace::new(
            Rc::new(Options::default()),
            clock.clone(),
            vec![screen],
            2,
        );
        (ws, clock)
    }

    fn manage(ws: &mut Workspace, geometry: Rectangle<f64, Logical>) -> WindowId {
        ws.manage(WindowAttributes {
            geometry: Some(geometry),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn move_follows_the_pointer() {
        let (mut ws, _clock) = workspace();
        let id = manage(&mut ws, rect(100., 100., 300., 200.));

        assert!(ws.begin_move_resize(id, Point::from((200., 150.)), GrabMode::Move, false));
        ws.move_resize_motion(Point::from((250., 180.)));
        assert_eq!(ws.window(id).unwrap().frame_geometry(), rect(150., 130., 300., 200.));

        ws.finish_move_resize(false);
        assert!(ws.interactive_grab().is_none());
    }

    #[test]
    fn cancel_restores_the_start_geometry() {
        let (mut ws, _clock) = workspace();
        let id = manage(&mut ws, rect(100., 100., 300., 200.));

        ws.begin_move_resize(id, Point::from((200., 150.)), GrabMode::Move, false);
        ws.move_resize_motion(Point::from((400., 300.)));
        ws.drain_notifications();

        ws.finish_move_resize(true);
        assert_eq!(ws.window(id).unwrap().frame_geometry(), rect(100., 100., 300., 200.));
        // The cancel produced exactly one coalesced commit.
        let commits = ws
            .drain_notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::GeometryCommitted { .. }))
            .count();
        assert_eq!(commits, 1);
    }

    #[test]
    fn moved_window_snaps_to_the_work_area_border() {
        let (mut ws, _clock) = workspace();
        let id = manage(&mut ws, rect(100., 100., 300., 200.));

        ws.begin_move_resize(id, Point::from((200., 150.)), GrabMode::Move, false);
        // 6 px from the left border, inside the 10 px snap zone.
        ws.move_resize_motion(Point::from((106., 150.)));
        assert_eq!(ws.window(id).unwrap().frame_geometry().loc.x, 0.);
    }

    #[test]
    fn restricted_move_keeps_the_titlebar_reachable() {
        let (mut ws, _clock) = workspace();
        let id = manage(&mut ws, rect(100., 100., 300., 200.));

        ws.begin_move_resize(id, Point::from((200., 150.)), GrabMode::Move, false);
        ws.move_resize_motion(Point::from((200., -500.)));
        assert_eq!(ws.window(id).unwrap().frame_geometry().loc.y, 0.);

        ws.move_resize_motion(Point::from((2000., 150.)));
        let geo = ws.window(id).unwrap().frame_geometry();
        assert!(geo.loc.x <= 1280. - MIN_VISIBLE);
    }

    #[test]
    fn unrestricted_move_leaves_the_work_area() {
        let (mut ws, _clock) = workspace();
        let id = manage(&mut ws, rect(100., 100., 300., 200.));

        ws.begin_move_resize(id, Point::from((200., 150.)), GrabMode::Move, true);
        ws.move_resize_motion(Point::from((200., -500.)));
        assert_eq!(ws.window(id).unwrap().frame_geometry().loc.y, -550.);
    }

    #[test]
    fn top_edge_previews_maximize_and_release_commits_it() {
        let (mut ws, _clock) = workspace();
        let id = manage(&mut ws, rect(100., 100., 300., 200.));

        ws.begin_move_resize(id, Point::from((200., 150.)), GrabMode::Move, false);
        ws.move_resize_motion(Point::from((600., 5.)));
        assert_eq!(
            ws.electric_preview().map(|(mode, _)| mode),
            Some(QuickTileMode::MAXIMIZE)
        );

        ws.finish_move_resize(false);
        let win = ws.window(id).unwrap();
        assert_eq!(win.maximize_mode(), crate::types::MaximizeMode::FULL);
        assert_eq!(win.frame_geometry(), rect(0., 0., 1280., 700.));

        // Un-maximizing recovers the pre-grab geometry.
        ws.set_maximize(id, false, false);
        assert_eq!(ws.window(id).unwrap().frame_geometry(), rect(100., 100., 300., 200.));
    }

    #[test]
    fn side_edge_previews_a_half_and_corners_a_quarter() {
        let (mut ws, _clock) = workspace();
        let id = manage(&mut ws, rect(100., 100., 300., 200.));

        ws.begin_move_resize(id, Point::from((200., 150.)), GrabMode::Move, false);
        ws.move_resize_motion(Point::from((5., 350.)));
        assert_eq!(
            ws.electric_preview(),
            Some((QuickTileMode::LEFT, rect(0., 0., 640., 700.)))
        );

        ws.move_resize_motion(Point::from((5., 5.)));
        assert_eq!(
            ws.electric_preview(),
            Some((
                QuickTileMode::LEFT | QuickTileMode::TOP,
                rect(0., 0., 640., 350.)
            ))
        );

        // Leaving the border cancels the preview.
        ws.move_resize_motion(Point::from((600., 350.)));
        assert_eq!(ws.electric_preview(), None);
        ws.finish_move_resize(false);
        assert!(ws.window(id).unwrap().quick_tile_mode().is_empty());
    }

    #[test]
    fn resize_respects_min_size_and_anchors_the_dragged_edge() {
        let (mut ws, _clock) = workspace();
        let id = ws
            .manage(WindowAttributes {
                geometry: Some(rect(100., 100., 300., 200.)),
                size_hints: SizeHints {
                    min: Size::from((100., 80.)),
                    ..Default::default()
                },
                ..Default::default()
            })
            .unwrap();

        ws.begin_move_resize(
            id,
            Point::from((100., 100.)),
            GrabMode::Resize(ResizeEdge::LEFT | ResizeEdge::TOP),
            false,
        );
        // Drag far past the opposite corner.
        ws.move_resize_motion(Point::from((900., 900.)));
        let geo = ws.window(id).unwrap().frame_geometry();
        assert_eq!(geo.size, Size::from((100., 80.)));
        // The bottom-right corner did not move.
        assert_eq!(geo.loc.x + geo.size.w, 400.);
        assert_eq!(geo.loc.y + geo.size.h, 300.);
    }

    #[test]
    fn restricted_resize_stays_inside_the_work_area() {
        let (mut ws, _clock) = workspace();
        let id = manage(&mut ws, rect(100., 100., 300., 200.));

        ws.begin_move_resize(
            id,
            Point::from((250., 100.)),
            GrabMode::Resize(ResizeEdge::TOP),
            false,
        );
        // Drag the top edge far above the work area.
        ws.move_resize_motion(Point::from((250., -400.)));
        let geo = ws.window(id).unwrap().frame_geometry();
        assert_eq!(geo.loc.y, 0.);
        assert_eq!(geo.loc.y + geo.size.h, 300.);
    }

    #[test]
    fn resized_edge_snaps_to_borders_and_other_windows() {
        let (mut ws, _clock) = workspace();
        let id = manage(&mut ws, rect(100., 100., 300., 200.));
        let _other = manage(&mut ws, rect(500., 100., 200., 200.));

        ws.begin_move_resize(
            id,
            Point::from((400., 200.)),
            GrabMode::Resize(ResizeEdge::RIGHT),
            false,
        );
        // 6 px from the other window's left edge, inside the 10 px zone.
        ws.move_resize_motion(Point::from((494., 200.)));
        let geo = ws.window(id).unwrap().frame_geometry();
        assert_eq!(geo.loc.x + geo.size.w, 500.);

        // 4 px from the work area's right border.
        ws.move_resize_motion(Point::from((1276., 200.)));
        let geo = ws.window(id).unwrap().frame_geometry();
        assert_eq!(geo.loc.x + geo.size.w, 1280.);
    }

    #[test]
    fn resize_steps_in_increments() {
        let hints = SizeHints {
            increments: Size::from((17., 29.)),
            base: Size::from((3., 5.)),
            ..Default::default()
        };
        let size = constrain_resize(
            Size::from((300., 200.)),
            &hints,
            ResizeEdge::RIGHT | ResizeEdge::BOTTOM,
        );
        assert_eq!(size.w, 3. + 17. * ((300f64 - 3.) / 17.).round());
        assert_eq!(size.h, 5. + 29. * ((200f64 - 5.) / 29.).round());
    }

    #[test]
    fn aspect_clamps_the_dragged_axis() {
        let hints = SizeHints {
            aspect: Some((1., 2.)),
            ..Default::default()
        };
        // Width dragged far beyond twice the height.
        let size = constrain_resize(Size::from((900., 200.)), &hints, ResizeEdge::RIGHT);
        assert_eq!(size, Size::from((400., 200.)));
        // Height dragged below half the width.
        let size = constrain_resize(Size::from((400., 100.)), &hints, ResizeEdge::BOTTOM);
        assert_eq!(size, Size::from((400., 200.)));
    }

    #[test]
    fn resize_sync_withholds_motion_until_ack() {
        let (mut ws, _clock) = workspace();
        let id = ws
            .manage(WindowAttributes {
                geometry: Some(rect(100., 100., 300., 200.)),
                supports_resize_sync: true,
                ..Default::default()
            })
            .unwrap();
        ws.drain_notifications();

        ws.begin_move_resize(
            id,
            Point::from((400., 300.)),
            GrabMode::Resize(ResizeEdge::RIGHT),
            false,
        );
        ws.move_resize_motion(Point::from((410., 300.)));
        assert_eq!(ws.window(id).unwrap().frame_geometry().size.w, 310.);
        let serials: Vec<u64> = ws
            .drain_notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::ResizeSyncRequested { serial, .. } => Some(serial),
                _ => None,
            })
            .collect();
        assert_eq!(serials, [1]);

        // Withheld while the ack is outstanding; only the latest motion
        // survives.
        ws.move_resize_motion(Point::from((420., 300.)));
        ws.move_resize_motion(Point::from((430., 300.)));
        assert_eq!(ws.window(id).unwrap().frame_geometry().size.w, 310.);

        ws.resize_sync_ack(1);
        assert_eq!(ws.window(id).unwrap().frame_geometry().size.w, 330.);
    }

    #[test]
    fn unresponsive_client_times_out_then_trips_the_failsafe() {
        let (mut ws, clock) = workspace();
        let id = ws
            .manage(WindowAttributes {
                geometry: Some(rect(100., 100., 300., 200.)),
                supports_resize_sync: true,
                ..Default::default()
            })
            .unwrap();

        ws.begin_move_resize(
            id,
            Point::from((400., 300.)),
            GrabMode::Resize(ResizeEdge::RIGHT),
            false,
        );

        // Several steps, never acknowledged: each proceeds after the
        // normal timeout.
        for step in 1..=3u64 {
            ws.move_resize_motion(Point::from((400. + 10. * step as f64, 300.)));
            clock.advance(Duration::from_millis(300));
            ws.tick();
        }
        assert_eq!(ws.window(id).unwrap().frame_geometry().size.w, 330.);

        // Past the fail-safe the handshake is disabled entirely: further
        // motion applies without any new sync request.
        ws.move_resize_motion(Point::from((440., 300.)));
        clock.advance(Duration::from_millis(1000));
        ws.tick();
        ws.drain_notifications();

        ws.move_resize_motion(Point::from((450., 300.)));
        assert_eq!(ws.window(id).unwrap().frame_geometry().size.w, 350.);
        assert!(!ws
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, Notification::ResizeSyncRequested { .. })));

        ws.finish_move_resize(false);
        assert!(ws.interactive_grab().is_none());
        ws.verify_invariants();
    }

    #[test]
    fn late_ack_does_not_revive_a_failed_handshake() {
        let (mut ws, clock) = workspace();
        let id = ws
            .manage(WindowAttributes {
                geometry: Some(rect(100., 100., 300., 200.)),
                supports_resize_sync: true,
                ..Default::default()
            })
            .unwrap();

        ws.begin_move_resize(
            id,
            Point::from((400., 300.)),
            GrabMode::Resize(ResizeEdge::RIGHT),
            false,
        );
        ws.move_resize_motion(Point::from((410., 300.)));
        clock.advance(Duration::from_millis(1000));
        ws.tick();
        ws.drain_notifications();

        // The client wakes up and acknowledges the step it sat on; the
        // handshake stays disabled.
        ws.resize_sync_ack(1);
        ws.move_resize_motion(Point::from((430., 300.)));
        assert_eq!(ws.window(id).unwrap().frame_geometry().size.w, 330.);
        assert!(!ws
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, Notification::ResizeSyncRequested { .. })));
    }
}
