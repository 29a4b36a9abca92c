//! Window lifecycle: admission, placement, release.

use anyhow::{ensure, Result};
use smithay::utils::{Logical, Point, Rectangle, Size};

use super::{rect_is_sane, Deleted, Notification, Workspace};
use crate::group::TransientFor;
use crate::stacking::StackEntry;
use crate::types::{
    Activities, DeletedId, Desktops, ResolvedRules, SizeHints, WindowId, WindowKind,
};
use crate::window::Window;

/// Everything the embedder knows about a window candidate at manage time.
///
/// Rules arrive already resolved; the core applies them but does not own
/// the rule machinery.
#[derive(Debug, Clone)]
pub struct WindowAttributes {
    pub kind: WindowKind,
    /// Geometry the client asked for, if any.
    pub geometry: Option<Rectangle<f64, Logical>>,
    pub rules: ResolvedRules,
    pub size_hints: SizeHints,
    pub transient_for: TransientFor,
    /// Application group key; windows sharing a key share a group.
    pub group_key: Option<String>,
    pub no_border: bool,
    pub supports_resize_sync: bool,
    /// Desktop membership; defaults to the current desktop.
    pub desktops: Option<Desktops>,
    /// Activity membership; defaults to the current activity.
    pub activities: Option<Activities>,
}

impl Default for WindowAttributes {
    fn default() -> Self {
        Self {
            kind: WindowKind::Normal,
            geometry: None,
            rules: ResolvedRules::default(),
            size_hints: SizeHints::default(),
            transient_for: TransientFor::None,
            group_key: None,
            no_border: false,
            supports_resize_sync: false,
            desktops: None,
            activities: None,
        }
    }
}

impl Workspace {
    /// Admits a window into management.
    ///
    /// Validation happens before the candidate touches any shared
    /// collection, so a failed manage leaves the workspace untouched.
    pub fn manage(&mut self, attrs: WindowAttributes) -> Result<WindowId> {
        if let Some(rect) = attrs.geometry {
            ensure!(rect_is_sane(rect), "invalid requested geometry {rect:?}");
        }
        if let Some(rect) = attrs.rules.forced_geometry {
            ensure!(rect_is_sane(rect), "invalid forced geometry {rect:?}");
        }

        self.window_id_counter += 1;
        let id = WindowId(self.window_id_counter);

        let geometry = attrs
            .rules
            .forced_geometry
            .or(attrs.geometry)
            .unwrap_or_else(|| self.place(attrs.size_hints));

        let mut win = Window::new(id, attrs.kind, geometry, attrs.rules, attrs.size_hints);
        win.set_no_border(attrs.no_border);
        win.set_supports_resize_sync(attrs.supports_resize_sync);

        let desktops = match win.rules().forced_desktop {
            Some(desktop) => Desktops::On(vec![desktop]),
            None if matches!(attrs.kind, WindowKind::Desktop | WindowKind::Dock) => Desktops::All,
            None => attrs
                .desktops
                .unwrap_or_else(|| Desktops::On(vec![self.current_desktop])),
        };
        let desktops = self.checked_desktops(id, desktops);
        win.set_desktops(desktops.clone());
        win.set_activities(
            attrs
                .activities
                .unwrap_or_else(|| Activities::On(vec![self.current_activity.clone()])),
        );

        debug!("managing window {id} ({:?}) at {geometry:?}", attrs.kind);
        self.windows.insert(id, win);

        if let Some(key) = &attrs.group_key {
            self.transients.join_group(id, key);
        }
        self.transients
            .set_transient_for(id, self.checked_transient_for(id, attrs.transient_for));

        self.stacking.add(StackEntry::Window(id));
        self.focus_chain
            .update(id, &desktops, crate::focus_chain::FocusChainChange::AddBack);

        self.update_stacking();
        self.update_visibility();

        let restack = {
            let Workspace {
                windows, screens, ..
            } = self;
            windows
                .get_mut(&id)
                .is_some_and(|win| win.check_legacy_fullscreen(screens))
        };
        if restack {
            self.update_stacking();
        }

        Ok(id)
    }

    /// Drops desktop memberships that do not exist; a window left with none
    /// lands on the current desktop.
    fn checked_desktops(&self, id: WindowId, desktops: Desktops) -> Desktops {
        let Desktops::On(mut list) = desktops else {
            return Desktops::All;
        };
        let before = list.len();
        list.retain(|d| d.0 >= 1 && d.0 <= self.desktop_count);
        if list.len() != before {
            warn!("window {id} requested desktops outside 1..={}", self.desktop_count);
        }
        if list.is_empty() {
            list.push(self.current_desktop);
        }
        Desktops::On(list)
    }

    /// Resolves a transient-for reference against the live arena: a dead
    /// target falls back to group transiency when the window has a group,
    /// otherwise to no relation.
    fn checked_transient_for(&self, id: WindowId, target: TransientFor) -> TransientFor {
        match target {
            TransientFor::Window(main) if main != id && !self.windows.contains_key(&main) => {
                warn!("window {id} transient for unknown window {main}");
                match self.transients.group_of(id) {
                    Some(group) => TransientFor::Group(group.id()),
                    None => TransientFor::None,
                }
            }
            TransientFor::Group(group) if self.transients.group(group).is_none() => {
                warn!("window {id} transient for unknown group {group}");
                TransientFor::None
            }
            other => other,
        }
    }

    /// Centered placement with a cascade offset, on the current screen's
    /// work area.
    fn place(&self, hints: SizeHints) -> Rectangle<f64, Logical> {
        let area = self.primary_screen().work_area;

        let w = (area.size.w / 2.).max(hints.min.w).min(area.size.w);
        let h = (area.size.h / 2.).max(hints.min.h).min(area.size.h);

        let cascade = (self.windows.len() % 8) as f64 * 24.;
        let x = area.loc.x + (area.size.w - w) / 2. + cascade;
        let y = area.loc.y + (area.size.h - h) / 2. + cascade;

        // Never place outside the work area.
        let x = x.min(area.loc.x + area.size.w - w).max(area.loc.x);
        let y = y.min(area.loc.y + area.size.h - h).max(area.loc.y);

        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    /// Removes a window from management.
    ///
    /// With `effects_pending`, a placeholder stays in the stacking order so
    /// closing effects render in the right slot until
    /// [`Workspace::deleted_done`].
    pub fn release(&mut self, id: WindowId, effects_pending: bool) {
        if !self.windows.contains_key(&id) {
            warn!("release: unknown window {id}");
            return;
        }

        if self
            .move_resize
            .as_ref()
            .is_some_and(|grab| grab.window() == id)
        {
            debug!("window {id} released during an interactive grab");
            self.move_resize = None;
        }

        // Detach from every collection before the arena slot goes away.
        let layer = self.compute_layer(id);
        let relations = self.transients.remove_window(id);
        self.focus_chain.remove(id);

        // Orphaned transients and a promoted tab member need their
        // decorations redrawn.
        for window in relations
            .orphans
            .iter()
            .copied()
            .chain(relations.new_tab_current)
        {
            self.notifications
                .push(Notification::RepaintRequested { window });
        }

        let Some(mut win) = self.windows.remove(&id) else {
            return;
        };
        let was_mapped = win.is_mapped();
        win.withdraw();

        if effects_pending {
            self.deleted_id_counter += 1;
            let deleted = DeletedId(self.deleted_id_counter);
            self.deleted.insert(deleted, Deleted { layer });
            self.stacking
                .replace(StackEntry::Window(id), StackEntry::Deleted(deleted));
        } else {
            self.stacking.remove(StackEntry::Window(id));
        }

        self.sync_tab_flags();
        self.update_visibility();

        if was_mapped {
            self.notifications.push(Notification::VisibilityChanged {
                window: id,
                visible: false,
            });
        }

        if self.active == Some(id) {
            self.activate_next();
        }
        self.update_stacking();
    }

    /// Drops a deleted placeholder once its closing effects finished.
    pub fn deleted_done(&mut self, id: DeletedId) {
        if self.deleted.remove(&id).is_none() {
            warn!("deleted_done: unknown placeholder {id}");
            return;
        }
        self.stacking.remove(StackEntry::Deleted(id));
        self.update_stacking();
    }
}
