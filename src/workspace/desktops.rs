//! Desktops, activities, and show-desktop mode.

use super::Workspace;
use crate::focus_chain::FocusChainChange;
use crate::types::{Activities, Activity, Desktop, Desktops, WindowId};

impl Workspace {
    // =========================================================================
    // Desktop switching
    // =========================================================================

    pub fn switch_desktop(&mut self, desktop: Desktop) {
        self.set_current_desktop(desktop, true);
    }

    pub(crate) fn set_current_desktop(&mut self, desktop: Desktop, hand_focus: bool) {
        if desktop.0 == 0 || desktop.0 > self.desktop_count {
            warn!("switch to invalid desktop {desktop}");
            return;
        }
        if desktop == self.current_desktop {
            return;
        }
        debug!("switching to desktop {desktop}");
        self.current_desktop = desktop;
        self.update_visibility();

        if hand_focus && !self.active_still_focusable() {
            self.activate_next();
        }
    }

    /// Whether the active window remains a valid focus holder after a
    /// visibility-affecting change.
    fn active_still_focusable(&self) -> bool {
        self.active
            .and_then(|id| self.windows.get(&id))
            .is_some_and(|win| win.accepts_focus() && self.should_be_shown(win))
    }

    pub fn set_desktop_count(&mut self, count: u32) {
        let count = count.max(1);
        if count == self.desktop_count {
            return;
        }
        debug!("desktop count {} -> {count}", self.desktop_count);
        self.desktop_count = count;
        self.focus_chain.set_desktop_count(count);

        // Windows stranded on dropped desktops move to the last one.
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        for id in ids {
            let rehomed = match self.windows.get(&id).map(|w| w.desktops().clone()) {
                Some(Desktops::On(list)) => {
                    let kept: Vec<Desktop> =
                        list.into_iter().filter(|d| d.0 <= count).collect();
                    if kept.is_empty() {
                        Some(Desktops::On(vec![Desktop(count)]))
                    } else {
                        Some(Desktops::On(kept))
                    }
                }
                _ => None,
            };
            if let Some(desktops) = rehomed {
                if let Some(win) = self.windows.get_mut(&id) {
                    win.set_desktops(desktops);
                }
                self.desktops_changed(id);
            }
        }

        if self.current_desktop.0 > count {
            self.set_current_desktop(Desktop(count), true);
        }
    }

    // =========================================================================
    // Desktop membership
    // =========================================================================

    pub fn send_to_desktop(&mut self, id: WindowId, desktop: Desktop) {
        if desktop.0 == 0 || desktop.0 > self.desktop_count {
            warn!("send_to_desktop: invalid desktop {desktop}");
            return;
        }
        let Some(win) = self.windows.get_mut(&id) else {
            warn!("send_to_desktop: unknown window {id}");
            return;
        };
        if win.desktops() == &Desktops::On(vec![desktop]) {
            return;
        }
        win.set_desktops(Desktops::On(vec![desktop]));
        self.desktops_changed(id);
    }

    pub fn set_on_all_desktops(&mut self, id: WindowId, on_all: bool) {
        let desktops = if on_all {
            Desktops::All
        } else {
            Desktops::On(vec![self.current_desktop])
        };
        let Some(win) = self.windows.get_mut(&id) else {
            warn!("set_on_all_desktops: unknown window {id}");
            return;
        };
        if win.desktops() == &desktops {
            return;
        }
        win.set_desktops(desktops);
        self.desktops_changed(id);
    }

    /// Re-homes the focus chain entry and recomputes visibility after a
    /// window's desktop or activity membership changed.
    fn desktops_changed(&mut self, id: WindowId) {
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let desktops = win.desktops().clone();
        if !win.is_minimized() {
            let change = if self.active == Some(id) {
                FocusChainChange::MakeFirst
            } else {
                FocusChainChange::AddBack
            };
            self.focus_chain.update(id, &desktops, change);
        }
        self.update_visibility();
        if self.active == Some(id) && !self.active_still_focusable() {
            self.activate_next();
        }
    }

    // =========================================================================
    // Activities
    // =========================================================================

    pub fn switch_activity(&mut self, activity: Activity) {
        if activity == self.current_activity {
            return;
        }
        debug!("switching to activity {}", activity.0);
        self.current_activity = activity;
        self.update_visibility();
        if !self.active_still_focusable() {
            self.activate_next();
        }
    }

    pub fn send_to_activity(&mut self, id: WindowId, activity: Activity) {
        let Some(win) = self.windows.get_mut(&id) else {
            warn!("send_to_activity: unknown window {id}");
            return;
        };
        win.set_activities(Activities::On(vec![activity]));
        self.desktops_changed(id);
    }

    pub fn set_on_all_activities(&mut self, id: WindowId, on_all: bool) {
        let activities = if on_all {
            Activities::All
        } else {
            Activities::On(vec![self.current_activity.clone()])
        };
        let Some(win) = self.windows.get_mut(&id) else {
            warn!("set_on_all_activities: unknown window {id}");
            return;
        };
        if win.activities() == &activities {
            return;
        }
        win.set_activities(activities);
        self.desktops_changed(id);
    }

    // =========================================================================
    // Show desktop
    // =========================================================================

    /// Enters or leaves show-desktop mode: desktop and dock windows stay
    /// shown, everything else hides.
    pub fn set_showing_desktop(&mut self, showing: bool) {
        self.set_showing_desktop_impl(showing, true);
    }

    pub(crate) fn set_showing_desktop_impl(&mut self, showing: bool, hand_focus: bool) {
        if self.showing_desktop == showing {
            return;
        }
        debug!("showing desktop: {showing}");
        self.showing_desktop = showing;
        self.update_visibility();
        if hand_focus {
            self.activate_next();
        }
    }
}
