//! Activation, focus handoff, and explicit restacking.

use super::{Notification, Workspace};
use crate::focus_chain::FocusChainChange;
use crate::stacking::StackEntry;
use crate::types::{Desktops, WindowId, WindowKind};

impl Workspace {
    /// Activates a window: unminimize, bring its desktop forward, raise it
    /// with its transients, and give it focus.
    pub fn activate(&mut self, id: WindowId) {
        let Some(win) = self.windows.get(&id) else {
            warn!("activate: unknown window {id}");
            return;
        };
        let minimized = win.is_minimized();
        let on_current = win.is_on_desktop(self.current_desktop);
        let first_desktop = match win.desktops() {
            Desktops::On(list) => list.first().copied(),
            Desktops::All => None,
        };
        let accepts = win.accepts_focus();

        self.with_stacking_blocked(|ws| {
            if minimized {
                ws.unminimize(id);
            }
            if ws.showing_desktop {
                ws.set_showing_desktop_impl(false, false);
            }
            if !on_current {
                if let Some(desktop) = first_desktop {
                    ws.set_current_desktop(desktop, false);
                }
            }
            if ws
                .transients
                .tab_group_of(id)
                .is_some_and(|group| group.current() != id)
            {
                ws.transients.set_tab_current(id);
                ws.sync_tab_flags();
                ws.update_visibility();
            }

            ws.raise(id);

            if accepts {
                if let Some(desktops) = ws.windows.get(&id).map(|w| w.desktops().clone()) {
                    ws.focus_chain
                        .update(id, &desktops, FocusChainChange::MakeFirst);
                }
                ws.set_active(Some(id));
            }
        });
    }

    /// An activation request from a client or pager.
    ///
    /// With focus stealing prevention, requests arriving while another
    /// window holds focus only mark the requester as demanding attention.
    pub fn request_focus(&mut self, id: WindowId) {
        if !self.windows.contains_key(&id) {
            warn!("request_focus: unknown window {id}");
            return;
        }
        if self.options.focus_stealing_prevention
            && self.active.is_some()
            && self.active != Some(id)
        {
            debug!("refusing focus steal by window {id}");
            self.set_demands_attention(id, true);
            return;
        }
        self.activate(id);
    }

    /// Raises a window together with its transient subtree, preserving the
    /// subtree's relative order.
    pub fn raise(&mut self, id: WindowId) {
        if !self.windows.contains_key(&id) {
            warn!("raise: unknown window {id}");
            return;
        }
        let entries: Vec<StackEntry> = self
            .transients
            .transient_subtree(id)
            .into_iter()
            .map(StackEntry::Window)
            .collect();
        self.stacking.raise(&entries);
        self.update_stacking();
    }

    pub fn lower(&mut self, id: WindowId) {
        if !self.windows.contains_key(&id) {
            warn!("lower: unknown window {id}");
            return;
        }
        self.stacking.lower(StackEntry::Window(id));
        self.update_stacking();
    }

    // =========================================================================
    // Minimize
    // =========================================================================

    pub fn minimize(&mut self, id: WindowId) {
        let Some(win) = self.windows.get_mut(&id) else {
            warn!("minimize: unknown window {id}");
            return;
        };
        if win.is_minimized() || !win.is_minimizable() {
            return;
        }
        win.set_minimized_flag(true);
        self.focus_chain.remove(id);
        self.update_visibility();
        if self.active == Some(id) {
            self.activate_next();
        }
    }

    pub fn unminimize(&mut self, id: WindowId) {
        let Some(win) = self.windows.get_mut(&id) else {
            warn!("unminimize: unknown window {id}");
            return;
        };
        if !win.is_minimized() {
            return;
        }
        win.set_minimized_flag(false);
        let desktops = win.desktops().clone();
        self.focus_chain
            .update(id, &desktops, FocusChainChange::AddBack);
        self.update_visibility();
    }

    // =========================================================================
    // Focus handoff
    // =========================================================================

    /// Hands focus to the best remaining candidate: the focus chain first
    /// (preferring the departing window's screen when configured), then the
    /// topmost desktop window, then nothing.
    pub(crate) fn activate_next(&mut self) {
        let candidate_ok = |ws: &Self, id: WindowId| {
            ws.windows
                .get(&id)
                .is_some_and(|win| win.accepts_focus() && ws.should_be_shown(win))
        };

        let mut candidate = None;
        if self.options.separate_screen_focus {
            if let Some(screen) = self.active.map(|id| self.screen_for(id)) {
                candidate = self.focus_chain.get_for_activation(self.current_desktop, |id| {
                    candidate_ok(self, id) && self.screen_for(id) == screen
                });
            }
        }

        let candidate = candidate
            .or_else(|| {
                self.focus_chain
                    .get_for_activation(self.current_desktop, |id| candidate_ok(self, id))
            })
            .or_else(|| {
                self.stacking
                    .windows_bottom_to_top()
                    .filter(|id| {
                        self.windows.get(id).is_some_and(|win| {
                            win.kind() == WindowKind::Desktop
                                && win.accepts_focus()
                                && self.should_be_shown(win)
                        })
                    })
                    .last()
            });

        if let Some(id) = candidate {
            if let Some(desktops) = self.windows.get(&id).map(|w| w.desktops().clone()) {
                self.focus_chain
                    .update(id, &desktops, FocusChainChange::MakeFirst);
            }
        }
        self.set_active(candidate);
    }

    /// Sets the active window, clearing its demands-attention mark and
    /// re-evaluating fullscreen layer promotion.
    pub(crate) fn set_active(&mut self, window: Option<WindowId>) {
        if self.active == window {
            return;
        }
        trace!("active window {:?} -> {:?}", self.active, window);
        self.active = window;
        self.invalidate_fullscreen_layers();

        if let Some(id) = window {
            if let Some(win) = self.windows.get_mut(&id) {
                if win.demands_attention() {
                    win.set_demands_attention(false);
                    self.notifications
                        .push(Notification::RepaintRequested { window: id });
                }
            }
        }

        self.notifications.push(Notification::ActiveChanged { window });
        self.update_stacking();
    }

    /// Marks or clears the demands-attention flag; the active window never
    /// demands attention.
    pub fn set_demands_attention(&mut self, id: WindowId, demands: bool) {
        let demands = demands && self.active != Some(id);
        let Some(win) = self.windows.get_mut(&id) else {
            warn!("set_demands_attention: unknown window {id}");
            return;
        };
        if win.demands_attention() != demands {
            win.set_demands_attention(demands);
            self.notifications
                .push(Notification::RepaintRequested { window: id });
        }
    }
}
