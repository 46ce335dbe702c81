//! View State
//!
//! What the display surface keeps between interactions: selection, the
//! cache of revealed values, whose turn it is, the selected mode and the
//! last status. Owned by the caller and passed into every session call.

use std::collections::BTreeMap;

use crate::DISEASE_COUNT;
use crate::game::action::ActionMode;
use crate::game::state::{GameState, Intensities};
use crate::session::status::StatusReport;

/// Revealed intensities of one city. `None` marks a value that could not
/// be decoded.
pub type RevealedLevels = [Option<u8>; DISEASE_COUNT];

/// How much of a city's intensities the viewer may see right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityVisibility {
    /// City is in outbreak; intensities are public.
    Public(Intensities),
    /// Revealed earlier through an authorized reveal.
    Revealed(RevealedLevels),
    /// Needs a reveal.
    Hidden,
}

/// Per-viewer UI state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    selected_city: Option<String>,
    revealed: BTreeMap<String, RevealedLevels>,
    active_player: usize,
    action_mode: ActionMode,
    status: Option<StatusReport>,
}

impl ViewState {
    /// Fresh view: nothing selected, player 0, move mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected city name.
    pub fn selected_city(&self) -> Option<&str> {
        self.selected_city.as_deref()
    }

    /// Select a city. Unchecked; the session validates names.
    pub fn select_city(&mut self, name: impl Into<String>) {
        self.selected_city = Some(name.into());
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected_city = None;
    }

    /// Turn-order index of the active player.
    pub fn active_player(&self) -> usize {
        self.active_player
    }

    /// Hand control to another player.
    pub fn set_active_player(&mut self, index: usize) {
        self.active_player = index;
    }

    /// Selected action mode.
    pub fn action_mode(&self) -> ActionMode {
        self.action_mode
    }

    /// Select an action mode.
    pub fn set_action_mode(&mut self, mode: ActionMode) {
        self.action_mode = mode;
    }

    /// Last status report.
    pub fn status(&self) -> Option<&StatusReport> {
        self.status.as_ref()
    }

    /// Replace the status report.
    pub fn set_status(&mut self, status: StatusReport) {
        self.status = Some(status);
    }

    /// Cached reveal for a city.
    pub fn revealed(&self, name: &str) -> Option<&RevealedLevels> {
        self.revealed.get(name)
    }

    /// Cache a reveal.
    pub fn record_reveal(&mut self, name: impl Into<String>, levels: RevealedLevels) {
        self.revealed.insert(name.into(), levels);
    }

    /// Drop every cached reveal. Called whenever the snapshot is replaced.
    pub fn invalidate_reveals(&mut self) {
        self.revealed.clear();
    }

    /// Start-of-turn reset: first player, move mode.
    pub fn reset_for_new_turn(&mut self) {
        self.active_player = 0;
        self.action_mode = ActionMode::Move;
    }

    /// What the viewer may see of `name` in a live snapshot.
    pub fn visibility(&self, state: &GameState, name: &str) -> Option<CityVisibility> {
        let city = state.city(name)?;
        if let Some(levels) = city.public_levels() {
            return Some(CityVisibility::Public(levels));
        }
        Some(match self.revealed(name) {
            Some(levels) => CityVisibility::Revealed(*levels),
            None => CityVisibility::Hidden,
        })
    }
}
