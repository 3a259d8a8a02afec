//! Player identifiers and per-viewer player snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::game::SelectionPublic;

/// Identity of a connection. Reassigned on reconnect; the stable key for a
/// person inside a lobby is their display name.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-player stat counters carried in every view.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerStats {
    pub cards_played: u32,
    pub cards_burned: u32,
    pub distance_moved: u32,
}

/// What one viewer sees of a player. `hand` and `selection` are only set on
/// the viewer's own entry; everyone else gets counts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub is_bot: bool,
    pub lane: u8,
    pub space: i32,
    pub lap: u32,
    pub hand_count: usize,
    pub draw_count: usize,
    pub discard_count: usize,
    pub tokens: BTreeMap<String, u32>,
    pub burn_slots: Vec<Option<Card>>,
    pub ready: bool,
    pub stats: PlayerStats,
    /// Viewer-only: full hand contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
    /// Viewer-only: the pending selection or bid, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionPublic>,
    /// Viewer-only: accumulated priority modifier for the next resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_modifier: Option<i32>,
    /// Viewer-only: ad-hoc mat properties written by card effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mat: Option<BTreeMap<String, i32>>,
}
