//! Board and turn state.
//!
//! Holds the board topology (fixed once loaded), per-territory ownership,
//! the per-player turn states pushed by the server, the attack currently in
//! progress, and the local reinforcement placement that has not been
//! submitted yet.
//!
//! Ownership and player-state lists are replaced wholesale on every packet.
//! Attack fields are re-derived from each player-state packet and reset as
//! soon as the server stops reporting an attack.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::barrier::{ReadinessBarrier, ReadySource};
use super::packet::{BoardStatePayload, GameboardPayload, PlayerStateUpdate};
use super::session::RosterEntry;
use super::settings::Settings;
use crate::sequence::{decode_list, decode_result_tuple, ResultTuple};

/// `(territory, (army_count, owner_ordinal))` as sent by the server.
pub type ArmyEntry = (usize, (u32, i64));

/// One node of the board as sent by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeData {
    /// SVG path of the territory outline
    pub path: String,
    pub icon_path: Option<String>,
    pub center: Option<[f64; 2]>,

    /// Descriptive data (name, castle, ...)
    pub dto: serde_json::Map<String, serde_json::Value>,
}

impl NodeData {
    pub fn has_castle(&self) -> bool {
        self.dto.get("castle").is_some_and(|c| !c.is_null())
    }
}

/// Board topology as sent in `SEND_GAMEBOARD`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Gameboard {
    pub nodes: Vec<NodeData>,
    pub regions: Vec<Vec<usize>>,
    pub edges: Vec<(usize, usize)>,
    pub water_connections: Vec<(usize, usize)>,
    pub size: [f64; 2],
}

/// Topology projected into per-attribute columns for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardTopology {
    pub node_count: usize,
    pub paths: Vec<String>,
    pub icons: Vec<Option<String>>,
    pub centers: Vec<Option<[f64; 2]>>,
    pub dtos: Vec<serde_json::Map<String, serde_json::Value>>,
    pub regions: Vec<Vec<usize>>,
    pub edges: Vec<(usize, usize)>,
    pub water_connections: Vec<(usize, usize)>,
    pub size: [f64; 2],

    /// Indices of nodes carrying a castle
    pub castles: Vec<usize>,
}

impl BoardTopology {
    pub fn from_gameboard(board: Gameboard) -> Self {
        let castles = board
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.has_castle())
            .map(|(index, _)| index)
            .collect();

        let mut topology = Self {
            node_count: board.nodes.len(),
            regions: board.regions,
            edges: board.edges,
            water_connections: board.water_connections,
            size: board.size,
            castles,
            ..Self::default()
        };
        for node in board.nodes {
            topology.paths.push(node.path);
            topology.icons.push(node.icon_path);
            topology.centers.push(node.center);
            topology.dtos.push(node.dto);
        }
        topology
    }

    pub fn is_loaded(&self) -> bool {
        self.node_count > 0
    }
}

/// Server-reported activity of one player this turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnState {
    /// Phase label, e.g. `Attack` or `Reinforcement`
    pub state: String,

    /// Encoded `List(origin, target, attackers[, defenders])`
    pub attack: Option<String>,

    /// Encoded `Name(List(rolls...), code, code)`
    pub result: Option<String>,

    /// Troops available to place
    pub amount: Option<u32>,
}

/// One entry of `UPDATE_PLAYER_STATE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerStateEntry {
    pub player: Option<RosterEntry>,
    pub turn_state: Option<TurnState>,
    pub armies: u32,
}

impl PlayerStateEntry {
    fn is_complete(&self) -> bool {
        self.player.is_some() && self.turn_state.is_some()
    }
}

/// Attack currently in progress, plus the move being composed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttackState {
    pub attacking_territory: Option<usize>,
    pub defending_territory: Option<usize>,
    pub attackers: Option<u32>,
    pub defenders: Option<u32>,
    pub dice_rolls: Vec<i64>,
    pub attack_results: Vec<i64>,
    pub move_origin: Option<usize>,
    pub move_target: Option<usize>,
}

impl AttackState {
    fn reset_attack(&mut self) {
        self.attacking_territory = None;
        self.defending_territory = None;
        self.attackers = None;
        self.defenders = None;
    }

    fn reset_result(&mut self) {
        self.dice_rolls.clear();
        self.attack_results.clear();
    }

    /// Apply a decoded attack list. Short or out-of-range lists are left
    /// unapplied and return `false`.
    ///
    /// A list without a defender count keeps the stored one only while the
    /// attack is between the same two territories.
    fn apply_attack(&mut self, values: &[i64]) -> bool {
        let Some((origin, target, attackers)) = attack_triple(values) else {
            tracing::debug!(?values, "unusable attack sequence");
            return false;
        };

        let same_attack = self.attacking_territory == Some(origin)
            && self.defending_territory == Some(target);
        self.attacking_territory = Some(origin);
        self.defending_territory = Some(target);
        self.attackers = Some(attackers);
        match values {
            [_, _, _, defenders] => self.defenders = u32::try_from(*defenders).ok(),
            _ if !same_attack => self.defenders = None,
            _ => {}
        }
        true
    }

    fn apply_result(&mut self, result: ResultTuple) {
        self.dice_rolls = result.dice_rolls;
        self.attack_results = result.codes.to_vec();
    }
}

fn attack_triple(values: &[i64]) -> Option<(usize, usize, u32)> {
    match values {
        [origin, target, attackers] | [origin, target, attackers, _] => Some((
            usize::try_from(*origin).ok()?,
            usize::try_from(*target).ok()?,
            u32::try_from(*attackers).ok()?,
        )),
        _ => None,
    }
}

/// Troops placed locally but not yet confirmed by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub total: u32,

    /// Territory index (as string) to troops added there
    pub territories: HashMap<String, u32>,

    pub submitted: bool,
}

impl Placement {
    fn record(&mut self, territory: usize) {
        self.total = self.total.saturating_add(1);
        let placed = self.territories.entry(territory.to_string()).or_insert(0);
        *placed = placed.saturating_add(1);
    }

    pub fn placed_on(&self, territory: usize) -> u32 {
        self.territories
            .get(&territory.to_string())
            .copied()
            .unwrap_or(0)
    }
}

/// Player state projected for the turn sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateView {
    pub name: String,
    pub color: Option<String>,
    pub army_count: u32,
    pub turn_order: usize,
    pub is_current_turn: bool,
    pub turn_state: String,
}

/// Ownership of one territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TerritoryView {
    pub territory: usize,
    pub amount: u32,
    pub owner: i64,
}

#[derive(Debug, Clone, Default)]
pub struct BoardState {
    topology: BoardTopology,
    player_states: Vec<PlayerStateEntry>,
    armies: Vec<ArmyEntry>,

    /// Last turn index reported by the server
    pub turn_index: Option<i64>,

    /// Number of times the turn index has changed
    pub total_turns: u32,

    pub attack: AttackState,
    pub placement: Placement,

    /// Army count of the local player's entry in the last player-state update
    pub local_army_amount: Option<u32>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    // Packet handlers

    /// Replace the topology and report the network half of the barrier.
    pub fn on_board_topology_received(
        &mut self,
        payload: GameboardPayload,
        barrier: &mut ReadinessBarrier,
    ) {
        let Some(board) = payload.gameboard else {
            return;
        };
        self.topology = BoardTopology::from_gameboard(board);
        tracing::info!(
            nodes = self.topology.node_count,
            castles = self.topology.castles.len(),
            "board topology loaded"
        );
        barrier.signal_ready(ReadySource::Network, None);
    }

    /// Apply `UPDATE_PLAYER_STATE`.
    ///
    /// `local_index` is the local player's roster position, used to cache
    /// their army count.
    pub fn on_player_state_received(
        &mut self,
        update: PlayerStateUpdate,
        local_index: Option<usize>,
    ) {
        if let Some(seq) = update.seq {
            self.player_states = seq;
            self.refresh_attack();
            self.local_army_amount = local_index
                .and_then(|i| self.player_states.get(i))
                .map(|entry| entry.armies);
        }

        if let Some(turn) = update.turn {
            if self.turn_index != Some(turn) {
                self.total_turns += 1;
                tracing::debug!(turn, total_turns = self.total_turns, "turn advanced");
            }
            self.turn_index = Some(turn);
        }
    }

    /// Last decodable attack and result across all entries win. Either is
    /// reset when no entry carries a decodable one.
    fn refresh_attack(&mut self) {
        let mut attack_decoded = false;
        let mut result_decoded = false;

        for turn_state in self.player_states.iter().filter_map(|e| e.turn_state.as_ref()) {
            if let Some(encoded) = &turn_state.attack {
                attack_decoded |= self.attack.apply_attack(&decode_list(encoded));
            }
            if let Some(encoded) = &turn_state.result {
                match decode_result_tuple(encoded) {
                    Ok(result) => {
                        self.attack.apply_result(result);
                        result_decoded = true;
                    }
                    Err(err) => {
                        tracing::debug!(%err, encoded = %encoded, "undecodable attack result");
                    }
                }
            }
        }

        if !attack_decoded {
            self.attack.reset_attack();
        }
        if !result_decoded {
            self.attack.reset_result();
        }
    }

    /// Replace the ownership list.
    pub fn on_board_ownership_received(&mut self, payload: BoardStatePayload) {
        if let Some(armies) = payload.armies {
            self.armies = armies;
        }
    }

    // Reinforcement

    /// Add one army to `territory` and record it in the placement.
    ///
    /// The ownership tuple is replaced rather than edited in place. Returns
    /// `false` if the territory has no ownership entry or its count is
    /// already at the maximum.
    pub fn increment_troop(&mut self, territory: usize) -> bool {
        let Some(position) = self.armies.iter().position(|(t, _)| *t == territory) else {
            tracing::warn!(territory, "no ownership entry to reinforce");
            return false;
        };
        let (_, (amount, owner)) = self.armies[position];
        let Some(amount) = amount.checked_add(1) else {
            tracing::warn!(territory, "army count at maximum");
            return false;
        };
        self.armies[position] = (territory, (amount, owner));
        self.placement.record(territory);
        true
    }

    /// Reinforce `territory` if the local player owns it; otherwise do nothing.
    pub fn add_troops_if_owned(&mut self, territory: usize, local_index: Option<usize>) -> bool {
        let owner = self.ownership(territory).map(|(_, owner)| owner);
        let owned = match (owner, local_index) {
            (Some(owner), Some(local)) => usize::try_from(owner).ok() == Some(local),
            _ => false,
        };
        if !owned {
            tracing::debug!(territory, ?owner, ?local_index, "not reinforcing unowned territory");
            return false;
        }
        self.increment_troop(territory)
    }

    pub fn clear_placement(&mut self) {
        self.placement = Placement::default();
    }

    pub fn submit_reinforcements(&mut self) {
        self.placement.submitted = true;
    }

    pub fn unsubmit_reinforcements(&mut self) {
        self.placement.submitted = false;
    }

    // Attack composition

    pub fn reset_attack(&mut self) {
        self.attack.reset_attack();
        self.attack.reset_result();
    }

    pub fn update_attackers(&mut self, attackers: u32) {
        self.attack.attackers = Some(attackers);
    }

    pub fn update_defenders(&mut self, defenders: u32) {
        self.attack.defenders = Some(defenders);
    }

    pub fn set_attack_territory(&mut self, territory: usize) {
        self.attack.attacking_territory = Some(territory);
    }

    pub fn set_defend_territory(&mut self, territory: usize) {
        self.attack.defending_territory = Some(territory);
    }

    pub fn set_move_origin(&mut self, territory: usize) {
        self.attack.move_origin = Some(territory);
    }

    pub fn set_move_target(&mut self, territory: usize) {
        self.attack.move_target = Some(territory);
    }

    // Accessors

    pub fn topology(&self) -> &BoardTopology {
        &self.topology
    }

    pub fn player_state_entries(&self) -> &[PlayerStateEntry] {
        &self.player_states
    }

    pub fn armies(&self) -> &[ArmyEntry] {
        &self.armies
    }

    /// `(army_count, owner)` recorded for a territory. The first entry wins
    /// when a territory is listed twice.
    pub fn ownership(&self, territory: usize) -> Option<(u32, i64)> {
        self.armies
            .iter()
            .find(|(t, _)| *t == territory)
            .map(|(_, ownership)| *ownership)
    }

    // Derived views

    /// Player states in server order. Entries missing their player or turn
    /// state project to `None`.
    pub fn player_states(&self, settings: &Settings) -> Vec<Option<PlayerStateView>> {
        self.player_states
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let player = entry.player.as_ref()?;
                let turn_state = entry.turn_state.as_ref()?;
                Some(PlayerStateView {
                    name: player.name.clone(),
                    color: settings.color_for(player.ordinal),
                    army_count: entry.armies,
                    turn_order: index,
                    is_current_turn: player.ordinal == 0,
                    turn_state: turn_state.state.clone(),
                })
            })
            .collect()
    }

    /// Ownership for every topology territory the server has reported.
    pub fn board_ownership_view(&self) -> Vec<TerritoryView> {
        let mut by_territory: HashMap<usize, (u32, i64)> = HashMap::new();
        for &(territory, ownership) in &self.armies {
            by_territory.entry(territory).or_insert(ownership);
        }
        (0..self.topology.node_count)
            .filter_map(|territory| {
                by_territory
                    .get(&territory)
                    .map(|&(amount, owner)| TerritoryView {
                        territory,
                        amount,
                        owner,
                    })
            })
            .collect()
    }

    /// Territories owned by the given ordinal.
    pub fn owned_territories(&self, ordinal: usize) -> Vec<usize> {
        self.armies
            .iter()
            .filter(|(_, (_, owner))| usize::try_from(*owner).ok() == Some(ordinal))
            .map(|(territory, _)| *territory)
            .collect()
    }

    /// Index of the player state with the most armies; first wins ties.
    pub fn winning_player_index(&self) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (index, entry) in self.player_states.iter().enumerate() {
            if !entry.is_complete() {
                continue;
            }
            match best {
                Some((_, armies)) if entry.armies <= armies => {}
                _ => best = Some((index, entry.armies)),
            }
        }
        best.map(|(index, _)| index)
    }
}
