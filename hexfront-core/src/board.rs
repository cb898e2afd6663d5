//! The board: cells, pieces, selection state, and the nav graph
//!
//! Input flows in through `touch_cell`, `choose_interaction`, and events
//! published by outside collaborators. Events the board reacts to are queued
//! in a board-owned inbox and handled in order before each board operation
//! returns, or on an explicit [`Board::pump`].

use crate::error::{GameError, GameResult};
use crate::events::{EventBus, EventKind, EventQueue, GameEvent, SubscriptionId};
use crate::hex::Hex;
use crate::interaction::{Ability, HighlightStyle, InteractionArgs, InteractionId};
use crate::nav::NavGraph;
use crate::piece::{Faction, Piece, PieceId};
use crate::scenario::{Scenario, UnitProfile};
use crate::search::BoardView;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Stable cell identity, assigned when the cell is first created
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

/// Non-owning reference from a cell to the piece standing on it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occupant {
    pub piece: PieceId,
    pub faction: Faction,
}

impl Occupant {
    pub fn of(piece: &Piece) -> Self {
        Self {
            piece: piece.id,
            faction: piece.faction.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub id: CellId,
    pub position: Hex,
    pub occupant: Option<Occupant>,
}

impl Cell {
    pub fn new(id: CellId, position: Hex) -> Self {
        Self {
            id,
            position,
            occupant: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn piece(&self) -> Option<PieceId> {
        self.occupant.as_ref().map(|o| o.piece)
    }
}

/// Selection state, derived from the active cell and the pending interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardState {
    Idle,
    CellActive,
    AwaitingTarget,
}

/// Cells to highlight for the pending interaction
#[derive(Clone, Debug, PartialEq)]
pub struct RangeHighlight {
    pub piece: PieceId,
    pub interaction: InteractionId,
    pub style: HighlightStyle,
    pub valid: Vec<Hex>,
    pub considered: Vec<Hex>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardConfig {
    /// Faction whose pieces can be selected
    pub controlling_faction: Faction,
    /// Attribute whose minimum removes a piece
    pub health_key: String,
    /// Unit created when an empty cell is touched with nothing pending
    pub spawn_unit: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            controlling_faction: Faction::new(crate::scenario::PLAYER_FACTION),
            health_key: crate::attributes::keys::HEALTH.to_string(),
            spawn_unit: None,
        }
    }
}

impl From<&Scenario> for BoardConfig {
    fn from(scenario: &Scenario) -> Self {
        Self {
            controlling_faction: scenario.controlling_faction.clone(),
            health_key: scenario.health_key.clone(),
            spawn_unit: scenario.spawn_unit.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    piece: PieceId,
    cell: Hex,
    interaction: InteractionId,
}

/// Events the board consumes
const INBOX_KINDS: [EventKind; 4] = [
    EventKind::PositionChanged,
    EventKind::AttributeCurrentAtMin,
    EventKind::InteractionButtonClicked,
    EventKind::SpawnRequested,
];

#[derive(Debug)]
pub struct Board {
    bus: EventBus,
    config: BoardConfig,
    catalog: FxHashMap<String, UnitProfile>,

    cells: FxHashMap<Hex, Cell>,
    next_cell_id: u32,
    pieces: FxHashMap<PieceId, Piece>,
    piece_order: Vec<PieceId>,

    active_cell: Option<Hex>,
    hovered_cell: Option<Hex>,
    pending: Option<Pending>,
    highlight: Option<RangeHighlight>,

    nav_graph: Rc<NavGraph>,
    inbox: EventQueue,
    subscription: Option<SubscriptionId>,
}

impl Board {
    pub fn new(bus: EventBus, config: BoardConfig) -> Self {
        let inbox = EventQueue::new();
        let subscription = inbox.attach(&bus, &INBOX_KINDS);

        Self {
            bus,
            config,
            catalog: FxHashMap::default(),
            cells: FxHashMap::default(),
            next_cell_id: 0,
            pieces: FxHashMap::default(),
            piece_order: Vec::new(),
            active_cell: None,
            hovered_cell: None,
            pending: None,
            highlight: None,
            nav_graph: Rc::new(NavGraph::default()),
            inbox,
            subscription: Some(subscription),
        }
    }

    /// Build a board with the scenario's cells, catalog, and placements
    pub fn from_scenario(bus: EventBus, scenario: &Scenario) -> GameResult<Self> {
        let mut board = Board::new(bus, BoardConfig::from(scenario));
        for unit in &scenario.units {
            board.register_unit(unit.clone());
        }
        board.set_ground_cells(scenario.layout.positions())?;

        for placement in &scenario.placements {
            let placed = board.create_piece(&placement.unit, placement.faction.clone(), placement.position)?;
            if placed.is_none() {
                tracing::warn!("Placement of {} at {} skipped: cell occupied", placement.unit, placement.position);
            }
        }

        tracing::info!(
            "Board '{}' ready: {} cells, {} pieces",
            scenario.name,
            board.cells.len(),
            board.pieces.len()
        );
        Ok(board)
    }

    pub fn register_unit(&mut self, profile: UnitProfile) {
        self.catalog.insert(profile.name.clone(), profile);
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn state(&self) -> BoardState {
        match (self.active_cell, self.pending) {
            (None, _) => BoardState::Idle,
            (Some(_), None) => BoardState::CellActive,
            (Some(_), Some(_)) => BoardState::AwaitingTarget,
        }
    }

    pub fn cell(&self, position: Hex) -> Option<&Cell> {
        self.cells.get(&position)
    }

    pub fn cells(&self) -> &FxHashMap<Hex, Cell> {
        &self.cells
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(&id)
    }

    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(&id)
    }

    pub fn piece_at(&self, position: Hex) -> Option<&Piece> {
        self.cells
            .get(&position)
            .and_then(Cell::piece)
            .and_then(|id| self.pieces.get(&id))
    }

    /// Live pieces in creation order
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.piece_order.iter().filter_map(|id| self.pieces.get(id))
    }

    pub fn piece_count(&self) -> usize {
        self.piece_order.len()
    }

    pub fn active_cell(&self) -> Option<Hex> {
        self.active_cell
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.active_cell.and_then(|position| self.piece_at(position))
    }

    pub fn pending_interaction(&self) -> Option<InteractionId> {
        self.pending.map(|p| p.interaction)
    }

    pub fn highlight(&self) -> Option<&RangeHighlight> {
        self.highlight.as_ref()
    }

    pub fn hovered_cell(&self) -> Option<Hex> {
        self.hovered_cell
    }

    pub fn nav_graph(&self) -> &Rc<NavGraph> {
        &self.nav_graph
    }

    pub fn view(&self) -> BoardView<'_> {
        BoardView::new(&self.cells, &self.nav_graph)
    }

    // ========================================================================
    // GROUND
    // ========================================================================

    /// Establish the usable cells.
    ///
    /// Cells that already exist keep their id and occupant. Pieces standing on
    /// cells that are no longer usable are disposed.
    pub fn set_ground_cells<I>(&mut self, positions: I) -> GameResult<()>
    where
        I: IntoIterator<Item = Hex>,
    {
        let mut cells = FxHashMap::default();
        for position in positions {
            if cells.contains_key(&position) {
                continue;
            }
            let cell = match self.cells.get(&position) {
                Some(existing) => existing.clone(),
                None => {
                    let id = CellId(self.next_cell_id);
                    self.next_cell_id += 1;
                    Cell::new(id, position)
                }
            };
            cells.insert(position, cell);
        }

        if self.active_cell.is_some_and(|position| !cells.contains_key(&position)) {
            self.deactivate()?;
        }
        if self.hovered_cell.is_some_and(|position| !cells.contains_key(&position)) {
            self.hovered_cell = None;
        }

        let orphans: Vec<PieceId> = self
            .cells
            .values()
            .filter(|cell| !cells.contains_key(&cell.position))
            .filter_map(Cell::piece)
            .collect();
        self.cells = cells;

        for id in orphans {
            self.remove_piece(id)?;
        }

        let mut snapshot: Vec<Cell> = self.cells.values().cloned().collect();
        snapshot.sort_by_key(|cell| cell.id);
        tracing::debug!("Ground cells set: {}", snapshot.len());
        self.bus.publish(&GameEvent::GroundCellsChanged { cells: snapshot })?;

        self.regenerate_nav_graph()?;
        self.pump()
    }

    // ========================================================================
    // PIECES
    // ========================================================================

    /// Create a piece of a catalog unit on `position`.
    ///
    /// Returns `Ok(None)` when the cell is occupied.
    pub fn create_piece(&mut self, unit: &str, faction: Faction, position: Hex) -> GameResult<Option<PieceId>> {
        let created = self.spawn(unit, faction, position)?;
        self.pump()?;
        Ok(created)
    }

    /// Place an already built piece on `position`.
    ///
    /// Returns `Ok(None)` when the cell is occupied.
    pub fn add_piece(&mut self, piece: Piece, position: Hex) -> GameResult<Option<PieceId>> {
        let placed = self.place(piece, position)?;
        self.pump()?;
        Ok(placed)
    }

    /// Remove a piece from the board. Returns false if it was already gone.
    pub fn dispose_piece(&mut self, id: PieceId) -> GameResult<bool> {
        let removed = self.remove_piece(id)?;
        self.pump()?;
        Ok(removed)
    }

    fn spawn(&mut self, unit: &str, faction: Faction, position: Hex) -> GameResult<Option<PieceId>> {
        let cell = self.cells.get(&position).ok_or(GameError::CellNotFound(position))?;
        if cell.is_occupied() {
            return Ok(None);
        }
        let profile = self
            .catalog
            .get(unit)
            .ok_or_else(|| GameError::UnknownUnit(unit.to_string()))?;

        let piece = Piece::from_profile(profile, faction);
        self.place(piece, position)
    }

    fn place(&mut self, mut piece: Piece, position: Hex) -> GameResult<Option<PieceId>> {
        let cell = self.cells.get_mut(&position).ok_or(GameError::CellNotFound(position))?;
        if cell.is_occupied() {
            return Ok(None);
        }

        let id = piece.id;
        cell.occupant = Some(Occupant::of(&piece));
        piece.force_position(position, &BoardView::new(&self.cells, &self.nav_graph));
        self.pieces.insert(id, piece);
        self.piece_order.push(id);

        tracing::debug!("Placed {} at {}", id, position);
        self.bus.publish(&GameEvent::PiecePlaced { piece: id, position })?;

        self.regenerate_nav_graph()?;
        Ok(Some(id))
    }

    fn remove_piece(&mut self, id: PieceId) -> GameResult<bool> {
        let Some(position) = self.pieces.get(&id).map(|piece| piece.position) else {
            return Ok(false);
        };

        if self.active_piece().is_some_and(|piece| piece.id == id)
            || self.pending.is_some_and(|pending| pending.piece == id)
        {
            self.deactivate()?;
        }

        self.bus.publish(&GameEvent::PieceDisposing { piece: id })?;

        self.pieces.remove(&id);
        self.piece_order.retain(|existing| *existing != id);
        if let Some(cell) = position.and_then(|p| self.cells.get_mut(&p)) {
            if cell.piece() == Some(id) {
                cell.occupant = None;
            }
        }

        tracing::debug!("Disposed {}", id);
        self.regenerate_nav_graph()?;
        Ok(true)
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Primary touch on `position`
    pub fn touch_cell(&mut self, position: Hex) -> GameResult<()> {
        self.pump()?;
        let cell = self.cells.get(&position).ok_or(GameError::CellNotFound(position))?;
        let occupant = cell.occupant.clone();

        if self.active_cell == Some(position) {
            self.deactivate()?;
            return self.pump();
        }

        if occupant
            .as_ref()
            .is_some_and(|o| o.faction == self.config.controlling_faction)
        {
            self.activate(position)?;
            return self.pump();
        }

        let Some(pending) = self.pending else {
            self.deactivate()?;
            if occupant.is_none() {
                if let Some(unit) = self.config.spawn_unit.clone() {
                    self.spawn(&unit, self.config.controlling_faction.clone(), position)?;
                }
            }
            return self.pump();
        };

        self.deactivate()?;
        let args = InteractionArgs {
            acting_piece: pending.piece,
            acting_cell: pending.cell,
            target_piece: occupant.map(|o| o.piece),
            target_cell: position,
        };
        let performed = self.perform(pending.interaction, args)?;
        if !performed {
            tracing::debug!("{} by {} had no effect on {}", pending.interaction, pending.piece, position);
        }
        self.pump()
    }

    /// Secondary touch on `position`. Validated, otherwise no effect.
    pub fn secondary_touch(&mut self, position: Hex) -> GameResult<()> {
        if !self.cells.contains_key(&position) {
            return Err(GameError::CellNotFound(position));
        }
        Ok(())
    }

    /// Track the hovered cell. Positions off the board clear the hover.
    pub fn hover_cell(&mut self, position: Hex) -> Option<Hex> {
        self.hovered_cell = self.cells.contains_key(&position).then_some(position);
        self.hovered_cell
    }

    pub fn clear_hover(&mut self) {
        self.hovered_cell = None;
    }

    /// Select `position`, deselecting whatever was active
    pub fn activate_cell(&mut self, position: Hex) -> GameResult<()> {
        if !self.cells.contains_key(&position) {
            return Err(GameError::CellNotFound(position));
        }
        self.activate(position)?;
        self.pump()
    }

    /// Clear the selection and any pending interaction
    pub fn deactivate_cell(&mut self) -> GameResult<()> {
        self.deactivate()?;
        self.pump()
    }

    /// Set the pending interaction of the active piece.
    ///
    /// Ignored when `piece` is not the active piece.
    pub fn choose_interaction(&mut self, piece: PieceId, interaction: InteractionId) -> GameResult<()> {
        self.select_interaction(piece, interaction)?;
        self.pump()
    }

    fn activate(&mut self, position: Hex) -> GameResult<()> {
        self.deactivate()?;
        self.active_cell = Some(position);

        if let Some(piece) = self.piece_at(position).map(|p| p.id) {
            tracing::debug!("Activated {} at {}", piece, position);
            self.bus.publish(&GameEvent::BoardPieceActivated { piece })?;
        }
        Ok(())
    }

    fn deactivate(&mut self) -> GameResult<()> {
        self.pending = None;
        self.highlight = None;

        let Some(position) = self.active_cell.take() else {
            return Ok(());
        };

        if let Some(piece) = self.piece_at(position).map(|p| p.id) {
            tracing::debug!("Deactivated {} at {}", piece, position);
            self.bus.publish(&GameEvent::BoardPieceDeactivated { piece })?;
        }
        Ok(())
    }

    fn select_interaction(&mut self, piece: PieceId, interaction: InteractionId) -> GameResult<()> {
        let Some(cell) = self.active_cell else {
            return Ok(());
        };
        let Some(active) = self.piece_at(cell) else {
            return Ok(());
        };
        if active.id != piece {
            return Ok(());
        }
        if !active.has_interaction(interaction) {
            return Err(GameError::UnknownInteraction { piece, interaction });
        }

        tracing::debug!("{} chose {}", piece, interaction);
        let highlight = highlight_for(active, interaction);
        self.pending = Some(Pending {
            piece,
            cell,
            interaction,
        });
        self.highlight = highlight;
        Ok(())
    }

    // ========================================================================
    // INTERACTIONS
    // ========================================================================

    /// Perform `interaction` of the acting piece against the touched target.
    ///
    /// Returns false, leaving the board unchanged, when the interaction's
    /// preconditions are not met.
    pub fn perform(&mut self, interaction: InteractionId, args: InteractionArgs) -> GameResult<bool> {
        let result = self.perform_inner(interaction, args);
        self.pump()?;
        result
    }

    fn perform_inner(&mut self, interaction: InteractionId, args: InteractionArgs) -> GameResult<bool> {
        let actor_id = args.acting_piece;
        let actor = self.pieces.get_mut(&actor_id).ok_or(GameError::PieceNotFound(actor_id))?;

        let index = match interaction {
            InteractionId::Movement => return actor.attempt_move(args.target_cell, &self.bus),
            InteractionId::Ability(index) => index,
        };
        if matches!(actor.abilities.get(index), Some(Ability::Ranged(_))) {
            return self.perform_ranged(actor_id, index, args.target_piece);
        }

        match actor.abilities.get_mut(index) {
            Some(Ability::FindCover(cover)) => cover.perform(&mut actor.attributes, &self.bus),
            _ => Err(GameError::UnknownInteraction {
                piece: actor_id,
                interaction,
            }),
        }
    }

    fn perform_ranged(&mut self, attacker: PieceId, index: usize, target: Option<PieceId>) -> GameResult<bool> {
        let Some(target) = target else {
            return Ok(false);
        };
        let (Some(actor), Some(victim)) = (self.pieces.get(&attacker), self.pieces.get(&target)) else {
            return Ok(false);
        };
        let Some(ability) = actor.abilities.get(index).and_then(Ability::as_ranged) else {
            return Ok(false);
        };
        if !ability.can_target(&actor.faction, victim) {
            return Ok(false);
        }

        let effect = ability.effect.clone();
        tracing::debug!("{} attacks {} with {}", attacker, target, ability.name);
        self.bus.publish(&GameEvent::AttackAttempted {
            attacker,
            target,
            effect: effect.clone(),
        })?;

        if let Some(victim) = self.pieces.get_mut(&target) {
            effect.apply(&mut victim.attributes, &self.bus)?;
        }
        Ok(true)
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    /// Handle every queued event the board consumes
    pub fn pump(&mut self) -> GameResult<()> {
        while let Some(event) = self.inbox.pop() {
            self.handle(event)?;
        }
        Ok(())
    }

    fn handle(&mut self, event: GameEvent) -> GameResult<()> {
        match event {
            GameEvent::PositionChanged { piece, from, to } => self.on_position_changed(piece, from, to),
            GameEvent::AttributeCurrentAtMin { owner, key, .. } => {
                if key == self.config.health_key {
                    tracing::debug!("{} reached minimum {}", owner, key);
                    self.remove_piece(owner)?;
                }
                Ok(())
            }
            GameEvent::InteractionButtonClicked { piece, interaction } => self.select_interaction(piece, interaction),
            GameEvent::SpawnRequested { unit, faction, position } => {
                self.spawn(&unit, faction, position)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn on_position_changed(&mut self, id: PieceId, from: Hex, to: Hex) -> GameResult<()> {
        let Some(piece) = self.pieces.get(&id) else {
            return Ok(());
        };
        let occupant = Occupant::of(piece);

        if let Some(cell) = self.cells.get_mut(&from) {
            if cell.piece() == Some(id) {
                cell.occupant = None;
            }
        }
        if let Some(cell) = self.cells.get_mut(&to) {
            cell.occupant = Some(occupant);
        }

        self.regenerate_nav_graph()
    }

    /// Rebuild the nav graph from current occupancy and refresh every range cache
    fn regenerate_nav_graph(&mut self) -> GameResult<()> {
        self.nav_graph = Rc::new(NavGraph::build(self.cells.values()));
        tracing::debug!(
            "Nav graph rebuilt: {} points, {} edges",
            self.nav_graph.point_count(),
            self.nav_graph.edge_count()
        );

        self.refresh_ranges();
        self.bus.publish(&GameEvent::NavGraphChanged {
            graph: Rc::clone(&self.nav_graph),
        })
    }

    /// Recompute every piece's cached ranges against the current board
    pub fn refresh_ranges(&mut self) {
        let view = BoardView::new(&self.cells, &self.nav_graph);
        for piece in self.pieces.values_mut() {
            piece.refresh_ranges(&view);
        }

        if let Some(highlight) = &self.highlight {
            let refreshed = self
                .pieces
                .get(&highlight.piece)
                .and_then(|piece| highlight_for(piece, highlight.interaction));
            self.highlight = refreshed;
        }
    }

    // ========================================================================
    // TEARDOWN
    // ========================================================================

    /// Stop consuming events and announce the board is going away
    pub fn dispose(mut self) -> GameResult<()> {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe_all(id);
        }
        self.bus.publish(&GameEvent::BoardDisposing)
    }
}

impl Drop for Board {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe_all(id);
        }
    }
}

fn highlight_for(piece: &Piece, interaction: InteractionId) -> Option<RangeHighlight> {
    piece.range_of(interaction).map(|range| RangeHighlight {
        piece: piece.id,
        interaction,
        style: range.highlight_style(),
        valid: range.valid_cells_in_range().to_vec(),
        considered: range.cells_in_range().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::keys;
    use crate::interaction::HasRange;
    use crate::scenario::{BoardLayout, Placement};

    const PLAYER: &str = "player";
    const ENEMY: &str = "enemy";

    fn scenario(placements: Vec<Placement>) -> Scenario {
        Scenario {
            name: "test".to_string(),
            controlling_faction: Faction::new(PLAYER),
            health_key: keys::HEALTH.to_string(),
            spawn_unit: None,
            layout: BoardLayout::Rect { columns: 8, rows: 8 },
            units: vec![UnitProfile::trooper()],
            placements,
        }
    }

    fn board_with(placements: &[(&str, Hex)]) -> (Board, EventQueue) {
        let bus = EventBus::new();
        let log = EventQueue::new();
        log.attach(&bus, &EventKind::ALL);

        let placements = placements
            .iter()
            .map(|&(faction, position)| Placement::new("trooper", faction, position))
            .collect();
        let board = Board::from_scenario(bus, &scenario(placements)).unwrap();
        log.drain();
        (board, log)
    }

    fn id_at(board: &Board, position: Hex) -> PieceId {
        board.piece_at(position).map(|p| p.id).unwrap()
    }

    fn kinds(log: &EventQueue) -> Vec<EventKind> {
        log.drain().iter().map(GameEvent::kind).collect()
    }

    #[test]
    fn test_from_scenario_places_pieces() {
        let (board, _) = board_with(&[(PLAYER, Hex::new(1, 1)), (ENEMY, Hex::new(1, 2))]);

        assert_eq!(board.cells().len(), 64);
        assert_eq!(board.piece_count(), 2);
        assert_eq!(board.state(), BoardState::Idle);
        assert_eq!(board.nav_graph().point_count(), 64);
        assert!(board.nav_graph().is_occupied(Hex::new(1, 2)));
    }

    #[test]
    fn test_touch_absent_cell_is_not_found() {
        let (mut board, _) = board_with(&[]);
        let result = board.touch_cell(Hex::new(40, 40));
        assert!(matches!(result, Err(GameError::CellNotFound(_))));
        assert!(matches!(board.secondary_touch(Hex::new(-1, 0)), Err(GameError::CellNotFound(_))));
        assert!(board.secondary_touch(Hex::new(0, 0)).is_ok());
    }

    #[test]
    fn test_touch_own_piece_activates_and_toggles() {
        let (mut board, log) = board_with(&[(PLAYER, Hex::new(2, 2))]);

        board.touch_cell(Hex::new(2, 2)).unwrap();
        assert_eq!(board.state(), BoardState::CellActive);
        assert_eq!(kinds(&log), vec![EventKind::BoardPieceActivated]);

        board.touch_cell(Hex::new(2, 2)).unwrap();
        assert_eq!(board.state(), BoardState::Idle);
        assert_eq!(kinds(&log), vec![EventKind::BoardPieceDeactivated]);
    }

    #[test]
    fn test_touch_enemy_without_pending_deactivates() {
        let (mut board, _) = board_with(&[(PLAYER, Hex::new(2, 2)), (ENEMY, Hex::new(5, 5))]);

        board.touch_cell(Hex::new(2, 2)).unwrap();
        board.touch_cell(Hex::new(5, 5)).unwrap();
        assert_eq!(board.state(), BoardState::Idle);
        assert_eq!(board.active_cell(), None);
    }

    #[test]
    fn test_choose_interaction_sets_highlight() {
        let (mut board, _) = board_with(&[(PLAYER, Hex::new(2, 2))]);
        let piece = id_at(&board, Hex::new(2, 2));

        board.touch_cell(Hex::new(2, 2)).unwrap();
        board.choose_interaction(piece, InteractionId::Movement).unwrap();

        assert_eq!(board.state(), BoardState::AwaitingTarget);
        let highlight = board.highlight().unwrap();
        assert_eq!(highlight.style, HighlightStyle::MovementRange);
        assert!(highlight.valid.contains(&Hex::new(2, 5)));
        assert!(!highlight.valid.contains(&Hex::new(2, 2)));
        assert!(highlight.considered.len() >= highlight.valid.len());
    }

    #[test]
    fn test_choose_for_inactive_piece_is_ignored() {
        let (mut board, _) = board_with(&[(PLAYER, Hex::new(2, 2)), (PLAYER, Hex::new(4, 4))]);
        let other = id_at(&board, Hex::new(4, 4));

        board.touch_cell(Hex::new(2, 2)).unwrap();
        board.choose_interaction(other, InteractionId::Movement).unwrap();
        assert_eq!(board.state(), BoardState::CellActive);

        let active = id_at(&board, Hex::new(2, 2));
        let missing = board.choose_interaction(active, InteractionId::Ability(9));
        assert!(matches!(missing, Err(GameError::UnknownInteraction { .. })));
    }

    #[test]
    fn test_move_updates_cells_and_nav_graph() {
        let (mut board, log) = board_with(&[(PLAYER, Hex::new(2, 2))]);
        let piece = id_at(&board, Hex::new(2, 2));

        board.touch_cell(Hex::new(2, 2)).unwrap();
        board.choose_interaction(piece, InteractionId::Movement).unwrap();
        log.drain();
        board.touch_cell(Hex::new(2, 4)).unwrap();

        assert_eq!(board.state(), BoardState::Idle);
        assert_eq!(board.piece(piece).and_then(|p| p.position), Some(Hex::new(2, 4)));
        assert!(!board.cell(Hex::new(2, 2)).unwrap().is_occupied());
        assert_eq!(board.cell(Hex::new(2, 4)).unwrap().piece(), Some(piece));
        assert!(board.nav_graph().is_occupied(Hex::new(2, 4)));
        assert!(!board.nav_graph().is_occupied(Hex::new(2, 2)));

        assert_eq!(
            kinds(&log),
            vec![EventKind::BoardPieceDeactivated, EventKind::PositionChanged, EventKind::NavGraphChanged]
        );

        // caches follow the piece
        let movement = board.piece(piece).and_then(|p| p.movement.as_ref()).unwrap();
        assert_eq!(movement.range().origin, Hex::new(2, 4));
    }

    #[test]
    fn test_move_out_of_range_is_silent_noop() {
        let (mut board, log) = board_with(&[(PLAYER, Hex::new(0, 0))]);
        let piece = id_at(&board, Hex::new(0, 0));

        board.touch_cell(Hex::new(0, 0)).unwrap();
        board.choose_interaction(piece, InteractionId::Movement).unwrap();
        log.drain();
        board.touch_cell(Hex::new(0, 7)).unwrap();

        assert_eq!(board.piece(piece).and_then(|p| p.position), Some(Hex::new(0, 0)));
        assert_eq!(board.state(), BoardState::Idle);
        assert_eq!(kinds(&log), vec![EventKind::BoardPieceDeactivated]);
    }

    #[test]
    fn test_gun_damages_and_kills() {
        let (mut board, log) = board_with(&[(PLAYER, Hex::new(2, 2)), (ENEMY, Hex::new(2, 4))]);
        let shooter = id_at(&board, Hex::new(2, 2));
        let target = id_at(&board, Hex::new(2, 4));

        for _ in 0..2 {
            board.touch_cell(Hex::new(2, 2)).unwrap();
            board.choose_interaction(shooter, InteractionId::Ability(0)).unwrap();
            assert_eq!(board.highlight().map(|h| h.style), Some(HighlightStyle::AttackRange));
            board.touch_cell(Hex::new(2, 4)).unwrap();
        }

        let events = log.drain();
        let attacks = events
            .iter()
            .filter(|e| e.kind() == EventKind::AttackAttempted)
            .count();
        assert_eq!(attacks, 2);
        assert!(events.contains(&GameEvent::PieceDisposing { piece: target }));

        assert!(board.piece(target).is_none());
        assert!(!board.cell(Hex::new(2, 4)).unwrap().is_occupied());
        assert_eq!(board.piece_count(), 1);
        assert!(!board.nav_graph().is_occupied(Hex::new(2, 4)));
    }

    #[test]
    fn test_attack_attempted_precedes_damage() {
        let (mut board, log) = board_with(&[(PLAYER, Hex::new(2, 2)), (ENEMY, Hex::new(2, 3))]);
        let shooter = id_at(&board, Hex::new(2, 2));

        board.touch_cell(Hex::new(2, 2)).unwrap();
        board.choose_interaction(shooter, InteractionId::Ability(0)).unwrap();
        log.drain();
        board.touch_cell(Hex::new(2, 3)).unwrap();

        assert_eq!(
            kinds(&log),
            vec![
                EventKind::BoardPieceDeactivated,
                EventKind::AttackAttempted,
                EventKind::AttributeCurrentChanged
            ]
        );
    }

    #[test]
    fn test_gun_on_empty_cell_does_nothing() {
        let (mut board, _) = board_with(&[(PLAYER, Hex::new(2, 2))]);
        let shooter = id_at(&board, Hex::new(2, 2));

        board.touch_cell(Hex::new(2, 2)).unwrap();
        board.choose_interaction(shooter, InteractionId::Ability(0)).unwrap();
        board.touch_cell(Hex::new(2, 3)).unwrap();

        assert_eq!(board.state(), BoardState::Idle);
        assert_eq!(board.piece_count(), 1);
    }

    #[test]
    fn test_find_cover_through_touch() {
        let (mut board, _) = board_with(&[(PLAYER, Hex::new(2, 2))]);
        let piece = id_at(&board, Hex::new(2, 2));

        board.touch_cell(Hex::new(2, 2)).unwrap();
        board.choose_interaction(piece, InteractionId::Ability(1)).unwrap();
        assert!(board.highlight().is_none());
        board.touch_cell(Hex::new(6, 6)).unwrap();

        assert_eq!(board.piece(piece).and_then(|p| p.attributes.current(keys::EVASION)), Some(25.0));
    }

    #[test]
    fn test_double_dispose_is_idempotent() {
        let (mut board, log) = board_with(&[(ENEMY, Hex::new(3, 3))]);
        let piece = id_at(&board, Hex::new(3, 3));

        assert!(board.dispose_piece(piece).unwrap());
        assert!(!board.dispose_piece(piece).unwrap());

        let disposing = log
            .drain()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PieceDisposing { .. }))
            .count();
        assert_eq!(disposing, 1);
        assert_eq!(board.piece_count(), 0);
        assert!(!board.cell(Hex::new(3, 3)).unwrap().is_occupied());
    }

    #[test]
    fn test_disposing_active_piece_clears_selection() {
        let (mut board, _) = board_with(&[(PLAYER, Hex::new(3, 3))]);
        let piece = id_at(&board, Hex::new(3, 3));

        board.touch_cell(Hex::new(3, 3)).unwrap();
        board.choose_interaction(piece, InteractionId::Movement).unwrap();
        board.dispose_piece(piece).unwrap();

        assert_eq!(board.state(), BoardState::Idle);
        assert!(board.highlight().is_none());
    }

    #[test]
    fn test_create_piece_on_occupied_cell() {
        let (mut board, _) = board_with(&[(ENEMY, Hex::new(1, 1))]);

        assert_eq!(board.create_piece("trooper", Faction::new(PLAYER), Hex::new(1, 1)).unwrap(), None);
        assert!(matches!(
            board.create_piece("dragon", Faction::new(PLAYER), Hex::new(1, 2)),
            Err(GameError::UnknownUnit(_))
        ));
        assert!(matches!(
            board.create_piece("trooper", Faction::new(PLAYER), Hex::new(99, 0)),
            Err(GameError::CellNotFound(_))
        ));
        assert_eq!(board.piece_count(), 1);
    }

    #[test]
    fn test_touch_empty_cell_spawns_when_configured() {
        let (mut board, log) = board_with(&[]);
        board.touch_cell(Hex::new(4, 4)).unwrap();
        assert_eq!(board.piece_count(), 0);

        board.config.spawn_unit = Some("trooper".to_string());
        board.touch_cell(Hex::new(4, 4)).unwrap();
        let placed = board.piece_at(Hex::new(4, 4)).unwrap();
        assert_eq!(placed.faction, Faction::new(PLAYER));
        assert!(kinds(&log).contains(&EventKind::PiecePlaced));
    }

    #[test]
    fn test_spawn_request_event() {
        let (mut board, _) = board_with(&[]);
        board
            .bus()
            .clone()
            .publish(&GameEvent::SpawnRequested {
                unit: "trooper".to_string(),
                faction: Faction::new(ENEMY),
                position: Hex::new(5, 1),
            })
            .unwrap();
        assert_eq!(board.piece_count(), 0);

        board.pump().unwrap();
        assert_eq!(board.piece_at(Hex::new(5, 1)).map(|p| p.faction.clone()), Some(Faction::new(ENEMY)));
    }

    #[test]
    fn test_interaction_button_event() {
        let (mut board, _) = board_with(&[(PLAYER, Hex::new(2, 2))]);
        let piece = id_at(&board, Hex::new(2, 2));

        board.touch_cell(Hex::new(2, 2)).unwrap();
        let bus = board.bus().clone();
        bus.publish(&GameEvent::InteractionButtonClicked {
            piece,
            interaction: InteractionId::Movement,
        })
        .unwrap();
        board.pump().unwrap();

        assert_eq!(board.state(), BoardState::AwaitingTarget);
        assert_eq!(board.pending_interaction(), Some(InteractionId::Movement));
    }

    #[test]
    fn test_ground_rebuild_disposes_orphans() {
        let (mut board, log) = board_with(&[(PLAYER, Hex::new(0, 0)), (ENEMY, Hex::new(7, 7))]);
        let keeper = id_at(&board, Hex::new(0, 0));
        let original_id = board.cell(Hex::new(0, 0)).map(|c| c.id);

        let smaller: Vec<Hex> = (0..4).flat_map(|x| (0..4).map(move |y| Hex::new(x, y))).collect();
        board.set_ground_cells(smaller).unwrap();

        assert_eq!(board.cells().len(), 16);
        assert_eq!(board.piece_count(), 1);
        assert_eq!(board.piece_at(Hex::new(0, 0)).map(|p| p.id), Some(keeper));
        assert_eq!(board.cell(Hex::new(0, 0)).map(|c| c.id), original_id);

        let kinds = kinds(&log);
        assert!(kinds.contains(&EventKind::PieceDisposing));
        assert!(kinds.contains(&EventKind::GroundCellsChanged));
        assert_eq!(kinds.last(), Some(&EventKind::NavGraphChanged));
    }

    #[test]
    fn test_ground_rebuild_deactivates_vanished_selection() {
        let (mut board, log) = board_with(&[(PLAYER, Hex::new(7, 0))]);
        let selected = id_at(&board, Hex::new(7, 0));
        board.touch_cell(Hex::new(7, 0)).unwrap();
        board.choose_interaction(selected, InteractionId::Movement).unwrap();
        log.drain();

        let smaller: Vec<Hex> = (0..4).flat_map(|x| (0..8).map(move |y| Hex::new(x, y))).collect();
        board.set_ground_cells(smaller).unwrap();

        assert_eq!(board.state(), BoardState::Idle);
        assert!(board.highlight().is_none());
        assert!(board.piece(selected).is_none());

        let events = log.drain();
        assert_eq!(events.first(), Some(&GameEvent::BoardPieceDeactivated { piece: selected }));
        assert!(events.contains(&GameEvent::PieceDisposing { piece: selected }));
    }

    #[test]
    fn test_hover() {
        let (mut board, _) = board_with(&[]);
        assert_eq!(board.hover_cell(Hex::new(3, 3)), Some(Hex::new(3, 3)));
        assert_eq!(board.hover_cell(Hex::new(30, 3)), None);
        board.hover_cell(Hex::new(1, 1));
        board.clear_hover();
        assert_eq!(board.hovered_cell(), None);
    }

    #[test]
    fn test_dispose_unsubscribes() {
        let (board, log) = board_with(&[]);
        let bus = board.bus().clone();
        assert_eq!(bus.subscriber_count(EventKind::SpawnRequested), 2);

        board.dispose().unwrap();
        assert_eq!(bus.subscriber_count(EventKind::SpawnRequested), 1);
        assert_eq!(kinds(&log), vec![EventKind::BoardDisposing]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        {
            let _board = Board::new(bus.clone(), BoardConfig::default());
            assert_eq!(bus.subscriber_count(EventKind::PositionChanged), 1);
        }
        assert_eq!(bus.subscriber_count(EventKind::PositionChanged), 0);
    }
}
