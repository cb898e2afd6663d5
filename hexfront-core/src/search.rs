//! Rule-driven range search over the board
//!
//! A search starts from the distance band around an origin, keeps the cells
//! present on the board, then drops every cell an enabled rule rejects.

use crate::board::Cell;
use crate::hex::{cells_within_range_present_on, Hex};
use crate::nav::NavGraph;
use crate::piece::Faction;
use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Filters narrowing a distance band to legal targets.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CellSearchRules: u8 {
        const EXCLUDE_ORIGIN           = 1 << 0;
        const EXCLUDE_OTHER_FACTION    = 1 << 1;
        const EXCLUDE_SAME_FACTION     = 1 << 2;
        const REQUIRE_TRAVERSABLE_PATH = 1 << 3;

        /// Free cells reachable over the nav graph
        const MOVEMENT = Self::EXCLUDE_ORIGIN.bits()
            | Self::EXCLUDE_OTHER_FACTION.bits()
            | Self::EXCLUDE_SAME_FACTION.bits()
            | Self::REQUIRE_TRAVERSABLE_PATH.bits();
    }
}

/// Read-only view of the board used by range searches
#[derive(Clone, Copy, Debug)]
pub struct BoardView<'a> {
    pub cells: &'a FxHashMap<Hex, Cell>,
    pub nav: &'a NavGraph,
}

impl<'a> BoardView<'a> {
    pub fn new(cells: &'a FxHashMap<Hex, Cell>, nav: &'a NavGraph) -> Self {
        Self { cells, nav }
    }

    /// Faction occupying `position`, if any
    pub fn faction_at(&self, position: Hex) -> Option<&'a Faction> {
        self.cells
            .get(&position)
            .and_then(|cell| cell.occupant.as_ref())
            .map(|occupant| &occupant.faction)
    }
}

/// Result of a range search
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeCells {
    pub origin: Hex,
    /// Cells that passed every rule, in band order
    pub valid: Vec<Hex>,
    /// Every board cell in the distance band, in band order
    pub considered: Vec<Hex>,
}

impl RangeCells {
    pub fn empty(origin: Hex) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    pub fn is_valid(&self, position: Hex) -> bool {
        self.valid.contains(&position)
    }

    /// Considered cells that were rejected
    pub fn invalid(&self) -> impl Iterator<Item = Hex> + '_ {
        self.considered.iter().copied().filter(move |h| !self.valid.contains(h))
    }
}

/// Search the band `[min_range, max_range]` around `origin` on behalf of `faction`
pub fn search(
    view: &BoardView<'_>,
    origin: Hex,
    faction: &Faction,
    min_range: i32,
    max_range: i32,
    rules: CellSearchRules,
) -> RangeCells {
    if max_range <= 0 {
        return RangeCells::empty(origin);
    }

    let considered: Vec<Hex> = cells_within_range_present_on(view.cells, origin, min_range, max_range).collect();

    let reachable: Option<FxHashSet<Hex>> = rules
        .contains(CellSearchRules::REQUIRE_TRAVERSABLE_PATH)
        .then(|| view.nav.reachable_within(origin, max_range));

    let valid = considered
        .iter()
        .copied()
        .filter(|&position| {
            if rules.contains(CellSearchRules::EXCLUDE_ORIGIN) && position == origin {
                return false;
            }
            match view.faction_at(position) {
                Some(other) if other == faction && rules.contains(CellSearchRules::EXCLUDE_SAME_FACTION) => {
                    return false;
                }
                Some(other) if other != faction && rules.contains(CellSearchRules::EXCLUDE_OTHER_FACTION) => {
                    return false;
                }
                _ => {}
            }
            reachable.as_ref().map_or(true, |cells| cells.contains(&position))
        })
        .collect();

    RangeCells {
        origin,
        valid,
        considered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CellId, Occupant};
    use crate::hex::ring_size;
    use crate::piece::PieceId;

    fn board(columns: i32, rows: i32) -> FxHashMap<Hex, Cell> {
        let mut cells = FxHashMap::default();
        for x in 0..columns {
            for y in 0..rows {
                let position = Hex::new(x, y);
                cells.insert(position, Cell::new(CellId((x * rows + y) as u32), position));
            }
        }
        cells
    }

    fn occupy(cells: &mut FxHashMap<Hex, Cell>, position: Hex, raw: u64, faction: &str) {
        if let Some(cell) = cells.get_mut(&position) {
            cell.occupant = Some(Occupant {
                piece: PieceId::from_raw(raw),
                faction: Faction::new(faction),
            });
        }
    }

    #[test]
    fn test_non_positive_range_is_empty() {
        let cells = board(5, 5);
        let nav = NavGraph::build(cells.values());
        let view = BoardView::new(&cells, &nav);

        let result = search(&view, Hex::new(2, 2), &Faction::new("player"), 0, 0, CellSearchRules::empty());
        assert!(result.valid.is_empty());
        assert!(result.considered.is_empty());
    }

    #[test]
    fn test_no_rules_keeps_every_present_cell() {
        let cells = board(10, 10);
        let nav = NavGraph::build(cells.values());
        let view = BoardView::new(&cells, &nav);

        let result = search(&view, Hex::new(5, 5), &Faction::new("player"), 0, 2, CellSearchRules::empty());
        assert_eq!(result.considered.len(), ring_size(2) + 1);
        assert_eq!(result.valid, result.considered);
    }

    #[test]
    fn test_board_edge_trims_considered() {
        let cells = board(10, 10);
        let nav = NavGraph::build(cells.values());
        let view = BoardView::new(&cells, &nav);

        let result = search(&view, Hex::new(0, 0), &Faction::new("player"), 1, 1, CellSearchRules::empty());
        // (0,0) has neighbours (0,1) and (1,0) on a board starting at the origin
        assert_eq!(result.considered, vec![Hex::new(0, 1), Hex::new(1, 0)]);
    }

    #[test]
    fn test_faction_rules() {
        let mut cells = board(6, 6);
        let origin = Hex::new(2, 2);
        occupy(&mut cells, origin, 1, "player");
        occupy(&mut cells, Hex::new(2, 3), 2, "player");
        occupy(&mut cells, Hex::new(2, 1), 3, "enemy");
        let nav = NavGraph::build(cells.values());
        let view = BoardView::new(&cells, &nav);
        let player = Faction::new("player");

        let others = search(&view, origin, &player, 1, 1, CellSearchRules::EXCLUDE_OTHER_FACTION);
        assert!(others.is_valid(Hex::new(2, 3)));
        assert!(!others.is_valid(Hex::new(2, 1)));

        let same = search(&view, origin, &player, 1, 1, CellSearchRules::EXCLUDE_SAME_FACTION);
        assert!(!same.is_valid(Hex::new(2, 3)));
        assert!(same.is_valid(Hex::new(2, 1)));
        assert_eq!(same.invalid().collect::<Vec<_>>(), vec![Hex::new(2, 3)]);
    }

    #[test]
    fn test_exclude_origin() {
        let cells = board(6, 6);
        let nav = NavGraph::build(cells.values());
        let view = BoardView::new(&cells, &nav);
        let origin = Hex::new(3, 3);

        let result = search(&view, origin, &Faction::new("player"), 0, 1, CellSearchRules::EXCLUDE_ORIGIN);
        assert!(result.considered.contains(&origin));
        assert!(!result.is_valid(origin));
        assert_eq!(result.valid.len(), 6);
    }

    #[test]
    fn test_traversable_path_blocks_walled_cells() {
        let mut cells = board(8, 8);
        let origin = Hex::new(0, 0);
        occupy(&mut cells, origin, 1, "player");
        // wall off (0,0): its only neighbours are (0,1) and (1,0)
        occupy(&mut cells, Hex::new(0, 1), 2, "enemy");
        occupy(&mut cells, Hex::new(1, 0), 3, "enemy");
        let nav = NavGraph::build(cells.values());
        let view = BoardView::new(&cells, &nav);

        let result = search(&view, origin, &Faction::new("player"), 0, 3, CellSearchRules::MOVEMENT);
        assert!(result.valid.is_empty());
        assert!(!result.considered.is_empty());

        let unrestricted = search(
            &view,
            origin,
            &Faction::new("player"),
            0,
            3,
            CellSearchRules::MOVEMENT - CellSearchRules::REQUIRE_TRAVERSABLE_PATH,
        );
        assert!(unrestricted.is_valid(Hex::new(1, 1)));
    }
}
