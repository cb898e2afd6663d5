//! Hex board geometry with odd-q offset coordinates
//!
//! Cells are addressed by column (`x`) and row (`y`). Odd columns sit half a
//! cell lower than even ones, so the vertical span a range covers in a given
//! column depends on whether that column shares the origin column's parity.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Offset hex coordinates (odd-q)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub x: i32,
    pub y: i32,
}

impl Hex {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this hex sits in an offset (odd) column.
    ///
    /// Parity follows the absolute column index, so column -1 is offset.
    pub fn is_offset(&self) -> bool {
        self.x.rem_euclid(2) == 1
    }

    /// Convert to cube coordinates `(q, r, s)` with `q + r + s == 0`
    pub fn to_cube(&self) -> (i32, i32, i32) {
        let q = self.x;
        let r = self.y - (self.x - (self.x & 1)) / 2;
        (q, r, -q - r)
    }

    /// Build an offset hex from cube `q` and `r`
    pub fn from_cube(q: i32, r: i32) -> Self {
        Self::new(q, r + (q - (q & 1)) / 2)
    }

    /// Distance between two hexes in steps
    pub fn distance_to(&self, other: Hex) -> i32 {
        let (q1, r1, s1) = self.to_cube();
        let (q2, r2, s2) = other.to_cube();
        ((q1 - q2).abs() + (r1 - r2).abs() + (s1 - s2).abs()) / 2
    }

    /// The six adjacent hexes, column by column
    pub fn neighbors(&self) -> impl Iterator<Item = Hex> {
        cells_within_range(*self, 1, 1)
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Hex {
    fn from((x, y): (i32, i32)) -> Self {
        Hex::new(x, y)
    }
}

/// Anything that can answer "does this position exist on the board"
pub trait HexSet {
    fn contains_hex(&self, hex: &Hex) -> bool;
}

impl HexSet for FxHashSet<Hex> {
    fn contains_hex(&self, hex: &Hex) -> bool {
        self.contains(hex)
    }
}

impl HexSet for HashSet<Hex> {
    fn contains_hex(&self, hex: &Hex) -> bool {
        self.contains(hex)
    }
}

impl<V> HexSet for FxHashMap<Hex, V> {
    fn contains_hex(&self, hex: &Hex) -> bool {
        self.contains_key(hex)
    }
}

/// Number of cells within `range` steps of a cell, not counting the cell itself.
///
/// `6 * r * (r + 1) / 2`, or 0 for non-positive ranges. Useful for sizing buffers.
pub fn ring_size(range: i32) -> usize {
    if range <= 0 {
        return 0;
    }
    let range = range as usize;
    3 * range * (range + 1)
}

/// Vertical bounds `(top, bottom)` of the filled footprint of `radius` in the
/// column `dx` columns away from `origin`, or `None` when the column is outside it.
///
/// Walking diagonally away from an even column climbs a row on the first step,
/// walking away from an odd column does not; the walk alternates from there.
fn column_span(origin: Hex, dx: i32, radius: i32) -> Option<(i32, i32)> {
    let steps = dx.abs();
    if radius < 0 || steps > radius {
        return None;
    }

    let (floor_half, ceil_half) = (steps / 2, (steps + 1) / 2);
    let (rise, drop) = if origin.is_offset() {
        (floor_half, ceil_half)
    } else {
        (ceil_half, floor_half)
    };

    let straight = radius - steps;
    Some((origin.y - straight - rise, origin.y + straight + drop))
}

/// Every hypothetical position whose distance from `origin` lies in
/// `[min_range, max_range]`, column by column from left to right, top to bottom.
///
/// Positions are not checked against any board. The band is the `max_range`
/// footprint minus the `min_range - 1` footprint. Negative `max_range` or
/// `min_range > max_range` yields nothing; `max_range == 0` yields only `origin`.
pub fn cells_within_range(origin: Hex, min_range: i32, max_range: i32) -> impl Iterator<Item = Hex> {
    let outer = if max_range < 0 || min_range > max_range { -1 } else { max_range };
    let inner = min_range - 1;

    (-outer..=outer).flat_map(move |dx| {
        let x = origin.x + dx;
        let (top, bottom) = column_span(origin, dx, outer).unwrap_or((1, 0));
        let hole = column_span(origin, dx, inner);

        (top..=bottom)
            .filter(move |&y| !matches!(hole, Some((hole_top, hole_bottom)) if hole_top <= y && y <= hole_bottom))
            .map(move |y| Hex::new(x, y))
    })
}

/// [`cells_within_range`] restricted to positions present in `available`, in the same order
pub fn cells_within_range_present_on<'a, S>(
    available: &'a S,
    origin: Hex,
    min_range: i32,
    max_range: i32,
) -> impl Iterator<Item = Hex> + 'a
where
    S: HexSet + ?Sized,
{
    cells_within_range(origin, min_range, max_range).filter(move |hex| available.contains_hex(hex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn collect(origin: Hex, min_range: i32, max_range: i32) -> FxHashSet<Hex> {
        cells_within_range(origin, min_range, max_range).collect()
    }

    /// Ring-by-ring reference: everything in a generous box whose distance is in the band
    fn brute_force(origin: Hex, min_range: i32, max_range: i32) -> FxHashSet<Hex> {
        let pad = max_range.max(0) + 2;
        let mut cells = FxHashSet::default();
        for x in origin.x - pad..=origin.x + pad {
            for y in origin.y - pad..=origin.y + pad {
                let hex = Hex::new(x, y);
                let d = origin.distance_to(hex);
                if d >= min_range && d <= max_range {
                    cells.insert(hex);
                }
            }
        }
        cells
    }

    #[test]
    fn test_ring_size() {
        assert_eq!(ring_size(-3), 0);
        assert_eq!(ring_size(0), 0);
        assert_eq!(ring_size(1), 6);
        assert_eq!(ring_size(2), 18);
        assert_eq!(ring_size(3), 36);
        assert_eq!(ring_size(10), 330);
    }

    #[test]
    fn test_ring_size_large_ranges() {
        assert_eq!(ring_size(30_000), 2_700_090_000);
        assert_eq!(ring_size(i32::MAX), 3 * (i32::MAX as usize) * (i32::MAX as usize + 1));
    }

    #[test]
    fn test_zero_range_is_origin_only() {
        let origin = Hex::new(3, -2);
        let cells: Vec<_> = cells_within_range(origin, 0, 0).collect();
        assert_eq!(cells, vec![origin]);
    }

    #[test]
    fn test_empty_ranges() {
        let origin = Hex::new(0, 0);
        assert_eq!(cells_within_range(origin, 0, -1).count(), 0);
        assert_eq!(cells_within_range(origin, 3, 2).count(), 0);
        assert_eq!(cells_within_range(origin, -5, -2).count(), 0);
    }

    #[test]
    fn test_neighbors_even_column() {
        let neighbors: FxHashSet<_> = Hex::new(2, 2).neighbors().collect();
        let expected: FxHashSet<_> = [(1, 1), (1, 2), (2, 1), (2, 3), (3, 1), (3, 2)]
            .into_iter()
            .map(Hex::from)
            .collect();
        assert_eq!(neighbors, expected);
    }

    #[test]
    fn test_neighbors_odd_column() {
        let neighbors: FxHashSet<_> = Hex::new(3, 2).neighbors().collect();
        let expected: FxHashSet<_> = [(2, 2), (2, 3), (3, 1), (3, 3), (4, 2), (4, 3)]
            .into_iter()
            .map(Hex::from)
            .collect();
        assert_eq!(neighbors, expected);
    }

    #[test]
    fn test_negative_odd_column_is_offset() {
        assert!(Hex::new(-1, 0).is_offset());
        assert!(!Hex::new(-2, 0).is_offset());
        let neighbors: FxHashSet<_> = Hex::new(-1, 0).neighbors().collect();
        assert!(neighbors.contains(&Hex::new(-2, 1)));
        assert!(neighbors.contains(&Hex::new(0, 1)));
        assert!(!neighbors.contains(&Hex::new(0, -1)));
    }

    #[test]
    fn test_band_one_to_two_around_origin() {
        let origin = Hex::new(0, 0);
        let cells = collect(origin, 1, 2);

        assert_eq!(cells.len(), 18);
        assert_eq!(cells.len(), ring_size(2) - ring_size(0));
        assert!(!cells.contains(&origin));
        assert_eq!(cells.iter().filter(|h| origin.distance_to(**h) == 1).count(), 6);
        assert_eq!(cells.iter().filter(|h| origin.distance_to(**h) == 2).count(), 12);
    }

    #[test]
    fn test_footprint_sizes_match_ring_size() {
        let origins = [Hex::new(0, 0), Hex::new(1, 0), Hex::new(-3, 7), Hex::new(20, -4), Hex::new(-8, -8)];
        for origin in origins {
            for range in 0..=9 {
                let count = cells_within_range(origin, 0, range).count();
                assert_eq!(count, ring_size(range) + 1, "origin {} range {}", origin, range);
            }
        }
    }

    #[test]
    fn test_footprint_has_no_duplicates() {
        let origin = Hex::new(5, 5);
        let cells: Vec<_> = cells_within_range(origin, 0, 6).collect();
        let unique: FxHashSet<_> = cells.iter().copied().collect();
        assert_eq!(cells.len(), unique.len());
    }

    #[test]
    fn test_band_matches_ring_by_ring_union() {
        for origin in [Hex::new(0, 0), Hex::new(1, 1), Hex::new(-5, 2), Hex::new(6, -3)] {
            for max_range in 0..=6 {
                for min_range in 0..=max_range {
                    assert_eq!(
                        collect(origin, min_range, max_range),
                        brute_force(origin, min_range, max_range),
                        "origin {} band {}..={}",
                        origin,
                        min_range,
                        max_range
                    );
                }
            }
        }
    }

    #[test]
    fn test_band_partitions_full_footprint() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let origin = Hex::new(rng.gen_range(-30..30), rng.gen_range(-30..30));
            let max_range = rng.gen_range(1..8);
            let min_range = rng.gen_range(1..=max_range);

            let band = collect(origin, min_range, max_range);
            let inner = collect(origin, 0, min_range - 1);
            let full = collect(origin, 0, max_range);

            assert!(band.is_disjoint(&inner));
            let union: FxHashSet<_> = band.union(&inner).copied().collect();
            assert_eq!(union, full);
        }
    }

    #[test]
    fn test_cube_round_trip_and_distance() {
        let a = Hex::new(-3, 4);
        let (q, r, s) = a.to_cube();
        assert_eq!(q + r + s, 0);
        assert_eq!(Hex::from_cube(q, r), a);
        assert_eq!(Hex::new(0, 0).distance_to(Hex::new(0, 3)), 3);
        assert_eq!(Hex::new(0, 0).distance_to(Hex::new(2, 0)), 2);
        assert_eq!(Hex::new(0, 0).distance_to(Hex::new(3, 0)), 3);
    }

    #[test]
    fn test_present_on_preserves_order() {
        let origin = Hex::new(2, 2);
        let available: FxHashSet<Hex> = [Hex::new(1, 1), Hex::new(3, 2), Hex::new(9, 9), Hex::new(2, 3)]
            .into_iter()
            .collect();

        let hypothetical: Vec<_> = cells_within_range(origin, 1, 1)
            .filter(|h| available.contains(h))
            .collect();
        let present: Vec<_> = cells_within_range_present_on(&available, origin, 1, 1).collect();

        assert_eq!(present, hypothetical);
        assert_eq!(present.len(), 3);
        assert!(!present.contains(&Hex::new(9, 9)));
    }
}
