//! Precomputed length-6 lines ("roads") through the board, used by the
//! static evaluator's terminal term and by RZOP's dead-line pruning.

use crate::board::{BOARD_SIZE, Cell, GameState, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Horizontal,
    Vertical,
    DiagUp,
    DiagDown,
}

const DIRECTION_VECTORS: [(Direction, i32, i32); 4] = [
    (Direction::Horizontal, 1, 0),
    (Direction::Vertical, 0, 1),
    (Direction::DiagUp, 1, 1),
    (Direction::DiagDown, 1, -1),
];

/// Six consecutive cells along one of the four board directions.
#[derive(Debug, Clone, Copy)]
pub struct Road {
    pub direction: Direction,
    pub cells: [Position; 6],
}

/// All roads through the board plus a per-cell reverse index.
pub struct RoadTable {
    roads: Vec<Road>,
    by_cell: Vec<Vec<usize>>,
}

impl RoadTable {
    pub fn new() -> Self {
        let roads = all_roads();
        let mut by_cell = vec![Vec::new(); BOARD_SIZE * BOARD_SIZE];
        for (idx, road) in roads.iter().enumerate() {
            for cell in &road.cells {
                by_cell[cell.y * BOARD_SIZE + cell.x].push(idx);
            }
        }
        RoadTable { roads, by_cell }
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn roads_through(&self, pos: Position) -> impl Iterator<Item = &Road> {
        self.by_cell[pos.y * BOARD_SIZE + pos.x]
            .iter()
            .map(move |&idx| &self.roads[idx])
    }

    pub fn road_count_through(&self, pos: Position) -> usize {
        self.by_cell[pos.y * BOARD_SIZE + pos.x].len()
    }

    /// Indices into `roads()` of every road passing through `pos`.
    pub fn road_indices_through(&self, pos: Position) -> &[usize] {
        &self.by_cell[pos.y * BOARD_SIZE + pos.x]
    }

    /// True iff some road through `pos` already carries at least
    /// `min_same_color` stones of a single color.
    pub fn is_high_value_road_cell(&self, state: &GameState, pos: Position, min_same_color: usize) -> bool {
        self.roads_through(pos).any(|road| {
            let mut black = 0usize;
            let mut white = 0usize;
            for &cell in &road.cells {
                match state.get(cell) {
                    Cell::Black => black += 1,
                    Cell::White => white += 1,
                    Cell::Empty => {}
                }
            }
            black >= min_same_color || white >= min_same_color
        })
    }
}

impl Default for RoadTable {
    fn default() -> Self {
        RoadTable::new()
    }
}

/// Enumerate every length-6 run in all four directions that fits on the board.
pub fn all_roads() -> Vec<Road> {
    let n = BOARD_SIZE as i32;
    let mut roads = Vec::new();

    for y in 0..BOARD_SIZE {
        for x in 0..BOARD_SIZE {
            for &(dir, dx, dy) in &DIRECTION_VECTORS {
                let end_x = x as i32 + dx * 5;
                let end_y = y as i32 + dy * 5;
                if end_x < 0 || end_x >= n || end_y < 0 || end_y >= n {
                    continue;
                }
                let mut cells = [Position::new(0, 0); 6];
                for (i, cell) in cells.iter_mut().enumerate() {
                    *cell = Position::new(
                        (x as i32 + dx * i as i32) as usize,
                        (y as i32 + dy * i as i32) as usize,
                    );
                }
                roads.push(Road { direction: dir, cells });
            }
        }
    }

    roads
}

/// Pack a road's six cells into 12 bits, 2 bits per cell:
/// `00` empty, `01` black, `10` white, most-significant cell first.
pub fn encode_road(state: &GameState, road: &Road) -> u16 {
    let mut code: u16 = 0;
    for cell in &road.cells {
        let bits: u16 = match state.get(*cell) {
            Cell::Empty => 0b00,
            Cell::Black => 0b01,
            Cell::White => 0b10,
        };
        code = (code << 2) | bits;
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Player;

    #[test]
    fn all_roads_covers_every_direction_from_origin() {
        let roads = all_roads();
        let at_origin: Vec<_> = roads
            .iter()
            .filter(|r| r.cells[0] == Position::new(0, 0))
            .collect();
        // Horizontal and vertical fit from (0,0); DiagUp fits; DiagDown does not (y-5 < 0).
        assert_eq!(at_origin.len(), 3);
    }

    #[test]
    fn road_table_indexes_center_cell_many_times() {
        let table = RoadTable::new();
        let center = Position::new(9, 9);
        assert!(table.road_count_through(center) >= 4 * 6 - 4);
    }

    #[test]
    fn encode_road_reflects_board_contents() {
        let table = RoadTable::new();
        let mut state = GameState::create_initial();
        state = state
            .apply(&crate::board::Move::single(Player::Black, Position::new(0, 0)))
            .unwrap();
        let road = table
            .roads_through(Position::new(0, 0))
            .find(|r| r.direction == Direction::Horizontal)
            .unwrap();
        let code = encode_road(&state, road);
        assert_eq!(code >> 10, 0b01);
    }

    #[test]
    fn high_value_cell_needs_enough_same_color_stones_on_some_road() {
        let table = RoadTable::new();
        let mut state = GameState::create_initial();
        state = state.apply(&crate::board::Move::single(Player::Black, Position::new(3, 3))).unwrap();
        state = state
            .apply(&crate::board::Move::pair(Player::White, Position::new(10, 10), Position::new(10, 11)))
            .unwrap();
        state = state
            .apply(&crate::board::Move::pair(Player::Black, Position::new(4, 3), Position::new(5, 3)))
            .unwrap();

        assert!(table.is_high_value_road_cell(&state, Position::new(6, 3), 3));
        assert!(!table.is_high_value_road_cell(&state, Position::new(9, 9), 3));
    }
}
