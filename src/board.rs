//! Board representation, move application, and six-in-a-row detection.

use crate::error::{Connect6Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

pub const BOARD_SIZE: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Black,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Black,
    White,
}

impl Player {
    pub fn opponent(&self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    fn as_cell(&self) -> Cell {
        match self {
            Player::Black => Cell::Black,
            Player::White => Cell::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    Black,
    White,
    Draw,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    pub fn in_bounds(&self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }

    pub fn manhattan(&self, other: Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One ply: one stone at move 0 for Black, two stones otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub player: Player,
    pub positions: Vec<Position>,
}

impl Move {
    pub fn new(player: Player, positions: Vec<Position>) -> Self {
        Move { player, positions }
    }

    pub fn single(player: Player, pos: Position) -> Self {
        Move::new(player, vec![pos])
    }

    pub fn pair(player: Player, a: Position, b: Position) -> Self {
        Move::new(player, vec![a, b])
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.player)?;
        for p in &self.positions {
            write!(f, " {}", p)?;
        }
        Ok(())
    }
}

/// An immutable 19x19 position, the side to move, and the game's outcome if decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    board: Vec<Vec<Cell>>,
    current_player: Player,
    move_number: u32,
    last_move: Option<Move>,
    winner: Option<Winner>,
}

/// Number of stones the side to move must place this ply.
pub fn stones_to_place(move_number: u32) -> usize {
    if move_number == 0 { 1 } else { 2 }
}

const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

impl GameState {
    pub fn create_initial() -> Self {
        GameState {
            board: vec![vec![Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
            current_player: Player::Black,
            move_number: 0,
            last_move: None,
            winner: None,
        }
    }

    pub fn board_size(&self) -> usize {
        BOARD_SIZE
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn get(&self, pos: Position) -> Cell {
        if pos.in_bounds() {
            self.board[pos.y][pos.x]
        } else {
            Cell::Empty
        }
    }

    pub fn stones_to_place(&self) -> usize {
        stones_to_place(self.move_number)
    }

    /// Build a legal move out of the cells a caller cares about (e.g. a
    /// winning or blocking cell), padding with arbitrary empty cells in
    /// row-major order when the turn requires more stones than given.
    pub fn complete_move(&self, player: Player, wanted: &[Position]) -> Move {
        let mut positions: Vec<Position> = wanted.to_vec();
        let needed = self.stones_to_place();
        if positions.len() > needed {
            positions.truncate(needed);
        }
        'fill: while positions.len() < needed {
            for y in 0..BOARD_SIZE {
                for x in 0..BOARD_SIZE {
                    let pos = Position::new(x, y);
                    if self.get(pos) == Cell::Empty && !positions.contains(&pos) {
                        positions.push(pos);
                        continue 'fill;
                    }
                }
            }
            break;
        }
        Move::new(player, positions)
    }

    /// Validate and apply `mv`, returning the successor state.
    pub fn apply(&self, mv: &Move) -> Result<GameState> {
        if self.is_game_over() {
            return Err(Connect6Error::TerminalState);
        }

        if mv.player != self.current_player {
            return Err(Connect6Error::InvalidMove(format!(
                "expected {:?} to move, got {:?}",
                self.current_player, mv.player
            )));
        }

        let expected = self.stones_to_place();
        if mv.positions.len() != expected {
            return Err(Connect6Error::InvalidMove(format!(
                "expected {} stones, got {}",
                expected,
                mv.positions.len()
            )));
        }

        let mut seen = std::collections::HashSet::with_capacity(mv.positions.len());
        for &pos in &mv.positions {
            if !pos.in_bounds() {
                return Err(Connect6Error::InvalidMove(format!("{} out of bounds", pos)));
            }
            if self.get(pos) != Cell::Empty {
                return Err(Connect6Error::InvalidMove(format!("{} is occupied", pos)));
            }
            if !seen.insert(pos) {
                return Err(Connect6Error::InvalidMove(format!(
                    "{} used more than once",
                    pos
                )));
            }
        }

        let mut next = self.clone();
        let stone = mv.player.as_cell();
        for &pos in &mv.positions {
            next.board[pos.y][pos.x] = stone;
        }
        next.move_number += 1;
        next.last_move = Some(mv.clone());
        next.winner = check_winner(&next.board);
        next.current_player = self.current_player.opponent();

        Ok(next)
    }

    /// Canonical hash of `(board, side to move, move number)`, used as the
    /// transposition-table key.
    pub fn position_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for row in &self.board {
            row.hash(&mut hasher);
        }
        self.current_player.hash(&mut hasher);
        self.move_number.hash(&mut hasher);
        hasher.finish()
    }

    pub fn display_board(&self) -> String {
        let mut out = String::new();
        for row in self.board.iter().rev() {
            for cell in row {
                let c = match cell {
                    Cell::Empty => '.',
                    Cell::Black => 'X',
                    Cell::White => 'O',
                };
                out.push(c);
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}

/// Scan all four directions from every occupied cell for a run of >= 6 of
/// the same color; a board with no empty cells and no winner is a draw.
fn check_winner(board: &[Vec<Cell>]) -> Option<Winner> {
    let n = BOARD_SIZE as i32;
    let mut any_empty = false;

    for y in 0..BOARD_SIZE {
        for x in 0..BOARD_SIZE {
            let cell = board[y][x];
            if cell == Cell::Empty {
                any_empty = true;
                continue;
            }
            for &(dx, dy) in &DIRECTIONS {
                let mut run = 1;
                let mut cx = x as i32 + dx;
                let mut cy = y as i32 + dy;
                while cx >= 0 && cx < n && cy >= 0 && cy < n && board[cy as usize][cx as usize] == cell {
                    run += 1;
                    cx += dx;
                    cy += dy;
                }
                if run >= 6 {
                    return Some(if cell == Cell::Black { Winner::Black } else { Winner::White });
                }
            }
        }
    }

    if !any_empty { Some(Winner::Draw) } else { None }
}
