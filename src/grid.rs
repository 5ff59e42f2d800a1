/// A token kind. `EMPTY` marks a cell cleared by a match and not yet refilled.
pub type Token = u8;

pub const EMPTY: Token = 0;

/// A `(row, col)` coordinate, row 0 at the top.
pub type Pos = (usize, usize);

/// Row-major rectangular board of tokens.
///
/// Dimensions are fixed at construction; a new level gets a new `Grid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Token>,
}

impl Grid {
    /// An all-empty grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![EMPTY; rows * cols],
        }
    }

    /// Builds a grid from literal rows.
    pub fn from_rows<const COLS: usize>(rows: &[[Token; COLS]]) -> Self {
        Self {
            rows: rows.len(),
            cols: COLS,
            cells: rows.iter().flatten().copied().collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Token> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    /// Token at an in-bounds position. Panics when out of bounds.
    pub fn at(&self, row: usize, col: usize) -> Token {
        self.cells[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, token: Token) {
        if let Some(idx) = self.index(row, col) {
            self.cells[idx] = token;
        }
    }

    /// Exchanges two cells. Out-of-bounds positions leave the grid untouched.
    pub fn swap(&mut self, a: Pos, b: Pos) {
        if let (Some(first), Some(second)) = (self.index(a.0, a.1), self.index(b.0, b.1)) {
            self.cells.swap(first, second);
        }
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|token| **token == EMPTY).count()
    }

    /// Iterates `(row, col, token)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Token)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, token)| (idx / cols, idx % cols, *token))
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if !self.contains(row, col) {
            return None;
        }

        Some(row * self.cols + col)
    }
}

/// True when `a` and `b` are orthogonal neighbours (Manhattan distance 1).
pub fn is_adjacent(a: Pos, b: Pos) -> bool {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1) == 1
}
