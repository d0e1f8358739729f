use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub};

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0, y: 0 };
    pub const UP: Vec2 = Vec2 { x: 0, y: -1 };
    pub const DOWN: Vec2 = Vec2 { x: 0, y: 1 };
    pub const LEFT: Vec2 = Vec2 { x: -1, y: 0 };
    pub const RIGHT: Vec2 = Vec2 { x: 1, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan (taxicab) distance
    #[inline]
    pub fn manhattan(&self, other: Vec2) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Check if the cell lies inside a `cols` x `rows` board
    #[inline]
    pub fn in_bounds(&self, cols: u32, rows: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < cols && (self.y as u32) < rows
    }

    /// Packed row-major cell key (`y * cols + x`)
    ///
    /// Only meaningful for in-bounds cells.
    #[inline]
    pub fn cell_key(&self, cols: u32) -> u32 {
        self.y as u32 * cols + self.x as u32
    }

    /// Step one cell in a direction
    #[inline]
    pub fn step(&self, direction: Direction) -> Self {
        *self + direction.delta()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

/// Cardinal movement direction (screen coordinates, y grows downward)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Stable iteration order used wherever candidates are scanned
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit vector for this direction
    #[inline]
    pub fn delta(&self) -> Vec2 {
        match self {
            Direction::Up => Vec2::UP,
            Direction::Right => Vec2::RIGHT,
            Direction::Down => Vec2::DOWN,
            Direction::Left => Vec2::LEFT,
        }
    }

    #[inline]
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    #[inline]
    pub fn is_reverse_of(&self, other: Direction) -> bool {
        self.opposite() == other
    }
}
