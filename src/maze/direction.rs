//! Cardinal headings and turn algebra.

use std::fmt;

/// Cardinal heading. North is +y, East is +x.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

/// All four directions in scan order (N, E, S, W)
pub const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl Direction {
    /// Wall-array index for this heading
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Cell offset of one step along this heading
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        DIRECTIONS[(self as usize + 2) % 4]
    }

    /// Heading after a 90 degree clockwise turn
    #[inline]
    pub fn right(self) -> Direction {
        DIRECTIONS[(self as usize + 1) % 4]
    }

    /// Heading after a 90 degree counter-clockwise turn
    #[inline]
    pub fn left(self) -> Direction {
        DIRECTIONS[(self as usize + 3) % 4]
    }

    /// Clockwise quarter turns (0..=3) taking `self` to `to`
    #[inline]
    pub fn quarter_turns_to(self, to: Direction) -> u8 {
        ((to as i8 - self as i8 + 4) % 4) as u8
    }

    /// Single character representation for logs and map renders
    pub fn as_char(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::East => 'E',
            Direction::South => 'S',
            Direction::West => 'W',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites() {
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::East.opposite(), Direction::West);
        assert_eq!(Direction::South.opposite(), Direction::North);
        assert_eq!(Direction::West.opposite(), Direction::East);
    }

    #[test]
    fn test_turns() {
        assert_eq!(Direction::North.right(), Direction::East);
        assert_eq!(Direction::North.left(), Direction::West);
        assert_eq!(Direction::West.right(), Direction::North);
        assert_eq!(Direction::East.left(), Direction::North);
    }

    #[test]
    fn test_quarter_turns() {
        assert_eq!(Direction::North.quarter_turns_to(Direction::North), 0);
        assert_eq!(Direction::North.quarter_turns_to(Direction::East), 1);
        assert_eq!(Direction::North.quarter_turns_to(Direction::South), 2);
        assert_eq!(Direction::North.quarter_turns_to(Direction::West), 3);
        assert_eq!(Direction::West.quarter_turns_to(Direction::South), 3);
    }

    #[test]
    fn test_offsets_sum_to_zero() {
        let (dx, dy) = DIRECTIONS
            .iter()
            .fold((0, 0), |(x, y), d| (x + d.offset().0, y + d.offset().1));
        assert_eq!((dx, dy), (0, 0));
    }
}
