//! Board coordinate patterns and their dihedral symmetry orbits.

use arrayvec::ArrayVec;

use crate::game::SIZE;

/// Maximum number of cells in a pattern.
pub const MAX_TUPLE: usize = 8;

pub type Coord = (usize, usize);

/// An ordered sequence of board coordinates defining one N-tuple feature.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Pattern {
    coords: ArrayVec<Coord, MAX_TUPLE>,
}

impl Pattern {
    /// Panics if given more than [`MAX_TUPLE`] coordinates.
    pub fn new(coords: &[Coord]) -> Self {
        Pattern {
            coords: coords.iter().copied().collect(),
        }
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    fn rotate_90(&self) -> Pattern {
        Pattern {
            coords: self.coords.iter().map(|&(y, x)| (x, SIZE - 1 - y)).collect(),
        }
    }

    fn reflect(&self) -> Pattern {
        Pattern {
            coords: self.coords.iter().map(|&(y, x)| (y, SIZE - 1 - x)).collect(),
        }
    }

    /// The 8-element dihedral orbit: each rotation of the pattern, paired
    /// with its horizontal reflection.
    pub fn symmetries(&self) -> [Pattern; 8] {
        let mut rotated = self.clone();
        let mut orbit: ArrayVec<Pattern, 8> = ArrayVec::new();
        for _ in 0..4 {
            orbit.push(rotated.clone());
            orbit.push(rotated.reflect());
            rotated = rotated.rotate_90();
        }
        orbit.into_inner().unwrap()
    }
}

/// The eight 6-tuples the agent is trained with. Each covers a contiguous
/// blob of cells; together with their symmetries they read 64 features per
/// board.
pub fn default_patterns() -> Vec<Pattern> {
    [
        [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (1, 2), (2, 1), (3, 1)],
        [(0, 0), (1, 0), (2, 0), (3, 0), (0, 1), (1, 1)],
        [(0, 0), (0, 1), (1, 1), (1, 2), (1, 3), (2, 2)],
        [(0, 0), (0, 1), (0, 2), (1, 1), (2, 1), (2, 2)],
        [(0, 0), (0, 1), (1, 1), (2, 1), (3, 1), (3, 2)],
        [(0, 0), (0, 1), (1, 1), (2, 0), (2, 1), (3, 1)],
        [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 2)],
    ]
    .iter()
    .map(|coords| Pattern::new(coords))
    .collect()
}
