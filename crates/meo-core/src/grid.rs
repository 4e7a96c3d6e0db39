//! Chunk index arithmetic over the pixel grid.
//!
//! A chunk is a rectangular sub-range of pixel indices identified by its
//! `(x_start, y_start)` anchor. Chunks tile the requested index range
//! without gaps or overlaps; the final chunk in a dimension is short when
//! the range is not evenly divisible by the chunk size.

use crate::error::{MeoError, MeoResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Anchor of one chunk: the smallest pixel index it covers in each
/// dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkAnchor {
    pub x: usize,
    pub y: usize,
}

impl ChunkAnchor {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Stable label used in file names: `"{x}_{y}"`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.x, self.y)
    }
}

impl fmt::Display for ChunkAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for ChunkAnchor {
    type Err = MeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| MeoError::Config(format!("chunk anchor '{s}' is not of the form x,y")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| MeoError::Config(format!("chunk anchor '{s}' has a non-integer part")))
        };
        Ok(ChunkAnchor::new(parse(x)?, parse(y)?))
    }
}

/// Partition of a rectangular pixel-index range into chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkGrid {
    x_range: (usize, usize),
    y_range: (usize, usize),
    chunk_size: (usize, usize),
}

impl ChunkGrid {
    pub fn new(
        x_range: (usize, usize),
        y_range: (usize, usize),
        chunk_size: (usize, usize),
    ) -> MeoResult<Self> {
        if chunk_size.0 == 0 || chunk_size.1 == 0 {
            return Err(MeoError::Config(format!(
                "chunk size {}x{} must be positive in both dimensions",
                chunk_size.0, chunk_size.1
            )));
        }
        if x_range.0 >= x_range.1 || y_range.0 >= y_range.1 {
            return Err(MeoError::Config(format!(
                "pixel index range x={}..{} y={}..{} is empty",
                x_range.0, x_range.1, y_range.0, y_range.1
            )));
        }
        Ok(Self {
            x_range,
            y_range,
            chunk_size,
        })
    }

    /// All chunk anchors, in x-major order: every y anchor for a given x
    /// anchor is produced before x advances. Downstream dispatch assigns
    /// work in this order, so it must stay stable.
    pub fn anchors(&self) -> Vec<ChunkAnchor> {
        let mut anchors = Vec::with_capacity(self.num_chunks());
        let mut x = self.x_range.0;
        while x < self.x_range.1 {
            let mut y = self.y_range.0;
            while y < self.y_range.1 {
                anchors.push(ChunkAnchor::new(x, y));
                y += self.chunk_size.1;
            }
            x += self.chunk_size.0;
        }
        anchors
    }

    pub fn num_chunks(&self) -> usize {
        let nx = (self.x_range.1 - self.x_range.0).div_ceil(self.chunk_size.0);
        let ny = (self.y_range.1 - self.y_range.0).div_ceil(self.chunk_size.1);
        nx * ny
    }

    /// Pixel-index extent of the chunk at `anchor`, clipped to the grid
    /// bounds (the final chunk in a dimension may be short).
    pub fn chunk_extent(&self, anchor: ChunkAnchor) -> MeoResult<(Range<usize>, Range<usize>)> {
        let aligned_x = (anchor.x >= self.x_range.0)
            && (anchor.x - self.x_range.0) % self.chunk_size.0 == 0
            && anchor.x < self.x_range.1;
        let aligned_y = (anchor.y >= self.y_range.0)
            && (anchor.y - self.y_range.0) % self.chunk_size.1 == 0
            && anchor.y < self.y_range.1;
        if !aligned_x || !aligned_y {
            return Err(MeoError::Config(format!(
                "chunk anchor {anchor} is not aligned to the configured chunk grid"
            )));
        }
        let x_end = (anchor.x + self.chunk_size.0).min(self.x_range.1);
        let y_end = (anchor.y + self.chunk_size.1).min(self.y_range.1);
        Ok((anchor.x..x_end, anchor.y..y_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn anchors_cover_range_exactly_once() {
        let grid = ChunkGrid::new((0, 20), (0, 20), (5, 5)).unwrap();
        let mut owner: HashMap<(usize, usize), ChunkAnchor> = HashMap::new();
        for anchor in grid.anchors() {
            let (xs, ys) = grid.chunk_extent(anchor).unwrap();
            for x in xs {
                for y in ys.clone() {
                    let prev = owner.insert((x, y), anchor);
                    assert!(prev.is_none(), "pixel {x}/{y} assigned to two chunks");
                }
            }
        }
        for x in 0..20 {
            for y in 0..20 {
                assert!(owner.contains_key(&(x, y)), "pixel {x}/{y} unassigned");
            }
        }
        assert_eq!(owner.len(), 400);
    }

    #[test]
    fn uneven_range_produces_short_final_chunk() {
        let grid = ChunkGrid::new((0, 7), (0, 5), (3, 2)).unwrap();
        assert_eq!(grid.num_chunks(), 3 * 3);
        let (xs, ys) = grid.chunk_extent(ChunkAnchor::new(6, 4)).unwrap();
        assert_eq!(xs, 6..7);
        assert_eq!(ys, 4..5);
    }

    #[test]
    fn anchor_order_is_deterministic_and_x_major() {
        let grid = ChunkGrid::new((0, 4), (0, 4), (2, 2)).unwrap();
        let anchors = grid.anchors();
        assert_eq!(
            anchors,
            vec![
                ChunkAnchor::new(0, 0),
                ChunkAnchor::new(0, 2),
                ChunkAnchor::new(2, 0),
                ChunkAnchor::new(2, 2),
            ]
        );
        assert_eq!(anchors, grid.anchors());
    }

    #[test]
    fn invalid_parameters_are_config_errors() {
        assert!(matches!(
            ChunkGrid::new((0, 10), (0, 10), (0, 5)),
            Err(MeoError::Config(_))
        ));
        assert!(matches!(
            ChunkGrid::new((10, 10), (0, 10), (5, 5)),
            Err(MeoError::Config(_))
        ));
        assert!(matches!(
            ChunkGrid::new((0, 10), (12, 3), (5, 5)),
            Err(MeoError::Config(_))
        ));
    }

    #[test]
    fn misaligned_anchor_is_rejected() {
        let grid = ChunkGrid::new((0, 20), (0, 20), (5, 5)).unwrap();
        assert!(grid.chunk_extent(ChunkAnchor::new(3, 0)).is_err());
        assert!(grid.chunk_extent(ChunkAnchor::new(20, 0)).is_err());
    }

    #[test]
    fn anchor_parses_from_cli_form() {
        let anchor: ChunkAnchor = "15,5".parse().unwrap();
        assert_eq!(anchor, ChunkAnchor::new(15, 5));
        assert_eq!(anchor.to_string(), "15,5");
        assert_eq!(anchor.label(), "15_5");
        assert!("15".parse::<ChunkAnchor>().is_err());
        assert!("a,b".parse::<ChunkAnchor>().is_err());
    }
}
