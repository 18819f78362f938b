//! Tile emission: one JSON file per non-empty node of a face tree.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{CubeFace, Star};
use crate::error::TileError;
use crate::quadtree::{Bounds, SortedQuadTree};
use crate::QuadtreeVisitor;

#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub face: CubeFace,
    pub min_x: f64,
    pub min_y: f64,
    pub size: f64,
    /// Magnitude of the first (brightest) star retained at the node.
    pub brightest: f64,
    pub stars: Vec<Star>,
}

#[derive(Serialize)]
struct TileDocument<'a> {
    stars: Vec<StarRecord<'a>>,
}

/// `[name, mag, x, y, z, dist, color]`
#[derive(Serialize)]
struct StarRecord<'a>(&'a str, f64, f64, f64, f64, f64, f64);

impl Tile {
    /// `cat_{face}_{min_x}_{min_y}_{size}_{brightest}.json`, so a viewer can
    /// pick tiles by region and zoom without opening them.
    pub fn file_name(&self) -> String {
        format!(
            "cat_{}_{}_{}_{}_{}.json",
            self.face,
            Self::number(self.min_x),
            Self::number(self.min_y),
            Self::number(self.size),
            Self::number(self.brightest),
        )
    }

    pub fn to_json(&self) -> Result<String, TileError> {
        let document = TileDocument {
            stars: self
                .stars
                .iter()
                .map(|s| StarRecord(&s.name, s.mag, s.x, s.y, s.z, s.dist, s.color))
                .collect(),
        };
        Ok(serde_json::to_string(&document)?)
    }

    /// Six decimals with trailing zeros trimmed, keeping at least one.
    fn number(value: f64) -> String {
        let text = format!("{value:.6}");
        let trimmed = text.trim_end_matches('0');
        if trimmed.ends_with('.') {
            format!("{trimmed}0")
        } else {
            trimmed.to_string()
        }
    }
}

struct TileCollector {
    face: CubeFace,
    tiles: Vec<Tile>,
}

impl TileCollector {
    fn collect(&mut self, bounds: &Bounds, stars: &[Star]) {
        let Some(first) = stars.first() else {
            return;
        };
        self.tiles.push(Tile {
            face: self.face,
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            size: bounds.size(),
            brightest: first.mag,
            stars: stars.to_vec(),
        });
    }
}

impl QuadtreeVisitor<Star> for TileCollector {
    fn branch(&mut self, _depth: u8, bounds: &Bounds, elements: &[Star]) {
        self.collect(bounds, elements);
    }

    fn leaf(&mut self, _depth: u8, bounds: &Bounds, elements: &[Star]) {
        self.collect(bounds, elements);
    }
}

/// Tiles for every node holding at least one star, in depth-first order.
pub fn collect_tiles(tree: &SortedQuadTree<Star>, face: CubeFace) -> Vec<Tile> {
    let mut collector = TileCollector {
        face,
        tiles: Vec::new(),
    };
    tree.traverse(&mut collector);
    collector.tiles
}

/// Writes each tile under `dir`, creating it if needed. Returns the number written.
pub fn write_tiles(dir: &Path, tiles: &[Tile]) -> Result<usize, TileError> {
    fs::create_dir_all(dir)?;
    for tile in tiles {
        let path = dir.join(tile.file_name());
        fs::write(&path, tile.to_json()?)?;
        debug!(path = %path.display(), stars = tile.stars.len(), "wrote tile");
    }
    info!(count = tiles.len(), dir = %dir.display(), "wrote tiles");
    Ok(tiles.len())
}
