mod quadtree;
mod error;
pub mod catalog;
pub mod config;
pub mod tiles;

/// Read-only walk over a [`SortedQuadTree`], root first, children in index order.
pub trait QuadtreeVisitor<T> {
    fn branch(&mut self, depth: u8, bounds: &Bounds, elements: &[T]);
    fn leaf(&mut self, depth: u8, bounds: &Bounds, elements: &[T]);
}

pub use quadtree::*;
pub use error::*;
pub use catalog::{CubeFace, Star};
pub use config::BuildConfig;
pub use tiles::Tile;
