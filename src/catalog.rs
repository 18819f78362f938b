//! Star catalog ingestion.
//!
//! Reads HYG-style CSV lines, projects each star onto a face of the unit
//! cube and groups the stars per face, ready to be streamed brightest-first
//! into a [`SortedQuadTree`].

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;
use std::io::BufRead;

use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::error::{CatalogError, QuadtreeError};
use crate::quadtree::SortedQuadTree;

const HIP_FIELD: usize = 1;
const NAME_FIELDS: [usize; 3] = [6, 5, 4];
const RA_FIELD: usize = 7;
const DEC_FIELD: usize = 8;
const DIST_FIELD: usize = 9;
const MAG_FIELD: usize = 13;
const COLOR_FIELD: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CubeFace {
    X0,
    X1,
    Y0,
    Y1,
    Z0,
    Z1,
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CubeFace::X0 => "x0",
            CubeFace::X1 => "x1",
            CubeFace::Y0 => "y0",
            CubeFace::Y1 => "y1",
            CubeFace::Z0 => "z0",
            CubeFace::Z1 => "z1",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Star {
    pub name: String,
    pub mag: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub dist: f64,
    pub color: f64,
    /// Position on its cube face, both axes in `[0, 1]`.
    pub coords: (f64, f64),
}

pub type FaceCatalog = BTreeMap<CubeFace, Vec<Star>>;

pub fn parse_line(line: &str) -> Result<(Star, CubeFace), CatalogError> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    let field = |index: usize| {
        fields
            .get(index)
            .map(|value| value.trim())
            .ok_or(CatalogError::MissingField { index })
    };
    let number = |index: usize| {
        let value = field(index)?;
        value.parse::<f64>().map_err(|_| CatalogError::InvalidNumber {
            index,
            value: value.to_string(),
        })
    };

    let mut name = None;
    for index in NAME_FIELDS {
        let value = field(index)?;
        if !value.is_empty() {
            name = Some(value.to_string());
            break;
        }
    }
    let name = match name {
        Some(name) => name,
        None => format!("HIP {}", field(HIP_FIELD)?),
    };

    let ra = number(RA_FIELD)? * PI / 12.0;
    let dec = number(DEC_FIELD)? * PI / 180.0;
    let dist = number(DIST_FIELD)?;
    let mag = number(MAG_FIELD)?;
    let color = number(COLOR_FIELD)?;

    let x = dec.cos() * -ra.sin();
    let y = dec.sin();
    let z = dec.cos() * -ra.cos();
    let (face, coords) = project(x, y, z).ok_or(CatalogError::Projection)?;

    let star = Star {
        name,
        mag,
        x,
        y,
        z,
        dist,
        color,
        coords,
    };
    Ok((star, face))
}

/// Projects a unit vector onto the cube face its dominant axis points at.
/// Ties go to x, then y, then z.
pub fn project(x: f64, y: f64, z: f64) -> Option<(CubeFace, (f64, f64))> {
    let axes = [
        (CubeFace::X0, CubeFace::X1, x, y, z),
        (CubeFace::Y0, CubeFace::Y1, y, z, x),
        (CubeFace::Z0, CubeFace::Z1, z, y, x),
    ];
    for (negative, positive, a, b, c) in axes {
        let abs_a = a.abs();
        if abs_a >= b.abs().max(c.abs()) {
            let face = if a > 0.0 { positive } else { negative };
            return Some((face, ((b / abs_a + 1.0) / 2.0, (c / abs_a + 1.0) / 2.0)));
        }
    }
    None
}

/// Reads every parsable line, dropping stars at or below `min_magnitude`.
pub fn read_catalog<R>(reader: R, min_magnitude: f64) -> Result<FaceCatalog, CatalogError>
where
    R: BufRead,
{
    let mut faces = FaceCatalog::new();
    let mut skipped = 0usize;
    let mut dropped = 0usize;
    let mut kept = 0usize;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line) {
            Ok((star, face)) if star.mag > min_magnitude => {
                faces.entry(face).or_default().push(star);
                kept += 1;
            }
            Ok(_) => dropped += 1,
            Err(err) => {
                debug!(line = number + 1, %err, "skipping catalog line");
                skipped += 1;
            }
        }
    }

    info!(kept, dropped, skipped, faces = faces.len(), "read catalog");
    Ok(faces)
}

/// Brightest (lowest magnitude) first. Stable, so equal magnitudes keep
/// catalog order.
pub fn sort_by_brightness(stars: &mut [Star]) {
    stars.sort_by(|a, b| a.mag.total_cmp(&b.mag));
}

/// Split policy aligning node contents to half-magnitude steps.
///
/// Takes the dimmest star of a brightness-sorted overflow list, rounds its
/// magnitude down to a half-magnitude step, and keeps every star strictly
/// brighter than that step. The rest, including the whole bucket the
/// dimmest star belongs to, is pushed down.
pub fn magnitude_split(stars: &[Star]) -> usize {
    let Some(dimmest) = stars.last() else {
        return 0;
    };
    let threshold = (dimmest.mag * 2.0).floor() / 2.0;
    stars.partition_point(|star| star.mag < threshold)
}

/// Sorts one face's stars and streams them into a fresh tree.
pub fn build_face_tree(
    mut stars: Vec<Star>,
    config: &BuildConfig,
) -> Result<SortedQuadTree<Star>, QuadtreeError> {
    sort_by_brightness(&mut stars);
    let mut tree = SortedQuadTree::new(|star: &Star| star.coords, config.capacity)?
        .with_policy(magnitude_split)
        .with_max_depth(config.max_depth);
    for star in stars {
        tree.add(star)?;
    }
    Ok(tree)
}
