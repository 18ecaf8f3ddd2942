//! Perfect-conductor obstacle primitives.
//!
//! Every primitive is described in integer cell coordinates `(i, j)` with
//! `i` along x (columns) and `j` along y (rows). Primitives are fully
//! described by their TOML parameters; the `type` tag selects the variant.

use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// A PEC obstacle that can be rasterised into a cell mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Obstacle {
    SlitScreen(SlitScreen),
    MirrorRow(MirrorRow),
    Block(Block),
}

/// An opaque screen spanning the full height of the grid, pierced by slits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlitScreen {
    /// First column occupied by the screen.
    pub column: usize,
    /// Number of columns the screen occupies.
    #[serde(default = "default_thickness")]
    pub thickness: usize,
    /// Apertures cut through the screen.
    #[serde(default)]
    pub slits: Vec<Slit>,
}

/// A single aperture: rows with `|j - centre| <= width / 2` are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slit {
    pub centre: usize,
    pub width: usize,
}

/// A conducting plane along one row of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorRow {
    pub row: usize,
    /// Half-open column span `[start, end)`; the whole row when absent.
    #[serde(default)]
    pub columns: Option<[usize; 2]>,
}

/// An axis-aligned rectangle of cells, `min` inclusive, `max` exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub min: [usize; 2],
    pub max: [usize; 2],
}

fn default_thickness() -> usize {
    1
}

impl SlitScreen {
    /// A one-cell-thick screen with two equal slits placed symmetrically
    /// about `centre_row`.
    pub fn double(column: usize, centre_row: usize, slit_width: usize, separation: usize) -> Self {
        let half = separation / 2;
        Self {
            column,
            thickness: 1,
            slits: vec![
                Slit {
                    centre: centre_row.saturating_sub(half),
                    width: slit_width,
                },
                Slit {
                    centre: centre_row.saturating_add(half),
                    width: slit_width,
                },
            ],
        }
    }

    fn is_open(&self, j: usize) -> bool {
        self.slits
            .iter()
            .any(|s| j.abs_diff(s.centre) <= s.width / 2)
    }
}

impl Obstacle {
    /// Check whether cell `(i, j)` is conducting.
    pub fn contains(&self, i: usize, j: usize) -> bool {
        match self {
            Obstacle::SlitScreen(s) => {
                i >= s.column && i - s.column < s.thickness && !s.is_open(j)
            }
            Obstacle::MirrorRow(m) => {
                j == m.row
                    && match m.columns {
                        Some([start, end]) => i >= start && i < end,
                        None => true,
                    }
            }
            Obstacle::Block(b) => i >= b.min[0] && i < b.max[0] && j >= b.min[1] && j < b.max[1],
        }
    }

    /// Human-readable name of the primitive.
    pub fn kind(&self) -> &'static str {
        match self {
            Obstacle::SlitScreen(_) => "slit screen",
            Obstacle::MirrorRow(_) => "mirror row",
            Obstacle::Block(_) => "block",
        }
    }

    /// Check that the obstacle fits inside an `nx` x `ny` grid.
    pub fn validate(&self, nx: usize, ny: usize) -> Result<(), GeometryError> {
        let shape = self.kind();
        let out_of_bounds = |detail: String| GeometryError::OutOfBounds { shape, nx, ny, detail };
        match self {
            Obstacle::SlitScreen(s) => {
                if s.thickness == 0 {
                    return Err(GeometryError::InvalidShape {
                        shape,
                        detail: "thickness must be at least one cell".into(),
                    });
                }
                match s.column.checked_add(s.thickness) {
                    Some(end) if end <= nx => {}
                    _ => {
                        return Err(out_of_bounds(format!(
                            "{} column(s) from column {}",
                            s.thickness, s.column
                        )))
                    }
                }
                for slit in &s.slits {
                    let half = slit.width / 2;
                    if slit.centre < half || slit.centre.checked_add(half).map_or(true, |top| top >= ny) {
                        return Err(out_of_bounds(format!(
                            "slit centred on row {} with width {}",
                            slit.centre, slit.width
                        )));
                    }
                }
                Ok(())
            }
            Obstacle::MirrorRow(m) => {
                if m.row >= ny {
                    return Err(out_of_bounds(format!("row {}", m.row)));
                }
                if let Some([start, end]) = m.columns {
                    if start >= end || end > nx {
                        return Err(out_of_bounds(format!("columns {}..{}", start, end)));
                    }
                }
                Ok(())
            }
            Obstacle::Block(b) => {
                if b.min[0] >= b.max[0] || b.min[1] >= b.max[1] {
                    return Err(GeometryError::InvalidShape {
                        shape,
                        detail: format!("empty extent {:?}..{:?}", b.min, b.max),
                    });
                }
                if b.max[0] > nx || b.max[1] > ny {
                    return Err(out_of_bounds(format!("extent {:?}..{:?}", b.min, b.max)));
                }
                Ok(())
            }
        }
    }
}
