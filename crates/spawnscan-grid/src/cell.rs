//! Cell identifiers and the enclosing-cell lookup.
//!
//! At level `L` the grid has `2^L` rows spanning 180 degrees of latitude
//! and `2^L` columns spanning 360 degrees of longitude. Rows count from
//! the south pole, columns from the antimeridian.

use spawnscan_types::Coordinate;

use crate::error::GridError;

/// Deepest supported subdivision level.
pub const MAX_LEVEL: u8 = 30;

/// Level of the parent cell the aggregator fans out from.
///
/// At level 15 a cell spans roughly 610 m north-south, so a scan covers
/// four level-16 children of about 300 m each.
pub const SCAN_DEPTH: u8 = 15;

/// Identifier of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId {
    level: u8,
    row: u32,
    col: u32,
}

/// Compute the cell at `depth` that contains `center`.
///
/// # Errors
///
/// Returns [`GridError::InvalidArgument`] if `depth` exceeds
/// [`MAX_LEVEL`], or [`GridError::InvalidCoordinate`] if `center` is not
/// a valid position.
pub fn enclosing_cell(center: Coordinate, depth: u8) -> Result<CellId, GridError> {
    let divisions = divisions(depth)?;
    if !center.is_valid() {
        return Err(GridError::InvalidCoordinate(center));
    }

    Ok(CellId {
        level: depth,
        row: axis_index((center.lat + 90.0) / 180.0, divisions),
        col: axis_index((center.lng + 180.0) / 360.0, divisions),
    })
}

impl CellId {
    /// Subdivision level of this cell.
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// The ancestor of this cell at `level`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidArgument`] if `level` is deeper than
    /// this cell.
    pub fn parent(&self, level: u8) -> Result<Self, GridError> {
        let shift = self.level.checked_sub(level).ok_or_else(|| {
            GridError::InvalidArgument(format!(
                "parent level {level} is deeper than cell level {}",
                self.level
            ))
        })?;
        Ok(Self {
            level,
            row: self.row >> shift,
            col: self.col >> shift,
        })
    }

    /// The four children of this cell, ordered south-west, south-east,
    /// north-west, north-east.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidArgument`] for a cell at [`MAX_LEVEL`].
    pub fn children(&self) -> Result<[Self; 4], GridError> {
        if self.level >= MAX_LEVEL {
            return Err(GridError::InvalidArgument(format!(
                "cell at level {} has no children",
                self.level
            )));
        }
        let level = self.level.saturating_add(1);
        let row = self.row << 1;
        let col = self.col << 1;
        let child = |row: u32, col: u32| Self { level, row, col };
        Ok([
            child(row, col),
            child(row, col | 1),
            child(row | 1, col),
            child(row | 1, col | 1),
        ])
    }

    /// Geographic center of this cell.
    pub fn center(&self) -> Coordinate {
        let n = f64::from(1_u32 << self.level);
        Coordinate::new(
            (f64::from(self.row) + 0.5).mul_add(180.0 / n, -90.0),
            (f64::from(self.col) + 0.5).mul_add(360.0 / n, -180.0),
        )
    }

    /// Whether `point` falls inside this cell.
    pub fn contains(&self, point: Coordinate) -> bool {
        enclosing_cell(point, self.level).is_ok_and(|cell| cell == *self)
    }
}

impl core::fmt::Display for CellId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.row, self.col)
    }
}

/// Number of rows (and columns) at `level`.
fn divisions(level: u8) -> Result<u32, GridError> {
    if level > MAX_LEVEL {
        return Err(GridError::InvalidArgument(format!(
            "depth {level} exceeds maximum level {MAX_LEVEL}"
        )));
    }
    Ok(1_u32 << level)
}

/// Map a fraction in `[0, 1]` onto `0..divisions`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn axis_index(fraction: f64, divisions: u32) -> u32 {
    let max = divisions.saturating_sub(1);
    // Clamped to [0, max] before the cast.
    let scaled = (fraction * f64::from(divisions)).floor();
    scaled.clamp(0.0, f64::from(max)) as u32
}
