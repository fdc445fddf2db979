//! Patient-to-pixel lookup tables.
//!
//! A [`PixelLut`] holds, for one image, the patient coordinate of every
//! pixel column (`x`) and every pixel row (`y`). Contour vertices are mapped
//! back to pixel indices by searching these tables for the first entry that
//! crosses the vertex coordinate.

use crate::slice::PatientPosition;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Crossing {
    /// First entry strictly greater than the coordinate.
    Above,
    /// First entry strictly less than the coordinate.
    Below,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelLut {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl PixelLut {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y }
    }

    /// Build the tables from image geometry.
    ///
    /// `pixel_spacing[0]` scales the row direction cosine and
    /// `pixel_spacing[1]` the column direction cosine.
    pub fn from_geometry(
        position: [f64; 3],
        orientation: [f64; 6],
        pixel_spacing: [f64; 2],
        rows: usize,
        columns: usize,
    ) -> Self {
        let [di, dj] = pixel_spacing;
        let x = (0..columns)
            .map(|i| (orientation[0] * di).mul_add(i as f64, position[0]))
            .collect();
        let y = (0..rows)
            .map(|j| (orientation[4] * dj).mul_add(j as f64, position[1]))
            .collect();
        Self { x, y }
    }

    /// Patient x coordinate of each pixel column
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Patient y coordinate of each pixel row
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Map a patient-space point to `(column, row)` pixel indices.
    ///
    /// Supine head-first images look for the first column coordinate above
    /// the point, every other position looks for the first one below it.
    /// Rows only depend on prone/supine. When no entry crosses, the last
    /// index of the table is returned.
    pub fn patient_point_to_pixel(
        &self,
        point: [f64; 2],
        patient_position: &PatientPosition,
    ) -> (usize, usize) {
        let prone = patient_position.is_prone();
        let feet_first = patient_position.is_feet_first();

        let column_crossing = if !prone && !feet_first {
            Crossing::Above
        } else {
            Crossing::Below
        };
        let row_crossing = if prone {
            Crossing::Below
        } else {
            Crossing::Above
        };

        (
            first_crossing(&self.x, point[0], column_crossing),
            first_crossing(&self.y, point[1], row_crossing),
        )
    }
}

/// Index of the first table entry crossing `value`.
///
/// Tables are monotonic, so the search is a binary search on the side where
/// a crossing can occur past index 0.
fn first_crossing(lut: &[f64], value: f64, crossing: Crossing) -> usize {
    let Some(last) = lut.len().checked_sub(1) else {
        return 0;
    };
    let ascending = lut[last] >= lut[0];

    let index = match (crossing, ascending) {
        (Crossing::Above, true) => lut.partition_point(|&v| v <= value),
        (Crossing::Below, false) => lut.partition_point(|&v| v >= value),
        (Crossing::Above, false) if lut[0] > value => 0,
        (Crossing::Below, true) if lut[0] < value => 0,
        _ => lut.len(),
    };
    index.min(last)
}
