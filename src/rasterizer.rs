//! Contour rasterization.
//!
//! Contours are filled in a working frame of shape (columns, rows) indexed
//! by the `(column, row)` pairs [`PixelLut::patient_point_to_pixel`]
//! returns. The accumulated mask is flipped vertically and rotated by 270°
//! to get back to the image's (rows, columns) layout.

use ndarray::{Array2, ArrayView2, s};
use tracing::debug;

use crate::enums::ContourType;
use crate::pixel_lut::PixelLut;
use crate::slice::ImageSlice;
use crate::structure::{ContourPlane, Structure};

/// Plane z values of one structure, computed once before rasterizing slices.
#[derive(Clone, Debug)]
pub struct StructureIndex<'a> {
    structure: &'a Structure,
    z: Vec<f64>,
}

impl<'a> StructureIndex<'a> {
    pub fn new(structure: &'a Structure) -> Self {
        let z = structure.planes().iter().map(|plane| plane.z).collect();
        Self { structure, z }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    /// Closest plane to `z` and its distance. Ties go to the earlier plane.
    pub fn nearest_plane(&self, z: f64) -> Option<(&'a ContourPlane, f64)> {
        let (index, distance) = self
            .z
            .iter()
            .map(|plane_z| (plane_z - z).abs())
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (index, distance)| {
                match best {
                    Some((_, best_distance)) if best_distance <= distance => best,
                    _ => Some((index, distance)),
                }
            })?;
        Some((&self.structure.planes()[index], distance))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ContourRasterizer {
    z_tolerance: f64,
}

impl Default for ContourRasterizer {
    fn default() -> Self {
        Self::new(crate::options::DEFAULT_Z_TOLERANCE)
    }
}

impl ContourRasterizer {
    pub fn new(z_tolerance: f64) -> Self {
        Self { z_tolerance }
    }

    /// Binary mask of `index`'s structure on `slice`, shaped like the slice.
    ///
    /// The mask is all zero when the structure has no planes or when its
    /// nearest plane is `z_tolerance` or further from the slice.
    ///
    /// # Panics
    ///
    /// Panics if the restored mask shape differs from the slice shape, which
    /// means the working frame does not match the pixel lookup table.
    pub fn rasterize(
        &self,
        index: &StructureIndex<'_>,
        slice: &ImageSlice,
        lut: &PixelLut,
    ) -> Array2<u8> {
        let (rows, columns) = slice.dim();
        let z = slice.plane_z();

        let Some((plane, distance)) = index.nearest_plane(z) else {
            return Array2::zeros((rows, columns));
        };
        // NaN distances fail closed.
        if !(distance < self.z_tolerance) {
            return Array2::zeros((rows, columns));
        }
        debug!(
            structure = %index.structure().name,
            plane = %plane.key,
            distance,
            "Rasterizing contour plane"
        );

        let working_dim = (columns, rows);
        let mut working = Array2::<u16>::zeros(working_dim);
        for contour in &plane.contours {
            if contour.contour_type != ContourType::ClosedPlanar {
                continue;
            }
            let pixels: Vec<(usize, usize)> = contour
                .points
                .iter()
                .map(|point| {
                    lut.patient_point_to_pixel([point[0], point[1]], &slice.patient_position)
                })
                .collect();
            let Some(&start) = pixels.last() else {
                continue;
            };
            let vertices: Vec<(f64, f64)> = std::iter::once(start)
                .chain(pixels.iter().copied())
                .map(|(column, row)| (column as f64, row as f64))
                .collect();
            working += &polygon_mask(working_dim, &vertices);
        }

        let restored = rot270(flipud(working.view()));
        assert_eq!(
            restored.dim(),
            (rows, columns),
            "rasterized mask does not match the slice shape"
        );
        restored.mapv(|count| u8::from(count > 0))
    }
}

/// Fill a polygon whose vertices are `(axis 0, axis 1)` grid coordinates.
///
/// A cell is set when its center lies inside the polygon by the crossing
/// rule, counting lower edges in and upper edges out on both axes.
pub fn polygon_mask(shape: (usize, usize), vertices: &[(f64, f64)]) -> Array2<u16> {
    let mut mask = Array2::zeros(shape);
    if vertices.len() < 3 || shape.0 == 0 || shape.1 == 0 {
        return mask;
    }

    let (min_0, max_0, min_1, max_1) = vertices.iter().fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(min_0, max_0, min_1, max_1), &(a, b)| (min_0.min(a), max_0.max(a), min_1.min(b), max_1.max(b)),
    );
    let clamp = |value: f64, len: usize| (value.max(0.0) as usize).min(len - 1);
    let (start_0, end_0) = (clamp(min_0.floor(), shape.0), clamp(max_0.ceil(), shape.0));
    let (start_1, end_1) = (clamp(min_1.floor(), shape.1), clamp(max_1.ceil(), shape.1));

    for i in start_0..=end_0 {
        for j in start_1..=end_1 {
            if point_in_polygon((i as f64, j as f64), vertices) {
                mask[[i, j]] = 1;
            }
        }
    }
    mask
}

/// Even-odd test casting a ray towards increasing axis 1.
fn point_in_polygon(point: (f64, f64), polygon: &[(f64, f64)]) -> bool {
    let (p0, p1) = point;
    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let (a0, a1) = polygon[i];
        let (b0, b1) = polygon[j];
        let straddles = (a0 <= p0 && p0 < b0) || (b0 <= p0 && p0 < a0);
        if straddles && p1 < (b1 - a1) * (p0 - a0) / (b0 - a0) + a1 {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn flipud<T>(view: ArrayView2<'_, T>) -> ArrayView2<'_, T> {
    view.slice_move(s![..;-1, ..])
}

/// Rotate by 270° counter-clockwise.
fn rot270<T>(view: ArrayView2<'_, T>) -> ArrayView2<'_, T> {
    flipud(view).reversed_axes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::PatientPosition;
    use crate::slice::fixtures::axial_slice;
    use crate::structure::Contour;
    use ndarray::array;

    /// Rectangle whose vertices map to pixel columns 2 and 5, rows 3 and 7.
    fn rectangle(z: f64) -> Contour {
        Contour::closed_planar(vec![
            [1.5, 2.5, z],
            [4.5, 2.5, z],
            [4.5, 6.5, z],
            [1.5, 6.5, z],
        ])
    }

    #[test]
    fn test_rot270_of_flipud_is_transpose() {
        let a = array![[1, 2, 3], [4, 5, 6]];
        assert_eq!(rot270(flipud(a.view())), a.t());
        assert_eq!(rot270(a.view()), array![[4, 1], [5, 2], [6, 3]]);
    }

    #[test]
    fn test_polygon_mask_rectangle_area() {
        let mask = polygon_mask((8, 10), &[(2.0, 3.0), (2.0, 3.0), (5.0, 3.0), (5.0, 7.0), (2.0, 7.0)]);
        assert_eq!(mask.sum(), 12);
        assert_eq!(mask[[2, 3]], 1);
        assert_eq!(mask[[4, 6]], 1);
        assert_eq!(mask[[5, 6]], 0);
        assert_eq!(mask[[4, 7]], 0);
    }

    #[test]
    fn test_polygon_mask_degenerate() {
        assert_eq!(polygon_mask((4, 4), &[(0.0, 0.0), (3.0, 3.0)]).sum(), 0);
        assert_eq!(polygon_mask((0, 4), &[(0.0, 0.0), (3.0, 0.0), (3.0, 3.0)]).dim(), (0, 4));
    }

    #[test]
    fn test_rasterize_rectangle() {
        let slice = axial_slice(10.0, 9, 8);
        let structure = Structure::from_contours(1, "Box", [rectangle(10.0)]);
        let index = StructureIndex::new(&structure);
        let mask = ContourRasterizer::default().rasterize(&index, &slice, &slice.pixel_lut());

        assert_eq!(mask.dim(), (9, 8));
        assert_eq!(mask.iter().map(|&v| usize::from(v)).sum::<usize>(), 12);
        for ((row, column), &value) in mask.indexed_iter() {
            let inside = (3..7).contains(&row) && (2..5).contains(&column);
            assert_eq!(value, u8::from(inside), "pixel ({row}, {column})");
        }
    }

    #[test]
    fn test_overlapping_contours_are_clamped() {
        let slice = axial_slice(0.0, 9, 8);
        let structure = Structure::from_contours(1, "Box", [rectangle(0.0), rectangle(0.0)]);
        let index = StructureIndex::new(&structure);
        let mask = ContourRasterizer::default().rasterize(&index, &slice, &slice.pixel_lut());
        assert_eq!(mask.iter().copied().max(), Some(1));
        assert_eq!(mask.iter().map(|&v| usize::from(v)).sum::<usize>(), 12);
    }

    #[test]
    fn test_plane_outside_tolerance_is_empty() {
        let slice = axial_slice(0.0, 9, 8);
        let structure = Structure::from_contours(1, "Box", [rectangle(0.5)]);
        let index = StructureIndex::new(&structure);
        let mask = ContourRasterizer::default().rasterize(&index, &slice, &slice.pixel_lut());
        assert_eq!(mask.dim(), (9, 8));
        assert!(mask.iter().all(|&v| v == 0));

        let near = Structure::from_contours(1, "Box", [rectangle(0.49)]);
        let index = StructureIndex::new(&near);
        let mask = ContourRasterizer::default().rasterize(&index, &slice, &slice.pixel_lut());
        assert!(mask.iter().any(|&v| v == 1));
    }

    #[test]
    fn test_undefined_slice_position_is_empty() {
        let slice = axial_slice(f64::NAN, 9, 8);
        let structure = Structure::from_contours(1, "Box", [rectangle(0.0), rectangle(1.0)]);
        let index = StructureIndex::new(&structure);
        let mask = ContourRasterizer::default().rasterize(&index, &slice, &slice.pixel_lut());
        assert_eq!(mask.dim(), (9, 8));
        assert!(mask.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_structure_without_planes_is_empty() {
        let slice = axial_slice(0.0, 4, 6);
        let structure = Structure::from_contours(1, "Nothing", Vec::<Contour>::new());
        let index = StructureIndex::new(&structure);
        let mask = ContourRasterizer::default().rasterize(&index, &slice, &slice.pixel_lut());
        assert_eq!(mask.dim(), (4, 6));
        assert!(mask.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_only_closed_planar_contours_are_drawn() {
        let slice = axial_slice(0.0, 9, 8);
        let mut open = rectangle(0.0);
        open.contour_type = ContourType::OpenPlanar;
        let structure = Structure::from_contours(1, "Line", [open]);
        let index = StructureIndex::new(&structure);
        let mask = ContourRasterizer::default().rasterize(&index, &slice, &slice.pixel_lut());
        assert!(mask.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_nearest_plane_prefers_first_on_tie() {
        let structure = Structure::from_contours(1, "Box", [rectangle(1.0), rectangle(-1.0)]);
        let index = StructureIndex::new(&structure);
        let (plane, distance) = index.nearest_plane(0.0).expect("structure has planes");
        assert_eq!(plane.key, "1.00");
        assert!((distance - 1.0).abs() < 1e-12);

        let (plane, _) = index.nearest_plane(-0.8).expect("structure has planes");
        assert_eq!(plane.key, "-1.00");
    }

    #[test]
    fn test_prone_slice_maps_through_descending_lut() {
        // Prone feet-first with both axes reversed mirrors the supine case.
        let mut slice = axial_slice(0.0, 9, 8);
        slice.patient_position = PatientPosition::new("FFP");
        slice.orientation = [-1.0, 0.0, 0.0, 0.0, -1.0, 0.0];
        slice.position = [7.0, 8.0, 0.0];
        let structure = Structure::from_contours(
            1,
            "Box",
            [Contour::closed_planar(vec![
                [5.5, 5.5, 0.0],
                [2.5, 5.5, 0.0],
                [2.5, 1.5, 0.0],
                [5.5, 1.5, 0.0],
            ])],
        );
        let index = StructureIndex::new(&structure);
        let mask = ContourRasterizer::default().rasterize(&index, &slice, &slice.pixel_lut());
        for ((row, column), &value) in mask.indexed_iter() {
            let inside = (3..7).contains(&row) && (2..5).contains(&column);
            assert_eq!(value, u8::from(inside), "pixel ({row}, {column})");
        }
    }
}
