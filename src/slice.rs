use ndarray::Array2;

use crate::pixel_lut::PixelLut;

/// Patient position descriptor of an image, e.g. `HFS` or `FFP`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientPosition(String);

impl PatientPosition {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self(descriptor.into().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_prone(&self) -> bool {
        self.0.to_lowercase().contains('p')
    }

    pub fn is_feet_first(&self) -> bool {
        self.0.to_lowercase().contains("ff")
    }

    pub fn is_head_first(&self) -> bool {
        self.0.to_lowercase().contains("hf")
    }
}

/// One decoded cross-sectional image and its patient geometry.
#[derive(Clone, Debug)]
pub struct ImageSlice {
    /// ImagePositionPatient (x, y, z) of the first transmitted pixel.
    pub position: [f64; 3],
    /// ImageOrientationPatient row and column direction cosines.
    pub orientation: [f64; 6],
    pub pixel_spacing: [f64; 2],
    pub instance_number: Option<i32>,
    pub acquisition_number: Option<i32>,
    pub patient_position: PatientPosition,
    /// First frame, shape (rows, columns).
    pub pixels: Array2<u16>,
}

impl ImageSlice {
    /// Pixel shape (rows, columns)
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    /// Slice position along z, rounded the way structure plane keys are.
    pub fn plane_z(&self) -> f64 {
        crate::structure::plane_key(self.position[2])
            .parse()
            .unwrap_or(self.position[2])
    }

    pub fn pixel_lut(&self) -> PixelLut {
        let (rows, columns) = self.dim();
        PixelLut::from_geometry(
            self.position,
            self.orientation,
            self.pixel_spacing,
            rows,
            columns,
        )
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::axial_slice;
    use super::*;

    #[test]
    fn test_patient_position_flags() {
        let hfs = PatientPosition::new("HFS");
        assert!(hfs.is_head_first());
        assert!(!hfs.is_prone());
        assert!(!hfs.is_feet_first());

        let ffp = PatientPosition::new("ffp ");
        assert!(ffp.is_feet_first());
        assert!(ffp.is_prone());
        assert!(!ffp.is_head_first());
        assert_eq!(ffp.as_str(), "ffp");
    }

    #[test]
    fn test_plane_z_is_rounded() {
        let slice = axial_slice(-12.3456, 4, 4);
        assert!((slice.plane_z() + 12.35).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_lut_matches_shape() {
        let slice = axial_slice(0.0, 3, 5);
        let lut = slice.pixel_lut();
        assert_eq!(lut.x().len(), 5);
        assert_eq!(lut.y().len(), 3);
    }
}
