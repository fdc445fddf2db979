/// Axis along which a [`MaskVolume`](crate::mask_volume::MaskVolume) is cut.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}

/// Key used to order the image slices of a series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    InstanceNumber,
    AcquisitionNumber,
    /// No usable key; the input order is kept.
    None,
}

/// Geometric type of a contour in a structure set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContourType {
    ClosedPlanar,
    OpenPlanar,
    OpenNonPlanar,
    Point,
    Other(String),
}

impl ContourType {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "CLOSED_PLANAR" => Self::ClosedPlanar,
            "OPEN_PLANAR" => Self::OpenPlanar,
            "OPEN_NONPLANAR" => Self::OpenNonPlanar,
            "POINT" => Self::Point,
            other => Self::Other(other.to_owned()),
        }
    }
}
