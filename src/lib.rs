//! # DICOM-mask library
//!
//! This crate converts a named structure of a DICOM RT structure set into a
//! binary mask volume aligned with the image series it was drawn on.
//!
//! It builds on the dicom-rs ecosystem to read the image slices and the
//! RTSTRUCT object of a patient. The image slices are ordered the way the
//! volume is reconstructed:
//!  - by ImagePositionPatient z for parallel slices, descending for
//!    head-first patients
//!  - by InstanceNumber, then AcquisitionNumber otherwise
//!
//! Every closed planar contour on the plane closest to a slice (within
//! 0.5 mm by default) is mapped to pixel coordinates through the slice's
//! patient-to-pixel lookup table and filled. The resulting volume has shape
//! (slices, rows, columns) with values 0 and 1. Slices are rasterized in
//! parallel using rayon unless disabled in [`ConvertOptions`].
//!
//! Contour types other than `CLOSED_PLANAR` are ignored and no
//! interpolation between slices is performed.
//!
//! # Examples
//!
//! ## Converting a structure of a patient directory
//!
//! ```no_run
//! # use dicom_mask::{ConvertOptions, MaskConverter, Orientation};
//! let converter = MaskConverter::new(ConvertOptions::default().with_case_sensitive(false));
//! let mask = converter
//!     .convert_directory("dicom", "liver")
//!     .expect("should have converted the structure");
//! let image = mask
//!     .get_image_from_axis(mask.dim().0 / 2, Orientation::Axial)
//!     .expect("should have returned image at center of volume");
//! image.save("mask.png").expect("should have saved image");
//! ```

pub mod converter;
pub mod enums;
pub mod mask_volume;
pub mod options;
pub mod patient;
pub mod patient_loader;
pub mod pixel_lut;
pub mod rasterizer;
pub mod slice;
pub mod slice_sorter;
pub mod structure;

pub use converter::{MaskConverter, convert};
pub use enums::{ContourType, Orientation, SortBy};
pub use mask_volume::MaskVolume;
pub use options::ConvertOptions;
pub use patient::{Demographics, Patient};
pub use patient_loader::{MaskError, PatientLoader};
pub use pixel_lut::PixelLut;
pub use rasterizer::{ContourRasterizer, StructureIndex};
pub use slice::{ImageSlice, PatientPosition};
pub use slice_sorter::{SliceSorter, SortedSlices};
pub use structure::{Contour, ContourPlane, Structure, StructureSet};
