//! End-to-end structure to mask conversion.

use std::path::Path;

use ndarray::{Array2, Array3, Zip, s};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::mask_volume::MaskVolume;
use crate::options::ConvertOptions;
use crate::patient::Patient;
use crate::patient_loader::{MaskError, PatientLoader};
use crate::rasterizer::{ContourRasterizer, StructureIndex};
use crate::slice::ImageSlice;

/// Convert the structure named `structure_name` found among `file_names`
/// in `dicom_directory` into a mask volume.
///
/// # Errors
///
/// See [`MaskConverter::convert`]
pub fn convert<P>(
    dicom_directory: impl AsRef<Path>,
    file_names: &[P],
    structure_name: &str,
    case_sensitive: bool,
) -> Result<MaskVolume, MaskError>
where
    P: AsRef<Path>,
{
    MaskConverter::new(ConvertOptions::default().with_case_sensitive(case_sensitive)).convert(
        dicom_directory,
        file_names,
        structure_name,
    )
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MaskConverter {
    options: ConvertOptions,
}

impl MaskConverter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Load the named files and convert one structure
    ///
    /// # Errors
    ///
    /// Returns error if the files cannot be read, hold no image, or the
    /// images do not share one pixel shape
    pub fn convert<P>(
        &self,
        dicom_directory: impl AsRef<Path>,
        file_names: &[P],
        structure_name: &str,
    ) -> Result<MaskVolume, MaskError>
    where
        P: AsRef<Path>,
    {
        let patient = PatientLoader::load_from_directory_files(dicom_directory, file_names)?;
        self.convert_patient(&patient, structure_name)
    }

    /// Load every .dcm file of a directory and convert one structure
    pub fn convert_directory(
        &self,
        dicom_directory: impl AsRef<Path>,
        structure_name: &str,
    ) -> Result<MaskVolume, MaskError> {
        let patient = PatientLoader::load_from_directory(dicom_directory)?;
        self.convert_patient(&patient, structure_name)
    }

    /// Rasterize a structure of an already loaded patient.
    ///
    /// The mask has one layer per ordered image. A missing structure gives
    /// an all zero mask.
    ///
    /// # Errors
    ///
    /// Returns error if the patient has no image or the images do not share
    /// one pixel shape
    ///
    /// # Panics
    ///
    /// Panics if a rasterized layer does not match its image shape.
    pub fn convert_patient(
        &self,
        patient: &Patient,
        structure_name: &str,
    ) -> Result<MaskVolume, MaskError> {
        let dim = patient.volume_dim()?;
        info!(
            structure = structure_name,
            slices = dim.0,
            rows = dim.1,
            columns = dim.2,
            sort_by = ?patient.sort_by,
            "Converting structure to mask"
        );

        let indices: Vec<StructureIndex<'_>> = patient
            .structure_set
            .iter()
            .flat_map(|set| set.matching(structure_name, self.options.case_sensitive))
            .map(StructureIndex::new)
            .collect();
        if indices.is_empty() {
            debug!(structure = structure_name, "No matching structure");
        }

        let rasterizer = ContourRasterizer::new(self.options.z_tolerance);
        let layers: Vec<Array2<u8>> = if self.options.parallel {
            patient
                .images
                .par_iter()
                .map(|image| Self::rasterize_slice(image, &indices, &rasterizer))
                .collect()
        } else {
            patient
                .images
                .iter()
                .map(|image| Self::rasterize_slice(image, &indices, &rasterizer))
                .collect()
        };

        let mut volume = Array3::<u8>::zeros(dim);
        for (i, layer) in layers.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(layer);
        }

        let volume = MaskVolume::new(volume);
        info!(voxels = volume.voxel_count(), "Mask conversion complete");
        Ok(volume)
    }

    /// OR the masks of every matching structure on one image.
    fn rasterize_slice(
        image: &ImageSlice,
        indices: &[StructureIndex<'_>],
        rasterizer: &ContourRasterizer,
    ) -> Array2<u8> {
        let mut layer = Array2::<u8>::zeros(image.dim());
        if indices.is_empty() {
            return layer;
        }

        let lut = image.pixel_lut();
        for index in indices {
            let mask = rasterizer.rasterize(index, image, &lut);
            Zip::from(&mut layer)
                .and(&mask)
                .for_each(|value, &inside| *value |= inside);
        }
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::fixtures::axial_slice;
    use crate::structure::{Contour, Structure, StructureSet};

    fn square(z: f64, from: f64, to: f64) -> Contour {
        Contour::closed_planar(vec![[from, from, z], [to, from, z], [to, to, z], [from, to, z]])
    }

    fn patient(structures: Vec<Structure>) -> Patient {
        let images = (0..4).map(|i| axial_slice(f64::from(i) * 2.0, 8, 8)).collect();
        Patient::new(images, Some(StructureSet::new(structures)))
    }

    #[test]
    fn test_missing_structure_gives_zero_volume() {
        let patient = patient(vec![Structure::from_contours(1, "Liver", [square(2.0, 0.5, 3.5)])]);
        let volume = MaskConverter::default()
            .convert_patient(&patient, "liver")
            .expect("patient has images");
        assert_eq!(volume.dim(), (4, 8, 8));
        assert_eq!(volume.voxel_count(), 0);
    }

    #[test]
    fn test_structure_lands_on_matching_layer() {
        let patient = patient(vec![Structure::from_contours(1, "Liver", [square(2.0, 0.5, 3.5)])]);
        let volume = MaskConverter::default()
            .convert_patient(&patient, "Liver")
            .expect("patient has images");

        // Head-first order puts z = 2.0 on the third layer.
        let layers: Vec<usize> = volume
            .data()
            .outer_iter()
            .map(|layer| layer.iter().filter(|&&v| v == 1).count())
            .collect();
        assert_eq!(layers, [0, 0, 9, 0]);
    }

    #[test]
    fn test_matching_structures_are_combined() {
        let patient = patient(vec![
            Structure::from_contours(1, "Liver", [square(0.0, 0.5, 3.5)]),
            Structure::from_contours(2, "LIVER", [square(0.0, 1.5, 4.5)]),
        ]);
        let converter = MaskConverter::new(
            ConvertOptions::default()
                .with_case_sensitive(false)
                .with_parallel(false),
        );
        let volume = converter
            .convert_patient(&patient, "liver")
            .expect("patient has images");
        assert!(volume.data().iter().all(|&v| v <= 1));
        assert_eq!(volume.voxel_count(), 9 + 9 - 4);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let patient = patient(vec![Structure::from_contours(
            1,
            "Liver",
            [square(0.0, 0.5, 3.5), square(4.0, 1.5, 4.5), square(6.2, 0.5, 2.5)],
        )]);
        let parallel = MaskConverter::default()
            .convert_patient(&patient, "Liver")
            .expect("patient has images");
        let sequential = MaskConverter::new(ConvertOptions::default().with_parallel(false))
            .convert_patient(&patient, "Liver")
            .expect("patient has images");
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.voxel_count(), 9 + 9 + 4);
    }

    #[test]
    fn test_custom_tolerance() {
        let patient = patient(vec![Structure::from_contours(1, "Liver", [square(0.8, 0.5, 3.5)])]);
        let strict = MaskConverter::default()
            .convert_patient(&patient, "Liver")
            .expect("patient has images");
        assert_eq!(strict.voxel_count(), 0);

        let loose = MaskConverter::new(ConvertOptions::default().with_z_tolerance(1.0))
            .convert_patient(&patient, "Liver")
            .expect("patient has images");
        assert_eq!(loose.voxel_count(), 9);
    }
}
