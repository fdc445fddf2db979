use crate::enums::ContourType;
use crate::patient::{Demographics, Patient};
use crate::slice::{ImageSlice, PatientPosition};
use crate::structure::{Contour, Structure, StructureSet};

use dicom::{
    core::Tag,
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::{tags, uids};
use ndarray::{Array2, s};
use rayon::prelude::*;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("No valid DICOM images found")]
    NoImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Missing or invalid attribute {tag}")]
    MissingAttribute { tag: Tag },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pixel data error: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),
}

pub struct PatientLoader;

impl PatientLoader {
    /// Build a patient from DICOM objects
    ///
    /// Objects carrying ImageOrientationPatient (RT Dose excluded) become
    /// image slices, an RTSTRUCT object becomes the structure set. Anything
    /// else is skipped.
    ///
    /// # Errors
    ///
    /// Returns error if no image is found or an image lacks geometry or
    /// decodable pixel data
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
    ) -> Result<Patient, MaskError> {
        let mut images = Vec::new();
        let mut structure_set = None;
        let mut demographics = None;

        for dicom_object in dicom_objects {
            if Self::is_image(dicom_object) {
                if demographics.is_none() {
                    demographics = Some(Self::read_demographics(dicom_object));
                }
                images.push(Self::read_image(dicom_object)?);
                continue;
            }

            match read_string(dicom_object, tags::MODALITY).as_deref() {
                Some("RTSTRUCT") => structure_set = Some(Self::read_structure_set(dicom_object)),
                modality => debug!(?modality, "Skipping DICOM object"),
            }
        }

        if images.is_empty() {
            return Err(MaskError::NoImages);
        }

        Ok(Patient::new(images, structure_set).with_demographics(demographics.unwrap_or_default()))
    }

    /// Load a patient from file paths. Paths that are not files or cannot
    /// be read as DICOM are skipped.
    pub fn load_from_file_paths<P>(paths: &[P]) -> Result<Patient, MaskError>
    where
        P: AsRef<Path> + Sync,
    {
        let objects: Vec<_> = paths
            .par_iter()
            .map(|path| -> &Path { path.as_ref() })
            .filter(|path| {
                let is_file = path.is_file();
                if !is_file {
                    warn!(path = %path.display(), "Skipping missing DICOM file");
                }
                is_file
            })
            .filter_map(|path| match open_file(path) {
                Ok(dicom_object) => Some(dicom_object),
                Err(error) => {
                    warn!(path = %path.display(), %error, "Skipping unreadable DICOM file");
                    None
                }
            })
            .collect();

        Self::load_from_dicom_objects(&objects)
    }

    /// Load a patient from the named files inside `directory`
    pub fn load_from_directory_files<P>(
        directory: impl AsRef<Path>,
        file_names: &[P],
    ) -> Result<Patient, MaskError>
    where
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = file_names
            .iter()
            .map(|name| directory.as_ref().join(name))
            .collect();
        Self::load_from_file_paths(&paths)
    }

    /// Load a patient from a directory containing .dcm files
    pub fn load_from_directory(path: impl AsRef<Path>) -> Result<Patient, MaskError> {
        let paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(MaskError::NoImages);
        }

        Self::load_from_file_paths(&paths)
    }

    fn is_image(dicom_object: &InMemDicomObject) -> bool {
        let is_dose = read_string(dicom_object, tags::SOP_CLASS_UID)
            .is_some_and(|uid| uid.trim_end_matches('\0') == uids::RT_DOSE_STORAGE);
        dicom_object.element(tags::IMAGE_ORIENTATION_PATIENT).is_ok() && !is_dose
    }

    fn read_image(
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Result<ImageSlice, MaskError> {
        Ok(ImageSlice {
            position: read_array(dicom_object, tags::IMAGE_POSITION_PATIENT)?,
            orientation: read_array(dicom_object, tags::IMAGE_ORIENTATION_PATIENT)?,
            pixel_spacing: read_array(dicom_object, tags::PIXEL_SPACING)?,
            instance_number: read_int(dicom_object, tags::INSTANCE_NUMBER),
            acquisition_number: read_int(dicom_object, tags::ACQUISITION_NUMBER),
            patient_position: PatientPosition::new(
                read_string(dicom_object, tags::PATIENT_POSITION).unwrap_or_default(),
            ),
            pixels: Self::decode_image(dicom_object)?,
        })
    }

    fn decode_image(
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Result<Array2<u16>, MaskError> {
        let pixel_data = dicom_object.decode_pixel_data()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
        let frames = pixel_data.to_ndarray_with_options::<u16>(&options)?;
        Ok(frames.slice_move(s![0, .., .., 0]))
    }

    fn read_demographics(dicom_object: &InMemDicomObject) -> Demographics {
        Demographics {
            name: read_string(dicom_object, tags::PATIENT_NAME),
            id: read_string(dicom_object, tags::PATIENT_ID),
            birth_date: read_string(dicom_object, tags::PATIENT_BIRTH_DATE),
            sex: read_string(dicom_object, tags::PATIENT_SEX),
        }
    }

    /// Read the structures of an RTSTRUCT object
    ///
    /// Structures come from the Structure Set ROI Sequence; their contours
    /// are matched through the ROI Contour Sequence by ROI number.
    pub fn read_structure_set(dicom_object: &InMemDicomObject) -> StructureSet {
        let mut contours: HashMap<i32, Vec<Contour>> =
            sequence_items(dicom_object, tags::ROI_CONTOUR_SEQUENCE)
                .iter()
                .filter_map(|item| {
                    let number = read_int(item, tags::REFERENCED_ROI_NUMBER)?;
                    let contours = sequence_items(item, tags::CONTOUR_SEQUENCE)
                        .iter()
                        .filter_map(Self::read_contour)
                        .collect();
                    Some((number, contours))
                })
                .collect();

        let interpreted_types: HashMap<i32, String> =
            sequence_items(dicom_object, tags::RTROI_OBSERVATIONS_SEQUENCE)
                .iter()
                .filter_map(|item| {
                    Some((
                        read_int(item, tags::REFERENCED_ROI_NUMBER)?,
                        read_string(item, tags::RTROI_INTERPRETED_TYPE)?,
                    ))
                })
                .collect();

        let structures = sequence_items(dicom_object, tags::STRUCTURE_SET_ROI_SEQUENCE)
            .iter()
            .filter_map(|item| {
                let number = read_int(item, tags::ROI_NUMBER)?;
                let name = read_string(item, tags::ROI_NAME).unwrap_or_default();
                let structure = Structure::from_contours(
                    number,
                    name,
                    contours.remove(&number).unwrap_or_default(),
                );
                Some(match interpreted_types.get(&number) {
                    Some(interpreted_type) => structure.with_interpreted_type(interpreted_type),
                    None => structure,
                })
            })
            .collect();

        StructureSet::new(structures)
    }

    fn read_contour(item: &InMemDicomObject) -> Option<Contour> {
        let contour_type = ContourType::parse(&read_string(item, tags::CONTOUR_GEOMETRIC_TYPE)?);
        let points = read_floats(item, tags::CONTOUR_DATA)?
            .chunks_exact(3)
            .map(|xyz| [xyz[0], xyz[1], xyz[2]])
            .collect();
        Some(Contour::new(contour_type, points))
    }
}

fn sequence_items(dicom_object: &InMemDicomObject, tag: Tag) -> &[InMemDicomObject] {
    dicom_object
        .element(tag)
        .ok()
        .and_then(|element| element.value().items())
        .unwrap_or(&[])
}

fn read_string(dicom_object: &InMemDicomObject, tag: Tag) -> Option<String> {
    let value = dicom_object.element(tag).ok()?.to_str().ok()?;
    Some(value.trim().to_owned())
}

fn read_int(dicom_object: &InMemDicomObject, tag: Tag) -> Option<i32> {
    dicom_object.element(tag).ok()?.to_int::<i32>().ok()
}

fn read_floats(dicom_object: &InMemDicomObject, tag: Tag) -> Option<Vec<f64>> {
    dicom_object.element(tag).ok()?.to_multi_float64().ok()
}

fn read_array<const N: usize>(
    dicom_object: &InMemDicomObject,
    tag: Tag,
) -> Result<[f64; N], MaskError> {
    read_floats(dicom_object, tag)
        .and_then(|values| values.get(..N)?.try_into().ok())
        .ok_or(MaskError::MissingAttribute { tag })
}
