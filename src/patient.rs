use ndarray::{Array3, s};

use crate::enums::SortBy;
use crate::patient_loader::MaskError;
use crate::slice::ImageSlice;
use crate::slice_sorter::SliceSorter;
use crate::structure::StructureSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Demographics {
    pub name: Option<String>,
    pub id: Option<String>,
    pub birth_date: Option<String>,
    pub sex: Option<String>,
}

/// Image series and structure set of one patient.
#[derive(Clone, Debug)]
pub struct Patient {
    /// Image slices in volume order
    pub images: Vec<ImageSlice>,
    pub sort_by: SortBy,
    pub structure_set: Option<StructureSet>,
    pub demographics: Demographics,
}

impl Patient {
    /// Sort `images` and pair them with their structure set.
    pub fn new(images: Vec<ImageSlice>, structure_set: Option<StructureSet>) -> Self {
        let sorted = SliceSorter::sort(images);
        Self {
            images: sorted.slices,
            sort_by: sorted.sort_by,
            structure_set,
            demographics: Demographics::default(),
        }
    }

    #[must_use]
    pub fn with_demographics(mut self, demographics: Demographics) -> Self {
        self.demographics = demographics;
        self
    }

    /// Shape (slices, rows, columns) shared by the image and mask volumes.
    ///
    /// # Errors
    ///
    /// Returns error if there are no images or their pixel shapes differ
    pub fn volume_dim(&self) -> Result<(usize, usize, usize), MaskError> {
        let first = self.images.first().ok_or(MaskError::NoImages)?;
        let (rows, columns) = first.dim();
        if self.images.iter().any(|image| image.dim() != (rows, columns)) {
            return Err(MaskError::InconsistentDimensions);
        }
        Ok((self.images.len(), rows, columns))
    }

    /// Stack the decoded pixels of the ordered slices.
    ///
    /// # Errors
    ///
    /// See [`Patient::volume_dim`]
    pub fn image_volume(&self) -> Result<Array3<u16>, MaskError> {
        let mut volume = Array3::<u16>::zeros(self.volume_dim()?);
        for (i, image) in self.images.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(&image.pixels);
        }
        Ok(volume)
    }
}
