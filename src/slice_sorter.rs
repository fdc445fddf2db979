use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::enums::SortBy;
use crate::slice::ImageSlice;

/// Image slices in their final order, with the key that produced it.
#[derive(Clone, Debug)]
pub struct SortedSlices {
    pub slices: Vec<ImageSlice>,
    /// [`SortBy::None`] means no key could tell the slices apart and the
    /// input order was kept.
    pub sort_by: SortBy,
}

pub struct SliceSorter;

impl SliceSorter {
    /// Order an unordered series.
    ///
    /// Parallel slices with distinct positions are sorted by z, descending
    /// for head-first patients. Otherwise InstanceNumber and then
    /// AcquisitionNumber are tried. Equal keys keep their input order.
    pub fn sort(slices: Vec<ImageSlice>) -> SortedSlices {
        let sort_by = Self::detect_sort_key(&slices);
        if slices.len() < 2 {
            return SortedSlices { slices, sort_by };
        }

        if matches!(sort_by, SortBy::None) {
            warn!(
                slices = slices.len(),
                "Slices share orientation, position, instance and acquisition number; keeping input order"
            );
            return SortedSlices { slices, sort_by };
        }

        let descending = matches!(sort_by, SortBy::ImagePositionPatient)
            && slices
                .last()
                .is_some_and(|slice| slice.patient_position.is_head_first());
        debug!(?sort_by, descending, "Sorting image slices");

        let mut slices_with_order: Vec<_> = slices
            .into_iter()
            .map(|slice| (Self::get_sort_order(&slice, sort_by), slice))
            .collect();
        slices_with_order.sort_by(|a, b| {
            let ordering = a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        SortedSlices {
            slices: slices_with_order
                .into_iter()
                .map(|(_, slice)| slice)
                .collect(),
            sort_by,
        }
    }

    /// Pick the ordering key from the first two slices.
    pub fn detect_sort_key(slices: &[ImageSlice]) -> SortBy {
        let [first, second, ..] = slices else {
            return SortBy::ImagePositionPatient;
        };

        let parallel = !rounded_difference(&second.orientation, &first.orientation)
            && rounded_difference(&second.position, &first.position);

        if parallel {
            SortBy::ImagePositionPatient
        } else if first.instance_number != second.instance_number {
            SortBy::InstanceNumber
        } else if first.acquisition_number != second.acquisition_number {
            SortBy::AcquisitionNumber
        } else {
            SortBy::None
        }
    }

    fn get_sort_order(slice: &ImageSlice, sort_by: SortBy) -> Option<f64> {
        match sort_by {
            SortBy::ImagePositionPatient => Some(slice.position[2]),
            SortBy::InstanceNumber => slice.instance_number.map(f64::from),
            SortBy::AcquisitionNumber => slice.acquisition_number.map(f64::from),
            SortBy::None => None,
        }
    }
}

/// Whether any component differs by an amount that rounds to a nonzero integer.
fn rounded_difference(a: &[f64], b: &[f64]) -> bool {
    a.iter()
        .zip(b)
        .any(|(a, b)| (a - b).round_ties_even() != 0.0)
}
