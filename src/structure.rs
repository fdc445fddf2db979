//! RT structure set records.
//!
//! A [`Structure`] groups its contours into [`ContourPlane`]s keyed by the
//! z coordinate of their first vertex, formatted with two decimals. Keys are
//! unique and keep the order in which the planes first appear.

use crate::enums::ContourType;

/// Key of the contour plane at `z`.
pub fn plane_key(z: f64) -> String {
    format!("{z:.2}")
}

/// One outline with patient-space vertices (x, y, z).
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    pub contour_type: ContourType,
    pub points: Vec<[f64; 3]>,
}

impl Contour {
    pub fn new(contour_type: ContourType, points: Vec<[f64; 3]>) -> Self {
        Self {
            contour_type,
            points,
        }
    }

    pub fn closed_planar(points: Vec<[f64; 3]>) -> Self {
        Self::new(ContourType::ClosedPlanar, points)
    }
}

/// All contours of a structure sharing one plane key.
#[derive(Clone, Debug, PartialEq)]
pub struct ContourPlane {
    pub key: String,
    pub z: f64,
    pub contours: Vec<Contour>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    /// ROI Number
    pub number: i32,
    pub name: String,
    /// RT ROI Interpreted Type, e.g. `ORGAN` or `PTV`
    pub interpreted_type: Option<String>,
    planes: Vec<ContourPlane>,
}

impl Structure {
    /// Group `contours` into planes. Contours without vertices are dropped.
    pub fn from_contours(
        number: i32,
        name: impl Into<String>,
        contours: impl IntoIterator<Item = Contour>,
    ) -> Self {
        let mut planes: Vec<ContourPlane> = Vec::new();
        for contour in contours {
            let Some(first) = contour.points.first() else {
                continue;
            };
            let key = plane_key(first[2]);
            match planes.iter_mut().find(|plane| plane.key == key) {
                Some(plane) => plane.contours.push(contour),
                None => planes.push(ContourPlane {
                    z: key.parse().unwrap_or(first[2]),
                    key,
                    contours: vec![contour],
                }),
            }
        }

        Self {
            number,
            name: name.into(),
            interpreted_type: None,
            planes,
        }
    }

    #[must_use]
    pub fn with_interpreted_type(mut self, interpreted_type: impl Into<String>) -> Self {
        self.interpreted_type = Some(interpreted_type.into());
        self
    }

    pub fn planes(&self) -> &[ContourPlane] {
        &self.planes
    }

    pub fn plane(&self, key: &str) -> Option<&ContourPlane> {
        self.planes.iter().find(|plane| plane.key == key)
    }

    /// Smallest positive distance between adjacent planes, 0 with fewer than two planes.
    pub fn thickness(&self) -> f64 {
        let mut z: Vec<f64> = self.planes.iter().map(|plane| plane.z).collect();
        z.sort_by(f64::total_cmp);
        z.windows(2)
            .map(|pair| pair[1] - pair[0])
            .filter(|delta| *delta > 0.0)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    pub fn matches(&self, name: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.name == name
        } else {
            self.name.to_lowercase() == name.to_lowercase()
        }
    }
}

/// Structures of an RTSTRUCT object in ROI sequence order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructureSet {
    structures: Vec<Structure>,
}

impl StructureSet {
    pub fn new(structures: Vec<Structure>) -> Self {
        Self { structures }
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn get(&self, number: i32) -> Option<&Structure> {
        self.structures.iter().find(|s| s.number == number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Structure> {
        self.structures.iter()
    }

    /// Structures named `name`
    pub fn matching<'a>(
        &'a self,
        name: &'a str,
        case_sensitive: bool,
    ) -> impl Iterator<Item = &'a Structure> {
        self.structures
            .iter()
            .filter(move |s| s.matches(name, case_sensitive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(z: f64) -> Contour {
        Contour::closed_planar(vec![
            [0.0, 0.0, z],
            [1.0, 0.0, z],
            [1.0, 1.0, z],
            [0.0, 1.0, z],
        ])
    }

    #[test]
    fn test_planes_grouped_by_key() {
        let structure = Structure::from_contours(
            1,
            "Liver",
            [square(2.5), square(0.0), square(2.501), square(-2.5)],
        );
        let keys: Vec<&str> = structure.planes().iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["2.50", "0.00", "-2.50"]);
        assert_eq!(structure.plane("2.50").map(|p| p.contours.len()), Some(2));
        assert!(structure.plane("1.00").is_none());
    }

    #[test]
    fn test_empty_contours_are_dropped() {
        let structure = Structure::from_contours(
            3,
            "Empty",
            [Contour::closed_planar(Vec::new())],
        );
        assert!(structure.planes().is_empty());
        assert!(structure.thickness().abs() < f64::EPSILON);
    }

    #[test]
    fn test_thickness() {
        let structure = Structure::from_contours(
            1,
            "Liver",
            [square(6.0), square(0.0), square(3.0), square(4.5)],
        );
        assert!((structure.thickness() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_name_matching() {
        let set = StructureSet::new(vec![
            Structure::from_contours(1, "Liver", [square(0.0)]),
            Structure::from_contours(2, "Spleen", [square(0.0)]),
        ]);
        assert_eq!(set.matching("Liver", true).count(), 1);
        assert_eq!(set.matching("liver", true).count(), 0);
        assert_eq!(set.matching("liver", false).count(), 1);
        assert_eq!(set.get(2).map(|s| s.name.as_str()), Some("Spleen"));
        assert_eq!(set.len(), 2);
    }
}
