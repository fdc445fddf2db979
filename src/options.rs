/// Default maximum distance between a slice and the contour plane drawn on it.
pub const DEFAULT_Z_TOLERANCE: f64 = 0.5;

/// Settings for a mask conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvertOptions {
    /// Compare structure names exactly; otherwise compare them lowercased.
    pub case_sensitive: bool,
    /// Planes at this distance or further from a slice are ignored for it.
    pub z_tolerance: f64,
    /// Rasterize slices on the rayon thread pool.
    pub parallel: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            z_tolerance: DEFAULT_Z_TOLERANCE,
            parallel: true,
        }
    }
}

impl ConvertOptions {
    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    #[must_use]
    pub fn with_z_tolerance(mut self, z_tolerance: f64) -> Self {
        self.z_tolerance = z_tolerance;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
