//! Region membership.
//!
//! The collector and the query layer only ever ask one question about
//! geography: is this gym inside the tracked region? [`RegionOracle`] is
//! that question; [`Geofence`] answers it for a configured polygon.

use gymwatch_db::GymRow;

/// Minimum number of vertices for a usable polygon.
const MIN_VERTICES: usize = 3;

/// Errors building a [`Geofence`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionError {
    /// Fewer than three vertices.
    #[error("polygon needs at least {MIN_VERTICES} vertices, got {0}")]
    TooFewVertices(usize),

    /// A vertex is not a finite, in-range coordinate.
    #[error("vertex {index} ({lat}, {lon}) is not a valid coordinate")]
    InvalidVertex {
        /// Position of the vertex in the ring.
        index: usize,
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lon: f64,
    },
}

/// Answers whether a point lies inside the tracked region.
pub trait RegionOracle {
    /// Whether `(lat, lon)` is inside the region.
    fn contains(&self, lat: f64, lon: f64) -> bool;
}

/// A named polygon region.
///
/// Containment uses the even-odd rule on raw latitude/longitude, which is
/// accurate for city-sized regions away from the antimeridian.
#[derive(Debug, Clone, PartialEq)]
pub struct Geofence {
    name: String,
    vertices: Vec<(f64, f64)>,
}

impl Geofence {
    /// Build a geofence from `[lat, lon]` vertices.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if the ring has fewer than three vertices or
    /// any vertex is out of range.
    pub fn new(name: &str, polygon: &[[f64; 2]]) -> Result<Self, RegionError> {
        if polygon.len() < MIN_VERTICES {
            return Err(RegionError::TooFewVertices(polygon.len()));
        }

        let mut vertices = Vec::with_capacity(polygon.len());
        for (index, &[lat, lon]) in polygon.iter().enumerate() {
            let valid = lat.is_finite()
                && lon.is_finite()
                && (-90.0..=90.0).contains(&lat)
                && (-180.0..=180.0).contains(&lon);
            if !valid {
                return Err(RegionError::InvalidVertex { index, lat, lon });
            }
            vertices.push((lat, lon));
        }

        Ok(Self {
            name: name.to_owned(),
            vertices,
        })
    }

    /// Region identifier.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RegionOracle for Geofence {
    fn contains(&self, lat: f64, lon: f64) -> bool {
        if !lat.is_finite() || !lon.is_finite() {
            return false;
        }

        let mut inside = false;
        let mut previous = self.vertices.last().copied();
        for &(lat_i, lon_i) in &self.vertices {
            if let Some((lat_j, lon_j)) = previous {
                let straddles = (lat_i > lat) != (lat_j > lat);
                if straddles {
                    let crossing = (lon_j - lon_i) * (lat - lat_i) / (lat_j - lat_i) + lon_i;
                    if lon < crossing {
                        inside = !inside;
                    }
                }
            }
            previous = Some((lat_i, lon_i));
        }
        inside
    }
}

/// Keep only the gyms the oracle places inside the region.
pub fn retain_in_region<R: RegionOracle + ?Sized>(rows: Vec<GymRow>, region: &R) -> Vec<GymRow> {
    rows.into_iter()
        .filter(|row| region.contains(row.lat, row.lon))
        .collect()
}
