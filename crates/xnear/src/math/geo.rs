//! Geographic coordinate math on the unit sphere.
//!
//! Latitude/longitude points are expected in `(lat, lon)` order. Distances
//! are great-circle angles in radians on the unit sphere; multiply by an
//! earth radius to obtain lengths.

use num_traits::Float;

/// Great-circle distance between two `(lat, lon)` points given in radians.
///
/// Haversine formula; numerically stable for small separations.
pub fn haversine<T: Float>(a: &[T], b: &[T]) -> T {
    let two = T::one() + T::one();

    let half_dlat = (b[0] - a[0]) / two;
    let half_dlon = (b[1] - a[1]) / two;

    let s_lat = half_dlat.sin();
    let s_lon = half_dlon.sin();
    let h = s_lat * s_lat + a[0].cos() * b[0].cos() * s_lon * s_lon;

    // Clamp guards rounding just above 1 for near-antipodal pairs.
    two * h.sqrt().min(T::one()).asin()
}

/// Map a `(lat, lon)` point in degrees onto a 3-D unit vector.
pub fn latlon_deg_to_unit_vector<T: Float>(lat_deg: T, lon_deg: T) -> [T; 3] {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    [
        lat.cos() * lon.cos(),
        lat.cos() * lon.sin(),
        lat.sin(),
    ]
}

/// Convert a chord length between unit vectors into a great-circle angle.
pub fn chord_to_arc<T: Float>(chord: T) -> T {
    let two = T::one() + T::one();
    two * (chord / two).min(T::one()).asin()
}
