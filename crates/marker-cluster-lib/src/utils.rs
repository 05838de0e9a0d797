//! Geographic coordinates and the spherical Mercator projection used by the clustering algorithms

use crate::{ClusterError, Result};
use geo::Point;
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// A geographic position in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a position, rejecting non-finite or out-of-range coordinates
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        let position = Self::new(latitude, longitude);
        if position.is_valid() {
            Ok(position)
        } else {
            Err(ClusterError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Check that latitude is within [-90, 90] and longitude within [-180, 180]
    #[inline]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<Point<f64>> for LatLng {
    /// Interprets the point as `(x, y) = (longitude, latitude)`, as `geo` does
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<LatLng> for Point<f64> {
    fn from(position: LatLng) -> Self {
        Point::new(position.longitude, position.latitude)
    }
}

/// Maps geographic positions onto a square plane of side `world_width` and back
///
/// `x` grows eastwards from 0 at the antimeridian, `y` grows southwards from 0 at the
/// northern Mercator limit, so the whole world is `[0, world_width] x [0, world_width]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalMercatorProjection {
    world_width: f64,
}

impl SphericalMercatorProjection {
    pub const fn new(world_width: f64) -> Self {
        Self { world_width }
    }

    #[inline]
    pub fn world_width(&self) -> f64 {
        self.world_width
    }

    /// Project a position, keeping `y` inside the world square
    ///
    /// Equivalent to clamping latitude to ±[`MAX_LATITUDE`]. Without the clamp the poles
    /// map to `y = ±inf`, which no quadtree can hold.
    #[inline]
    pub fn to_point(&self, position: LatLng) -> Point<f64> {
        let point = self.to_point_unclamped(position);
        Point::new(point.x(), point.y().max(0.0).min(self.world_width))
    }

    /// Project a position without clamping (±90° latitude yields infinite `y`)
    #[inline]
    pub fn to_point_unclamped(&self, position: LatLng) -> Point<f64> {
        let x = position.longitude / 360.0 + 0.5;
        let sin_y = position.latitude.to_radians().sin();
        let y = 0.5 - ((1.0 + sin_y) / (1.0 - sin_y)).ln() / (4.0 * PI);

        Point::new(x * self.world_width, y * self.world_width)
    }

    /// Inverse of [`Self::to_point`] (Gudermannian function)
    #[inline]
    pub fn to_lat_lng(&self, point: Point<f64>) -> LatLng {
        let x = point.x() / self.world_width - 0.5;
        let longitude = x * 360.0;

        let y = 0.5 - point.y() / self.world_width;
        let latitude = 90.0 - ((-y * 2.0 * PI).exp().atan() * 2.0).to_degrees();

        LatLng::new(latitude, longitude)
    }
}

/// Interpolate between two positions, crossing the antimeridian when that is shorter
///
/// `fraction` is expected in `[0, 1]`; the resulting longitude may fall outside
/// `[-180, 180]` when the path wraps.
pub fn interpolate(from: LatLng, to: LatLng, fraction: f64) -> LatLng {
    let latitude = (to.latitude - from.latitude) * fraction + from.latitude;

    let mut longitude_delta = to.longitude - from.longitude;
    if longitude_delta.abs() > 180.0 {
        longitude_delta -= longitude_delta.signum() * 360.0;
    }
    let longitude = longitude_delta * fraction + from.longitude;

    LatLng::new(latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_point_origin() {
        let projection = SphericalMercatorProjection::new(1.0);
        let point = projection.to_point(LatLng::new(0.0, 0.0));
        assert!((point.x() - 0.5).abs() < 1e-12);
        assert!((point.y() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_to_point_world_edges() {
        let projection = SphericalMercatorProjection::new(256.0);

        let west = projection.to_point(LatLng::new(0.0, -180.0));
        assert!(west.x().abs() < 1e-9);

        let east = projection.to_point(LatLng::new(0.0, 180.0));
        assert!((east.x() - 256.0).abs() < 1e-9);

        // North is up, so the northern limit is y = 0
        let north = projection.to_point(LatLng::new(MAX_LATITUDE, 0.0));
        assert!(north.y().abs() < 1e-6);
        let south = projection.to_point(LatLng::new(-MAX_LATITUDE, 0.0));
        assert!((south.y() - 256.0).abs() < 1e-6);
    }

    #[test]
    fn test_roundtrip() {
        for world_width in [1.0, 3.0, 256.0, 1_000_000.0] {
            let projection = SphericalMercatorProjection::new(world_width);
            let mut lat = -84.9;
            while lat < 85.0 {
                let mut lng = -180.0;
                while lng <= 180.0 {
                    let position = LatLng::new(lat, lng);
                    let back = projection.to_lat_lng(projection.to_point(position));
                    assert!((back.latitude - lat).abs() < 1e-6, "lat {lat} lng {lng}");
                    assert!((back.longitude - lng).abs() < 1e-6, "lat {lat} lng {lng}");
                    lng += 7.5;
                }
                lat += 4.3;
            }
        }
    }

    #[test]
    fn test_poles_are_clamped() {
        let projection = SphericalMercatorProjection::new(1.0);
        let north = projection.to_point(LatLng::new(90.0, 0.0));
        assert!(north.y().is_finite());
        assert!(north.y() >= 0.0);

        let unclamped = projection.to_point_unclamped(LatLng::new(90.0, 0.0));
        assert!(!unclamped.y().is_finite());
    }

    #[test]
    fn test_lat_lng_validation() {
        assert!(LatLng::try_new(45.0, 90.0).is_ok());
        assert!(LatLng::try_new(91.0, 0.0).is_err());
        assert!(LatLng::try_new(0.0, -180.5).is_err());
        assert!(LatLng::try_new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_geo_point_conversion() {
        let position = LatLng::new(51.5, -0.12);
        let point: Point<f64> = position.into();
        assert_eq!(point.x(), -0.12);
        assert_eq!(point.y(), 51.5);
        assert_eq!(LatLng::from(point), position);
    }

    #[test]
    fn test_interpolate_plain() {
        let from = LatLng::new(0.0, 10.0);
        let to = LatLng::new(10.0, 20.0);
        let mid = interpolate(from, to, 0.5);
        assert!((mid.latitude - 5.0).abs() < 1e-12);
        assert!((mid.longitude - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_across_antimeridian() {
        // 170E -> 170W is 20 degrees eastwards, not 340 westwards
        let from = LatLng::new(0.0, 170.0);
        let to = LatLng::new(0.0, -170.0);
        let mid = interpolate(from, to, 0.5);
        assert!((mid.longitude - 180.0).abs() < 1e-12);

        let back = interpolate(to, from, 0.5);
        assert!((back.longitude + 180.0).abs() < 1e-12);

        let end = interpolate(from, to, 1.0);
        assert!((end.longitude - 190.0).abs() < 1e-12);
    }
}
