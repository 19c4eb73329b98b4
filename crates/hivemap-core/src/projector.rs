//! Polar-to-screen projection for radar blips.
//!
//! A blip's bearing is measured clockwise from "up" and its distance is
//! scaled linearly so that `max_distance` lands on the outer ring. The
//! projection itself never clamps: callers keep `max_distance` at or above
//! [`MAX_BLIP_DISTANCE`], which [`RadarGeometry::new`] enforces.

use hivemap_types::{BlipEntity, BlipSnapshot, RenderPoint};

use crate::config::ConfigError;
use crate::sensor_field::MAX_BLIP_DISTANCE;

/// Largest radar drawn regardless of viewport width.
const MAX_RADAR_SIZE: f64 = 320.0;

/// Horizontal padding the host layout reserves around the radar.
const VIEWPORT_PADDING: f64 = 48.0;

/// Gap between the outer ring and the radar edge.
const RING_INSET: f64 = 20.0;

/// Floating label box size and its offset above the blip.
const LABEL_WIDTH: f64 = 148.0;
const LABEL_HEIGHT: f64 = 52.0;
const LABEL_OFFSET_X: f64 = 74.0;
const LABEL_OFFSET_Y: f64 = 38.0;
const LABEL_MARGIN: f64 = 8.0;

/// Project a blip to an offset from the radar center.
///
/// `radius = distance / max_distance * max_radius`; bearing 0 maps to
/// straight up (negative `y`).
pub fn project(entity: &BlipEntity, max_distance: f64, max_radius: f64) -> RenderPoint {
    let radius = entity.distance / max_distance * max_radius;
    let angle = (entity.angle_degrees - 90.0).to_radians();
    RenderPoint {
        x: radius * angle.cos(),
        y: radius * angle.sin(),
    }
}

/// A blip together with where it lands on the radar.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedBlip {
    /// The source reading.
    pub entity: BlipEntity,
    /// Absolute render position.
    pub position: RenderPoint,
}

/// Radar layout derived from the hosting viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarGeometry {
    size: f64,
    center: RenderPoint,
    max_radius: f64,
    max_distance: f64,
}

impl RadarGeometry {
    /// Build a geometry from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `max_distance` is shorter than
    /// the farthest possible blip, or `size` is not positive.
    pub fn new(size: f64, max_distance: f64) -> Result<Self, ConfigError> {
        if !(max_distance >= MAX_BLIP_DISTANCE) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "radar max distance {max_distance} is below blip range {MAX_BLIP_DISTANCE}"
                ),
            });
        }
        if !(size.is_finite() && size > RING_INSET * 2.0) {
            return Err(ConfigError::Invalid {
                reason: format!("radar size {size} leaves no room for rings"),
            });
        }
        let half = size / 2.0;
        Ok(Self {
            size,
            center: RenderPoint { x: half, y: half },
            max_radius: half - RING_INSET,
            max_distance,
        })
    }

    /// Size the radar for a viewport: `min(width - 48, 320)` square.
    ///
    /// # Errors
    ///
    /// See [`RadarGeometry::new`].
    pub fn for_viewport(width: f64, max_distance: f64) -> Result<Self, ConfigError> {
        Self::new((width - VIEWPORT_PADDING).min(MAX_RADAR_SIZE), max_distance)
    }

    /// Side length of the square radar.
    pub const fn size(&self) -> f64 {
        self.size
    }

    /// Center of the radar in render space.
    pub const fn center(&self) -> RenderPoint {
        self.center
    }

    /// Radius of the outer ring.
    pub const fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Range mapped to the outer ring.
    pub const fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Absolute render position of a blip.
    pub fn project(&self, entity: &BlipEntity) -> RenderPoint {
        let offset = project(entity, self.max_distance, self.max_radius);
        RenderPoint {
            x: self.center.x + offset.x,
            y: self.center.y + offset.y,
        }
    }

    /// Project every blip in a snapshot.
    pub fn project_snapshot(&self, snapshot: &BlipSnapshot) -> Vec<ProjectedBlip> {
        snapshot
            .entities
            .iter()
            .map(|entity| ProjectedBlip {
                entity: entity.clone(),
                position: self.project(entity),
            })
            .collect()
    }

    /// Radii of `rings` evenly spaced range rings, innermost first.
    pub fn ring_radii(&self, rings: u32) -> Vec<f64> {
        let total = f64::from(rings);
        (1..=rings)
            .map(|ring| self.max_radius * (f64::from(ring) / total))
            .collect()
    }

    /// Top-left corner of the floating readout for a blip at `point`,
    /// kept inside the radar square.
    pub fn label_anchor(&self, point: RenderPoint) -> RenderPoint {
        RenderPoint {
            x: (point.x - LABEL_OFFSET_X).min(self.size - LABEL_WIDTH).max(LABEL_MARGIN),
            y: (point.y - LABEL_OFFSET_Y).min(self.size - LABEL_HEIGHT).max(LABEL_MARGIN),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use hivemap_types::{BlipId, BlipKind};

    use super::*;

    const EPS: f64 = 1e-9;

    fn blip(angle_degrees: f64, distance: f64) -> BlipEntity {
        BlipEntity {
            id: BlipId::from_random_bytes([0; 16]),
            kind: BlipKind::Victim,
            angle_degrees,
            distance,
            rssi_dbm: -80,
        }
    }

    fn close(a: RenderPoint, x: f64, y: f64) -> bool {
        (a.x - x).abs() < EPS && (a.y - y).abs() < EPS
    }

    #[test]
    fn zero_degrees_points_up() {
        let p = project(&blip(0.0, 3.5), 3.5, 100.0);
        assert!(close(p, 0.0, -100.0), "{p:?}");
    }

    #[test]
    fn ninety_degrees_points_right() {
        let p = project(&blip(90.0, 1.75), 3.5, 100.0);
        assert!(close(p, 50.0, 0.0), "{p:?}");
    }

    #[test]
    fn one_eighty_points_down_and_two_seventy_left() {
        assert!(close(project(&blip(180.0, 3.5), 3.5, 10.0), 0.0, 10.0));
        assert!(close(project(&blip(270.0, 3.5), 3.5, 10.0), -10.0, 0.0));
    }

    #[test]
    fn projection_is_deterministic() {
        let b = blip(123.4, 2.2);
        assert_eq!(project(&b, 3.5, 140.0), project(&b, 3.5, 140.0));
    }

    #[test]
    fn radius_scales_linearly_and_stays_inside() {
        for step in 0..=32 {
            let distance = f64::from(step) * 0.1;
            let p = project(&blip(37.0, distance), 3.5, 140.0);
            let radius = p.x.hypot(p.y);
            assert!((radius - distance / 3.5 * 140.0).abs() < 1e-6);
            assert!(radius <= 140.0 + EPS);
        }
    }

    #[test]
    fn viewport_geometry_matches_layout() {
        let g = RadarGeometry::for_viewport(390.0, 3.5).unwrap();
        assert_eq!(g.size(), 320.0);
        assert_eq!(g.center(), RenderPoint { x: 160.0, y: 160.0 });
        assert_eq!(g.max_radius(), 140.0);

        let narrow = RadarGeometry::for_viewport(300.0, 3.5).unwrap();
        assert_eq!(narrow.size(), 252.0);
    }

    #[test]
    fn absolute_projection_offsets_by_center() {
        let g = RadarGeometry::for_viewport(390.0, 3.5).unwrap();
        let p = g.project(&blip(0.0, 3.5));
        assert!(close(p, 160.0, 20.0), "{p:?}");
    }

    #[test]
    fn short_max_distance_rejected() {
        assert!(RadarGeometry::new(320.0, 3.0).is_err());
        assert!(RadarGeometry::new(320.0, f64::NAN).is_err());
        assert!(RadarGeometry::new(10.0, 3.5).is_err());
    }

    #[test]
    fn ring_radii_are_even() {
        let g = RadarGeometry::for_viewport(390.0, 3.5).unwrap();
        assert_eq!(g.ring_radii(4), vec![35.0, 70.0, 105.0, 140.0]);
    }

    #[test]
    fn label_anchor_clamps_into_radar() {
        let g = RadarGeometry::for_viewport(390.0, 3.5).unwrap();
        let top_left = g.label_anchor(RenderPoint { x: 0.0, y: 0.0 });
        assert_eq!(top_left, RenderPoint { x: 8.0, y: 8.0 });

        let bottom_right = g.label_anchor(RenderPoint { x: 320.0, y: 320.0 });
        assert_eq!(bottom_right, RenderPoint { x: 172.0, y: 268.0 });

        let middle = g.label_anchor(RenderPoint { x: 160.0, y: 160.0 });
        assert_eq!(middle, RenderPoint { x: 86.0, y: 122.0 });
    }

    #[test]
    fn snapshot_projection_keeps_order() {
        let g = RadarGeometry::for_viewport(390.0, 3.5).unwrap();
        let snap = BlipSnapshot {
            entities: vec![blip(0.0, 1.0), blip(90.0, 2.0)],
        };
        let projected = g.project_snapshot(&snap);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected[1].entity.angle_degrees, 90.0);
    }
}
