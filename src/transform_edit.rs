//! Inspector edits on a [`Transform`]. Height above ground is the quantity
//! the user sees, so rotation and scale edits move the centre to keep it.

use bevy::math::{DVec2, DVec3};

use crate::ground_height::{
    UNIT_BOX_CORNERS, UNITS_PER_METER, calculate_lowest_point_offset, euler_rotation,
    height_to_y_position, y_position_to_height,
};
use crate::scene::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationAxis {
    X,
    #[default]
    Y,
    Z,
}

impl RotationAxis {
    pub const ALL: [RotationAxis; 3] = [RotationAxis::X, RotationAxis::Y, RotationAxis::Z];

    pub fn label(self) -> &'static str {
        match self {
            RotationAxis::X => "X",
            RotationAxis::Y => "Y",
            RotationAxis::Z => "Z",
        }
    }

    pub fn get(self, t: &Transform) -> f64 {
        match self {
            RotationAxis::X => t.rotation_x,
            RotationAxis::Y => t.rotation_y,
            RotationAxis::Z => t.rotation_z,
        }
    }

    fn slot(self, t: &mut Transform) -> &mut f64 {
        match self {
            RotationAxis::X => &mut t.rotation_x,
            RotationAxis::Y => &mut t.rotation_y,
            RotationAxis::Z => &mut t.rotation_z,
        }
    }
}

/// Wrap an angle in degrees into [-180, 180] for display.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut normalized = angle % 360.0;
    if normalized > 180.0 {
        normalized -= 360.0;
    }
    if normalized < -180.0 {
        normalized += 360.0;
    }
    normalized
}

pub fn lowest_point_offset(t: &Transform) -> f64 {
    calculate_lowest_point_offset(
        t.rotation_x,
        t.rotation_y,
        t.rotation_z,
        t.scale_x,
        t.scale_y,
        t.scale_z,
    )
}

/// Clearance in centi-units between the ground and the lowest corner.
pub fn height_above_ground(t: &Transform) -> f64 {
    y_position_to_height(t.y, lowest_point_offset(t))
}

pub fn set_height(t: &mut Transform, height: f64) {
    t.y = height_to_y_position(height, lowest_point_offset(t));
}

pub fn set_rotation(t: &mut Transform, axis: RotationAxis, degrees: f64) {
    let height = height_above_ground(t);
    *axis.slot(t) = degrees;
    set_height(t, height);
}

pub fn set_uniform_scale(t: &mut Transform, scale: f64) {
    let height = height_above_ground(t);
    t.scale_x = scale;
    t.scale_y = scale;
    t.scale_z = scale;
    set_height(t, height);
}

/// Translation along the ground plane, driven by successive pointer hits
/// on that plane in renderer space.
#[derive(Debug, Clone, Copy)]
pub struct GroundDrag {
    start_hit: DVec3,
    start_pos: DVec3,
}

impl GroundDrag {
    pub fn begin(hit: DVec3, t: &Transform) -> Self {
        let (x, y, z) = t.world_translation();
        Self {
            start_hit: hit,
            start_pos: DVec3::new(x, y, z),
        }
    }

    /// New `(x, z)` in centi-units for the current pointer hit.
    pub fn update(&self, hit: DVec3) -> (f64, f64) {
        let pos = self.start_pos + (hit - self.start_hit);
        (
            (pos.x * UNITS_PER_METER).round(),
            (-pos.z * UNITS_PER_METER).round(),
        )
    }

    pub fn apply(&self, hit: DVec3, t: &mut Transform) {
        let (x, z) = self.update(hit);
        t.x = x;
        t.z = z;
    }
}

/// Centre Y in centi-units for a vertical drag that reached `world_y`
/// metres. The centre may not go below the floor.
pub fn vertical_drag_y(world_y: f64) -> f64 {
    (world_y * UNITS_PER_METER).round().max(0.0)
}

/// Top-down bounds of the transformed box in renderer metres, as
/// `(min, max)` over x and z.
pub fn footprint(t: &Transform) -> (DVec2, DVec2) {
    let rotation = euler_rotation(t.rotation_x, t.rotation_y, t.rotation_z);
    let scale = DVec3::new(t.scale_x, t.scale_y, t.scale_z);
    let (x, _, z) = t.world_translation();
    let center = DVec2::new(x, z);

    let mut min = DVec2::splat(f64::INFINITY);
    let mut max = DVec2::splat(f64::NEG_INFINITY);
    for corner in UNIT_BOX_CORNERS {
        let p = rotation * (corner * scale);
        let p = center + DVec2::new(p.x, p.z);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::SQRT_2;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn resting_cube() -> Transform {
        let mut t = Transform::default();
        set_height(&mut t, 0.0);
        t
    }

    #[test]
    fn normalizes_into_half_turn_range() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(190.0), -170.0);
        assert_eq!(normalize_angle(-190.0), 170.0);
        assert_eq!(normalize_angle(720.0), 0.0);
        assert_eq!(normalize_angle(-450.0), -90.0);
    }

    #[test]
    fn set_height_positions_the_centre() {
        let mut t = Transform::default();
        set_height(&mut t, 100.0);
        assert!(close(t.y, 150.0));
        assert!(close(height_above_ground(&t), 100.0));
    }

    #[test]
    fn rotation_keeps_the_height() {
        let mut t = Transform::default();
        set_height(&mut t, 100.0);
        set_rotation(&mut t, RotationAxis::X, 45.0);

        assert_eq!(t.rotation_x, 45.0);
        assert!((t.y - 170.71).abs() < 1e-2);
        assert!(close(height_above_ground(&t), 100.0));
    }

    #[test]
    fn rotating_a_resting_box_lifts_it_clear_of_the_floor() {
        let mut t = resting_cube();
        let before = t.y;
        set_rotation(&mut t, RotationAxis::Z, 45.0);
        assert!(t.y > before);
        assert!(close(height_above_ground(&t), 0.0));
        assert!(close(lowest_point_offset(&t) * UNITS_PER_METER + t.y, 0.0));
    }

    #[test]
    fn yaw_leaves_the_centre_alone() {
        let mut t = resting_cube();
        set_rotation(&mut t, RotationAxis::Y, 30.0);
        assert!(close(t.y, 50.0));
    }

    #[test]
    fn scaling_keeps_the_height() {
        let mut t = Transform::default();
        set_height(&mut t, 50.0);
        set_uniform_scale(&mut t, 2.0);
        assert_eq!((t.scale_x, t.scale_y, t.scale_z), (2.0, 2.0, 2.0));
        assert!(close(t.y, 150.0));
        assert!(close(height_above_ground(&t), 50.0));
    }

    #[test]
    fn axis_accessors_map_to_fields() {
        let mut t = Transform::default();
        set_rotation(&mut t, RotationAxis::X, 10.0);
        set_rotation(&mut t, RotationAxis::Y, 20.0);
        set_rotation(&mut t, RotationAxis::Z, 30.0);
        assert_eq!(RotationAxis::X.get(&t), 10.0);
        assert_eq!(RotationAxis::Y.get(&t), 20.0);
        assert_eq!(RotationAxis::Z.get(&t), 30.0);
        assert_eq!(RotationAxis::default(), RotationAxis::Y);
    }

    #[test]
    fn ground_drag_moves_by_the_hit_delta_in_app_coordinates() {
        let mut t = Transform {
            x: 100.0,
            y: 50.0,
            z: 200.0,
            ..Transform::default()
        };
        let drag = GroundDrag::begin(DVec3::new(0.3, 0.5, 0.3), &t);
        drag.apply(DVec3::new(0.8, 0.5, -0.7), &mut t);

        assert_eq!(t.x, 150.0);
        // renderer z went from -2.0 to -3.0, app z is the negation
        assert_eq!(t.z, 300.0);
        assert_eq!(t.y, 50.0);
    }

    #[test]
    fn ground_drag_rounds_to_whole_units() {
        let t = Transform::default();
        let drag = GroundDrag::begin(DVec3::ZERO, &t);
        assert_eq!(drag.update(DVec3::new(0.1234, 0.0, -0.0066)), (12.0, 1.0));
    }

    #[test]
    fn footprint_covers_the_yawed_box() {
        let mut t = Transform {
            x: 200.0,
            z: -100.0,
            ..Transform::default()
        };
        let (min, max) = footprint(&t);
        assert!(min.distance(DVec2::new(1.5, 0.5)) < 1e-9);
        assert!(max.distance(DVec2::new(2.5, 1.5)) < 1e-9);

        set_rotation(&mut t, RotationAxis::Y, 45.0);
        let (min, max) = footprint(&t);
        let half_diag = SQRT_2 / 2.0;
        assert!(close(max.x - min.x, 2.0 * half_diag));
        assert!(close(max.y - min.y, 2.0 * half_diag));
    }

    #[test]
    fn vertical_drag_stops_at_the_floor() {
        assert_eq!(vertical_drag_y(1.234), 123.0);
        assert_eq!(vertical_drag_y(-0.4), 0.0);
    }
}
