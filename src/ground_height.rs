use bevy::math::{DQuat, DVec3, EulerRot};

/// Internal position units per metre. Transforms store positions in
/// centi-units while scale and the lowest-point offset are in metres.
pub const UNITS_PER_METER: f64 = 100.0;

/// Corners of the unit box every scene object is modelled as.
pub const UNIT_BOX_CORNERS: [DVec3; 8] = [
    DVec3::new(-0.5, -0.5, -0.5),
    DVec3::new(-0.5, -0.5, 0.5),
    DVec3::new(-0.5, 0.5, -0.5),
    DVec3::new(-0.5, 0.5, 0.5),
    DVec3::new(0.5, -0.5, -0.5),
    DVec3::new(0.5, -0.5, 0.5),
    DVec3::new(0.5, 0.5, -0.5),
    DVec3::new(0.5, 0.5, 0.5),
];

/// Rotation used for both rendering and height math. The axis order must
/// stay XYZ in both places or they disagree on which corner is lowest.
pub fn euler_rotation(rotation_x: f64, rotation_y: f64, rotation_z: f64) -> DQuat {
    DQuat::from_euler(
        EulerRot::XYZ,
        rotation_x.to_radians(),
        rotation_y.to_radians(),
        rotation_z.to_radians(),
    )
}

/// How far below its centre the lowest corner of a scaled, rotated unit box
/// lies, in metres. Negative for any box with height, zero when `scale_y`
/// collapses it and there is no rotation.
///
/// Scale is applied in local space before rotation. Inputs are not
/// validated; NaN and infinities propagate.
pub fn calculate_lowest_point_offset(
    rotation_x: f64,
    rotation_y: f64,
    rotation_z: f64,
    scale_x: f64,
    scale_y: f64,
    scale_z: f64,
) -> f64 {
    let rotation = euler_rotation(rotation_x, rotation_y, rotation_z);
    let scale = DVec3::new(scale_x, scale_y, scale_z);

    let mut min_y = f64::INFINITY;
    for corner in UNIT_BOX_CORNERS {
        let y = (rotation * (corner * scale)).y;
        // negated so a NaN corner wins
        if !(y >= min_y) {
            min_y = y;
        }
    }
    min_y
}

/// Centre Y (centi-units) for a desired clearance above the ground.
/// `height` is not clamped here.
pub fn height_to_y_position(height: f64, lowest_point_offset: f64) -> f64 {
    height + lowest_point_offset.abs() * UNITS_PER_METER
}

/// Clearance above the ground (centi-units) of an object centred at
/// `y_position`. Never negative: a centre too low to keep the box above the
/// floor reads as resting on it.
pub fn y_position_to_height(y_position: f64, lowest_point_offset: f64) -> f64 {
    let height = y_position - lowest_point_offset.abs() * UNITS_PER_METER;
    // not `f64::max`, which would swallow NaN
    if height < 0.0 { 0.0 } else { height }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::SQRT_2;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn unrotated_cube_scales_with_uniform_scale() {
        for s in [0.1, 0.5, 1.0, 2.0, 3.0] {
            let offset = calculate_lowest_point_offset(0.0, 0.0, 0.0, s, s, s);
            assert!(close(offset, -0.5 * s, EPS), "scale {s}: {offset}");
        }
    }

    #[test]
    fn unrotated_offset_follows_y_scale() {
        let offset = calculate_lowest_point_offset(0.0, 0.0, 0.0, 1.0, 3.0, 1.0);
        assert!(close(offset, -1.5, EPS));
    }

    #[test]
    fn zero_y_scale_collapses_to_zero() {
        let offset = calculate_lowest_point_offset(0.0, 0.0, 0.0, 1.0, 0.0, 1.0);
        assert!(close(offset, 0.0, EPS));
    }

    #[test]
    fn yaw_does_not_change_vertical_extent() {
        for yaw in [45.0, 90.0, -30.0, 270.0] {
            let offset = calculate_lowest_point_offset(0.0, yaw, 0.0, 1.0, 1.0, 1.0);
            assert!(close(offset, -0.5, EPS), "yaw {yaw}: {offset}");
        }
    }

    #[test]
    fn tilting_45_degrees_exposes_an_edge() {
        let around_x = calculate_lowest_point_offset(45.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let around_z = calculate_lowest_point_offset(0.0, 0.0, 45.0, 1.0, 1.0, 1.0);
        assert!(close(around_x, -SQRT_2 / 2.0, 1e-6));
        assert!(close(around_z, -SQRT_2 / 2.0, 1e-6));
    }

    #[test]
    fn quarter_and_half_turns_realign_the_box() {
        for angle in [90.0, 180.0, -90.0] {
            let offset = calculate_lowest_point_offset(angle, 0.0, 0.0, 1.0, 1.0, 1.0);
            assert!(close(offset, -0.5, 1e-9), "angle {angle}: {offset}");
        }
    }

    #[test]
    fn combined_tilts_go_deeper_than_a_flat_box() {
        let offset = calculate_lowest_point_offset(45.0, 0.0, 45.0, 1.0, 1.0, 1.0);
        assert!(offset < -0.5);
    }

    #[test]
    fn scale_is_applied_before_rotation() {
        let uniform = calculate_lowest_point_offset(45.0, 0.0, 0.0, 2.0, 2.0, 2.0);
        assert!(close(uniform, -SQRT_2, 1e-6));

        // corners at (±0.5, ±1, ±0.5): 1*cos45 + 0.5*sin45
        let tall = calculate_lowest_point_offset(45.0, 0.0, 0.0, 1.0, 2.0, 1.0);
        assert!(tall < -1.0);
        assert!(close(tall, -1.5 * SQRT_2 / 2.0, 1e-6));
    }

    #[test]
    fn offset_is_periodic_in_full_turns() {
        for theta in [0.0, 17.0, 45.0, 123.0] {
            let base = calculate_lowest_point_offset(theta, 0.0, 0.0, 1.0, 1.0, 1.0);
            let plus = calculate_lowest_point_offset(theta + 360.0, 0.0, 0.0, 1.0, 1.0, 1.0);
            let minus = calculate_lowest_point_offset(theta - 360.0, 0.0, 0.0, 1.0, 1.0, 1.0);
            assert!(close(base, plus, 1e-9));
            assert!(close(base, minus, 1e-9));
        }
    }

    #[test]
    fn offset_is_even_in_single_axis_angle() {
        for theta in [10.0, 45.0, 60.0, 135.0] {
            for s in [1.0, 2.5] {
                let pos = calculate_lowest_point_offset(theta, 0.0, 0.0, s, s, s);
                let neg = calculate_lowest_point_offset(-theta, 0.0, 0.0, s, s, s);
                assert!(close(pos, neg, 1e-9), "theta {theta} scale {s}");
            }
        }
    }

    #[test]
    fn tiny_rotation_stays_near_flat() {
        let offset = calculate_lowest_point_offset(0.001, 0.0, 0.0, 1.0, 1.0, 1.0);
        assert!(close(offset, -0.5, 1e-3));
    }

    #[test]
    fn nan_propagates() {
        let offset = calculate_lowest_point_offset(f64::NAN, 0.0, 0.0, 1.0, 1.0, 1.0);
        assert!(offset.is_nan());
        assert!(height_to_y_position(f64::NAN, -0.5).is_nan());
    }

    #[test]
    fn nan_is_not_clamped_to_the_ground() {
        assert!(y_position_to_height(f64::NAN, -0.5).is_nan());
        assert!(y_position_to_height(150.0, f64::NAN).is_nan());
        assert_eq!(y_position_to_height(f64::INFINITY, -0.5), f64::INFINITY);
        assert_eq!(y_position_to_height(f64::NEG_INFINITY, -0.5), 0.0);
    }

    #[test]
    fn height_to_y_adds_the_offset_in_centi_units() {
        assert_eq!(height_to_y_position(0.0, -0.5), 50.0);
        assert_eq!(height_to_y_position(100.0, -0.5), 150.0);
        assert_eq!(height_to_y_position(0.0, -1.0), 100.0);
        assert_eq!(height_to_y_position(50.0, 0.0), 50.0);
        assert_eq!(height_to_y_position(500.0, -0.5), 550.0);
        // positive offsets are treated by magnitude
        assert_eq!(height_to_y_position(50.0, 0.5), 100.0);
        // negative heights are not clamped on this side
        assert_eq!(height_to_y_position(-20.0, -0.5), 30.0);
    }

    #[test]
    fn y_to_height_clamps_at_the_floor() {
        assert_eq!(y_position_to_height(50.0, -0.5), 0.0);
        assert_eq!(y_position_to_height(150.0, -0.5), 100.0);
        assert_eq!(y_position_to_height(30.0, -0.5), 0.0);
        assert_eq!(y_position_to_height(0.0, -0.5), 0.0);
        assert_eq!(y_position_to_height(-100.0, -0.5), 0.0);
        assert_eq!(y_position_to_height(100.0, 0.0), 100.0);
        assert!(close(y_position_to_height(50.001, -0.5), 0.001, 1e-6));
    }

    #[test]
    fn non_negative_heights_survive_a_round_trip() {
        for offset in [-0.707, -0.5, -1.5, 0.0] {
            for height in [0.0, 1.0, 123.0, 999.5] {
                let y = height_to_y_position(height, offset);
                let back = y_position_to_height(y, offset);
                assert!(close(back, height, 1e-9), "offset {offset} height {height}");
            }
        }
    }

    #[test]
    fn too_low_centres_come_back_as_the_resting_position() {
        let offset = -0.5;
        let y = 20.0;
        assert_eq!(y_position_to_height(y, offset), 0.0);
        let min_y = height_to_y_position(0.0, offset);
        assert_eq!(min_y, 50.0);
        assert!(min_y > y);
    }

    #[test]
    fn height_is_preserved_across_rotation() {
        let flat = calculate_lowest_point_offset(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let y = height_to_y_position(100.0, flat);
        assert!(close(y, 150.0, EPS));

        let tilted = calculate_lowest_point_offset(45.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        assert!(close(tilted, -0.707, 1e-3));
        assert!(!close(tilted, flat, 1e-2));

        let new_y = height_to_y_position(100.0, tilted);
        assert!(close(new_y, 170.71, 1e-2));
        assert!(close(y_position_to_height(new_y, tilted), 100.0, 1e-9));
    }

    #[test]
    fn height_is_preserved_across_scale() {
        let bigger = calculate_lowest_point_offset(0.0, 0.0, 0.0, 2.0, 2.0, 2.0);
        let y = height_to_y_position(50.0, bigger);
        assert!(close(y_position_to_height(y, bigger), 50.0, 1e-9));
    }

    #[test]
    fn tilting_a_resting_box_in_place_would_sink_it() {
        let flat = calculate_lowest_point_offset(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let resting_y = height_to_y_position(0.0, flat);
        assert!(close(resting_y, 50.0, EPS));

        let tilted = calculate_lowest_point_offset(45.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        assert_eq!(y_position_to_height(resting_y, tilted), 0.0);

        let corrected = height_to_y_position(0.0, tilted);
        assert!(corrected > resting_y);
    }
}
