//! Property-based tests for classification and change detection
//!
//! Pins down the East-aligned degree sector table and the deadzone and
//! debounce rules across a wide range of positions.

use joystick_relay::joystick::{classify, has_changed, locate, Direction, JoystickState};

/// Sectors in counter-clockwise order starting at East = 0°.
const SECTOR_TABLE: [Direction; 8] = [
    Direction::East,
    Direction::Northeast,
    Direction::North,
    Direction::Northwest,
    Direction::West,
    Direction::Southwest,
    Direction::South,
    Direction::Southeast,
];

fn expected_sector(angle_degrees: f64) -> Direction {
    let index = ((angle_degrees + 22.5) / 45.0).floor() as usize % 8;
    SECTOR_TABLE[index]
}

/// Keeps generated angles clear of sector boundaries, where f32 rounding
/// could legitimately go either way.
fn clear_of_boundaries(angle_degrees: f64) -> bool {
    let offset = (angle_degrees - 22.5).rem_euclid(45.0);
    offset > 0.01 && offset < 44.99
}

fn polar(radius: f64, angle_degrees: f64) -> (f32, f32) {
    let radians = angle_degrees.to_radians();
    ((radius * radians.cos()) as f32, (radius * radians.sin()) as f32)
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop::sample::select(vec![
            Direction::Center,
            Direction::North,
            Direction::Northeast,
            Direction::East,
            Direction::Southeast,
            Direction::South,
            Direction::Southwest,
            Direction::West,
            Direction::Northwest,
        ])
    }

    fn state_strategy() -> impl Strategy<Value = JoystickState> {
        (-1.0f32..=1.0, -1.0f32..=1.0, any::<bool>(), direction_strategy()).prop_map(
            |(x, y, button_pressed, direction)| JoystickState {
                x,
                y,
                button_pressed,
                direction,
                changed: false,
            },
        )
    }

    proptest! {
        #[test]
        fn inside_deadzone_is_center_at_origin(
            radius in 0.0f64..0.199,
            angle in 0.0f64..360.0
        ) {
            let (x, y) = polar(radius, angle);
            prop_assert_eq!(classify(x, y).0, Direction::Center);

            let (lx, ly, direction) = locate(x, y);
            prop_assert_eq!(direction, Direction::Center);
            prop_assert_eq!(lx, 0.0);
            prop_assert_eq!(ly, 0.0);
        }

        #[test]
        fn outside_deadzone_follows_sector_table(
            radius in 0.21f64..1.0,
            angle in 0.0f64..360.0
        ) {
            prop_assume!(clear_of_boundaries(angle));
            let (x, y) = polar(radius, angle);
            let (direction, magnitude) = classify(x, y);

            prop_assert_ne!(direction, Direction::Center);
            prop_assert_eq!(direction, expected_sector(angle));
            prop_assert!((f64::from(magnitude) - radius).abs() < 1e-4);

            // Outside the deadzone the position is passed through untouched.
            prop_assert_eq!(locate(x, y), (x, y, direction));
        }

        #[test]
        fn direction_is_invariant_to_positive_scaling(
            radius in 0.21f64..1.0,
            angle in 0.0f64..360.0,
            scale in 1.0f64..4.0
        ) {
            prop_assume!(clear_of_boundaries(angle));
            let (x, y) = polar(radius, angle);
            let (sx, sy) = polar(radius * scale, angle);
            prop_assert_eq!(classify(x, y).0, classify(sx, sy).0);
        }

        #[test]
        fn classification_is_deterministic(x in -1.0f32..=1.0, y in -1.0f32..=1.0) {
            prop_assert_eq!(classify(x, y), classify(x, y));
            prop_assert_eq!(locate(x, y), locate(x, y));
        }

        #[test]
        fn center_iff_magnitude_below_deadzone(x in -1.0f32..=1.0, y in -1.0f32..=1.0) {
            let (direction, magnitude) = classify(x, y);
            prop_assert_eq!(direction == Direction::Center, magnitude < 0.2);
        }

        #[test]
        fn change_detection_is_symmetric(a in state_strategy(), b in state_strategy()) {
            prop_assert_eq!(has_changed(&a, &b), has_changed(&b, &a));
        }

        #[test]
        fn state_never_changed_against_itself(a in state_strategy()) {
            prop_assert!(!has_changed(&a, &a));
        }

        #[test]
        fn small_axis_jitter_is_suppressed(
            a in state_strategy(),
            dx in -0.099f32..0.099,
            dy in -0.099f32..0.099
        ) {
            let jittered = JoystickState { x: a.x + dx, y: a.y + dy, ..a };
            prop_assert!(!has_changed(&jittered, &a));
        }
    }
}
