//! Compass direction classification
//!
//! Positions inside [`DEADZONE`] are `Center`. Everything else falls into
//! one of eight 45° sectors. Angles are measured in degrees,
//! counter-clockwise, with East at 0°; each sector's lower bound is
//! inclusive:
//!
//! ```text
//! East       [337.5, 360) and [0, 22.5)
//! Northeast  [ 22.5,  67.5)
//! North      [ 67.5, 112.5)
//! Northwest  [112.5, 157.5)
//! West       [157.5, 202.5)
//! Southwest  [202.5, 247.5)
//! South      [247.5, 292.5)
//! Southeast  [292.5, 337.5)
//! ```

use serde::{Deserialize, Serialize};

use super::DEADZONE;

/// Width of one compass sector in degrees.
const SECTOR_WIDTH: f32 = 45.0;

/// Sector order starting at East, counter-clockwise.
const SECTORS: [Direction; 8] = [
    Direction::East,
    Direction::Northeast,
    Direction::North,
    Direction::Northwest,
    Direction::West,
    Direction::Southwest,
    Direction::South,
    Direction::Southeast,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Center,
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

/// Language used when a direction or button state is turned into text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "en")]
    English,
}

impl Direction {
    /// Text label for the HTML page and the JSON payload.
    pub fn label(self, language: Language) -> &'static str {
        match language {
            Language::Portuguese => match self {
                Direction::Center => "Centro",
                Direction::North => "Norte",
                Direction::Northeast => "Nordeste",
                Direction::East => "Leste",
                Direction::Southeast => "Sudeste",
                Direction::South => "Sul",
                Direction::Southwest => "Sudoeste",
                Direction::West => "Oeste",
                Direction::Northwest => "Noroeste",
            },
            Language::English => match self {
                Direction::Center => "Center",
                Direction::North => "North",
                Direction::Northeast => "Northeast",
                Direction::East => "East",
                Direction::Southeast => "Southeast",
                Direction::South => "South",
                Direction::Southwest => "Southwest",
                Direction::West => "West",
                Direction::Northwest => "Northwest",
            },
        }
    }
}

/// Classifies a position and returns it with its magnitude.
///
/// The magnitude is taken from the position as given, before any deadzone
/// collapse.
pub fn classify(x: f32, y: f32) -> (Direction, f32) {
    let magnitude = x.hypot(y);
    if magnitude < DEADZONE {
        return (Direction::Center, magnitude);
    }

    let mut angle = y.atan2(x).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }

    // A tiny negative angle can round up to 360.0, which wraps back to East.
    let sector = ((angle + SECTOR_WIDTH / 2.0) / SECTOR_WIDTH).floor() as usize % SECTORS.len();
    (SECTORS[sector], magnitude)
}

/// Classifies a position and collapses it to the origin inside the deadzone.
pub fn locate(x: f32, y: f32) -> (f32, f32, Direction) {
    match classify(x, y) {
        (Direction::Center, _) => (0.0, 0.0, Direction::Center),
        (direction, _) => (x, y, direction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_degrees(angle: f32) -> (f32, f32) {
        let radians = angle.to_radians();
        (radians.cos(), radians.sin())
    }

    #[test]
    fn axis_and_diagonal_points() {
        let cases = [
            ((1.0, 0.0), Direction::East),
            ((1.0, 1.0), Direction::Northeast),
            ((0.0, 1.0), Direction::North),
            ((-1.0, 1.0), Direction::Northwest),
            ((-1.0, 0.0), Direction::West),
            ((-1.0, -1.0), Direction::Southwest),
            ((0.0, -1.0), Direction::South),
            ((1.0, -1.0), Direction::Southeast),
        ];

        for ((x, y), expected) in cases {
            assert_eq!(classify(x, y).0, expected, "position ({x}, {y})");
        }
    }

    #[test]
    fn sector_edges_follow_east_aligned_table() {
        let (x, y) = at_degrees(22.4);
        assert_eq!(classify(x, y).0, Direction::East);
        let (x, y) = at_degrees(22.6);
        assert_eq!(classify(x, y).0, Direction::Northeast);
        let (x, y) = at_degrees(337.4);
        assert_eq!(classify(x, y).0, Direction::Southeast);
        let (x, y) = at_degrees(337.6);
        assert_eq!(classify(x, y).0, Direction::East);
        let (x, y) = at_degrees(112.4);
        assert_eq!(classify(x, y).0, Direction::North);
        let (x, y) = at_degrees(112.6);
        assert_eq!(classify(x, y).0, Direction::Northwest);
    }

    #[test]
    fn negative_zero_y_on_the_left_is_west() {
        assert_eq!(classify(-1.0, -0.0).0, Direction::West);
        assert_eq!(classify(1.0, -0.0).0, Direction::East);
    }

    #[test]
    fn deadzone_boundary_is_exclusive() {
        assert_eq!(classify(0.2, 0.0), (Direction::East, 0.2));
        assert_eq!(classify(0.0, -0.2).0, Direction::South);
        assert_eq!(classify(0.19, 0.0).0, Direction::Center);
    }

    #[test]
    fn locate_zeroes_inside_deadzone() {
        assert_eq!(locate(0.1, -0.1), (0.0, 0.0, Direction::Center));
        assert_eq!(locate(0.5, 0.0), (0.5, 0.0, Direction::East));
    }

    #[test]
    fn magnitude_is_reported_before_collapse() {
        let (direction, magnitude) = classify(0.06, 0.08);
        assert_eq!(direction, Direction::Center);
        assert!((magnitude - 0.1).abs() < 1e-6);
    }

    #[test]
    fn labels_in_both_languages() {
        assert_eq!(Direction::East.label(Language::Portuguese), "Leste");
        assert_eq!(Direction::Center.label(Language::Portuguese), "Centro");
        assert_eq!(Direction::Southwest.label(Language::English), "Southwest");
    }
}
