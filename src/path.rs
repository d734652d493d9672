//! Dotted document paths.
//!
//! A path addresses one location in the source document, e.g.
//! `root.properties.address.properties.city`. Paths are the join key between
//! the visibility map and every node the compiler emits.
//!
//! Document names may contain `.` and `~`, so each segment is escaped the
//! way JSON pointers are: `~` becomes `~0` and `.` becomes `~1`. Synthetic
//! segments (such as [`OVERFLOW_SEGMENT`]) start with a bare `~`, which an
//! escaped name can never produce.

pub const ROOT: &str = "root";

/// Segment used for the grouped-overflow node of a sibling set.
pub const OVERFLOW_SEGMENT: &str = "~overflow";

pub fn escape_segment(segment: &str) -> String {
    if !segment.contains(['~', '.']) {
        return segment.to_string();
    }
    segment.replace('~', "~0").replace('.', "~1")
}

/// Appends one raw (unescaped) document name to `parent`.
pub fn join(parent: &str, segment: &str) -> String {
    let escaped = escape_segment(segment);
    if parent.is_empty() {
        return escaped;
    }
    format!("{parent}.{escaped}")
}

/// Appends several raw segments at once.
pub fn join_all(parent: &str, segments: &[&str]) -> String {
    segments
        .iter()
        .fold(parent.to_string(), |acc, segment| join(&acc, segment))
}

/// Appends a synthetic segment verbatim.
pub fn join_synthetic(parent: &str, segment: &str) -> String {
    format!("{parent}.{segment}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_escapes_dots_and_tildes() {
        assert_eq!(join("root", "name"), "root.name");
        assert_eq!(join("root.paths", "/v1.0/users"), "root.paths./v1~10/users");
        assert_eq!(join("root", "~odd"), "root.~0odd");
    }

    #[test]
    fn synthetic_segments_cannot_collide_with_names() {
        let synthetic = join_synthetic("root.properties", OVERFLOW_SEGMENT);
        let named = join("root.properties", OVERFLOW_SEGMENT);
        assert_ne!(synthetic, named);
    }
}
