//! Immutable scene snapshots handed to consumers.
//!
//! A snapshot is a plain data tree: no locks, no trait objects, safe to ship
//! across threads or serialize onto the wire. Guidance systems and overlay
//! renderers consume these instead of touching live tracker state.

use std::fmt;

use serde::{Deserialize, Serialize};
use tagtrack_core::{Iso3, Tick};

use crate::marker::Marker;

/// What a snapshot entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Unknown,
    /// A fiducial marker, always nested under its carrier.
    Tag,
    /// Reference surveyed in the world frame.
    ReferenceAbsolute,
    /// Reference placed relative to another object or adjusted at runtime.
    ReferenceRelative,
    Camera,
    Robot,
    TopTracker,
    /// Team-identity element (colored plate or panel).
    Team,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Unknown => "unknown",
            ObjectKind::Tag => "tag",
            ObjectKind::ReferenceAbsolute => "reference_absolute",
            ObjectKind::ReferenceRelative => "reference_relative",
            ObjectKind::Camera => "camera",
            ObjectKind::Robot => "robot",
            ObjectKind::TopTracker => "top_tracker",
            ObjectKind::Team => "team",
        };
        f.write_str(name)
    }
}

/// Competition side. A deployment usually runs one tracker per team, so team
/// objects on opposite sides may reuse marker IDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    #[default]
    Unknown,
    Blue,
    Yellow,
}

impl Team {
    /// The opposing side. Unknown has no opponent.
    pub fn other(self) -> Team {
        match self {
            Team::Unknown => Team::Unknown,
            Team::Blue => Team::Yellow,
            Team::Yellow => Team::Blue,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Team::Unknown => "unknown",
            Team::Blue => "blue",
            Team::Yellow => "yellow",
        };
        f.write_str(name)
    }
}

/// One entry of a scene snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    pub kind: ObjectKind,
    pub name: String,
    /// Pose in the parent entry's frame; the world frame for top-level
    /// entries.
    pub pose: Iso3,
    /// Capture tick of the last sighting. `None` for objects that are
    /// placed rather than seen.
    pub last_seen: Option<Tick>,
    /// Kind-specific payload (marker geometry, team color, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ObjectData>,
}

impl ObjectData {
    pub fn new(kind: ObjectKind, name: impl Into<String>, pose: Iso3) -> Self {
        Self {
            kind,
            name: name.into(),
            pose,
            last_seen: None,
            metadata: None,
            children: Vec::new(),
        }
    }

    /// Entry for a marker mounted on the parent entry's object.
    pub(crate) fn marker(marker: &Marker) -> Self {
        let mut data = Self::new(
            ObjectKind::Tag,
            format!("tag_{}", marker.id),
            marker.object_from_marker,
        );
        data.metadata = Some(serde_json::json!({
            "id": marker.id,
            "side_length": marker.side_length,
        }));
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teams_oppose_each_other() {
        assert_eq!(Team::Blue.other(), Team::Yellow);
        assert_eq!(Team::Yellow.other(), Team::Blue);
        assert_eq!(Team::Unknown.other(), Team::Unknown);
        assert_eq!(Team::default(), Team::Unknown);
    }

    #[test]
    fn display_names_are_stable() {
        assert_eq!(ObjectKind::ReferenceAbsolute.to_string(), "reference_absolute");
        assert_eq!(ObjectKind::Tag.to_string(), "tag");
        assert_eq!(Team::Blue.to_string(), "blue");
    }

    #[test]
    fn nested_data_round_trips_through_json() {
        let mut root = ObjectData::new(
            ObjectKind::Robot,
            "robot_blue",
            Iso3::translation(1.0, 0.5, 0.0),
        );
        root.last_seen = Some(42);
        root.children
            .push(ObjectData::marker(&Marker::at_origin(0.05, 17)));

        let text = serde_json::to_string(&root).unwrap();
        let back: ObjectData = serde_json::from_str(&text).unwrap();
        assert_eq!(back.kind, ObjectKind::Robot);
        assert_eq!(back.last_seen, Some(42));
        assert_eq!(back.children.len(), 1);
        assert_eq!(back.children[0].name, "tag_17");
        let meta = back.children[0].metadata.as_ref().unwrap();
        assert_eq!(meta["id"], 17);
    }
}
