//! Parsed driving route

use serde::{Deserialize, Serialize};

use super::MicroPoint;

/// A driving route: ordered waypoints plus optional summary text
///
/// An empty route (no waypoints) means nothing was found or the document
/// could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route title from the document, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Route summary (distance/duration text), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered path samples
    pub waypoints: Vec<MicroPoint>,
}

impl Route {
    /// An empty route
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a route from waypoints without summary fields
    #[must_use]
    pub const fn from_waypoints(waypoints: Vec<MicroPoint>) -> Self {
        Self {
            name: None,
            description: None,
            waypoints,
        }
    }

    /// Whether the route has no waypoints
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of waypoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// First waypoint
    #[must_use]
    pub fn start(&self) -> Option<MicroPoint> {
        self.waypoints.first().copied()
    }

    /// Last waypoint
    #[must_use]
    pub fn end(&self) -> Option<MicroPoint> {
        self.waypoints.last().copied()
    }
}
