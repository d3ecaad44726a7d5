//! The message protocol between controller and render worker.

use crate::render::settings::{Color, LightingProfile, ViewMode};
use nalgebra::Point3;
use std::path::PathBuf;

/// Commands the controller sends to the worker.
///
/// The worker drains all queued commands before rendering, so a burst of
/// commands results in at most one render pass per command that mutated
/// the scene.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the current point set with the contents of the given file.
    /// The extension decides the format, independently of the file name.
    LoadFile { path: PathBuf, extension: String },

    /// Picks the point closest to the view ray through the given viewport
    /// position. Both coordinates are normalized to `0.0..=1.0`, with the
    /// origin in the top left corner.
    PickPoint { x: f64, y: f64 },

    /// Clears the selection and all pick markers.
    ClearMarkers,

    SetBackgroundColor { color: Color },

    /// Point splat size in pixels. Must be finite and positive.
    SetPointSize { size: f64 },

    /// Paints all points uniformly and makes this the fallback color for
    /// clouds without per-point colors.
    SetPointColor { color: Color },

    SetViewMode { mode: ViewMode },

    SetLighting { profile: LightingProfile },

    /// Orbits the camera by a mouse drag of the given amount of pixels.
    Rotate { dx: f64, dy: f64 },

    /// Scales the camera distance. Factors above 1.0 zoom in.
    Zoom { factor: f64 },

    /// Shuts the worker down. All commands queued behind it are dropped.
    Quit,
}

/// Results the worker sends back to the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerResult {
    /// A captured frame, encoded as PNG.
    Frame { png: Vec<u8> },

    /// Human readable progress message.
    Status { message: String },

    /// A command failed. The worker keeps running; scene state is unchanged.
    Error { message: String },

    /// A pick resolved to this point. `selection_count` is the selection
    /// size after the pick (1 or 2).
    PointPicked {
        point: Point3<f64>,
        selection_count: usize,
    },

    /// Euclidean distance between the two selected points. Sent directly
    /// after the `PointPicked` result that completed the pair.
    Measurement {
        distance: f64,
        point_1: Point3<f64>,
        point_2: Point3<f64>,
    },
}
