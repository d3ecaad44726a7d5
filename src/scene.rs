//! The authoritative in-memory scene model, exclusively owned by the worker.

use crate::geometry::Aabb;
use crate::render::settings::Color;
use nalgebra::Point3;

/// An immutable point cloud: positions and optional per-point colors.
///
/// The only mutation after loading is [PointSet::paint_uniform], which
/// overwrites all colors with a single value.
#[derive(Clone, Debug)]
pub struct PointSet {
    positions: Vec<Point3<f64>>,
    colors: Option<Vec<Color>>,
}

impl PointSet {
    /// Creates a point set. If colors are given, there must be exactly one
    /// per point; otherwise they are discarded.
    pub fn new(positions: Vec<Point3<f64>>, colors: Option<Vec<Color>>) -> Self {
        let colors = colors.filter(|c| c.len() == positions.len());
        PointSet { positions, colors }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Per-point colors, if the source file carried any.
    pub fn colors(&self) -> Option<&[Color]> {
        self.colors.as_deref()
    }

    /// Overwrites every point color with the given color.
    pub fn paint_uniform(&mut self, color: Color) {
        self.colors = Some(vec![color; self.positions.len()]);
    }

    /// Bounds of all positions.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.positions)
    }
}

/// Distance between two selected points, recomputed whenever the pair
/// changes and discarded when the selection is cleared.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Measurement {
    pub distance: f64,
    pub point_1: Point3<f64>,
    pub point_2: Point3<f64>,
}

/// The picked points, at most two.
///
/// When a third point is picked, the selection is cleared first and the new
/// point becomes the sole element.
#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    points: Vec<Point3<f64>>,
}

impl SelectionState {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a picked point, applying the clear-on-overflow rule.
    /// Returns the selection length after the append.
    pub fn push(&mut self, point: Point3<f64>) -> usize {
        if self.points.len() >= 2 {
            self.points.clear();
        }
        self.points.push(point);
        self.points.len()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// The derived measurement. Only exists while the pair is complete.
    pub fn measurement(&self) -> Option<Measurement> {
        match self.points.as_slice() {
            &[p1, p2] => Some(Measurement {
                distance: (p2 - p1).norm(),
                point_1: p1,
                point_2: p2,
            }),
            _ => None,
        }
    }
}

/// The visible pick markers, rebuilt from the selection after every change:
/// one sphere per selected point, plus a connecting line once the pair is
/// complete.
#[derive(Clone, Debug)]
pub struct Markers {
    pub spheres: Vec<Point3<f64>>,
    pub line: Option<(Point3<f64>, Point3<f64>)>,
}

/// Everything the worker owns: the loaded point set and the selection.
#[derive(Debug, Default)]
pub struct Scene {
    pub point_set: Option<PointSet>,
    pub selection: SelectionState,
}

impl Scene {
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces the point set wholesale and resets the selection.
    pub fn replace_point_set(&mut self, point_set: PointSet) {
        self.point_set = Some(point_set);
        self.selection.clear();
    }

    /// Rebuilds the marker set from the current selection.
    pub fn markers(&self) -> Markers {
        let spheres = self.selection.points().to_vec();
        let line = match self.selection.points() {
            &[p1, p2] => Some((p1, p2)),
            _ => None,
        };
        Markers { spheres, line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_clear_on_overflow() {
        let mut sel = SelectionState::new();
        assert_eq!(sel.push(Point3::new(1.0, 0.0, 0.0)), 1);
        assert_eq!(sel.push(Point3::new(2.0, 0.0, 0.0)), 2);
        // third pick clears first, the new point becomes the sole element
        assert_eq!(sel.push(Point3::new(3.0, 0.0, 0.0)), 1);
        assert_eq!(sel.points(), &[Point3::new(3.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_measurement_derivation() {
        let mut sel = SelectionState::new();
        sel.push(Point3::new(0.0, 0.0, 0.0));
        assert!(sel.measurement().is_none());
        sel.push(Point3::new(3.0, 4.0, 0.0));
        let m = sel.measurement().unwrap();
        assert!((m.distance - 5.0).abs() < 1e-6);
        sel.clear();
        assert!(sel.measurement().is_none());
    }

    #[test]
    fn test_markers_follow_selection() {
        let mut scene = Scene::new();
        assert!(scene.markers().spheres.is_empty());
        scene.selection.push(Point3::new(1.0, 2.0, 3.0));
        let markers = scene.markers();
        assert_eq!(markers.spheres.len(), 1);
        assert!(markers.line.is_none());
        scene.selection.push(Point3::new(4.0, 5.0, 6.0));
        let markers = scene.markers();
        assert_eq!(markers.spheres.len(), 2);
        assert!(markers.line.is_some());
    }

    #[test]
    fn test_replace_point_set_resets_selection() {
        let mut scene = Scene::new();
        scene.selection.push(Point3::origin());
        scene.replace_point_set(PointSet::new(vec![Point3::new(1.0, 1.0, 1.0)], None));
        assert!(scene.selection.is_empty());
        assert_eq!(scene.point_set.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_paint_uniform() {
        let mut ps = PointSet::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)], None);
        assert!(ps.colors().is_none());
        ps.paint_uniform(Color::RED);
        assert_eq!(ps.colors().unwrap(), &[Color::RED, Color::RED]);
    }

    #[test]
    fn test_mismatched_colors_are_dropped() {
        let ps = PointSet::new(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            Some(vec![Color::RED]),
        );
        assert!(ps.colors().is_none());
    }
}
