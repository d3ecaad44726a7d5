//! Pure camera and ray math used for picking and rendering.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Pinhole camera intrinsics: focal lengths and principal point, in pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Intrinsics for a render target of the given size with the given
    /// vertical field of view (radians). The principal point is the image
    /// center.
    pub fn from_fov_y(width: u32, height: u32, fov_y: f64) -> Self {
        let f = height as f64 / 2.0 / (fov_y / 2.0).tan();
        CameraIntrinsics {
            fx: f,
            fy: f,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }

    /// Unprojects a pixel to a unit-length ray direction in camera space
    /// (camera looks along positive z, image y points down).
    ///
    /// Returns [None] if either focal length is zero, in which case the ray
    /// is undefined.
    pub fn unproject(&self, px: f64, py: f64) -> Option<Vector3<f64>> {
        if self.fx == 0.0 || self.fy == 0.0 {
            return None;
        }
        let x_cam = (px - self.cx) / self.fx;
        let y_cam = (py - self.cy) / self.fy;
        Some(Vector3::new(x_cam, y_cam, 1.0).normalize())
    }

    /// Projects a camera-space point to pixel coordinates.
    /// Returns [None] for points at or behind the camera plane.
    pub fn project(&self, p_cam: &Point3<f64>) -> Option<(f64, f64)> {
        if p_cam.z <= 0.0 {
            return None;
        }
        let px = self.fx * p_cam.x / p_cam.z + self.cx;
        let py = self.fy * p_cam.y / p_cam.z + self.cy;
        Some((px, py))
    }
}

/// The camera's pose in world space, derived by inverting the extrinsic
/// (world-to-camera) transform.
#[derive(Clone, Debug)]
pub struct CameraPose {
    pub rotation: Matrix3<f64>,
    pub position: Point3<f64>,
}

impl CameraPose {
    /// Returns [None] if the extrinsic is not invertible.
    pub fn from_extrinsic(extrinsic: &Matrix4<f64>) -> Option<Self> {
        let inv = extrinsic.try_inverse()?;
        let rotation: Matrix3<f64> = inv.fixed_view::<3, 3>(0, 0).into_owned();
        let position = Point3::new(inv[(0, 3)], inv[(1, 3)], inv[(2, 3)]);
        Some(CameraPose { rotation, position })
    }
}

/// An infinite ray `origin + t * direction`, with a unit-length direction.
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Perpendicular distance from the point to the infinite ray.
    /// Valid because the direction is unit length.
    pub fn distance_to_point(&self, p: Point3<f64>) -> f64 {
        (p - self.origin).cross(&self.direction).norm()
    }
}

/// Intrinsics plus the world-to-camera extrinsic, recomputed from the live
/// view state for every pick and render pass.
#[derive(Clone, Debug)]
pub struct CameraParameters {
    pub intrinsics: CameraIntrinsics,
    pub extrinsic: Matrix4<f64>,
}

impl CameraParameters {
    /// Transforms a world-space point into camera space.
    pub fn world_to_camera(&self, p: &Point3<f64>) -> Point3<f64> {
        self.extrinsic.transform_point(p)
    }

    /// Builds the world-space ray through the given pixel.
    ///
    /// The camera-space ray from the intrinsics is rotated (not translated)
    /// into world space by the camera pose and anchored at the camera
    /// position. Returns [None] if the intrinsics are degenerate or the
    /// extrinsic cannot be inverted.
    pub fn pick_ray(&self, px: f64, py: f64) -> Option<Ray> {
        let ray_cam = self.intrinsics.unproject(px, py)?;
        let pose = CameraPose::from_extrinsic(&self.extrinsic)?;
        Some(Ray {
            origin: pose.position,
            direction: pose.rotation * ray_cam,
        })
    }
}

/// Finds the point with the smallest perpendicular distance to the ray.
/// Ties are broken by the first occurrence in point order.
/// Returns the index of the winning point and its distance.
pub fn closest_point_to_ray(points: &[Point3<f64>], ray: &Ray) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = ray.distance_to_point(*p);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best
}

/// An axis aligned bounding box.
/// An empty aabb is represented by min > max on every axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    /// Constructs an empty bounding box.
    pub fn empty() -> Self {
        Aabb {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// Checks, if the bounding box is empty.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the bounding box, so that it contains the given position.
    pub fn extend(&mut self, p: Point3<f64>) {
        self.min = self.min.inf(&p);
        self.max = self.max.sup(&p);
    }

    /// Bounds of the given point set.
    pub fn from_points(points: &[Point3<f64>]) -> Self {
        let mut aabb = Aabb::empty();
        for p in points {
            aabb.extend(*p);
        }
        aabb
    }

    /// Center of the bounding box, or the origin if it is empty.
    pub fn center(&self) -> Point3<f64> {
        if self.is_empty() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    /// Length of the diagonal, or 0.0 if the box is empty.
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.max - self.min).norm()
    }
}
