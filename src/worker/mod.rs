//! The render worker: owns all scene state and processes commands.
//!
//! The worker runs on its own thread (see [handle::WorkerHandle]) and is the
//! only place that touches the scene, the camera and the render context. The
//! controller talks to it exclusively through the command and result
//! channels, so a slow or crashing render pass can never block or corrupt
//! the controlling side.

use crate::geometry::{closest_point_to_ray, CameraIntrinsics, CameraParameters, CameraPose, Ray};
use crate::io;
use crate::navigation::OrbitNavigation;
use crate::render::settings::{Color, LightingProfile, RenderOptions, ViewMode};
use crate::render::RenderContext;
use crate::scene::Scene;
use crate::worker::capture::{CaptureClock, CapturePolicy};
use crate::worker::command::{Command, WorkerResult};
use crate::worker::error::{DispatchError, PickError, RenderFault, ValidationError};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, trace, warn};
use std::f64::consts::FRAC_PI_3;
use std::path::PathBuf;

pub mod capture;
pub mod command;
pub mod error;
pub mod handle;

/// Configuration of the render worker, fixed for its lifetime.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Render target size in pixels.
    pub width: u32,
    pub height: u32,

    /// Vertical field of view of the pinhole camera, in radians.
    pub fov_y: f64,

    /// Number of surface samples when a mesh file is converted to a point
    /// set.
    pub mesh_samples: usize,

    pub capture_policy: CapturePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            width: 800,
            height: 600,
            fov_y: FRAC_PI_3,
            mesh_samples: 100_000,
            capture_policy: CapturePolicy::default(),
        }
    }
}

/// Lifecycle of the worker loop, for tracing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum WorkerState {
    Ready,
    Draining,
    Rendering,
    Idle,
    ShuttingDown,
    Terminated,
}

struct Worker {
    config: WorkerConfig,
    scene: Scene,
    options: RenderOptions,
    navigation: OrbitNavigation,
    context: RenderContext,
    capture_clock: CaptureClock,
    results: Sender<WorkerResult>,
    state: WorkerState,
}

/// Runs the worker loop until quit, disconnect or a fatal render fault.
/// This is the thread entry point used by [handle::WorkerHandle::spawn].
pub(crate) fn run(
    config: WorkerConfig,
    commands: Receiver<Command>,
    results: Sender<WorkerResult>,
) {
    let context = RenderContext::new(config.width, config.height);
    let capture_clock = CaptureClock::new(config.capture_policy.clone());
    let mut worker = Worker {
        config,
        scene: Scene::new(),
        options: RenderOptions::default(),
        navigation: OrbitNavigation::new(),
        context,
        capture_clock,
        results,
        state: WorkerState::Ready,
    };
    worker.run(&commands);
}

impl Worker {
    fn run(&mut self, commands: &Receiver<Command>) {
        debug!(
            "render worker ready, target {}x{}",
            self.config.width, self.config.height
        );
        loop {
            let mut queued = Vec::new();
            match commands.recv_timeout(self.capture_clock.idle_timeout()) {
                Ok(command) => {
                    queued.push(command);
                    while let Ok(command) = commands.try_recv() {
                        queued.push(command);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("command channel disconnected, shutting down");
                    break;
                }
            }

            self.set_state(WorkerState::Draining);
            for command in queued {
                if command == Command::Quit {
                    debug!("quit command received");
                    self.set_state(WorkerState::ShuttingDown);
                    break;
                }
                match self.dispatch(command) {
                    Ok(()) => {}
                    Err(DispatchError::Command(e)) => {
                        warn!("command failed: {e}");
                        self.send(WorkerResult::Error {
                            message: e.to_string(),
                        });
                    }
                    Err(DispatchError::Fatal(fault)) => {
                        self.report_fatal(fault);
                        self.set_state(WorkerState::ShuttingDown);
                        break;
                    }
                }
            }
            if self.state == WorkerState::ShuttingDown {
                break;
            }

            if self.capture_clock.heartbeat_due() {
                if self.scene.point_set.is_some() {
                    self.set_state(WorkerState::Rendering);
                    if let Err(fault) = self.emit_frame() {
                        self.report_fatal(fault);
                        break;
                    }
                } else {
                    // nothing to show yet, keep blocking on the channel
                    self.capture_clock.skip_heartbeat();
                }
            }
            self.set_state(WorkerState::Idle);
        }

        self.context.release();
        self.set_state(WorkerState::Terminated);
        debug!("render worker terminated");
    }

    fn set_state(&mut self, state: WorkerState) {
        if self.state != state {
            trace!("worker state: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn send(&self, result: WorkerResult) {
        // a controller that dropped the receiver no longer cares
        self.results.send(result).ok();
    }

    fn report_fatal(&self, fault: RenderFault) {
        error!("fatal render fault: {fault}");
        self.send(WorkerResult::Error {
            message: fault.to_string(),
        });
    }

    fn camera(&self) -> CameraParameters {
        CameraParameters {
            intrinsics: CameraIntrinsics::from_fov_y(
                self.context.width(),
                self.context.height(),
                self.config.fov_y,
            ),
            extrinsic: self.navigation.extrinsic(),
        }
    }

    /// Renders the scene and puts the captured frame on the result channel.
    fn emit_frame(&mut self) -> Result<(), RenderFault> {
        let camera = self.camera();
        self.context.render(&self.scene, &self.options, &camera)?;
        let png = self.context.capture()?;
        self.capture_clock.mark_captured();
        self.send(WorkerResult::Frame { png });
        Ok(())
    }

    /// Renders and captures, but only once a point set is loaded. Before
    /// that there is nothing to show and the controller expects no frames.
    fn frame_if_loaded(&mut self) -> Result<(), DispatchError> {
        if self.scene.point_set.is_some() {
            self.emit_frame()?;
        }
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> Result<(), DispatchError> {
        trace!("command: {command:?}");
        match command {
            Command::LoadFile { path, extension } => self.handle_load(path, extension),
            Command::PickPoint { x, y } => self.handle_pick(x, y),
            Command::ClearMarkers => self.handle_clear_markers(),
            Command::SetBackgroundColor { color } => self.handle_set_background(color),
            Command::SetPointSize { size } => self.handle_set_point_size(size),
            Command::SetPointColor { color } => self.handle_set_point_color(color),
            Command::SetViewMode { mode } => self.handle_set_view_mode(mode),
            Command::SetLighting { profile } => self.handle_set_lighting(profile),
            Command::Rotate { dx, dy } => self.handle_rotate(dx, dy),
            Command::Zoom { factor } => self.handle_zoom(factor),
            // quit is intercepted by the loop before dispatch
            Command::Quit => Ok(()),
        }
    }

    fn handle_load(&mut self, path: PathBuf, extension: String) -> Result<(), DispatchError> {
        debug!("loading {}", path.display());
        let point_set = io::load_point_set(&path, &extension, self.config.mesh_samples)?;
        let count = point_set.len();
        let aabb = point_set.aabb();
        self.scene.replace_point_set(point_set);
        self.navigation.focus_on(&aabb);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.send(WorkerResult::Status {
            message: format!("Loaded {name} with {count} points"),
        });
        self.emit_frame()?;
        Ok(())
    }

    fn handle_pick(&mut self, x: f64, y: f64) -> Result<(), DispatchError> {
        for (argument, value) in [("viewport x", x), ("viewport y", y)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ValidationError {
                    argument,
                    message: format!("{value} is outside 0.0..=1.0"),
                }
                .into());
            }
        }
        let point_set = match &self.scene.point_set {
            Some(point_set) => point_set,
            None => {
                debug!("pick ignored, no point set loaded");
                return Ok(());
            }
        };

        let camera = self.camera();
        let px = x * self.context.width() as f64;
        let py = y * self.context.height() as f64;
        let direction_cam = camera
            .intrinsics
            .unproject(px, py)
            .ok_or(PickError::DegenerateRay)?;
        let pose =
            CameraPose::from_extrinsic(&camera.extrinsic).ok_or(PickError::SingularExtrinsic)?;
        let ray = Ray {
            origin: pose.position,
            direction: pose.rotation * direction_cam,
        };

        let (index, distance) = match closest_point_to_ray(point_set.positions(), &ray) {
            Some(hit) => hit,
            None => return Ok(()),
        };
        let point = point_set.positions()[index];
        trace!("picked point {index} at ray distance {distance}");

        let selection_count = self.scene.selection.push(point);
        let measurement = self.scene.selection.measurement();

        self.emit_frame()?;
        self.send(WorkerResult::PointPicked {
            point,
            selection_count,
        });
        if let Some(m) = measurement {
            debug!("measured distance: {}", m.distance);
            self.send(WorkerResult::Measurement {
                distance: m.distance,
                point_1: m.point_1,
                point_2: m.point_2,
            });
        }
        Ok(())
    }

    fn handle_clear_markers(&mut self) -> Result<(), DispatchError> {
        self.scene.selection.clear();
        if self.scene.point_set.is_some() {
            self.emit_frame()?;
            self.send(WorkerResult::Status {
                message: "Point markers cleared".to_string(),
            });
        }
        Ok(())
    }

    fn handle_set_background(&mut self, color: Color) -> Result<(), DispatchError> {
        validate_color("background color", color)?;
        self.options.bg_color = color;
        self.frame_if_loaded()
    }

    fn handle_set_point_size(&mut self, size: f64) -> Result<(), DispatchError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(ValidationError {
                argument: "point size",
                message: format!("{size} is not a positive pixel size"),
            }
            .into());
        }
        self.options.point_size = size;
        self.frame_if_loaded()
    }

    fn handle_set_point_color(&mut self, color: Color) -> Result<(), DispatchError> {
        validate_color("point color", color)?;
        self.options.point_color = color;
        if let Some(point_set) = &mut self.scene.point_set {
            point_set.paint_uniform(color);
        }
        self.frame_if_loaded()
    }

    fn handle_set_view_mode(&mut self, mode: ViewMode) -> Result<(), DispatchError> {
        self.options.view_mode = mode;
        self.navigation.apply_view_mode(mode);
        self.frame_if_loaded()
    }

    fn handle_set_lighting(&mut self, profile: LightingProfile) -> Result<(), DispatchError> {
        self.options.lighting = profile;
        self.frame_if_loaded()
    }

    fn handle_rotate(&mut self, dx: f64, dy: f64) -> Result<(), DispatchError> {
        for (argument, value) in [("rotation dx", dx), ("rotation dy", dy)] {
            if !value.is_finite() {
                return Err(ValidationError {
                    argument,
                    message: format!("{value} is not finite"),
                }
                .into());
            }
        }
        self.navigation.rotate(dx, dy);
        self.frame_if_loaded()
    }

    fn handle_zoom(&mut self, factor: f64) -> Result<(), DispatchError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ValidationError {
                argument: "zoom factor",
                message: format!("{factor} is not a positive factor"),
            }
            .into());
        }
        self.navigation.zoom(factor);
        self.frame_if_loaded()
    }
}

fn validate_color(argument: &'static str, color: Color) -> Result<(), ValidationError> {
    if color.is_valid() {
        Ok(())
    } else {
        Err(ValidationError {
            argument,
            message: format!(
                "channels ({}, {}, {}) must be within 0.0 and 1.0",
                color.r, color.g, color.b
            ),
        })
    }
}
