//! The offscreen rendering context.

use crate::geometry::CameraParameters;
use crate::render::framebuffer::Framebuffer;
use crate::render::settings::{Color, RenderOptions};
use crate::scene::Scene;
use crate::worker::error::RenderFault;
use log::trace;

pub mod framebuffer;
pub mod settings;

/// Points closer to the camera than this are not drawn.
const NEAR_PLANE: f64 = 0.01;

/// Pixel radius of the pick marker spheres.
const MARKER_RADIUS: i64 = 6;

const MARKER_COLOR: Color = Color::RED;
const LINE_COLOR: Color = Color::GREEN;

/// Owns the raster target and turns scene state into frames.
///
/// Construction corresponds to the worker entering its ready state; after
/// [RenderContext::release] every operation fails with a fatal
/// [RenderFault].
pub struct RenderContext {
    framebuffer: Framebuffer,
    released: bool,
}

impl RenderContext {
    pub fn new(width: u32, height: u32) -> Self {
        RenderContext {
            framebuffer: Framebuffer::new(width, height),
            released: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.framebuffer.width()
    }

    pub fn height(&self) -> u32 {
        self.framebuffer.height()
    }

    /// Renders one pass of the scene into the framebuffer.
    pub fn render(
        &mut self,
        scene: &Scene,
        options: &RenderOptions,
        camera: &CameraParameters,
    ) -> Result<(), RenderFault> {
        if self.released {
            return Err(RenderFault::ContextReleased);
        }
        self.framebuffer.clear(options.bg_color);
        let point_set = match &scene.point_set {
            Some(point_set) => point_set,
            None => return Ok(()),
        };

        // point splats
        let shade = options.lighting.shade();
        // a splat can never usefully exceed the render target
        let max_half_size = self.framebuffer.width().max(self.framebuffer.height()) as i64;
        let half_size = ((options.point_size / 2.0).round() as i64).clamp(0, max_half_size);
        let colors = point_set.colors();
        for (i, p) in point_set.positions().iter().enumerate() {
            let p_cam = camera.world_to_camera(p);
            if p_cam.z < NEAR_PLANE {
                continue;
            }
            if let Some((px, py)) = camera.intrinsics.project(&p_cam) {
                let color = colors
                    .map(|c| c[i])
                    .unwrap_or(options.point_color)
                    .shaded(shade);
                self.framebuffer.fill_square(
                    px.round() as i64,
                    py.round() as i64,
                    half_size,
                    color.to_bytes(),
                );
            }
        }

        // measurement line below the markers, markers on top
        let markers = scene.markers();
        if let Some((p1, p2)) = markers.line {
            let a = camera.world_to_camera(&p1);
            let b = camera.world_to_camera(&p2);
            if a.z >= NEAR_PLANE && b.z >= NEAR_PLANE {
                if let (Some((ax, ay)), Some((bx, by))) =
                    (camera.intrinsics.project(&a), camera.intrinsics.project(&b))
                {
                    self.framebuffer.draw_line(
                        ax.round() as i64,
                        ay.round() as i64,
                        bx.round() as i64,
                        by.round() as i64,
                        LINE_COLOR.to_bytes(),
                    );
                }
            }
        }
        for marker in &markers.spheres {
            let p_cam = camera.world_to_camera(marker);
            if p_cam.z < NEAR_PLANE {
                continue;
            }
            if let Some((px, py)) = camera.intrinsics.project(&p_cam) {
                self.framebuffer.fill_disc(
                    px.round() as i64,
                    py.round() as i64,
                    MARKER_RADIUS,
                    MARKER_COLOR.to_bytes(),
                );
            }
        }

        trace!(
            "rendered {} points, {} markers",
            point_set.len(),
            markers.spheres.len()
        );
        Ok(())
    }

    /// Captures the last rendered pass as a PNG frame.
    pub fn capture(&self) -> Result<Vec<u8>, RenderFault> {
        if self.released {
            return Err(RenderFault::ContextReleased);
        }
        self.framebuffer.encode_png()
    }

    /// Releases the context. All later render/capture calls fail fatally.
    pub fn release(&mut self) {
        self.released = true;
    }
}
