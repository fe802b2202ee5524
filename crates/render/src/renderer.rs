use glam::Vec3;
use orbitlight_scene::{NodeKind, PerspectiveCamera, SceneGraph};
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and camera, then produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of the scene through the camera.
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Self::Output;

    /// Match the drawing surface to new dimensions in physical pixels.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Debug text renderer.
///
/// Produces a human-readable description of each frame. Useful for CLI
/// output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    size: (u32, u32),
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            frames: 0,
        }
    }

    /// Current surface size.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn fmt_vec(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) ===",
            self.frames, self.size.0, self.size.1
        );
        let _ = writeln!(
            out,
            "Camera: eye={} target={} fov={:.0} aspect={:.3}",
            fmt_vec(camera.position),
            fmt_vec(camera.target()),
            camera.fov_degrees,
            camera.aspect
        );

        for (id, world) in scene.traverse() {
            let node = &scene.nodes()[&id];
            let pos = world.w_axis.truncate();
            match &node.kind {
                NodeKind::Mesh(mesh) => {
                    let shape = scene
                        .geometry(mesh.geometry)
                        .map(|g| g.kind_name())
                        .unwrap_or("?");
                    let _ = writeln!(out, "  mesh {} [{shape}] pos={}", node.name, fmt_vec(pos));
                }
                NodeKind::AreaLight(light) => {
                    let _ = writeln!(
                        out,
                        "  light {} pos={} target={} intensity={:.1}",
                        node.name,
                        fmt_vec(pos),
                        fmt_vec(light.target()),
                        light.intensity
                    );
                }
                NodeKind::LightHelper(helper) => {
                    let _ = writeln!(out, "  helper {} rev={}", node.name, helper.revision());
                }
                NodeKind::Group => {}
            }
        }

        tracing::trace!(frame = self.frames, "debug frame rendered");
        out
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}
