use crate::config::{FrameOrder, SceneConfig};
use glam::{Quat, Vec3};
use orbitlight_common::{NodeId, Transform, deg_to_rad};
use orbitlight_input::{CameraAction, OrbitControls};
use orbitlight_render::Renderer;
use orbitlight_scene::{
    AreaLightSupport, Color, Geometry, Mesh, NodeKind, PerspectiveCamera, RectAreaLight,
    RectAreaLightHelper, SceneError, SceneGraph, Side, StandardMaterial,
};
use std::f32::consts::PI;

/// Number of tori in the static ring.
pub const RING_COUNT: usize = 8;

/// Offset of each orbiting mesh from its pivot.
const ORBIT_OFFSET: Vec3 = Vec3::new(3.0, 0.5, 0.0);

/// Drawing surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Rotation of the animated pivot about +Y at `elapsed_ms`.
pub fn pivot_angle(elapsed_ms: f64, degrees_per_second: f32) -> f32 {
    let seconds = elapsed_ms * 0.001;
    deg_to_rad((seconds * degrees_per_second as f64) as f32)
}

/// The scene application: scene graph, camera, orbit controls, area light and
/// animation state, owned in one place.
pub struct SceneApp {
    config: SceneConfig,
    scene: SceneGraph,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    viewport: Viewport,
    light: NodeId,
    helper: Option<NodeId>,
    ring_pivots: Vec<NodeId>,
    orbit_pivot: NodeId,
    orbit_sphere: NodeId,
    updates: u64,
}

impl SceneApp {
    /// Build the whole scene for a surface of the given size.
    ///
    /// The host should still call [`SceneApp::resize`] once with its renderer
    /// so the drawing surface matches.
    pub fn new(config: SceneConfig, viewport: Viewport) -> Result<Self, SceneError> {
        let mut scene = SceneGraph::new();

        let mut camera = PerspectiveCamera::new(
            config.camera.fov_degrees,
            viewport.aspect(),
            config.camera.near,
            config.camera.far,
        );
        camera.position = config.camera.position;
        camera.look_at(Vec3::ZERO);

        let (light, helper) = setup_light(&mut scene, &config);
        let ring_pivots = setup_static_models(&mut scene)?;
        let (orbit_pivot, orbit_sphere) = setup_orbiter(&mut scene)?;

        let controls = OrbitControls::attach(&camera, viewport.height);

        tracing::info!(
            nodes = scene.len(),
            width = viewport.width,
            height = viewport.height,
            order = %config.frame_order,
            "scene initialized"
        );

        Ok(Self {
            config,
            scene,
            camera,
            controls,
            viewport,
            light,
            helper,
            ring_pivots,
            orbit_pivot,
            orbit_sphere,
            updates: 0,
        })
    }

    /// Match camera and renderer to a new surface size. Zero sizes clamp to 1.
    pub fn resize<R: Renderer>(&mut self, renderer: &mut R, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.camera.aspect = self.viewport.aspect();
        self.camera.update_projection_matrix();
        self.controls.set_viewport_height(self.viewport.height);
        renderer.resize(self.viewport.width, self.viewport.height);
        tracing::debug!(
            width = self.viewport.width,
            height = self.viewport.height,
            aspect = self.camera.aspect,
            "viewport resized"
        );
    }

    /// Advance the animation to `elapsed_ms`: turn the pivot, re-target the
    /// light at the sphere, refresh the helper.
    ///
    /// Skips silently if the pivot or sphere is no longer in the scene.
    pub fn update(&mut self, elapsed_ms: f64) {
        if self.scene.get(self.orbit_pivot).is_none() || self.scene.get(self.orbit_sphere).is_none()
        {
            tracing::trace!(elapsed_ms, "orbit pivot or sphere missing, skipping update");
            return;
        }

        let angle = pivot_angle(elapsed_ms, self.config.animation.degrees_per_second);
        self.scene.set_rotation(self.orbit_pivot, Quat::from_rotation_y(angle));

        let Some(sphere) = self.scene.world_position(self.orbit_sphere) else {
            return;
        };
        if self.config.light.turn_to_target {
            self.scene.aim_light(self.light, sphere);
        } else if let Some(light) = self.scene.area_light_mut(self.light) {
            light.set_target(sphere);
        }
        if let Some(helper) = self.helper {
            self.scene.refresh_helper(helper, self.light);
        }

        self.updates += 1;
        tracing::trace!(elapsed_ms, angle, ?sphere, "frame updated");
    }

    /// Produce one frame: draw and update in the configured order.
    pub fn frame<R: Renderer>(&mut self, renderer: &mut R, elapsed_ms: f64) -> R::Output {
        match self.config.frame_order {
            FrameOrder::UpdateThenDraw => {
                self.update(elapsed_ms);
                renderer.render(&self.scene, &self.camera)
            }
            FrameOrder::DrawThenUpdate => {
                let output = renderer.render(&self.scene, &self.camera);
                self.update(elapsed_ms);
                output
            }
        }
    }

    pub fn apply_camera_action(&mut self, action: CameraAction) {
        self.controls.apply(&mut self.camera, action);
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn light_node(&self) -> NodeId {
        self.light
    }

    pub fn helper_node(&self) -> Option<NodeId> {
        self.helper
    }

    pub fn ring_pivots(&self) -> &[NodeId] {
        &self.ring_pivots
    }

    pub fn orbit_pivot(&self) -> NodeId {
        self.orbit_pivot
    }

    pub fn orbit_sphere(&self) -> NodeId {
        self.orbit_sphere
    }

    /// Current light target, if the light is still in the scene.
    pub fn light_target(&self) -> Option<Vec3> {
        self.scene.area_light(self.light).map(|l| l.target())
    }

    /// Number of updates that ran (skipped ones excluded).
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

fn setup_light(scene: &mut SceneGraph, config: &SceneConfig) -> (NodeId, Option<NodeId>) {
    let support = AreaLightSupport::init();
    let cfg = &config.light;
    let light = RectAreaLight::new(&support, cfg.color, cfg.intensity, cfg.width, cfg.height);
    let transform = Transform {
        position: cfg.position,
        rotation: Quat::from_rotation_x(deg_to_rad(-90.0)),
        ..Transform::default()
    };

    let helper = config
        .show_helper
        .then(|| RectAreaLightHelper::new(&light, transform.matrix()));
    let light = scene.add("areaLight", transform, NodeKind::AreaLight(light));
    let helper = helper.map(|state| {
        scene.add("areaLightHelper", Transform::default(), NodeKind::LightHelper(state))
    });
    (light, helper)
}

fn setup_static_models(scene: &mut SceneGraph) -> Result<Vec<NodeId>, SceneError> {
    let flat = Quat::from_rotation_x(deg_to_rad(-90.0));

    let ground = Mesh {
        geometry: scene.add_geometry(Geometry::plane(10.0, 10.0)),
        material: scene.add_material(
            StandardMaterial::new(Color::from_hex("#7E41D9")?)
                .roughness(0.5)
                .metalness(0.5)
                .side(Side::Double),
        ),
    };
    scene.add_mesh(None, "ground", Transform::from_rotation(flat), ground)?;

    let dome = Mesh {
        geometry: scene.add_geometry(Geometry::sphere(1.5, 64, 64).with_phi(0.0, PI)),
        material: scene.add_material(
            StandardMaterial::new(Color::from_hex("#FFE400")?)
                .roughness(0.1)
                .metalness(0.2),
        ),
    };
    scene.add_mesh(None, "bigSphere", Transform::from_rotation(flat), dome)?;

    let torus = Mesh {
        geometry: scene.add_geometry(Geometry::torus(0.4, 0.1, 32, 32)),
        material: scene.add_material(
            StandardMaterial::new(Color::from_hex("#47C83E")?)
                .roughness(0.5)
                .metalness(0.9),
        ),
    };
    let mut pivots = Vec::with_capacity(RING_COUNT);
    for i in 0..RING_COUNT {
        let rotation = Quat::from_rotation_y(deg_to_rad(45.0 * i as f32));
        let pivot = scene.add(
            format!("torusPivot{i}"),
            Transform::from_rotation(rotation),
            NodeKind::Group,
        );
        scene.add_mesh(
            Some(pivot),
            format!("torus{i}"),
            Transform::from_position(ORBIT_OFFSET),
            torus,
        )?;
        pivots.push(pivot);
    }
    Ok(pivots)
}

fn setup_orbiter(scene: &mut SceneGraph) -> Result<(NodeId, NodeId), SceneError> {
    let ball = Mesh {
        geometry: scene.add_geometry(Geometry::sphere(0.3, 32, 32)),
        material: scene.add_material(
            StandardMaterial::new(Color::from_hex("#664B00")?)
                .roughness(0.2)
                .metalness(0.5),
        ),
    };
    let pivot = scene.add("smallSpherePivot", Transform::default(), NodeKind::Group);
    let sphere = scene.add_mesh(
        Some(pivot),
        "smallSphere",
        Transform::from_position(ORBIT_OFFSET),
        ball,
    )?;
    Ok((pivot, sphere))
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitlight_render::DebugTextRenderer;
    use std::f32::consts::TAU;

    fn app() -> SceneApp {
        SceneApp::new(SceneConfig::default(), Viewport::new(800, 600)).unwrap()
    }

    fn pivot_rotation(app: &SceneApp) -> Quat {
        app.scene().get(app.orbit_pivot()).unwrap().transform.rotation
    }

    /// Light target as printed by the debug renderer.
    fn drawn_target(output: &str) -> String {
        output
            .lines()
            .find(|l| l.contains("light areaLight"))
            .and_then(|l| l.split("target=").nth(1))
            .and_then(|s| s.split_once(" intensity"))
            .map(|(target, _)| target.to_string())
            .unwrap()
    }

    #[test]
    fn scene_has_expected_contents() {
        let app = app();
        let scene = app.scene();
        // ground, dome, 8 pivots + 8 tori, pivot + sphere, light, helper
        assert_eq!(scene.len(), 2 + 2 * RING_COUNT + 2 + 2);
        assert_eq!(app.ring_pivots().len(), RING_COUNT);
        assert_eq!(scene.find_by_name("smallSpherePivot"), Some(app.orbit_pivot()));
        assert!(app.helper_node().is_some());
        // tori share one geometry and one material
        assert_eq!(scene.geometries().len(), 4);
        assert_eq!(scene.materials().len(), 4);
    }

    #[test]
    fn pivot_angle_scenarios() {
        assert_eq!(pivot_angle(0.0, 50.0), 0.0);
        assert!((pivot_angle(1000.0, 50.0) - deg_to_rad(50.0)).abs() < 1e-6);
        let full = pivot_angle(7200.0, 50.0);
        assert!((full - deg_to_rad(360.0)).abs() < 1e-5);
        assert!(full.sin().abs() < 1e-5 && (full.cos() - 1.0).abs() < 1e-5);
        assert!((full - TAU).abs() < 1e-5);
    }

    #[test]
    fn update_is_a_pure_function_of_time() {
        let mut app = app();
        app.update(1234.0);
        let first = pivot_rotation(&app);
        let target = app.light_target().unwrap();
        app.update(5000.0);
        app.update(1234.0);
        assert_eq!(pivot_rotation(&app), first);
        assert_eq!(app.light_target().unwrap(), target);
        assert_eq!(first, Quat::from_rotation_y(pivot_angle(1234.0, 50.0)));
    }

    #[test]
    fn light_target_tracks_sphere_world_position() {
        let mut app = app();
        for t in [0.0, 16.7, 1000.0, 2500.0, 7200.0, 123_456.0] {
            app.update(t);
            let sphere = app.scene().world_position(app.orbit_sphere()).unwrap();
            assert_eq!(app.light_target().unwrap(), sphere);

            let expected = Quat::from_rotation_y(pivot_angle(t, 50.0)) * ORBIT_OFFSET;
            assert!(sphere.abs_diff_eq(expected, 1e-5), "t={t}: {sphere:?} vs {expected:?}");
        }
    }

    #[test]
    fn update_refreshes_helper() {
        let mut app = app();
        let helper = app.helper_node().unwrap();
        app.update(1000.0);
        app.update(2000.0);
        let h = app.scene().light_helper(helper).unwrap();
        assert_eq!(h.revision(), 2);
        assert_eq!(h.segments()[4].1, app.light_target().unwrap());
    }

    #[test]
    fn light_orientation_is_fixed_by_default() {
        let mut app = app();
        let before = app.scene().get(app.light_node()).unwrap().transform;
        app.update(3000.0);
        assert_eq!(app.scene().get(app.light_node()).unwrap().transform, before);
    }

    #[test]
    fn turn_to_target_reorients_light() {
        let mut config = SceneConfig::default();
        config.light.turn_to_target = true;
        let mut app = SceneApp::new(config, Viewport::new(800, 600)).unwrap();
        app.update(3000.0);
        let light = app.scene().get(app.light_node()).unwrap().transform;
        let facing = light.rotation * Vec3::NEG_Z;
        let to_target = (app.light_target().unwrap() - light.position).normalize();
        assert!(facing.abs_diff_eq(to_target, 1e-5));
    }

    #[test]
    fn missing_pivot_skips_update_without_side_effects() {
        let mut app = app();
        app.update(1000.0);
        let target = app.light_target().unwrap();
        let helper_rev = app
            .scene()
            .light_helper(app.helper_node().unwrap())
            .unwrap()
            .revision();

        let pivot = app.orbit_pivot();
        app.scene_mut().remove(pivot);
        app.update(2000.0);

        assert_eq!(app.light_target().unwrap(), target);
        assert_eq!(
            app.scene().light_helper(app.helper_node().unwrap()).unwrap().revision(),
            helper_rev
        );
        assert_eq!(app.updates(), 1);
    }

    #[test]
    fn missing_sphere_skips_update_without_side_effects() {
        let mut app = app();
        app.update(1000.0);
        let target = app.light_target().unwrap();
        let helper_rev = app
            .scene()
            .light_helper(app.helper_node().unwrap())
            .unwrap()
            .revision();
        let pivot = app.orbit_pivot();
        let rotation = app.scene().get(pivot).unwrap().transform.rotation;

        let sphere = app.orbit_sphere();
        app.scene_mut().remove(sphere);
        app.update(2000.0);

        assert!(app.scene().get(pivot).is_some());
        assert_eq!(app.scene().get(pivot).unwrap().transform.rotation, rotation);
        assert_eq!(app.light_target().unwrap(), target);
        assert_eq!(
            app.scene().light_helper(app.helper_node().unwrap()).unwrap().revision(),
            helper_rev
        );
        assert_eq!(app.updates(), 1);
    }

    #[test]
    fn resize_recomputes_aspect_and_surface() {
        let mut app = app();
        let mut renderer = DebugTextRenderer::new(1, 1);

        for (w, h, aspect) in [
            (800, 400, 2.0),
            (1024, 512, 2.0),
            (800, 600, 800.0 / 600.0),
            (1024, 768, 1024.0 / 768.0),
        ] {
            app.resize(&mut renderer, w, h);
            assert_eq!(app.camera().aspect, aspect);
            assert_eq!(app.viewport(), Viewport { width: w, height: h });
            assert_eq!(renderer.size(), (w, h));
            assert_eq!(
                app.camera().projection_matrix(),
                glam::Mat4::perspective_rh(75f32.to_radians(), aspect, 0.1, 100.0)
            );
        }
    }

    #[test]
    fn resize_clamps_zero_dimensions() {
        let mut app = app();
        let mut renderer = DebugTextRenderer::new(1, 1);
        app.resize(&mut renderer, 0, 0);
        assert_eq!(app.viewport(), Viewport { width: 1, height: 1 });
        assert_eq!(app.camera().aspect, 1.0);
    }

    #[test]
    fn ring_pivots_never_move() {
        let mut app = app();
        let mut renderer = DebugTextRenderer::new(800, 600);
        for frame in 0..240 {
            app.frame(&mut renderer, frame as f64 * 16.0);
        }
        for (i, id) in app.ring_pivots().iter().enumerate() {
            let rotation = app.scene().get(*id).unwrap().transform.rotation;
            assert_eq!(rotation, Quat::from_rotation_y(deg_to_rad(45.0 * i as f32)));
        }
    }

    #[test]
    fn update_then_draw_shows_current_state() {
        let mut app = app();
        let mut renderer = DebugTextRenderer::new(800, 600);
        let out = app.frame(&mut renderer, 1000.0);
        let t = app.light_target().unwrap();
        assert_eq!(drawn_target(&out), format!("({:.2}, {:.2}, {:.2})", t.x, t.y, t.z));
    }

    #[test]
    fn draw_then_update_lags_one_frame() {
        let config = SceneConfig {
            frame_order: FrameOrder::DrawThenUpdate,
            ..SceneConfig::default()
        };
        let mut app = SceneApp::new(config, Viewport::new(800, 600)).unwrap();
        let mut renderer = DebugTextRenderer::new(800, 600);

        app.frame(&mut renderer, 1000.0);
        let after_first = app.light_target().unwrap();
        let out = app.frame(&mut renderer, 2000.0);
        assert_eq!(
            drawn_target(&out),
            format!("({:.2}, {:.2}, {:.2})", after_first.x, after_first.y, after_first.z)
        );
        assert_ne!(app.light_target().unwrap(), after_first);
    }

    #[test]
    fn hidden_helper_is_not_created() {
        let config = SceneConfig {
            show_helper: false,
            ..SceneConfig::default()
        };
        let mut app = SceneApp::new(config, Viewport::new(800, 600)).unwrap();
        assert!(app.helper_node().is_none());
        app.update(500.0);
        assert!(app.light_target().is_some());
    }

    #[test]
    fn camera_actions_reach_the_camera() {
        let mut app = app();
        let start = app.camera().position;
        app.apply_camera_action(CameraAction::Rotate(glam::Vec2::new(100.0, 0.0)));
        assert_ne!(app.camera().position, start);
        app.apply_camera_action(CameraAction::Reset);
        assert!(app.camera().position.abs_diff_eq(start, 1e-4));
    }
}
