use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// A handle referencing a geometry registered with the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeometryHandle(pub u32);

/// Parametric geometry description. Triangles are generated on demand by
/// [`Geometry::build`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// Rectangle in the XY plane facing +Z.
    Plane { width: f32, height: f32 },
    /// Sphere or spherical patch. `phi` sweeps around Y, `theta` runs from
    /// the +Y pole down.
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
        phi_start: f32,
        phi_length: f32,
        theta_start: f32,
        theta_length: f32,
    },
    /// Torus around the Z axis.
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
        arc: f32,
    },
}

impl Geometry {
    pub fn plane(width: f32, height: f32) -> Self {
        Self::Plane { width, height }
    }

    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::Sphere {
            radius,
            width_segments,
            height_segments,
            phi_start: 0.0,
            phi_length: TAU,
            theta_start: 0.0,
            theta_length: PI,
        }
    }

    /// Restrict a sphere's horizontal sweep. No effect on other shapes.
    pub fn with_phi(self, start: f32, length: f32) -> Self {
        match self {
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
                theta_start,
                theta_length,
                ..
            } => Self::Sphere {
                radius,
                width_segments,
                height_segments,
                phi_start: start,
                phi_length: length,
                theta_start,
                theta_length,
            },
            other => other,
        }
    }

    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        Self::Torus {
            radius,
            tube,
            radial_segments,
            tubular_segments,
            arc: TAU,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Plane { .. } => "plane",
            Self::Sphere { .. } => "sphere",
            Self::Torus { .. } => "torus",
        }
    }

    /// Generate indexed triangles.
    pub fn build(&self) -> MeshData {
        match *self {
            Self::Plane { width, height } => plane_mesh(width, height),
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
                phi_start,
                phi_length,
                theta_start,
                theta_length,
            } => sphere_mesh(
                radius,
                width_segments.max(3),
                height_segments.max(2),
                (phi_start, phi_length),
                (theta_start, theta_length),
            ),
            Self::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
                arc,
            } => torus_mesh(
                radius,
                tube,
                radial_segments.max(3),
                tubular_segments.max(3),
                arc,
            ),
        }
    }
}

/// CPU-side triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    fn push(&mut self, position: Vec3, normal: Vec3) {
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
    }
}

fn plane_mesh(width: f32, height: f32) -> MeshData {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let mut mesh = MeshData::default();
    for (x, y) in [(-hw, hh), (hw, hh), (-hw, -hh), (hw, -hh)] {
        mesh.push(Vec3::new(x, y, 0.0), Vec3::Z);
    }
    mesh.indices = vec![0, 2, 1, 2, 3, 1];
    mesh
}

fn sphere_mesh(
    radius: f32,
    width_segments: u32,
    height_segments: u32,
    (phi_start, phi_length): (f32, f32),
    (theta_start, theta_length): (f32, f32),
) -> MeshData {
    let theta_end = (theta_start + theta_length).min(PI);
    let row = width_segments + 1;
    let mut mesh = MeshData::default();

    for iy in 0..=height_segments {
        let theta = theta_start + iy as f32 / height_segments as f32 * theta_length;
        for ix in 0..=width_segments {
            let phi = phi_start + ix as f32 / width_segments as f32 * phi_length;
            let p = Vec3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            mesh.push(p, p.normalize_or_zero());
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            // Pole rows collapse to a point; only one triangle per quad there.
            if iy != 0 || theta_start > 0.0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 || theta_end < PI {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

fn torus_mesh(
    radius: f32,
    tube: f32,
    radial_segments: u32,
    tubular_segments: u32,
    arc: f32,
) -> MeshData {
    let row = tubular_segments + 1;
    let mut mesh = MeshData::default();

    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * arc;
            let p = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            mesh.push(p, (p - center).normalize_or_zero());
        }
    }

    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unit_normals(mesh: &MeshData) {
        for n in &mesh.normals {
            let len = Vec3::from_array(*n).length();
            assert!((len - 1.0).abs() < 1e-4, "normal length {len}");
        }
    }

    fn assert_indices_in_range(mesh: &MeshData) {
        let n = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
        assert_eq!(mesh.index_count() % 3, 0);
    }

    #[test]
    fn plane_spans_its_extent() {
        let mesh = Geometry::plane(10.0, 4.0).build();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
        for p in &mesh.positions {
            assert_eq!(p[0].abs(), 5.0);
            assert_eq!(p[1].abs(), 2.0);
            assert_eq!(p[2], 0.0);
        }
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn full_sphere_skips_pole_triangles() {
        let mesh = Geometry::sphere(0.3, 32, 32).build();
        assert_eq!(mesh.vertex_count(), 33 * 33);
        assert_eq!(mesh.index_count(), 6 * 32 * 31);
        assert_unit_normals(&mesh);
        assert_indices_in_range(&mesh);
        for p in &mesh.positions {
            let r = Vec3::from_array(*p).length();
            assert!((r - 0.3).abs() < 1e-5);
        }
    }

    #[test]
    fn half_sweep_sphere_stays_on_one_side() {
        let mesh = Geometry::sphere(1.5, 64, 64).with_phi(0.0, PI).build();
        assert_eq!(mesh.vertex_count(), 65 * 65);
        // z = r sin(phi) sin(theta) >= 0 for phi in [0, pi]
        assert!(mesh.positions.iter().all(|p| p[2] >= -1e-5));
        assert_indices_in_range(&mesh);
    }

    #[test]
    fn torus_counts_and_normals() {
        let mesh = Geometry::torus(0.4, 0.1, 32, 32).build();
        assert_eq!(mesh.vertex_count(), 33 * 33);
        assert_eq!(mesh.index_count(), 6 * 32 * 32);
        assert_unit_normals(&mesh);
        assert_indices_in_range(&mesh);
        for p in &mesh.positions {
            let ring = Vec3::new(p[0], p[1], 0.0).length();
            assert!(ring >= 0.3 - 1e-5 && ring <= 0.5 + 1e-5);
        }
    }

    #[test]
    fn with_phi_ignores_non_spheres() {
        let plane = Geometry::plane(1.0, 1.0);
        assert_eq!(plane.with_phi(0.0, PI), plane);
        assert_eq!(Geometry::torus(1.0, 0.2, 8, 8).kind_name(), "torus");
    }
}
