use crate::SceneError;
use crate::geometry::{Geometry, GeometryHandle};
use crate::light::{RectAreaLight, RectAreaLightHelper};
use crate::material::{MaterialHandle, StandardMaterial};
use glam::{Mat4, Quat, Vec3};
use orbitlight_common::{NodeId, Transform};
use std::collections::BTreeMap;

/// Drawable reference to shared geometry and material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mesh {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
}

/// What a node carries besides its transform.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Empty node, used as a pivot for its children.
    Group,
    Mesh(Mesh),
    AreaLight(RectAreaLight),
    LightHelper(RectAreaLightHelper),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Mesh(_) => "mesh",
            Self::AreaLight(_) => "area-light",
            Self::LightHelper(_) => "light-helper",
        }
    }
}

/// A node in the scene hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// Transform relative to the parent (or the scene root).
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Scene hierarchy plus the geometry and material tables its meshes share.
///
/// Nodes are stored in a BTreeMap for deterministic lookups. Traversal goes
/// depth-first from the roots in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    roots: Vec<NodeId>,
    geometries: Vec<Geometry>,
    materials: Vec<StandardMaterial>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryHandle {
        self.geometries.push(geometry);
        GeometryHandle(self.geometries.len() as u32 - 1)
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<&Geometry> {
        self.geometries.get(handle.0 as usize)
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn add_material(&mut self, material: StandardMaterial) -> MaterialHandle {
        self.materials.push(material);
        MaterialHandle(self.materials.len() as u32 - 1)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&StandardMaterial> {
        self.materials.get(handle.0 as usize)
    }

    pub fn materials(&self) -> &[StandardMaterial] {
        &self.materials
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Add a top-level node.
    pub fn add(&mut self, name: impl Into<String>, transform: Transform, kind: NodeKind) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(
            id,
            Node {
                name: name.into(),
                transform,
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        self.roots.push(id);
        id
    }

    /// Add a node under `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        kind: NodeKind,
    ) -> Result<NodeId, SceneError> {
        let id = NodeId::new();
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(SceneError::NodeNotFound(parent))?;
        parent_node.children.push(id);
        self.nodes.insert(
            id,
            Node {
                name: name.into(),
                transform,
                kind,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Add a mesh node, checking that both handles are registered.
    pub fn add_mesh(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        transform: Transform,
        mesh: Mesh,
    ) -> Result<NodeId, SceneError> {
        if self.geometry(mesh.geometry).is_none() {
            return Err(SceneError::UnknownGeometry(mesh.geometry));
        }
        if self.material(mesh.material).is_none() {
            return Err(SceneError::UnknownMaterial(mesh.material));
        }
        match parent {
            Some(parent) => self.add_child(parent, name, transform, NodeKind::Mesh(mesh)),
            None => Ok(self.add(name, transform, NodeKind::Mesh(mesh))),
        }
    }

    /// Remove a node and its whole subtree. Returns the removed node.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        match node.parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        let mut stack = node.children.clone();
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                stack.extend(removed.children);
            }
        }
        Some(node)
    }

    /// First node with the given name in traversal order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse()
            .into_iter()
            .map(|(id, _)| id)
            .find(|id| self.nodes[id].name == name)
    }

    /// Replace only the local rotation.
    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.transform.rotation = rotation;
                true
            }
            None => false,
        }
    }

    /// Local-to-world matrix, accumulated through all ancestors.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    /// Every node with its world matrix, depth-first from the roots.
    pub fn traverse(&self) -> Vec<(NodeId, Mat4)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|id| (*id, Mat4::IDENTITY))
            .collect();
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let world = parent_world * node.transform.matrix();
            out.push((id, world));
            stack.extend(node.children.iter().rev().map(|c| (*c, world)));
        }
        out
    }

    pub fn area_light(&self, id: NodeId) -> Option<&RectAreaLight> {
        match &self.nodes.get(&id)?.kind {
            NodeKind::AreaLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn area_light_mut(&mut self, id: NodeId) -> Option<&mut RectAreaLight> {
        match &mut self.nodes.get_mut(&id)?.kind {
            NodeKind::AreaLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn light_helper(&self, id: NodeId) -> Option<&RectAreaLightHelper> {
        match &self.nodes.get(&id)?.kind {
            NodeKind::LightHelper(helper) => Some(helper),
            _ => None,
        }
    }

    /// Set a light's target and turn the light to face it.
    ///
    /// The light keeps its orientation when the target sits exactly on the
    /// light's position.
    pub fn aim_light(&mut self, light: NodeId, target: Vec3) -> bool {
        let Some(world) = self.world_matrix(light) else {
            return false;
        };
        let parent_rotation = self
            .nodes
            .get(&light)
            .and_then(|n| n.parent)
            .and_then(|p| self.world_matrix(p))
            .map(|m| m.to_scale_rotation_translation().1)
            .unwrap_or(Quat::IDENTITY);
        let aim = RectAreaLight::aim_rotation(world.w_axis.truncate(), target);

        let Some(node) = self.nodes.get_mut(&light) else {
            return false;
        };
        let NodeKind::AreaLight(area_light) = &mut node.kind else {
            return false;
        };
        area_light.set_target(target);
        if let Some(world_rotation) = aim {
            node.transform.rotation = parent_rotation.inverse() * world_rotation;
        }
        true
    }

    /// Rebuild a helper from its light's current state.
    pub fn refresh_helper(&mut self, helper: NodeId, light: NodeId) -> bool {
        let (Some(area_light), Some(world)) =
            (self.area_light(light).cloned(), self.world_matrix(light))
        else {
            return false;
        };
        match self.nodes.get_mut(&helper).map(|n| &mut n.kind) {
            Some(NodeKind::LightHelper(h)) => {
                h.update(&area_light, world);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::AreaLightSupport;
    use crate::material::Color;
    use std::f32::consts::FRAC_PI_2;

    fn graph_with_assets() -> (SceneGraph, Mesh) {
        let mut graph = SceneGraph::new();
        let geometry = graph.add_geometry(Geometry::sphere(0.3, 8, 8));
        let material = graph.add_material(StandardMaterial::new(Color::WHITE));
        (graph, Mesh { geometry, material })
    }

    #[test]
    fn graph_starts_empty() {
        let g = SceneGraph::new();
        assert!(g.is_empty());
        assert!(g.roots().is_empty());
    }

    #[test]
    fn child_world_position_follows_pivot_rotation() {
        let (mut g, mesh) = graph_with_assets();
        let pivot = g.add("pivot", Transform::default(), NodeKind::Group);
        let ball = g
            .add_mesh(
                Some(pivot),
                "ball",
                Transform::from_position(Vec3::new(3.0, 0.5, 0.0)),
                mesh,
            )
            .unwrap();

        assert!(g.world_position(ball).unwrap().abs_diff_eq(Vec3::new(3.0, 0.5, 0.0), 1e-6));

        assert!(g.set_rotation(pivot, Quat::from_rotation_y(FRAC_PI_2)));
        let p = g.world_position(ball).unwrap();
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.5, -3.0), 1e-5), "{p:?}");
    }

    #[test]
    fn add_child_to_missing_parent_fails() {
        let mut g = SceneGraph::new();
        let ghost = NodeId::new();
        let err = g
            .add_child(ghost, "x", Transform::default(), NodeKind::Group)
            .unwrap_err();
        assert!(matches!(err, SceneError::NodeNotFound(id) if id == ghost));
        assert!(g.is_empty());
    }

    #[test]
    fn add_mesh_rejects_unknown_handles() {
        let (mut g, mesh) = graph_with_assets();
        let bad_geometry = Mesh {
            geometry: GeometryHandle(9),
            ..mesh
        };
        assert!(matches!(
            g.add_mesh(None, "m", Transform::default(), bad_geometry),
            Err(SceneError::UnknownGeometry(_))
        ));
        let bad_material = Mesh {
            material: MaterialHandle(9),
            ..mesh
        };
        assert!(matches!(
            g.add_mesh(None, "m", Transform::default(), bad_material),
            Err(SceneError::UnknownMaterial(_))
        ));
    }

    #[test]
    fn remove_drops_subtree() {
        let (mut g, mesh) = graph_with_assets();
        let pivot = g.add("pivot", Transform::default(), NodeKind::Group);
        let ball = g
            .add_mesh(Some(pivot), "ball", Transform::default(), mesh)
            .unwrap();
        let other = g.add("other", Transform::default(), NodeKind::Group);

        let removed = g.remove(pivot).unwrap();
        assert_eq!(removed.name, "pivot");
        assert!(g.get(ball).is_none());
        assert_eq!(g.roots(), &[other]);
        assert_eq!(g.len(), 1);
        assert!(g.remove(pivot).is_none());
    }

    #[test]
    fn traverse_is_depth_first_in_insertion_order() {
        let mut g = SceneGraph::new();
        let a = g.add("a", Transform::default(), NodeKind::Group);
        let a1 = g.add_child(a, "a1", Transform::default(), NodeKind::Group).unwrap();
        let b = g.add("b", Transform::default(), NodeKind::Group);
        let a2 = g.add_child(a, "a2", Transform::default(), NodeKind::Group).unwrap();

        let order: Vec<NodeId> = g.traverse().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, a1, a2, b]);
        assert_eq!(g.find_by_name("a2"), Some(a2));
        assert_eq!(g.find_by_name("missing"), None);
    }

    #[test]
    fn traverse_matches_world_matrix() {
        let (mut g, mesh) = graph_with_assets();
        let pivot = g.add(
            "pivot",
            Transform::from_rotation(Quat::from_rotation_y(0.7)),
            NodeKind::Group,
        );
        let ball = g
            .add_mesh(
                Some(pivot),
                "ball",
                Transform::from_position(Vec3::new(3.0, 0.5, 0.0)),
                mesh,
            )
            .unwrap();
        let from_traverse = g
            .traverse()
            .into_iter()
            .find(|(id, _)| *id == ball)
            .map(|(_, m)| m)
            .unwrap();
        assert!(from_traverse.abs_diff_eq(g.world_matrix(ball).unwrap(), 1e-6));
    }

    #[test]
    fn aim_light_sets_target_and_orientation() {
        let mut g = SceneGraph::new();
        let support = AreaLightSupport::init();
        let light = g.add(
            "light",
            Transform::from_position(Vec3::new(0.0, 5.0, 0.0)),
            NodeKind::AreaLight(RectAreaLight::new(&support, Color::WHITE, 10.0, 6.0, 1.0)),
        );
        let target = Vec3::new(3.0, 0.5, 0.0);
        assert!(g.aim_light(light, target));
        assert_eq!(g.area_light(light).unwrap().target(), target);

        let facing = g.get(light).unwrap().transform.rotation * Vec3::NEG_Z;
        let expected = (target - Vec3::new(0.0, 5.0, 0.0)).normalize();
        assert!(facing.abs_diff_eq(expected, 1e-5));

        let group = g.add("g", Transform::default(), NodeKind::Group);
        assert!(!g.aim_light(group, target));
    }

    #[test]
    fn refresh_helper_tracks_light() {
        let mut g = SceneGraph::new();
        let support = AreaLightSupport::init();
        let area = RectAreaLight::new(&support, Color::WHITE, 10.0, 6.0, 1.0);
        let helper_state = RectAreaLightHelper::new(&area, Mat4::IDENTITY);
        let light = g.add(
            "light",
            Transform::from_position(Vec3::new(0.0, 5.0, 0.0)),
            NodeKind::AreaLight(area),
        );
        let helper = g.add("helper", Transform::default(), NodeKind::LightHelper(helper_state));

        g.aim_light(light, Vec3::new(1.0, 0.0, 1.0));
        assert!(g.refresh_helper(helper, light));
        let h = g.light_helper(helper).unwrap();
        assert_eq!(h.revision(), 1);
        assert_eq!(h.segments()[4].1, Vec3::new(1.0, 0.0, 1.0));

        assert!(!g.refresh_helper(light, light));
        assert!(!g.refresh_helper(helper, helper));
    }
}
