use orbitlight_common::NodeId;
use orbitlight_scene::{NodeKind, SceneGraph};

/// Scene inspector for developer tooling.
///
/// Provides read-only queries against the scene graph for debugging and the
/// development overlay.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(scene: &SceneGraph) -> SceneSummary {
        let mut summary = SceneSummary {
            node_count: scene.len(),
            mesh_count: 0,
            light_count: 0,
            geometry_count: scene.geometries().len(),
            material_count: scene.materials().len(),
            helper_revision: None,
        };
        for node in scene.nodes().values() {
            match &node.kind {
                NodeKind::Mesh(_) => summary.mesh_count += 1,
                NodeKind::AreaLight(_) => summary.light_count += 1,
                NodeKind::LightHelper(h) => summary.helper_revision = Some(h.revision()),
                NodeKind::Group => {}
            }
        }
        summary
    }

    /// Describe one node with its local and world position.
    pub fn inspect_node(scene: &SceneGraph, id: NodeId) -> Option<NodeInfo> {
        let node = scene.get(id)?;
        let world = scene.world_position(id)?;
        let local = node.transform.position;
        Some(NodeInfo {
            id,
            name: node.name.clone(),
            kind: node.kind.label(),
            local_position: local.to_array(),
            world_position: world.to_array(),
            children: node.children().len(),
        })
    }

    /// Every node in traversal order.
    pub fn list_nodes(scene: &SceneGraph) -> Vec<NodeInfo> {
        scene
            .traverse()
            .into_iter()
            .filter_map(|(id, _)| Self::inspect_node(scene, id))
            .collect()
    }
}

/// Summary of scene contents for the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSummary {
    pub node_count: usize,
    pub mesh_count: usize,
    pub light_count: usize,
    pub geometry_count: usize,
    pub material_count: usize,
    /// Refresh count of the (first) light helper, if the scene has one.
    pub helper_revision: Option<u64>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} meshes={} lights={} geometries={} materials={}",
            self.node_count,
            self.mesh_count,
            self.light_count,
            self.geometry_count,
            self.material_count
        )?;
        if let Some(rev) = self.helper_revision {
            write!(f, " helper_rev={rev}")?;
        }
        Ok(())
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub local_position: [f32; 3],
    pub world_position: [f32; 3],
    pub children: usize,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}) world=({:.2}, {:.2}, {:.2}) children={}",
            self.id.short(),
            self.name,
            self.kind,
            self.world_position[0],
            self.world_position[1],
            self.world_position[2],
            self.children,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use orbitlight_common::Transform;
    use orbitlight_scene::{Color, Geometry, Mesh, StandardMaterial};

    fn scene() -> (SceneGraph, NodeId, NodeId) {
        let mut scene = SceneGraph::new();
        let geometry = scene.add_geometry(Geometry::torus(0.4, 0.1, 8, 8));
        let material = scene.add_material(StandardMaterial::new(Color::WHITE));
        let pivot = scene.add(
            "pivot",
            Transform::from_rotation(Quat::from_rotation_y(std::f32::consts::PI)),
            NodeKind::Group,
        );
        let torus = scene
            .add_mesh(
                Some(pivot),
                "torus",
                Transform::from_position(Vec3::new(3.0, 0.5, 0.0)),
                Mesh { geometry, material },
            )
            .unwrap();
        (scene, pivot, torus)
    }

    #[test]
    fn summary_empty_scene() {
        let summary = SceneInspector::summary(&SceneGraph::new());
        assert_eq!(summary.node_count, 0);
        assert_eq!(summary.helper_revision, None);
    }

    #[test]
    fn summary_counts_kinds() {
        let (scene, _, _) = scene();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.node_count, 2);
        assert_eq!(summary.mesh_count, 1);
        assert_eq!(summary.light_count, 0);
        assert_eq!(summary.geometry_count, 1);
        assert!(format!("{summary}").contains("meshes=1"));
    }

    #[test]
    fn inspect_node_reports_world_position() {
        let (scene, pivot, torus) = scene();
        let info = SceneInspector::inspect_node(&scene, torus).unwrap();
        assert_eq!(info.kind, "mesh");
        assert_eq!(info.local_position, [3.0, 0.5, 0.0]);
        assert!((info.world_position[0] + 3.0).abs() < 1e-5);
        assert!(format!("{info}").contains("torus (mesh)"));

        let pivot_info = SceneInspector::inspect_node(&scene, pivot).unwrap();
        assert_eq!(pivot_info.children, 1);
    }

    #[test]
    fn inspect_node_not_found() {
        let (scene, _, _) = scene();
        assert!(SceneInspector::inspect_node(&scene, NodeId::new()).is_none());
    }

    #[test]
    fn list_nodes_in_traversal_order() {
        let (scene, pivot, torus) = scene();
        let ids: Vec<NodeId> = SceneInspector::list_nodes(&scene).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![pivot, torus]);
    }
}
