use glam::{Vec2, Vec3};
use toit_core::{BranchPolicy, JsonFileStore, MemoryStore, NodeId, NodeStore, SceneGraph};
use toit_viewport::{MindMapView, ViewportConfig};

const SIZE: Vec2 = Vec2::new(1024.0, 768.0);

fn config() -> ViewportConfig {
    let mut config = ViewportConfig::new();
    config.graph.layout_radius = 2.0;
    config
}

fn screen_position<S: NodeStore>(view: &MindMapView<S>, id: NodeId) -> Vec2 {
    let world = view.graph().node(id).unwrap().world_position();
    let clip = view.camera().view_projection_matrix().unwrap() * world.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    Vec2::new((ndc.x + 1.0) * 0.5 * SIZE.x, (1.0 - ndc.y) * 0.5 * SIZE.y)
}

fn tap<S: NodeStore>(view: &mut MindMapView<S>, id: NodeId) -> Option<NodeId> {
    let pixel = screen_position(view, id);
    view.tap(pixel).unwrap()
}

#[test]
fn build_connect_and_persist() {
    let mut view = MindMapView::new(config(), MemoryStore::new(), SIZE).unwrap();
    let root = view.add_node("root");
    let ideas: Vec<NodeId> = (0..3).map(|i| view.add_node(format!("idea {i}"))).collect();

    for idea in &ideas {
        tap(&mut view, root);
        tap(&mut view, *idea);
        let branch = view.connect_selected().unwrap().unwrap();
        assert!(branch.joins(root, *idea));
    }
    assert_eq!(view.graph().branches().len(), 3);
    assert_eq!(view.graph().node(root).unwrap().connections().len(), 3);

    let frame = view.frame().unwrap();
    assert_eq!(frame.nodes.len(), 4);
    assert_eq!(frame.branches.len(), 3);
    assert!(frame.selected_node().is_none());

    view.save().unwrap();
    let records = view.store().records().to_vec();
    let restored = SceneGraph::from_records(&records);
    assert_eq!(restored.node_ids(), view.graph().node_ids());
    assert_eq!(restored.branches().len(), 3);
}

#[test]
fn picking_survives_camera_moves() {
    let mut view = MindMapView::new(config(), MemoryStore::new(), SIZE).unwrap();
    let a = view.add_node("a");
    let b = view.add_node("b");

    view.orbit(40.0, -25.0);
    view.zoom(0.5);
    view.roll(0.4);
    view.pan(-15.0, 8.0);

    assert_eq!(tap(&mut view, b), Some(b));
    assert_eq!(tap(&mut view, a), Some(a));
    assert_eq!(view.last_selected(), Some(b));
}

#[test]
fn dedupe_policy_from_config() {
    let mut config = config();
    config.graph.branch_policy = BranchPolicy::Dedupe;
    let mut view = MindMapView::new(config, MemoryStore::new(), SIZE).unwrap();
    let a = view.add_node("a");
    let b = view.add_node("b");

    for _ in 0..2 {
        tap(&mut view, a);
        tap(&mut view, b);
        view.connect_selected().unwrap();
    }
    assert_eq!(view.graph().branches().len(), 1);
}

#[test]
fn json_store_round_trip_through_view() {
    let dir = std::env::temp_dir().join(format!("toit-flow-{}", uuid::Uuid::new_v4()));
    let path = dir.join("nodes.json");

    let (a, b) = {
        let mut view = MindMapView::new(config(), JsonFileStore::new(&path), SIZE).unwrap();
        let a = view.add_node("a");
        let b = view.add_node("b");
        view.set_description(b, "details").unwrap();
        tap(&mut view, a);
        tap(&mut view, b);
        view.connect_selected().unwrap();
        // Connecting clears the selection, so there is nothing to drag
        assert_eq!(view.drag_selected(SIZE * 0.5).unwrap(), None);
        view.save().unwrap();
        (a, b)
    };

    let mut view = MindMapView::new(config(), JsonFileStore::new(&path), SIZE).unwrap();
    view.load().unwrap();
    assert_eq!(view.graph().node_ids(), &[a, b]);
    assert_eq!(view.graph().node(b).unwrap().description, "details");
    assert!(view.graph().node(a).unwrap().is_connected_with(b));
    assert_eq!(view.graph().node(b).unwrap().position(), Vec3::new(2.0, 0.0, 0.0));

    let _ = std::fs::remove_dir_all(dir);
}
