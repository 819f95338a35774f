use exo_sieve::prelude::*;

/// Strip of 10 quads over 22 nodes: bottom row 1..=11, top row 12..=22.
/// Block 10 holds quads 0..4 and block 20 quads 4..10.
fn strip() -> InMemoryExodus {
    let quad = |k: i64| [k + 1, k + 2, k + 13, k + 12];
    let block = |id: i64, ks: std::ops::Range<i64>| {
        MemBlock::new(id, "QUAD4", 4, ks.flat_map(quad).collect())
    };
    let x: Vec<f64> = (0..11).chain(0..11).map(f64::from).collect();
    let y: Vec<f64> = std::iter::repeat_n(0.0, 11)
        .chain(std::iter::repeat_n(1.0, 11))
        .collect();
    InMemoryExodus::new("strip", 3)
        .with_coordinates(vec![x, y, vec![0.0; 22]])
        .with_times(vec![0.0, 1.0])
        .with_block(ObjectType::ElemBlock, block(10, 0..4).named("left"))
        .with_block(ObjectType::ElemBlock, block(20, 4..10).named("right"))
        .with_variables(VarType::Nodal, &["DISPL_X", "DISPL_Y", "DISPL_Z"], None)
        .with_values(VarType::Nodal, 0, 0, 0, vec![0.0; 22])
        .with_values(VarType::Nodal, 0, 1, 0, vec![0.0; 22])
        .with_values(VarType::Nodal, 0, 2, 0, vec![0.0; 22])
        .with_values(VarType::Nodal, 1, 0, 0, vec![0.5; 22])
        .with_values(VarType::Nodal, 1, 1, 0, vec![0.0; 22])
        .with_values(VarType::Nodal, 1, 2, 0, vec![0.0; 22])
        .with_variables(
            VarType::ElemBlock,
            &["stress"],
            Some(vec![vec![true], vec![false]]),
        )
        .with_values(VarType::ElemBlock, 0, 0, 10, vec![1.0, 2.0, 3.0, 4.0])
        .with_values(VarType::ElemBlock, 1, 0, 10, vec![5.0, 6.0, 7.0, 8.0])
        .with_set(ObjectType::NodeSet, MemSet::new(1, vec![1, 2, 3]).named("bottom"))
        .with_set(
            ObjectType::SideSet,
            MemSet::new(5, vec![1, 2])
                .with_extra(vec![1, 1])
                .with_side_nodes(vec![2, 2], vec![1, 2, 2, 3]),
        )
        .with_set(ObjectType::ElemSet, MemSet::new(3, vec![5, 2, 99]))
}

fn loaded(settings: ReaderSettings) -> ExodusReader<InMemoryExodus> {
    let mut reader = ExodusReader::new(strip(), settings);
    reader.load_metadata().expect("load metadata");
    reader
}

fn elem_slot(output: &MeshOutput, sorted: usize) -> &OutputSlot {
    output
        .slot(ConnectivityKind::ElemBlock, sorted)
        .expect("element block slot")
}

#[test]
fn catalog_offsets_follow_file_order() {
    let reader = loaded(ReaderSettings::default());
    let catalog = reader.catalog().unwrap();
    let blocks = catalog.objects(ObjectType::ElemBlock);
    assert_eq!(blocks[0].file_offset(), Some(1));
    assert_eq!(blocks[1].file_offset(), Some(5));
    assert_eq!(catalog.model().num_elems, 10);
    assert_eq!(catalog.block_containing(ObjectType::ElemBlock, 4), Some(1));
    assert_eq!(catalog.displacement_array(), Some(0));
    catalog.validate_invariants().unwrap();
}

#[test]
fn groups_come_in_fixed_order() {
    let mut reader = loaded(ReaderSettings::default());
    let output = reader.request_data(0).unwrap();
    let kinds: Vec<_> = output.groups.iter().map(|g| g.kind).collect();
    assert_eq!(kinds, ConnectivityKind::ALL.to_vec());
    assert_eq!(output.groups[0].label, "Element Blocks");
}

#[test]
fn two_blocks_assemble_with_squeezed_points() {
    let mut reader = loaded(ReaderSettings::default());
    let output = reader.request_data(0).unwrap();

    let left = elem_slot(&output, 0);
    let right = elem_slot(&output, 1);
    assert_eq!((left.id, left.name.as_str()), (10, "left"));
    assert_eq!((right.id, right.name.as_str()), (20, "right"));

    let left = left.mesh.as_ref().unwrap();
    let right = right.mesh.as_ref().unwrap();
    assert_eq!(left.num_cells(), 4);
    assert_eq!(right.num_cells(), 6);
    assert_eq!(left.num_points(), 10);
    assert_eq!(right.num_points(), 14);

    let first = right.cells.cell(0).unwrap();
    assert_eq!(first.cell_type, CellType::Quad);
    assert_eq!(first.connectivity, &[0, 1, 2, 3]);
    assert_eq!(right.point(0), Some([4.0, 0.0, 0.0]));

    let ids = right.cell_data.get("ObjectId").unwrap();
    assert_eq!(ids.as_i64().unwrap(), &[20; 6]);
    assert!(right.field_data.contains("Title"));
    assert_eq!(
        right.field_data.get("ElementBlockIds").unwrap().as_i64().unwrap(),
        &[10, 20]
    );
}

#[test]
fn unsqueezed_blocks_share_coordinates() {
    let settings = ReaderSettings {
        squeeze_points: false,
        ..Default::default()
    };
    let mut reader = loaded(settings);
    let output = reader.request_data(0).unwrap();
    let left = elem_slot(&output, 0).mesh.as_ref().unwrap();
    let right = elem_slot(&output, 1).mesh.as_ref().unwrap();
    assert_eq!(left.num_points(), 22);
    assert!(std::sync::Arc::ptr_eq(&left.points, &right.points));
    assert_eq!(right.cells.cell(0).unwrap().connectivity, &[4, 5, 16, 15]);
}

#[test]
fn deselecting_a_block_leaves_its_slot_empty() {
    let mut reader = loaded(ReaderSettings::default());
    let before = reader.request_data(0).unwrap();

    reader
        .set_object_status(ObjectType::ElemBlock, 0, false)
        .unwrap();
    let after = reader.request_data(0).unwrap();

    let slot = elem_slot(&after, 0);
    assert!(slot.mesh.is_none());
    assert_eq!(slot.name, "left");
    assert_eq!(elem_slot(&after, 1), elem_slot(&before, 1));
}

#[test]
fn truth_table_limits_cell_variables() {
    let mut reader = loaded(ReaderSettings::default());
    reader
        .set_array_status_by_name(VarType::ElemBlock, "stress", true)
        .unwrap();
    let output = reader.request_data(1).unwrap();
    let left = elem_slot(&output, 0).mesh.as_ref().unwrap();
    let right = elem_slot(&output, 1).mesh.as_ref().unwrap();
    assert_eq!(
        left.cell_data.get("stress").unwrap().as_f64().unwrap(),
        &[5.0, 6.0, 7.0, 8.0]
    );
    assert!(!right.cell_data.contains("stress"));
}

#[test]
fn displacements_move_points_per_step() {
    let mut reader = loaded(ReaderSettings::default());
    let step0 = reader.request_data(0).unwrap();
    let step1 = reader.request_data(1).unwrap();
    let p0 = elem_slot(&step0, 1).mesh.as_ref().unwrap().point(0).unwrap();
    let p1 = elem_slot(&step1, 1).mesh.as_ref().unwrap().point(0).unwrap();
    assert_eq!(p0, [4.0, 0.0, 0.0]);
    assert_eq!(p1, [4.5, 0.0, 0.0]);

    reader.set_displacement_magnitude(2.0);
    let scaled = reader.request_data(1).unwrap();
    let p = elem_slot(&scaled, 1).mesh.as_ref().unwrap().point(0).unwrap();
    assert_eq!(p, [5.0, 0.0, 0.0]);

    reader.set_apply_displacements(false);
    let plain = reader.request_data(1).unwrap();
    let p = elem_slot(&plain, 1).mesh.as_ref().unwrap().point(0).unwrap();
    assert_eq!(p, [4.0, 0.0, 0.0]);
}

#[test]
fn selected_nodal_array_is_subset_through_point_map() {
    let mut reader = loaded(ReaderSettings::default());
    reader
        .set_array_status_by_name(VarType::Nodal, "DISPL", true)
        .unwrap();
    let output = reader.request_data(1).unwrap();
    let left = elem_slot(&output, 0).mesh.as_ref().unwrap();
    let displ = left.point_data.get("DISPL").unwrap();
    assert_eq!(displ.components(), 3);
    assert_eq!(displ.tuples(), left.num_points());
}

#[test]
fn procedural_id_arrays() {
    let settings = ReaderSettings {
        generate_global_element_id_array: true,
        generate_global_node_id_array: true,
        generate_implicit_element_id_array: true,
        generate_file_id_array: true,
        file_id: 7,
        ..Default::default()
    };
    let mut reader = loaded(settings);
    let output = reader.request_data(0).unwrap();
    let right = elem_slot(&output, 1).mesh.as_ref().unwrap();
    assert_eq!(
        right.cell_data.get("GlobalElementId").unwrap().as_i64().unwrap(),
        &[5, 6, 7, 8, 9, 10]
    );
    assert_eq!(
        right.cell_data.get("ImplicitElementId").unwrap().as_i64().unwrap(),
        &[5, 6, 7, 8, 9, 10]
    );
    assert_eq!(right.cell_data.get("FileId").unwrap().as_i64().unwrap(), &[7; 6]);
    let nodes = right.point_data.get("GlobalNodeId").unwrap().as_i64().unwrap();
    assert_eq!(&nodes[..4], &[5, 6, 17, 16]);
}

#[test]
fn sets_become_cells() {
    let settings = ReaderSettings {
        squeeze_points: false,
        generate_global_element_id_array: true,
        ..Default::default()
    };
    let mut reader = loaded(settings);
    for ty in [ObjectType::NodeSet, ObjectType::SideSet, ObjectType::ElemSet] {
        reader.set_object_status(ty, 0, true).unwrap();
    }
    let output = reader.request_data(0).unwrap();

    let nodes = output.slot(ConnectivityKind::NodeSet, 0).unwrap();
    let nodes = nodes.mesh.as_ref().unwrap();
    assert_eq!(nodes.num_cells(), 3);
    assert!(nodes.cells.cell_types().iter().all(|&t| t == CellType::Vertex));

    let sides = output.slot(ConnectivityKind::SideSet, 0).unwrap();
    let sides = sides.mesh.as_ref().unwrap();
    assert_eq!(sides.cells.cell(1).unwrap().connectivity, &[1, 2]);
    assert_eq!(sides.cells.cell(1).unwrap().cell_type, CellType::Line);
    assert_eq!(
        sides.cell_data.get("SourceElementId").unwrap().as_i64().unwrap(),
        &[1, 2]
    );
    assert_eq!(
        sides.cell_data.get("SourceElementSide").unwrap().as_i64().unwrap(),
        &[0, 0]
    );

    let elems = output.slot(ConnectivityKind::ElemSet, 0).unwrap();
    let elems = elems.mesh.as_ref().unwrap();
    assert_eq!(elems.num_cells(), 3);
    assert_eq!(elems.cells.cell(0).unwrap().connectivity, &[4, 5, 16, 15]);
    assert_eq!(elems.cells.cell(1).unwrap().connectivity, &[1, 2, 13, 12]);
    assert_eq!(elems.cells.cell(2).unwrap().cell_type, CellType::Empty);
}

#[test]
fn cache_serves_repeated_requests() {
    let mut reader = loaded(ReaderSettings::default());
    let a = reader.request_data(0).unwrap();
    let filled = reader.cache().len();
    let b = reader.request_data(0).unwrap();
    assert_eq!(reader.cache().len(), filled);
    assert_eq!(a, b);
    reader.cache().validate_invariants().unwrap();

    reader.reset_cache();
    assert!(reader.cache().is_empty());
    assert_eq!(reader.request_data(0).unwrap(), a);
}

#[test]
fn mode_shape_coordinates_bypass_the_cache() {
    let settings = ReaderSettings {
        has_mode_shapes: true,
        animate_mode_shapes: false,
        ..Default::default()
    };
    let mut reader = loaded(settings);
    reader.request_data(0).unwrap();
    let coords = CacheKey::new(0, CacheKind::NodalCoords, 0, 0);
    assert!(!reader.cache().contains(&coords));

    reader.set_has_mode_shapes(false);
    reader.request_data(0).unwrap();
    assert!(reader.cache().contains(&coords));
}

#[test]
fn negative_face_orientation_reverses_points() {
    let source = strip()
        .with_block(
            ObjectType::FaceBlock,
            MemBlock::new(40, "QUAD4", 4, vec![1, 2, 3, 4, 2, 5, 6, 3]),
        )
        .with_set(
            ObjectType::FaceSet,
            MemSet::new(8, vec![2, 1]).with_extra(vec![-1, 1]),
        );
    let settings = ReaderSettings {
        squeeze_points: false,
        ..Default::default()
    };
    let mut reader = ExodusReader::new(source, settings);
    reader.load_metadata().unwrap();
    reader.set_object_status(ObjectType::FaceSet, 0, true).unwrap();
    let output = reader.request_data(0).unwrap();

    let faces = output.slot(ConnectivityKind::FaceSet, 0).unwrap();
    let faces = faces.mesh.as_ref().unwrap();
    assert_eq!(faces.num_cells(), 2);
    assert_eq!(faces.cells.cell(0).unwrap().connectivity, &[2, 5, 4, 1]);
    assert_eq!(faces.cells.cell(1).unwrap().connectivity, &[0, 1, 2, 3]);
    assert_eq!(faces.cells.cell(0).unwrap().cell_type, CellType::Quad);
}
