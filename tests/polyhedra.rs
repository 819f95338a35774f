use exo_sieve::prelude::*;

/// Two quads sharing the edge 2-3, stored in one face block.
fn source(polyhedra: MemBlock) -> InMemoryExodus {
    InMemoryExodus::new("poly", 3)
        .with_coordinates(vec![
            vec![0.0, 1.0, 1.0, 0.0, 2.0, 2.0],
            vec![0.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            vec![0.0; 6],
        ])
        .with_block(
            ObjectType::FaceBlock,
            MemBlock::new(1, "QUAD4", 4, vec![1, 2, 3, 4, 2, 5, 6, 3]),
        )
        .with_block(ObjectType::ElemBlock, polyhedra)
}

fn first_mesh(output: &MeshOutput) -> &UnstructuredMesh {
    output
        .slot(ConnectivityKind::ElemBlock, 0)
        .and_then(|s| s.mesh.as_ref())
        .expect("polyhedral block mesh")
}

#[test]
fn two_quad_polyhedron() {
    let mut reader = ExodusReader::new(
        source(MemBlock::polyhedra(1, vec![2], vec![1, 2])),
        ReaderSettings::default(),
    );
    reader.load_metadata().unwrap();
    let output = reader.request_data(0).unwrap();
    let mesh = first_mesh(&output);

    let cell = mesh.cells.cell(0).unwrap();
    assert_eq!(cell.cell_type, CellType::Polyhedron);
    assert_eq!(cell.size, 2);
    assert_eq!(cell.connectivity.len(), 2 + 4 + 4);
    assert_eq!(cell.connectivity, &[4, 0, 1, 2, 3, 4, 1, 4, 5, 2]);
    assert_eq!(mesh.num_points(), 6);

    let faces = mesh.cells.polyhedron_faces(0).unwrap();
    assert_eq!(faces, vec![&[0, 1, 2, 3][..], &[1, 4, 5, 2][..]]);
}

#[test]
fn unknown_face_is_skipped() {
    let mut reader = ExodusReader::new(
        source(MemBlock::polyhedra(1, vec![2], vec![2, 9])),
        ReaderSettings::default(),
    );
    reader.load_metadata().unwrap();
    let output = reader.request_data(0).unwrap();
    let cell = first_mesh(&output).cells.cell(0).unwrap();
    assert_eq!(cell.size, 1);
    assert_eq!(cell.connectivity, &[4, 0, 1, 2, 3]);
}

#[test]
fn missing_face_counts_mark_block_unloadable() {
    let mut block = MemBlock::polyhedra(1, vec![2], vec![1, 2]);
    block.entity_counts = None;
    let mut reader = ExodusReader::new(source(block), ReaderSettings::default());
    reader.load_metadata().unwrap();

    let output = reader.request_data(0).unwrap();
    let slot = output.slot(ConnectivityKind::ElemBlock, 0).unwrap();
    assert!(slot.mesh.is_none());
    assert_eq!(
        slot.diagnostics,
        vec![MeshIoError::MissingEntityCounts {
            object_type: ObjectType::ElemBlock,
            index: 0,
        }]
    );
    let object = reader
        .catalog()
        .unwrap()
        .object(ObjectType::ElemBlock, 0)
        .unwrap();
    assert!(!object.loadable);
}

#[test]
fn polygons_use_entity_counts() {
    let source = InMemoryExodus::new("poly", 2)
        .with_coordinates(vec![
            vec![0.0, 1.0, 0.0, 1.0, 2.0],
            vec![0.0, 0.0, 1.0, 1.0, 0.5],
        ])
        .with_block(
            ObjectType::ElemBlock,
            MemBlock::polygons(4, vec![3, 4], vec![1, 2, 3, 2, 5, 4, 3]),
        );
    let settings = ReaderSettings {
        squeeze_points: false,
        ..Default::default()
    };
    let mut reader = ExodusReader::new(source, settings);
    reader.load_metadata().unwrap();
    let output = reader.request_data(0).unwrap();
    let mesh = first_mesh(&output);
    assert_eq!(mesh.num_cells(), 2);
    let second = mesh.cells.cell(1).unwrap();
    assert_eq!(second.cell_type, CellType::Polygon);
    assert_eq!(second.connectivity, &[1, 4, 3, 2]);
}
