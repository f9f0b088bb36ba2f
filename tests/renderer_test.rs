#![cfg(not(target_arch = "wasm32"))]

mod common;

use common::test_utils::{Command, asset_dir, renderer, write_png};
use image::{Rgba, RgbaImage};
use webgl_scene::{
    Cube, Error, Heightmap, Object3d, Plane, Presentation, Terrain, Vector2, Vector3,
    data_structures::arena::MeshRange,
};

#[tokio::test]
async fn one_cube_draws_once_with_36_indices() {
    let dir = asset_dir("one-cube");
    let mut renderer = renderer(&dir, vec![Object3d::new(Cube::default())]);
    renderer.initialize().await.unwrap();

    let report = renderer.frame_with(0.016).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.drawn, 1);

    let backend = renderer.backend();
    assert!(backend.commands.contains(&Command::UploadMeshes {
        vertices: 24,
        indices: 36
    }));
    let draws = backend.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].range.index_count, 36);
    assert_eq!(draws[0].range.indices(), 0..36);

    // begin, draw, end in that order
    let frame: Vec<_> = backend
        .commands
        .iter()
        .skip_while(|c| !matches!(c, Command::BeginFrame(_)))
        .collect();
    assert_eq!(frame.len(), 3);
    assert!(matches!(frame[2], Command::EndFrame));
}

#[tokio::test]
async fn objects_are_drawn_in_insertion_order_from_the_shared_buffer() {
    let dir = asset_dir("insertion-order");
    let mut renderer = renderer(
        &dir,
        vec![
            Object3d::new(Cube::default()),
            Object3d::new(Plane::new(Vector2::new(7.0, 7.0))).at(Vector3::new(0.0, -2.0, 0.0)),
            Object3d::new(Cube::new(Vector3::new(0.1, 0.1, 0.1))),
        ],
    );
    renderer.initialize().await.unwrap();
    renderer.frame_with(0.0).unwrap();

    let draws = renderer.backend().draws();
    let ranges: Vec<MeshRange> = draws.iter().map(|d| d.range).collect();
    let range = |first_index, index_count, base_vertex| MeshRange {
        first_index,
        index_count,
        base_vertex,
    };
    assert_eq!(
        ranges,
        vec![range(0, 36, 0), range(36, 6, 24), range(42, 36, 28)]
    );
    assert_eq!(ranges, renderer.arena().ranges());
    let slots: Vec<usize> = draws.iter().map(|d| d.slot).collect();
    assert_eq!(slots, vec![0, 1, 2]);

    // only one upload for the whole scene
    let uploads = renderer
        .backend()
        .count(|c| matches!(c, Command::UploadMeshes { .. }));
    assert_eq!(uploads, 1);
    assert!(!renderer.arena().is_dirty());
}

#[tokio::test]
async fn draw_uniform_carries_the_object_transform() {
    let dir = asset_dir("uniform");
    let position = Vector3::new(-1.0, 1.0, 0.0);
    let mut renderer = renderer(
        &dir,
        vec![Object3d::new(Cube::default().with_spin(Vector3::zero())).at(position)],
    );
    renderer.initialize().await.unwrap();
    renderer.frame_with(1.0).unwrap();

    let call = renderer.backend().draws()[0];
    assert_eq!(call.uniform.model[3], [-1.0, 1.0, 0.0, 1.0]);
    assert_eq!(call.uniform.model, renderer.objects()[0].model_matrix().to_array());
}

#[tokio::test]
async fn update_advances_rotation_before_drawing() {
    let dir = asset_dir("spin");
    let mut renderer = renderer(
        &dir,
        vec![
            Object3d::new(Cube::default()),
            Object3d::new(Plane::default()),
        ],
    );
    renderer.initialize().await.unwrap();
    renderer.frame_with(0.5).unwrap();

    assert_eq!(renderer.objects()[0].rotation(), Vector3::new(0.5, 0.5, 0.5));
    assert_eq!(
        renderer.objects()[1].rotation(),
        Vector3::new(0.0, Plane::DEFAULT_SPIN * 0.5, 0.0)
    );
    let draws = renderer.backend().draws();
    assert_eq!(draws[0].uniform.model, renderer.objects()[0].model_matrix().to_array());
}

#[tokio::test]
async fn missing_texture_keeps_placeholder_and_is_reported() {
    let dir = asset_dir("missing-texture");
    let mut renderer = renderer(
        &dir,
        vec![Object3d::new(Cube::default()).with_texture("textures/nowhere.png")],
    );
    renderer.initialize().await.unwrap();

    assert_eq!(renderer.load_failures().len(), 1);
    assert!(matches!(
        &renderer.load_failures()[0],
        Error::ImageLoadFailure { source_path, .. } if source_path == "textures/nowhere.png"
    ));
    assert_eq!(
        renderer
            .backend()
            .count(|c| matches!(c, Command::UploadTexture { .. })),
        0
    );

    let report = renderer.frame_with(0.016).unwrap();
    assert_eq!(report.drawn, 1);
    assert_eq!(renderer.backend().draws()[0].slot, 0);
}

#[tokio::test]
async fn texture_on_disk_is_uploaded_into_the_objects_slot() {
    let dir = asset_dir("texture");
    write_png(&dir, "red.png", RgbaImage::from_pixel(4, 2, Rgba([255, 0, 0, 255])));
    let mut renderer = renderer(
        &dir,
        vec![
            Object3d::new(Cube::default()),
            Object3d::new(Cube::default()).with_texture("red.png"),
        ],
    );
    renderer.initialize().await.unwrap();

    assert!(renderer.load_failures().is_empty());
    assert!(renderer.backend().commands.contains(&Command::UploadTexture {
        slot: 1,
        label: "red.png".to_string(),
        size: (4, 2),
    }));
    assert_eq!(
        renderer
            .backend()
            .count(|c| matches!(c, Command::CreateTexture { .. })),
        2
    );
}

#[tokio::test]
async fn initialize_twice_is_rejected() {
    let dir = asset_dir("twice");
    let mut renderer = renderer(&dir, vec![Object3d::new(Cube::default())]);
    renderer.initialize().await.unwrap();
    assert!(renderer.is_initialized());

    let err = renderer.initialize().await.unwrap_err();
    assert!(matches!(err, Error::AlreadyInitialized));
    // the geometry was not appended a second time
    assert_eq!(renderer.arena().indices().len(), 36);
}

#[tokio::test]
async fn degenerate_transform_is_skipped_without_stopping_the_frame() {
    let dir = asset_dir("degenerate");
    let mut renderer = renderer(
        &dir,
        vec![
            Object3d::new(Cube::default()),
            Object3d::new(Cube::default()),
        ],
    );
    renderer.initialize().await.unwrap();
    renderer.objects_mut()[0].set_position(Vector3::new(f32::NAN, 0.0, 0.0));

    let report = renderer.frame_with(0.016).unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.drawn, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 0);
    assert!(matches!(
        report.skipped[0].error,
        Error::MatrixSingularity { .. }
    ));

    let backend = renderer.backend();
    assert_eq!(backend.draws()[0].range.base_vertex, 24);
    assert!(matches!(backend.commands.last(), Some(Command::EndFrame)));
}

#[tokio::test]
async fn terrain_heightmap_is_loaded_during_initialize() {
    let dir = asset_dir("terrain");
    write_png(
        &dir,
        "hm.png",
        RgbaImage::from_fn(3, 3, |x, z| Rgba([(x * 100 + z * 20) as u8, 0, 0, 255])),
    );
    let mut renderer = renderer(
        &dir,
        vec![Object3d::new(Terrain::new("hm.png", 10.0)).at(Vector3::new(0.0, -5.0, 0.0))],
    );
    renderer.initialize().await.unwrap();

    // 2x2 cells, five vertices and four triangles each
    assert_eq!(renderer.arena().vertices().len(), 20);
    assert_eq!(renderer.arena().indices().len(), 48);

    renderer.frame_with(0.016).unwrap();
    let draws = renderer.backend().draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].range.index_count, 48);
    // terrain does not animate
    assert_eq!(renderer.objects()[0].rotation(), Vector3::zero());
}

#[tokio::test]
async fn missing_heightmap_aborts_initialize() {
    let dir = asset_dir("missing-heightmap");
    let mut renderer = renderer(
        &dir,
        vec![
            Object3d::new(Cube::default()),
            Object3d::new(Terrain::new("hm.png", 10.0)),
        ],
    );

    let err = renderer.initialize().await.unwrap_err();
    assert!(matches!(err, Error::ImageLoadFailure { .. }));
    assert_eq!(
        renderer
            .backend()
            .count(|c| matches!(c, Command::UploadMeshes { .. })),
        0
    );
}

#[tokio::test]
async fn prebuilt_terrain_draws_its_full_index_count() {
    let dir = asset_dir("prebuilt-terrain");
    let heightmap = Heightmap::from_samples(4, 3, vec![0.0; 12]).unwrap();
    let terrain = Terrain::from_heightmap(heightmap).unwrap();
    let mut renderer = renderer(&dir, vec![Object3d::new(terrain)]);
    renderer.initialize().await.unwrap();
    renderer.frame_with(0.016).unwrap();

    // 3x2 cells
    assert_eq!(renderer.backend().draws()[0].range.index_count, 72);
}

#[tokio::test]
async fn resize_reaches_backend_and_camera() {
    let dir = asset_dir("resize");
    let mut renderer = renderer(&dir, vec![Object3d::new(Cube::default())]);
    renderer.initialize().await.unwrap();

    renderer.resize(800, 400);
    renderer.resize(0, 400);

    assert_eq!(
        renderer
            .backend()
            .count(|c| matches!(c, Command::Resize(..))),
        1
    );
    assert!(renderer.backend().commands.contains(&Command::Resize(800, 400)));
    assert_eq!(renderer.camera().aspect(), 2.0);
}

#[tokio::test]
async fn frame_pushes_camera_globals() {
    let dir = asset_dir("globals");
    let mut renderer = renderer(&dir, vec![]);
    renderer.initialize().await.unwrap();
    let report = renderer.frame_with(0.016).unwrap();
    assert_eq!(report.drawn, 0);

    let globals = renderer
        .backend()
        .commands
        .iter()
        .find_map(|c| match c {
            Command::BeginFrame(globals) => Some(*globals),
            _ => None,
        })
        .unwrap();
    let eye = renderer.camera().position();
    assert_eq!(globals.position, [eye.x, eye.y, eye.z, 1.0]);
    assert_eq!(globals.view, renderer.camera().view_matrix().unwrap().to_array());
}

#[tokio::test]
async fn objects_cannot_be_added_after_initialize() {
    let dir = asset_dir("late-object");
    let mut renderer = renderer(&dir, vec![Object3d::new(Cube::default())]);
    renderer.initialize().await.unwrap();

    let err = renderer
        .add_object(Object3d::new(Plane::default()))
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyInitialized));
    assert!(matches!(
        renderer.add_objects(vec![Object3d::new(Plane::default())]),
        Err(Error::AlreadyInitialized)
    ));
    assert_eq!(renderer.objects().len(), 1);

    let report = renderer.frame_with(0.016).unwrap();
    assert_eq!(report.drawn, renderer.objects().len());
}

#[tokio::test]
async fn backend_draw_failure_skips_only_that_object() {
    let dir = asset_dir("draw-failure");
    let mut renderer = renderer(
        &dir,
        vec![
            Object3d::new(Cube::default()),
            Object3d::new(Cube::default()),
        ],
    );
    renderer.initialize().await.unwrap();
    renderer.backend_mut().failing_slot = Some(0);

    let report = renderer.frame_with(0.016).unwrap();
    assert_eq!(report.drawn, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 0);
    assert!(matches!(
        report.skipped[0].error,
        Error::ResourceNotFound(_)
    ));

    let backend = renderer.backend();
    let draws = backend.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].slot, 1);
    assert!(matches!(backend.commands.last(), Some(Command::EndFrame)));
}

#[tokio::test]
async fn lost_surface_is_reported_in_the_frame() {
    let dir = asset_dir("surface-lost");
    let mut renderer = renderer(&dir, vec![Object3d::new(Cube::default())]);
    renderer.initialize().await.unwrap();

    let report = renderer.frame_with(0.016).unwrap();
    assert_eq!(report.presentation, Presentation::Presented);

    renderer.backend_mut().presentation = Presentation::SurfaceLost;
    let report = renderer.frame_with(0.016).unwrap();
    assert_eq!(report.presentation, Presentation::SurfaceLost);
    assert_eq!(report.drawn, 1);
}

#[tokio::test]
async fn empty_scene_uploads_nothing() {
    let dir = asset_dir("empty-scene");
    let mut renderer = renderer(&dir, vec![]);
    renderer.initialize().await.unwrap();
    assert_eq!(
        renderer
            .backend()
            .count(|c| matches!(c, Command::UploadMeshes { .. })),
        0
    );
}
