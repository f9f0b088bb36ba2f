use webgl_scene::{Cube, Object3d, Plane, SceneConfig, Terrain, Vector2, Vector3};

const BLUE: &str = "textures/debug/blue.png";
const GREEN: &str = "textures/debug/green.png";
const GREY: &str = "textures/debug/grey.png";
const RED: &str = "textures/debug/red.png";
const VIOLET: &str = "textures/debug/violet.png";
const HEIGHTMAP: &str = "textures/hm.png";

fn scene(config: &SceneConfig) -> Vec<Object3d> {
    let cube = |position: Vector3, texture: &str| {
        Object3d::new(Cube::default())
            .at(position)
            .with_texture(texture)
    };
    let plane = |size: f32, y: f32, texture: &str| {
        Object3d::new(Plane::new(Vector2::new(size, size)))
            .at(Vector3::new(0.0, y, 0.0))
            .with_texture(texture)
    };

    vec![
        Object3d::new(Terrain::new(HEIGHTMAP, config.terrain_max_height))
            .at(Vector3::new(0.0, -5.0, 0.0))
            .with_texture(HEIGHTMAP),
        Object3d::new(Cube::new(Vector3::new(0.1, 0.1, 0.1))).with_texture(GREY),
        cube(Vector3::new(-1.0, 1.0, 0.0), RED),
        cube(Vector3::new(1.0, 1.0, 0.0), GREEN),
        cube(Vector3::new(1.0, -1.0, 0.0), VIOLET),
        cube(Vector3::new(-1.0, -1.0, 0.0), BLUE),
        plane(7.0, -2.0, BLUE),
        plane(14.0, -3.0, GREY),
    ]
}

fn main() -> anyhow::Result<()> {
    let mut config = SceneConfig::default();
    // on the web the assets are served next to the page
    #[cfg(not(target_arch = "wasm32"))]
    {
        config.asset_root = concat!(env!("CARGO_MANIFEST_DIR"), "/assets").to_string();
    }
    config.title = "scene".to_string();

    webgl_scene::run(config, scene)
}
