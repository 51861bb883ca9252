//! World, tile map and visualizer integration tests.

use std::io::Write;

use fastrand::Rng;
use tilebus::components::tile::TileType;
use tilebus::game::Game;
use tilebus::resources::gameconfig::GameConfig;
use tilebus::resources::tilemap::Tilemap;
use tilebus::resources::world::{World, WorldError};
use tilebus::systems::tilevisualizer::{TileVisualizer, sprite_key};
use tilebus::{GameEventKind, GameEvents, Priority};

const MAP_JSON: &str = r#"{
  "tile_size": 16,
  "map_width": 3,
  "map_height": 2,
  "layers": [
    { "name": "ground", "positions": [
      { "x": 0, "y": 0, "id": 1 }, { "x": 1, "y": 0, "id": 1 }, { "x": 2, "y": 1, "id": 2 }
    ] },
    { "name": "rocks", "positions": [ { "x": 1, "y": 0, "id": 2 } ] }
  ]
}"#;

#[test]
fn test_world_from_tilemap_feeds_visualizer() {
    let events = GameEvents::new();
    let visualizer = TileVisualizer::attach(&events);
    let map = Tilemap::from_json(MAP_JSON).unwrap();
    let world = World::from_tilemap(&map, events.clone(), true).unwrap();

    assert_eq!(world.tile_count(), 6);
    assert_eq!(world.tile_at(0, 0).unwrap().tile_type, TileType::Grass);
    // Later layer wins.
    assert_eq!(world.tile_at(1, 0).unwrap().tile_type, TileType::Stone);
    assert_eq!(world.tile_at(0, 1).unwrap().tile_type, TileType::Empty);

    assert!(visualizer.is_empty());
    events.drain_all().unwrap();
    assert_eq!(visualizer.len(), 6);
    assert_eq!(visualizer.sprite_at(2, 1).unwrap().sprite, "Tiles/Stone");
    assert_eq!(visualizer.sprite_at(0, 1).unwrap().sprite, "Tiles/Invalid");
}

#[test]
fn test_tilemap_with_bad_id_or_position() {
    let events = GameEvents::new();
    let bad_id = Tilemap::from_json(
        r#"{"tile_size":8,"map_width":1,"map_height":1,
            "layers":[{"name":"l","positions":[{"x":0,"y":0,"id":7}]}]}"#,
    )
    .unwrap();
    assert!(matches!(
        World::from_tilemap(&bad_id, events.clone(), false),
        Err(WorldError::UnknownTileId { id: 7, .. })
    ));

    let bad_pos = Tilemap::from_json(
        r#"{"tile_size":8,"map_width":1,"map_height":1,
            "layers":[{"name":"l","positions":[{"x":3,"y":0,"id":1}]}]}"#,
    )
    .unwrap();
    assert!(matches!(
        World::from_tilemap(&bad_pos, events, false),
        Err(WorldError::OutOfBounds { x: 3, y: 0 })
    ));
}

#[test]
fn test_tiles_added_without_events_are_unknown_to_visualizer() {
    let events = GameEvents::new();
    let visualizer = TileVisualizer::attach(&events);
    let mut world = World::new(2, 2, events.clone()).unwrap();
    world.create_test_world(false).unwrap();
    world.randomize_tiles(&mut Rng::with_seed(1)).unwrap();

    // Default policy isolates the visualizer's failures.
    events.drain_all().unwrap();
    assert!(visualizer.is_empty());
    assert_eq!(events.stats().failed, 4);
}

#[test]
fn test_visualizer_matches_world_after_many_rerolls() {
    let events = GameEvents::new();
    let visualizer = TileVisualizer::attach(&events);
    let mut world = World::new(5, 4, events.clone()).unwrap();
    world.create_test_world(true).unwrap();
    let mut rng = Rng::with_seed(42);

    for _ in 0..5 {
        world.randomize_tiles(&mut rng).unwrap();
        events.drain_all().unwrap();
    }
    for tile in world.tiles() {
        assert_eq!(
            visualizer.sprite_at(tile.x, tile.y).unwrap().sprite,
            sprite_key(tile.tile_type)
        );
    }
    assert_eq!(visualizer.sprite_updates(), 20 + 5 * 20);
}

#[test]
fn test_remove_then_readd_tile() {
    let events = GameEvents::new();
    let visualizer = TileVisualizer::attach(&events);
    let mut world = World::new(2, 1, events.clone()).unwrap();
    world.create_test_world(true).unwrap();
    events.drain_all().unwrap();

    world.remove_tile(1, 0).unwrap();
    events.drain_all().unwrap();
    assert!(visualizer.sprite_at(1, 0).is_none());

    world.spawn_tile(1, 0, TileType::Grass, true).unwrap();
    events.drain_all().unwrap();
    assert_eq!(visualizer.sprite_at(1, 0).unwrap().sprite, "Tiles/Grass");
}

#[test]
fn test_game_runs_from_map_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MAP_JSON.as_bytes()).unwrap();

    let config = GameConfig {
        map_path: Some(file.path().to_path_buf()),
        randomize_every: 0,
        ..GameConfig::new()
    };
    let mut game = Game::setup(config).unwrap();
    let summary = game.run(3).unwrap();

    assert_eq!(summary.tiles, 6);
    assert_eq!(summary.visualized_tiles, 6);
    assert_eq!(summary.sprite_updates, 6);
    assert_eq!(game.visualizer().sprite_at(1, 0).unwrap().sprite, "Tiles/Stone");
    assert_eq!(game.events().pending_len(Priority::Normal), 0);
}

#[test]
fn test_game_config_realtime_camera() {
    let mut config = GameConfig {
        world_width: 2,
        world_height: 2,
        ..GameConfig::new()
    };
    config.camera.priority = Priority::Realtime;
    let mut game = Game::setup(config).unwrap();
    assert!(game.events().is_registered(GameEventKind::CameraMoved));

    // Camera start was delivered inside setup, tiles wait for the first drain.
    assert_eq!(game.summary().camera_moves_seen, 1);
    game.update().unwrap();
    assert_eq!(game.summary().camera_moves_seen, 2);
    assert_eq!(game.events().pending_len(Priority::Normal), 0);
}
