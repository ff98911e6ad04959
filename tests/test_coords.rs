//! Tests for coordinate conversions and the map offset table.

use std::path::Path;

use overworld_nav::navigation::coords::{
    Direction, GlobalCoord, LocalCoord, MapOffsetTable, ScreenCell, Transform,
};
use overworld_nav::navigation::NavError;

fn offsets() -> MapOffsetTable {
    MapOffsetTable::new()
        .with_map(0, 0, 0, 40, 36)
        .with_map(12, 160, 40, 20, 18)
        .with_map(37, -30, 250, 10, 8)
}

#[test]
fn test_local_global_round_trip() {
    let table = offsets();
    for map_id in [0, 12, 37] {
        for y in -2..20 {
            for x in -2..25 {
                let local = LocalCoord::new(x, y, map_id);
                let global = table.local_to_global(local).unwrap();
                assert_eq!(table.global_to_local(global, map_id), Some(local));
            }
        }
    }
}

#[test]
fn test_global_adds_map_origin_and_padding() {
    let table = offsets();
    assert_eq!(
        table.local_to_global(LocalCoord::new(3, 4, 12)),
        Some(GlobalCoord::new(183, 64))
    );
}

#[test]
fn test_sentinel_and_unknown_map() {
    let table = offsets();
    assert!(table.local_to_global(LocalCoord::unavailable(0)).is_none());
    assert!(table.local_to_global(LocalCoord::new(1, 1, 99)).is_none());
    assert!(table.global_to_local(GlobalCoord::new(25, 25), 99).is_none());
}

#[test]
fn test_global_to_screen_window_bounds() {
    let table = offsets();
    let transform = Transform::new(&table, 1);
    let agent = LocalCoord::new(10, 10, 0);
    let at = |dx: i32, dy: i32| GlobalCoord::new(30 + dx, 30 + dy);

    assert_eq!(transform.global_to_screen(at(0, 0), agent), ScreenCell::new(4, 4));
    assert_eq!(transform.global_to_screen(at(5, 4), agent), ScreenCell::new(8, 9));
    assert_eq!(transform.global_to_screen(at(-4, -4), agent), ScreenCell::new(0, 0));
    assert!(transform.global_to_screen(at(6, 0), agent).is_none());
    assert!(transform.global_to_screen(at(0, 5), agent).is_none());
    assert!(transform.global_to_screen(at(-5, 0), agent).is_none());
}

#[test]
fn test_screen_global_round_trip_for_every_cell() {
    let table = offsets();
    let transform = Transform::new(&table, 1);
    let agent = LocalCoord::new(7, 9, 12);
    for row in 0..9 {
        for col in 0..10 {
            let cell = ScreenCell::new(row, col).unwrap();
            let global = transform.screen_to_global(cell, agent).unwrap();
            assert_eq!(transform.global_to_screen(global, agent), Some(cell));
        }
    }
}

#[test]
fn test_coarse_cells_round_half_away_from_zero() {
    let table = offsets();
    let transform = Transform::new(&table, 2);
    let agent = LocalCoord::new(10, 10, 0);
    // +3 tiles is 1.5 cells, -3 tiles is -1.5 cells.
    assert_eq!(
        transform.global_to_screen(GlobalCoord::new(33, 30), agent),
        ScreenCell::new(4, 6)
    );
    assert_eq!(
        transform.global_to_screen(GlobalCoord::new(27, 30), agent),
        ScreenCell::new(4, 2)
    );
    assert_eq!(
        transform.global_to_screen(GlobalCoord::new(30, 31), agent),
        ScreenCell::new(5, 4)
    );
    assert_eq!(
        transform.screen_to_global(ScreenCell::new(4, 6).unwrap(), agent),
        Some(GlobalCoord::new(34, 30))
    );
}

#[test]
fn test_screen_conversions_need_a_position() {
    let table = offsets();
    let transform = Transform::new(&table, 1);
    let sentinel = LocalCoord::unavailable(0);
    assert!(transform.global_to_screen(GlobalCoord::new(30, 30), sentinel).is_none());
    assert!(transform.screen_to_global(ScreenCell::CENTER, sentinel).is_none());
}

#[test]
fn test_distances() {
    let a = GlobalCoord::new(2, 3);
    let b = GlobalCoord::new(5, -1);
    assert_eq!(a.manhattan(b), 7);
    assert_eq!(a.chebyshev(b), 4);
    assert_eq!(GlobalCoord::from_yx([3, 2]), a);
}

#[test]
fn test_screen_steps_stay_in_window() {
    let corner = ScreenCell::new(0, 9).unwrap();
    assert!(corner.step(Direction::Up).is_none());
    assert!(corner.step(Direction::Right).is_none());
    assert_eq!(corner.step(Direction::Down), ScreenCell::new(1, 9));
    assert_eq!(corner.step(Direction::Left), ScreenCell::new(0, 8));
}

#[test]
fn test_map_data_file() {
    let text = r#"{"regions": [
        {"id": "0", "name": "PALLET_TOWN", "coordinates": [12, 108], "tileSize": [20, 18]},
        {"id": 12, "name": "ROUTE_1", "coordinates": [12, 72], "tileSize": [20, 36]}
    ]}"#;
    let table = MapOffsetTable::from_json(text, Path::new("map_data.json")).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.region(0).unwrap().name, "PALLET_TOWN");
    assert_eq!(
        table.local_to_global(LocalCoord::new(5, 6, 0)),
        Some(GlobalCoord::new(37, 134))
    );
    assert!(table.contains_local(LocalCoord::new(19, 35, 12)));
    assert!(!table.contains_local(LocalCoord::new(20, 0, 12)));
    assert!(!table.contains_local(LocalCoord::new(0, 0, 5)));
}

#[test]
fn test_map_data_bad_region_id() {
    let text = r#"{"regions": [{"id": "town", "coordinates": [0, 0]}]}"#;
    let err = MapOffsetTable::from_json(text, Path::new("map_data.json")).unwrap_err();
    assert!(matches!(err, NavError::BadRegionId { .. }));
}
