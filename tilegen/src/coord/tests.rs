//! Tests for coordinate conversion

use super::*;

#[test]
fn test_london_at_zoom_10() {
    // London: 51.5074°N, 0.1278°W
    let tile = to_tile_coords(51.5074, -0.1278, 10).unwrap();
    assert_eq!(tile.x, 511);
    assert_eq!(tile.y, 340);
    assert_eq!(tile.zoom, 10);
}

#[test]
fn test_equator_prime_meridian() {
    // At zoom 1: 2×2 tiles, 0°N 0°E is the top-left corner of (1, 1)
    let tile = to_tile_coords(0.0, 0.0, 1).unwrap();
    assert_eq!(tile.x, 1);
    assert_eq!(tile.y, 1);
}

#[test]
fn test_east_edge_belongs_to_last_tile() {
    let tile = to_tile_coords(0.0, 180.0, 3).unwrap();
    assert_eq!(tile.x, 7);
}

#[test]
fn test_invalid_latitude() {
    let result = to_tile_coords(90.0, 0.0, 10);
    assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
}

#[test]
fn test_invalid_longitude() {
    let result = to_tile_coords(0.0, 181.0, 10);
    assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
}

#[test]
fn test_tile_new_rejects_negative_index() {
    let result = TileCoord::new(-1, 4, 5);
    assert_eq!(
        result,
        Err(CoordError::OutOfRangeTile {
            x: -1,
            y: 4,
            zoom: 5
        })
    );
}

#[test]
fn test_tile_new_rejects_index_past_grid() {
    // 2^5 = 32 tiles per axis, so 32 is one past the end
    assert!(matches!(
        TileCoord::new(3, 32, 5),
        Err(CoordError::OutOfRangeTile { .. })
    ));
    assert!(TileCoord::new(31, 31, 5).is_ok());
}

#[test]
fn test_tile_new_rejects_unsupported_zoom() {
    assert_eq!(
        TileCoord::new(0, 0, MAX_ZOOM + 1),
        Err(CoordError::InvalidZoom(MAX_ZOOM + 1))
    );
}

#[test]
fn test_roundtrip_every_tile_at_low_zoom() {
    for zoom in 0..=6u8 {
        let n = tiles_per_axis(zoom) as u32;
        for x in 0..n {
            for y in 0..n {
                let tile = TileCoord { x, y, zoom };
                let (lat, lon) = tile_to_lat_lon(&tile);
                let back = to_tile_coords(lat, lon, zoom).unwrap();
                assert_eq!(back, tile, "round trip failed for {}", tile);
            }
        }
    }
}

#[test]
fn test_roundtrip_sampled_at_high_zoom() {
    for zoom in [12u8, 16, 19, MAX_ZOOM] {
        let max = (tiles_per_axis(zoom) - 1) as u32;
        let samples = [0, 1, max / 7, max / 3, max / 2, max - 1, max];
        for &x in &samples {
            for &y in &samples {
                let tile = TileCoord { x, y, zoom };
                let (lat, lon) = tile_to_lat_lon(&tile);
                let back = to_tile_coords(lat, lon, zoom).unwrap();
                assert_eq!(back, tile, "round trip failed for {}", tile);
            }
        }
    }
}

#[test]
fn test_padded_box_projects_to_source_zoom() {
    // 5×5 tiles at zoom 12 around (10, 10), each tile is 128 tiles wide at zoom 19
    let bbox = padded_bounding_box_at_zoom(10, 10, 12, 2, 19).unwrap();

    assert_eq!(bbox.zoom, 19);
    assert_eq!(bbox.nw, TileIndex { x: 8 * 128, y: 8 * 128 });
    assert_eq!(
        bbox.se,
        TileIndex {
            x: 13 * 128 - 1,
            y: 13 * 128 - 1
        }
    );
    assert_eq!(bbox.width(), 5 * 128);
}

#[test]
fn test_padded_box_matches_geographic_corners() {
    let bbox = padded_bounding_box_at_zoom(10, 10, 12, 2, 19).unwrap();

    let (lat, lon) = tile_to_lat_lon(&TileCoord { x: 8, y: 8, zoom: 12 });
    let nw = to_tile_coords(lat, lon, 19).unwrap();
    assert_eq!(nw.index(), bbox.nw);

    // The NW corner of the tile past the padding is the exclusive SE edge
    let (lat, lon) = tile_to_lat_lon(&TileCoord {
        x: 13,
        y: 13,
        zoom: 12,
    });
    let past = to_tile_coords(lat, lon, 19).unwrap();
    assert_eq!(past.x, bbox.se.x + 1);
    assert_eq!(past.y, bbox.se.y + 1);
}

#[test]
fn test_padded_box_clamps_at_origin() {
    let bbox = padded_bounding_box_at_zoom(0, 0, 5, 2, 19).unwrap();

    assert_eq!(bbox.nw, TileIndex { x: 0, y: 0 });
    // Only tiles 0..=2 exist after clamping, each 2^14 source tiles wide
    assert_eq!(bbox.se, TileIndex { x: 3 * 16384 - 1, y: 3 * 16384 - 1 });
}

#[test]
fn test_padded_box_clamps_at_far_edge() {
    let bbox = padded_bounding_box_at_zoom(31, 31, 5, 2, 5).unwrap();

    assert_eq!(bbox.nw, TileIndex { x: 29, y: 29 });
    assert_eq!(bbox.se, TileIndex { x: 31, y: 31 });
    assert_eq!(bbox.tile_count(), 9);
}

#[test]
fn test_padded_box_to_coarser_zoom() {
    let bbox = padded_bounding_box_at_zoom(1000, 2000, 12, 2, 10).unwrap();

    assert_eq!(bbox.nw, TileIndex { x: 998 / 4, y: 1998 / 4 });
    assert_eq!(bbox.se, TileIndex { x: 1002 / 4, y: 2002 / 4 });
}

#[test]
fn test_padded_box_rejects_out_of_range_tile() {
    assert!(matches!(
        padded_bounding_box_at_zoom(-3, 0, 12, 2, 19),
        Err(CoordError::OutOfRangeTile { .. })
    ));
    assert!(matches!(
        padded_bounding_box_at_zoom(0, 4096, 12, 2, 19),
        Err(CoordError::OutOfRangeTile { .. })
    ));
}

#[test]
fn test_padded_box_rejects_unsupported_target_zoom() {
    assert_eq!(
        padded_bounding_box_at_zoom(0, 0, 3, 1, 30),
        Err(CoordError::InvalidZoom(30))
    );
}

#[test]
fn test_padded_box_corners_ordered_and_in_grid() {
    for zoom in [0u8, 1, 2, 5, 12, 19] {
        let max = tiles_per_axis(zoom) as i64 - 1;
        for (x, y) in [(0, 0), (max, max), (0, max), (max / 2, max / 3)] {
            for target in [0u8, 3, zoom, 19, MAX_ZOOM] {
                for pad in [0u32, 1, 2, 7] {
                    let bbox = padded_bounding_box_at_zoom(x, y, zoom, pad, target).unwrap();
                    let limit = tiles_per_axis(target) as u32 - 1;

                    assert!(bbox.nw.x <= bbox.se.x, "x order for {:?}", bbox);
                    assert!(bbox.nw.y <= bbox.se.y, "y order for {:?}", bbox);
                    assert!(bbox.se.x <= limit && bbox.se.y <= limit, "{:?}", bbox);
                }
            }
        }
    }
}

#[test]
fn test_padded_box_is_idempotent() {
    let first = padded_bounding_box_at_zoom(2104, 1350, 12, 2, 19).unwrap();
    let second = padded_bounding_box_at_zoom(2104, 1350, 12, 2, 19).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_bounding_box_tiles_row_major() {
    let tile = TileCoord { x: 5, y: 7, zoom: 4 };
    let bbox = padded_bounds(&tile, 1, 4).unwrap();
    let tiles: Vec<_> = bbox.tiles().map(|t| (t.x, t.y)).collect();

    assert_eq!(
        tiles,
        vec![
            (4, 6),
            (5, 6),
            (6, 6),
            (4, 7),
            (5, 7),
            (6, 7),
            (4, 8),
            (5, 8),
            (6, 8)
        ]
    );
}

#[test]
fn test_bounding_box_contains() {
    let bbox = padded_bounding_box_at_zoom(10, 10, 12, 1, 12).unwrap();
    assert!(bbox.contains(9, 9));
    assert!(bbox.contains(11, 11));
    assert!(!bbox.contains(12, 10));
    assert!(!bbox.contains(10, 8));
}
