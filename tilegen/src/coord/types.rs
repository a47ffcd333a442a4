//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Supported zoom levels.
///
/// The aggregate tables are stored at zoom 19; the ceiling leaves headroom
/// for finer aggregation while keeping indices exact in `f64` round trips.
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 24;

/// Number of tiles along one axis at `zoom`.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u64 {
    1u64 << zoom
}

/// Tile coordinates in the slippy map scheme.
///
/// `x` grows eastward and `y` grows southward, both starting at 0 in the
/// north-west corner of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// X coordinate (west-east), 0 at west
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileCoord {
    /// Creates a tile coordinate, rejecting indices outside the zoom's grid.
    ///
    /// Inputs are signed because they usually come straight from the work
    /// queue, where nothing stops ingestion from writing a bogus row.
    pub fn new(x: i64, y: i64, zoom: u8) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let limit = tiles_per_axis(zoom) as i64;
        if !(0..limit).contains(&x) || !(0..limit).contains(&y) {
            return Err(CoordError::OutOfRangeTile { x, y, zoom });
        }
        Ok(Self {
            x: x as u32,
            y: y as u32,
            zoom,
        })
    }

    /// Returns the tile's index pair without the zoom.
    #[inline]
    pub fn index(&self) -> TileIndex {
        TileIndex {
            x: self.x,
            y: self.y,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A tile index pair at an implied zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub x: u32,
    pub y: u32,
}

/// Inclusive rectangle of tile indices at one zoom level.
///
/// Invariant: `nw.x <= se.x` and `nw.y <= se.y`, and both corners lie in
/// `[0, 2^zoom - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    /// North-west corner (smallest x and y)
    pub nw: TileIndex,
    /// South-east corner (largest x and y), inclusive
    pub se: TileIndex,
    /// Zoom level the indices refer to
    pub zoom: u8,
}

impl BoundingBox {
    /// Returns true if the index pair lies inside the box.
    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.nw.x..=self.se.x).contains(&x) && (self.nw.y..=self.se.y).contains(&y)
    }

    /// Number of tile columns covered.
    #[inline]
    pub fn width(&self) -> u64 {
        (self.se.x - self.nw.x) as u64 + 1
    }

    /// Number of tile rows covered.
    #[inline]
    pub fn height(&self) -> u64 {
        (self.se.y - self.nw.y) as u64 + 1
    }

    /// Total number of tiles covered.
    #[inline]
    pub fn tile_count(&self) -> u64 {
        self.width() * self.height()
    }

    /// Iterates the covered tiles in row-major order.
    pub fn tiles(&self) -> BoundingBoxTiles {
        BoundingBoxTiles {
            bbox: *self,
            next: Some(self.nw),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "z{} [{},{}]..[{},{}]",
            self.zoom, self.nw.x, self.nw.y, self.se.x, self.se.y
        )
    }
}

/// Iterator over every tile of a [`BoundingBox`].
#[derive(Debug, Clone)]
pub struct BoundingBoxTiles {
    bbox: BoundingBox,
    next: Option<TileIndex>,
}

impl Iterator for BoundingBoxTiles {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        self.next = if current.x < self.bbox.se.x {
            Some(TileIndex {
                x: current.x + 1,
                y: current.y,
            })
        } else if current.y < self.bbox.se.y {
            Some(TileIndex {
                x: self.bbox.nw.x,
                y: current.y + 1,
            })
        } else {
            None
        };

        Some(TileCoord {
            x: current.x,
            y: current.y,
            zoom: self.bbox.zoom,
        })
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 24)
    InvalidZoom(u8),
    /// Tile index is negative or beyond the grid at its zoom
    OutOfRangeTile { x: i64, y: i64, zoom: u8 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::OutOfRangeTile { x, y, zoom } => {
                write!(
                    f,
                    "Tile {}/{}/{} is outside the grid (indices must be between 0 and {})",
                    zoom,
                    x,
                    y,
                    tiles_per_axis((*zoom).min(MAX_ZOOM)) - 1
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
