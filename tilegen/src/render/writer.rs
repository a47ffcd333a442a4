//! PNG persistence under `<root>/<z>/<x>/<y>.png`.
//!
//! Tiles are encoded to a uniquely named temporary file in the destination
//! directory and renamed into place, so readers never see a partial PNG and
//! two workers writing the same tile cannot interleave.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use image::{ImageFormat, RgbaImage};

use super::{ArtifactKind, RenderError};
use crate::coord::TileCoord;

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Writes one artifact kind's tiles below a root directory.
#[derive(Debug, Clone)]
pub struct TileWriter {
    kind: ArtifactKind,
    root: PathBuf,
}

impl TileWriter {
    pub fn new(kind: ArtifactKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: root.into(),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final location of a tile.
    pub fn path_for(&self, tile: &TileCoord) -> PathBuf {
        self.root
            .join(tile.zoom.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.png", tile.y))
    }

    /// Encodes and stores a tile, replacing any previous version.
    pub fn write(&self, tile: &TileCoord, image: &RgbaImage) -> Result<PathBuf, RenderError> {
        let path = self.path_for(tile);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let temp = dir.join(format!(
            ".{}.png.{}.{}.tmp",
            tile.y,
            std::process::id(),
            TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = image.save_with_format(&temp, ImageFormat::Png) {
            let _ = fs::remove_file(&temp);
            return Err(RenderError::Encode {
                kind: self.kind,
                tile: *tile,
                message: e.to_string(),
            });
        }

        fs::rename(&temp, &path).map_err(|source| {
            let _ = fs::remove_file(&temp);
            RenderError::Io {
                path: path.clone(),
                source,
            }
        })?;

        Ok(path)
    }

    /// Deletes a tile if present. Returns true if a file was removed.
    pub fn remove(&self, tile: &TileCoord) -> Result<bool, RenderError> {
        let path = self.path_for(tile);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(RenderError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    #[test]
    fn test_path_layout() {
        let writer = TileWriter::new(ArtifactKind::FogOfWar, "/tiles/fow");
        let tile = TileCoord { x: 2104, y: 1350, zoom: 12 };
        assert_eq!(
            writer.path_for(&tile),
            PathBuf::from("/tiles/fow/12/2104/1350.png")
        );
    }

    #[test]
    fn test_write_creates_png_without_leftovers() {
        let temp = TempDir::new().unwrap();
        let writer = TileWriter::new(ArtifactKind::GlobalHeatmap, temp.path());
        let tile = TileCoord { x: 5, y: 6, zoom: 7 };
        let image = RgbaImage::from_pixel(256, 256, Rgba([1, 2, 3, 4]));

        let path = writer.write(&tile, &image).unwrap();
        assert_eq!(path, temp.path().join("7/5/6.png"));

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(*decoded.get_pixel(0, 0), Rgba([1, 2, 3, 4]));

        let entries: Vec<_> = fs::read_dir(temp.path().join("7/5"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("6.png")]);
    }

    #[test]
    fn test_write_replaces_existing_tile() {
        let temp = TempDir::new().unwrap();
        let writer = TileWriter::new(ArtifactKind::GatewayCount, temp.path());
        let tile = TileCoord { x: 0, y: 0, zoom: 1 };

        writer
            .write(&tile, &RgbaImage::from_pixel(256, 256, Rgba([0, 0, 0, 255])))
            .unwrap();
        let path = writer
            .write(&tile, &RgbaImage::from_pixel(256, 256, Rgba([9, 9, 9, 255])))
            .unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(*decoded.get_pixel(100, 100), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_remove_missing_tile_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let writer = TileWriter::new(ArtifactKind::GlobalHeatmap, temp.path());
        let tile = TileCoord { x: 1, y: 1, zoom: 3 };

        assert!(!writer.remove(&tile).unwrap());
        writer.write(&tile, &RgbaImage::new(256, 256)).unwrap();
        assert!(writer.remove(&tile).unwrap());
        assert!(!writer.path_for(&tile).exists());
    }

    #[test]
    fn test_write_into_unwritable_root_fails() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let writer = TileWriter::new(ArtifactKind::FogOfWar, &blocker);
        let err = writer
            .write(&TileCoord { x: 0, y: 0, zoom: 0 }, &RgbaImage::new(256, 256))
            .unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }
}
