use std::path::Path;

use roadscene_scene::Texture;

use crate::AssetError;

/// Decode an image file into RGBA8.
pub fn load_texture(path: impl AsRef<Path>) -> Result<Texture, AssetError> {
    let path = path.as_ref();
    let rgba = image::open(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::info!("loaded texture {} ({width}x{height})", path.display());
    Ok(Texture {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("road.png");
        let mut img = image::RgbaImage::new(2, 3);
        img.put_pixel(1, 2, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let tex = load_texture(&path).unwrap();
        assert_eq!((tex.width, tex.height), (2, 3));
        assert_eq!(tex.rgba.len(), 2 * 3 * 4);
        assert_eq!(&tex.rgba[(2 * 2 + 1) * 4..][..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn missing_texture_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_texture(dir.path().join("R3.jpg")).unwrap_err();
        assert!(matches!(err, AssetError::Image(_)));
    }
}
