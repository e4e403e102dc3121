//! Asset loading (shader sources and the sprite image).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Decode an image file.
pub fn load_image(path: &Path) -> Result<image::DynamicImage> {
    image::open(path).with_context(|| format!("failed to decode image {}", path.display()))
}

/// Read a whole shader source file from the given directory.
///
/// A missing or unreadable file is not fatal: the compiler receives an empty
/// source string and surfaces the resulting diagnostic instead.
pub fn load_shader_source(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            log::warn!("Failed to read shader source {}: {err}.", path.display());
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_shader_source_yields_empty_string() {
        let dir = PathBuf::from("/nonexistent-crtbounce-assets");
        assert_eq!(load_shader_source(&dir, "std.vert"), "");
    }

    #[test]
    fn test_present_shader_source_is_read_whole() {
        let dir = std::env::temp_dir();
        let name = "crtbounce-test-shader.vert";
        std::fs::write(dir.join(name), "void main() {}\n").unwrap();
        assert_eq!(load_shader_source(&dir, name), "void main() {}\n");
        let _ = std::fs::remove_file(dir.join(name));
    }
}
