//! Textures.

use anyhow::{anyhow, Result};
use cgmath::Vector2;
use glow::HasContext;
use image::GenericImageView;

/// GL texture with its source dimensions.
pub struct Texture {
    /// Raw GL texture object.
    raw: glow::NativeTexture,
    /// Source image dimensions.
    size: Vector2<u32>,
}

impl Texture {
    /// Release the GL texture object.
    pub fn delete(&self, gl: &glow::Context) {
        unsafe { gl.delete_texture(self.raw) };
    }

    /// Create a texture from a decoded image.
    pub fn from_image(gl: &glow::Context, img: &image::DynamicImage, label: &str) -> Result<Self> {
        let dimensions = img.dimensions();
        let pixels = img.to_rgba8().into_raw();

        let raw = unsafe { gl.create_texture() }
            .map_err(|err| anyhow!("failed to allocate a texture object for {label}: {err}"))?;

        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(raw));
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                dimensions.0 as i32,
                dimensions.1 as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels.as_slice())),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
        }

        Ok(Self {
            raw,
            size: Vector2 {
                x: dimensions.0,
                y: dimensions.1,
            },
        })
    }

    /// Raw GL handle.
    pub fn raw(&self) -> glow::NativeTexture {
        self.raw
    }

    /// Source image dimensions.
    pub fn size(&self) -> Vector2<u32> {
        self.size
    }
}
