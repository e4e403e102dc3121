//! Vertex data shared by the world pass and the composite pass.

use glow::HasContext;

/// Vertex with position and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Textured {
    /// Vertex coordinates (x, y).
    pub position: [f32; 2],
    /// Texture coordinates (u, v).
    pub tex_coords: [f32; 2],
}

impl Textured {
    /// Byte distance between consecutive vertices in a buffer.
    pub const STRIDE: i32 = std::mem::size_of::<Textured>() as i32;
    /// Attribute location of `position`; fixed by the built-in shaders, and
    /// the convention disk-loaded shaders must follow.
    pub const LOCATION_POSITION: u32 = 0;
    /// Attribute location of `tex_coords`.
    pub const LOCATION_TEX_COORDS: u32 = 1;

    /// Describe the vertex layout to the currently bound vertex array.
    pub fn configure_attributes(gl: &glow::Context) {
        unsafe {
            gl.enable_vertex_attrib_array(Self::LOCATION_POSITION);
            gl.vertex_attrib_pointer_f32(
                Self::LOCATION_POSITION,
                2,
                glow::FLOAT,
                false,
                Self::STRIDE,
                0,
            );
            gl.enable_vertex_attrib_array(Self::LOCATION_TEX_COORDS);
            gl.vertex_attrib_pointer_f32(
                Self::LOCATION_TEX_COORDS,
                2,
                glow::FLOAT,
                false,
                Self::STRIDE,
                std::mem::size_of::<[f32; 2]>() as i32,
            );
        }
    }
}
