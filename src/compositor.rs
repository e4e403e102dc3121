//! Off-screen render target and the composite-and-present pass.

use glow::HasContext;
use sdl2::video::Window;

use crate::error::{CompositorCreationError, RenderTargetCreationError};
use crate::shader::{ProgramBinding, ShaderDescriptor, ShaderProgram};
use crate::vertex;

/// Built-in pass-through composite, used when no post-process program is
/// supplied or the supplied one is unusable.
const PASSTHROUGH_SHADER: ShaderDescriptor<'static> = ShaderDescriptor {
    vertex_source: include_str!("shader/composite.vert"),
    fragment_source: include_str!("shader/passthrough.frag"),
};

/// Full-viewport quad: a triangle strip running bottom-left, bottom-right,
/// top-left, top-right, with texture coordinates covering the full [0,1]
/// range of the sampled surface. No vertical flip is applied; the world
/// pass's y-down projection already lands the image upright.
const QUAD_VERTICES: [vertex::Textured; 4] = [
    vertex::Textured {
        position: [-1.0, -1.0],
        tex_coords: [0.0, 0.0],
    },
    vertex::Textured {
        position: [1.0, -1.0],
        tex_coords: [1.0, 0.0],
    },
    vertex::Textured {
        position: [-1.0, 1.0],
        tex_coords: [0.0, 1.0],
    },
    vertex::Textured {
        position: [1.0, 1.0],
        tex_coords: [1.0, 1.0],
    },
];

/// Fixed-size pixel buffer usable both as a draw target and as a texture.
pub struct OffscreenTarget {
    framebuffer: glow::NativeFramebuffer,
    texture: glow::NativeTexture,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    /// Release the GL objects of the target.
    pub fn delete(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_framebuffer(self.framebuffer);
            gl.delete_texture(self.texture);
        }
    }

    /// Create a render target with a single RGBA8 colour attachment.
    pub fn new(
        gl: &glow::Context,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderTargetCreationError> {
        let framebuffer = unsafe { gl.create_framebuffer() }.map_err(|err| {
            log::error!("Failed to allocate the framebuffer object: {err}.");
            RenderTargetCreationError::FramebufferAllocation
        })?;
        let texture = match unsafe { gl.create_texture() } {
            Ok(texture) => texture,
            Err(err) => {
                log::error!("Failed to allocate the colour attachment texture: {err}.");
                unsafe { gl.delete_framebuffer(framebuffer) };
                return Err(RenderTargetCreationError::TextureAllocation);
            }
        };

        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            // Nearest filtering keeps the low-resolution world crisp when the
            // composite scales it up.
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
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
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(None),
            );

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.bind_texture(glow::TEXTURE_2D, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                log::error!("Render target framebuffer incomplete: 0x{status:x}.");
                gl.delete_framebuffer(framebuffer);
                gl.delete_texture(texture);
                return Err(RenderTargetCreationError::Incomplete);
            }
        }

        Ok(Self {
            framebuffer,
            texture,
            width,
            height,
        })
    }

    /// The colour attachment, for sampling.
    pub fn texture(&self) -> glow::NativeTexture {
        self.texture
    }
}

/// Renders the intermediate surface onto the display through a post-process
/// program, presenting the result.
pub struct Compositor {
    /// The intermediate surface all sprite draws land in.
    target: OffscreenTarget,
    vertex_array: glow::NativeVertexArray,
    vertex_buffer: glow::NativeBuffer,
    passthrough: ShaderProgram<glow::Context>,
}

impl Compositor {
    /// Redirect drawing to the intermediate surface and clear it.
    pub fn begin_world_pass(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.target.framebuffer));
            gl.viewport(0, 0, self.target.width as i32, self.target.height as i32);
            // White background, so the post-process is visible across the
            // whole frame and not only on the sprites.
            gl.clear_color(1.0, 1.0, 1.0, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    /// Release the GL objects of the compositor.
    /// The built-in pass-through program is left to process exit.
    pub fn delete(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_buffer(self.vertex_buffer);
            gl.delete_vertex_array(self.vertex_array);
        }
        self.target.delete(gl);
    }

    /// Create the compositor together with its intermediate surface.
    pub fn new(
        gl: &glow::Context,
        world_width: u32,
        world_height: u32,
    ) -> Result<Self, CompositorCreationError> {
        let target = OffscreenTarget::new(gl, world_width, world_height).map_err(|err| {
            log::error!("Failed to create the intermediate render surface: {err}");
            CompositorCreationError::RenderTarget
        })?;

        let vertex_array = unsafe { gl.create_vertex_array() }.map_err(|err| {
            log::error!("Failed to allocate the composite vertex array: {err}.");
            CompositorCreationError::Geometry
        })?;
        let vertex_buffer = unsafe { gl.create_buffer() }.map_err(|err| {
            log::error!("Failed to allocate the composite vertex buffer: {err}.");
            CompositorCreationError::Geometry
        })?;
        unsafe {
            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES[..]),
                glow::STATIC_DRAW,
            );
            vertex::Textured::configure_attributes(gl);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        let passthrough = ShaderProgram::compile(gl, &PASSTHROUGH_SHADER).map_err(|err| {
            log::error!("Failed to create the pass-through program: {err}");
            CompositorCreationError::Program
        })?;

        Ok(Self {
            target,
            vertex_array,
            vertex_buffer,
            passthrough,
        })
    }

    /// Composite the intermediate surface onto the display and present it.
    ///
    /// The previously active program (including "no program") is restored
    /// before returning. The draw target is intentionally left pointing at
    /// the display: the next frame starts by redirecting it back to the
    /// intermediate surface.
    pub fn present_frame(
        &self,
        gl: &glow::Context,
        window: &Window,
        post_program: Option<&ShaderProgram<glow::Context>>,
    ) {
        let (width, height) = window.size();
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.viewport(0, 0, width as i32, height as i32);
            gl.clear_color(0.0, 0.0, 0.0, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT);

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.target.texture));
        }

        // An absent or unusable post program falls back to the plain
        // composite; a core-profile context renders nothing without one.
        let program = match post_program {
            Some(program) if program.is_linked() => program,
            _ => &self.passthrough,
        };
        let _binding = ProgramBinding::bind(gl, program.handle());

        unsafe {
            if let Some(location) = gl.get_uniform_location(program.handle(), "u_scene") {
                gl.uniform_1_i32(Some(&location), 0);
            }
            gl.bind_vertex_array(Some(self.vertex_array));
            gl.draw_arrays(glow::TRIANGLE_STRIP, 0, QUAD_VERTICES.len() as i32);
            gl.bind_vertex_array(None);
        }

        window.gl_swap_window();
        // The binding drops here, restoring the saved program state.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_strip_runs_bottom_left_to_top_right() {
        let positions: Vec<[f32; 2]> = QUAD_VERTICES.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]]
        );
    }

    #[test]
    fn test_quad_samples_full_texture_range() {
        let tex_coords: Vec<[f32; 2]> = QUAD_VERTICES.iter().map(|v| v.tex_coords).collect();
        assert_eq!(
            tex_coords,
            vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
        );
    }
}
