//! Sprite state, bounded-bounce motion, and the world-pass sprite renderer.

use cgmath::{Matrix4, Point2, Vector2, Vector3};
use glow::HasContext;
use rand::Rng;

use crate::error::SpriteRendererCreationError;
use crate::shader::{ProgramBinding, ShaderDescriptor, ShaderProgram};
use crate::texture::Texture;
use crate::vertex;

/// Built-in textured-quad shaders for the world pass.
const SPRITE_SHADER: ShaderDescriptor<'static> = ShaderDescriptor {
    vertex_source: include_str!("shader/sprite.vert"),
    fragment_source: include_str!("shader/sprite.frag"),
};

/// Unit quad in sprite-local coordinates, scaled per draw.
const UNIT_QUAD: [vertex::Textured; 4] = [
    vertex::Textured {
        position: [0.0, 0.0],
        tex_coords: [0.0, 0.0],
    },
    vertex::Textured {
        position: [1.0, 0.0],
        tex_coords: [1.0, 0.0],
    },
    vertex::Textured {
        position: [0.0, 1.0],
        tex_coords: [0.0, 1.0],
    },
    vertex::Textured {
        position: [1.0, 1.0],
        tex_coords: [1.0, 1.0],
    },
];

/// Rectangular element bouncing around the logical world.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    /// Position of the top-left corner in world coordinates.
    pub position: Point2<f32>,
    /// Velocity in world units per tick.
    pub velocity: Vector2<f32>,
}

impl Sprite {
    /// Advance one tick, reflecting the velocity at the world bounds.
    ///
    /// `bounds` is the largest valid position per axis (world extent minus
    /// sprite extent). Axes are handled independently; a corner hit reflects
    /// both in the same tick.
    pub fn advance(&mut self, bounds: Vector2<f32>) {
        self.position.x += self.velocity.x;
        if self.position.x < 0.0 {
            self.position.x = 0.0;
            self.velocity.x = -self.velocity.x;
        }
        if self.position.x > bounds.x {
            self.position.x = bounds.x;
            self.velocity.x = -self.velocity.x;
        }

        self.position.y += self.velocity.y;
        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity.y = -self.velocity.y;
        }
        if self.position.y > bounds.y {
            self.position.y = bounds.y;
            self.velocity.y = -self.velocity.y;
        }
    }

    /// Place a sprite at a random in-bounds position with a random velocity.
    pub fn random<R: Rng>(rng: &mut R, bounds: Vector2<f32>) -> Self {
        Self {
            position: Point2 {
                x: rng.gen_range(0.0..bounds.x),
                y: rng.gen_range(0.0..bounds.y),
            },
            velocity: Vector2 {
                x: rng.gen_range(-0.2..=0.2),
                y: rng.gen_range(-0.2..=0.2),
            },
        }
    }
}

/// Draws textured sprite quads into the world pass.
pub struct SpriteRenderer {
    program: ShaderProgram<glow::Context>,
    vertex_array: glow::NativeVertexArray,
    vertex_buffer: glow::NativeBuffer,
    transform_location: Option<glow::NativeUniformLocation>,
    sampler_location: Option<glow::NativeUniformLocation>,
    /// y-down orthographic projection over the logical world.
    projection: Matrix4<f32>,
}

impl SpriteRenderer {
    /// Release the GL geometry of the renderer.
    /// The built-in sprite program is left to process exit.
    pub fn delete(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_buffer(self.vertex_buffer);
            gl.delete_vertex_array(self.vertex_array);
        }
    }

    /// Draw one sprite at its current position.
    pub fn draw(&self, gl: &glow::Context, texture: &Texture, sprite: &Sprite, extent: f32) {
        let transform = self.projection
            * Matrix4::from_translation(Vector3::new(sprite.position.x, sprite.position.y, 0.0))
            * Matrix4::from_nonuniform_scale(extent, extent, 1.0);
        let columns: [[f32; 4]; 4] = transform.into();

        let _binding = ProgramBinding::bind(gl, self.program.handle());
        unsafe {
            gl.uniform_matrix_4_f32_slice(
                self.transform_location.as_ref(),
                false,
                bytemuck::cast_slice(&columns[..]),
            );
            gl.uniform_1_i32(self.sampler_location.as_ref(), 0);
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture.raw()));
            gl.bind_vertex_array(Some(self.vertex_array));
            gl.draw_arrays(glow::TRIANGLE_STRIP, 0, UNIT_QUAD.len() as i32);
            gl.bind_vertex_array(None);
        }
    }

    /// Create the renderer for a logical world of the given size.
    pub fn new(
        gl: &glow::Context,
        world_width: u32,
        world_height: u32,
    ) -> Result<Self, SpriteRendererCreationError> {
        let program = ShaderProgram::compile(gl, &SPRITE_SHADER).map_err(|err| {
            log::error!("Failed to create the sprite program: {err}");
            SpriteRendererCreationError::Program
        })?;
        if !program.is_linked() {
            log::error!("The built-in sprite program failed to link.");
        }

        let vertex_array = unsafe { gl.create_vertex_array() }.map_err(|err| {
            log::error!("Failed to allocate the sprite vertex array: {err}.");
            SpriteRendererCreationError::Geometry
        })?;
        let vertex_buffer = unsafe { gl.create_buffer() }.map_err(|err| {
            log::error!("Failed to allocate the sprite vertex buffer: {err}.");
            SpriteRendererCreationError::Geometry
        })?;
        unsafe {
            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&UNIT_QUAD[..]),
                glow::STATIC_DRAW,
            );
            vertex::Textured::configure_attributes(gl);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        let transform_location = unsafe { gl.get_uniform_location(program.handle(), "u_transform") };
        let sampler_location = unsafe { gl.get_uniform_location(program.handle(), "u_tex") };

        // Top of the world maps to the top of the frame: y grows downwards,
        // matching the composite pass's unflipped sampling.
        let projection = cgmath::ortho(0.0, world_width as f32, world_height as f32, 0.0, -1.0, 1.0);

        Ok(Self {
            program,
            vertex_array,
            vertex_buffer,
            transform_location,
            sampler_location,
            projection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const BOUNDS: Vector2<f32> = Vector2 { x: 288.0, y: 208.0 };

    #[test]
    fn test_positions_stay_in_bounds() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut sprite = Sprite::random(&mut rng, BOUNDS);
            // Large velocities exercise the clamping on every tick.
            sprite.velocity = sprite.velocity * 400.0;
            for _ in 0..10_000 {
                sprite.advance(BOUNDS);
                assert!(sprite.position.x >= 0.0 && sprite.position.x <= BOUNDS.x);
                assert!(sprite.position.y >= 0.0 && sprite.position.y <= BOUNDS.y);
            }
        }
    }

    #[test]
    fn test_velocity_reflects_exactly_on_bound_contact() {
        let mut sprite = Sprite {
            position: Point2 { x: 1.0, y: 5.0 },
            velocity: Vector2 { x: -2.0, y: 0.5 },
        };
        sprite.advance(BOUNDS);
        assert_eq!(sprite.position.x, 0.0);
        assert_eq!(sprite.velocity.x, 2.0);
        // The untouched axis keeps its velocity.
        assert_eq!(sprite.velocity.y, 0.5);

        // Away from the bounds, the velocity stays put.
        let before = sprite.velocity;
        sprite.advance(BOUNDS);
        assert_eq!(sprite.velocity, before);
    }

    #[test]
    fn test_upper_bound_clamps_and_reflects() {
        let mut sprite = Sprite {
            position: Point2 {
                x: BOUNDS.x - 0.5,
                y: 10.0,
            },
            velocity: Vector2 { x: 2.0, y: 0.0 },
        };
        sprite.advance(BOUNDS);
        assert_eq!(sprite.position.x, BOUNDS.x);
        assert_eq!(sprite.velocity.x, -2.0);
    }

    #[test]
    fn test_corner_hit_reflects_both_axes() {
        let mut sprite = Sprite {
            position: Point2 { x: 1.0, y: 1.0 },
            velocity: Vector2 { x: -3.0, y: -3.0 },
        };
        sprite.advance(BOUNDS);
        assert_eq!(sprite.position, Point2 { x: 0.0, y: 0.0 });
        assert_eq!(sprite.velocity, Vector2 { x: 3.0, y: 3.0 });
    }
}
