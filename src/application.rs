//! Main application: startup wiring, the frame loop, and teardown.

use std::path::PathBuf;

use cgmath::Vector2;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use crate::asset;
use crate::compositor::Compositor;
use crate::context::GraphicsContext;
use crate::error::AppCreationError;
use crate::shader::{ShaderDescriptor, ShaderProgram};
use crate::sprite::{Sprite, SpriteRenderer};
use crate::texture::Texture;
use crate::{SPRITE_COUNT, SPRITE_EXTENT, WORLD_HEIGHT, WORLD_WIDTH};

/// Parameters for the application creation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the shader sources and the sprite image.
    pub asset_dir: PathBuf,
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            window_width: crate::WINDOW_WIDTH,
            window_height: crate::WINDOW_HEIGHT,
        }
    }
}

/// Largest valid sprite position per axis.
fn world_bounds() -> Vector2<f32> {
    Vector2 {
        x: (WORLD_WIDTH - SPRITE_EXTENT) as f32,
        y: (WORLD_HEIGHT - SPRITE_EXTENT) as f32,
    }
}

/// All data and code of the demo.
pub struct App {
    graphics: GraphicsContext,
    compositor: Compositor,
    sprite_renderer: SpriteRenderer,
    sprite_texture: Texture,
    /// The CRT post-process compiled from the disk sources. May be unlinked;
    /// the compositor falls back to its pass-through program in that case.
    post_program: ShaderProgram<glow::Context>,
    /// Whether the post-process is applied during the composite.
    post_enabled: bool,
    sprites: Vec<Sprite>,
    event_pump: sdl2::EventPump,
    _sdl: sdl2::Sdl,
}

impl App {
    /// Create a new application with default initialisation.
    pub fn new(config: AppConfig) -> Result<Self, AppCreationError> {
        let sdl = sdl2::init().map_err(|err| {
            log::error!("Failed to initialise SDL: {err}.");
            AppCreationError::SdlInit
        })?;

        let graphics = GraphicsContext::new(
            &sdl,
            "crtbounce",
            config.window_width,
            config.window_height,
        )?;
        let gl = &graphics.gl;

        let compositor = Compositor::new(gl, WORLD_WIDTH, WORLD_HEIGHT).map_err(|err| {
            log::error!("Failed to create the frame compositor: {err}");
            AppCreationError::CompositorCreation
        })?;

        let sprite_renderer = SpriteRenderer::new(gl, WORLD_WIDTH, WORLD_HEIGHT).map_err(|err| {
            log::error!("Failed to create the sprite renderer: {err}");
            AppCreationError::SpriteRendererCreation
        })?;

        let img = asset::load_image(&config.asset_dir.join("image.png")).map_err(|err| {
            log::error!("Failed to load the sprite image: {err:#}.");
            AppCreationError::TextureCreation
        })?;
        let sprite_texture = Texture::from_image(gl, &img, "sprite").map_err(|err| {
            log::error!("Failed to upload the sprite texture: {err:#}.");
            AppCreationError::TextureCreation
        })?;

        // Compile/link failures here are non-fatal: the handle survives
        // unlinked and the composite falls back to the plain path.
        let shader_dir = config.asset_dir.join("shaders");
        let vertex_source = asset::load_shader_source(&shader_dir, "std.vert");
        let fragment_source = asset::load_shader_source(&shader_dir, "crt.frag");
        let post_program = ShaderProgram::compile(
            gl,
            &ShaderDescriptor {
                vertex_source: &vertex_source,
                fragment_source: &fragment_source,
            },
        )
        .map_err(|err| {
            log::error!("Failed to create the post-process program: {err}");
            AppCreationError::ProgramCreation
        })?;
        log::info!(
            "Post-process program {:?} (linked: {}).",
            post_program.handle(),
            post_program.is_linked()
        );

        let bounds = world_bounds();
        let mut rng = rand::thread_rng();
        let sprites = (0..SPRITE_COUNT)
            .map(|_| Sprite::random(&mut rng, bounds))
            .collect();

        let event_pump = sdl.event_pump().map_err(|err| {
            log::error!("Failed to create the event pump: {err}.");
            AppCreationError::EventPump
        })?;

        Ok(Self {
            graphics,
            compositor,
            sprite_renderer,
            sprite_texture,
            post_program,
            post_enabled: true,
            sprites,
            event_pump,
            _sdl: sdl,
        })
    }

    /// Run the main loop until a quit signal arrives, then release resources.
    pub fn run(mut self) {
        let bounds = world_bounds();
        let mut done = false;

        while !done {
            // World pass: advance and draw every sprite into the intermediate
            // surface.
            self.compositor.begin_world_pass(&self.graphics.gl);
            for sprite in self.sprites.iter_mut() {
                sprite.advance(bounds);
                self.sprite_renderer.draw(
                    &self.graphics.gl,
                    &self.sprite_texture,
                    sprite,
                    SPRITE_EXTENT as f32,
                );
            }

            // Composite the world onto the display.
            let post = self.post_enabled.then_some(&self.post_program);
            self.compositor
                .present_frame(&self.graphics.gl, &self.graphics.window, post);

            // Drain pending input; the frame in flight always completes first.
            for event in self.event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => done = true,
                    Event::KeyDown {
                        keycode: Some(Keycode::Escape),
                        ..
                    } => done = true,
                    Event::KeyDown {
                        keycode: Some(Keycode::Space),
                        ..
                    } => {
                        self.post_enabled = !self.post_enabled;
                        log::info!(
                            "Post-process {}.",
                            if self.post_enabled { "enabled" } else { "disabled" }
                        );
                    }
                    _ => (),
                }
            }
        }

        self.destroy();
    }

    /// Release GL resources in reverse acquisition order.
    /// The compiled programs are deliberately left to process exit.
    fn destroy(&self) {
        let gl = &self.graphics.gl;
        self.sprite_texture.delete(gl);
        self.sprite_renderer.delete(gl);
        self.compositor.delete(gl);
    }
}
