//! A small real-time rendering demo: sprites bounce around a low-resolution
//! logical world, the world is drawn into an off-screen render target every
//! frame, and the target is composited onto the window through a CRT-style
//! post-process shader compiled from disk at startup.

pub mod application;
pub mod asset;
pub mod compositor;
pub mod context;
pub mod error;
pub mod shader;
pub mod sprite;
pub mod texture;
pub mod vertex;

/// Default window width in pixels.
pub const WINDOW_WIDTH: u32 = 640;
/// Default window height in pixels.
pub const WINDOW_HEIGHT: u32 = 480;
/// Width of the logical world the sprites move in.
pub const WORLD_WIDTH: u32 = 320;
/// Height of the logical world the sprites move in.
pub const WORLD_HEIGHT: u32 = 240;
/// Side length of the square sprites, in world units.
pub const SPRITE_EXTENT: u32 = 32;
/// Number of sprites in the demo.
pub const SPRITE_COUNT: usize = 20;
