//! Error types.

use std::{error::Error, fmt};

/// Possible errors during application startup.
#[derive(Debug, Copy, Clone)]
pub enum AppCreationError {
    /// SDL initialisation failed.
    SdlInit,
    /// The SDL video subsystem could not be initialised.
    VideoSubsystem,
    /// Error while creating the window.
    WindowCreation,
    /// Error while creating or activating the GL context.
    GlContextCreation,
    /// One or more required GL entry points did not resolve.
    EntryPointResolution,
    /// Error while creating the frame compositor.
    CompositorCreation,
    /// Error while creating the sprite renderer.
    SpriteRendererCreation,
    /// Error while allocating a program object.
    ProgramCreation,
    /// Error while loading or uploading the sprite texture.
    TextureCreation,
    /// Error while creating the event pump.
    EventPump,
}

impl Error for AppCreationError {}

impl fmt::Display for AppCreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::SdlInit => write!(f, "Failed to initialise SDL."),
            Self::VideoSubsystem => write!(f, "Failed to initialise the SDL video subsystem."),
            Self::WindowCreation => write!(f, "Failed to create the window."),
            Self::GlContextCreation => {
                write!(f, "Failed to create or activate the GL context.")
            }
            Self::EntryPointResolution => {
                write!(f, "Failed to resolve the required GL entry points.")
            }
            Self::CompositorCreation => write!(f, "Failed to create the frame compositor."),
            Self::SpriteRendererCreation => write!(f, "Failed to create the sprite renderer."),
            Self::ProgramCreation => write!(f, "Failed to allocate a program object."),
            Self::TextureCreation => {
                write!(f, "Failed to load or upload the sprite texture.")
            }
            Self::EventPump => write!(f, "Failed to create the event pump."),
        }
    }
}

/// Failure to resolve the required GL entry points.
/// Resolution is all-or-nothing, so a single missing name produces this error;
/// every missing name is listed.
#[derive(Debug, Clone)]
pub struct MissingEntryPoints {
    /// Entry-point names that resolved to a null address.
    pub names: Vec<&'static str>,
}

impl Error for MissingEntryPoints {}

impl fmt::Display for MissingEntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Failed to resolve GL entry points: {}.",
            self.names.join(", ")
        )
    }
}

/// Possible errors during program object creation.
/// Stage compilation failures are not errors: they leave the program unlinked.
#[derive(Debug, Copy, Clone)]
pub enum ProgramCreationError {
    /// The graphics API could not allocate a program object.
    ProgramAllocation,
}

impl Error for ProgramCreationError {}

impl fmt::Display for ProgramCreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::ProgramAllocation => {
                write!(f, "The graphics API could not allocate a program object.")
            }
        }
    }
}

/// Possible errors during render target creation.
#[derive(Debug, Copy, Clone)]
pub enum RenderTargetCreationError {
    /// The graphics API could not allocate the framebuffer object.
    FramebufferAllocation,
    /// The graphics API could not allocate the colour attachment texture.
    TextureAllocation,
    /// The framebuffer is not complete with its colour attachment.
    Incomplete,
}

impl Error for RenderTargetCreationError {}

impl fmt::Display for RenderTargetCreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::FramebufferAllocation => {
                write!(f, "Failed to allocate the framebuffer object.")
            }
            Self::TextureAllocation => {
                write!(f, "Failed to allocate the colour attachment texture.")
            }
            Self::Incomplete => {
                write!(f, "The render target framebuffer is incomplete.")
            }
        }
    }
}

/// Possible errors during compositor creation.
#[derive(Debug, Copy, Clone)]
pub enum CompositorCreationError {
    /// Error while creating the off-screen render target.
    RenderTarget,
    /// Error while creating the full-viewport quad geometry.
    Geometry,
    /// Error while creating the built-in pass-through program.
    Program,
}

impl Error for CompositorCreationError {}

impl fmt::Display for CompositorCreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::RenderTarget => {
                write!(f, "Failed to create the off-screen render target.")
            }
            Self::Geometry => write!(f, "Failed to create the quad geometry."),
            Self::Program => {
                write!(f, "Failed to create the built-in pass-through program.")
            }
        }
    }
}

/// Possible errors during sprite renderer creation.
#[derive(Debug, Copy, Clone)]
pub enum SpriteRendererCreationError {
    /// Error while creating the quad geometry.
    Geometry,
    /// Error while creating the built-in sprite program.
    Program,
}

impl Error for SpriteRendererCreationError {}

impl fmt::Display for SpriteRendererCreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Geometry => write!(f, "Failed to create the sprite quad geometry."),
            Self::Program => write!(f, "Failed to create the built-in sprite program."),
        }
    }
}
