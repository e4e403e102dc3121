//! SDL video bootstrap and GL entry-point resolution.

use std::ffi::c_void;

use sdl2::video::{GLContext, GLProfile, Window};
use sdl2::VideoSubsystem;

use crate::error::{AppCreationError, MissingEntryPoints};

/// GL entry points the shader pipeline requires.
pub const REQUIRED_ENTRY_POINTS: [&str; 13] = [
    "glCreateShader",
    "glShaderSource",
    "glCompileShader",
    "glGetShaderiv",
    "glGetShaderInfoLog",
    "glDeleteShader",
    "glAttachShader",
    "glCreateProgram",
    "glLinkProgram",
    "glValidateProgram",
    "glGetProgramiv",
    "glGetProgramInfoLog",
    "glUseProgram",
];

/// Check that every required GL entry point resolves to a non-null address.
///
/// Resolution is all-or-nothing: a single missing name makes the whole shader
/// pipeline unusable, so the error lists every name that failed and the
/// caller must abort startup.
pub fn resolve_entry_points<F>(mut lookup: F) -> Result<(), MissingEntryPoints>
where
    F: FnMut(&str) -> *const c_void,
{
    let missing: Vec<&'static str> = REQUIRED_ENTRY_POINTS
        .iter()
        .copied()
        .filter(|name| lookup(name).is_null())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MissingEntryPoints { names: missing })
    }
}

/// Window, GL context and loaded function pointers.
pub struct GraphicsContext {
    /// Loaded GL function pointers.
    pub gl: glow::Context,
    // Declared before the window so it is released first; no GL call may
    // happen afterwards.
    _gl_context: GLContext,
    /// The visible window.
    pub window: Window,
    /// SDL video subsystem handle.
    pub video: VideoSubsystem,
}

impl GraphicsContext {
    /// Create the window and GL context and resolve the shader entry points.
    pub fn new(
        sdl: &sdl2::Sdl,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Self, AppCreationError> {
        let video = sdl.video().map_err(|err| {
            log::error!("Failed to initialise the SDL video subsystem: {err}.");
            AppCreationError::VideoSubsystem
        })?;

        {
            let gl_attr = video.gl_attr();
            gl_attr.set_context_profile(GLProfile::Core);
            gl_attr.set_context_version(3, 3);
            gl_attr.set_double_buffer(true);
        }

        let window = video
            .window(title, width, height)
            .position_centered()
            .opengl()
            .build()
            .map_err(|err| {
                log::error!("Failed to create the window: {err}.");
                AppCreationError::WindowCreation
            })?;

        let gl_context = window.gl_create_context().map_err(|err| {
            log::error!("Failed to create the GL context: {err}.");
            AppCreationError::GlContextCreation
        })?;
        window.gl_make_current(&gl_context).map_err(|err| {
            log::error!("Failed to make the GL context current: {err}.");
            AppCreationError::GlContextCreation
        })?;

        if let Err(err) = video.gl_set_swap_interval(1) {
            log::warn!("Failed to enable vsync: {err}.");
        }

        resolve_entry_points(|name| video.gl_get_proc_address(name) as *const c_void).map_err(
            |err| {
                log::error!("{err}");
                AppCreationError::EntryPointResolution
            },
        )?;

        let gl = unsafe {
            glow::Context::from_loader_function(|name| video.gl_get_proc_address(name) as *const _)
        };

        Ok(Self {
            gl,
            _gl_context: gl_context,
            window,
            video,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_succeeds_when_every_name_resolves() {
        let result = resolve_entry_points(|_| 1usize as *const c_void);
        assert!(result.is_ok());
    }

    #[test]
    fn test_resolution_is_all_or_nothing() {
        let failing = REQUIRED_ENTRY_POINTS[4];
        let result = resolve_entry_points(|name| {
            if name == failing {
                std::ptr::null()
            } else {
                1usize as *const c_void
            }
        });
        let err = result.unwrap_err();
        assert_eq!(err.names, vec![failing]);
    }

    #[test]
    fn test_resolution_reports_every_missing_name() {
        let result = resolve_entry_points(|_| std::ptr::null());
        let err = result.unwrap_err();
        assert_eq!(err.names.len(), REQUIRED_ENTRY_POINTS.len());
    }
}
