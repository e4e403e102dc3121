//! Shader compilation and program linking.

use std::fmt;

use glow::HasContext as Gl;

use crate::error::ProgramCreationError;

/// Shader stage kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Per-vertex transform stage.
    Vertex,
    /// Per-pixel colour stage.
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Operations the shader pipeline needs from the graphics API.
///
/// This is the resolved entry-point table as an explicit seam: the production
/// implementation forwards to the glow context whose function pointers were
/// resolved at startup, while tests substitute a recording fake so the
/// compile/link protocol runs without a GL context.
pub trait ShaderBackend {
    /// Opaque shader object handle.
    type ShaderId: Copy + Eq + fmt::Debug;
    /// Opaque program object handle.
    type ProgramId: Copy + Eq + fmt::Debug;

    /// Allocate a new shader object for the given stage.
    fn create_shader(&self, stage: Stage) -> Result<Self::ShaderId, String>;
    /// Replace the shader object's source text.
    fn shader_source(&self, shader: Self::ShaderId, source: &str);
    /// Compile the shader object's current source.
    fn compile_shader(&self, shader: Self::ShaderId);
    /// Whether the last compilation of the shader object succeeded.
    fn compile_succeeded(&self, shader: Self::ShaderId) -> bool;
    /// Diagnostic log of the shader object (empty when the driver has nothing to report).
    fn shader_log(&self, shader: Self::ShaderId) -> String;
    /// Release the shader object.
    fn delete_shader(&self, shader: Self::ShaderId);
    /// Allocate a new program object.
    fn create_program(&self) -> Result<Self::ProgramId, String>;
    /// Attach a shader object to a program object.
    fn attach_shader(&self, program: Self::ProgramId, shader: Self::ShaderId);
    /// Link the program object from its attached shaders.
    fn link_program(&self, program: Self::ProgramId);
    /// Validate the program object against the current API state.
    fn validate_program(&self, program: Self::ProgramId);
    /// Whether the last link of the program object succeeded.
    fn link_succeeded(&self, program: Self::ProgramId) -> bool;
    /// Diagnostic log of the program object.
    fn program_log(&self, program: Self::ProgramId) -> String;
    /// Activate a program (`None` deactivates the current one).
    fn use_program(&self, program: Option<Self::ProgramId>);
    /// The currently active program, if any.
    fn current_program(&self) -> Option<Self::ProgramId>;
}

impl ShaderBackend for glow::Context {
    type ShaderId = glow::NativeShader;
    type ProgramId = glow::NativeProgram;

    fn create_shader(&self, stage: Stage) -> Result<glow::NativeShader, String> {
        let kind = match stage {
            Stage::Vertex => glow::VERTEX_SHADER,
            Stage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { Gl::create_shader(self, kind) }
    }

    fn shader_source(&self, shader: glow::NativeShader, source: &str) {
        unsafe { Gl::shader_source(self, shader, source) };
    }

    fn compile_shader(&self, shader: glow::NativeShader) {
        unsafe { Gl::compile_shader(self, shader) };
    }

    fn compile_succeeded(&self, shader: glow::NativeShader) -> bool {
        unsafe { Gl::get_shader_compile_status(self, shader) }
    }

    fn shader_log(&self, shader: glow::NativeShader) -> String {
        unsafe { Gl::get_shader_info_log(self, shader) }
    }

    fn delete_shader(&self, shader: glow::NativeShader) {
        unsafe { Gl::delete_shader(self, shader) };
    }

    fn create_program(&self) -> Result<glow::NativeProgram, String> {
        unsafe { Gl::create_program(self) }
    }

    fn attach_shader(&self, program: glow::NativeProgram, shader: glow::NativeShader) {
        unsafe { Gl::attach_shader(self, program, shader) };
    }

    fn link_program(&self, program: glow::NativeProgram) {
        unsafe { Gl::link_program(self, program) };
    }

    fn validate_program(&self, program: glow::NativeProgram) {
        unsafe { Gl::validate_program(self, program) };
    }

    fn link_succeeded(&self, program: glow::NativeProgram) -> bool {
        unsafe { Gl::get_program_link_status(self, program) }
    }

    fn program_log(&self, program: glow::NativeProgram) -> String {
        unsafe { Gl::get_program_info_log(self, program) }
    }

    fn use_program(&self, program: Option<glow::NativeProgram>) {
        unsafe { Gl::use_program(self, program) };
    }

    fn current_program(&self) -> Option<glow::NativeProgram> {
        let raw = unsafe { Gl::get_parameter_i32(self, glow::CURRENT_PROGRAM) };
        std::num::NonZeroU32::new(raw as u32).map(glow::NativeProgram)
    }
}

/// Data required for creating a GPU shader program.
#[derive(Debug)]
pub struct ShaderDescriptor<'a> {
    /// Source code for the vertex shader.
    pub vertex_source: &'a str,
    /// Source code for the fragment shader.
    pub fragment_source: &'a str,
}

/// Shader object whose deletion is tied to the enclosing scope.
struct StageGuard<'a, B: ShaderBackend> {
    backend: &'a B,
    id: B::ShaderId,
}

impl<B: ShaderBackend> Drop for StageGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.delete_shader(self.id);
    }
}

/// Compile one shader stage.
///
/// The source text is logged before compilation so malformed shader files can
/// be diagnosed from the output. On failure the compiler log is surfaced, the
/// shader object is released, and `None` is returned; failure to allocate the
/// shader object is treated the same way. On success the returned guard keeps
/// the handle alive until it drops.
fn compile_stage<'a, B: ShaderBackend>(
    backend: &'a B,
    source: &str,
    stage: Stage,
) -> Option<StageGuard<'a, B>> {
    log::debug!("Compiling {stage} shader:\n{source}");

    let id = match backend.create_shader(stage) {
        Ok(id) => id,
        Err(err) => {
            log::error!("Failed to allocate a {stage} shader object: {err}.");
            return None;
        }
    };
    let guard = StageGuard { backend, id };

    backend.shader_source(id, source);
    backend.compile_shader(id);

    if backend.compile_succeeded(id) {
        log::debug!("{stage} shader {id:?} compiled correctly.");
        Some(guard)
    } else {
        log::error!("Error when compiling {stage} shader {id:?}!");
        let diagnostics = backend.shader_log(id);
        if !diagnostics.is_empty() {
            log::error!("Shader compile log:\n{diagnostics}");
        }
        // Dropping the guard here releases the failed shader object.
        None
    }
}

/// A GPU shader program built from a vertex and a fragment stage.
pub struct ShaderProgram<B: ShaderBackend> {
    /// Program object handle; valid even when linking failed.
    handle: B::ProgramId,
    /// Whether the program linked and can be activated.
    linked: bool,
}

impl<B: ShaderBackend> ShaderProgram<B> {
    /// Compile both stages and link them into a program.
    ///
    /// The program object is created up front, so a stable handle is returned
    /// even when a stage fails to compile; the caller then holds an unlinked
    /// program and [`ShaderProgram::is_linked`] reports false. Both
    /// intermediate shader objects are released before this returns,
    /// independently of each other and of the link outcome.
    pub fn compile(
        backend: &B,
        descriptor: &ShaderDescriptor,
    ) -> Result<Self, ProgramCreationError> {
        let handle = backend.create_program().map_err(|err| {
            log::error!("Failed to allocate a program object: {err}.");
            ProgramCreationError::ProgramAllocation
        })?;

        let vertex = compile_stage(backend, descriptor.vertex_source, Stage::Vertex);
        let fragment = compile_stage(backend, descriptor.fragment_source, Stage::Fragment);

        let mut linked = false;
        if let (Some(vertex), Some(fragment)) = (&vertex, &fragment) {
            backend.attach_shader(handle, vertex.id);
            backend.attach_shader(handle, fragment.id);
            backend.link_program(handle);
            backend.validate_program(handle);

            // Link/validate diagnostics are inspected whenever present, not
            // only on failure; shader compilation above surfaces its log only
            // on failure.
            let diagnostics = backend.program_log(handle);
            if !diagnostics.is_empty() {
                log::info!("Program log for {handle:?}:\n{diagnostics}");
            }

            linked = backend.link_succeeded(handle);
            if !linked {
                log::error!("Failed to link program {handle:?}.");
            }
        }

        // The stage guards drop here, releasing whichever shader objects were
        // compiled.
        Ok(Self { handle, linked })
    }

    /// Raw program object handle.
    pub fn handle(&self) -> B::ProgramId {
        self.handle
    }

    /// Whether the program linked successfully and can be activated.
    pub fn is_linked(&self) -> bool {
        self.linked
    }
}

/// Scoped activation of a program.
///
/// Saves the active program (including "no program") on creation and restores
/// it when dropped.
pub struct ProgramBinding<'a, B: ShaderBackend> {
    backend: &'a B,
    previous: Option<B::ProgramId>,
}

impl<'a, B: ShaderBackend> ProgramBinding<'a, B> {
    /// Save the active program and activate `program` in its place.
    pub fn bind(backend: &'a B, program: B::ProgramId) -> Self {
        let previous = backend.current_program();
        backend.use_program(Some(program));
        Self { backend, previous }
    }
}

impl<B: ShaderBackend> Drop for ProgramBinding<'_, B> {
    fn drop(&mut self) {
        self.backend.use_program(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Marker that makes the fake compiler reject a source string.
    const BAD_SOURCE: &str = "!syntax-error";

    #[derive(Default)]
    struct MockState {
        next_id: u32,
        sources: HashMap<u32, String>,
        compiled: HashMap<u32, bool>,
        live_shaders: Vec<u32>,
        deleted_shaders: Vec<u32>,
        shader_log_queries: u32,
        programs: Vec<u32>,
        attachments: Vec<(u32, u32)>,
        linked_programs: Vec<u32>,
        validated_programs: Vec<u32>,
        program_log_queries: u32,
        active: Option<u32>,
    }

    /// Recording fake of the GL shader pipeline.
    #[derive(Default)]
    struct MockBackend {
        state: RefCell<MockState>,
    }

    impl ShaderBackend for MockBackend {
        type ShaderId = u32;
        type ProgramId = u32;

        fn create_shader(&self, _stage: Stage) -> Result<u32, String> {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = state.next_id;
            state.live_shaders.push(id);
            Ok(id)
        }

        fn shader_source(&self, shader: u32, source: &str) {
            self.state
                .borrow_mut()
                .sources
                .insert(shader, source.to_string());
        }

        fn compile_shader(&self, shader: u32) {
            let mut state = self.state.borrow_mut();
            let ok = state
                .sources
                .get(&shader)
                .map(|source| !source.contains(BAD_SOURCE))
                .unwrap_or(false);
            state.compiled.insert(shader, ok);
        }

        fn compile_succeeded(&self, shader: u32) -> bool {
            *self.state.borrow().compiled.get(&shader).unwrap_or(&false)
        }

        fn shader_log(&self, shader: u32) -> String {
            let mut state = self.state.borrow_mut();
            state.shader_log_queries += 1;
            if *state.compiled.get(&shader).unwrap_or(&false) {
                String::new()
            } else {
                String::from("0:1: syntax error")
            }
        }

        fn delete_shader(&self, shader: u32) {
            let mut state = self.state.borrow_mut();
            state.live_shaders.retain(|&id| id != shader);
            state.deleted_shaders.push(shader);
        }

        fn create_program(&self) -> Result<u32, String> {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = state.next_id;
            state.programs.push(id);
            Ok(id)
        }

        fn attach_shader(&self, program: u32, shader: u32) {
            self.state.borrow_mut().attachments.push((program, shader));
        }

        fn link_program(&self, program: u32) {
            self.state.borrow_mut().linked_programs.push(program);
        }

        fn validate_program(&self, program: u32) {
            self.state.borrow_mut().validated_programs.push(program);
        }

        fn link_succeeded(&self, program: u32) -> bool {
            self.state.borrow().linked_programs.contains(&program)
        }

        fn program_log(&self, _program: u32) -> String {
            self.state.borrow_mut().program_log_queries += 1;
            String::new()
        }

        fn use_program(&self, program: Option<u32>) {
            self.state.borrow_mut().active = program;
        }

        fn current_program(&self) -> Option<u32> {
            self.state.borrow().active
        }
    }

    #[test]
    fn test_compile_stage_success_emits_no_diagnostics() {
        let backend = MockBackend::default();
        let guard = compile_stage(&backend, "void main() {}", Stage::Vertex);
        assert!(guard.is_some());
        assert_eq!(backend.state.borrow().shader_log_queries, 0);

        drop(guard);
        let state = backend.state.borrow();
        assert!(state.live_shaders.is_empty());
        assert_eq!(state.deleted_shaders.len(), 1);
    }

    #[test]
    fn test_compile_stage_failure_deletes_shader_and_surfaces_log() {
        let backend = MockBackend::default();
        let guard = compile_stage(&backend, BAD_SOURCE, Stage::Fragment);
        assert!(guard.is_none());

        let state = backend.state.borrow();
        assert!(state.live_shaders.is_empty());
        assert_eq!(state.deleted_shaders.len(), 1);
        assert!(state.shader_log_queries > 0);
    }

    #[test]
    fn test_link_attaches_validates_and_deletes_both_stages() {
        let backend = MockBackend::default();
        let program = ShaderProgram::compile(
            &backend,
            &ShaderDescriptor {
                vertex_source: "void main() {}",
                fragment_source: "void main() {}",
            },
        )
        .unwrap();
        assert!(program.is_linked());

        let state = backend.state.borrow();
        assert_eq!(state.attachments.len(), 2);
        assert_eq!(state.linked_programs, vec![program.handle()]);
        assert_eq!(state.validated_programs, vec![program.handle()]);
        // The program log is inspected even though linking succeeded.
        assert_eq!(state.program_log_queries, 1);
        // Both intermediate shader objects are gone, each deleted exactly once.
        assert!(state.live_shaders.is_empty());
        assert_eq!(state.deleted_shaders.len(), 2);
    }

    #[test]
    fn test_link_with_failed_stage_still_returns_a_program() {
        let backend = MockBackend::default();
        let program = ShaderProgram::compile(
            &backend,
            &ShaderDescriptor {
                vertex_source: BAD_SOURCE,
                fragment_source: "void main() {}",
            },
        )
        .unwrap();
        assert!(!program.is_linked());

        let state = backend.state.borrow();
        // Nothing was attached or linked, but the program handle exists.
        assert!(state.attachments.is_empty());
        assert!(state.linked_programs.is_empty());
        assert!(state.programs.contains(&program.handle()));
        // Both stage objects were released, each exactly once.
        assert!(state.live_shaders.is_empty());
        assert_eq!(state.deleted_shaders.len(), 2);
        let mut unique = state.deleted_shaders.clone();
        unique.dedup();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_program_binding_restores_previous_program() {
        let backend = MockBackend::default();
        let first = backend.create_program().unwrap();
        let second = backend.create_program().unwrap();

        backend.use_program(Some(first));
        {
            let _binding = ProgramBinding::bind(&backend, second);
            assert_eq!(backend.current_program(), Some(second));
        }
        assert_eq!(backend.current_program(), Some(first));
    }

    #[test]
    fn test_program_binding_restores_no_program() {
        let backend = MockBackend::default();
        let program = backend.create_program().unwrap();

        {
            let _binding = ProgramBinding::bind(&backend, program);
            assert_eq!(backend.current_program(), Some(program));
        }
        assert_eq!(backend.current_program(), None);
    }
}
