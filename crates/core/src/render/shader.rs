//! Program compilation for the glow backend.
//!
//! Compiles both stages, links them and points every sampler uniform a
//! pack may declare at its fixed texture unit, so composite programs never
//! set sampler bindings themselves.

use crate::shader::{format_shader_error, ShaderError};
use crate::units::SAMPLER_UNITS;

/// Human-readable stage name used in compile errors.
pub fn stage_name(shader_type: u32) -> &'static str {
    match shader_type {
        glow::VERTEX_SHADER => "vertex",
        glow::FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    }
}

/// Compiles a single shader stage.
///
/// # Errors
///
/// Returns `ShaderError::Compile` with the numbered source and the
/// driver's info log if the GLSL fails to compile.
#[allow(unsafe_code)]
pub fn compile_shader(
    gl: &glow::Context,
    shader_type: u32,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    use glow::HasContext;

    let stage = stage_name(shader_type);

    // SAFETY: glow wraps raw GL calls as unsafe. shader_type is one of the
    // stage constants and the handle is deleted on the error path.
    let shader = unsafe { gl.create_shader(shader_type) }.map_err(|log| {
        ShaderError::Compile {
            stage: stage.to_string(),
            log,
        }
    })?;

    // SAFETY: shader is the live handle created above.
    let compiled = unsafe {
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        gl.get_shader_compile_status(shader)
    };

    if compiled {
        Ok(shader)
    } else {
        // SAFETY: the failed shader is deleted once and never returned.
        let info_log = unsafe { gl.get_shader_info_log(shader) };
        unsafe { gl.delete_shader(shader) };
        Err(ShaderError::Compile {
            stage: stage.to_string(),
            log: format_shader_error(source, &info_log),
        })
    }
}

/// Links a vertex and fragment shader into a program.
///
/// # Errors
///
/// Returns `ShaderError::Link` with the driver's info log.
#[allow(unsafe_code)]
pub fn link_program(
    gl: &glow::Context,
    vertex: glow::Shader,
    fragment: glow::Shader,
) -> Result<glow::Program, ShaderError> {
    use glow::HasContext;

    // SAFETY: both shader handles come from compile_shader. The program is
    // deleted if linking fails.
    let program = unsafe { gl.create_program() }.map_err(ShaderError::Link)?;

    // SAFETY: program and both shaders are live handles.
    let linked = unsafe {
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);
        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);
        gl.get_program_link_status(program)
    };

    if linked {
        Ok(program)
    } else {
        // SAFETY: the failed program is deleted once and never returned.
        let info_log = unsafe { gl.get_program_info_log(program) };
        unsafe { gl.delete_program(program) };
        Err(ShaderError::Link(info_log))
    }
}

/// Binds every sampler uniform in [`SAMPLER_UNITS`] that `program`
/// declares to its texture unit. Unused names are skipped.
#[allow(unsafe_code)]
pub fn assign_sampler_units(gl: &glow::Context, program: glow::Program) {
    use glow::HasContext;

    // SAFETY: `program` is a successfully linked program. The previous
    // program binding is not preserved; callers bind before drawing.
    unsafe {
        gl.use_program(Some(program));
        for &(name, unit) in SAMPLER_UNITS {
            if let Some(location) = gl.get_uniform_location(program, name) {
                gl.uniform_1_i32(Some(&location), unit as i32);
            }
        }
        gl.use_program(None);
    }
}

/// Compiles, links and assigns sampler units.
///
/// Shader handles are deleted after linking whether or not it succeeds.
#[allow(unsafe_code)]
pub fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, ShaderError> {
    use glow::HasContext;

    let vert = compile_shader(gl, glow::VERTEX_SHADER, vertex_src)?;
    let frag = match compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src) {
        Ok(f) => f,
        Err(e) => {
            // SAFETY: vert is a live shader from compile_shader.
            unsafe { gl.delete_shader(vert) };
            return Err(e);
        }
    };

    let result = link_program(gl, vert, frag);

    // SAFETY: the linked program keeps its own copies of both stages.
    unsafe {
        gl.delete_shader(vert);
        gl.delete_shader(frag);
    }

    let program = result?;
    assign_sampler_units(gl, program);
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_cover_both_stages() {
        assert_eq!(stage_name(glow::VERTEX_SHADER), "vertex");
        assert_eq!(stage_name(glow::FRAGMENT_SHADER), "fragment");
        assert_eq!(stage_name(glow::GEOMETRY_SHADER), "unknown");
    }

    #[test]
    #[ignore = "requires GL context"]
    fn compile_program_links_fullscreen_passthrough() {
        // Would test: FULLSCREEN_VERTEX_SHADER + PASSTHROUGH_FRAGMENT_SHADER
        // link, and colortex0 reads unit 0.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn compile_error_reports_fragment_stage() {
        // Would test: a syntax error yields ShaderError::Compile { stage: "fragment" }
        // with a numbered source listing.
    }
}
