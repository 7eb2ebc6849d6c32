//! Fullscreen triangle shader for composite passes.
//!
//! A single oversized triangle covers the viewport without the diagonal seam
//! of a two-triangle quad. Positions and UVs come from `gl_VertexID`, so no
//! vertex buffer is needed: draw three vertices with an empty VAO bound.

/// GLSL 3.30 vertex shader for the fullscreen triangle.
///
/// Writes `texcoord` in [0, 1] over the visible area.
pub const FULLSCREEN_VERTEX_SHADER: &str = r#"#version 330 core
out vec2 texcoord;
void main() {
    texcoord = vec2((gl_VertexID << 1) & 2, gl_VertexID & 2);
    gl_Position = vec4(texcoord * 2.0 - 1.0, 0.0, 1.0);
}
"#;

/// Fragment shader of the internal pack's final pass: presents colortex0.
pub const PASSTHROUGH_FRAGMENT_SHADER: &str = r#"#version 330 core
uniform sampler2D colortex0;
in vec2 texcoord;
out vec4 fragColor;
void main() {
    fragColor = texture(colortex0, texcoord);
}
"#;

/// Vertex count of one fullscreen draw.
pub const FULLSCREEN_VERTEX_COUNT: i32 = 3;
