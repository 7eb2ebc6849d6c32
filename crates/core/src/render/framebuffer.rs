//! Framebuffer assembly and blits for the glow backend.

use crate::backend::BlitMask;
use crate::error::PipelineError;

/// Color attachment point for draw buffer position `index`.
pub fn color_attachment(index: usize) -> u32 {
    glow::COLOR_ATTACHMENT0 + index as u32
}

/// GL buffer bits selected by `mask`.
pub fn blit_bits(mask: BlitMask) -> u32 {
    let mut bits = 0;
    if mask.includes_color() {
        bits |= glow::COLOR_BUFFER_BIT;
    }
    if mask.includes_depth() {
        bits |= glow::DEPTH_BUFFER_BIT;
    }
    bits
}

/// Creates a framebuffer with `color[i]` on `COLOR_ATTACHMENTi`, routes
/// fragment output `i` to it, attaches `depth` and verifies completeness.
///
/// # Errors
///
/// Returns `PipelineError::Gpu` if the framebuffer cannot be created or is
/// incomplete. An incomplete framebuffer is deleted before returning.
#[allow(unsafe_code)]
pub fn create_framebuffer(
    gl: &glow::Context,
    color: &[glow::Texture],
    depth: Option<glow::Texture>,
) -> Result<glow::Framebuffer, PipelineError> {
    use glow::HasContext;

    // SAFETY: glow wraps raw GL calls as unsafe. Every attached texture is
    // a live handle owned by the render target pool.
    let fbo = unsafe { gl.create_framebuffer() }.map_err(PipelineError::Gpu)?;

    let draw_buffers: Vec<u32> = if color.is_empty() {
        vec![glow::NONE]
    } else {
        (0..color.len()).map(color_attachment).collect()
    };

    // SAFETY: fbo was just created and each attachment is a live texture.
    let status = unsafe {
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
        for (i, &texture) in color.iter().enumerate() {
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                color_attachment(i),
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
        }
        if let Some(depth) = depth {
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::TEXTURE_2D,
                Some(depth),
                0,
            );
        }
        gl.draw_buffers(&draw_buffers);

        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        status
    };

    if status != glow::FRAMEBUFFER_COMPLETE {
        // SAFETY: fbo is unused and never handed out.
        unsafe { gl.delete_framebuffer(fbo) };
        return Err(PipelineError::Gpu(format!(
            "framebuffer incomplete: status 0x{status:04X}"
        )));
    }

    Ok(fbo)
}

/// Copies the buffers in `mask` from `src` to `dst` with NEAREST filtering,
/// which depth copies require.
#[allow(unsafe_code)]
pub fn blit(
    gl: &glow::Context,
    src: Option<glow::Framebuffer>,
    (src_width, src_height): (u32, u32),
    dst: Option<glow::Framebuffer>,
    (dst_width, dst_height): (u32, u32),
    mask: BlitMask,
) {
    use glow::HasContext;

    // SAFETY: both framebuffers are live or the default framebuffer.
    unsafe {
        gl.bind_framebuffer(glow::READ_FRAMEBUFFER, src);
        gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, dst);
        gl.blit_framebuffer(
            0,
            0,
            src_width as i32,
            src_height as i32,
            0,
            0,
            dst_width as i32,
            dst_height as i32,
            blit_bits(mask),
            glow::NEAREST,
        );
    }
}
