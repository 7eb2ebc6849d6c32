//! In-memory [`GpuBackend`] that records every call, for tests.

use crate::backend::{BlitMask, GpuBackend};
use crate::error::PipelineError;
use crate::shader::ShaderError;
use crate::texture::TextureConfig;
use crate::units::{COLOR_TEX, DEPTH_TEX_0, DEPTH_TEX_1, DEPTH_TEX_2};
use std::cell::{Cell, Ref, RefCell};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TexId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FbId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferRecord {
    pub color: Vec<TexId>,
    pub depth: Option<TexId>,
}

/// Binding state observed at one full-screen draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: Option<ProgId>,
    pub framebuffer: Option<FbId>,
    pub viewport: Option<(u32, u32)>,
    /// Textures bound on `colortex0..7`, by slot.
    pub color_inputs: Vec<Option<TexId>>,
    /// Textures bound on `depthtex0..2`.
    pub depth_inputs: Vec<Option<TexId>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateTexture(TexId),
    ResizeTexture(TexId, u32, u32),
    DeleteTexture(TexId),
    CreateFramebuffer(FbId),
    DeleteFramebuffer(FbId),
    CompileProgram(ProgId),
    DeleteProgram(ProgId),
    BindFramebuffer(Option<FbId>),
    Draw(ProgId),
    Blit {
        src: Option<FbId>,
        dst: Option<FbId>,
        mask: BlitMask,
    },
}

#[derive(Debug, Default)]
pub struct MockState {
    pub live_textures: HashMap<TexId, TextureConfig>,
    pub live_framebuffers: HashMap<FbId, FramebufferRecord>,
    /// Live programs and the fragment source they were built from.
    pub live_programs: HashMap<ProgId, String>,
    pub bound_framebuffer: Option<FbId>,
    pub viewport: Option<(u32, u32)>,
    pub units: BTreeMap<u32, TexId>,
    pub active_unit: u32,
    pub program: Option<ProgId>,
    pub fullscreen_active: bool,
    pub draws: Vec<DrawRecord>,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: Cell<u32>,
    state: RefCell<MockState>,
    events: RefCell<Vec<Event>>,
    fail_compile: RefCell<Option<String>>,
    fail_draw_at: Cell<Option<usize>>,
    panic_draw_at: Cell<Option<usize>>,
    fail_texture_at: Cell<Option<usize>>,
    textures_created: Cell<usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, MockState> {
        self.state.borrow()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
        self.state.borrow_mut().draws.clear();
    }

    /// Makes `compile_program` fail for fragment sources containing `needle`.
    pub fn fail_compile_containing(&self, needle: &str) {
        *self.fail_compile.borrow_mut() = Some(needle.to_string());
    }

    pub fn clear_failures(&self) {
        *self.fail_compile.borrow_mut() = None;
        self.fail_draw_at.set(None);
        self.panic_draw_at.set(None);
        self.fail_texture_at.set(None);
    }

    /// Makes the `n`th draw (0-based, counted since the last clear) fail.
    pub fn fail_draw_at(&self, n: usize) {
        self.fail_draw_at.set(Some(n));
    }

    /// Makes the `n`th draw panic, as a driver callback might.
    pub fn panic_draw_at(&self, n: usize) {
        self.panic_draw_at.set(Some(n));
    }

    /// Makes the `n`th texture creation (0-based, over the backend's life) fail.
    pub fn fail_texture_at(&self, n: usize) {
        self.fail_texture_at.set(Some(n));
    }

    pub fn framebuffer(&self, fb: FbId) -> Option<FramebufferRecord> {
        self.state.borrow().live_framebuffers.get(&fb).cloned()
    }

    pub fn bound_texture(&self, unit: u32) -> Option<TexId> {
        self.state.borrow().units.get(&unit).copied()
    }

    fn next(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl GpuBackend for RecordingBackend {
    type Texture = TexId;
    type Framebuffer = FbId;
    type Program = ProgId;

    fn create_texture(
        &self,
        config: &TextureConfig,
        _data: Option<&[u8]>,
    ) -> Result<TexId, PipelineError> {
        let n = self.textures_created.get();
        self.textures_created.set(n + 1);
        if self.fail_texture_at.get() == Some(n) {
            return Err(PipelineError::Gpu("out of texture memory".into()));
        }
        let id = TexId(self.next());
        self.state.borrow_mut().live_textures.insert(id, *config);
        self.record(Event::CreateTexture(id));
        Ok(id)
    }

    fn resize_texture(&self, texture: TexId, config: &TextureConfig) -> Result<(), PipelineError> {
        let mut state = self.state.borrow_mut();
        let slot = state
            .live_textures
            .get_mut(&texture)
            .ok_or_else(|| PipelineError::Gpu(format!("resize of dead texture {texture:?}")))?;
        *slot = *config;
        drop(state);
        self.record(Event::ResizeTexture(texture, config.width, config.height));
        Ok(())
    }

    fn delete_texture(&self, texture: TexId) {
        let removed = self.state.borrow_mut().live_textures.remove(&texture);
        assert!(removed.is_some(), "double delete of {texture:?}");
        self.record(Event::DeleteTexture(texture));
    }

    fn create_framebuffer(
        &self,
        color: &[TexId],
        depth: Option<TexId>,
    ) -> Result<FbId, PipelineError> {
        let id = FbId(self.next());
        self.state.borrow_mut().live_framebuffers.insert(
            id,
            FramebufferRecord {
                color: color.to_vec(),
                depth,
            },
        );
        self.record(Event::CreateFramebuffer(id));
        Ok(id)
    }

    fn delete_framebuffer(&self, framebuffer: FbId) {
        let removed = self.state.borrow_mut().live_framebuffers.remove(&framebuffer);
        assert!(removed.is_some(), "double delete of {framebuffer:?}");
        self.record(Event::DeleteFramebuffer(framebuffer));
    }

    fn compile_program(&self, _vertex: &str, fragment: &str) -> Result<ProgId, ShaderError> {
        if let Some(needle) = self.fail_compile.borrow().as_deref() {
            if fragment.contains(needle) {
                return Err(ShaderError::Compile {
                    stage: "fragment".into(),
                    log: format!("rejected source containing '{needle}'"),
                });
            }
        }
        let id = ProgId(self.next());
        self.state
            .borrow_mut()
            .live_programs
            .insert(id, fragment.to_string());
        self.record(Event::CompileProgram(id));
        Ok(id)
    }

    fn delete_program(&self, program: ProgId) {
        let removed = self.state.borrow_mut().live_programs.remove(&program);
        assert!(removed.is_some(), "double delete of {program:?}");
        self.record(Event::DeleteProgram(program));
    }

    fn bind_framebuffer(&self, framebuffer: Option<FbId>) {
        self.state.borrow_mut().bound_framebuffer = framebuffer;
        self.record(Event::BindFramebuffer(framebuffer));
    }

    fn viewport(&self, width: u32, height: u32) {
        self.state.borrow_mut().viewport = Some((width, height));
    }

    fn bind_texture(&self, unit: u32, texture: Option<TexId>) {
        let mut state = self.state.borrow_mut();
        state.active_unit = unit;
        match texture {
            Some(t) => {
                state.units.insert(unit, t);
            }
            None => {
                state.units.remove(&unit);
            }
        }
    }

    fn select_texture_unit(&self, unit: u32) {
        self.state.borrow_mut().active_unit = unit;
    }

    fn use_program(&self, program: Option<ProgId>) {
        self.state.borrow_mut().program = program;
    }

    fn begin_fullscreen(&self) {
        self.state.borrow_mut().fullscreen_active = true;
    }

    fn draw_fullscreen(&self) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let index = state.draws.len();
        let record = DrawRecord {
            program: state.program,
            framebuffer: state.bound_framebuffer,
            viewport: state.viewport,
            color_inputs: COLOR_TEX
                .iter()
                .map(|unit| state.units.get(unit).copied())
                .collect(),
            depth_inputs: [DEPTH_TEX_0, DEPTH_TEX_1, DEPTH_TEX_2]
                .iter()
                .map(|unit| state.units.get(unit).copied())
                .collect(),
        };
        state.draws.push(record);
        let program = state.program;
        drop(state);

        if self.panic_draw_at.get() == Some(index) {
            panic!("draw {index} panicked");
        }
        if self.fail_draw_at.get() == Some(index) {
            return Err("GL_INVALID_OPERATION".into());
        }
        if let Some(p) = program {
            self.record(Event::Draw(p));
        }
        Ok(())
    }

    fn end_fullscreen(&self) {
        self.state.borrow_mut().fullscreen_active = false;
    }

    fn blit(
        &self,
        src: Option<FbId>,
        _src_size: (u32, u32),
        dst: Option<FbId>,
        _dst_size: (u32, u32),
        mask: BlitMask,
    ) {
        self.record(Event::Blit { src, dst, mask });
    }
}
