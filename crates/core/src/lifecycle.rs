//! Owns the active pipeline and rebuilds it on scene change or reload.
//!
//! A [`PipelineController`] moves between three states: no pipeline
//! built yet, a pipeline active for one [`SceneKey`], and shut down. Every
//! transition away from an active pipeline tears it down completely before
//! anything new is allocated.

use crate::backend::{GpuBackend, HostOutput, ResourceScope};
use crate::error::PipelineError;
use crate::executor::render_composite;
use crate::graph::PassGraph;
use crate::pack::{PackSource, SceneKey, ShaderPack};
use crate::pool::RenderTargetPool;
use crate::units::UNITS_CLEARED_ON_TEARDOWN;

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Active(SceneKey),
    Destroyed,
}

/// A fully built pipeline: the pool and the graph over it.
pub struct ActivePipeline<B: GpuBackend> {
    key: SceneKey,
    pool: RenderTargetPool<B>,
    graph: PassGraph<B>,
}

impl<B: GpuBackend> ActivePipeline<B> {
    /// Allocates the pool and builds the graph for `key` as one unit.
    fn build(
        backend: &B,
        pack: &ShaderPack,
        key: SceneKey,
        width: u32,
        height: u32,
    ) -> Result<Self, PipelineError> {
        let scope = ResourceScope::new(backend);
        let mut pool = RenderTargetPool::allocate(&scope, width, height, &pack.directives)?;
        let graph = PassGraph::build(&scope, &mut pool, pack.program_set(key), &pack.directives)?;
        scope.commit();
        log::debug!(
            "built composite pipeline for '{}' ({key}): {} passes at {width}x{height}",
            pack.name,
            graph.len()
        );
        Ok(Self { key, pool, graph })
    }

    pub fn key(&self) -> SceneKey {
        self.key
    }

    pub fn pool(&self) -> &RenderTargetPool<B> {
        &self.pool
    }

    pub fn graph(&self) -> &PassGraph<B> {
        &self.graph
    }

    fn destroy(&mut self, backend: &B) {
        self.graph.destroy(backend);
        self.pool.destroy(backend);
    }
}

/// Single owner of the current shader pack and its built pipeline.
pub struct PipelineController<B: GpuBackend, S: PackSource> {
    source: S,
    pack: ShaderPack,
    active: Option<ActivePipeline<B>>,
    destroyed: bool,
}

impl<B: GpuBackend, S: PackSource> PipelineController<B, S> {
    /// Resolves the initial pack from `source`. Nothing is built until the
    /// first [`PipelineController::pipeline`] or
    /// [`PipelineController::render_frame`] call.
    pub fn new(mut source: S) -> Self {
        let pack = load_pack(&mut source);
        Self {
            source,
            pack,
            active: None,
            destroyed: false,
        }
    }

    pub fn state(&self) -> PipelineState {
        if self.destroyed {
            PipelineState::Destroyed
        } else {
            match &self.active {
                Some(active) => PipelineState::Active(active.key),
                None => PipelineState::Uninitialized,
            }
        }
    }

    /// The pack pipelines are currently built from.
    pub fn pack(&self) -> &ShaderPack {
        &self.pack
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The pipeline for `key`, building it first if none exists or the
    /// active one was built for a different key.
    ///
    /// # Errors
    ///
    /// Returns `Destroyed` after [`PipelineController::shutdown`]. A build
    /// error is returned only after the internal pack has failed too; no
    /// partial pipeline is kept.
    pub fn pipeline(
        &mut self,
        backend: &B,
        key: SceneKey,
        width: u32,
        height: u32,
    ) -> Result<&ActivePipeline<B>, PipelineError> {
        self.ensure_active(backend, key, width, height).map(|active| &*active)
    }

    /// Runs the composite passes for one frame into `host`.
    ///
    /// Resizes the pool in place when the host size differs from the size
    /// the pipeline was built at. A draw failure abandons the frame but
    /// keeps the pipeline.
    pub fn render_frame(
        &mut self,
        backend: &B,
        key: SceneKey,
        host: HostOutput<B>,
    ) -> Result<(), PipelineError> {
        let (width, height) = host.size();
        let active = self.ensure_active(backend, key, width, height)?;

        let (old_width, old_height) = active.pool.size();
        if (old_width, old_height) != (width, height) {
            log::info!(
                "render target size changed from {old_width}x{old_height} to {width}x{height}, \
                 resizing"
            );
            if let Err(err) = active.pool.resize(backend, width, height) {
                self.teardown(backend);
                return Err(err);
            }
        }

        render_composite(backend, &active.pool, &active.graph, host)
    }

    /// Tears the pipeline down, re-resolves the pack source and rebuilds.
    ///
    /// A source that fails to load is replaced by the internal pack.
    pub fn reload(
        &mut self,
        backend: &B,
        key: SceneKey,
        width: u32,
        height: u32,
    ) -> Result<&ActivePipeline<B>, PipelineError> {
        if self.destroyed {
            return Err(PipelineError::Destroyed);
        }
        log::info!("reloading shader pack '{}'", self.pack.name);
        self.teardown(backend);
        self.release_source();
        self.pack = load_pack(&mut self.source);
        self.pipeline(backend, key, width, height)
    }

    /// Releases every GPU resource of the active pipeline and clears all
    /// texture units. Safe to call at any time, including repeatedly.
    pub fn teardown(&mut self, backend: &B) {
        if let Some(mut active) = self.active.take() {
            active.destroy(backend);
        }
        for unit in 0..UNITS_CLEARED_ON_TEARDOWN {
            backend.bind_texture(unit, None);
        }
        backend.select_texture_unit(0);
    }

    /// Tears down and releases the pack source. Later calls that need a
    /// pipeline return [`PipelineError::Destroyed`].
    pub fn shutdown(&mut self, backend: &B) {
        if self.destroyed {
            return;
        }
        self.teardown(backend);
        self.release_source();
        self.destroyed = true;
    }

    fn ensure_active(
        &mut self,
        backend: &B,
        key: SceneKey,
        width: u32,
        height: u32,
    ) -> Result<&mut ActivePipeline<B>, PipelineError> {
        if self.destroyed {
            return Err(PipelineError::Destroyed);
        }

        match self.active.take() {
            Some(active) if active.key == key => Ok(self.active.insert(active)),
            previous => {
                if let Some(previous) = previous {
                    log::info!(
                        "scene changed from {} to {key}, rebuilding composite pipeline",
                        previous.key
                    );
                    self.active = Some(previous);
                    self.teardown(backend);
                }
                let built = self.build_with_fallback(backend, key, width, height)?;
                Ok(self.active.insert(built))
            }
        }
    }

    fn build_with_fallback(
        &mut self,
        backend: &B,
        key: SceneKey,
        width: u32,
        height: u32,
    ) -> Result<ActivePipeline<B>, PipelineError> {
        match ActivePipeline::build(backend, &self.pack, key, width, height) {
            Err(err) if err.is_build_fatal() && !self.pack.is_internal() => {
                log::error!(
                    "failed to build shader pack '{}': {err}; falling back to the internal pack",
                    self.pack.name
                );
                self.pack = self.source.load_internal();
                ActivePipeline::build(backend, &self.pack, key, width, height)
            }
            result => result,
        }
    }

    fn release_source(&mut self) {
        if let Err(err) = self.source.release() {
            log::error!("{err}");
        }
    }
}

fn load_pack<S: PackSource>(source: &mut S) -> ShaderPack {
    match source.load() {
        Ok(pack) => {
            log::info!("using shader pack '{}'", pack.name);
            pack
        }
        Err(err) => {
            log::error!("failed to load shader pack: {err}; using the internal pack");
            source.load_internal()
        }
    }
}
