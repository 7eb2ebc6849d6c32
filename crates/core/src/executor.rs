//! Per-frame execution of a built pass graph.
//!
//! [`render_composite`] runs once per frame, after scene rendering and
//! before any overlay. It binds the static inputs, draws every pass in
//! order and either presents the baseline (empty graph) or copies scene
//! depth into the host output. The binding state the host relies on is
//! restored by [`FrameRestore`] on every exit path.

use crate::backend::{BlitMask, GpuBackend, HostOutput};
use crate::error::PipelineError;
use crate::graph::PassGraph;
use crate::ping_pong::TargetIndex;
use crate::pool::RenderTargetPool;
use crate::units;

/// Restores host-visible binding state when dropped.
///
/// Leaves the host framebuffer bound with a full viewport, no program
/// active, the default color and depth units unbound and the full-screen
/// geometry released.
pub struct FrameRestore<'a, B: GpuBackend> {
    backend: &'a B,
    host: HostOutput<B>,
}

impl<'a, B: GpuBackend> FrameRestore<'a, B> {
    pub fn new(backend: &'a B, host: HostOutput<B>) -> Self {
        Self { backend, host }
    }
}

impl<B: GpuBackend> Drop for FrameRestore<'_, B> {
    fn drop(&mut self) {
        self.backend.end_fullscreen();
        self.host.begin_write(self.backend, true);
        self.backend.use_program(None);
        self.backend.bind_texture(units::DEFAULT_DEPTH, None);
        self.backend.bind_texture(units::DEFAULT_COLOR, None);
    }
}

/// Binds the depth and noise textures, which do not change between passes.
fn bind_static_inputs<B: GpuBackend>(backend: &B, pool: &RenderTargetPool<B>) {
    backend.bind_texture(units::DEPTH_TEX_0, Some(pool.depth_texture()));
    backend.bind_texture(units::DEPTH_TEX_1, Some(pool.depth_texture_no_translucents()));
    // The hand is drawn after composite, so depthtex2 is depthtex1 for now.
    backend.bind_texture(units::DEPTH_TEX_2, Some(pool.depth_texture_no_translucents()));
    backend.bind_texture(units::NOISE_TEX, Some(pool.noise_texture()));
}

/// Runs every pass of `graph` into `host`.
///
/// # Errors
///
/// Returns `PipelineError::Draw` if a pass fails to draw. The remaining
/// passes are skipped and the binding state is still restored; the graph
/// stays usable for the next frame.
pub fn render_composite<B: GpuBackend>(
    backend: &B,
    pool: &RenderTargetPool<B>,
    graph: &PassGraph<B>,
    host: HostOutput<B>,
) -> Result<(), PipelineError> {
    let _restore = FrameRestore::new(backend, host);
    let (base_width, base_height) = host.size();

    bind_static_inputs(backend, pool);
    backend.begin_fullscreen();

    for pass in graph.passes() {
        if pass.is_last_pass() {
            host.begin_write(backend, false);
        } else {
            backend.bind_framebuffer(Some(pass.framebuffer()));
        }

        let reads = pass.stage_reads_from_alt();
        for slot in TargetIndex::all() {
            let texture = pool.get(slot).texture(reads.is_alt(slot));
            backend.bind_texture(units::color_unit(slot), Some(texture));
        }

        let (width, height) = pass.viewport_size(base_width, base_height);
        backend.viewport(width, height);

        backend.use_program(Some(pass.program()));
        backend
            .draw_fullscreen()
            .map_err(|message| PipelineError::Draw {
                pass: pass.name().to_string(),
                message,
            })?;
    }

    backend.end_fullscreen();

    let mask = if graph.is_empty() {
        // Nothing wrote the host output: present colortex0 as-is.
        BlitMask::ColorAndDepth
    } else {
        BlitMask::Depth
    };
    backend.blit(
        Some(graph.baseline()),
        pool.size(),
        host.framebuffer,
        host.size(),
        mask,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ResourceScope;
    use crate::pack::{PackDirectives, ProgramDirectives, ProgramSet, ProgramSource};
    use crate::testing::{Event, FbId, RecordingBackend};
    use proptest::prelude::*;

    fn slot(i: usize) -> TargetIndex {
        TargetIndex::new(i).unwrap()
    }

    fn program(name: &str, draw_buffers: &[usize], scale: f32) -> ProgramSource {
        ProgramSource::new(
            name,
            "vertex",
            format!("fragment {name}"),
            ProgramDirectives {
                draw_buffers: draw_buffers.to_vec(),
                viewport_scale: scale,
            },
        )
    }

    struct Fixture {
        pool: RenderTargetPool<RecordingBackend>,
        graph: PassGraph<RecordingBackend>,
    }

    fn fixture(backend: &RecordingBackend, programs: Vec<ProgramSource>) -> Fixture {
        let set = ProgramSet {
            composite: programs.into_iter().map(Some).collect(),
            final_pass: None,
        };
        let directives = PackDirectives::default();
        let scope = ResourceScope::new(backend);
        let mut pool = RenderTargetPool::allocate(&scope, 800, 600, &directives).unwrap();
        let graph = PassGraph::build(&scope, &mut pool, &set, &directives).unwrap();
        scope.commit();
        backend.clear_events();
        Fixture { pool, graph }
    }

    fn host(fb: Option<FbId>) -> HostOutput<RecordingBackend> {
        HostOutput::new(fb, 800, 600)
    }

    fn blits(backend: &RecordingBackend) -> Vec<Event> {
        backend
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Blit { .. }))
            .collect()
    }

    fn assert_restored(backend: &RecordingBackend, host_fb: Option<FbId>) {
        let state = backend.state();
        assert_eq!(state.bound_framebuffer, host_fb);
        assert_eq!(state.viewport, Some((800, 600)));
        assert_eq!(state.program, None);
        assert!(!state.units.contains_key(&units::DEFAULT_COLOR));
        assert!(!state.units.contains_key(&units::DEFAULT_DEPTH));
        assert!(!state.fullscreen_active);
    }

    #[test]
    fn empty_graph_copies_color_and_depth_from_baseline() {
        let backend = RecordingBackend::new();
        let fx = fixture(&backend, vec![]);
        render_composite(&backend, &fx.pool, &fx.graph, host(None)).unwrap();

        assert!(backend.state().draws.is_empty());
        assert_eq!(
            blits(&backend),
            vec![Event::Blit {
                src: Some(fx.graph.baseline()),
                dst: None,
                mask: BlitMask::ColorAndDepth,
            }]
        );
        assert_restored(&backend, None);
    }

    #[test]
    fn single_pass_draws_into_host_and_copies_only_depth() {
        let backend = RecordingBackend::new();
        let fx = fixture(&backend, vec![program("final", &[0], 1.0)]);
        let host_fb = Some(FbId(999));
        render_composite(&backend, &fx.pool, &fx.graph, host(host_fb)).unwrap();

        let draws = backend.state().draws.clone();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].framebuffer, host_fb, "last pass must target the host");
        assert_eq!(draws[0].viewport, Some((800, 600)));
        for s in TargetIndex::all() {
            assert_eq!(draws[0].color_inputs[s.get()], Some(fx.pool.get(s).main_texture()));
        }
        assert_eq!(
            blits(&backend),
            vec![Event::Blit {
                src: Some(fx.graph.baseline()),
                dst: host_fb,
                mask: BlitMask::Depth,
            }]
        );
        assert_restored(&backend, host_fb);
    }

    #[test]
    fn intermediate_pass_binds_its_own_framebuffer_and_scaled_viewport() {
        let backend = RecordingBackend::new();
        let fx = fixture(
            &backend,
            vec![program("composite", &[0, 1], 0.5), program("final", &[0], 1.0)],
        );
        render_composite(&backend, &fx.pool, &fx.graph, host(None)).unwrap();

        let draws = backend.state().draws.clone();
        assert_eq!(draws[0].framebuffer, Some(fx.graph.passes()[0].framebuffer()));
        assert_eq!(draws[0].viewport, Some((400, 300)));
        assert_eq!(draws[1].framebuffer, None);
        assert_eq!(draws[1].color_inputs[0], Some(fx.pool.get(slot(0)).alt_texture()));
        assert_eq!(draws[1].color_inputs[1], Some(fx.pool.get(slot(1)).alt_texture()));
        assert_eq!(draws[1].color_inputs[2], Some(fx.pool.get(slot(2)).main_texture()));
    }

    #[test]
    fn static_inputs_are_bound_for_every_pass() {
        let backend = RecordingBackend::new();
        let fx = fixture(&backend, vec![program("composite", &[0], 1.0)]);
        render_composite(&backend, &fx.pool, &fx.graph, host(None)).unwrap();
        assert_eq!(
            backend.bound_texture(units::DEPTH_TEX_1),
            Some(fx.pool.depth_texture_no_translucents())
        );
        assert_eq!(
            backend.bound_texture(units::DEPTH_TEX_2),
            Some(fx.pool.depth_texture_no_translucents())
        );
        assert_eq!(backend.bound_texture(units::NOISE_TEX), Some(fx.pool.noise_texture()));
        // DEPTH_TEX_0 is the default depth unit and is cleared on exit.
        assert_eq!(backend.bound_texture(units::DEPTH_TEX_0), None);
    }

    #[test]
    fn draw_failure_abandons_remaining_passes_and_restores_state() {
        let backend = RecordingBackend::new();
        let fx = fixture(
            &backend,
            vec![
                program("composite", &[0], 1.0),
                program("composite1", &[1], 1.0),
                program("final", &[0], 1.0),
            ],
        );
        backend.fail_draw_at(1);
        let err = render_composite(&backend, &fx.pool, &fx.graph, host(None)).unwrap_err();

        assert!(err.is_frame_fatal());
        assert!(matches!(err, PipelineError::Draw { ref pass, .. } if pass == "composite1"));
        assert_eq!(backend.state().draws.len(), 2, "third pass must not run");
        assert!(blits(&backend).is_empty());
        assert_restored(&backend, None);

        // The graph is still valid for the next frame.
        backend.clear_failures();
        backend.clear_events();
        render_composite(&backend, &fx.pool, &fx.graph, host(None)).unwrap();
        assert_eq!(backend.state().draws.len(), 3);
    }

    #[test]
    fn pass_framebuffers_leave_sampled_depth_unattached() {
        let backend = RecordingBackend::new();
        let fx = fixture(
            &backend,
            vec![program("composite", &[0, 1], 1.0), program("final", &[0], 1.0)],
        );
        render_composite(&backend, &fx.pool, &fx.graph, host(None)).unwrap();

        let draws = backend.state().draws.clone();
        assert_eq!(draws[0].depth_inputs[0], Some(fx.pool.depth_texture()));
        let pass_fb = backend.framebuffer(fx.graph.passes()[0].framebuffer()).unwrap();
        assert_eq!(pass_fb.depth, None);
        // Only the baseline carries depth, for the copy into the host.
        let baseline = backend.framebuffer(fx.graph.baseline()).unwrap();
        assert_eq!(baseline.depth, Some(fx.pool.depth_texture()));
    }

    #[test]
    fn panicking_draw_still_restores_state() {
        let backend = RecordingBackend::new();
        let fx = fixture(
            &backend,
            vec![program("composite", &[0], 0.5), program("final", &[0], 1.0)],
        );
        backend.panic_draw_at(0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            render_composite(&backend, &fx.pool, &fx.graph, host(None))
        }));

        assert!(result.is_err());
        assert_eq!(backend.state().draws.len(), 1);
        assert!(blits(&backend).is_empty());
        assert_restored(&backend, None);
    }

    proptest! {
        #[test]
        fn no_draw_samples_a_texture_it_renders_into(
            seq in proptest::collection::vec(
                proptest::sample::subsequence((0..8usize).collect::<Vec<_>>(), 1..=4),
                1..8,
            )
        ) {
            let backend = RecordingBackend::new();
            let programs: Vec<ProgramSource> = seq
                .iter()
                .enumerate()
                .map(|(i, b)| program(&format!("composite{i}"), b, 1.0))
                .collect();
            let fx = fixture(&backend, programs);
            render_composite(&backend, &fx.pool, &fx.graph, host(None)).unwrap();

            for draw in backend.state().draws.iter() {
                let Some(fb) = draw.framebuffer else { continue };
                let record = backend.framebuffer(fb).unwrap();
                for input in draw.color_inputs.iter().flatten() {
                    prop_assert!(
                        !record.color.contains(input),
                        "pass samples {:?} while writing it",
                        input
                    );
                }
                prop_assert_eq!(record.depth, None);
                for input in draw.depth_inputs.iter().flatten() {
                    prop_assert!(record.depth != Some(*input));
                }
            }
        }
    }
}
