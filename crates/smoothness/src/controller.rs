//! Tick-driven scheduling of blur and compositing runs.
//!
//! The controller tracks two dirty tiers. Blurring is expensive and only
//! re-runs when a blur radius, the diffuse source or the source images
//! change; compositing is cheap and re-runs after any parameter edit and
//! after every blur. Runs execute on a worker thread while holding the
//! shared [`ProcessingLock`]; `tick` never waits for them and picks up the
//! result on a later call.
//!
//! A failed run leaves the controller in [`PipelineState::Failed`] without
//! retrying; the next parameter or image change schedules work again.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use image::{Rgba, Rgba32FImage};
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::{
    algorithms::sample_bilinear,
    commands::SmoothnessCommand,
    error::{Result, SmoothnessError},
    io::{MaterialSettings, ProjectSettings},
    lock::{ProcessingGuard, ProcessingLock},
    pipeline::Pipeline,
    traits::{ImageGenerations, ImageProvider, SettingsStore},
    types::{BlurBuffers, DiffuseSource, SampleSlot, SmoothnessMap, SmoothnessParameters},
};

/// Observable scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineState {
    /// Output reflects the current parameters and images
    Clean,
    /// The blur buffers are stale or being rebuilt; a composite follows
    BlurDirty,
    /// Only the composite is stale or being rebuilt
    CompositeDirty,
    /// The last run failed; the output may be stale or missing
    Failed,
}

/// Number of completed runs per stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub blur_runs: u64,
    pub composite_runs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Blur,
    Composite,
}

enum JobOutput {
    Blurred(BlurBuffers),
    Composited(SmoothnessMap),
}

struct InFlight {
    job: Job,
    started: Instant,
    handle: JoinHandle<Result<JobOutput>>,
    guard: ProcessingGuard,
    /// `SmoothnessController::changes` when the run started
    changes: u64,
}

/// Pause between attempts to take a lock held elsewhere
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Inputs that, when changed, invalidate the blur buffers
fn blur_key(params: &SmoothnessParameters) -> (u32, u32, DiffuseSource) {
    (params.blur_radius, params.overlay_blur_radius, params.diffuse_source)
}

/// Owns the parameters and derived buffers and decides which stage runs next
pub struct SmoothnessController<P: ImageProvider> {
    provider: P,
    pipeline: Pipeline,
    lock: ProcessingLock,
    params: SmoothnessParameters,
    material: MaterialSettings,
    blur_dirty: bool,
    composite_dirty: bool,
    failed: bool,
    /// Bumped on every invalidation
    changes: u64,
    seen_generations: Option<ImageGenerations>,
    buffers: Option<Arc<BlurBuffers>>,
    output: Option<Arc<SmoothnessMap>>,
    in_flight: Option<InFlight>,
    stats: RunStats,
}

impl<P: ImageProvider> SmoothnessController<P> {
    /// Controller with the default pipeline and its own processing lock
    pub fn new(provider: P) -> Self {
        Self::with_pipeline(provider, Pipeline::default(), ProcessingLock::new())
    }

    /// Controller sharing `lock` with other processing panels
    pub fn with_pipeline(provider: P, pipeline: Pipeline, lock: ProcessingLock) -> Self {
        Self {
            provider,
            pipeline,
            lock,
            params: SmoothnessParameters::default(),
            material: MaterialSettings::default(),
            blur_dirty: true,
            composite_dirty: true,
            failed: false,
            changes: 0,
            seen_generations: None,
            buffers: None,
            output: None,
            in_flight: None,
            stats: RunStats::default(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutable access to the images; changes are noticed on the next tick
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn parameters(&self) -> &SmoothnessParameters {
        &self.params
    }

    pub fn material(&self) -> &MaterialSettings {
        &self.material
    }

    pub fn set_material(&mut self, mut material: MaterialSettings) {
        material.clamp();
        self.material = material;
    }

    /// Latest completed smoothness map
    pub fn output(&self) -> Option<Arc<SmoothnessMap>> {
        self.output.clone()
    }

    /// Latest blur buffers
    pub fn blur_buffers(&self) -> Option<Arc<BlurBuffers>> {
        self.buffers.clone()
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn state(&self) -> PipelineState {
        let running = self.in_flight.as_ref().map(|in_flight| in_flight.job);
        if self.blur_dirty || running == Some(Job::Blur) {
            PipelineState::BlurDirty
        } else if self.composite_dirty || running == Some(Job::Composite) {
            PipelineState::CompositeDirty
        } else if self.failed {
            PipelineState::Failed
        } else {
            PipelineState::Clean
        }
    }

    /// Replace the parameters, invalidating only what the change requires
    pub fn set_parameters(&mut self, params: SmoothnessParameters) {
        let params = params.clamped();
        if params == self.params {
            return;
        }
        let blur_changed = blur_key(&params) != blur_key(&self.params);
        self.params = params;
        self.mark_dirty(blur_changed);
    }

    /// Apply one user edit
    pub fn apply(&mut self, command: SmoothnessCommand) -> Result<()> {
        debug!(command = %command, "applying command");
        match command {
            SmoothnessCommand::PickColor { slot, uv } => {
                self.pick_color(slot, uv)?;
            }
            other => {
                let mut params = self.params.clone();
                other.apply(&mut params);
                self.set_parameters(params);
            }
        }
        Ok(())
    }

    /// Sample the current diffuse at `uv` and make it the reference color of `slot`
    pub fn pick_color(&mut self, slot: SampleSlot, uv: [f32; 2]) -> Result<Rgba<f32>> {
        let diffuse = self.resolve_diffuse()?;
        let color = sample_bilinear(&diffuse, uv);

        let mut params = self.params.clone();
        let sample = params.sample_mut(slot);
        sample.uv = uv;
        sample.color = color.0;
        self.set_parameters(params);

        let sample = self.params.sample(slot);
        info!(%slot, uv = ?sample.uv, color = ?sample.color, "picked sample color");
        Ok(sample.reference())
    }

    /// Restore parameters from a settings store, defaulting when nothing is stored
    pub fn load_settings<S: SettingsStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let settings = store.load()?.unwrap_or_default();
        self.set_material(settings.material_or_default());
        self.set_parameters(settings.smoothness_or_default());
        Ok(())
    }

    /// Write the current parameters to a settings store
    pub fn save_settings<S: SettingsStore + ?Sized>(&self, store: &S) -> Result<()> {
        store.save(&ProjectSettings {
            smoothness: Some(self.params.clone()),
            material: Some(self.material.clone()),
        })
    }

    fn mark_dirty(&mut self, blur: bool) {
        // Compositing needs blur buffers, so a missing set means a blur first
        let blurring = self.in_flight.as_ref().is_some_and(|in_flight| in_flight.job == Job::Blur);
        if blur || (self.buffers.is_none() && !blurring) {
            self.blur_dirty = true;
        }
        self.composite_dirty = true;
        self.changes = self.changes.wrapping_add(1);
    }

    /// Dirty the tiers that read whichever images changed since the last tick
    fn observe_provider(&mut self) {
        let current = self.provider.generations();
        let Some(seen) = self.seen_generations.replace(current) else {
            self.mark_dirty(true);
            return;
        };
        if seen == current {
            return;
        }

        let source = self.params.diffuse_source;
        let diffuse_changed = seen.diffuse_for(source) != current.diffuse_for(source);
        let metallic_changed = seen.metallic != current.metallic;
        debug!(diffuse_changed, metallic_changed, "source images changed");
        if diffuse_changed || metallic_changed {
            self.mark_dirty(diffuse_changed);
        }
    }

    /// The diffuse selected by the parameters, falling back to the original
    fn resolve_diffuse(&mut self) -> Result<Arc<Rgba32FImage>> {
        if self.params.diffuse_source == DiffuseSource::Adjusted {
            if let Some(diffuse) = self.provider.diffuse() {
                return Ok(diffuse);
            }
            warn!("no edited diffuse available, using the original diffuse");
            self.params.diffuse_source = DiffuseSource::Original;
        }
        self.provider
            .diffuse_original()
            .ok_or(SmoothnessError::NoImageLoaded)
    }

    /// Advance the pipeline without blocking
    pub fn tick(&mut self) -> Result<PipelineState> {
        self.poll(false)
    }

    /// Tick until the output reflects the current parameters, waiting on runs.
    ///
    /// Waits for as long as another holder keeps the processing lock; use
    /// [`Self::run_to_completion_within`] to bound that wait.
    pub fn run_to_completion(&mut self) -> Result<()> {
        self.drive(None)
    }

    /// Like [`Self::run_to_completion`], giving up with
    /// [`SmoothnessError::LockTimeout`] when the lock stays busy for `lock_timeout`
    pub fn run_to_completion_within(&mut self, lock_timeout: Duration) -> Result<()> {
        self.drive(Some(lock_timeout))
    }

    fn drive(&mut self, lock_timeout: Option<Duration>) -> Result<()> {
        let mut waiting_since: Option<Instant> = None;
        loop {
            match self.poll(true)? {
                PipelineState::Clean => return Ok(()),
                PipelineState::Failed => return Err(SmoothnessError::RunFailed),
                _ => {}
            }
            if self.in_flight.is_some() {
                waiting_since = None;
                continue;
            }

            // Lock held elsewhere
            let since = *waiting_since.get_or_insert_with(Instant::now);
            if let Some(timeout) = lock_timeout {
                if since.elapsed() >= timeout {
                    warn!(?timeout, "gave up waiting for the processing lock");
                    return Err(SmoothnessError::LockTimeout(timeout));
                }
            }
            thread::sleep(LOCK_RETRY_INTERVAL);
        }
    }

    fn poll(&mut self, block: bool) -> Result<PipelineState> {
        self.observe_provider();

        if let Some(in_flight) = self.in_flight.take() {
            if !block && !in_flight.handle.is_finished() {
                self.in_flight = Some(in_flight);
                return Ok(self.state());
            }
            self.finish(in_flight)?;
        } else {
            self.start_next(None)?;
        }

        Ok(self.state())
    }

    fn finish(&mut self, in_flight: InFlight) -> Result<()> {
        let InFlight {
            job,
            started,
            handle,
            guard,
            changes,
        } = in_flight;

        let output = match handle.join() {
            Ok(result) => result,
            Err(_) => Err(SmoothnessError::WorkerPanicked),
        };

        match output {
            Ok(JobOutput::Blurred(buffers)) => {
                self.stats.blur_runs += 1;
                info!(elapsed = ?started.elapsed(), "blur finished");
                self.buffers = Some(Arc::new(buffers));
                self.composite_dirty = true;
                // Keep the lock through the composite that must follow
                self.start_next(Some(guard))
            }
            Ok(JobOutput::Composited(map)) => {
                self.stats.composite_runs += 1;
                self.failed = false;
                info!(elapsed = ?started.elapsed(), "smoothness composite finished");
                self.output = Some(Arc::new(map));
                Ok(())
            }
            Err(err) => {
                warn!(?job, error = %err, "processing run failed");
                if job == Job::Blur {
                    self.buffers = None;
                }
                self.failed = true;
                if self.changes == changes {
                    // Retried only once something changes
                    self.blur_dirty = false;
                    self.composite_dirty = false;
                } else if self.buffers.is_none() {
                    self.blur_dirty = true;
                }
                Err(err)
            }
        }
    }

    fn start_next(&mut self, guard: Option<ProcessingGuard>) -> Result<()> {
        if !self.blur_dirty && !self.composite_dirty {
            return Ok(());
        }

        let guard = match guard.or_else(|| self.lock.try_acquire()) {
            Some(guard) => guard,
            None => {
                debug!("processing lock busy, retrying on a later tick");
                return Ok(());
            }
        };

        let diffuse = self.resolve_diffuse()?;
        let params = self.params.clone();
        let pipeline = self.pipeline.clone();

        let stale_size = self
            .buffers
            .as_ref()
            .is_none_or(|buffers| buffers.dimensions() != diffuse.dimensions());
        if stale_size && self.buffers.is_some() {
            debug!(dimensions = ?diffuse.dimensions(), "image size changed, reallocating blur buffers");
            self.buffers = None;
        }

        let (job, handle) = if self.blur_dirty || stale_size {
            self.blur_dirty = false;
            self.composite_dirty = true;
            info!(
                blur_radius = params.blur_radius,
                overlay_blur_radius = params.overlay_blur_radius,
                "starting blur"
            );
            let handle = spawn_worker(move || {
                pipeline
                    .blur_buffers(&diffuse, &params)
                    .map(JobOutput::Blurred)
            })?;
            (Job::Blur, handle)
        } else {
            self.composite_dirty = false;
            let metallic = self.provider.metallic_or_default();
            let buffers = self.buffers.clone().ok_or(SmoothnessError::NoImageLoaded)?;
            debug!("starting smoothness composite");
            let handle = spawn_worker(move || {
                pipeline
                    .composite(&diffuse, &metallic, &buffers, &params)
                    .map(JobOutput::Composited)
            })?;
            (Job::Composite, handle)
        };

        self.in_flight = Some(InFlight {
            job,
            started: Instant::now(),
            handle,
            guard,
            changes: self.changes,
        });
        Ok(())
    }
}

fn spawn_worker<F>(work: F) -> Result<JoinHandle<Result<JobOutput>>>
where
    F: FnOnce() -> Result<JobOutput> + Send + 'static,
{
    Ok(thread::Builder::new()
        .name("smoothness-worker".to_string())
        .spawn(work)?)
}

impl<P: ImageProvider> Drop for SmoothnessController<P> {
    fn drop(&mut self) {
        // Runs are never cancelled; let the last one finish before the lock is released
        if let Some(in_flight) = self.in_flight.take() {
            let _ = in_flight.handle.join();
        }
    }
}
