use log::{debug, error, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::ctx::{ModuleCtx, ModuleParams};
use crate::error::{ModuleError, ModuleResult};
use crate::frame::Frame;
use crate::module::Module;
use crate::phase::LifecyclePhase;

#[derive(Default)]
struct Shared {
    phase: LifecyclePhase,
    /// Bumped on every load so a stale load task cannot touch a newer cycle.
    generation: u64,
    failure: Option<ModuleError>,
}

/// Drives one module through its lifecycle.
///
/// `load` and `unload` are called from the host thread and never
/// concurrently with each other; `load_async` runs on the runtime.
pub struct ModuleHost {
    module: Arc<dyn Module>,
    params: ModuleParams,
    runtime: Handle,

    shared: Arc<Mutex<Shared>>,
    ctx: Option<Arc<ModuleCtx>>,
    load_task: Option<JoinHandle<()>>,

    frame_index: u64,
    total: Duration,
}

impl ModuleHost {
    pub fn new(module: Arc<dyn Module>, params: ModuleParams, runtime: Handle) -> Self {
        Self {
            module,
            params,
            runtime,
            shared: Arc::new(Mutex::new(Shared::default())),
            ctx: None,
            load_task: None,
            frame_index: 0,
            total: Duration::ZERO,
        }
    }

    #[inline]
    pub fn id(&self) -> &'static str {
        self.module.id()
    }

    #[inline]
    pub fn phase(&self) -> LifecyclePhase {
        self.shared.lock().phase
    }

    #[inline]
    pub fn params(&self) -> &ModuleParams {
        &self.params
    }

    /// Context of the current load cycle.
    #[inline]
    pub fn context(&self) -> Option<&Arc<ModuleCtx>> {
        self.ctx.as_ref()
    }

    /// Define settings and start `load_async` on the runtime.
    pub fn load(&mut self) -> ModuleResult<()> {
        let id = self.module.id();
        let generation = {
            let mut s = self.shared.lock();
            if s.phase != LifecyclePhase::Unloaded {
                return Err(ModuleError::InvalidState {
                    module: id,
                    op: "load",
                    phase: s.phase,
                });
            }
            s.phase = LifecyclePhase::Loading;
            s.generation += 1;
            s.failure = None;
            s.generation
        };

        if let Err(e) = self.module.define_settings(&self.params.settings) {
            self.shared.lock().phase = LifecyclePhase::Unloaded;
            return Err(e);
        }

        let ctx = Arc::new(ModuleCtx::new(id, self.params.clone(), self.runtime.clone()));
        self.ctx = Some(ctx.clone());
        self.frame_index = 0;
        self.total = Duration::ZERO;

        info!(target: "host", "module.load id='{}' generation={}", id, generation);

        let module = self.module.clone();
        let shared = self.shared.clone();
        self.load_task = Some(self.runtime.spawn(async move {
            let result = module.load_async(ctx).await;

            let mut s = shared.lock();
            if s.generation != generation {
                debug!(target: "host", "module.load stale id='{}' generation={}", id, generation);
                return;
            }
            match result {
                Ok(()) if s.phase == LifecyclePhase::Loading => {
                    s.phase = LifecyclePhase::Loaded;
                    info!(target: "host", "module.loaded id='{}'", id);
                }
                Ok(()) => {
                    debug!(
                        target: "host",
                        "module.load finished after unload id='{}' phase={:?}",
                        id,
                        s.phase
                    );
                }
                Err(e) => {
                    error!(target: "host", "module.load failed id='{}' error='{}'", id, e);
                    if s.phase == LifecyclePhase::Loading {
                        s.failure = Some(ModuleError::LoadFailed {
                            module: id,
                            source: Box::new(e),
                        });
                    }
                }
            }
        }));

        Ok(())
    }

    /// Wait for the running load sequence.
    ///
    /// Returns the phase afterwards, or the fatal load error.
    pub async fn wait_loaded(&mut self) -> ModuleResult<LifecyclePhase> {
        if let Some(task) = self.load_task.take() {
            if let Err(e) = task.await {
                let id = self.module.id();
                error!(target: "host", "module.load task aborted id='{}' error='{}'", id, e);
                return Err(ModuleError::LoadFailed {
                    module: id,
                    source: Box::new(ModuleError::Other(e.to_string())),
                });
            }
        }

        let mut s = self.shared.lock();
        match s.failure.take() {
            Some(e) => Err(e),
            None => Ok(s.phase),
        }
    }

    /// Tick the module. A no-op unless it is `Loaded`.
    ///
    /// A fatal load error is returned here once.
    pub fn update(&mut self, dt: Duration) -> ModuleResult<()> {
        let phase = {
            let mut s = self.shared.lock();
            if let Some(e) = s.failure.take() {
                return Err(e);
            }
            s.phase
        };
        if phase != LifecyclePhase::Loaded {
            return Ok(());
        }
        let Some(ctx) = self.ctx.as_ref() else {
            return Ok(());
        };

        let frame = Frame {
            frame_index: self.frame_index,
            dt,
            total: self.total,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        self.total = self.total.saturating_add(dt);

        self.module.update(ctx, &frame)
    }

    /// Tear the module down. Safe in any phase; a still-running load is
    /// left to finish on its own.
    pub fn unload(&mut self) {
        let id = self.module.id();
        {
            let mut s = self.shared.lock();
            if !s.phase.can_unload() {
                debug!(target: "host", "module.unload skipped id='{}' phase={:?}", id, s.phase);
                return;
            }
            s.phase = LifecyclePhase::Unloading;
        }
        info!(target: "host", "module.unload id='{}'", id);

        if let Some(ctx) = self.ctx.take() {
            ctx.liveness().retire();
            self.module.unload(&ctx);
        }
        self.load_task = None;

        self.shared.lock().phase = LifecyclePhase::Unloaded;
        info!(target: "host", "module.unloaded id='{}'", id);
    }
}

impl Drop for ModuleHost {
    fn drop(&mut self) {
        self.unload();
    }
}
