//! View-mode state machine: 2D/3D transitions, basemap swaps and the
//! entry points the page calls.
//!
//! Everything runs on one thread. Waiting happens in two places only: on a
//! basemap's [`StyleGate`](runtime::StyleGate) (style not loaded yet) and on
//! the timer queue (debounce, settle delay, compass polling). The host drives
//! both by calling [`ViewState::on_style_ready`] and [`ViewState::tick`].

use foundation::{BasemapId, CameraState, Millis};
use layers::LodLevel;
use poi::{PoiCollection, PoiRecord};
use prefs::PrefsStore;
use runtime::{Continuation, EventBus, Stamped, TimerQueue};

use crate::backend::{MapBackend, PROFILE_2D, PROFILE_3D, apply_profile};
use crate::compass::{Compass, north_up};
use crate::config::ViewConfig;
use crate::error::{BackendError, ViewError};
use crate::extrusions::{add_extrusions, remove_extrusions};
use crate::lod::{ApplyReport, LodEngine};
use crate::navigation::{ArrowKey, Modifiers, Navigation, NavigationSettings};
use crate::registry::{BasemapHandle, BasemapRegistry, DEFAULT_BASEMAP};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewMode {
    TwoD,
    ThreeD,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Disabled,
    /// 3D requested; waiting for the first extrusion injection.
    Enabling,
    Enabled,
    Disabling,
}

impl Phase {
    pub fn mode(self) -> ViewMode {
        match self {
            Phase::Enabling | Phase::Enabled => ViewMode::ThreeD,
            Phase::Disabled | Phase::Disabling => ViewMode::TwoD,
        }
    }
}

/// Notifications for the page. Drained by the host after each call.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    ModeChanged(ViewMode),
    /// User-facing message.
    Alert(String),
    /// The 3D toggle must be put back to `enabled`.
    ToggleReverted { enabled: bool },
    PoisChanged { markers_visible: bool, labels_visible: bool },
    CompassShown,
    CompassHidden,
    CompassRotated { arrow_deg: f64 },
    NavigationAttached,
    NavigationDetached,
    LodApplied { basemap: BasemapId, level: LodLevel, written: usize, failed: usize },
    LodDeferred { basemap: BasemapId, level: LodLevel },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Completed,
    /// Accepted; finishes when the backend's style is ready.
    Pending,
    /// Nothing to do in the current state.
    NoOp,
    Failed(ViewError),
}

impl TransitionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TransitionOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LodOutcome {
    Applied(ApplyReport),
    /// Parked until the active backend's style is ready.
    Deferred,
    NoBackend,
    Failed(ViewError),
}

/// Work parked on a basemap's style gate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Pending {
    /// `previous` is the basemap that was active before the enable.
    InjectExtrusions { epoch: u64, previous: Option<BasemapId> },
    CompleteSwap { epoch: u64, camera: Option<CameraState> },
    ApplyLod,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PendingKind {
    Extrusions,
    Swap,
    Lod,
}

impl Continuation for Pending {
    type Key = PendingKind;

    fn key(&self) -> PendingKind {
        match self {
            Pending::InjectExtrusions { .. } => PendingKind::Extrusions,
            Pending::CompleteSwap { .. } => PendingKind::Swap,
            Pending::ApplyLod => PendingKind::Lod,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TimerKey {
    ZoomSettle,
    BasemapSettle,
    CompassPoll,
}

fn unavailable(e: BackendError) -> ViewError {
    ViewError::unavailable(e.to_string())
}

pub struct ViewState {
    config: ViewConfig,
    registry: BasemapRegistry,
    /// Non-owning: the registry owns every handle.
    active: Option<BasemapId>,
    phase: Phase,
    /// Bumped by every enable/disable; parked 3D work from an older epoch is
    /// skipped.
    epoch: u64,
    lod: LodEngine,
    prefs: Box<dyn PrefsStore>,
    pois: PoiCollection,
    compass: Compass,
    navigation: Navigation,
    timers: TimerQueue<TimerKey, ()>,
    events: EventBus<ViewEvent>,
    now: Millis,
}

impl std::fmt::Debug for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewState")
            .field("phase", &self.phase)
            .field("active", &self.active)
            .field("epoch", &self.epoch)
            .field("lod", &self.lod.level())
            .field("registry", &self.registry)
            .finish()
    }
}

impl ViewState {
    /// The persisted detail level is read from `prefs` here.
    pub fn new(config: ViewConfig, registry: BasemapRegistry, prefs: Box<dyn PrefsStore>) -> Self {
        let lod = LodEngine::restore(prefs.as_ref(), &config.lod_storage_key, config.default_lod);
        let active = registry
            .id_of(DEFAULT_BASEMAP)
            .or_else(|| registry.iter().next().map(BasemapHandle::id));
        let navigation = Navigation::new(NavigationSettings {
            key_step_deg: config.key_step_deg,
            drag_bearing_deg_per_px: config.drag_bearing_deg_per_px,
            drag_pitch_deg_per_px: config.drag_pitch_deg_per_px,
        });
        let mut pois = PoiCollection::default();
        pois.set_labels_allowed_by_detail(lod.level() == LodLevel::High);
        Self {
            config,
            registry,
            active,
            phase: Phase::Disabled,
            epoch: 0,
            lod,
            prefs,
            pois,
            compass: Compass::default(),
            navigation,
            timers: TimerQueue::new(),
            events: EventBus::new(),
            now: Millis::ZERO,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn registry(&self) -> &BasemapRegistry {
        &self.registry
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> ViewMode {
        self.phase.mode()
    }

    pub fn active_basemap(&self) -> Option<&BasemapHandle> {
        self.active.and_then(|id| self.registry.get(id))
    }

    pub fn lod_level(&self) -> LodLevel {
        self.lod.level()
    }

    pub fn lod(&self) -> &LodEngine {
        &self.lod
    }

    pub fn pois(&self) -> &PoiCollection {
        &self.pois
    }

    pub fn compass(&self) -> &Compass {
        &self.compass
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// Earliest pending timer, for hosts that schedule their next tick.
    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn events(&self) -> &[Stamped<ViewEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Stamped<ViewEvent>> {
        self.events.drain()
    }

    fn emit(&mut self, event: ViewEvent) {
        self.events.emit(self.now, event);
    }

    // ---- backends -------------------------------------------------------

    pub fn attach_backend(&mut self, basemap: &str, backend: Box<dyn MapBackend>) -> Result<(), ViewError> {
        let id = self.lookup(basemap)?;
        self.registry.attach(id, backend);
        tracing::debug!(basemap, "backend attached");
        Ok(())
    }

    pub fn detach_backend(&mut self, basemap: &str) -> Result<Option<Box<dyn MapBackend>>, ViewError> {
        let id = self.lookup(basemap)?;
        Ok(self.registry.detach(id))
    }

    /// The backend started loading a different style document.
    pub fn on_style_loading(&mut self, basemap: &str) {
        if let Some(handle) = self.registry.id_of(basemap).and_then(|id| self.registry.get_mut(id)) {
            handle.begin_style_load();
        }
    }

    /// The backend reported style-ready / idle. Runs the parked continuations
    /// in registration order and returns how many ran.
    pub fn on_style_ready(&mut self, basemap: &str) -> usize {
        let Some(id) = self.registry.id_of(basemap) else {
            tracing::warn!(basemap, "style-ready for unknown basemap");
            return 0;
        };
        let continuations = match self.registry.get_mut(id) {
            Some(handle) => handle.gate.signal_ready(),
            None => return 0,
        };
        let count = continuations.len();
        for continuation in continuations {
            self.run_continuation(id, continuation);
        }
        count
    }

    fn lookup(&self, basemap: &str) -> Result<BasemapId, ViewError> {
        self.registry
            .id_of(basemap)
            .ok_or_else(|| ViewError::unavailable(format!("unknown basemap `{basemap}`")))
    }

    fn run_continuation(&mut self, id: BasemapId, continuation: Pending) {
        match continuation {
            Pending::InjectExtrusions { epoch, previous } => self.finish_enable(id, epoch, previous),
            Pending::CompleteSwap { epoch, camera } => self.complete_swap(id, epoch, camera),
            Pending::ApplyLod => {
                if self.active == Some(id) {
                    if let LodOutcome::Failed(e) = self.apply_lod_now(id) {
                        tracing::warn!(error = %e, "deferred detail level could not be applied");
                    }
                }
            }
        }
    }

    fn is_current(&self, id: BasemapId, epoch: u64) -> bool {
        epoch == self.epoch && self.phase.mode() == ViewMode::ThreeD && self.active == Some(id)
    }

    // ---- 3D transitions -------------------------------------------------

    /// Switch to the 3D view on `requested`, or on the active basemap.
    pub fn enable(&mut self, requested: Option<&str>) -> TransitionOutcome {
        if self.phase.mode() == ViewMode::ThreeD {
            tracing::debug!(phase = ?self.phase, "3D view already active");
            return TransitionOutcome::NoOp;
        }
        if self.config.usable_access_token().is_none() {
            return self.reject_enable(ViewError::Configuration);
        }
        let id = match self.resolve_for_3d(requested) {
            Ok(id) => id,
            Err(e) => return self.reject_enable(e),
        };

        self.epoch += 1;
        self.phase = Phase::Enabling;
        let previous = self.active.replace(id);
        tracing::info!(basemap = %id, "enabling 3D view");

        match self.enter_3d(id, previous) {
            Ok(injected) => {
                self.show_compass();
                if self.navigation.attach() {
                    self.emit(ViewEvent::NavigationAttached);
                }
                self.emit(ViewEvent::ModeChanged(ViewMode::ThreeD));
                if injected {
                    self.phase = Phase::Enabled;
                }
                self.reapply_lod();
                if injected {
                    TransitionOutcome::Completed
                } else {
                    TransitionOutcome::Pending
                }
            }
            Err(e) => {
                self.epoch += 1;
                self.teardown();
                self.phase = Phase::Disabled;
                self.active = previous;
                self.reject_enable(e)
            }
        }
    }

    fn reject_enable(&mut self, err: ViewError) -> TransitionOutcome {
        tracing::error!(error = %err, "could not enable 3D view");
        self.emit(ViewEvent::Alert(err.to_string()));
        self.emit(ViewEvent::ToggleReverted { enabled: false });
        TransitionOutcome::Failed(err)
    }

    fn resolve_for_3d(&self, requested: Option<&str>) -> Result<BasemapId, ViewError> {
        let id = match requested {
            Some(name) => self.lookup(name)?,
            None => self
                .active
                .ok_or_else(|| ViewError::unavailable("no active basemap"))?,
        };
        let handle = self
            .registry
            .get(id)
            .ok_or_else(|| ViewError::unavailable(format!("{id} is not registered")))?;
        if !handle.is_attached() {
            return Err(ViewError::unavailable(format!(
                "{} has no attached backend",
                handle.name()
            )));
        }
        if !handle.capabilities().extrusion {
            return Err(ViewError::unavailable(format!(
                "{} does not support 3D buildings",
                handle.name()
            )));
        }
        Ok(id)
    }

    /// Returns whether the extrusions went in immediately.
    fn enter_3d(&mut self, id: BasemapId, previous: Option<BasemapId>) -> Result<bool, ViewError> {
        self.update_pois(PoiCollection::hide_all);

        let epoch = self.epoch;
        let min_zoom = self.config.min_extrusion_zoom;
        let pitch = self.config.extrusion_pitch_deg;
        let handle = self
            .registry
            .get_mut(id)
            .ok_or_else(|| ViewError::unavailable(format!("{id} is not registered")))?;
        let loaded = handle.style_loaded();
        let run_now = handle
            .gate
            .when_ready(loaded, Pending::InjectExtrusions { epoch, previous })
            .is_some();
        let backend = handle
            .backend_mut()
            .ok_or_else(|| unavailable(BackendError::Detached))?;

        apply_profile(backend, &PROFILE_3D).map_err(unavailable)?;
        if run_now {
            add_extrusions(backend, true, min_zoom, pitch).map_err(unavailable)?;
        } else {
            tracing::debug!(basemap = %id, "style loading; extrusions deferred");
        }
        let camera = backend.camera().map_err(unavailable)?;
        if camera.zoom < min_zoom {
            backend
                .jump_to(&camera.with_zoom(min_zoom))
                .map_err(unavailable)?;
        }
        Ok(run_now)
    }

    fn finish_enable(&mut self, id: BasemapId, epoch: u64, previous: Option<BasemapId>) {
        if !self.is_current(id, epoch) {
            tracing::debug!(basemap = %id, "skipping stale extrusion request");
            return;
        }
        let min_zoom = self.config.min_extrusion_zoom;
        let pitch = self.config.extrusion_pitch_deg;
        let result = match self.registry.get_mut(id).and_then(BasemapHandle::backend_mut) {
            Some(backend) => add_extrusions(backend, true, min_zoom, pitch),
            None => Err(BackendError::Detached),
        };
        match result {
            Ok(_) => {
                self.phase = Phase::Enabled;
                tracing::info!(basemap = %id, "3D view enabled");
            }
            Err(e) => self.abort_3d(unavailable(e), previous),
        }
    }

    /// Failure after the 3D view was entered: roll everything back,
    /// including the basemap selection.
    fn abort_3d(&mut self, err: ViewError, previous: Option<BasemapId>) {
        self.epoch += 1;
        self.teardown();
        self.phase = Phase::Disabled;
        self.active = previous;
        self.emit(ViewEvent::ModeChanged(ViewMode::TwoD));
        self.reject_enable(err);
    }

    /// Leave the 3D view. Safe to call in any state.
    pub fn disable(&mut self) -> TransitionOutcome {
        let was = self.phase;
        self.epoch += 1;
        self.phase = Phase::Disabling;
        self.teardown();
        self.phase = Phase::Disabled;
        if was.mode() == ViewMode::ThreeD {
            tracing::info!("3D view disabled");
            self.emit(ViewEvent::ModeChanged(ViewMode::TwoD));
            TransitionOutcome::Completed
        } else {
            TransitionOutcome::NoOp
        }
    }

    /// Undo 3D state on every registered basemap, not only the active one.
    fn teardown(&mut self) {
        for handle in self.registry.iter_mut() {
            let id = handle.id();
            let Some(backend) = handle.backend_mut() else {
                continue;
            };
            if let Err(e) = remove_extrusions(backend) {
                tracing::warn!(basemap = %id, error = %e, "could not remove building extrusions");
            }
            match backend.camera() {
                Ok(camera) if camera.pitch_deg() != 0.0 || camera.bearing_deg() != 0.0 => {
                    let flat = camera.with_pitch(0.0).with_bearing(0.0);
                    if let Err(e) = backend.jump_to(&flat) {
                        tracing::warn!(basemap = %id, error = %e, "could not reset camera");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(basemap = %id, error = %e, "could not read camera"),
            }
            if let Err(e) = apply_profile(backend, &PROFILE_2D) {
                tracing::warn!(basemap = %id, error = %e, "could not restore 2D interaction");
            }
        }
        if self.navigation.detach() {
            self.emit(ViewEvent::NavigationDetached);
        }
        self.update_pois(PoiCollection::show_all);
        self.hide_compass();
    }

    /// The basemap selector changed. In 2D this only re-targets the detail
    /// level; in 3D the camera is carried over to the new backend.
    pub fn handle_basemap_change(&mut self, basemap: &str) -> TransitionOutcome {
        let new_id = match self.lookup(basemap) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "basemap change failed");
                self.emit(ViewEvent::Alert(e.to_string()));
                return TransitionOutcome::Failed(e);
            }
        };

        if self.phase.mode() == ViewMode::TwoD {
            self.active = Some(new_id);
            self.timers
                .schedule(self.now, self.config.basemap_settle_ms, TimerKey::BasemapSettle, ());
            return TransitionOutcome::Completed;
        }

        let camera = self.active.and_then(|outgoing| {
            self.parked_swap_camera(outgoing)
                .or_else(|| self.capture_camera(outgoing))
        });
        self.active = Some(new_id);
        tracing::info!(basemap, restore = camera.is_some(), "switching basemap in 3D view");

        let epoch = self.epoch;
        let Some(handle) = self.registry.get_mut(new_id) else {
            return TransitionOutcome::Failed(ViewError::unavailable(format!("{new_id} is not registered")));
        };
        let loaded = handle.style_loaded();
        match handle.gate.when_ready(loaded, Pending::CompleteSwap { epoch, camera }) {
            Some(continuation) => {
                self.run_continuation(new_id, continuation);
                TransitionOutcome::Completed
            }
            None => TransitionOutcome::Pending,
        }
    }

    /// Camera still waiting on `id` from a swap that never completed. The
    /// backend behind `id` has not been moved to it yet, so reading that
    /// backend would lose the camera.
    fn parked_swap_camera(&self, id: BasemapId) -> Option<CameraState> {
        let handle = self.registry.get(id)?;
        handle.gate.pending().iter().find_map(|p| match p {
            Pending::CompleteSwap {
                epoch,
                camera: Some(camera),
            } if *epoch == self.epoch => Some(*camera),
            _ => None,
        })
    }

    fn capture_camera(&self, id: BasemapId) -> Option<CameraState> {
        let result = match self.registry.get(id).and_then(BasemapHandle::backend) {
            Some(backend) => backend.camera(),
            None => Err(BackendError::Detached),
        };
        match result {
            Ok(camera) => Some(camera),
            Err(source) => {
                let err = ViewError::CaptureFailure { basemap: id, source };
                tracing::warn!(error = %err, "continuing basemap switch without camera restore");
                None
            }
        }
    }

    fn complete_swap(&mut self, id: BasemapId, epoch: u64, camera: Option<CameraState>) {
        if !self.is_current(id, epoch) {
            tracing::debug!(basemap = %id, "skipping stale basemap switch");
            return;
        }
        let min_zoom = self.config.min_extrusion_zoom;
        let pitch = self.config.extrusion_pitch_deg;
        let Some(backend) = self.registry.get_mut(id).and_then(BasemapHandle::backend_mut) else {
            tracing::warn!(basemap = %id, "backend detached before switch completed");
            return;
        };

        if let Some(camera) = camera {
            if let Err(e) = backend.jump_to(&camera) {
                tracing::warn!(basemap = %id, error = %e, "could not restore camera");
            }
        }
        if let Err(e) = add_extrusions(backend, false, min_zoom, pitch) {
            tracing::warn!(basemap = %id, error = %e, "could not add building extrusions");
        }
        if let Err(e) = apply_profile(backend, &PROFILE_3D) {
            tracing::warn!(basemap = %id, error = %e, "could not enable 3D interaction");
        }
        self.update_pois(PoiCollection::hide_all);
        self.phase = Phase::Enabled;
        self.reapply_lod();
    }

    // ---- detail level ---------------------------------------------------

    /// Persist `level` and apply it to the active backend.
    pub fn set_lod_level(&mut self, level: LodLevel) -> LodOutcome {
        tracing::info!(%level, "detail level changed");
        self.lod.set_level(level, self.prefs.as_mut());
        self.update_pois(|p| p.set_labels_allowed_by_detail(level == LodLevel::High));
        self.reapply_lod()
    }

    /// Apply the last level to the active backend, now or once its style is
    /// ready.
    pub fn reapply_lod(&mut self) -> LodOutcome {
        let Some(id) = self.active else {
            return LodOutcome::NoBackend;
        };
        let level = self.lod.level();
        let Some(handle) = self.registry.get_mut(id) else {
            return LodOutcome::NoBackend;
        };
        let loaded = handle.style_loaded();
        let already_parked = handle.gate.pending().iter().any(|p| *p == Pending::ApplyLod);
        if handle.gate.when_ready(loaded, Pending::ApplyLod).is_none() {
            tracing::debug!(basemap = %id, %level, "style not ready; detail level deferred");
            if !already_parked {
                self.emit(ViewEvent::LodDeferred { basemap: id, level });
            }
            return LodOutcome::Deferred;
        }
        self.apply_lod_now(id)
    }

    fn apply_lod_now(&mut self, id: BasemapId) -> LodOutcome {
        let Some(handle) = self.registry.get_mut(id) else {
            return LodOutcome::NoBackend;
        };
        let generation = handle.generation();
        let Some(backend) = handle.backend_mut() else {
            return LodOutcome::NoBackend;
        };
        match self.lod.apply(id, generation, backend) {
            Ok(report) => {
                self.emit(ViewEvent::LodApplied {
                    basemap: id,
                    level: report.level,
                    written: report.written(),
                    failed: report.failed.len(),
                });
                LodOutcome::Applied(report)
            }
            Err(e) => {
                tracing::warn!(basemap = %id, error = %e, "detail level not applied");
                LodOutcome::Failed(unavailable(e))
            }
        }
    }

    /// Viewport zoom ended; reapply once the gesture has settled.
    pub fn on_zoom_end(&mut self) {
        self.timers
            .schedule(self.now, self.config.zoom_debounce_ms, TimerKey::ZoomSettle, ());
    }

    /// Advance the clock and run due timers.
    pub fn tick(&mut self, now: Millis) {
        self.now = self.now.max(now);
        for (key, ()) in self.timers.take_due(self.now) {
            match key {
                TimerKey::ZoomSettle | TimerKey::BasemapSettle => {
                    self.reapply_lod();
                }
                TimerKey::CompassPoll => self.poll_compass(),
            }
        }
    }

    // ---- POIs -----------------------------------------------------------

    pub fn load_pois(&mut self, records: Vec<PoiRecord>) {
        tracing::info!(count = records.len(), "POIs loaded");
        self.update_pois(|p| p.replace_records(records));
    }

    pub fn set_labels_enabled(&mut self, enabled: bool) {
        self.update_pois(|p| p.set_labels_enabled(enabled));
    }

    fn update_pois(&mut self, f: impl FnOnce(&mut PoiCollection)) {
        let before = (self.pois.markers_shown(), self.pois.labels_shown());
        f(&mut self.pois);
        let after = (self.pois.markers_shown(), self.pois.labels_shown());
        if before != after {
            self.emit(ViewEvent::PoisChanged {
                markers_visible: after.0,
                labels_visible: after.1,
            });
        }
    }

    // ---- compass --------------------------------------------------------

    fn show_compass(&mut self) {
        if self.compass.show() {
            self.emit(ViewEvent::CompassShown);
        }
        self.timers
            .schedule(self.now, self.config.compass_poll_ms, TimerKey::CompassPoll, ());
    }

    fn hide_compass(&mut self) {
        self.timers.cancel(&TimerKey::CompassPoll);
        if self.compass.hide() {
            self.emit(ViewEvent::CompassHidden);
        }
    }

    fn poll_compass(&mut self) {
        if !self.compass.is_visible() {
            return;
        }
        let bearing = self
            .active_basemap()
            .and_then(BasemapHandle::backend)
            .and_then(|b| b.camera().ok())
            .map(|c| c.bearing_deg());
        if let Some(arrow_deg) = bearing.and_then(|b| self.compass.poll(b)) {
            self.emit(ViewEvent::CompassRotated { arrow_deg });
        }
        self.timers
            .schedule(self.now, self.config.compass_poll_ms, TimerKey::CompassPoll, ());
    }

    /// Ease the active backend back to north, keeping the 3D tilt.
    pub fn reset_north(&mut self) -> Result<(), ViewError> {
        let pitch = self.config.reset_north_pitch_deg;
        let duration = self.config.reset_north_duration_ms;
        let backend = self.active_backend_mut()?;
        let camera = backend.camera().map_err(unavailable)?;
        backend
            .ease_to(&north_up(&camera, pitch), duration)
            .map_err(unavailable)
    }

    // ---- navigation -----------------------------------------------------

    /// Arrow key with modifiers. `true` means the key was consumed.
    pub fn on_key(&mut self, key: ArrowKey, mods: Modifiers) -> bool {
        if !self.navigation.is_attached() || !mods.engaged() {
            return false;
        }
        let Some(id) = self.active else {
            return false;
        };
        let Some(backend) = self.registry.get_mut(id).and_then(BasemapHandle::backend_mut) else {
            return false;
        };
        let Ok(camera) = backend.camera() else {
            return false;
        };
        let Some(next) = self.navigation.key(&camera, key, mods) else {
            return false;
        };
        if let Err(e) = backend.jump_to(&next) {
            tracing::warn!(error = %e, "keyboard navigation failed");
        }
        true
    }

    /// `true` means the host should capture the pointer.
    pub fn on_pointer_down(&mut self, pointer_id: i32, x: f64, y: f64, mods: Modifiers) -> bool {
        self.navigation.pointer_down(pointer_id, x, y, mods)
    }

    pub fn on_pointer_move(&mut self, pointer_id: i32, x: f64, y: f64) -> bool {
        if !self.navigation.is_dragging() {
            return false;
        }
        let Some(id) = self.active else {
            return false;
        };
        let Some(backend) = self.registry.get_mut(id).and_then(BasemapHandle::backend_mut) else {
            return false;
        };
        let Ok(camera) = backend.camera() else {
            return false;
        };
        let Some(next) = self.navigation.pointer_move(&camera, pointer_id, x, y) else {
            return false;
        };
        if let Err(e) = backend.jump_to(&next) {
            tracing::warn!(error = %e, "pointer navigation failed");
        }
        true
    }

    /// `true` means the host should release the pointer capture.
    pub fn on_pointer_up(&mut self, pointer_id: i32) -> bool {
        self.navigation.pointer_up(pointer_id)
    }

    // ---- capture --------------------------------------------------------

    /// PNG data URL of the active backend's canvas.
    pub fn capture_active_canvas(&self) -> Result<String, ViewError> {
        let id = self
            .active
            .ok_or_else(|| ViewError::unavailable("no active basemap"))?;
        let result = match self.registry.get(id).and_then(BasemapHandle::backend) {
            Some(backend) => backend.canvas_data_url(),
            None => Err(BackendError::Detached),
        };
        result.map_err(|source| ViewError::CaptureFailure { basemap: id, source })
    }

    fn active_backend_mut(&mut self) -> Result<&mut (dyn MapBackend + 'static), ViewError> {
        let id = self
            .active
            .ok_or_else(|| ViewError::unavailable("no active basemap"))?;
        self.registry
            .get_mut(id)
            .and_then(BasemapHandle::backend_mut)
            .ok_or_else(|| unavailable(BackendError::Detached))
    }
}
