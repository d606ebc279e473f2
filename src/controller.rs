//! The opacity state machine.
//!
//! [`OpacityController`] owns the toggle memory, the cycling timer and the
//! [`Wave`] generator, and reacts to [`Command`]s by reading and writing the
//! focused window's opacity through the [`WindowManager`] trait.
//!
//! | State       | Entered by                          | Left by                         |
//! |-------------|-------------------------------------|---------------------------------|
//! | Idle        | start, restoring toggle             | toggle on an opaque window      |
//! | Transparent | toggle on an opaque window          | toggle again                    |
//! | Cycling     | `CycleOpacity` while not cycling    | `CycleOpacity` again, shutdown  |
//!
//! Cycling is independent of Transparent: the wave keeps its own counter and
//! never touches the remembered original opacity.
//!
//! The controller also owns the hotkey binds, so a `SetHotkey` takes effect
//! without restarting the daemon.

use crate::command::{Command, Hotkey, WindowInfo};
use crate::config::Config;
use crate::keybinding::{self, Accelerator, HyprBind, ShellBinding};
use crate::traits::{Scheduler, SettingsStore, TimerHandle, WindowManager};
use crate::wave::Wave;
use log::{debug, info, warn};
use std::time::Duration;

/// Opacity change applied by a single increase/decrease.
pub const OPACITY_STEP: u8 = 20;

/// Possible errors from the controller.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
    /// A settings value was rejected or could not be saved.
    #[error("settings error: {0}")]
    Settings(String),
}

/// A running opacity cycle.
///
/// The target is resolved once when the cycle starts; later ticks keep
/// acting on it even if focus moves elsewhere.
#[derive(Debug)]
struct ActiveCycle {
    handle: TimerHandle,
    target: WindowInfo,
}

/// Hotkeys registered with the window manager and the client command
/// line they run.
#[derive(Debug)]
struct Hotkeys {
    client: String,
    binding: ShellBinding,
}

/// Orchestrates opacity changes on the focused window.
///
/// Generic over the window manager, the timer source and the settings
/// backend, so it can be driven by Hyprland and the event loop in
/// production and by recording mocks in tests.
///
/// # Typical usage
///
/// ```ignore
/// let mut controller = OpacityController::new(HyprlandWm::new(), LoopScheduler::new(), settings);
/// controller.handle(Command::ToggleTransparency)?;
/// ```
pub struct OpacityController<W: WindowManager, S: Scheduler, C: SettingsStore> {
    wm: W,
    scheduler: S,
    settings: C,
    original_opacity: Option<u8>,
    cycle: Option<ActiveCycle>,
    wave: Wave,
    hotkeys: Option<Hotkeys>,
}

impl<W: WindowManager, S: Scheduler, C: SettingsStore> OpacityController<W, S, C> {
    /// Create a controller in the Idle state.
    pub fn new(wm: W, scheduler: S, settings: C) -> Self {
        Self {
            wm,
            scheduler,
            settings,
            original_opacity: None,
            cycle: None,
            wave: Wave::default(),
            hotkeys: None,
        }
    }

    pub fn window_manager(&self) -> &W {
        &self.wm
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn settings(&self) -> &C {
        &self.settings
    }

    /// Opacity remembered before the toggle made the window transparent.
    pub fn original_opacity(&self) -> Option<u8> {
        self.original_opacity
    }

    /// Whether the ping-pong cycle is running.
    pub fn is_cycling(&self) -> bool {
        self.cycle.is_some()
    }

    /// Handle of the live cycle timer, if cycling.
    pub fn cycle_timer(&self) -> Option<TimerHandle> {
        self.cycle.as_ref().map(|c| c.handle)
    }

    pub fn wave(&self) -> &Wave {
        &self.wave
    }

    /// Binds currently registered for the hotkeys.
    pub fn registered_hotkeys(&self) -> &[HyprBind] {
        self.hotkeys
            .as_ref()
            .map(|h| h.binding.registered())
            .unwrap_or(&[])
    }

    /// Register the configured hotkeys so that they run `client <action>`.
    ///
    /// Any binds registered earlier are removed first.  Later hotkey changes
    /// re-register with the same `client`.
    pub fn bind_hotkeys(&mut self, client: impl Into<String>) {
        self.unbind_hotkeys();
        let client = client.into();
        let binds = keybinding::binds_for(&self.settings.settings(), &client);
        let binding = ShellBinding::register(&self.wm, binds);
        self.hotkeys = Some(Hotkeys { client, binding });
    }

    /// Remove every registered hotkey from the window manager.
    pub fn unbind_hotkeys(&mut self) {
        if let Some(mut hotkeys) = self.hotkeys.take() {
            hotkeys.binding.unregister_all(&self.wm);
        }
    }

    /// Process a single [`Command`].
    ///
    /// A missing focus target is not an error: the action is skipped and a
    /// debug message logged.
    pub fn handle(&mut self, cmd: Command) -> Result<(), ControllerError> {
        match cmd {
            Command::ToggleTransparency => self.toggle_transparency(),
            Command::CycleOpacity => self.cycle_opacity(),
            Command::IncreaseOpacity => self.increase_opacity(),
            Command::DecreaseOpacity => self.decrease_opacity(),
            Command::SetOpacityLevel(level) => {
                info!("opacity-level = {}", level);
                self.update_settings(|s| s.opacity_level = level)
            }
            Command::SetCycleRate(ms) => {
                info!("cycle-rate = {}ms", ms);
                self.update_settings(|s| s.cycle_rate = ms)
            }
            Command::SetDebugMode(on) => {
                info!("debug-mode = {}", on);
                self.update_settings(|s| s.debug_mode = on)?;
                crate::logging::set_debug_mode(on);
                Ok(())
            }
            Command::SetHotkey {
                hotkey,
                accelerator,
            } => self.set_hotkey(hotkey, accelerator),
            Command::Quit => {
                self.shutdown();
                Ok(())
            }
        }
    }

    /// Store a new accelerator for `hotkey` and re-register the binds.
    pub fn set_hotkey(
        &mut self,
        hotkey: Hotkey,
        accelerator: String,
    ) -> Result<(), ControllerError> {
        Accelerator::parse(&accelerator)
            .map_err(|e| ControllerError::Settings(format!("{}: {}", hotkey.key(), e)))?;
        info!("{} = {:?}", hotkey.key(), accelerator);
        self.update_settings(|s| *s.hotkey_mut(hotkey) = accelerator)?;

        if let Some(client) = self.hotkeys.as_ref().map(|h| h.client.clone()) {
            self.bind_hotkeys(client);
        }
        Ok(())
    }

    /// Make the focused window transparent, or restore it if it already is.
    pub fn toggle_transparency(&mut self) -> Result<(), ControllerError> {
        let Some(target) = self.focused_target()? else {
            return Ok(());
        };
        let current = self.opacity_of(&target)?;

        if current < u8::MAX {
            let restored = self.original_opacity.unwrap_or(u8::MAX);
            self.write(&target, restored)?;
            self.original_opacity = None;
            debug!("restored window opacity: {} ({})", target.title, restored);
        } else {
            let config = self.settings.settings();
            let opacity = config.toggle_opacity();
            self.write(&target, opacity)?;
            if self.original_opacity.is_none() {
                self.original_opacity = Some(current);
            }
            debug!(
                "made window transparent: {} opacity: {} ({}%)",
                target.title, opacity, config.opacity_level
            );
        }
        Ok(())
    }

    /// Start the opacity cycle on the focused window, or stop it if it is
    /// already running.
    ///
    /// Stopping leaves the window at whatever opacity the last tick wrote.
    pub fn cycle_opacity(&mut self) -> Result<(), ControllerError> {
        if self.is_cycling() {
            info!("stopping opacity cycle");
            self.stop_cycle();
            return Ok(());
        }

        let Some(target) = self.focused_target()? else {
            return Ok(());
        };
        let rate = Duration::from_millis(self.settings.settings().cycle_rate);

        self.stop_cycle();
        let handle = self.scheduler.start(rate);
        info!(
            "cycling opacity of {} every {}ms",
            target.title,
            rate.as_millis()
        );
        self.cycle = Some(ActiveCycle { handle, target });
        Ok(())
    }

    /// Advance the cycle by one tick.
    ///
    /// Ticks for any handle other than the live cycle timer are ignored.  If
    /// the write fails (typically because the window closed) the cycle is
    /// stopped.
    pub fn tick(&mut self, handle: TimerHandle) -> Result<(), ControllerError> {
        let target = match &self.cycle {
            Some(cycle) if cycle.handle == handle => cycle.target.clone(),
            _ => {
                debug!("ignoring tick for stale timer {:?}", handle);
                return Ok(());
            }
        };

        let opacity = self.wave.next_opacity();
        debug!("cycling window opacity: counter={} opacity={}", self.wave.counter(), opacity);
        if let Err(e) = self.write(&target, opacity) {
            warn!("cycle target {} unavailable, stopping cycle", target.title);
            self.stop_cycle();
            return Err(e);
        }
        Ok(())
    }

    /// Raise the focused window's opacity by [`OPACITY_STEP`].
    ///
    /// Nothing is written once the result would reach full opacity.
    pub fn increase_opacity(&mut self) -> Result<(), ControllerError> {
        let Some(target) = self.focused_target()? else {
            return Ok(());
        };
        let base = self.adjustment_base(&target)?;

        let raised = base as u16 + OPACITY_STEP as u16;
        if raised.min(u8::MAX as u16) == u8::MAX as u16 {
            debug!("maximum opacity reached");
            return Ok(());
        }
        self.write(&target, raised as u8)
    }

    /// Lower the focused window's opacity by [`OPACITY_STEP`], stopping at 0.
    pub fn decrease_opacity(&mut self) -> Result<(), ControllerError> {
        let Some(target) = self.focused_target()? else {
            return Ok(());
        };
        let base = self.adjustment_base(&target)?;
        self.write(&target, base.saturating_sub(OPACITY_STEP))
    }

    /// Stop any running cycle, forget the remembered opacity and remove the
    /// hotkeys.
    pub fn shutdown(&mut self) {
        self.stop_cycle();
        self.original_opacity = None;
        self.unbind_hotkeys();
        info!("opacity controller shut down");
    }

    //  Helpers

    /// Resolve the focused window, logging why there is none.
    fn focused_target(&self) -> Result<Option<WindowInfo>, ControllerError> {
        let window = self
            .wm
            .active_window()
            .map_err(|e| ControllerError::WindowManager(e.to_string()))?;
        match window {
            None => {
                debug!("no focused window found");
                Ok(None)
            }
            Some(w) if !w.mapped => {
                debug!("no window surface found for {}", w.title);
                Ok(None)
            }
            Some(w) => Ok(Some(w)),
        }
    }

    /// Increase/decrease start from the remembered original opacity when a
    /// toggle is active, and from the live opacity otherwise.
    fn adjustment_base(&self, target: &WindowInfo) -> Result<u8, ControllerError> {
        match self.original_opacity {
            Some(original) => Ok(original),
            None => self.opacity_of(target),
        }
    }

    fn opacity_of(&self, target: &WindowInfo) -> Result<u8, ControllerError> {
        self.wm
            .window_opacity(target)
            .map_err(|e| ControllerError::WindowManager(e.to_string()))
    }

    fn write(&self, target: &WindowInfo, opacity: u8) -> Result<(), ControllerError> {
        self.wm
            .set_window_opacity(target, opacity)
            .map_err(|e| ControllerError::WindowManager(e.to_string()))
    }

    fn stop_cycle(&mut self) {
        if let Some(cycle) = self.cycle.take() {
            self.scheduler.stop(cycle.handle);
        }
    }

    fn update_settings(
        &mut self,
        apply: impl FnOnce(&mut Config),
    ) -> Result<(), ControllerError> {
        let mut updated = self.settings.settings();
        apply(&mut updated);
        self.settings
            .store(updated)
            .map_err(|e| ControllerError::Settings(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileSettings;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    //  Mocks

    /// Record-keeping mock window manager.
    #[derive(Debug)]
    struct RecorderWm {
        focused: RefCell<Option<WindowInfo>>,
        opacities: RefCell<HashMap<String, u8>>,
        writes: RefCell<Vec<(String, u8)>>,
        fail_writes: Cell<bool>,
        /// `bind…`/`unbind…` arguments in the order they were sent.
        binds: RefCell<Vec<String>>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    struct RecorderErr;

    fn window(address: &str) -> WindowInfo {
        WindowInfo {
            address: address.into(),
            title: format!("window {}", address),
            mapped: true,
        }
    }

    impl Default for RecorderWm {
        fn default() -> Self {
            Self {
                focused: RefCell::new(Some(window("0xa"))),
                opacities: RefCell::default(),
                writes: RefCell::default(),
                fail_writes: Cell::new(false),
                binds: RefCell::default(),
            }
        }
    }

    impl RecorderWm {
        fn focus(&self, w: Option<WindowInfo>) {
            *self.focused.borrow_mut() = w;
        }

        fn set(&self, address: &str, opacity: u8) {
            self.opacities.borrow_mut().insert(address.into(), opacity);
        }

        fn get(&self, address: &str) -> u8 {
            self.opacities.borrow().get(address).copied().unwrap_or(255)
        }

        fn write_count(&self) -> usize {
            self.writes.borrow().len()
        }
    }

    impl WindowManager for RecorderWm {
        type Error = RecorderErr;

        fn active_window(&self) -> Result<Option<WindowInfo>, RecorderErr> {
            Ok(self.focused.borrow().clone())
        }

        fn window_opacity(&self, w: &WindowInfo) -> Result<u8, RecorderErr> {
            Ok(self.get(&w.address))
        }

        fn set_window_opacity(&self, w: &WindowInfo, opacity: u8) -> Result<(), RecorderErr> {
            if self.fail_writes.get() {
                return Err(RecorderErr);
            }
            self.set(&w.address, opacity);
            self.writes.borrow_mut().push((w.address.clone(), opacity));
            Ok(())
        }

        fn register_keybinding(&self, bind: &HyprBind) -> Result<(), RecorderErr> {
            self.binds.borrow_mut().push(bind.bind_args());
            Ok(())
        }

        fn unregister_keybinding(&self, bind: &HyprBind) -> Result<(), RecorderErr> {
            self.binds.borrow_mut().push(bind.unbind_args());
            Ok(())
        }
    }

    /// Scheduler that only tracks which handles are live.
    #[derive(Debug, Default)]
    struct MockScheduler {
        next: u64,
        live: Vec<TimerHandle>,
        intervals: Vec<Duration>,
    }

    impl Scheduler for MockScheduler {
        fn start(&mut self, interval: Duration) -> TimerHandle {
            self.next += 1;
            let handle = TimerHandle::new(self.next);
            self.live.push(handle);
            self.intervals.push(interval);
            handle
        }

        fn stop(&mut self, handle: TimerHandle) {
            self.live.retain(|h| *h != handle);
        }
    }

    type TestController = OpacityController<RecorderWm, MockScheduler, Config>;

    fn make_controller() -> TestController {
        OpacityController::new(RecorderWm::default(), MockScheduler::default(), Config::default())
    }

    fn wm(c: &TestController) -> &RecorderWm {
        c.window_manager()
    }

    //  Toggle

    #[test]
    fn toggle_makes_opaque_window_transparent_and_back() {
        let mut c = make_controller();
        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(wm(&c).get("0xa"), 128);
        assert_eq!(c.original_opacity(), Some(255));

        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(wm(&c).get("0xa"), 255);
        assert_eq!(c.original_opacity(), None);
        assert_eq!(wm(&c).write_count(), 2);
    }

    #[test]
    fn toggle_uses_current_opacity_level() {
        let mut c = make_controller();
        c.handle(Command::SetOpacityLevel(30)).unwrap();
        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(wm(&c).get("0xa"), 77);
    }

    #[test]
    fn toggle_on_partially_transparent_window_restores_full_opacity() {
        let mut c = make_controller();
        wm(&c).set("0xa", 200);
        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(wm(&c).get("0xa"), 255);
        assert_eq!(c.original_opacity(), None);
    }

    #[test]
    fn toggle_capture_is_not_overwritten() {
        let mut c = make_controller();
        c.handle(Command::SetOpacityLevel(100)).unwrap();
        c.handle(Command::ToggleTransparency).unwrap();
        // Level 100 leaves the window opaque, so the next toggle takes the
        // capture branch again with the memory already set.
        assert_eq!(wm(&c).get("0xa"), 255);
        c.handle(Command::SetOpacityLevel(40)).unwrap();
        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(c.original_opacity(), Some(255));
        assert_eq!(wm(&c).get("0xa"), 102);
    }

    #[test]
    fn toggle_to_zero_still_restores() {
        let mut c = make_controller();
        c.handle(Command::SetOpacityLevel(0)).unwrap();
        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(wm(&c).get("0xa"), 0);
        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(wm(&c).get("0xa"), 255);
    }

    #[test]
    fn toggle_without_focus_is_noop() {
        let mut c = make_controller();
        wm(&c).focus(None);
        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(wm(&c).write_count(), 0);
        assert_eq!(c.original_opacity(), None);
    }

    #[test]
    fn toggle_on_unmapped_window_is_noop() {
        let mut c = make_controller();
        wm(&c).focus(Some(WindowInfo {
            mapped: false,
            ..window("0xb")
        }));
        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(wm(&c).write_count(), 0);
    }

    //  Cycle

    #[test]
    fn cycle_timer_count_follows_call_parity() {
        let mut c = make_controller();
        for n in 1..=6 {
            c.handle(Command::CycleOpacity).unwrap();
            let expected = n % 2;
            assert_eq!(c.scheduler().live.len(), expected, "after {} calls", n);
            assert_eq!(c.is_cycling(), expected == 1);
            assert_eq!(c.cycle_timer().is_some(), expected == 1);
        }
    }

    #[test]
    fn cycle_uses_configured_rate() {
        let mut c = make_controller();
        c.handle(Command::SetCycleRate(40)).unwrap();
        c.handle(Command::CycleOpacity).unwrap();
        assert_eq!(c.scheduler().intervals, vec![Duration::from_millis(40)]);
    }

    #[test]
    fn cycle_ticks_write_clamped_wave() {
        let mut c = make_controller();
        c.handle(Command::CycleOpacity).unwrap();
        let handle = c.cycle_timer().unwrap();

        c.tick(handle).unwrap();
        assert_eq!(c.wave().counter(), 265);
        assert_eq!(wm(&c).get("0xa"), 255);

        for _ in 0..9 {
            c.tick(handle).unwrap();
        }
        assert_eq!(wm(&c).get("0xa"), 245);
        assert_eq!(wm(&c).write_count(), 10);
    }

    #[test]
    fn stopping_cycle_keeps_last_opacity() {
        let mut c = make_controller();
        c.handle(Command::CycleOpacity).unwrap();
        let handle = c.cycle_timer().unwrap();
        for _ in 0..12 {
            c.tick(handle).unwrap();
        }
        let last = wm(&c).get("0xa");
        assert_eq!(last, 225);

        c.handle(Command::CycleOpacity).unwrap();
        assert_eq!(wm(&c).get("0xa"), last);
        assert_eq!(wm(&c).write_count(), 12);
    }

    #[test]
    fn stale_ticks_are_ignored() {
        let mut c = make_controller();
        c.handle(Command::CycleOpacity).unwrap();
        let first = c.cycle_timer().unwrap();
        c.handle(Command::CycleOpacity).unwrap();

        c.tick(first).unwrap();
        assert_eq!(wm(&c).write_count(), 0);

        c.handle(Command::CycleOpacity).unwrap();
        let second = c.cycle_timer().unwrap();
        assert_ne!(first, second);
        c.tick(first).unwrap();
        assert_eq!(wm(&c).write_count(), 0);
        c.tick(second).unwrap();
        assert_eq!(wm(&c).write_count(), 1);
    }

    #[test]
    fn cycle_keeps_target_from_start() {
        let mut c = make_controller();
        c.handle(Command::CycleOpacity).unwrap();
        let handle = c.cycle_timer().unwrap();
        wm(&c).focus(Some(window("0xb")));

        c.tick(handle).unwrap();
        assert!(wm(&c).writes.borrow().iter().all(|(addr, _)| addr == "0xa"));
    }

    #[test]
    fn cycle_start_without_focus_is_noop() {
        let mut c = make_controller();
        wm(&c).focus(None);
        c.handle(Command::CycleOpacity).unwrap();
        assert!(!c.is_cycling());
        assert!(c.scheduler().live.is_empty());
    }

    #[test]
    fn cycle_stop_does_not_need_focus() {
        let mut c = make_controller();
        c.handle(Command::CycleOpacity).unwrap();
        wm(&c).focus(None);
        c.handle(Command::CycleOpacity).unwrap();
        assert!(!c.is_cycling());
        assert!(c.scheduler().live.is_empty());
    }

    #[test]
    fn failed_tick_stops_cycle() {
        let mut c = make_controller();
        c.handle(Command::CycleOpacity).unwrap();
        let handle = c.cycle_timer().unwrap();
        wm(&c).fail_writes.set(true);

        assert!(c.tick(handle).is_err());
        assert!(!c.is_cycling());
        assert!(c.scheduler().live.is_empty());
    }

    #[test]
    fn wave_continues_across_cycles() {
        let mut c = make_controller();
        c.handle(Command::CycleOpacity).unwrap();
        let h = c.cycle_timer().unwrap();
        c.tick(h).unwrap();
        c.tick(h).unwrap();
        c.handle(Command::CycleOpacity).unwrap();

        c.handle(Command::CycleOpacity).unwrap();
        let h = c.cycle_timer().unwrap();
        c.tick(h).unwrap();
        assert_eq!(c.wave().counter(), 285);
    }

    #[test]
    fn cycle_does_not_touch_toggle_memory() {
        let mut c = make_controller();
        c.handle(Command::ToggleTransparency).unwrap();
        c.handle(Command::CycleOpacity).unwrap();
        let h = c.cycle_timer().unwrap();
        c.tick(h).unwrap();
        assert_eq!(c.original_opacity(), Some(255));
    }

    //  Increase / decrease

    #[test]
    fn increase_near_full_reports_maximum() {
        let mut c = make_controller();
        wm(&c).set("0xa", 250);
        c.handle(Command::IncreaseOpacity).unwrap();
        assert_eq!(wm(&c).get("0xa"), 250);
        assert_eq!(wm(&c).write_count(), 0);

        wm(&c).set("0xa", 235);
        c.handle(Command::IncreaseOpacity).unwrap();
        assert_eq!(wm(&c).write_count(), 0);
    }

    #[test]
    fn increase_adds_step() {
        let mut c = make_controller();
        wm(&c).set("0xa", 100);
        c.handle(Command::IncreaseOpacity).unwrap();
        assert_eq!(wm(&c).get("0xa"), 120);
        wm(&c).set("0xa", 234);
        c.handle(Command::IncreaseOpacity).unwrap();
        assert_eq!(wm(&c).get("0xa"), 254);
    }

    #[test]
    fn decrease_floors_at_zero() {
        let mut c = make_controller();
        wm(&c).set("0xa", 10);
        c.handle(Command::DecreaseOpacity).unwrap();
        assert_eq!(wm(&c).get("0xa"), 0);
        c.handle(Command::DecreaseOpacity).unwrap();
        assert_eq!(wm(&c).get("0xa"), 0);
        assert_eq!(wm(&c).write_count(), 2);
    }

    #[test]
    fn adjustments_start_from_remembered_opacity() {
        let mut c = make_controller();
        c.handle(Command::ToggleTransparency).unwrap();
        assert_eq!(wm(&c).get("0xa"), 128);

        c.handle(Command::DecreaseOpacity).unwrap();
        assert_eq!(wm(&c).get("0xa"), 235);

        c.handle(Command::IncreaseOpacity).unwrap();
        assert_eq!(wm(&c).get("0xa"), 235);
        assert_eq!(c.original_opacity(), Some(255));
    }

    #[test]
    fn adjustments_without_focus_are_noops() {
        let mut c = make_controller();
        wm(&c).focus(None);
        c.handle(Command::IncreaseOpacity).unwrap();
        c.handle(Command::DecreaseOpacity).unwrap();
        assert_eq!(wm(&c).write_count(), 0);
    }

    //  Settings and lifecycle

    #[test]
    fn invalid_settings_are_rejected() {
        let mut c = make_controller();
        assert!(matches!(
            c.handle(Command::SetOpacityLevel(150)),
            Err(ControllerError::Settings(_))
        ));
        assert!(c.handle(Command::SetCycleRate(0)).is_err());
        assert_eq!(c.settings().settings(), Config::default());
    }

    #[test]
    fn debug_mode_is_stored() {
        let mut c = make_controller();
        c.handle(Command::SetDebugMode(true)).unwrap();
        assert!(c.settings().settings().debug_mode);
    }

    #[test]
    fn hotkey_change_is_stored_and_rebound() {
        let mut c = make_controller();
        c.bind_hotkeys("hyprfade");
        assert_eq!(c.registered_hotkeys().len(), 3);
        wm(&c).binds.borrow_mut().clear();

        c.handle(Command::SetHotkey {
            hotkey: Hotkey::Toggle,
            accelerator: "<Super>o".into(),
        })
        .unwrap();

        assert_eq!(c.settings().settings().toggle_hotkey, "<Super>o");
        assert_eq!(
            *wm(&c).binds.borrow(),
            vec![
                "unbind SUPER ALT,t".to_string(),
                "unbind SUPER ALT,Up".to_string(),
                "unbind SUPER ALT,Down".to_string(),
                "bindr SUPER,o,exec,hyprfade cycle".to_string(),
                "binde SUPER ALT,Up,exec,hyprfade increase".to_string(),
                "binde SUPER ALT,Down,exec,hyprfade decrease".to_string(),
            ]
        );
    }

    #[test]
    fn empty_hotkey_disables_binding() {
        let mut c = make_controller();
        c.bind_hotkeys("hyprfade");
        c.handle(Command::SetHotkey {
            hotkey: Hotkey::Increase,
            accelerator: String::new(),
        })
        .unwrap();
        assert_eq!(c.settings().settings().increase_window_opacity, "");
        assert_eq!(c.registered_hotkeys().len(), 2);
        assert!(c
            .registered_hotkeys()
            .iter()
            .all(|b| b.exec != "hyprfade increase"));
    }

    #[test]
    fn invalid_hotkey_is_rejected_without_rebinding() {
        let mut c = make_controller();
        c.bind_hotkeys("hyprfade");
        wm(&c).binds.borrow_mut().clear();

        assert!(matches!(
            c.handle(Command::SetHotkey {
                hotkey: Hotkey::Decrease,
                accelerator: "<Hyper>d".into(),
            }),
            Err(ControllerError::Settings(_))
        ));
        assert_eq!(c.settings().settings(), Config::default());
        assert!(wm(&c).binds.borrow().is_empty());
        assert_eq!(c.registered_hotkeys().len(), 3);
    }

    #[test]
    fn hotkey_change_without_bound_hotkeys_only_stores() {
        let mut c = make_controller();
        c.handle(Command::SetHotkey {
            hotkey: Hotkey::Toggle,
            accelerator: "F9".into(),
        })
        .unwrap();
        assert_eq!(c.settings().settings().toggle_hotkey, "F9");
        assert!(wm(&c).binds.borrow().is_empty());
    }

    #[test]
    fn settings_command_keeps_external_file_edits() {
        let path = std::env::temp_dir()
            .join(format!("hyprfade-controller-{}", std::process::id()))
            .join("config.json");
        let settings = FileSettings::open(&path);
        let mut c =
            OpacityController::new(RecorderWm::default(), MockScheduler::default(), settings);
        c.handle(Command::SetOpacityLevel(60)).unwrap();

        std::fs::write(&path, r#"{ "toggle-hotkey": "<Super>o", "opacity-level": 30 }"#).unwrap();
        c.handle(Command::SetCycleRate(500)).unwrap();

        let on_disk = Config::load(&path).unwrap();
        assert_eq!(on_disk.toggle_hotkey, "<Super>o");
        assert_eq!(on_disk.opacity_level, 30);
        assert_eq!(on_disk.cycle_rate, 500);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn shutdown_removes_hotkeys() {
        let mut c = make_controller();
        c.bind_hotkeys("hyprfade");
        wm(&c).binds.borrow_mut().clear();

        c.handle(Command::Quit).unwrap();
        assert!(c.registered_hotkeys().is_empty());
        assert_eq!(wm(&c).binds.borrow().len(), 3);

        c.shutdown();
        assert_eq!(wm(&c).binds.borrow().len(), 3);
    }

    #[test]
    fn shutdown_stops_timer_and_clears_memory() {
        let mut c = make_controller();
        c.handle(Command::ToggleTransparency).unwrap();
        c.handle(Command::CycleOpacity).unwrap();
        let h = c.cycle_timer().unwrap();

        c.handle(Command::Quit).unwrap();
        assert!(!c.is_cycling());
        assert!(c.scheduler().live.is_empty());
        assert_eq!(c.original_opacity(), None);

        let writes = wm(&c).write_count();
        c.tick(h).unwrap();
        assert_eq!(wm(&c).write_count(), writes);
    }

    #[test]
    fn window_manager_failure_surfaces_as_error() {
        let mut c = make_controller();
        wm(&c).fail_writes.set(true);
        assert!(matches!(
            c.handle(Command::ToggleTransparency),
            Err(ControllerError::WindowManager(_))
        ));
        assert_eq!(c.original_opacity(), None);
    }
}
