//! ### English
//! Control-plane handle that spawns, messages and joins the render thread.
//!
//! ### 中文
//! 控制面句柄：创建渲染线程、向其发送消息并 join。

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;

use tracing::{debug, error, info, warn};

use crate::engine::config::RendererConfig;
use crate::engine::error::{ConfigError, RenderError};
use crate::engine::platform::NativeWindow;
use crate::engine::rendering::QuadRenderer;

use super::mailbox::{Mailbox, RenderMessage};
use super::render_thread::{self, FrameDriver, LoopTiming};

const RENDER_THREAD_NAME: &str = "quad-render";

/// ### English
/// `Created -> Running -> Stopping -> Stopped`. `Stopped` is terminal.
///
/// ### 中文
/// `Created -> Running -> Stopping -> Stopped`；`Stopped` 为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// ### English
/// Owns the render thread and the mailbox. Control methods only touch the mailbox and then
/// wake the thread; no graphics call ever runs on the caller's thread.
///
/// All methods take `&self` and may be called from any thread.
///
/// ### 中文
/// 持有渲染线程与邮箱。控制方法只写邮箱并唤醒线程；图形调用从不在调用方线程上执行。
///
/// 所有方法均为 `&self`，可在任意线程调用。
pub struct RenderThreadController {
    config: RendererConfig,
    mailbox: Arc<Mailbox>,
    /// ### English
    /// Readable at any time, including while `stop` is joining.
    ///
    /// ### 中文
    /// 任何时候都可读取，包括 `stop` 正在 join 时。
    state: Mutex<ControllerState>,
    /// ### English
    /// Join handle for the render thread (present between `start` and `stop`). Held across
    /// the whole of `start` and `stop`, which serializes them.
    ///
    /// ### 中文
    /// 渲染线程的 join handle（在 `start` 与 `stop` 之间存在）。在 `start` 与 `stop` 全程持有，
    /// 使二者串行执行。
    thread: Mutex<Option<thread::JoinHandle<()>>>,
    /// ### English
    /// Thread handle used to wake a parked render thread (set once by `start`).
    ///
    /// ### 中文
    /// 用于唤醒处于 park 状态的渲染线程的线程句柄（由 `start` 设置一次）。
    thread_handle: OnceLock<thread::Thread>,
}

impl RenderThreadController {
    pub fn new(config: RendererConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            mailbox: Arc::new(Mailbox::new()),
            state: Mutex::new(ControllerState::Created),
            thread: Mutex::new(None),
            thread_handle: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// ### English
    /// Current state. Never blocks on a running `stop`, so `Stopping` is observable.
    ///
    /// ### 中文
    /// 当前状态；不会因正在执行的 `stop` 而阻塞，因此可观察到 `Stopping`。
    pub fn state(&self) -> ControllerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ControllerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn thread_slot(&self) -> MutexGuard<'_, Option<thread::JoinHandle<()>>> {
        self.thread.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// ### English
    /// Spawns the render thread driving a `QuadRenderer`. Only valid in `Created`; later calls
    /// are ignored with a warning.
    ///
    /// ### 中文
    /// 创建驱动 `QuadRenderer` 的渲染线程。仅在 `Created` 状态有效；之后的调用会被忽略并告警。
    pub fn start(&self) -> Result<(), RenderError> {
        self.start_with(QuadRenderer::new)
    }

    /// ### English
    /// Like `start`, but the frame driver is built by `factory` on the render thread.
    ///
    /// ### 中文
    /// 与 `start` 相同，但帧驱动由 `factory` 在渲染线程上构建。
    pub fn start_with<D, F>(&self, factory: F) -> Result<(), RenderError>
    where
        D: FrameDriver + 'static,
        F: FnOnce(&RendererConfig) -> Result<D, RenderError> + Send + 'static,
    {
        let mut slot = self.thread_slot();
        let state = self.state();
        if state != ControllerState::Created {
            warn!(?state, "start ignored");
            return Ok(());
        }

        let config = self.config.clone();
        let mailbox = self.mailbox.clone();
        let timing = LoopTiming {
            rotate_interval: config.rotate_interval,
            idle_wait: config.idle_wait,
        };

        let thread = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || match factory(&config) {
                Ok(driver) => render_thread::run_render_thread(driver, mailbox, timing),
                Err(err) => error!(%err, "render thread setup failed"),
            })
            .map_err(RenderError::Spawn)?;

        let _ = self.thread_handle.set(thread.thread().clone());
        *slot = Some(thread);
        self.set_state(ControllerState::Running);
        info!("render thread controller running");
        Ok(())
    }

    /// ### English
    /// Posts a new window (or `None` when the surface is gone). Callable in any state; the
    /// latest window before the render thread looks wins. Never blocks on `stop`.
    ///
    /// ### 中文
    /// 投递新的 window（surface 失效时为 `None`）。任何状态下都可调用；
    /// 渲染线程读取前的最后一个 window 生效；不会因 `stop` 而阻塞。
    pub fn set_window(&self, window: Option<NativeWindow>) {
        if !self.mailbox.post(RenderMessage::WindowSet(window)) {
            debug!("window message dropped; render thread is exiting");
            return;
        }
        self.wake();
    }

    /// ### English
    /// Posts `Exit` and blocks until the render thread has torn everything down.
    /// Idempotent; concurrent callers all return after the join.
    ///
    /// ### 中文
    /// 投递 `Exit` 并阻塞，直到渲染线程完成全部拆除。
    /// 幂等；并发调用者都会在 join 完成后返回。
    pub fn stop(&self) {
        let mut slot = self.thread_slot();
        if self.state() == ControllerState::Stopped {
            return;
        }
        self.mailbox.post(RenderMessage::Exit);

        if let Some(thread) = slot.take() {
            self.set_state(ControllerState::Stopping);
            self.wake();
            if thread.join().is_err() {
                error!("render thread panicked");
            }
        }
        self.set_state(ControllerState::Stopped);
        info!("render thread controller stopped");
    }

    fn wake(&self) {
        if let Some(handle) = self.thread_handle.get() {
            handle.unpark();
        }
    }
}

impl Drop for RenderThreadController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Attach { has_window: bool },
        Detach,
    }

    #[derive(Default)]
    struct Tally {
        events: Mutex<Vec<Event>>,
        draws: AtomicUsize,
        advances: AtomicUsize,
        built: AtomicUsize,
    }

    impl Tally {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    struct RecordingDriver {
        tally: Arc<Tally>,
        attached: bool,
    }

    impl FrameDriver for RecordingDriver {
        fn attach_window(&mut self, window: Option<NativeWindow>) -> Result<(), RenderError> {
            if self.attached {
                self.detach();
            }
            self.tally.events.lock().unwrap().push(Event::Attach {
                has_window: window.is_some(),
            });
            self.attached = window.is_some();
            Ok(())
        }

        fn is_active(&self) -> bool {
            self.attached
        }

        fn draw_frame(&mut self) {
            self.tally.draws.fetch_add(1, Ordering::Relaxed);
            thread::sleep(Duration::from_millis(1));
        }

        fn advance_animation(&mut self) {
            self.tally.advances.fetch_add(1, Ordering::Relaxed);
        }

        fn detach(&mut self) {
            self.attached = false;
            self.tally.events.lock().unwrap().push(Event::Detach);
        }
    }

    fn recording(
        tally: &Arc<Tally>,
    ) -> impl FnOnce(&RendererConfig) -> Result<RecordingDriver, RenderError> + Send + 'static
    {
        let tally = tally.clone();
        move |_: &RendererConfig| {
            tally.built.fetch_add(1, Ordering::Relaxed);
            Ok(RecordingDriver {
                tally,
                attached: false,
            })
        }
    }

    fn window_handle() -> NativeWindow {
        NativeWindow::from_ptr(0x1000 as *mut c_void).unwrap()
    }

    fn test_config() -> RendererConfig {
        RendererConfig {
            rotate_interval: Duration::from_millis(5),
            ..RendererConfig::default()
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn window_attaches_draws_and_detaches_on_stop() {
        let tally = Arc::new(Tally::default());
        let controller = RenderThreadController::new(test_config()).unwrap();
        controller.start_with(recording(&tally)).unwrap();
        assert_eq!(controller.state(), ControllerState::Running);

        controller.set_window(Some(window_handle()));
        assert!(wait_until(|| tally.advances.load(Ordering::Relaxed) >= 2));
        assert!(tally.draws.load(Ordering::Relaxed) > 0);

        controller.stop();
        assert_eq!(controller.state(), ControllerState::Stopped);
        assert_eq!(
            tally.events(),
            vec![Event::Attach { has_window: true }, Event::Detach]
        );
    }

    #[test]
    fn set_window_then_stop_neither_deadlocks_nor_attaches_after_detach() {
        for _ in 0..50 {
            let tally = Arc::new(Tally::default());
            let controller = RenderThreadController::new(test_config()).unwrap();
            controller.start_with(recording(&tally)).unwrap();

            controller.set_window(Some(window_handle()));
            controller.stop();

            let events = tally.events();
            assert_eq!(events.last(), Some(&Event::Detach));
            let first_detach = events.iter().position(|e| *e == Event::Detach).unwrap();
            assert!(
                events[first_detach..]
                    .iter()
                    .all(|e| *e == Event::Detach)
            );
        }
    }

    #[test]
    fn null_window_tears_down_and_idles() {
        let tally = Arc::new(Tally::default());
        let controller = RenderThreadController::new(test_config()).unwrap();
        controller.start_with(recording(&tally)).unwrap();

        controller.set_window(Some(window_handle()));
        assert!(wait_until(|| tally.draws.load(Ordering::Relaxed) > 0));
        controller.set_window(None);
        assert!(wait_until(|| tally.events().contains(&Event::Attach {
            has_window: false
        })));

        let draws = tally.draws.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(tally.draws.load(Ordering::Relaxed), draws);
        controller.stop();
    }

    #[test]
    fn second_start_is_ignored() {
        let tally = Arc::new(Tally::default());
        let controller = RenderThreadController::new(test_config()).unwrap();
        controller.start_with(recording(&tally)).unwrap();
        controller.start_with(recording(&tally)).unwrap();
        controller.stop();
        assert_eq!(tally.built.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn stop_without_start_and_repeated_stop_are_harmless() {
        let controller = RenderThreadController::new(test_config()).unwrap();
        controller.set_window(Some(window_handle()));
        controller.stop();
        controller.stop();
        assert_eq!(controller.state(), ControllerState::Stopped);

        controller.set_window(None);
        assert!(controller.start().is_ok());
        assert_eq!(controller.state(), ControllerState::Stopped);
    }

    #[test]
    fn failed_driver_setup_still_joins() {
        let controller = RenderThreadController::new(test_config()).unwrap();
        controller
            .start_with(|_: &RendererConfig| -> Result<RecordingDriver, RenderError> {
                Err(ConfigError::ZeroRotateInterval.into())
            })
            .unwrap();
        controller.stop();
        assert_eq!(controller.state(), ControllerState::Stopped);
    }

    #[test]
    fn busy_poll_mode_still_reacts_to_messages() {
        let tally = Arc::new(Tally::default());
        let config = RendererConfig {
            idle_wait: None,
            ..test_config()
        };
        let controller = RenderThreadController::new(config).unwrap();
        controller.start_with(recording(&tally)).unwrap();
        controller.set_window(Some(window_handle()));
        assert!(wait_until(|| tally.draws.load(Ordering::Relaxed) > 0));
        controller.stop();
        assert_eq!(tally.events().last(), Some(&Event::Detach));
    }

    #[test]
    fn control_calls_from_many_threads() {
        let tally = Arc::new(Tally::default());
        let controller = Arc::new(RenderThreadController::new(test_config()).unwrap());
        controller.start_with(recording(&tally)).unwrap();

        let senders: Vec<_> = (0..4)
            .map(|i| {
                let controller = controller.clone();
                thread::spawn(move || {
                    for n in 0..200 {
                        let window = (n + i) % 3 != 0;
                        controller.set_window(window.then(window_handle));
                    }
                })
            })
            .collect();
        controller.stop();
        for sender in senders {
            sender.join().unwrap();
        }

        assert_eq!(controller.state(), ControllerState::Stopped);
        assert_eq!(tally.events().last(), Some(&Event::Detach));
    }

    struct SlowTeardown {
        release: mpsc::Receiver<()>,
    }

    impl FrameDriver for SlowTeardown {
        fn attach_window(&mut self, _: Option<NativeWindow>) -> Result<(), RenderError> {
            Ok(())
        }

        fn is_active(&self) -> bool {
            false
        }

        fn draw_frame(&mut self) {}

        fn advance_animation(&mut self) {}

        fn detach(&mut self) {
            let _ = self.release.recv_timeout(Duration::from_secs(5));
        }
    }

    #[test]
    fn stopping_is_visible_while_teardown_runs() {
        let (release, gate) = mpsc::channel();
        let controller = Arc::new(RenderThreadController::new(test_config()).unwrap());
        controller
            .start_with(move |_: &RendererConfig| Ok(SlowTeardown { release: gate }))
            .unwrap();

        let stopper = {
            let controller = controller.clone();
            thread::spawn(move || controller.stop())
        };
        assert!(wait_until(|| controller.state() == ControllerState::Stopping));

        release.send(()).unwrap();
        stopper.join().unwrap();
        assert_eq!(controller.state(), ControllerState::Stopped);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = RendererConfig {
            texture_edge: 3,
            ..RendererConfig::default()
        };
        assert!(RenderThreadController::new(config).is_err());
    }
}
