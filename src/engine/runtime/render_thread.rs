//! ### English
//! Dedicated render thread: owns the frame driver (and so every graphics handle) and polls the
//! mailbox once per iteration.
//!
//! ### 中文
//! 独立渲染线程：持有帧驱动（因此持有全部图形句柄），每次迭代轮询一次邮箱。

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::engine::error::RenderError;
use crate::engine::platform::NativeWindow;

use super::mailbox::{Mailbox, RenderMessage};
use super::ticker::SecondTicker;

/// ### English
/// What the render loop drives. Implemented by `QuadRenderer`; tests use a recording fake.
///
/// Every method runs on the render thread only.
///
/// ### 中文
/// 渲染循环所驱动的对象。由 `QuadRenderer` 实现；测试使用记录调用的替身。
///
/// 所有方法只在渲染线程上调用。
pub trait FrameDriver {
    /// ### English
    /// Tears down whatever is live, then builds context, scene, texture and export for
    /// `window`. `None` only tears down.
    ///
    /// ### 中文
    /// 先拆除现有资源，再为 `window` 构建上下文、场景、纹理与导出；`None` 只执行拆除。
    fn attach_window(&mut self, window: Option<NativeWindow>) -> Result<(), RenderError>;

    fn is_active(&self) -> bool;

    /// ### English
    /// Draws one frame and presents it.
    ///
    /// ### 中文
    /// 绘制并呈现一帧。
    fn draw_frame(&mut self);

    fn advance_animation(&mut self);

    /// ### English
    /// Releases every graphics resource. Idempotent.
    ///
    /// ### 中文
    /// 释放全部图形资源；幂等。
    fn detach(&mut self);
}

/// ### English
/// Loop timing knobs taken from `RendererConfig`.
///
/// ### 中文
/// 取自 `RendererConfig` 的循环计时参数。
#[derive(Debug, Clone, Copy)]
pub(super) struct LoopTiming {
    pub(super) rotate_interval: Duration,
    pub(super) idle_wait: Option<Duration>,
}

/// ### English
/// Runs until `Exit` is observed. The driver is detached before returning.
///
/// ### 中文
/// 运行直到读取到 `Exit`；返回前会 detach 帧驱动。
pub(super) fn run_render_thread<D: FrameDriver>(
    mut driver: D,
    mailbox: Arc<Mailbox>,
    timing: LoopTiming,
) {
    info!("render thread started");
    let mut ticker = SecondTicker::new(timing.rotate_interval, Instant::now());

    loop {
        /*
        ### English
        1) Read and clear the pending control message.

        ### 中文
        1) 读取并清空待处理的控制消息。
        */
        match mailbox.take() {
            RenderMessage::None => {}
            RenderMessage::WindowSet(window) => {
                debug!(has_window = window.is_some(), "window message");
                if let Err(err) = driver.attach_window(window) {
                    error!(%err, "attaching window failed");
                }
                ticker.reset(Instant::now());
            }
            RenderMessage::Exit => {
                driver.detach();
                break;
            }
        }

        /*
        ### English
        2) Draw and present; rotate the texture once per elapsed interval.

        ### 中文
        2) 绘制并呈现；每经过一个周期旋转一次纹理。
        */
        if driver.is_active() {
            driver.draw_frame();
            if ticker.tick(Instant::now()) {
                driver.advance_animation();
            }
            continue;
        }

        /*
        ### English
        3) No context: wait for a control call (each one unparks us) or just spin.

        ### 中文
        3) 无上下文：等待控制调用（每次调用都会 unpark）或直接自旋。
        */
        match timing.idle_wait {
            Some(wait) => thread::park_timeout(wait),
            None => std::hint::spin_loop(),
        }
    }

    info!("render thread exiting");
}
