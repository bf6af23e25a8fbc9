//! ### English
//! Render-thread orchestration (public API).
//!
//! ### 中文
//! 渲染线程编排（对外公开 API）。

mod controller;
mod mailbox;
mod render_thread;
mod ticker;

pub use controller::{ControllerState, RenderThreadController};
pub use mailbox::RenderMessage;
pub use render_thread::FrameDriver;
pub use ticker::SecondTicker;
