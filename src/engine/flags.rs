//! ### English
//! Bitflags controlling optional renderer behaviors.
//!
//! These are passed through the C ABI as a `u32` bitmask.
//!
//! ### 中文
//! 控制渲染器可选行为的位标志（bitflags）。
//!
//! 通过 C ABI 以 `u32` 位掩码传入。

/// ### English
/// Never park the render thread: poll the mailbox in a tight loop even while no window is set.
///
/// Lowest control latency, but keeps one core busy while idle.
///
/// ### 中文
/// 从不 park 渲染线程：即使没有 window 也以紧循环轮询邮箱。
///
/// 控制消息延迟最低，但空闲时会持续占用一个 CPU 核心。
pub const QUAD_EXPORT_FLAG_BUSY_POLL: u32 = 1 << 0;

/// ### English
/// Render only: skip the dma-buf export handoff to the consumer process.
///
/// ### 中文
/// 仅渲染：跳过向消费者进程的 dma-buf 导出交接。
pub const QUAD_EXPORT_FLAG_SKIP_EXPORT: u32 = 1 << 1;

/// ### English
/// Mask of all flag bits understood by this crate version.
///
/// ### 中文
/// 当前 crate 版本识别的全部标志位掩码。
pub const QUAD_EXPORT_FLAG_ALL: u32 = QUAD_EXPORT_FLAG_BUSY_POLL | QUAD_EXPORT_FLAG_SKIP_EXPORT;
