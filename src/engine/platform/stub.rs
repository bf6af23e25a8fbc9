//! ### English
//! Non-Android placeholder: window buffer geometry is decided by the windowing system.
//!
//! ### 中文
//! 非 Android 占位实现：窗口缓冲格式由窗口系统决定。

use super::NativeWindow;

/// ### English
/// No-op on non-Android builds.
///
/// ### 中文
/// 非 Android 构建下为 no-op。
pub(super) fn set_buffers_format(_window: NativeWindow, format: i32) -> Result<(), i32> {
    tracing::trace!(format, "native window format left to the windowing system");
    Ok(())
}
