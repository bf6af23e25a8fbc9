//! ### English
//! C ABI surface for `quad_export_renderer`.
//!
//! All exported symbols are `extern "C"` functions. Strings passed by the host must be
//! NUL-terminated UTF-8 (C string); they will be validated as UTF-8 and will be truncated at the
//! first NUL byte.
//!
//! ### 中文
//! `quad_export_renderer` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数。宿主传入的字符串必须是以 NUL 结尾的 UTF-8（C 字符串）；
//! Rust 会校验 UTF-8，且在遇到第一个 NUL 字节处截断。
mod abi;
mod renderer;

use std::ffi::{CStr, c_char};
use std::path::PathBuf;

use crate::engine::RenderThreadController;

/// ### English
/// Opaque renderer handle owning the render thread controller.
///
/// ### 中文
/// 不透明渲染器句柄，持有渲染线程控制器。
pub struct QuadExportRenderer {
    /// ### English
    /// Controller that owns the render thread and its mailbox.
    ///
    /// ### 中文
    /// 持有渲染线程及其邮箱的控制器。
    controller: RenderThreadController,
}

/// ### English
/// C ABI version for `quad_export_renderer`.
///
/// ### 中文
/// `quad_export_renderer` 的 C ABI 版本号。
const QUAD_EXPORT_RENDERER_ABI_VERSION: u32 = 1;

/// ### English
/// Converts an optional NUL-terminated UTF-8 C string into a `PathBuf`.
///
/// Returns `None` for NULL pointers, invalid UTF-8, or empty strings.
///
/// # Safety
/// `ptr` must be valid and point to a NUL-terminated string for the duration of the call.
///
/// ### 中文
/// 将可选的 NUL 结尾 UTF-8 C 字符串转换为 `PathBuf`。
///
/// 对 NULL 指针、UTF-8 非法或空字符串返回 `None`。
///
/// # Safety
/// `ptr` 在本次调用期间必须有效，并指向以 NUL 结尾的字符串。
unsafe fn cstr_to_path(ptr: *const c_char) -> Option<PathBuf> {
    if ptr.is_null() {
        return None;
    }

    let value = unsafe { CStr::from_ptr(ptr) }.to_str().ok()?;
    if value.is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}
