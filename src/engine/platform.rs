//! ### English
//! Host window handle and the minimal native-window API used when creating the surface.
//!
//! On Android the handle is an `ANativeWindow*` owned by the host; other targets only pass
//! the pointer through to EGL.
//!
//! ### 中文
//! 宿主 window 句柄，以及创建 surface 时用到的最小原生窗口 API。
//!
//! 在 Android 上该句柄为宿主持有的 `ANativeWindow*`；其它平台仅将指针透传给 EGL。

use std::ffi::c_void;
use std::ptr::NonNull;

#[cfg(target_os = "android")]
mod android;
#[cfg(not(target_os = "android"))]
mod stub;

#[cfg(target_os = "android")]
use android as imp;
#[cfg(not(target_os = "android"))]
use stub as imp;

/// ### English
/// Opaque, non-null native window pointer supplied by the host.
///
/// The host guarantees the window stays valid until it posts a new window (or NULL) and the
/// render thread has processed that message.
///
/// ### 中文
/// 宿主提供的不透明、非空原生窗口指针。
///
/// 宿主保证：在投递新的 window（或 NULL）且渲染线程处理完该消息之前，该 window 一直有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeWindow(NonNull<c_void>);

// The pointer is only dereferenced by EGL/NDK calls on the render thread.
unsafe impl Send for NativeWindow {}

impl NativeWindow {
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// ### English
/// Applies the EGL config's native visual id as the window buffer format
/// (`ANativeWindow_setBuffersGeometry(window, 0, 0, format)`).
///
/// ### 中文
/// 将 EGL config 的原生 visual id 设为窗口缓冲格式
/// （`ANativeWindow_setBuffersGeometry(window, 0, 0, format)`）。
pub fn set_buffers_format(window: NativeWindow, format: i32) -> Result<(), i32> {
    imp::set_buffers_format(window, format)
}
