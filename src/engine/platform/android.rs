//! ### English
//! Android NDK window calls (`libandroid.so`).
//!
//! ### 中文
//! Android NDK 窗口调用（`libandroid.so`）。

use std::ffi::{c_int, c_void};

use super::NativeWindow;

#[link(name = "android")]
unsafe extern "C" {
    fn ANativeWindow_setBuffersGeometry(
        window: *mut c_void,
        width: i32,
        height: i32,
        format: i32,
    ) -> c_int;
}

pub(super) fn set_buffers_format(window: NativeWindow, format: i32) -> Result<(), i32> {
    let status = unsafe { ANativeWindow_setBuffersGeometry(window.as_ptr(), 0, 0, format) };
    if status == 0 { Ok(()) } else { Err(status) }
}
