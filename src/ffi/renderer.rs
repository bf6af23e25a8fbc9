//! ### English
//! C ABI bindings for renderer lifecycle (create/start/set_window/stop/destroy).
//!
//! ### 中文
//! 渲染器生命周期相关的 C ABI 绑定（create/start/set_window/stop/destroy）。

use std::ffi::{c_char, c_void};

use tracing::error;

use super::QuadExportRenderer;
use crate::engine::platform::NativeWindow;
use crate::engine::{RenderThreadController, RendererConfig};

#[unsafe(no_mangle)]
/// ### English
/// Creates a renderer. The render thread is not started yet.
///
/// `socket_path` is an optional NUL-terminated UTF-8 string; NULL or empty selects
/// `/data/my_socket1`. `texture_edge == 0` selects 256. `flags` is a mask of
/// `quad_export_renderer_flag_*` bits; unknown bits are ignored.
///
/// Returns NULL if the resulting configuration is invalid (e.g. odd `texture_edge`, or one
/// above 16384).
///
/// ### 中文
/// 创建渲染器；此时尚未启动渲染线程。
///
/// `socket_path` 为可选的 NUL 结尾 UTF-8 字符串；传入 NULL 或空字符串时使用
/// `/data/my_socket1`。`texture_edge == 0` 时使用 256。`flags` 为
/// `quad_export_renderer_flag_*` 位掩码；未知位会被忽略。
///
/// 若最终配置非法（例如 `texture_edge` 为奇数或大于 16384），返回 NULL。
pub unsafe extern "C" fn quad_export_renderer_create(
    socket_path: *const c_char,
    texture_edge: u32,
    flags: u32,
) -> *mut QuadExportRenderer {
    let socket_path = unsafe { super::cstr_to_path(socket_path) };
    let config = RendererConfig::from_abi(socket_path, texture_edge, flags);

    let controller = match RenderThreadController::new(config) {
        Ok(controller) => controller,
        Err(err) => {
            error!(%err, "rejecting renderer configuration");
            return std::ptr::null_mut();
        }
    };

    Box::into_raw(Box::new(QuadExportRenderer { controller }))
}

#[unsafe(no_mangle)]
/// ### English
/// Spawns the render thread. Calling it again (or after `stop`) has no effect.
///
/// Returns `false` only if the thread could not be spawned.
///
/// ### 中文
/// 创建渲染线程；重复调用（或在 `stop` 之后调用）不会产生效果。
///
/// 仅当线程创建失败时返回 `false`。
pub unsafe extern "C" fn quad_export_renderer_start(renderer: *mut QuadExportRenderer) -> bool {
    if renderer.is_null() {
        return false;
    }

    match unsafe { (*renderer).controller.start() } {
        Ok(()) => true,
        Err(err) => {
            error!(%err, "failed to start renderer");
            false
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Hands a new native window (`ANativeWindow*` on Android) to the render thread.
///
/// Passing NULL means the surface is gone: the render thread releases its context and idles.
/// The host must keep a non-NULL window valid until it posts the next window (or NULL) and that
/// message has been processed, or until `stop` returns.
///
/// Callable from any thread, in any state.
///
/// ### 中文
/// 将新的原生窗口（Android 上为 `ANativeWindow*`）交给渲染线程。
///
/// 传入 NULL 表示 surface 已失效：渲染线程会释放上下文并进入空闲。
/// 宿主必须保证非 NULL 的 window 在投递下一个 window（或 NULL）且该消息被处理之前、
/// 或在 `stop` 返回之前一直有效。
///
/// 可在任意线程、任意状态下调用。
pub unsafe extern "C" fn quad_export_renderer_set_window(
    renderer: *mut QuadExportRenderer,
    window: *mut c_void,
) {
    if renderer.is_null() {
        return;
    }

    unsafe {
        (*renderer)
            .controller
            .set_window(NativeWindow::from_ptr(window))
    };
}

#[unsafe(no_mangle)]
/// ### English
/// Stops the render thread and blocks until all graphics resources are released.
///
/// ### 中文
/// 停止渲染线程，并阻塞直到全部图形资源释放完毕。
pub unsafe extern "C" fn quad_export_renderer_stop(renderer: *mut QuadExportRenderer) {
    if renderer.is_null() {
        return;
    }

    unsafe { (*renderer).controller.stop() };
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a renderer created by `quad_export_renderer_create`, stopping it first if needed.
///
/// ### 中文
/// 销毁由 `quad_export_renderer_create` 创建的渲染器；如有需要会先停止它。
pub unsafe extern "C" fn quad_export_renderer_destroy(renderer: *mut QuadExportRenderer) {
    if renderer.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(renderer));
    }
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;
    use crate::engine::ControllerState;
    use crate::engine::flags;

    #[test]
    fn null_handles_are_ignored() {
        unsafe {
            assert!(!quad_export_renderer_start(ptr::null_mut()));
            quad_export_renderer_set_window(ptr::null_mut(), ptr::null_mut());
            quad_export_renderer_stop(ptr::null_mut());
            quad_export_renderer_destroy(ptr::null_mut());
        }
    }

    #[test]
    fn odd_edge_yields_null() {
        let renderer = unsafe { quad_export_renderer_create(ptr::null(), 255, 0) };
        assert!(renderer.is_null());
    }

    #[test]
    fn oversized_edge_yields_null() {
        for edge in [65536, u32::MAX - 1] {
            let renderer = unsafe { quad_export_renderer_create(ptr::null(), edge, 0) };
            assert!(renderer.is_null(), "edge {edge}");
        }
    }

    #[test]
    fn create_applies_defaults_and_flags() {
        let renderer = unsafe {
            quad_export_renderer_create(
                c"/tmp/consumer.sock".as_ptr(),
                0,
                flags::QUAD_EXPORT_FLAG_SKIP_EXPORT,
            )
        };
        assert!(!renderer.is_null());

        let config = unsafe { (*renderer).controller.config().clone() };
        assert_eq!(config.texture_edge, 256);
        assert!(!config.export_enabled);
        assert_eq!(config.socket_path.to_str(), Some("/tmp/consumer.sock"));
        assert_eq!(
            unsafe { (*renderer).controller.state() },
            ControllerState::Created
        );

        unsafe { quad_export_renderer_destroy(renderer) };
    }

    #[test]
    fn lifecycle_without_window_stops_cleanly() {
        let renderer = unsafe { quad_export_renderer_create(ptr::null(), 16, 0) };
        assert!(!renderer.is_null());
        unsafe {
            assert!(quad_export_renderer_start(renderer));
            quad_export_renderer_set_window(renderer, ptr::null_mut());
            quad_export_renderer_stop(renderer);
            assert_eq!((*renderer).controller.state(), ControllerState::Stopped);
            quad_export_renderer_destroy(renderer);
        }
    }
}
