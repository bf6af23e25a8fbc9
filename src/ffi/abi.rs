use crate::engine::{flags, logging};

#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn quad_export_renderer_abi_version() -> u32 {
    super::QUAD_EXPORT_RENDERER_ABI_VERSION
}

#[unsafe(no_mangle)]
/// ### English
/// Flag bit: never park the render thread while idle.
///
/// ### 中文
/// 标志位：空闲时从不 park 渲染线程。
pub extern "C" fn quad_export_renderer_flag_busy_poll() -> u32 {
    flags::QUAD_EXPORT_FLAG_BUSY_POLL
}

#[unsafe(no_mangle)]
/// ### English
/// Flag bit: render only, skip the dma-buf handoff.
///
/// ### 中文
/// 标志位：仅渲染，跳过 dma-buf 交接。
pub extern "C" fn quad_export_renderer_flag_skip_export() -> u32 {
    flags::QUAD_EXPORT_FLAG_SKIP_EXPORT
}

#[unsafe(no_mangle)]
/// ### English
/// Mask of every flag bit this library understands.
///
/// ### 中文
/// 本库识别的全部标志位掩码。
pub extern "C" fn quad_export_renderer_flag_all() -> u32 {
    flags::QUAD_EXPORT_FLAG_ALL
}

#[unsafe(no_mangle)]
/// ### English
/// Installs a stderr `tracing` subscriber with the given max level
/// (`0` = off, `1` = error, `2` = warn, `3` = info, `4` = debug, `5+` = trace).
///
/// Returns `false` if a global subscriber was already installed (by this call or by the host).
///
/// ### 中文
/// 安装输出到 stderr 的 `tracing` subscriber，并设置最大级别
/// （`0` = 关闭，`1` = error，`2` = warn，`3` = info，`4` = debug，`5+` = trace）。
///
/// 若全局 subscriber 已被安装（无论是本函数还是宿主），返回 `false`。
pub extern "C" fn quad_export_renderer_init_logging(max_level: u32) -> bool {
    logging::init(logging::level_from_abi(max_level))
}
