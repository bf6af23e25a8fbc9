//! ### English
//! Optional `tracing` subscriber installation for hosts that do not provide one.
//!
//! ### 中文
//! 为未自带订阅者的宿主提供可选的 `tracing` subscriber 安装。

use tracing::level_filters::LevelFilter;

/// ### English
/// Maps the C ABI level (`0` = off, `1` = error ... `5` = trace) to a filter.
///
/// ### 中文
/// 将 C ABI 的日志级别（`0` = 关闭，`1` = error … `5` = trace）映射为过滤器。
pub fn level_from_abi(level: u32) -> LevelFilter {
    match level {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        4 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// ### English
/// Installs a global fmt subscriber. Returns `false` if one was already installed.
///
/// ### 中文
/// 安装全局 fmt subscriber；若已安装过则返回 `false`。
pub fn init(max_level: LevelFilter) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
