/// ### English
/// `quad_export_renderer` crate root.
/// Exposes the C ABI via `ffi`; the render thread, EGL/GL code and the dma-buf handoff live
/// under `engine`.
///
/// ### 中文
/// `quad_export_renderer` 的 crate 根。
/// 通过 `ffi` 导出 C ABI；渲染线程、EGL/GL 代码以及 dma-buf 交接位于 `engine` 模块。
pub mod engine;
mod ffi;
