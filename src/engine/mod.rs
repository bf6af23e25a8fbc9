/// ### English
/// Engine internal modules (render thread, graphics context, scene, texture export).
///
/// ### 中文
/// 引擎内部模块（渲染线程、图形上下文、场景、纹理导出）。
pub mod config;
pub mod error;
pub mod export;
pub mod flags;
pub mod logging;
pub mod platform;
pub mod rendering;
pub mod runtime;
pub mod texture;

pub use config::RendererConfig;
pub use error::RenderError;
pub use runtime::{ControllerState, RenderThreadController};
