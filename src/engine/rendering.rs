//! ### English
//! Rendering module entry point.
//! Splits the EGL context lifecycle, the textured-quad scene and the per-window frame driver
//! into submodules.
//!
//! ### 中文
//! 渲染模块入口。
//! 将 EGL 上下文生命周期、带纹理四边形场景以及按 window 的帧驱动拆分到子模块。

mod context;
mod renderer;
mod scene;

pub use context::{EglBinding, EglInstance, GraphicsContext};
pub use renderer::QuadRenderer;
pub use scene::SceneRenderer;

pub(crate) use scene::take_gl_error;
