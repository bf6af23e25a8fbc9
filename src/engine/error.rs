//! ### English
//! Error types for every setup stage of the renderer.
//!
//! Setup errors are reported to the render loop, logged, and leave the engine in a defined
//! "no active context" state. Nothing here terminates the process.
//!
//! ### 中文
//! 渲染器各个初始化阶段的错误类型。
//!
//! 初始化错误会返回给渲染循环并记录日志，引擎随后停留在确定的“无活动上下文”状态；
//! 这里的任何错误都不会终止进程。

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use khronos_egl as egl;

/// ### English
/// Invalid `RendererConfig` values.
///
/// ### 中文
/// 非法的 `RendererConfig` 取值。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("texture edge must be a non-zero even number, got {0}")]
    InvalidTextureEdge(u32),
    #[error("texture edge {edge} exceeds the maximum of {max}")]
    TextureEdgeTooLarge { edge: u32, max: u32 },
    #[error("socket path must not be empty")]
    EmptySocketPath,
    #[error("rotate interval must be non-zero")]
    ZeroRotateInterval,
}

/// ### English
/// Texture buffer construction errors.
///
/// ### 中文
/// 纹理缓冲构造错误。
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture edge must be a non-zero even number, got {0}")]
    InvalidEdge(u32),
    #[error("texture edge {0} is too large for a pixel buffer")]
    TooLarge(u32),
}

/// ### English
/// EGL context/surface creation errors. Each variant names the failing step; `code` is the
/// EGL error reported for that step.
///
/// ### 中文
/// EGL 上下文/surface 创建错误。每个变体对应失败的步骤；`code` 为该步骤的 EGL 错误码。
#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("failed to load EGL library {path}: {reason}")]
    LoadLibrary { path: PathBuf, reason: String },
    #[error("eglGetDisplay returned EGL_NO_DISPLAY")]
    NoDisplay,
    #[error("{step} failed: {code}")]
    Egl {
        step: &'static str,
        code: egl::Error,
    },
    #[error("eglChooseConfig found no 8-bit RGB window config")]
    NoConfig,
    #[error("ANativeWindow_setBuffersGeometry failed with status {0}")]
    WindowGeometry(i32),
    #[error("graphics context is not current")]
    NotCurrent,
}

/// ### English
/// Shader compile/link failures (carries the driver diagnostic log).
///
/// ### 中文
/// 着色器编译/链接失败（携带驱动诊断日志）。
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to create {kind} object: {reason}")]
    Create { kind: &'static str, reason: String },
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: &'static str, log: String },
    #[error("program failed to link:\n{log}")]
    Link { log: String },
}

/// ### English
/// Errors of the shared-texture export handoff.
///
/// ### 中文
/// 共享纹理导出交接过程中的错误。
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create texture: {0}")]
    CreateTexture(String),
    #[error("GL error {code:#06x} after {step}")]
    Gl { step: &'static str, code: u32 },
    #[error("EGL extension {0} is not available")]
    MissingExtension(&'static str),
    #[error("{step} failed: {code:?}")]
    Egl {
        step: &'static str,
        code: Option<egl::Error>,
    },
    #[error("image reports {0} planes (expected 1..=4)")]
    PlaneCount(i32),
    #[error("failed to connect to consumer socket {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to send descriptor to consumer: {0}")]
    Send(#[source] io::Error),
}

/// ### English
/// Umbrella error returned by the render-thread frame driver.
///
/// ### 中文
/// 渲染线程 frame driver 返回的汇总错误。
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[source] io::Error),
}
