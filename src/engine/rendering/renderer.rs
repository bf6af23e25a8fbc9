//! ### English
//! Frame driver owning everything the render thread touches for one host window.
//!
//! ### 中文
//! 帧驱动：持有渲染线程针对单个宿主 window 所操作的全部对象。

use glow::HasContext as _;
use tracing::{error, info, warn};

use crate::engine::config::RendererConfig;
use crate::engine::error::{GraphicsError, RenderError};
use crate::engine::export::{BufferExportChannel, SharedTexture};
use crate::engine::platform::NativeWindow;
use crate::engine::runtime::FrameDriver;
use crate::engine::texture::TextureAnimator;

use super::context::GraphicsContext;
use super::scene::SceneRenderer;

/// ### English
/// Consecutive per-frame GL errors are logged on the first occurrence and then every N frames.
///
/// ### 中文
/// 连续的逐帧 GL 错误：首次记录，之后每 N 帧记录一次。
const FRAME_ERROR_LOG_EVERY: u64 = 600;

/// ### English
/// Graphics context + scene + shared texture + animator, driven by the render loop.
///
/// The animator outlives context recreation; scene and texture are rebuilt for every new
/// context and deleted before it is destroyed.
///
/// ### 中文
/// 图形上下文 + 场景 + 共享纹理 + 动画器，由渲染循环驱动。
///
/// 动画器跨越上下文重建而存活；场景与纹理随每个新上下文重建，并在上下文销毁前删除。
pub struct QuadRenderer {
    context: GraphicsContext,
    scene: Option<SceneRenderer>,
    texture: Option<SharedTexture>,
    animator: TextureAnimator,
    export: Option<BufferExportChannel>,
    frame_errors: u64,
}

impl QuadRenderer {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        config.validate()?;
        Ok(Self {
            context: GraphicsContext::new(config.egl_library.clone(), config.client_version),
            scene: None,
            texture: None,
            animator: TextureAnimator::new(config.texture_edge)?,
            export: config
                .export_enabled
                .then(|| BufferExportChannel::new(config.socket_path.clone())),
            frame_errors: 0,
        })
    }

    fn setup(&mut self, window: NativeWindow) -> Result<(), RenderError> {
        self.context.initialize(window)?;
        let Some(gl) = self.context.gl() else {
            return Err(GraphicsError::NotCurrent.into());
        };

        let size = self.context.size();
        unsafe { gl.viewport(0, 0, size.width as i32, size.height as i32) };

        self.scene = Some(SceneRenderer::new(gl)?);
        let texture = self.texture.insert(SharedTexture::create(gl, &self.animator)?);

        if let (Some(channel), Some(binding)) = (&self.export, self.context.binding()) {
            channel.export(binding, gl, texture)?;
        }
        Ok(())
    }

    fn record_frame_error(&mut self, what: &'static str, detail: &dyn std::fmt::Display) {
        self.frame_errors += 1;
        if self.frame_errors == 1 || self.frame_errors % FRAME_ERROR_LOG_EVERY == 0 {
            warn!(
                what,
                %detail,
                consecutive = self.frame_errors,
                "frame error"
            );
        }
    }
}

impl FrameDriver for QuadRenderer {
    fn attach_window(&mut self, window: Option<NativeWindow>) -> Result<(), RenderError> {
        if !self.context.is_released() {
            self.detach();
        }
        let Some(window) = window else {
            info!("window removed; render thread idle");
            return Ok(());
        };

        match self.setup(window) {
            Ok(()) => {
                info!(edge = self.animator.edge(), "renderer attached");
                Ok(())
            }
            // The local render path keeps working without a consumer.
            Err(err @ RenderError::Export(_)) if self.is_active() && self.texture.is_some() => {
                error!(%err, "buffer export failed; rendering locally only");
                Err(err)
            }
            Err(err) => {
                self.detach();
                Err(err)
            }
        }
    }

    fn is_active(&self) -> bool {
        self.context.is_valid() && self.scene.is_some()
    }

    fn draw_frame(&mut self) {
        let (Some(gl), Some(scene)) = (self.context.gl(), self.scene.as_ref()) else {
            return;
        };
        let drawn = scene.draw_frame(gl, self.texture.as_ref().map(SharedTexture::raw));
        let swapped = self.context.swap_buffers();

        match (drawn, swapped) {
            (None, Ok(())) => self.frame_errors = 0,
            (Some(code), _) => {
                self.record_frame_error("draw", &format_args!("GL error {code:#06x}"))
            }
            (None, Err(err)) => self.record_frame_error("swap", &err),
        }
    }

    fn advance_animation(&mut self) {
        self.animator.rotate();
        let (Some(gl), Some(texture)) = (self.context.gl(), self.texture.as_ref()) else {
            return;
        };
        if let Some(code) = texture.upload(gl, &self.animator) {
            self.record_frame_error("upload", &format_args!("GL error {code:#06x}"));
        }
    }

    fn detach(&mut self) {
        match self.context.gl() {
            Some(gl) => {
                if let Some(scene) = self.scene.take() {
                    scene.delete(gl);
                }
                if let Some(texture) = self.texture.take() {
                    texture.delete(gl);
                }
            }
            None => {
                self.scene = None;
                self.texture = None;
            }
        }
        self.frame_errors = 0;
        self.context.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;
    use std::path::PathBuf;
    use std::ptr::NonNull;

    use super::*;

    fn offline_config() -> RendererConfig {
        RendererConfig {
            egl_library: PathBuf::from("/nonexistent/libEGL-missing.so"),
            ..RendererConfig::default()
        }
    }

    #[test]
    fn invalid_edge_is_rejected_up_front() {
        let config = RendererConfig {
            texture_edge: 7,
            ..offline_config()
        };
        assert!(matches!(
            QuadRenderer::new(&config),
            Err(RenderError::Config(_))
        ));
    }

    #[test]
    fn removing_a_window_that_never_attached_is_harmless() {
        let mut renderer = QuadRenderer::new(&offline_config()).unwrap();
        renderer.attach_window(None).unwrap();
        assert!(!renderer.is_active());
        renderer.draw_frame();
        renderer.detach();
        assert!(!renderer.is_active());
    }

    #[test]
    fn failed_attach_leaves_renderer_idle() {
        let mut renderer = QuadRenderer::new(&offline_config()).unwrap();
        let window = NativeWindow::from_ptr(NonNull::<c_void>::dangling().as_ptr()).unwrap();
        let err = renderer.attach_window(Some(window)).unwrap_err();
        assert!(matches!(err, RenderError::Graphics(_)));
        assert!(!renderer.is_active());
        assert!(renderer.context.is_released());
    }

    #[test]
    fn animation_advances_without_a_context() {
        let mut renderer = QuadRenderer::new(&offline_config()).unwrap();
        let before = renderer.animator.pixels().to_vec();
        renderer.advance_animation();
        assert_ne!(renderer.animator.pixels(), &before[..]);
        for _ in 0..3 {
            renderer.advance_animation();
        }
        assert_eq!(renderer.animator.pixels(), &before[..]);
    }
}
