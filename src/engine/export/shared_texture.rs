//! ### English
//! GL texture holding the animated pixels; the object that gets exported as a dma-buf.
//!
//! ### 中文
//! 存放动画像素的 GL 纹理；即被导出为 dma-buf 的对象。

use glow::HasContext as _;
use tracing::debug;

use crate::engine::error::ExportError;
use crate::engine::rendering::take_gl_error;
use crate::engine::texture::TextureAnimator;

/// ### English
/// Immutable-storage RGBA8 texture of `edge x edge` pixels.
///
/// Created and deleted on the render thread with the owning context current.
///
/// ### 中文
/// `edge x edge` 像素的不可变存储 RGBA8 纹理。
///
/// 在渲染线程上、所属上下文为 current 时创建与删除。
pub struct SharedTexture {
    texture: glow::Texture,
    edge: i32,
}

impl SharedTexture {
    /// ### English
    /// Allocates storage, uploads the current pixels and sets nearest filtering.
    /// The texture stays bound to `TEXTURE_2D`.
    ///
    /// ### 中文
    /// 分配存储、上传当前像素并设置最近邻过滤；纹理保持绑定在 `TEXTURE_2D` 上。
    pub fn create(gl: &glow::Context, pixels: &TextureAnimator) -> Result<Self, ExportError> {
        let edge = i32::try_from(pixels.edge()).map_err(|_| {
            ExportError::CreateTexture(format!("edge {} exceeds GLsizei", pixels.edge()))
        })?;
        let texture = unsafe { gl.create_texture() }.map_err(ExportError::CreateTexture)?;
        let shared = Self { texture, edge };

        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_storage_2d(glow::TEXTURE_2D, 1, glow::RGBA8, edge, edge);
            if let Some(code) = take_gl_error(gl) {
                shared.delete(gl);
                return Err(ExportError::Gl {
                    step: "glTexStorage2D",
                    code,
                });
            }

            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );
        }

        if let Some(code) = shared.upload(gl, pixels) {
            shared.delete(gl);
            return Err(ExportError::Gl {
                step: "glTexSubImage2D",
                code,
            });
        }

        debug!(edge, "shared texture created");
        Ok(shared)
    }

    /// ### English
    /// Replaces the whole image with `pixels`. Returns the first pending GL error, if any.
    ///
    /// ### 中文
    /// 用 `pixels` 替换整张图像；返回首个待处理的 GL 错误（若有）。
    pub fn upload(&self, gl: &glow::Context, pixels: &TextureAnimator) -> Option<u32> {
        debug_assert_eq!(i32::try_from(pixels.edge()).ok(), Some(self.edge));
        let edge = self.edge;
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                edge,
                edge,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels.as_bytes())),
            );
            take_gl_error(gl)
        }
    }

    pub fn raw(&self) -> glow::Texture {
        self.texture
    }

    pub fn delete(self, gl: &glow::Context) {
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.delete_texture(self.texture);
        }
    }
}
