//! ### English
//! EGL image wrapping a GL texture, and dma-buf export through `EGL_MESA_image_dma_buf_export`.
//!
//! ### 中文
//! 包装 GL 纹理的 EGL image，以及通过 `EGL_MESA_image_dma_buf_export` 导出 dma-buf。

use std::ffi::{c_int, c_void};
use std::os::fd::{FromRawFd as _, OwnedFd};

use khronos_egl as egl;
use tracing::{debug, warn};

use crate::engine::error::ExportError;
use crate::engine::rendering::EglBinding;

use super::metadata::BufferStorageMetadata;

const EGL_GL_TEXTURE_2D_KHR: egl::Enum = 0x30B1;
const MAX_PLANES: usize = 4;

const TEXTURE_IMAGE_EXTENSION: &str = "EGL_KHR_gl_texture_2D_image";
const DMA_BUF_EXPORT_EXTENSION: &str = "EGL_MESA_image_dma_buf_export";

type EglImageKhr = *mut c_void;

type CreateImageFn = unsafe extern "system" fn(
    display: *mut c_void,
    context: *mut c_void,
    target: egl::Enum,
    buffer: *mut c_void,
    attribs: *const egl::Int,
) -> EglImageKhr;
type DestroyImageFn = unsafe extern "system" fn(display: *mut c_void, image: EglImageKhr) -> egl::Boolean;
type ExportQueryFn = unsafe extern "system" fn(
    display: *mut c_void,
    image: EglImageKhr,
    fourcc: *mut c_int,
    num_planes: *mut c_int,
    modifiers: *mut u64,
) -> egl::Boolean;
type ExportFn = unsafe extern "system" fn(
    display: *mut c_void,
    image: EglImageKhr,
    fds: *mut c_int,
    strides: *mut egl::Int,
    offsets: *mut egl::Int,
) -> egl::Boolean;

/// ### English
/// Extension entry points resolved through `eglGetProcAddress` for one display.
///
/// ### 中文
/// 针对某个 display、通过 `eglGetProcAddress` 解析得到的扩展入口。
pub struct ImageExportApi {
    create_image: CreateImageFn,
    destroy_image: DestroyImageFn,
    export_query: ExportQueryFn,
    export: ExportFn,
}

impl ImageExportApi {
    /// ### English
    /// Checks the display extension string, then resolves the four entry points.
    ///
    /// ### 中文
    /// 先检查 display 的扩展字符串，再解析四个入口函数。
    pub fn load(binding: EglBinding<'_>) -> Result<Self, ExportError> {
        let extensions = binding
            .egl
            .query_string(Some(binding.display), egl::EXTENSIONS)
            .map_err(|code| ExportError::Egl {
                step: "eglQueryString(EGL_EXTENSIONS)",
                code: Some(code),
            })?
            .to_string_lossy()
            .into_owned();

        for required in [TEXTURE_IMAGE_EXTENSION, DMA_BUF_EXPORT_EXTENSION] {
            if !extensions.split_ascii_whitespace().any(|ext| ext == required) {
                warn!(extension = required, "EGL extension missing");
                return Err(ExportError::MissingExtension(required));
            }
        }

        let resolve = |name: &'static str| {
            binding
                .egl
                .get_proc_address(name)
                .ok_or(ExportError::MissingExtension(name))
        };

        // Function pointers of identical size; the signatures follow the Khronos registry.
        unsafe {
            Ok(Self {
                create_image: std::mem::transmute::<extern "system" fn(), CreateImageFn>(
                    resolve("eglCreateImageKHR")?,
                ),
                destroy_image: std::mem::transmute::<extern "system" fn(), DestroyImageFn>(
                    resolve("eglDestroyImageKHR")?,
                ),
                export_query: std::mem::transmute::<extern "system" fn(), ExportQueryFn>(
                    resolve("eglExportDMABUFImageQueryMESA")?,
                ),
                export: std::mem::transmute::<extern "system" fn(), ExportFn>(resolve(
                    "eglExportDMABUFImageMESA",
                )?),
            })
        }
    }
}

/// ### English
/// One exported plane: an owned dma-buf descriptor plus its storage metadata.
///
/// ### 中文
/// 一个导出的 plane：持有所有权的 dma-buf 描述符及其存储元数据。
#[derive(Debug)]
pub struct DmaBufPlane {
    pub fd: OwnedFd,
    pub metadata: BufferStorageMetadata,
}

/// ### English
/// EGL image created from a GL texture; destroyed on drop.
///
/// ### 中文
/// 由 GL 纹理创建的 EGL image；drop 时销毁。
pub struct EglImage<'a> {
    api: &'a ImageExportApi,
    binding: EglBinding<'a>,
    image: EglImageKhr,
}

impl<'a> EglImage<'a> {
    /// ### English
    /// `eglCreateImage(display, context, EGL_GL_TEXTURE_2D, texture, NULL)`.
    ///
    /// ### 中文
    /// `eglCreateImage(display, context, EGL_GL_TEXTURE_2D, texture, NULL)`。
    pub fn from_texture(
        api: &'a ImageExportApi,
        binding: EglBinding<'a>,
        texture: glow::Texture,
    ) -> Result<Self, ExportError> {
        let attribs = [egl::NONE];
        let image = unsafe {
            (api.create_image)(
                binding.display.as_ptr(),
                binding.context.as_ptr(),
                EGL_GL_TEXTURE_2D_KHR,
                texture.0.get() as usize as *mut c_void,
                attribs.as_ptr(),
            )
        };
        if image.is_null() {
            return Err(ExportError::Egl {
                step: "eglCreateImageKHR",
                code: binding.egl.get_error(),
            });
        }
        Ok(Self {
            api,
            binding,
            image,
        })
    }

    /// ### English
    /// Queries format/plane count/modifier and exports plane 0 as a dma-buf descriptor.
    ///
    /// Descriptors of any further planes are closed; the consumer protocol carries one plane.
    ///
    /// ### 中文
    /// 查询格式、plane 数量与 modifier，并将 plane 0 导出为 dma-buf 描述符。
    ///
    /// 其余 plane 的描述符会被关闭；消费者协议只承载一个 plane。
    pub fn export_plane(&self) -> Result<DmaBufPlane, ExportError> {
        let display = self.binding.display.as_ptr();

        let mut fourcc: c_int = 0;
        let mut num_planes: c_int = 0;
        let mut modifiers = [0u64; MAX_PLANES];
        let queried = unsafe {
            (self.api.export_query)(
                display,
                self.image,
                &mut fourcc,
                &mut num_planes,
                modifiers.as_mut_ptr(),
            )
        };
        if queried == egl::FALSE {
            return Err(ExportError::Egl {
                step: "eglExportDMABUFImageQueryMESA",
                code: self.binding.egl.get_error(),
            });
        }
        if !(1..=MAX_PLANES as c_int).contains(&num_planes) {
            return Err(ExportError::PlaneCount(num_planes));
        }

        let mut fds: [c_int; MAX_PLANES] = [-1; MAX_PLANES];
        let mut strides: [egl::Int; MAX_PLANES] = [0; MAX_PLANES];
        let mut offsets: [egl::Int; MAX_PLANES] = [0; MAX_PLANES];
        let exported = unsafe {
            (self.api.export)(
                display,
                self.image,
                fds.as_mut_ptr(),
                strides.as_mut_ptr(),
                offsets.as_mut_ptr(),
            )
        };

        // Take ownership right away so every descriptor is closed on all paths.
        let mut owned: Vec<OwnedFd> = fds[..num_planes as usize]
            .iter()
            .filter(|&&fd| fd >= 0)
            .map(|&fd| unsafe { OwnedFd::from_raw_fd(fd) })
            .collect();

        if exported == egl::FALSE {
            return Err(ExportError::Egl {
                step: "eglExportDMABUFImageMESA",
                code: self.binding.egl.get_error(),
            });
        }
        if fds[0] < 0 || owned.is_empty() {
            return Err(ExportError::Egl {
                step: "eglExportDMABUFImageMESA",
                code: None,
            });
        }
        if num_planes > 1 {
            debug!(num_planes, "closing descriptors of extra planes");
        }

        let fd = owned.swap_remove(0);
        Ok(DmaBufPlane {
            fd,
            metadata: BufferStorageMetadata::new(fourcc, modifiers[0], strides[0], offsets[0]),
        })
    }
}

impl Drop for EglImage<'_> {
    fn drop(&mut self) {
        let destroyed =
            unsafe { (self.api.destroy_image)(self.binding.display.as_ptr(), self.image) };
        if destroyed == egl::FALSE {
            warn!(code = ?self.binding.egl.get_error(), "eglDestroyImageKHR failed");
        }
    }
}
