//! ### English
//! EGL display/surface/context lifecycle bound to one host window.
//!
//! ### 中文
//! 绑定到单个宿主 window 的 EGL display/surface/context 生命周期。

use std::ffi::c_void;
use std::path::PathBuf;
use std::ptr;

use dpi::PhysicalSize;
use khronos_egl as egl;
use tracing::{debug, error, info, trace, warn};

use crate::engine::error::GraphicsError;
use crate::engine::platform::{self, NativeWindow};

/// ### English
/// EGL entry points loaded at runtime from the configured library.
///
/// ### 中文
/// 运行时从配置的库中加载的 EGL 入口。
pub type EglInstance = egl::DynamicInstance<egl::EGL1_4>;

const CONFIG_ATTRIBS: [egl::Int; 9] = [
    egl::SURFACE_TYPE,
    egl::WINDOW_BIT,
    egl::BLUE_SIZE,
    8,
    egl::GREEN_SIZE,
    8,
    egl::RED_SIZE,
    8,
    egl::NONE,
];

/// ### English
/// Points in `initialize` after which a new EGL object is live.
///
/// ### 中文
/// `initialize` 中新的 EGL 对象已生效的各个节点。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitStep {
    Display,
    Initialized,
    ConfigChosen,
    ContextCreated,
    SurfaceCreated,
    Current,
}

/// ### English
/// Borrowed view of the live EGL objects, handed to the export path.
///
/// ### 中文
/// 活动 EGL 对象的借用视图，提供给导出路径使用。
#[derive(Clone, Copy)]
pub struct EglBinding<'a> {
    pub egl: &'a EglInstance,
    pub display: egl::Display,
    pub context: egl::Context,
}

/// ### English
/// Owns the EGL display, window surface and GLES context, plus the `glow` function table
/// loaded for that context.
///
/// Either all three handles are live or all three are `None`; a partially built state only
/// exists inside `initialize` and is rolled back through `destroy` before returning.
/// Must only be used on the render thread.
///
/// ### 中文
/// 持有 EGL display、window surface 与 GLES context，以及为该上下文加载的 `glow` 函数表。
///
/// 三个句柄要么全部有效，要么全部为 `None`；部分构建的状态只存在于 `initialize` 内部，
/// 返回前会通过 `destroy` 回滚。只能在渲染线程使用。
pub struct GraphicsContext {
    egl_library: PathBuf,
    client_version: egl::Int,
    /// ### English
    /// Loaded lazily on the first `initialize` and kept for later re-initialization.
    ///
    /// ### 中文
    /// 首次 `initialize` 时懒加载，之后重复初始化时复用。
    egl: Option<EglInstance>,
    display: Option<egl::Display>,
    surface: Option<egl::Surface>,
    context: Option<egl::Context>,
    gl: Option<glow::Context>,
    size: PhysicalSize<u32>,
    #[cfg(test)]
    fail_after: Option<InitStep>,
}

impl GraphicsContext {
    pub fn new(egl_library: PathBuf, client_version: i32) -> Self {
        Self {
            egl_library,
            client_version,
            egl: None,
            display: None,
            surface: None,
            context: None,
            gl: None,
            size: PhysicalSize::new(0, 0),
            #[cfg(test)]
            fail_after: None,
        }
    }

    /// ### English
    /// Creates display, config, context and window surface for `window` and makes them current.
    ///
    /// Any failing step rolls back everything created so far; on error all handles are `None`.
    /// A context that is already live is destroyed first.
    ///
    /// ### 中文
    /// 为 `window` 创建 display、config、context 与 window surface，并设为 current。
    ///
    /// 任一步骤失败都会回滚已创建的对象；出错时所有句柄均为 `None`。
    /// 若已有活动上下文，会先将其销毁。
    pub fn initialize(&mut self, window: NativeWindow) -> Result<(), GraphicsError> {
        if self.is_valid() {
            self.destroy();
        }

        info!("initializing graphics context");
        let result = self.try_initialize(window);
        if let Err(err) = &result {
            error!(%err, "graphics context initialization failed");
            self.destroy();
        }
        result
    }

    fn try_initialize(&mut self, window: NativeWindow) -> Result<(), GraphicsError> {
        if self.egl.is_none() {
            let instance = unsafe { EglInstance::load_required_from_filename(&self.egl_library) }
                .map_err(|err| GraphicsError::LoadLibrary {
                    path: self.egl_library.clone(),
                    reason: format!("{err:?}"),
                })?;
            self.egl = Some(instance);
        }
        let Some(egl) = self.egl.as_ref() else {
            return Err(GraphicsError::NotCurrent);
        };

        let display =
            unsafe { egl.get_display(egl::DEFAULT_DISPLAY) }.ok_or(GraphicsError::NoDisplay)?;
        self.display = Some(display);
        self.reached(InitStep::Display)?;

        let (major, minor) = egl.initialize(display).map_err(|code| GraphicsError::Egl {
            step: "eglInitialize",
            code,
        })?;
        debug!(major, minor, "EGL display initialized");
        self.reached(InitStep::Initialized)?;

        let config = egl
            .choose_first_config(display, &CONFIG_ATTRIBS)
            .map_err(|code| GraphicsError::Egl {
                step: "eglChooseConfig",
                code,
            })?
            .ok_or(GraphicsError::NoConfig)?;
        self.reached(InitStep::ConfigChosen)?;

        let format = egl
            .get_config_attrib(display, config, egl::NATIVE_VISUAL_ID)
            .map_err(|code| GraphicsError::Egl {
                step: "eglGetConfigAttrib",
                code,
            })?;
        debug!(format, "native visual id");
        platform::set_buffers_format(window, format).map_err(GraphicsError::WindowGeometry)?;

        let context_attribs = [egl::CONTEXT_CLIENT_VERSION, self.client_version, egl::NONE];
        let context = egl
            .create_context(display, config, None, &context_attribs)
            .map_err(|code| GraphicsError::Egl {
                step: "eglCreateContext",
                code,
            })?;
        self.context = Some(context);
        self.reached(InitStep::ContextCreated)?;

        let surface = unsafe {
            egl.create_window_surface(
                display,
                config,
                window.as_ptr() as egl::NativeWindowType,
                None,
            )
        }
        .map_err(|code| GraphicsError::Egl {
            step: "eglCreateWindowSurface",
            code,
        })?;
        self.surface = Some(surface);
        self.reached(InitStep::SurfaceCreated)?;

        egl.make_current(display, Some(surface), Some(surface), Some(context))
            .map_err(|code| GraphicsError::Egl {
                step: "eglMakeCurrent",
                code,
            })?;
        self.reached(InitStep::Current)?;

        let query = |attribute| {
            egl.query_surface(display, surface, attribute)
                .map_err(|code| GraphicsError::Egl {
                    step: "eglQuerySurface",
                    code,
                })
        };
        let width = query(egl::WIDTH)?;
        let height = query(egl::HEIGHT)?;

        let gl = unsafe {
            glow::Context::from_loader_function(|name| {
                egl.get_proc_address(name)
                    .map_or(ptr::null(), |proc| proc as *const c_void)
            })
        };

        if let Ok(version) = egl.query_string(Some(display), egl::VERSION) {
            info!(
                egl_version = %version.to_string_lossy(),
                width,
                height,
                "graphics context ready"
            );
        }

        self.gl = Some(gl);
        self.size = PhysicalSize::new(width.max(0) as u32, height.max(0) as u32);
        Ok(())
    }

    fn reached(&self, step: InitStep) -> Result<(), GraphicsError> {
        #[cfg(test)]
        if self.fail_after == Some(step) {
            return Err(GraphicsError::Egl {
                step: "injected failure",
                code: egl::Error::BadAccess,
            });
        }
        trace!(?step, "graphics init step");
        Ok(())
    }

    /// ### English
    /// Unbinds and destroys context and surface, terminates the display and resets every
    /// handle to `None`. Idempotent; a no-op when nothing is live.
    ///
    /// Release failures are logged and otherwise ignored.
    ///
    /// ### 中文
    /// 解绑并销毁 context 与 surface，terminate display，并将所有句柄重置为 `None`。
    /// 幂等；没有活动对象时为 no-op。
    ///
    /// 释放失败仅记录日志。
    pub fn destroy(&mut self) {
        self.gl = None;
        self.size = PhysicalSize::new(0, 0);

        let display = self.display.take();
        let context = self.context.take();
        let surface = self.surface.take();

        let (Some(egl), Some(display)) = (self.egl.as_ref(), display) else {
            return;
        };

        info!("destroying graphics context");
        if let Err(code) = egl.make_current(display, None, None, None) {
            warn!(code = ?code, "eglMakeCurrent(EGL_NO_CONTEXT) failed");
        }
        if let Some(context) = context {
            if let Err(code) = egl.destroy_context(display, context) {
                warn!(code = ?code, "eglDestroyContext failed");
            }
        }
        if let Some(surface) = surface {
            if let Err(code) = egl.destroy_surface(display, surface) {
                warn!(code = ?code, "eglDestroySurface failed");
            }
        }
        if let Err(code) = egl.terminate(display) {
            warn!(code = ?code, "eglTerminate failed");
        }
    }

    pub fn is_valid(&self) -> bool {
        self.display.is_some() && self.surface.is_some() && self.context.is_some()
    }

    /// ### English
    /// Returns `true` when no handle at all is live (the only other legal state).
    ///
    /// ### 中文
    /// 当没有任何句柄有效时返回 `true`（唯一的另一种合法状态）。
    pub fn is_released(&self) -> bool {
        self.display.is_none() && self.surface.is_none() && self.context.is_none()
    }

    /// ### English
    /// GL function table of the current context, if any.
    ///
    /// ### 中文
    /// 当前上下文的 GL 函数表（若存在）。
    pub fn gl(&self) -> Option<&glow::Context> {
        self.gl.as_ref()
    }

    /// ### English
    /// Drawable size queried right after surface creation.
    ///
    /// ### 中文
    /// surface 创建后查询到的可绘制尺寸。
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn binding(&self) -> Option<EglBinding<'_>> {
        Some(EglBinding {
            egl: self.egl.as_ref()?,
            display: self.display?,
            context: self.context?,
        })
    }

    pub fn swap_buffers(&self) -> Result<(), GraphicsError> {
        let (Some(egl), Some(display), Some(surface)) =
            (self.egl.as_ref(), self.display, self.surface)
        else {
            return Err(GraphicsError::NotCurrent);
        };
        egl.swap_buffers(display, surface)
            .map_err(|code| GraphicsError::Egl {
                step: "eglSwapBuffers",
                code,
            })
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        self.destroy();
    }
}
