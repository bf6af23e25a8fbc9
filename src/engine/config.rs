//! ### English
//! Renderer configuration assembled from C ABI scalars and flag bits.
//!
//! ### 中文
//! 由 C ABI 标量参数与标志位组装而成的渲染器配置。

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::error::ConfigError;
use crate::engine::flags;

/// ### English
/// Well-known path of the consumer process socket.
///
/// ### 中文
/// 消费者进程 socket 的约定路径。
pub const DEFAULT_SOCKET_PATH: &str = "/data/my_socket1";

/// ### English
/// Default texture edge (pixels).
///
/// ### 中文
/// 默认纹理边长（像素）。
pub const DEFAULT_TEXTURE_EDGE: u32 = 256;

/// ### English
/// Largest accepted texture edge (pixels). Matches the common `GL_MAX_TEXTURE_SIZE` ceiling.
///
/// ### 中文
/// 可接受的最大纹理边长（像素），与常见的 `GL_MAX_TEXTURE_SIZE` 上限一致。
pub const MAX_TEXTURE_EDGE: u32 = 16384;

#[cfg(target_os = "android")]
const DEFAULT_EGL_LIBRARY: &str = "libEGL.so";
#[cfg(not(target_os = "android"))]
const DEFAULT_EGL_LIBRARY: &str = "libEGL.so.1";

const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(16);

/// ### English
/// Everything the render thread needs to know before it starts.
///
/// ### 中文
/// 渲染线程启动前需要的全部配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// ### English
    /// Consumer socket path (stream-oriented Unix domain socket).
    ///
    /// ### 中文
    /// 消费者 socket 路径（面向流的 Unix 域 socket）。
    pub socket_path: PathBuf,
    /// ### English
    /// Edge length of the square animated texture. Must be even and at most
    /// `MAX_TEXTURE_EDGE`.
    ///
    /// ### 中文
    /// 方形动画纹理的边长，必须为偶数且不超过 `MAX_TEXTURE_EDGE`。
    pub texture_edge: u32,
    /// ### English
    /// `EGL_CONTEXT_CLIENT_VERSION` requested for the GLES context.
    ///
    /// ### 中文
    /// 创建 GLES 上下文时请求的 `EGL_CONTEXT_CLIENT_VERSION`。
    pub client_version: i32,
    /// ### English
    /// EGL shared library loaded on the render thread.
    ///
    /// ### 中文
    /// 在渲染线程上动态加载的 EGL 共享库。
    pub egl_library: PathBuf,
    /// ### English
    /// Period of the quadrant rotation.
    ///
    /// ### 中文
    /// 象限旋转的周期。
    pub rotate_interval: Duration,
    /// ### English
    /// Bounded park while no context is live; `None` means pure busy polling.
    ///
    /// ### 中文
    /// 无活动上下文时的有界 park 时长；`None` 表示纯忙轮询。
    pub idle_wait: Option<Duration>,
    /// ### English
    /// Whether the dma-buf handoff runs after each successful context creation.
    ///
    /// ### 中文
    /// 每次上下文创建成功后是否执行 dma-buf 交接。
    pub export_enabled: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            texture_edge: DEFAULT_TEXTURE_EDGE,
            client_version: 3,
            egl_library: PathBuf::from(DEFAULT_EGL_LIBRARY),
            rotate_interval: Duration::from_secs(1),
            idle_wait: Some(DEFAULT_IDLE_WAIT),
            export_enabled: true,
        }
    }
}

impl RendererConfig {
    /// ### English
    /// Builds a config from C ABI inputs. `None`/`0` fall back to defaults; unknown flag bits
    /// are ignored.
    ///
    /// ### 中文
    /// 由 C ABI 输入构建配置；`None`/`0` 使用默认值，未知标志位会被忽略。
    pub fn from_abi(socket_path: Option<PathBuf>, texture_edge: u32, flag_bits: u32) -> Self {
        let mut config = Self::default();
        if let Some(socket_path) = socket_path {
            config.socket_path = socket_path;
        }
        if texture_edge != 0 {
            config.texture_edge = texture_edge;
        }
        if flag_bits & flags::QUAD_EXPORT_FLAG_BUSY_POLL != 0 {
            config.idle_wait = None;
        }
        if flag_bits & flags::QUAD_EXPORT_FLAG_SKIP_EXPORT != 0 {
            config.export_enabled = false;
        }
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.texture_edge == 0 || self.texture_edge % 2 != 0 {
            return Err(ConfigError::InvalidTextureEdge(self.texture_edge));
        }
        if self.texture_edge > MAX_TEXTURE_EDGE {
            return Err(ConfigError::TextureEdgeTooLarge {
                edge: self.texture_edge,
                max: MAX_TEXTURE_EDGE,
            });
        }
        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptySocketPath);
        }
        if self.rotate_interval.is_zero() {
            return Err(ConfigError::ZeroRotateInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abi_defaults_match_default_config() {
        let config = RendererConfig::from_abi(None, 0, 0);
        assert_eq!(config, RendererConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_switch_off_parking_and_export() {
        let config = RendererConfig::from_abi(
            Some(PathBuf::from("/tmp/consumer.sock")),
            64,
            flags::QUAD_EXPORT_FLAG_BUSY_POLL | flags::QUAD_EXPORT_FLAG_SKIP_EXPORT,
        );
        assert_eq!(config.socket_path, PathBuf::from("/tmp/consumer.sock"));
        assert_eq!(config.texture_edge, 64);
        assert_eq!(config.idle_wait, None);
        assert!(!config.export_enabled);
    }

    #[test]
    fn odd_edge_is_rejected() {
        let config = RendererConfig::from_abi(None, 255, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTextureEdge(255))
        ));
    }

    #[test]
    fn oversized_edge_is_rejected() {
        for edge in [MAX_TEXTURE_EDGE + 2, 65536, u32::MAX - 1] {
            let config = RendererConfig::from_abi(None, edge, 0);
            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, ConfigError::TextureEdgeTooLarge { edge: e, max } if e == edge && max == MAX_TEXTURE_EDGE),
                "edge {edge}: {err}"
            );
        }
        assert!(RendererConfig::from_abi(None, MAX_TEXTURE_EDGE, 0).validate().is_ok());
    }

    #[test]
    fn empty_socket_path_is_rejected() {
        let config = RendererConfig {
            socket_path: PathBuf::new(),
            ..RendererConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptySocketPath)));
    }
}
