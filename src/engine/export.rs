//! ### English
//! Shared-texture handoff: texture -> EGL image -> dma-buf descriptor + metadata -> consumer
//! socket.
//!
//! ### 中文
//! 共享纹理交接：纹理 -> EGL image -> dma-buf 描述符 + 元数据 -> 消费者 socket。

mod image;
mod metadata;
mod shared_texture;
mod socket;

use std::os::fd::{AsFd as _, OwnedFd};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use glow::HasContext as _;
use tracing::{debug, info};

use crate::engine::error::ExportError;
use crate::engine::rendering::EglBinding;

pub use image::{DmaBufPlane, EglImage, ImageExportApi};
pub use metadata::{BufferStorageMetadata, WIRE_SIZE};
pub use shared_texture::SharedTexture;
pub use socket::{recv_with_fd, send_with_fd};

/// ### English
/// Sends exported buffers to the consumer listening on `socket_path`.
///
/// Every handoff opens a fresh connection and closes it (and the local descriptor) when done.
///
/// ### 中文
/// 将导出的缓冲发送给监听 `socket_path` 的消费者。
///
/// 每次交接都新建连接，完成后关闭连接以及本地描述符。
#[derive(Debug, Clone)]
pub struct BufferExportChannel {
    socket_path: PathBuf,
}

impl BufferExportChannel {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// ### English
    /// Exports `texture` as a dma-buf and hands it to the consumer.
    ///
    /// Requires the context in `binding` to be current. The EGL image lives only for the
    /// duration of the export; the texture itself is untouched and stays usable on failure.
    ///
    /// ### 中文
    /// 将 `texture` 导出为 dma-buf 并交给消费者。
    ///
    /// 要求 `binding` 中的上下文为 current。EGL image 仅在导出期间存在；纹理本身不受影响，
    /// 失败后仍可继续使用。
    pub fn export(
        &self,
        binding: EglBinding<'_>,
        gl: &glow::Context,
        texture: &SharedTexture,
    ) -> Result<BufferStorageMetadata, ExportError> {
        let api = ImageExportApi::load(binding)?;
        let image = EglImage::from_texture(&api, binding, texture.raw())?;

        // Texture contents must reach the image before the consumer maps it.
        unsafe { gl.flush() };

        let plane = image.export_plane()?;
        drop(image);

        let metadata = plane.metadata;
        debug!(
            fourcc = %metadata.fourcc(),
            modifier = metadata.modifier,
            stride = metadata.stride,
            offset = metadata.byte_offset,
            "dma-buf exported"
        );
        self.handoff(plane.fd, &metadata)?;
        Ok(metadata)
    }

    /// ### English
    /// Connects, sends `metadata` with `fd` attached in one message, then closes both.
    ///
    /// ### 中文
    /// 建立连接，用一条消息发送 `metadata` 并附带 `fd`，随后关闭两者。
    pub fn handoff(&self, fd: OwnedFd, metadata: &BufferStorageMetadata) -> Result<(), ExportError> {
        let stream =
            UnixStream::connect(&self.socket_path).map_err(|source| ExportError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;
        send_with_fd(&stream, fd.as_fd(), &metadata.encode()).map_err(ExportError::Send)?;
        info!(socket = %self.socket_path.display(), "buffer handed off to consumer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::{Read as _, Seek as _, SeekFrom, Write as _};
    use std::os::unix::net::UnixListener;
    use std::thread;

    use super::*;

    #[test]
    fn handoff_delivers_metadata_and_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consumer.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let consumer = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut payload = [0u8; WIRE_SIZE];
            let (len, fd) = recv_with_fd(&stream, &mut payload).unwrap();
            assert_eq!(len, WIRE_SIZE);
            (
                BufferStorageMetadata::decode(&payload).unwrap(),
                fd.expect("descriptor attached"),
            )
        });

        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"texels").unwrap();
        let sent = BufferStorageMetadata::new(0x3432_4142, 0, 1024, 0);

        let channel = BufferExportChannel::new(&path);
        channel.handoff(OwnedFd::from(file), &sent).unwrap();

        let (received, fd) = consumer.join().unwrap();
        assert_eq!(received, sent);

        let mut received_file = File::from(fd);
        received_file.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = Vec::new();
        received_file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"texels");
    }

    #[test]
    fn missing_consumer_reports_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nobody-listens.sock");

        let channel = BufferExportChannel::new(&path);
        let file = tempfile::tempfile().unwrap();
        let err = channel
            .handoff(OwnedFd::from(file), &BufferStorageMetadata::default())
            .unwrap_err();
        match err {
            ExportError::Connect { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
