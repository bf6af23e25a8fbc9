//! ### English
//! Fixed-layout storage metadata record sent alongside the exported dma-buf descriptor.
//!
//! ### 中文
//! 与导出的 dma-buf 描述符一同发送的定长存储元数据记录。

use bytemuck::{Pod, Zeroable};

/// ### English
/// Size of the record on the wire (LP64 / AArch64 C layout).
///
/// ### 中文
/// 记录在线上的字节数（LP64 / AArch64 的 C 布局）。
pub const WIRE_SIZE: usize = 24;

/// ### English
/// `(format, modifier, stride, offset)` describing how to interpret the exported memory.
///
/// Layout matches the consumer's C struct
/// `{ int fourcc; uint64_t modifier; int stride; int offset; }`, including the 4 bytes of
/// padding the C compiler inserts before `modifier`.
///
/// ### 中文
/// 描述如何解释导出内存的 `(format, modifier, stride, offset)`。
///
/// 布局与消费者端的 C 结构体
/// `{ int fourcc; uint64_t modifier; int stride; int offset; }` 一致，
/// 包括 C 编译器在 `modifier` 之前插入的 4 字节填充。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct BufferStorageMetadata {
    /// ### English
    /// DRM fourcc pixel format (e.g. `AB24` = `0x34324142`).
    ///
    /// ### 中文
    /// DRM fourcc 像素格式（例如 `AB24` = `0x34324142`）。
    pub format_id: i32,
    _padding: u32,
    /// ### English
    /// Vendor tiling/compression modifier.
    ///
    /// ### 中文
    /// 厂商 tiling/压缩 modifier。
    pub modifier: u64,
    pub stride: i32,
    pub byte_offset: i32,
}

const _: () = assert!(size_of::<BufferStorageMetadata>() == WIRE_SIZE);

impl BufferStorageMetadata {
    pub fn new(format_id: i32, modifier: u64, stride: i32, byte_offset: i32) -> Self {
        Self {
            format_id,
            _padding: 0,
            modifier,
            stride,
            byte_offset,
        }
    }

    pub fn encode(&self) -> [u8; WIRE_SIZE] {
        bytemuck::cast(*self)
    }

    /// ### English
    /// Decodes a received record. Returns `None` unless exactly `WIRE_SIZE` bytes are given.
    ///
    /// ### 中文
    /// 解码收到的记录；仅当输入恰好为 `WIRE_SIZE` 字节时返回 `Some`。
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != WIRE_SIZE {
            return None;
        }
        let mut record: Self = bytemuck::pod_read_unaligned(bytes);
        record._padding = 0;
        Some(record)
    }

    /// ### English
    /// Printable fourcc (`"AB24"`), for logs.
    ///
    /// ### 中文
    /// 可打印的 fourcc（如 `"AB24"`），用于日志。
    pub fn fourcc(&self) -> String {
        self.format_id
            .to_le_bytes()
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '?' })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_through_the_wire_bytes() {
        let sent = BufferStorageMetadata::new(0x3432_4142, 0, 1024, 0);
        let bytes = sent.encode();
        assert_eq!(bytes.len(), WIRE_SIZE);

        let received = BufferStorageMetadata::decode(&bytes).unwrap();
        assert_eq!(received.format_id, 0x3432_4142);
        assert_eq!(received.modifier, 0);
        assert_eq!(received.stride, 1024);
        assert_eq!(received.byte_offset, 0);
        assert_eq!(received, sent);
    }

    #[test]
    fn fields_sit_at_c_offsets() {
        let record = BufferStorageMetadata::new(1, 0x0102_0304_0506_0708, 3, 4);
        let bytes = record.encode();
        assert_eq!(&bytes[0..4], &1i32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &[0; 4]);
        assert_eq!(&bytes[8..16], &0x0102_0304_0506_0708u64.to_ne_bytes());
        assert_eq!(&bytes[16..20], &3i32.to_ne_bytes());
        assert_eq!(&bytes[20..24], &4i32.to_ne_bytes());
    }

    #[test]
    fn short_or_long_input_is_rejected() {
        assert!(BufferStorageMetadata::decode(&[0; WIRE_SIZE - 1]).is_none());
        assert!(BufferStorageMetadata::decode(&[0; WIRE_SIZE + 1]).is_none());
    }

    #[test]
    fn fourcc_is_printable() {
        let record = BufferStorageMetadata::new(0x3432_4142, 0, 1024, 0);
        assert_eq!(record.fourcc(), "AB24");
    }
}
