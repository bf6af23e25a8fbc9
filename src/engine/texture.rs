//! ### English
//! Procedurally generated four-quadrant RGBA texture and its in-place quadrant rotation.
//!
//! ### 中文
//! 程序生成的四象限 RGBA 纹理，以及其原地象限旋转。

use crate::engine::config::MAX_TEXTURE_EDGE;
use crate::engine::error::TextureError;

/// ### English
/// One RGBA8 pixel in memory order (`R, G, B, A`).
///
/// ### 中文
/// 一个按内存顺序（`R, G, B, A`）存放的 RGBA8 像素。
pub type Rgba8 = [u8; 4];

pub const RED: Rgba8 = [0xFF, 0x00, 0x00, 0xFF];
pub const GREEN: Rgba8 = [0x00, 0xFF, 0x00, 0xFF];
pub const BLUE: Rgba8 = [0x00, 0x00, 0xFF, 0xFF];
pub const WHITE: Rgba8 = [0xFF, 0xFF, 0xFF, 0xFF];

/// ### English
/// Quadrant of the square texture.
///
/// ### 中文
/// 方形纹理的象限。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// ### English
/// Owns the `edge × edge` pixel buffer uploaded to the shared texture.
///
/// The buffer outlives graphics contexts: it is created once per renderer and keeps its
/// rotation state across context recreation. Only the render thread mutates it.
///
/// Initial layout:
/// ```text
/// R G
/// B W
/// ```
///
/// ### 中文
/// 持有上传到共享纹理的 `edge × edge` 像素缓冲。
///
/// 该缓冲的生命周期长于图形上下文：每个渲染器只创建一次，上下文重建时保留旋转状态；
/// 只有渲染线程会修改它。
pub struct TextureAnimator {
    edge: usize,
    pixels: Vec<Rgba8>,
}

impl TextureAnimator {
    /// ### English
    /// Allocates and paints the four quadrants. `edge` must be non-zero, even and at most
    /// `MAX_TEXTURE_EDGE`. Allocation failure is reported, never a panic.
    ///
    /// ### 中文
    /// 分配缓冲并绘制四个象限；`edge` 必须为非零偶数且不超过 `MAX_TEXTURE_EDGE`。
    /// 分配失败以错误返回，不会 panic。
    pub fn new(edge: u32) -> Result<Self, TextureError> {
        if edge == 0 || edge % 2 != 0 {
            return Err(TextureError::InvalidEdge(edge));
        }
        if edge > MAX_TEXTURE_EDGE {
            return Err(TextureError::TooLarge(edge));
        }

        let len = (edge as usize)
            .checked_mul(edge as usize)
            .ok_or(TextureError::TooLarge(edge))?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| TextureError::TooLarge(edge))?;

        let edge = edge as usize;
        let half = edge / 2;
        pixels.extend((0..len).map(|i| {
            let (x, y) = (i % edge, i / edge);
            match (x < half, y < half) {
                (true, true) => RED,
                (false, true) => GREEN,
                (true, false) => BLUE,
                (false, false) => WHITE,
            }
        }));

        Ok(Self { edge, pixels })
    }

    pub fn edge(&self) -> u32 {
        self.edge as u32
    }

    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// ### English
    /// Raw RGBA8 bytes, row-major, ready for `glTexSubImage2D`.
    ///
    /// ### 中文
    /// 行优先的 RGBA8 原始字节，可直接用于 `glTexSubImage2D`。
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// ### English
    /// Pixel at `(x, y)`, or `None` outside the buffer.
    ///
    /// ### 中文
    /// `(x, y)` 处的像素；越界时返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        let (x, y) = (x as usize, y as usize);
        if x >= self.edge || y >= self.edge {
            return None;
        }
        Some(self.pixels[y * self.edge + x])
    }

    /// ### English
    /// Color at the origin of `quadrant` (quadrants are uniform, so any pixel would do).
    ///
    /// ### 中文
    /// `quadrant` 起点处的颜色（象限内颜色一致，任取一点即可）。
    pub fn quadrant_color(&self, quadrant: Quadrant) -> Rgba8 {
        let half = self.edge / 2;
        let (x, y) = match quadrant {
            Quadrant::TopLeft => (0, 0),
            Quadrant::TopRight => (half, 0),
            Quadrant::BottomLeft => (0, half),
            Quadrant::BottomRight => (half, half),
        };
        self.pixels[y * self.edge + x]
    }

    /// ### English
    /// Rotates the quadrant layout one step clockwise, in place.
    ///
    /// For each of the `edge² / 4` positions in the top-left quadrant, the four corresponding
    /// pixels are cycled `TL ← BL ← BR ← TR ← TL`. Four calls restore the buffer bit for bit.
    ///
    /// ### 中文
    /// 原地将象限布局顺时针旋转一步。
    ///
    /// 对左上象限中的 `edge² / 4` 个位置，依次循环交换四个对应像素
    /// `TL ← BL ← BR ← TR ← TL`；调用四次后缓冲逐位还原。
    pub fn rotate(&mut self) {
        let edge = self.edge;
        let half = edge / 2;

        for y in 0..half {
            for x in 0..half {
                let top_left = y * edge + x;
                let top_right = top_left + half;
                let bottom_left = top_left + half * edge;
                let bottom_right = bottom_left + half;

                let saved = self.pixels[top_left];
                self.pixels[top_left] = self.pixels[bottom_left];
                self.pixels[bottom_left] = self.pixels[bottom_right];
                self.pixels[bottom_right] = self.pixels[top_right];
                self.pixels[top_right] = saved;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(animator: &TextureAnimator) -> [Rgba8; 4] {
        [
            animator.quadrant_color(Quadrant::TopLeft),
            animator.quadrant_color(Quadrant::TopRight),
            animator.quadrant_color(Quadrant::BottomLeft),
            animator.quadrant_color(Quadrant::BottomRight),
        ]
    }

    #[test]
    fn rejects_odd_and_zero_edges() {
        assert!(matches!(
            TextureAnimator::new(0),
            Err(TextureError::InvalidEdge(0))
        ));
        assert!(matches!(
            TextureAnimator::new(7),
            Err(TextureError::InvalidEdge(7))
        ));
    }

    #[test]
    fn rejects_edges_beyond_the_maximum() {
        for edge in [MAX_TEXTURE_EDGE + 2, 65536, u32::MAX - 1] {
            assert!(
                matches!(TextureAnimator::new(edge), Err(TextureError::TooLarge(e)) if e == edge),
                "edge {edge}"
            );
        }
    }

    #[test]
    fn pixel_outside_the_buffer_is_none() {
        let animator = TextureAnimator::new(4).unwrap();
        assert_eq!(animator.pixel(3, 3), Some(WHITE));
        assert_eq!(animator.pixel(4, 0), None);
        assert_eq!(animator.pixel(0, 4), None);
        assert_eq!(animator.pixel(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn initial_quadrants_are_uniform() {
        let animator = TextureAnimator::new(256).unwrap();
        assert_eq!(animator.pixels().len(), 256 * 256);
        assert_eq!(layout(&animator), [RED, GREEN, BLUE, WHITE]);

        for y in 0..256 {
            for x in 0..256 {
                let expected = match (x < 128, y < 128) {
                    (true, true) => RED,
                    (false, true) => GREEN,
                    (true, false) => BLUE,
                    (false, false) => WHITE,
                };
                assert_eq!(animator.pixel(x, y), Some(expected), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn one_rotation_moves_bottom_left_into_top_left() {
        let mut animator = TextureAnimator::new(256).unwrap();
        animator.rotate();
        assert_eq!(layout(&animator), [BLUE, RED, WHITE, GREEN]);
    }

    #[test]
    fn four_rotations_restore_the_buffer() {
        for edge in [2, 4, 10, 64, 256] {
            let mut animator = TextureAnimator::new(edge).unwrap();
            let original = animator.as_bytes().to_vec();
            for _ in 0..4 {
                animator.rotate();
            }
            assert_eq!(animator.as_bytes(), original.as_slice(), "edge {edge}");
        }
    }

    #[test]
    fn colors_permute_without_blending() {
        let mut animator = TextureAnimator::new(16).unwrap();
        for _ in 0..3 {
            animator.rotate();
            let mut colors = layout(&animator);
            colors.sort();
            let mut expected = [RED, GREEN, BLUE, WHITE];
            expected.sort();
            assert_eq!(colors, expected);
        }
    }

    #[test]
    fn bytes_are_rgba_in_memory_order() {
        let animator = TextureAnimator::new(2).unwrap();
        assert_eq!(&animator.as_bytes()[..4], &[0xFF, 0x00, 0x00, 0xFF]);
    }
}
