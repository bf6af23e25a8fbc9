//! ### English
//! Single-slot, mutex-guarded message mailbox between control threads and the render thread.
//!
//! ### 中文
//! 控制线程与渲染线程之间的单槽、互斥锁保护的消息邮箱。

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::engine::platform::NativeWindow;

/// ### English
/// Pending control message. Newer messages overwrite older ones; there is no queue.
///
/// ### 中文
/// 待处理的控制消息；新消息覆盖旧消息，不排队。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMessage {
    #[default]
    None,
    /// ### English
    /// New host window; `None` means the surface is gone.
    ///
    /// ### 中文
    /// 新的宿主 window；`None` 表示 surface 已失效。
    WindowSet(Option<NativeWindow>),
    Exit,
}

pub(super) struct Mailbox {
    slot: Mutex<RenderMessage>,
}

impl Mailbox {
    pub(super) fn new() -> Self {
        Self {
            slot: Mutex::new(RenderMessage::None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RenderMessage> {
        // Plain data: a poisoned slot is still consistent.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// ### English
    /// Stores `message`, replacing whatever is pending. A pending `Exit` is never replaced.
    ///
    /// Returns `false` when the message was discarded because `Exit` is pending.
    ///
    /// ### 中文
    /// 写入 `message` 并覆盖待处理消息；已挂起的 `Exit` 不会被覆盖。
    ///
    /// 若因 `Exit` 挂起而丢弃该消息，返回 `false`。
    pub(super) fn post(&self, message: RenderMessage) -> bool {
        let mut slot = self.lock();
        if *slot == RenderMessage::Exit {
            return message == RenderMessage::Exit;
        }
        *slot = message;
        true
    }

    /// ### English
    /// Reads and clears the pending message. `Exit` stays in the slot once observed.
    ///
    /// ### 中文
    /// 读取并清空待处理消息；`Exit` 被读取后仍保留在槽中。
    pub(super) fn take(&self) -> RenderMessage {
        let mut slot = self.lock();
        match *slot {
            RenderMessage::Exit => RenderMessage::Exit,
            _ => std::mem::take(&mut *slot),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;

    use super::*;

    fn window(addr: usize) -> NativeWindow {
        NativeWindow::from_ptr(addr as *mut c_void).unwrap()
    }

    #[test]
    fn empty_mailbox_yields_none() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.take(), RenderMessage::None);
    }

    #[test]
    fn newest_message_wins_and_take_clears() {
        let mailbox = Mailbox::new();
        let first = window(0x1000);
        let second = window(0x2000);

        assert!(mailbox.post(RenderMessage::WindowSet(Some(first))));
        assert!(mailbox.post(RenderMessage::WindowSet(Some(second))));
        assert_eq!(mailbox.take(), RenderMessage::WindowSet(Some(second)));
        assert_eq!(mailbox.take(), RenderMessage::None);
    }

    #[test]
    fn exit_is_sticky() {
        let mailbox = Mailbox::new();
        assert!(mailbox.post(RenderMessage::Exit));
        assert!(!mailbox.post(RenderMessage::WindowSet(None)));
        assert_eq!(mailbox.take(), RenderMessage::Exit);
        assert_eq!(mailbox.take(), RenderMessage::Exit);
    }

    #[test]
    fn exit_overrides_pending_window() {
        let mailbox = Mailbox::new();
        mailbox.post(RenderMessage::WindowSet(Some(window(0x1000))));
        mailbox.post(RenderMessage::Exit);
        assert_eq!(mailbox.take(), RenderMessage::Exit);
    }
}
