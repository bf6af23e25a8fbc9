//! ### English
//! Descriptor passing over Unix domain sockets (`SCM_RIGHTS` ancillary data).
//!
//! One message = one inline payload + exactly one descriptor; there is no extra framing.
//!
//! ### 中文
//! 通过 Unix 域 socket 传递文件描述符（`SCM_RIGHTS` 辅助数据）。
//!
//! 一条消息 = 一段内联载荷 + 恰好一个描述符；没有额外的分帧。

use std::ffi::c_void;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd as _, BorrowedFd, FromRawFd as _, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;
use std::ptr;

/// ### English
/// Control buffer large enough for a few descriptors, aligned for `cmsghdr`.
///
/// ### 中文
/// 足以容纳少量描述符的控制缓冲，按 `cmsghdr` 对齐。
#[repr(C, align(8))]
struct ControlBuffer([u8; 64]);

fn fd_space() -> usize {
    unsafe { libc::CMSG_SPACE(mem::size_of::<RawFd>() as libc::c_uint) as usize }
}

/// ### English
/// Sends `payload` as inline data and a duplicate of `fd` as `SCM_RIGHTS` in one `sendmsg`.
///
/// The whole payload must go out in that single message; a short write is an error.
///
/// ### 中文
/// 通过一次 `sendmsg` 发送内联数据 `payload`，并以 `SCM_RIGHTS` 附带 `fd` 的副本。
///
/// 整个载荷必须在这一条消息中发出；部分写入视为错误。
pub fn send_with_fd(stream: &UnixStream, fd: BorrowedFd<'_>, payload: &[u8]) -> io::Result<()> {
    let mut control = ControlBuffer([0; 64]);
    let space = fd_space();

    let mut iov = libc::iovec {
        iov_base: payload.as_ptr() as *mut c_void,
        iov_len: payload.len(),
    };
    let mut msg: libc::msghdr = unsafe { mem::zeroed() };
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;
    msg.msg_control = control.0.as_mut_ptr().cast();
    msg.msg_controllen = space as _;

    unsafe {
        let cmsg = libc::CMSG_FIRSTHDR(&msg);
        if cmsg.is_null() {
            return Err(io::Error::other("control buffer too small"));
        }
        (*cmsg).cmsg_level = libc::SOL_SOCKET;
        (*cmsg).cmsg_type = libc::SCM_RIGHTS;
        (*cmsg).cmsg_len = libc::CMSG_LEN(mem::size_of::<RawFd>() as libc::c_uint) as _;
        ptr::write_unaligned(libc::CMSG_DATA(cmsg).cast::<RawFd>(), fd.as_raw_fd());
    }

    let sent = loop {
        let sent = unsafe { libc::sendmsg(stream.as_raw_fd(), &msg, libc::MSG_NOSIGNAL) };
        if sent >= 0 {
            break sent as usize;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    };

    if sent != payload.len() {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("sent {sent} of {} payload bytes", payload.len()),
        ));
    }
    Ok(())
}

/// ### English
/// Receives one message: inline bytes into `payload` plus the first passed descriptor.
///
/// Extra descriptors in the same message are closed. Returns the number of payload bytes.
///
/// ### 中文
/// 接收一条消息：内联字节写入 `payload`，并返回第一个传入的描述符。
///
/// 同一消息中的多余描述符会被关闭。返回载荷字节数。
pub fn recv_with_fd(
    stream: &UnixStream,
    payload: &mut [u8],
) -> io::Result<(usize, Option<OwnedFd>)> {
    let mut control = ControlBuffer([0; 64]);

    let mut iov = libc::iovec {
        iov_base: payload.as_mut_ptr().cast(),
        iov_len: payload.len(),
    };
    let mut msg: libc::msghdr = unsafe { mem::zeroed() };
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;
    msg.msg_control = control.0.as_mut_ptr().cast();
    msg.msg_controllen = control.0.len() as _;

    let received = loop {
        let received =
            unsafe { libc::recvmsg(stream.as_raw_fd(), &mut msg, libc::MSG_CMSG_CLOEXEC) };
        if received >= 0 {
            break received as usize;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    };

    let mut first: Option<OwnedFd> = None;
    unsafe {
        let mut cmsg = libc::CMSG_FIRSTHDR(&msg);
        while !cmsg.is_null() {
            if (*cmsg).cmsg_level == libc::SOL_SOCKET && (*cmsg).cmsg_type == libc::SCM_RIGHTS {
                let header = libc::CMSG_LEN(0) as usize;
                let count = ((*cmsg).cmsg_len as usize).saturating_sub(header)
                    / mem::size_of::<RawFd>();
                let data = libc::CMSG_DATA(cmsg).cast::<RawFd>();
                for i in 0..count {
                    let fd = OwnedFd::from_raw_fd(ptr::read_unaligned(data.add(i)));
                    if first.is_none() {
                        first = Some(fd);
                    }
                }
            }
            cmsg = libc::CMSG_NXTHDR(&msg, cmsg);
        }
    }

    if msg.msg_flags & libc::MSG_CTRUNC != 0 {
        return Err(io::Error::other("ancillary data truncated"));
    }
    Ok((received, first))
}
