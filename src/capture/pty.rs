//! Pseudo-terminal plumbing.
//!
//! Thin wrappers over `libc` for the pieces `std` does not cover: PTY
//! allocation, controlling-terminal setup in the child, window sizes and
//! non-blocking descriptor I/O.

use std::ffi::OsStr;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use super::error::CaptureError;

/// Terminal geometry in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub cols: u16,
    pub rows: u16,
}

impl WindowSize {
    fn to_libc(self) -> libc::winsize {
        libc::winsize {
            ws_row: self.rows,
            ws_col: self.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        }
    }
}

/// Both ends of a freshly allocated PTY.
pub struct PtyPair {
    pub master: OwnedFd,
    pub slave: OwnedFd,
}

/// Allocate a PTY pair with the given initial geometry.
pub fn open_pty(size: WindowSize) -> io::Result<PtyPair> {
    let mut master: libc::c_int = -1;
    let mut slave: libc::c_int = -1;
    let ws = size.to_libc();
    let rc = unsafe {
        libc::openpty(
            &mut master,
            &mut slave,
            std::ptr::null_mut(),
            std::ptr::null(),
            &ws,
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: openpty succeeded, both descriptors are open and owned by us.
    let pair = unsafe {
        PtyPair {
            master: OwnedFd::from_raw_fd(master),
            slave: OwnedFd::from_raw_fd(slave),
        }
    };
    set_cloexec(pair.master.as_raw_fd())?;
    Ok(pair)
}

/// Query the window size of a terminal descriptor. `None` if it is not a
/// terminal or reports a zero-sized window.
pub fn window_size(fd: RawFd) -> Option<WindowSize> {
    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let rc = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) };
    if rc != 0 || ws.ws_col == 0 || ws.ws_row == 0 {
        return None;
    }
    Some(WindowSize {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

/// Apply a window size to a PTY; the kernel delivers SIGWINCH to its
/// foreground process group.
pub fn set_window_size(fd: RawFd, size: WindowSize) -> io::Result<()> {
    let ws = size.to_libc();
    let rc = unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, &ws) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn set_cloexec(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// One `read(2)`, retried on EINTR.
pub fn read_fd(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n >= 0 {
            return Ok(n as usize);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Write all bytes to a possibly non-blocking descriptor.
pub fn write_all_fd(fd: RawFd, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        let n = unsafe { libc::write(fd, data.as_ptr().cast(), data.len()) };
        if n >= 0 {
            data = &data[n as usize..];
            continue;
        }
        let err = io::Error::last_os_error();
        match err.kind() {
            io::ErrorKind::Interrupted => continue,
            io::ErrorKind::WouldBlock => wait_writable(fd)?,
            _ => return Err(err),
        }
    }
    Ok(())
}

fn wait_writable(fd: RawFd) -> io::Result<()> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let rc = unsafe { libc::poll(&mut pfd, 1, -1) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if pfd.revents & libc::POLLOUT != 0 {
            return Ok(());
        }
        if pfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }
    }
}

/// Locate the program the child would execute, the way `execvp` does.
///
/// Names containing a slash are taken as paths (relative to `cwd` when
/// given); bare names are looked up in `search_path`.
pub fn resolve_program(
    program: &str,
    cwd: Option<&Path>,
    search_path: Option<&OsStr>,
) -> Result<PathBuf, CaptureError> {
    let not_found = || CaptureError::CommandNotFound {
        program: program.to_string(),
    };

    if program.is_empty() {
        return Err(not_found());
    }

    let candidates: Vec<PathBuf> = if program.contains('/') {
        let path = Path::new(program);
        match cwd {
            Some(dir) if path.is_relative() => vec![dir.join(path)],
            _ => vec![path.to_path_buf()],
        }
    } else {
        let search = search_path
            .map(|p| p.to_os_string())
            .unwrap_or_else(|| "/usr/local/bin:/usr/bin:/bin".into());
        std::env::split_paths(&search)
            .map(|dir| dir.join(program))
            .collect()
    };

    let mut denied = None;
    for candidate in candidates {
        let Ok(meta) = std::fs::metadata(&candidate) else {
            continue;
        };
        if meta.is_file() && meta.permissions().mode() & 0o111 != 0 {
            return Ok(candidate);
        }
        denied.get_or_insert(candidate);
    }

    match denied {
        Some(path) => Err(CaptureError::NotExecutable {
            program: program.to_string(),
            source: io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is not an executable file", path.display()),
            ),
        }),
        None => Err(not_found()),
    }
}

/// Everything needed to start the child on the PTY slave.
pub struct SpawnRequest<'a> {
    pub program: &'a Path,
    pub argv: &'a [String],
    pub cwd: Option<&'a Path>,
    pub env: &'a [(String, String)],
}

/// Spawn the child as a session leader with the PTY slave as its
/// controlling terminal and stdio.
pub fn spawn_on_pty(pair: &PtyPair, req: &SpawnRequest<'_>) -> Result<Child, CaptureError> {
    let slave_fd = pair.slave.as_raw_fd();
    let master_fd = pair.master.as_raw_fd();
    let arg0 = req.argv.first().map(String::as_str).unwrap_or_default();

    let mut cmd = Command::new(req.program);
    cmd.arg0(arg0).args(req.argv.iter().skip(1));
    if let Some(dir) = req.cwd {
        cmd.current_dir(dir);
    }
    cmd.envs(req.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    // SAFETY: runs in the forked child before exec; only async-signal-safe
    // calls (setsid, ioctl, dup2, close) on descriptors copied by value.
    unsafe {
        cmd.pre_exec(move || {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            if libc::ioctl(slave_fd, libc::TIOCSCTTY as _, 0) == -1 {
                return Err(io::Error::last_os_error());
            }
            for target in 0..=2 {
                if libc::dup2(slave_fd, target) == -1 {
                    return Err(io::Error::last_os_error());
                }
            }
            if slave_fd > 2 {
                libc::close(slave_fd);
            }
            libc::close(master_fd);
            Ok(())
        });
    }

    cmd.spawn().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CaptureError::CommandNotFound {
            program: arg0.to_string(),
        },
        io::ErrorKind::PermissionDenied => CaptureError::NotExecutable {
            program: arg0.to_string(),
            source: e,
        },
        _ => CaptureError::process(format!("failed to spawn {arg0}"), e),
    })
}
