//! Device attach/detach notifications from udev.
//!
//! The udev monitor socket is polled on a dedicated thread; add and remove
//! events for the input subsystem are forwarded onto an unbounded queue.

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use remotebuddy_common::tracing;
use std::ffi::OsStr;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use udev::EventType;

use crate::error::WatchError;

/// How often the monitor thread checks for a stop request
const POLL_INTERVAL_MS: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotplugAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotplugEvent {
    pub action: HotplugAction,
    pub path: PathBuf,
}

/// Map a udev event onto a hot-plug event. Actions other than add and
/// remove yield `None`.
pub fn resolve_event(event_type: EventType, sysname: &OsStr, input_dir: &Path) -> Option<HotplugEvent> {
    let action = match event_type {
        EventType::Add => HotplugAction::Add,
        EventType::Remove => HotplugAction::Remove,
        _ => return None,
    };
    Some(HotplugEvent {
        action,
        path: input_dir.join(sysname),
    })
}

pub struct HotplugWatcher {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl HotplugWatcher {
    /// Subscribe to input subsystem events. Fails if the udev monitor
    /// cannot be set up.
    pub fn start(input_dir: PathBuf, tx: mpsc::UnboundedSender<HotplugEvent>) -> Result<Self, WatchError> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);

        let thread = thread::Builder::new()
            .name("udev-monitor".into())
            .spawn(move || {
                let socket = match udev::MonitorBuilder::new()
                    .and_then(|builder| builder.match_subsystem("input"))
                    .and_then(|builder| builder.listen())
                {
                    Ok(socket) => {
                        let _ = ready_tx.send(Ok(()));
                        socket
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                monitor_loop(&socket, &input_dir, &tx, &stop_flag);
            })
            .map_err(WatchError::Udev)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(WatchError::Udev(e));
            }
            Err(_) => {
                let _ = thread.join();
                return Err(WatchError::Udev(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "udev monitor thread exited during setup",
                )));
            }
        }

        info!("Watching udev for input device changes");
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Stop the monitor thread and close the udev socket
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            info!("Hot-plug watcher stopped");
        }
    }
}

impl Drop for HotplugWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn monitor_loop(
    socket: &udev::MonitorSocket,
    input_dir: &Path,
    tx: &mpsc::UnboundedSender<HotplugEvent>,
    stop: &AtomicBool,
) {
    // the socket outlives every borrow below
    let fd = unsafe { BorrowedFd::borrow_raw(socket.as_raw_fd()) };

    while !stop.load(Ordering::SeqCst) {
        let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::from(POLL_INTERVAL_MS)) {
            Ok(0) => continue,
            Ok(_) => {}
            Err(Errno::EINTR) => continue,
            Err(e) => {
                error!("Polling udev monitor failed: {}", e);
                return;
            }
        }

        for event in socket.iter() {
            let Some(hotplug) = resolve_event(event.event_type(), event.sysname(), input_dir) else {
                continue;
            };
            debug!("Hot-plug {:?} {}", hotplug.action, hotplug.path.display());
            if tx.send(hotplug).is_err() {
                debug!("Hot-plug queue closed, stopping monitor");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_resolve_to_device_nodes() {
        let input_dir = Path::new("/dev/input");

        assert_eq!(
            resolve_event(EventType::Add, OsStr::new("event5"), input_dir),
            Some(HotplugEvent {
                action: HotplugAction::Add,
                path: PathBuf::from("/dev/input/event5"),
            })
        );
        assert_eq!(
            resolve_event(EventType::Remove, OsStr::new("event5"), input_dir),
            Some(HotplugEvent {
                action: HotplugAction::Remove,
                path: PathBuf::from("/dev/input/event5"),
            })
        );
    }

    #[test]
    fn test_other_actions_are_ignored() {
        let input_dir = Path::new("/dev/input");
        for event_type in [EventType::Change, EventType::Bind, EventType::Unbind, EventType::Unknown] {
            assert_eq!(resolve_event(event_type, OsStr::new("event5"), input_dir), None);
        }
    }

    #[test]
    fn test_watcher_start_and_stop() {
        // netlink sockets are not available in every sandbox
        let (tx, _rx) = mpsc::unbounded_channel();
        match HotplugWatcher::start(PathBuf::from("/dev/input"), tx) {
            Ok(mut watcher) => watcher.stop(),
            Err(e) => println!("udev monitor unavailable: {}", e),
        }
    }
}
