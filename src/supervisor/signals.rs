//! Child Termination
//!
//! Best-effort shutdown of a supervised child: ask politely with SIGTERM,
//! give it a short grace period, then SIGKILL and reap it.

use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Signals the supervisor sends to its child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Termination signal (graceful shutdown)
    Terminate,
    /// Kill signal (forceful termination)
    Kill,
}

/// Send `signal` to `pid`
pub fn send_signal_to_pid(pid: u32, signal: Signal) -> Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal as NixSignal};
        use nix::unistd::Pid;

        let nix_signal = match signal {
            Signal::Terminate => NixSignal::SIGTERM,
            Signal::Kill => NixSignal::SIGKILL,
        };

        kill(Pid::from_raw(pid as i32), nix_signal).map_err(|e| Error::SignalSendFailed {
            signal: format!("{:?}", signal),
            pid,
            reason: e.to_string(),
        })
    }

    #[cfg(not(unix))]
    {
        Err(Error::SignalSendFailed {
            signal: format!("{:?}", signal),
            pid,
            reason: format!("signals not supported on {}", std::env::consts::OS),
        })
    }
}

/// Terminate `child` and reap it
///
/// Returns the exit status, or `None` if the child could not be reaped.
pub fn terminate_child(child: &mut Child, grace: Duration) -> Option<ExitStatus> {
    if let Ok(Some(status)) = child.try_wait() {
        return Some(status);
    }

    let pid = child.id();
    match send_signal_to_pid(pid, Signal::Terminate) {
        Ok(()) => {
            let deadline = Instant::now() + grace;
            while Instant::now() < deadline {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        debug!("Child {} exited after SIGTERM", pid);
                        return Some(status);
                    }
                    Ok(None) => thread::sleep(Duration::from_millis(5)),
                    Err(e) => {
                        warn!("Failed to poll child {}: {}", pid, e);
                        break;
                    }
                }
            }
        }
        Err(e) => debug!("{}", e),
    }

    if let Err(e) = child.kill() {
        // Already gone between the checks above.
        debug!("SIGKILL for child {} failed: {}", pid, e);
    }

    match child.wait() {
        Ok(status) => {
            debug!("Child {} reaped with {}", pid, status);
            Some(status)
        }
        Err(e) => {
            warn!("Failed to reap child {}: {}", pid, e);
            None
        }
    }
}

/// Exit code of a finished child, mapping signal deaths to `128 + signal`
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
