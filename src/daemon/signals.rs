//! Signal handling: SIGINT/SIGTERM become sends on the shutdown channel.

use crossbeam_channel::{Receiver, unbounded};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use crate::core::errors::{Result, UwdError};

/// Install the signal-forwarding thread and hand back the receiver the
/// scheduler uses both as interruptible sleep and mid-cycle cancellation
/// check. Each delivered signal forwards one `()`.
pub fn shutdown_channel() -> Result<Receiver<()>> {
    let (tx, rx) = unbounded();
    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|e| UwdError::Runtime {
        details: format!("failed to install signal handler: {e}"),
    })?;

    std::thread::Builder::new()
        .name("uwd-signals".to_string())
        .spawn(move || {
            for _signal in signals.forever() {
                if tx.send(()).is_err() {
                    break;
                }
            }
        })
        .map_err(|e| UwdError::Runtime {
            details: format!("failed to spawn signal thread: {e}"),
        })?;

    Ok(rx)
}
