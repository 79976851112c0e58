//! SIGTERM → SIGKILL escalation for a `tokio::process::Child`.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::timeout;
#[cfg(unix)]
use tracing::debug;

/// Stop a child that overran its deadline or was cancelled, and reap it.
///
/// # Strategy
/// 1. SIGTERM to the child's process group, wait up to `grace`
/// 2. SIGKILL to the group
/// 3. Wait for reaping
///
/// Windows has no SIGTERM equivalent and kills immediately.
pub async fn terminate_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        terminate_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        child.kill().await?;
        child.wait().await
    }
}

/// SIGKILL whatever is left in a finished leader's process group.
///
/// `group` is the leader's pid, taken before it was reaped. A group with no
/// members left is not an error.
pub fn kill_group(group: Option<u32>) {
    #[cfg(unix)]
    if let Some(raw) = group
        && let Ok(raw) = i32::try_from(raw)
    {
        match signal::killpg(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => debug!(pgid = raw, "Killed stragglers in finished process group"),
            Err(nix::errno::Errno::ESRCH) => {}
            Err(e) => debug!(pgid = raw, error = %e, "Failed to signal process group"),
        }
    }

    #[cfg(not(unix))]
    let _ = group;
}

#[cfg(unix)]
async fn terminate_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let Some(raw) = child.id() else {
        // Already reaped.
        return child.wait().await;
    };
    let group = Pid::from_raw(i32::try_from(raw).map_err(io::Error::other)?);

    match signal::killpg(group, Signal::SIGTERM) {
        Ok(()) => {}
        Err(nix::errno::Errno::ESRCH) => return child.wait().await,
        Err(e) => return Err(io::Error::other(e)),
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        // The leader is gone; make sure stragglers in its group are too.
        let _ = signal::killpg(group, Signal::SIGKILL);
        return result;
    }

    debug!(pid = raw, "Grace period elapsed, sending SIGKILL");
    match signal::killpg(group, Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => return Err(io::Error::other(e)),
    }
    child.wait().await
}
