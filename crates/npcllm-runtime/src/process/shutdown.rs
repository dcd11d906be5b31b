//! Graceful shutdown of the engine child process.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;

#[cfg(unix)]
use std::time::Duration;
#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

#[cfg(unix)]
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Stop a child with SIGTERM, escalating to SIGKILL after five seconds.
///
/// On non-unix platforms the child is killed immediately. Returns once the
/// process has been reaped.
pub async fn shutdown_child(mut child: Child) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(&mut child).await
    }

    #[cfg(not(unix))]
    {
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return child.wait().await;
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(GRACE_PERIOD, child.wait()).await {
        return result;
    }

    child.kill().await?;
    child.wait().await
}
