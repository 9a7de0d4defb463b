use nix::errno::Errno;
use nix::sys::signal::{kill, pthread_sigmask, SigSet, SigmaskHow, Signal};
use nix::unistd::Pid;
use tracing::debug;

/// Symbolic name of a raw signal number, e.g. `"SIGSEGV"`.
pub fn signal_name(signal: i32) -> String {
    match Signal::try_from(signal) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => format!("SIG{signal}"),
    }
}

/// Clears the signal mask of the calling thread.
///
/// Runs in the forked child before exec: the child would otherwise inherit
/// whatever the spawning runtime thread had blocked.
pub(crate) fn reset_signal_mask() -> std::io::Result<()> {
    let empty_mask = SigSet::empty();
    pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&empty_mask), None)
        .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
}

/// Sends `signal` to the whole process group led by `leader`.
///
/// Returns `Ok(false)` when the group no longer exists.
pub(crate) fn signal_group(leader: Pid, signal: Signal) -> nix::Result<bool> {
    debug!("Sending signal {:?} to process group {}", signal, leader);
    match kill(Pid::from_raw(-leader.as_raw()), signal) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(e),
    }
}
