use super::Result;
use crate::config::OutputSink;
use crate::error::Error;
use crate::outcome::TerminationRecord;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use nix::unistd::{dup2_stderr, dup2_stdout};
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// An opened output destination, valid for exactly one test execution.
pub(crate) enum Destination {
    /// Test output goes wherever the runner's own output goes
    Inherit,
    /// Log file opened in append mode
    File(File),
    /// Write end of a pipe feeding a consumer command
    Pipe {
        command: String,
        writer: OwnedFd,
        consumer: Child,
    },
}

impl Destination {
    /// Opens the configured sink. Failing to open it is fatal for the run.
    pub fn open(sink: &OutputSink) -> Result<Self> {
        match sink {
            OutputSink::None => Ok(Destination::Inherit),
            OutputSink::LogFile(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| Error::OpenOutput {
                        path: path.clone(),
                        source,
                    })?;
                debug!("Opened log file {:?}", path);
                Ok(Destination::File(file))
            }
            OutputSink::Pipe(command) => {
                let open_err = |source| Error::OpenPipe {
                    command: command.clone(),
                    source,
                };
                let mut consumer = Command::new("sh")
                    .arg("-c")
                    .arg(command)
                    .stdin(Stdio::piped())
                    .spawn()
                    .map_err(open_err)?;
                let stdin = consumer.stdin.take().ok_or_else(|| {
                    open_err(io::Error::new(io::ErrorKind::Other, "consumer has no stdin"))
                })?;

                // The clone is close-on-exec, so sibling tests never inherit it.
                let borrowed = unsafe { BorrowedFd::borrow_raw(stdin.as_raw_fd()) };
                let writer = borrowed.try_clone_to_owned().map_err(open_err)?;
                drop(stdin);

                debug!("Spawned output consumer: sh -c {:?}", command);
                Ok(Destination::Pipe {
                    command: command.clone(),
                    writer,
                    consumer,
                })
            }
        }
    }

    /// Stdout and stderr handles for a child process, both pointing at this
    /// destination.
    pub fn child_stdio(&self) -> Result<(Stdio, Stdio)> {
        match self {
            Destination::Inherit => Ok((Stdio::inherit(), Stdio::inherit())),
            Destination::File(file) => Ok((
                Stdio::from(file.try_clone()?),
                Stdio::from(file.try_clone()?),
            )),
            Destination::Pipe { writer, .. } => Ok((
                Stdio::from(writer.try_clone()?),
                Stdio::from(writer.try_clone()?),
            )),
        }
    }

    /// Descriptor to swap onto fds 1 and 2 for in-process runs.
    pub fn redirect_target(&self) -> Option<BorrowedFd<'_>> {
        match self {
            Destination::Inherit => None,
            Destination::File(file) => Some(file.as_fd()),
            Destination::Pipe { writer, .. } => Some(writer.as_fd()),
        }
    }

    /// Closes the destination. For a pipe this waits for the consumer and
    /// returns how it terminated.
    pub async fn close(self) -> Result<Option<TerminationRecord>> {
        match self {
            Destination::Inherit | Destination::File(_) => Ok(None),
            Destination::Pipe {
                command,
                writer,
                mut consumer,
            } => {
                drop(writer);
                let status = consumer.wait().await.map_err(|source| Error::Wait {
                    test: command.clone(),
                    source,
                })?;
                debug!("Output consumer exited with status: {:?}", status);
                let record =
                    TerminationRecord::from_status(status).ok_or_else(|| Error::UnexpectedStatus {
                        test: command,
                        status: format!("{status:?}"),
                    })?;
                Ok(Some(record))
            }
        }
    }
}

/// A successful test whose output consumer failed is reported with the
/// consumer's termination instead.
pub(crate) fn with_consumer(
    test: TerminationRecord,
    consumer: Option<TerminationRecord>,
) -> TerminationRecord {
    match consumer {
        Some(consumer) if test.is_success() && !consumer.is_success() => {
            warn!("Output consumer failed: {:?}", consumer);
            consumer
        }
        _ => test,
    }
}

/// Temporarily points fds 1 and 2 at another descriptor.
///
/// Restored explicitly with [`StdioSwap::restore`], or on drop.
pub(crate) struct StdioSwap {
    saved_stdout: OwnedFd,
    saved_stderr: OwnedFd,
    restored: bool,
}

impl StdioSwap {
    pub fn redirect(target: BorrowedFd<'_>) -> Result<Self> {
        flush_std();
        let saved_stdout = io::stdout()
            .as_fd()
            .try_clone_to_owned()
            .map_err(Error::Redirect)?;
        let saved_stderr = io::stderr()
            .as_fd()
            .try_clone_to_owned()
            .map_err(Error::Redirect)?;
        let swap = StdioSwap {
            saved_stdout,
            saved_stderr,
            restored: false,
        };
        point_std_at(target)?;
        Ok(swap)
    }

    pub fn restore(mut self) -> Result<()> {
        self.put_back()
    }

    fn put_back(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        flush_std();
        dup2_stdout(&self.saved_stdout).map_err(|e| Error::Redirect(e.into()))?;
        dup2_stderr(&self.saved_stderr).map_err(|e| Error::Redirect(e.into()))
    }
}

impl Drop for StdioSwap {
    fn drop(&mut self) {
        if let Err(e) = self.put_back() {
            warn!("Failed to restore standard streams: {}", e);
        }
    }
}

fn flush_std() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

/// Makes fds 1 and 2 refer to `target`.
fn point_std_at(target: BorrowedFd<'_>) -> Result<()> {
    dup2_stdout(target).map_err(|e| Error::Redirect(e.into()))?;
    dup2_stderr(target).map_err(|e| Error::Redirect(e.into()))
}
