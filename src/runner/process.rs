// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tool process lifecycle with timeout and orphan protection.
//!
//! Every invocation runs spawn, write, drain, wait and reap. The child is
//! placed in its own process group so a timeout can take down anything it
//! forked, and on Linux it is bound to our lifetime with `PR_SET_PDEATHSIG`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use bytes::Bytes;
use tokio::process::{Child, Command};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use crate::config::Config;
use crate::mist_core::errors::MistError;
use crate::runner::pipeline::{
    spawn_stderr_drain, spawn_stdin_writer, spawn_stdout_reader, Capture, CapturedStdout,
};

/// One tool execution: program, arguments, optional stdin and capture mode.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Bytes written to stdin; `None` attaches the null device
    pub input: Option<Bytes>,
    pub capture: Capture,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            input: None,
            capture: Capture::Raw,
        }
    }

    pub fn with_input(mut self, input: impl Into<Bytes>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_capture(mut self, capture: Capture) -> Self {
        self.capture = capture;
        self
    }
}

/// Output of a tool that exited successfully.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: CapturedStdout,
    pub stderr: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
    kill_grace: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            kill_grace: Duration::ZERO,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.timeout()).with_kill_grace(config.kill_grace())
    }

    /// Send SIGTERM and wait up to `grace` before SIGKILL on timeout.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `invocation` to completion.
    ///
    /// The timeout budget covers waiting for exit and draining both pipes.
    /// Nonzero exit becomes [`MistError::NonZeroExit`] carrying stderr.
    pub async fn run(&self, invocation: Invocation) -> Result<ProcessOutput, MistError> {
        let Invocation {
            program,
            args,
            input,
            capture,
        } = invocation;

        debug!("Spawning '{}' with args {:?}", program.display(), args);
        let mut child = spawn(&program, &args, input.is_some())?;
        let pid = child.id();

        let mut stdin_task = match (child.stdin.take(), input) {
            (Some(stdin), Some(input)) => Some(spawn_stdin_writer(stdin, input)),
            _ => None,
        };
        let mut stdout_task = child
            .stdout
            .take()
            .map(|stdout| spawn_stdout_reader(stdout, capture));
        let mut stderr_task = child.stderr.take().map(spawn_stderr_drain);

        let collected = tokio::time::timeout(self.timeout, async {
            let status = child.wait().await?;
            if let Some(task) = stdin_task.as_mut() {
                join(task).await?;
            }
            let stdout = match stdout_task.as_mut() {
                Some(task) => join(task).await?,
                None => empty_capture(capture),
            };
            let stderr = match stderr_task.as_mut() {
                Some(task) => join(task).await?,
                None => Vec::new(),
            };
            Ok::<_, MistError>((status, stdout, stderr))
        })
        .await;

        let (status, stdout, stderr) = match collected {
            Ok(Ok(collected)) => collected,
            Ok(Err(e)) => {
                warn!(
                    "Collecting output of '{}' failed, killing its process group: {}",
                    program.display(),
                    e
                );
                self.terminate(&mut child, pid).await;
                abort_all([
                    stdin_task.map(abortable),
                    stdout_task.map(abortable),
                    stderr_task.map(abortable),
                ]);
                return Err(e);
            }
            Err(_) => {
                warn!(
                    "'{}' exceeded its {:?} budget, killing it",
                    program.display(),
                    self.timeout
                );
                self.terminate(&mut child, pid).await;
                abort_all([
                    stdin_task.map(abortable),
                    stdout_task.map(abortable),
                    stderr_task.map(abortable),
                ]);
                return Err(MistError::Timeout {
                    budget: self.timeout,
                });
            }
        };

        debug!("'{}' exited with {}", program.display(), status);
        if !status.success() {
            return Err(MistError::non_zero_exit(
                status.code(),
                &String::from_utf8_lossy(&stderr),
            ));
        }

        Ok(ProcessOutput {
            status,
            stdout,
            stderr,
        })
    }

    /// Kill the child and everything in its process group, then reap it.
    /// Used on timeout and when collecting output fails.
    async fn terminate(&self, child: &mut Child, pid: Option<u32>) {
        #[cfg(unix)]
        if let Some(pid) = pid {
            if !self.kill_grace.is_zero() {
                signal_group(pid, nix::sys::signal::Signal::SIGTERM);
                if tokio::time::timeout(self.kill_grace, child.wait()).await.is_ok() {
                    debug!("Process group {} honoured SIGTERM", pid);
                }
            }
            // Grandchildren may outlive the leader, so the group is killed
            // even when the leader already exited.
            signal_group(pid, nix::sys::signal::Signal::SIGKILL);
        }
        #[cfg(not(unix))]
        let _ = pid;

        if let Err(e) = child.kill().await {
            debug!("Kill of pid {:?} failed: {}", pid, e);
        }
        let _ = child.wait().await;
    }
}

fn spawn(program: &Path, args: &[String], piped_stdin: bool) -> Result<Child, MistError> {
    let mut std_command = std::process::Command::new(program);
    std_command
        .args(args)
        .stdin(if piped_stdin {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;

        std_command.process_group(0);

        #[cfg(target_os = "linux")]
        // SAFETY: prctl is async-signal-safe and touches no state shared with
        // the parent; the constants come from libc for this platform.
        unsafe {
            std_command.pre_exec(|| {
                // SIGKILL the tool if the calling process dies
                let ret = libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL);
                if ret != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    let mut command = Command::from(std_command);
    command.kill_on_drop(true);
    command.spawn().map_err(|source| MistError::BinaryNotFound {
        path: program.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match nix::sys::signal::killpg(Pid::from_raw(raw), signal) {
        Ok(()) => debug!("Sent {:?} to process group {}", signal, pid),
        // Group already gone
        Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!("Failed to signal process group {}: {}", pid, e),
    }
}

fn abortable<T>(task: JoinHandle<T>) -> AbortHandle {
    task.abort_handle()
}

fn abort_all(tasks: [Option<AbortHandle>; 3]) {
    for task in tasks.into_iter().flatten() {
        task.abort();
    }
}

async fn join<T>(task: &mut JoinHandle<Result<T, MistError>>) -> Result<T, MistError> {
    task.await
        .map_err(|e| MistError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

fn empty_capture(capture: Capture) -> CapturedStdout {
    match capture {
        Capture::Raw => CapturedStdout::Raw(Vec::new()),
        Capture::Envelope => CapturedStdout::Envelope(crate::transport::Selection::Empty),
    }
}
