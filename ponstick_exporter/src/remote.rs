//! Remote execution of the diagnostic script over SSH.
//!
//! One connection and one channel per call, torn down before returning.
//! Calls block; the scraper runs them on the blocking pool under a deadline.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use ssh2::Session;
use tracing::debug;

use crate::config::SshTarget;
use crate::error::{Result, ScrapeError};

/// Captured output of one script run. `stdout` has surrounding newlines
/// trimmed and is otherwise untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs the diagnostic script somewhere and hands back what it printed.
pub trait RemoteExecutor: Send + Sync {
    fn execute(&self, script: &str) -> Result<RemoteOutput>;
}

/// Wraps the script body in the interpreter invocation sent to the device.
pub fn lua_command(script: &str) -> String {
    format!("lua -e '{}'", script.replace('\'', r"'\''"))
}

pub struct SshExecutor {
    target: SshTarget,
    timeout: Duration,
}

impl SshExecutor {
    pub fn new(target: SshTarget, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    fn connect(&self) -> Result<Session> {
        let addr = format!("{}:{}", self.target.host, self.target.port);
        let stream = dial(&addr, self.timeout).map_err(|source| ScrapeError::Connect {
            addr: addr.clone(),
            source,
        })?;

        let mut sess = Session::new().map_err(ScrapeError::Handshake)?;
        sess.set_tcp_stream(stream);
        sess.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
        sess.handshake().map_err(ScrapeError::Handshake)?;

        // Host keys are not pinned; the device is reached on a trusted LAN.
        sess.userauth_password(&self.target.user, &self.target.password)
            .map_err(|e| ScrapeError::Auth {
                user: self.target.user.clone(),
                reason: e.to_string(),
            })?;
        if !sess.authenticated() {
            return Err(ScrapeError::Auth {
                user: self.target.user.clone(),
                reason: "server did not accept credentials".into(),
            });
        }
        Ok(sess)
    }
}

impl RemoteExecutor for SshExecutor {
    fn execute(&self, script: &str) -> Result<RemoteOutput> {
        let sess = self.connect()?;

        let mut channel = sess.channel_session().map_err(ScrapeError::Channel)?;
        channel
            .exec(&lua_command(script))
            .map_err(ScrapeError::Channel)?;

        // stdout is drained before stderr, so a script that fills the channel
        // window on stderr stalls until the session timeout fires. The status
        // script writes three short lines and at most a short error trace.
        let mut stdout = String::new();
        channel.read_to_string(&mut stdout)?;
        let mut stderr = String::new();
        channel.stderr().read_to_string(&mut stderr)?;
        channel.wait_close().map_err(ScrapeError::Exit)?;
        let status = channel.exit_status().map_err(ScrapeError::Exit)?;
        let signal = channel.exit_signal().map_err(ScrapeError::Exit)?.exit_signal;
        let _ = sess.disconnect(None, "scrape complete", None);

        debug!(
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            status,
            signal = signal.as_deref().unwrap_or("none"),
            "remote script finished"
        );
        command_outcome(status, signal, &stderr)?;
        Ok(RemoteOutput {
            stdout: stdout.trim_matches('\n').to_string(),
            stderr,
        })
    }
}

/// A run only counts as successful when the remote reported no signal and a
/// zero exit status. libssh2 reports status 0 when the server sent none, so
/// the signal is checked first.
fn command_outcome(status: i32, signal: Option<String>, stderr: &str) -> Result<()> {
    if let Some(signal) = signal {
        return Err(ScrapeError::Signaled {
            signal,
            stderr: stderr.to_string(),
        });
    }
    if status != 0 {
        return Err(ScrapeError::Command {
            status,
            stderr: stderr.to_string(),
        });
    }
    Ok(())
}

fn dial(addr: &str, timeout: Duration) -> std::io::Result<TcpStream> {
    let mut last_err = None;
    for sa in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&sa, timeout) {
            Ok(s) => return Ok(s),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
    }))
}
