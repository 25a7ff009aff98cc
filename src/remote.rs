//! SSH command execution and SFTP file retrieval.
//!
//! One authenticated session per `Remote`, opened with password-less pubkey
//! auth as root. The droplet's host key is accepted unconditionally: droplets
//! are disposable and freshly created, so there is no prior known-hosts entry
//! to verify against.

use std::io::Read;
use std::net::TcpStream;
use std::path::Path;

use ssh2::Session;

use crate::error::{BountyError, Result};

const REMOTE_USER: &str = "root";
const READ_CHUNK: usize = 2048;

/// Outcome of one remote command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit status reported by the remote shell.
    pub exit_status: i32,
    /// Everything the command wrote to stderr.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Anything that can run a shell command on the droplet.
///
/// `Remote` is the SSH-backed implementation; the recon driver is written
/// against this trait so its sequencing can be tested with a recorder.
pub trait CommandRunner {
    fn run_command(&self, command: &str) -> Result<CommandOutput>;
}

/// An authenticated SSH session to a droplet.
pub struct Remote {
    session: Session,
    addr: String,
}

impl Remote {
    /// Connect to `addr` on port 22 and authenticate as root with the private
    /// key at `key_path`.
    pub fn connect(addr: &str, key_path: &Path) -> Result<Self> {
        log::info!("connecting to {} as {}", addr, REMOTE_USER);
        let tcp = TcpStream::connect((addr, 22))?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;
        session.userauth_pubkey_file(REMOTE_USER, None, key_path, None)?;

        if !session.authenticated() {
            return Err(BountyError::ssh_error(&format!(
                "key authentication to {} rejected",
                addr
            )));
        }

        Ok(Remote {
            session,
            addr: addr.to_string(),
        })
    }

    /// Download `remote_file` from `remote_dir` on the droplet to
    /// `local_path`. Missing paths, permission problems and disconnects all
    /// propagate; there is no partial-download resume.
    pub fn fetch(&self, remote_dir: &str, remote_file: &str, local_path: &Path) -> Result<()> {
        let remote_path = format!("{}/{}", remote_dir.trim_end_matches('/'), remote_file);
        log::info!("fetching {}:{} -> {}", self.addr, remote_path, local_path.display());

        let sftp = self.session.sftp()?;
        let mut source = sftp.open(Path::new(&remote_path))?;
        let mut target = std::fs::File::create(local_path)?;
        let bytes = std::io::copy(&mut source, &mut target)?;
        log::debug!("downloaded {} bytes", bytes);

        Ok(())
    }
}

impl CommandRunner for Remote {
    /// Run `command` in a fresh channel, streaming its stdout to the operator
    /// in bounded reads and collecting stderr, then wait for the channel to
    /// close and report the exit status.
    fn run_command(&self, command: &str) -> Result<CommandOutput> {
        log::debug!("exec on {}: {}", self.addr, command);
        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;

        let mut buffer = [0u8; READ_CHUNK];
        loop {
            let read = channel.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            print!("{}", String::from_utf8_lossy(&buffer[..read]));
        }

        let mut stderr = String::new();
        channel.stderr().read_to_string(&mut stderr)?;
        channel.wait_close()?;
        let exit_status = channel.exit_status()?;

        if !stderr.is_empty() {
            log::warn!("stderr from `{}`: {}", command, stderr.trim_end());
        }

        Ok(CommandOutput {
            exit_status,
            stderr,
        })
    }
}
