//! Client for the out-of-process privileged mount helper.
//!
//! The helper owns the actual privileged mount/unmount syscalls and
//! listens on a Unix socket. The protocol is one newline-delimited JSON
//! request per connection, answered by a single JSON reply. This client
//! implements [`MountCommand`], so the executor does not care whether
//! it talks to the direct tooling or the helper.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::{MountCommand, MountRequest, UnmountMode};
use crate::error::MountError;

/// One request to the helper.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum HelperRequest {
    MountSmb { url: String, mount_point: PathBuf },
    Unmount { path: PathBuf, force: bool },
}

/// The helper's reply.
#[derive(Debug, Serialize, Deserialize)]
struct HelperReply {
    ok: bool,
    #[serde(default)]
    message: String,
}

/// Mount primitive backed by the privileged helper socket.
#[derive(Debug, Clone)]
pub struct HelperClient {
    socket: PathBuf,
}

impl HelperClient {
    /// Client for the helper listening at `socket`.
    pub fn new(socket: PathBuf) -> Self {
        Self { socket }
    }

    fn roundtrip(&self, request: &HelperRequest) -> Result<(), MountError> {
        let mut stream = UnixStream::connect(&self.socket).map_err(|e| {
            MountError::CommandFailed(format!(
                "helper unavailable at {}: {e}",
                self.socket.display()
            ))
        })?;

        let mut line = serde_json::to_string(request)
            .map_err(|e| MountError::CommandFailed(format!("helper request encode: {e}")))?;
        line.push('\n');
        stream
            .write_all(line.as_bytes())
            .map_err(|e| MountError::CommandFailed(format!("helper write: {e}")))?;

        let mut reader = BufReader::new(stream);
        let mut reply_line = String::new();
        reader
            .read_line(&mut reply_line)
            .map_err(|e| MountError::CommandFailed(format!("helper read: {e}")))?;
        let reply: HelperReply = serde_json::from_str(reply_line.trim())
            .map_err(|e| MountError::CommandFailed(format!("helper reply decode: {e}")))?;

        if reply.ok {
            Ok(())
        } else {
            Err(MountError::CommandFailed(format!(
                "helper refused: {}",
                reply.message
            )))
        }
    }
}

impl MountCommand for HelperClient {
    fn mount_smb(&self, request: &MountRequest) -> Result<(), MountError> {
        self.roundtrip(&HelperRequest::MountSmb {
            url: request.smb_url(),
            mount_point: request.mount_point.clone(),
        })
    }

    fn unmount(&self, path: &Path, mode: UnmountMode) -> Result<(), MountError> {
        self.roundtrip(&HelperRequest::Unmount {
            path: path.to_path_buf(),
            force: !matches!(mode, UnmountMode::Graceful),
        })
    }
}
