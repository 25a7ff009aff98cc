pub type Result<T> = std::result::Result<T, BountyError>;

/// Struct to represent IO errors.
#[derive(Debug)]
pub struct IoErrorStruct {
    /// The type of IO error.
    error_type: String,

    /// The error message.
    msg: String,
}

/// Struct to represent configuration errors (missing file, bad syntax,
/// missing keys).
#[derive(Debug)]
pub struct ConfigErrorStruct {
    /// The error message.
    msg: String,
}

/// Struct to represent CLI validation errors.
#[derive(Debug)]
pub struct ValidationErrorStruct {
    /// The error message.
    msg: String,
}

/// Struct to represent HTTP transport errors.
#[derive(Debug)]
pub struct RequestErrorStruct {
    /// The error message.
    msg: String,
}

/// Struct to represent non-success responses from a remote API.
#[derive(Debug)]
pub struct ApiErrorStruct {
    /// HTTP status code returned by the API.
    status: u16,

    /// The response body or error message.
    msg: String,
}

/// Struct to represent droplet provisioning failures.
#[derive(Debug)]
pub struct ProvisionErrorStruct {
    /// The error message.
    msg: String,
}

/// Struct to represent SSH/SFTP connectivity errors.
#[derive(Debug)]
pub struct SshErrorStruct {
    /// The error message.
    msg: String,
}

/// Struct to represent a remote command that exited non-zero.
#[derive(Debug)]
pub struct RemoteCommandErrorStruct {
    /// The command that was executed.
    command: String,

    /// The remote exit status.
    exit_status: i32,
}

/// Struct to represent result-file import errors.
#[derive(Debug)]
pub struct ImportErrorStruct {
    /// The error message.
    msg: String,
}

/// Enum to represent the failure categories of the bounty pipeline.
#[derive(Debug)]
pub enum BountyError {
    IoError(IoErrorStruct),
    ConfigError(ConfigErrorStruct),
    ValidationError(ValidationErrorStruct),
    RequestError(RequestErrorStruct),
    ApiError(ApiErrorStruct),
    ProvisionError(ProvisionErrorStruct),
    SshError(SshErrorStruct),
    RemoteCommandError(RemoteCommandErrorStruct),
    ImportError(ImportErrorStruct),
}

impl BountyError {
    /// Create a new configuration error.
    pub fn config_error(msg: &str) -> Self {
        BountyError::ConfigError(ConfigErrorStruct {
            msg: msg.to_string(),
        })
    }

    /// Create a new validation error.
    pub fn validation_error(msg: &str) -> Self {
        BountyError::ValidationError(ValidationErrorStruct {
            msg: msg.to_string(),
        })
    }

    /// Create a new API error from a non-success HTTP response.
    pub fn api_error(status: u16, msg: &str) -> Self {
        BountyError::ApiError(ApiErrorStruct {
            status,
            msg: msg.to_string(),
        })
    }

    /// Create a new provisioning error.
    pub fn provision_error(msg: &str) -> Self {
        BountyError::ProvisionError(ProvisionErrorStruct {
            msg: msg.to_string(),
        })
    }

    /// Create a new SSH connectivity error.
    pub fn ssh_error(msg: &str) -> Self {
        BountyError::SshError(SshErrorStruct {
            msg: msg.to_string(),
        })
    }

    /// Create a new remote command failure from the command line and its
    /// exit status.
    pub fn remote_command_error(command: &str, exit_status: i32) -> Self {
        BountyError::RemoteCommandError(RemoteCommandErrorStruct {
            command: command.to_string(),
            exit_status,
        })
    }

    /// Create a new import error.
    pub fn import_error(msg: &str) -> Self {
        BountyError::ImportError(ImportErrorStruct {
            msg: msg.to_string(),
        })
    }
}

impl std::fmt::Display for BountyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BountyError::IoError(io_err) => {
                write!(f, "IO {} Error: {}", io_err.error_type, io_err.msg)
            }
            BountyError::ConfigError(config_err) => {
                write!(f, "Config Error: {}", config_err.msg)
            }
            BountyError::ValidationError(validation_err) => {
                write!(f, "Validation Error: {}", validation_err.msg)
            }
            BountyError::RequestError(request_err) => {
                write!(f, "Request Error: {}", request_err.msg)
            }
            BountyError::ApiError(api_err) => {
                write!(f, "API Error (HTTP {}): {}", api_err.status, api_err.msg)
            }
            BountyError::ProvisionError(provision_err) => {
                write!(f, "Provision Error: {}", provision_err.msg)
            }
            BountyError::SshError(ssh_err) => {
                write!(f, "SSH Error: {}", ssh_err.msg)
            }
            BountyError::RemoteCommandError(cmd_err) => {
                write!(
                    f,
                    "Remote Command Error: `{}` exited with status {}",
                    cmd_err.command, cmd_err.exit_status
                )
            }
            BountyError::ImportError(import_err) => {
                write!(f, "Import Error: {}", import_err.msg)
            }
        }
    }
}

impl From<std::io::Error> for BountyError {
    fn from(error: std::io::Error) -> Self {
        BountyError::IoError(IoErrorStruct {
            error_type: error.kind().to_string(),
            msg: error.to_string(),
        })
    }
}

impl From<ini::Error> for BountyError {
    fn from(error: ini::Error) -> Self {
        BountyError::ConfigError(ConfigErrorStruct {
            msg: error.to_string(),
        })
    }
}

impl From<reqwest::Error> for BountyError {
    fn from(error: reqwest::Error) -> Self {
        BountyError::RequestError(RequestErrorStruct {
            msg: error.to_string(),
        })
    }
}

impl From<ssh2::Error> for BountyError {
    fn from(error: ssh2::Error) -> Self {
        BountyError::SshError(SshErrorStruct {
            msg: error.to_string(),
        })
    }
}

impl From<rusqlite::Error> for BountyError {
    fn from(error: rusqlite::Error) -> Self {
        BountyError::ImportError(ImportErrorStruct {
            msg: error.to_string(),
        })
    }
}
