//! Error types for azpgctl
//!
//! Core errors are folded into [`AppError`], which knows how to suggest a
//! fix and prints itself as a cargo-style diagnostic.

use azpgctl_core::config::ConfigError;
use azpgctl_core::{CoreError, LifecycleError};
use colored::Colorize;
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: missing credential 'client_secret'
///   lifecycle stopped after stage 'group-created'
///
///   tip: export the service principal secret:
///       export AZURE_CLIENT_SECRET=...
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the azpgctl application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing credential '{name}' (set {env_var})")]
    MissingCredentials { name: String, env_var: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Lifecycle stopped after stage '{stage}': {source}")]
    Lifecycle {
        stage: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for azpgctl operations
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            AppError::MissingCredentials { env_var, .. } => vec![
                format!("Export the value: export {}=<value>", env_var),
                "Or add it to the [credentials] section of the config file".to_string(),
                "Secrets may reference the OS keyring: client_secret = \"keyring:<entry>\""
                    .to_string(),
            ],
            AppError::AuthenticationFailed { .. } => vec![
                "Check AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET".to_string(),
                "Ensure the service principal has access to the subscription".to_string(),
            ],
            AppError::InvalidInput { .. } => vec![
                "Check the command syntax: azpgctl <command> --help".to_string(),
                "Resource group names may contain letters, digits, '-', '_', '.', '(' and ')'"
                    .to_string(),
            ],
            AppError::NotFound { .. } => vec![
                "Verify the resource group and server name".to_string(),
                "Show the server: azpgctl server get -g <group> -n <name>".to_string(),
            ],
            AppError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the [endpoints] section of the config file".to_string(),
            ],
            AppError::Timeout { .. } => vec![
                "Raise polling.timeout_secs in the config file".to_string(),
                "The operation may still complete; check with: azpgctl server get".to_string(),
            ],
            AppError::Lifecycle { source, .. } => source.suggestions(),
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = match self {
            AppError::Lifecycle { stage, source } => CliDiagnostic::error(&source.to_string())
                .detail(&format!("lifecycle stopped after stage '{}'", stage)),
            _ => CliDiagnostic::error(&self.to_string()),
        };

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingCredential { name, env_var } => {
                AppError::MissingCredentials { name, env_var }
            }
            other => AppError::Configuration(other.to_string()),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(config_err) => AppError::from(config_err),
            CoreError::Validation { field, message } => AppError::InvalidInput {
                message: format!("{}: {}", field, message),
            },
            CoreError::NotFound { resource } => AppError::NotFound { resource },
            CoreError::Auth(message) => AppError::AuthenticationFailed { message },
            CoreError::Unauthorized { status, body } => AppError::AuthenticationFailed {
                message: format!("HTTP {}: {}", status, body),
            },
            CoreError::PollTimeout(duration) => AppError::Timeout {
                message: format!("Operation timed out after {} seconds", duration.as_secs()),
            },
            CoreError::Cancelled => AppError::Cancelled,
            CoreError::Transport(e) => AppError::ConnectionError {
                message: e.to_string(),
            },
            other => AppError::ApiError {
                message: other.to_string(),
            },
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        AppError::Lifecycle {
            stage: err.stage.to_string(),
            source: Box::new(AppError::from(err.source)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Configuration(format!("{:#}", err))
    }
}
