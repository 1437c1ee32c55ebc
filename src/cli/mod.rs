pub mod commands;
pub mod handlers;
use crate::error::{AnnotationError, Error, KeyError, ParseError, SignError};

pub use commands::{AnnotationArgs, DocumentCommands, KeyCommands, SignatureCommands};
pub use handlers::{handle_document_command, handle_key_command, handle_signature_command};

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLI_NAME: &str = "pdfseal";

pub fn format_error(error: &Error) -> String {
    match error {
        Error::Io(err) => format!("IO error: {err}"),
        Error::Parse(ParseError::NotAPdf) => "Not a PDF: missing %PDF- header".to_string(),
        Error::Parse(err) => format!("PDF error: {err}"),
        Error::Annotation(AnnotationError::NoValidPages) => {
            "Annotation error: none of the selected pages exist in this document".to_string()
        }
        Error::Annotation(err) => format!("Annotation error: {err}"),
        Error::Key(KeyError::FingerprintMismatch { expected, actual }) => format!(
            "Key error: key file fingerprint {expected} does not match its public key ({actual})"
        ),
        Error::Key(err) => format!("Key error: {err}"),
        Error::Sign(SignError::InvalidKey(msg)) => {
            format!("Signing error: unusable private key: {msg}")
        }
        Error::Sign(err) => format!("Signing error: {err}"),
        Error::Validation(msg) => format!("Validation error: {msg}"),
        Error::Serialization(msg) => format!("Serialization error: {msg}"),
        Error::InitializationError(msg) => format!("Initialization error: {msg}"),
        Error::HexDecode(err) => format!("Hex decode error: {err}"),
        Error::Json(err) => format!("JSON error: {err}"),
    }
}

/// Helper function to print validation warnings to the user
pub fn print_validation_warning(message: &str) {
    eprintln!("Warning: {message}");
}

// Shared functionality for progress indication
pub mod progress {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Duration;

    /// A spinner with `message`, or a hidden bar when progress is disabled.
    pub fn spinner(message: &str, enabled: bool) -> ProgressBar {
        if !enabled {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}
