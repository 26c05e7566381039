//! Spinner output for long-running operations
//!
//! Turns the core's progress events into an indicatif spinner on stderr.

use std::sync::Arc;
use std::time::Duration;

use azpgctl_core::{LroOptions, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

/// A spinner wired to the progress callback of an [`LroOptions`]
pub struct Spinner {
    pb: ProgressBar,
    options: LroOptions,
}

impl Spinner {
    pub fn new(message: impl Into<String>, cancel: CancellationToken) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.into());
        pb.enable_steady_tick(Duration::from_millis(120));

        let pb_clone = pb.clone();
        let options = LroOptions::default()
            .with_cancel(cancel)
            .with_progress(Arc::new(move |event: ProgressEvent| match &event {
                ProgressEvent::Started { operation } => {
                    pb_clone.set_message(format!("{} accepted", short_operation(operation)));
                }
                ProgressEvent::Polling {
                    operation, status, ..
                } => {
                    pb_clone.set_message(format!(
                        "{}: {}",
                        short_operation(operation),
                        format_state(status)
                    ));
                }
                ProgressEvent::Completed { operation } => {
                    pb_clone.set_message(format!(
                        "{}: {}",
                        short_operation(operation),
                        format_state("succeeded")
                    ));
                }
                ProgressEvent::Failed { operation, error } => {
                    pb_clone.set_message(format!(
                        "{} failed: {}",
                        short_operation(operation),
                        error
                    ));
                }
            }));

        Self { pb, options }
    }

    pub fn options(&self) -> &LroOptions {
        &self.options
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// `PUT /subscriptions/.../servers/s1` -> `PUT servers/s1`
fn short_operation(operation: &str) -> String {
    let Some((verb, path)) = operation.split_once(' ') else {
        return operation.to_string();
    };
    let tail: Vec<&str> = path.rsplit('/').take(2).collect();
    match tail.as_slice() {
        [name, kind] => format!("{} {}/{}", verb, kind, name),
        _ => operation.to_string(),
    }
}

/// Format an operation state for display with status icons
fn format_state(state: &str) -> String {
    match state.to_lowercase().as_str() {
        "succeeded" | "ready" => format!("\u{2713} {}", state), // checkmark
        "failed" => format!("\u{2717} {}", state),              // x mark
        "canceled" | "cancelled" => format!("\u{2298} {}", state), // circle slash
        "inprogress" | "creating" | "updating" | "deleting" => format!("\u{21bb} {}", state),
        _ => state.to_string(),
    }
}
