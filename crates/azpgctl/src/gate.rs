//! Interactive phase gate

use async_trait::async_trait;
use azpgctl_core::lifecycle::{GateContext, PhaseGate};
use azpgctl_core::{CoreError, LifecycleStage};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Stdin};
use tokio::sync::Mutex;

/// Waits for the operator to press Enter before each phase
///
/// One buffered reader is shared by every gate so lines typed ahead (or
/// piped in) are consumed one per phase.
pub struct PromptGate<R = Stdin> {
    input: Mutex<BufReader<R>>,
}

impl PromptGate {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin> PromptGate<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(BufReader::new(input)),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> PhaseGate for PromptGate<R> {
    async fn wait(&self, next: LifecycleStage, ctx: &GateContext<'_>) -> azpgctl_core::Result<()> {
        eprintln!(
            "Next: {} on {}. Press Enter to continue...",
            next, ctx.server_name
        );

        let mut line = String::new();
        let mut input = self.input.lock().await;
        let read = input.read_line(&mut line);

        let bytes = match ctx.options.cancel.as_ref() {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(CoreError::Cancelled),
                read = read => read,
            },
            None => read.await,
        };

        // EOF or an unreadable stdin stops the run like Ctrl-C would
        match bytes {
            Ok(0) => Err(CoreError::Cancelled),
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!("Failed to read stdin: {}", e);
                Err(CoreError::Cancelled)
            }
        }
    }
}
