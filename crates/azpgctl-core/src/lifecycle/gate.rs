//! Gates that run between lifecycle phases
//!
//! A gate decides when the next phase may start: immediately, after a fixed
//! delay, once the server reports ready, or (in the CLI) when the operator
//! presses Enter.

use std::time::Duration;

use async_trait::async_trait;

use super::LifecycleStage;
use crate::client::ResourceClient;
use crate::error::Result;
use crate::progress::{LroOptions, cancellable};
use crate::servers::wait_for_server_ready;

/// What a gate may inspect before letting a phase start
pub struct GateContext<'a> {
    pub client: &'a ResourceClient,
    pub resource_group: &'a str,
    /// The server the coming phase acts on
    pub server_name: &'a str,
    pub options: &'a LroOptions,
}

#[async_trait]
pub trait PhaseGate: Send + Sync {
    /// Return once `next` may start; an error aborts the lifecycle.
    async fn wait(&self, next: LifecycleStage, ctx: &GateContext<'_>) -> Result<()>;
}

/// Proceed immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGate;

#[async_trait]
impl PhaseGate for NoGate {
    async fn wait(&self, _next: LifecycleStage, _ctx: &GateContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Sleep for a fixed duration
#[derive(Debug, Clone, Copy)]
pub struct DelayGate(pub Duration);

#[async_trait]
impl PhaseGate for DelayGate {
    async fn wait(&self, next: LifecycleStage, ctx: &GateContext<'_>) -> Result<()> {
        tracing::info!("Waiting {:?} before {}", self.0, next);
        cancellable(ctx.options.cancel.as_ref(), tokio::time::sleep(self.0)).await
    }
}

/// Wait for `properties.userVisibleState` to become `Ready`
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadinessGate;

#[async_trait]
impl PhaseGate for ReadinessGate {
    async fn wait(&self, next: LifecycleStage, ctx: &GateContext<'_>) -> Result<()> {
        tracing::info!("Waiting for {} to be ready before {}", ctx.server_name, next);
        wait_for_server_ready(ctx.client, ctx.resource_group, ctx.server_name, ctx.options)
            .await
            .map(|_| ())
    }
}
