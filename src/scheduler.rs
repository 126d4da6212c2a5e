// src/scheduler.rs

use async_trait::async_trait;

/// Cooperative suspension hook used by the readiness engine.
///
/// Every wait loop yields through this trait immediately after each poll
/// attempt, so other tasks sharing the scheduler make progress and so
/// tests can observe (or reshape) the suspension points.
#[async_trait]
pub trait Scheduler: Send + Sync + 'static {
  /// Yields control to the scheduler once.
  async fn yield_now(&self);
}

/// Default scheduler: a plain tokio task yield.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioYield;

#[async_trait]
impl Scheduler for TokioYield {
  async fn yield_now(&self) {
    tokio::task::yield_now().await;
  }
}
