//! Pull loop feeding JetStream deliveries to an [`AnswerConsumer`].

use std::future::Future;
use std::time::Duration;

use async_nats::jetstream::consumer::{Consumer, pull};
use async_nats::jetstream::{self, AckKind};
use futures::StreamExt;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use crate::consumer::{AnswerConsumer, ConsumeOutcome};
use crate::slack_api::ChatApi;
use crate::workflow::WorkflowApi;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to open message stream: {0}")]
    Messages(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Items answered at once; also the pull batch size, so nothing waits
    /// in the client buffer while its ack wait runs down.
    pub concurrency: usize,
    /// Pause between `+WPI` progress acks for an item still being answered.
    pub progress_interval: Duration,
}

/// Processes deliveries until the consumer's message stream ends.
///
/// A delivery is acked after its placeholder was resolved, and terminated
/// when it is not a work item, so JetStream only redelivers items whose
/// worker died mid-answer.
pub async fn run<C: ChatApi, W: WorkflowApi>(
    consumer: Consumer<pull::Config>,
    answers: &AnswerConsumer<C, W>,
    settings: WorkerSettings,
) -> Result<(), WorkerError> {
    let concurrency = settings.concurrency.max(1);
    let messages = consumer
        .stream()
        .max_messages_per_batch(concurrency)
        .messages()
        .await
        .map_err(|e| WorkerError::Messages(e.to_string()))?;

    info!(concurrency, progress_interval = ?settings.progress_interval, "Answer worker started");
    messages
        .for_each_concurrent(concurrency, |delivery| async move {
            match delivery {
                Ok(message) => handle_delivery(answers, message, settings.progress_interval).await,
                Err(e) => warn!(error = %e, "Failed to receive work item"),
            }
        })
        .await;

    info!("Work item stream ended");
    Ok(())
}

async fn handle_delivery<C: ChatApi, W: WorkflowApi>(
    answers: &AnswerConsumer<C, W>,
    message: jetstream::Message,
    progress_interval: Duration,
) {
    let delivery = &message;
    let outcome = with_progress(answers.process(&message.payload), progress_interval, move || async move {
        match delivery.ack_with(AckKind::Progress).await {
            Ok(()) => debug!("Reported work item in progress"),
            Err(e) => warn!(error = %e, "Failed to report work item progress"),
        }
    })
    .await;

    let ack = match outcome {
        ConsumeOutcome::Rejected => message.ack_with(AckKind::Term).await,
        ConsumeOutcome::Completed(_) => message.ack().await,
    };
    if let Err(e) = ack {
        warn!(error = %e, "Failed to acknowledge work item");
    }
}

/// Drives `work` to completion, awaiting `progress` every `interval` until
/// it finishes. The first report comes one interval in.
async fn with_progress<T, F, P, PF>(work: F, interval: Duration, mut progress: P) -> T
where
    F: Future<Output = T>,
    P: FnMut() -> PF,
    PF: Future<Output = ()>,
{
    tokio::pin!(work);
    let mut ticker = interval_at(Instant::now() + interval, interval);
    loop {
        tokio::select! {
            output = &mut work => return output,
            _ = ticker.tick() => progress().await,
        }
    }
}
