//! Bounded outbound mail queue with a single throttled consumer.
//!
//! [`MailQueue`] is the cloneable producer handle. [`MailWorker`] owns the
//! receiving end and the throttle state, so there is exactly one consumer.
//! Every dequeue waits for the current window to pass since the previous one.
//! A failed send multiplies the window by [`BACKOFF_FACTOR`] for all mail; a
//! successful send resets it to the baseline.

use metrics::counter;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::Instant;

/// Default number of packages the queue holds before producers wait.
pub const QUEUE_CAPACITY: usize = 100;

/// Attempts made for one package before it is dropped.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 2;

/// Window multiplier applied after a failed send.
pub const BACKOFF_FACTOR: u32 = 3;

/// One outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct MailPackage {
    /// SMTP relay host.
    pub host: String,
    pub from: String,
    pub to: Vec<String>,
    /// Fully rendered message.
    pub message: Vec<u8>,
    /// Failed attempts so far.
    pub retries: u32,
}

impl MailPackage {
    pub fn new(host: impl Into<String>, from: impl Into<String>, to: Vec<String>, message: Vec<u8>) -> Self {
        Self {
            host: host.into(),
            from: from.into(),
            to,
            message,
            retries: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MailError {
    #[error("mail queue is closed")]
    QueueClosed,

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Transport that delivers a rendered package.
#[async_trait::async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, package: &MailPackage) -> Result<(), MailError>;
}

/// Producer handle for the mail queue.
#[derive(Debug, Clone)]
pub struct MailQueue {
    sender: mpsc::Sender<MailPackage>,
}

impl MailQueue {
    /// Add a package, waiting while the queue is full.
    pub async fn enqueue(&self, package: MailPackage) -> Result<(), MailError> {
        self.sender
            .send(package)
            .await
            .map_err(|_| MailError::QueueClosed)
    }
}

/// What happened to the package handled by one [`MailWorker::deliver_next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Requeued,
    Dropped,
}

/// A package waiting for another attempt.
struct Retry {
    /// Channel items still to be served before this one.
    ahead: usize,
    package: MailPackage,
}

/// The queue's only consumer.
pub struct MailWorker {
    receiver: mpsc::Receiver<MailPackage>,
    pending: VecDeque<Retry>,
    sender: Arc<dyn MailSender>,
    baseline: Duration,
    window: Duration,
    next_allowed: Instant,
}

/// Create a queue holding up to `capacity` packages, throttled to one
/// dequeue per `timespan` while deliveries succeed.
pub fn mail_queue(
    capacity: usize,
    timespan: Duration,
    sender: Arc<dyn MailSender>,
) -> (MailQueue, MailWorker) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let worker = MailWorker {
        receiver: rx,
        pending: VecDeque::new(),
        sender,
        baseline: timespan,
        window: timespan,
        next_allowed: Instant::now(),
    };
    (MailQueue { sender: tx }, worker)
}

impl MailWorker {
    /// Current throttle window.
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn baseline(&self) -> Duration {
        self.baseline
    }

    /// Packages waiting for another attempt.
    pub fn pending_retries(&self) -> usize {
        self.pending.len()
    }

    /// Deliver packages until every producer is gone and no retries remain.
    pub async fn run(mut self) {
        tracing::info!(window_secs = self.baseline.as_secs_f64(), "Mail worker started");
        while self.deliver_next().await.is_some() {}
        tracing::info!("Mail worker stopped");
    }

    /// Take the next package and attempt delivery once.
    ///
    /// Returns `None` when the queue is closed and drained.
    pub async fn deliver_next(&mut self) -> Option<DeliveryOutcome> {
        let mut package = self.dequeue().await?;

        match self.sender.send(&package).await {
            Ok(()) => {
                self.window = self.baseline;
                counter!("invite_mail_sent_total").increment(1);
                tracing::info!(recipients = ?package.to, "Mail delivered");
                Some(DeliveryOutcome::Sent)
            }
            Err(err) => {
                package.retries += 1;
                self.window = self.window.saturating_mul(BACKOFF_FACTOR);
                counter!("invite_mail_failed_total").increment(1);

                if package.retries < MAX_DELIVERY_ATTEMPTS {
                    tracing::warn!(
                        recipients = ?package.to,
                        attempt = package.retries,
                        window_secs = self.window.as_secs_f64(),
                        error = %err,
                        "Mail delivery failed, will retry"
                    );
                    self.requeue(package);
                    Some(DeliveryOutcome::Requeued)
                } else {
                    counter!("invite_mail_dropped_total").increment(1);
                    tracing::error!(
                        recipients = ?package.to,
                        attempts = package.retries,
                        error = %err,
                        "Mail delivery failed, dropping message"
                    );
                    Some(DeliveryOutcome::Dropped)
                }
            }
        }
    }

    /// Put a failed package at the tail: behind everything waiting in the
    /// channel now, ahead of anything enqueued later.
    fn requeue(&mut self, package: MailPackage) {
        let ahead = self.receiver.len();
        self.pending.push_back(Retry { ahead, package });
    }

    async fn dequeue(&mut self) -> Option<MailPackage> {
        tokio::time::sleep_until(self.next_allowed).await;

        let retry_due = self.pending.front().is_some_and(|retry| retry.ahead == 0);
        let package = if retry_due {
            self.pop_retry()?
        } else {
            match self.receiver.try_recv() {
                Ok(package) => {
                    for retry in self.pending.iter_mut() {
                        retry.ahead = retry.ahead.saturating_sub(1);
                    }
                    package
                }
                Err(TryRecvError::Empty) => match self.pop_retry() {
                    Some(package) => package,
                    None => self.receiver.recv().await?,
                },
                Err(TryRecvError::Disconnected) => self.pop_retry()?,
            }
        };

        self.next_allowed = Instant::now() + self.window;
        Some(package)
    }

    fn pop_retry(&mut self) -> Option<MailPackage> {
        self.pending.pop_front().map(|retry| retry.package)
    }
}
