//! Worker/UI hand-off.
//!
//! Network work runs on tokio worker tasks spawned through a [`Dispatcher`].
//! Each task produces a [`Completion`] that is delivered to the single
//! [`UiQueue`]; only the owner of the queue writes pins and photos, so store
//! mutations are serialized without locks.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::error::AppResult;
use crate::models::SearchPage;

/// Result of one piece of worker-side work.
#[derive(Debug)]
pub enum Completion {
    Search {
        pin_id: String,
        page: u32,
        result: AppResult<SearchPage>,
    },
    Image {
        photo_id: String,
        /// Stored file path on success.
        result: AppResult<String>,
    },
}

type Delivery = Result<Completion, JoinError>;

/// Worker-side handle. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Delivery>,
    in_flight: Arc<AtomicUsize>,
}

/// UI-side end of the channel.
pub struct UiQueue {
    rx: mpsc::UnboundedReceiver<Delivery>,
    in_flight: Arc<AtomicUsize>,
}

pub fn channel() -> (Dispatcher, UiQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    let in_flight = Arc::new(AtomicUsize::new(0));
    (
        Dispatcher {
            tx,
            in_flight: in_flight.clone(),
        },
        UiQueue { rx, in_flight },
    )
}

impl Dispatcher {
    /// Run `work` on a worker task and deliver its completion to the UI queue.
    pub fn spawn<F>(&self, work: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let tx = self.tx.clone();
        let in_flight = self.in_flight.clone();

        tokio::spawn(async move {
            let delivery = tokio::spawn(work).await;
            if tx.send(delivery).is_err() {
                // UI queue is gone; nobody will consume this.
                in_flight.fetch_sub(1, Ordering::SeqCst);
                tracing::warn!("UI queue closed, dropping completion");
            }
        });
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl UiQueue {
    /// Next completion, waiting for running work. `None` once nothing is
    /// outstanding.
    pub async fn next(&mut self) -> Option<Completion> {
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            let delivery = self.rx.recv().await?;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match delivery {
                Ok(completion) => return Some(completion),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }
        None
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
    }
}
