//! Simple stateless pub-sub event handler
//!
//! This module provides a simple hook system that allows components of the system to subscribe to marketplace events
//! and react to them. The event handler is stateless, i.e. the handlers have no access to the internal state of the
//! system. All that is received is the event itself.
//!
//! However, the handlers can be async.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for in-flight handlers to finish.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Drop the internal sender so that the loop ends when the last producer goes away
        drop(self.sender);
        let jobs = Arc::new(AtomicI64::new(0));
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            jobs.fetch_add(1, Ordering::SeqCst);
            let job = jobs.clone();
            tokio::spawn(async move {
                (handler)(ev).await;
                job.fetch_sub(1, Ordering::SeqCst);
                trace!("📬️ Event handled");
            });
        }
        while jobs.load(Ordering::SeqCst) > 0 {
            debug!("📬️ Waiting for {} event jobs to complete", jobs.load(Ordering::SeqCst));
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Delivery is best-effort. A closed channel is logged and otherwise ignored.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
