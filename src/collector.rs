use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::stats::Outcome;

/// Receiving end of the outcome stream. Yields every emitted outcome in
/// arrival order and ends once all senders are gone.
#[derive(Debug)]
pub struct Collector {
    rx: UnboundedReceiver<Outcome>,
}

pub fn channel() -> (UnboundedSender<Outcome>, Collector) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Collector { rx })
}

impl Collector {
    pub async fn recv(&mut self) -> Option<Outcome> {
        self.rx.recv().await
    }
}

impl Stream for Collector {
    type Item = Outcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Outcome>> {
        self.rx.poll_recv(cx)
    }
}
