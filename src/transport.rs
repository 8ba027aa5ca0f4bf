//! # AppMessage Transport
//!
//! An in-process stand-in for the watch-to-phone link: two bounded tokio
//! channels carrying encoded dictionaries. The watch endpoint enforces the
//! inbox and outbox buffer sizes the face opened the link with.

use crate::message::{AppMessageResult, Dictionary};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Messages in flight per direction before the sender sees `Busy`.
const CHANNEL_DEPTH: usize = 4;

/// Watch side of the link.
pub struct AppMessage {
    inbox_size: usize,
    outbox_size: usize,
    outbox: mpsc::Sender<Vec<u8>>,
    inbox: mpsc::Receiver<Vec<u8>>,
}

/// Phone side of the link.
pub struct PhoneLink {
    to_watch: mpsc::Sender<Vec<u8>>,
    from_watch: mpsc::Receiver<Vec<u8>>,
}

impl AppMessage {
    /// Open the link with the given buffer sizes in bytes.
    pub fn open(inbox_size: usize, outbox_size: usize) -> (AppMessage, PhoneLink) {
        let (to_phone, from_watch) = mpsc::channel(CHANNEL_DEPTH);
        let (to_watch, from_phone) = mpsc::channel(CHANNEL_DEPTH);
        (
            AppMessage {
                inbox_size,
                outbox_size,
                outbox: to_phone,
                inbox: from_phone,
            },
            PhoneLink {
                to_watch,
                from_watch,
            },
        )
    }

    /// Queue `dict` for the phone.
    pub fn send(&self, dict: &Dictionary) -> Result<(), AppMessageResult> {
        let bytes = dict.encode().map_err(|_| AppMessageResult::SendRejected)?;
        if bytes.len() > self.outbox_size {
            return Err(AppMessageResult::BufferOverflow {
                needed: bytes.len(),
                capacity: self.outbox_size,
            });
        }

        let len = bytes.len();
        self.outbox.try_send(bytes).map_err(|e| match e {
            TrySendError::Full(_) => AppMessageResult::Busy,
            TrySendError::Closed(_) => AppMessageResult::NotConnected,
        })?;
        debug!(bytes = len, "outbox message queued");
        Ok(())
    }

    /// Next inbound message: a dictionary, or the reason it was dropped.
    ///
    /// Returns `None` once the phone side is gone.
    pub async fn recv(&mut self) -> Option<Result<Dictionary, AppMessageResult>> {
        let bytes = self.inbox.recv().await?;
        Some(self.accept(&bytes))
    }

    fn accept(&self, bytes: &[u8]) -> Result<Dictionary, AppMessageResult> {
        if bytes.len() > self.inbox_size {
            return Err(AppMessageResult::BufferOverflow {
                needed: bytes.len(),
                capacity: self.inbox_size,
            });
        }
        Dictionary::decode(bytes).map_err(|e| {
            debug!(error = %e, "inbound message does not decode");
            AppMessageResult::SendRejected
        })
    }
}

impl PhoneLink {
    /// Next raw message from the watch; `None` once the watch side is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.from_watch.recv().await
    }

    /// Deliver `dict` to the watch inbox.
    pub async fn send(&self, dict: &Dictionary) -> Result<(), AppMessageResult> {
        let bytes = dict.encode().map_err(|_| AppMessageResult::SendRejected)?;
        self.send_raw(bytes).await
    }

    /// Deliver already-encoded bytes; the watch validates them on receipt.
    pub async fn send_raw(&self, bytes: Vec<u8>) -> Result<(), AppMessageResult> {
        self.to_watch
            .send(bytes)
            .await
            .map_err(|_| AppMessageResult::Closed)
    }
}
