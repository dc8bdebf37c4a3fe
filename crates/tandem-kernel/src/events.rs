//! Mismatch events and the listener registry.
//!
//! Listeners run synchronously inside the `record_*` call that detected
//! the mismatch, in registration order, exactly once per newly flagged
//! `(frame, player)` pair. They receive only the event, never the kernel,
//! so a listener cannot re-enter the kernel that is notifying it.

use crossbeam_channel::{Receiver, Sender};
use tandem_core::{FrameNumber, PlayerId};

/// A peer's frame hash disagrees with the local one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHashMismatch {
    /// Frame the hashes describe.
    pub frame: FrameNumber,
    /// The disagreeing peer.
    pub player_id: PlayerId,
    /// Locally computed hash.
    pub local_hash: u32,
    /// Hash the peer reported.
    pub remote_hash: u32,
}

/// A peer's GameLogic CRC disagrees with the local one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameLogicCrcMismatch {
    /// Frame the CRCs describe.
    pub frame: FrameNumber,
    /// The disagreeing peer.
    pub player_id: PlayerId,
    /// Locally computed CRC.
    pub local_crc: u32,
    /// CRC the peer reported.
    pub remote_crc: u32,
}

/// Handle returned by `on_*` registration, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener<E> = Box<dyn FnMut(&E) + Send>;

pub(crate) struct Listeners<E> {
    next_id: u64,
    entries: Vec<(ListenerId, Listener<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> Listeners<E> {
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Build a listener that forwards events into a channel.
///
/// Register the returned closure with the kernel and hand the receiver to
/// whichever thread reports divergence. Events are dropped silently once
/// the receiver is gone.
///
/// ```
/// use tandem_kernel::{mismatch_channel, FrameHashMismatch, StateKernel};
///
/// let mut kernel = StateKernel::default();
/// let (listener, rx) = mismatch_channel::<FrameHashMismatch>();
/// kernel.on_frame_hash_mismatch(listener);
///
/// kernel.record_local_frame_hash(Some(1), Some(10));
/// kernel.record_remote_frame_hash(1, 2, 11);
///
/// assert_eq!(rx.try_recv().unwrap().player_id, 2);
/// ```
pub fn mismatch_channel<E>() -> (impl FnMut(&E) + Send + 'static, Receiver<E>)
where
    E: Clone + Send + 'static,
{
    let (tx, rx): (Sender<E>, Receiver<E>) = crossbeam_channel::unbounded();
    let listener = move |event: &E| {
        let _ = tx.send(event.clone());
    };
    (listener, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn emit_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners: Listeners<u32> = Listeners::default();
        for tag in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            listeners.subscribe(move |v: &u32| log.lock().unwrap().push(format!("{tag}{v}")));
        }
        listeners.emit(&7);
        assert_eq!(*log.lock().unwrap(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let hits = Arc::new(Mutex::new(0u32));
        let mut listeners: Listeners<u32> = Listeners::default();
        let h = Arc::clone(&hits);
        let first = listeners.subscribe(move |_| *h.lock().unwrap() += 1);
        let h = Arc::clone(&hits);
        listeners.subscribe(move |_| *h.lock().unwrap() += 10);

        assert!(listeners.unsubscribe(first));
        assert!(!listeners.unsubscribe(first));
        listeners.emit(&0);
        assert_eq!(*hits.lock().unwrap(), 10);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn channel_listener_survives_dropped_receiver() {
        let (mut listener, rx) = mismatch_channel::<u32>();
        listener(&1);
        assert_eq!(rx.try_recv(), Ok(1));
        drop(rx);
        listener(&2);
    }
}
