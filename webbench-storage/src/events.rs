use std::cell::RefCell;

use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};

/// In-process publish/subscribe. Subscribers whose receiver was dropped are
/// pruned on the next publish.
#[derive(Debug)]
pub struct EventBus<T> {
    subscribers: RefCell<Vec<Sender<T>>>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
        }
    }
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<T> {
        let (sender, receiver) = unbounded();
        self.subscribers.borrow_mut().push(sender);
        receiver
    }

    pub fn publish(&self, event: T) {
        self.subscribers
            .borrow_mut()
            .retain(|sender| match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Saved,
    Added,
    Updated,
    Removed,
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub kind: ChangeKind,
    pub count: usize,
}
