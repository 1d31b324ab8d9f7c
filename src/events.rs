//! Host notifications
//!
//! Events are pushed into unbounded channels and never block the grid. A
//! subscriber that dropped its receiver is forgotten on the next send.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tiny_tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    SelectionChanged(Option<NodeId>),
    /// Carries the topmost aggregate ancestor of the edited node
    ValueCommitted(NodeId),
    NodeExpanded(NodeId),
    NodeCollapsed(NodeId),
    RightClick(NodeId),
}

#[derive(Default)]
pub struct EventHub {
    subscribers: Vec<Sender<GridEvent>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<GridEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: GridEvent) {
        log::trace!("event {:?}", event);
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_tree::PropertyTree;

    #[test]
    fn test_dropped_receiver_is_forgotten() {
        let mut hub = EventHub::new();
        let kept = hub.subscribe();
        let dropped = hub.subscribe();
        drop(dropped);

        let id = PropertyTree::default().root();
        hub.emit(GridEvent::RightClick(id));
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(GridEvent::RightClick(id)));
    }
}
