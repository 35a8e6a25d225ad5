//! In-process interaction source backed by a channel.
//!
//! Embedding code (and the local ingest server) pushes events through a
//! [`HostHandle`]; the tracker consumes them from the attached receiver.

use crate::interaction::types::{HostEvent, PageContext};
use crate::interaction::{InteractionSource, SourceError};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Cloneable handle used to drive a [`ChannelSource`].
#[derive(Clone)]
pub struct HostHandle {
    sender: UnboundedSender<HostEvent>,
    page: Arc<RwLock<PageContext>>,
}

impl HostHandle {
    /// Deliver an event. Returns false once the tracker side is gone.
    pub fn emit(&self, event: HostEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Replace the current page context.
    pub fn set_page(&self, page: PageContext) {
        match self.page.write() {
            Ok(mut current) => *current = page,
            Err(poisoned) => *poisoned.into_inner() = page,
        }
    }

    /// Move to a new page through history navigation (back/forward).
    ///
    /// Like a browser `popstate`, the location changes before the event is
    /// delivered.
    pub fn navigate(&self, page: PageContext) -> bool {
        self.set_page(page);
        self.emit(HostEvent::Navigate)
    }

    pub fn page(&self) -> PageContext {
        match self.page.read() {
            Ok(page) => page.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// An interaction source fed through a [`HostHandle`].
pub struct ChannelSource {
    handle: HostHandle,
    receiver: Mutex<Option<UnboundedReceiver<HostEvent>>>,
}

impl ChannelSource {
    /// Create a source showing `page`.
    pub fn new(page: PageContext) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            handle: HostHandle {
                sender,
                page: Arc::new(RwLock::new(page)),
            },
            receiver: Mutex::new(Some(receiver)),
        }
    }

    /// Get a handle for emitting events into this source.
    pub fn handle(&self) -> HostHandle {
        self.handle.clone()
    }
}

impl InteractionSource for ChannelSource {
    fn attach(&self) -> Result<UnboundedReceiver<HostEvent>, SourceError> {
        let mut slot = match self.receiver.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut receiver = slot.take().ok_or(SourceError::AlreadyAttached)?;

        // Events emitted before attachment were never observed.
        while receiver.try_recv().is_ok() {}
        Ok(receiver)
    }

    fn current_page(&self) -> PageContext {
        self.handle.page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_only_once() {
        let source = ChannelSource::new(PageContext::new("http://localhost/", "Home"));
        assert!(source.attach().is_ok());
        assert!(matches!(source.attach(), Err(SourceError::AlreadyAttached)));
    }

    #[test]
    fn test_navigate_updates_page_before_event() {
        let source = ChannelSource::new(PageContext::new("http://localhost/a", "A"));
        let mut receiver = source.attach().unwrap();
        let handle = source.handle();

        assert!(handle.navigate(PageContext::new("http://localhost/b", "B")));
        assert_eq!(source.current_page().url, "http://localhost/b");
        assert_eq!(receiver.try_recv().unwrap(), HostEvent::Navigate);
    }

    #[test]
    fn test_events_before_attach_are_dropped() {
        let source = ChannelSource::new(PageContext::default());
        let handle = source.handle();
        assert!(handle.emit(HostEvent::Unload));

        let mut receiver = source.attach().unwrap();
        assert!(receiver.try_recv().is_err());

        assert!(handle.emit(HostEvent::Navigate));
        assert_eq!(receiver.try_recv().unwrap(), HostEvent::Navigate);
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let source = ChannelSource::new(PageContext::default());
        let handle = source.handle();
        drop(source.attach().unwrap());
        assert!(!handle.emit(HostEvent::Unload));
    }
}
