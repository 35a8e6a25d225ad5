//! Interaction sources for the activity tracker.
//!
//! The tracker never talks to a browser directly. A host environment
//! implements [`InteractionSource`] and delivers clicks, input, scrolls,
//! visibility changes, navigation and unload as [`HostEvent`]s.

pub mod channel;
pub mod types;

pub use channel::{ChannelSource, HostHandle};
pub use types::{Dimensions, ElementInfo, HostEvent, PageContext, ScrollMetrics};

use tokio::sync::mpsc::UnboundedReceiver;

/// Host capability the tracker listens to.
pub trait InteractionSource: Send + Sync {
    /// Attach to the host and receive its events. A source can be attached
    /// only once.
    fn attach(&self) -> Result<UnboundedReceiver<HostEvent>, SourceError>;

    /// The page as the host reports it right now.
    fn current_page(&self) -> PageContext;
}

/// Errors raised while attaching to a source.
#[derive(Debug)]
pub enum SourceError {
    AlreadyAttached,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::AlreadyAttached => write!(f, "Interaction source is already attached"),
        }
    }
}

impl std::error::Error for SourceError {}
