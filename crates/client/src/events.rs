//! Command lifecycle events
//!
//! Every command sent to the service emits `CommandStarted` and then either
//! `CommandSucceeded` or `CommandFailed`. Listeners are plain callbacks
//! registered on the client; they are independent of `tracing` output.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::config::EventFilter;

/// Where a command was sent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandTarget {
    /// Keyspace of the command
    pub keyspace: String,
    /// Collection or table name; `None` for keyspace-level commands
    pub name: Option<String>,
}

impl CommandTarget {
    /// A keyspace-level target
    pub fn keyspace(keyspace: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: None,
        }
    }

    /// A collection or table target
    pub fn named(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: Some(name.into()),
        }
    }
}

impl std::fmt::Display for CommandTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}.{}", self.keyspace, name),
            None => f.write_str(&self.keyspace),
        }
    }
}

/// A command lifecycle event
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEvent {
    /// The command is about to be sent
    Started {
        /// Command name, e.g. `insertOne`
        command: String,
        /// Where it is sent
        target: CommandTarget,
        /// Request timeout in effect
        timeout: Duration,
    },
    /// The server answered without errors
    Succeeded {
        /// Command name
        command: String,
        /// Where it was sent
        target: CommandTarget,
        /// Time from send to decoded response
        elapsed: Duration,
    },
    /// The command failed in transport or on the server
    Failed {
        /// Command name
        command: String,
        /// Where it was sent
        target: CommandTarget,
        /// Time from send to failure
        elapsed: Duration,
        /// Rendered error
        error: String,
    },
}

impl CommandEvent {
    /// Command name carried by the event
    pub fn command(&self) -> &str {
        match self {
            CommandEvent::Started { command, .. }
            | CommandEvent::Succeeded { command, .. }
            | CommandEvent::Failed { command, .. } => command,
        }
    }

    fn is_failure(&self) -> bool {
        matches!(self, CommandEvent::Failed { .. })
    }
}

/// Receives command events
pub trait EventListener: Send + Sync {
    /// Called synchronously on the thread that ran the command
    fn on_event(&self, event: &CommandEvent);
}

impl<F> EventListener for F
where
    F: Fn(&CommandEvent) + Send + Sync,
{
    fn on_event(&self, event: &CommandEvent) {
        self(event)
    }
}

/// Listener registry shared by a client and everything derived from it
pub(crate) struct EventBus {
    filter: EventFilter,
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventBus {
    pub(crate) fn new(filter: EventFilter) -> Self {
        Self {
            filter,
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, listener: Arc<dyn EventListener>) {
        self.listeners.write().push(listener);
    }

    pub(crate) fn emit(&self, event: CommandEvent) {
        let wanted = match self.filter {
            EventFilter::All => true,
            EventFilter::Failures => event.is_failure(),
            EventFilter::None => false,
        };
        if !wanted {
            return;
        }
        // Snapshot so a listener may register another listener.
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in listeners {
            listener.on_event(&event);
        }
    }
}
