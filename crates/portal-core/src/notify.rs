//! Notification surface.
//!
//! Any component holding an `Arc<Toaster>` (or an `Arc<dyn Notifier>`) can
//! push messages. Loading toasts stay until dismissed; success and error
//! toasts are picked up by the front-end with `drain`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::{error, info};

/// Capacity of the broadcast channel for subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    Shown(Toast),
    Dismissed(ToastId),
}

pub trait Notifier: Send + Sync {
    fn loading(&self, message: &str) -> ToastId;
    fn success(&self, message: &str) -> ToastId;
    fn error(&self, message: &str) -> ToastId;
    fn dismiss(&self, id: ToastId);
}

pub struct Toaster {
    next_id: AtomicU64,
    active: Mutex<Vec<Toast>>,
    events: broadcast::Sender<ToastEvent>,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Toaster {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            next_id: AtomicU64::new(1),
            active: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Receive every toast shown or dismissed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.events.subscribe()
    }

    /// Snapshot of toasts currently on screen.
    pub fn active(&self) -> Vec<Toast> {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Take the success and error toasts, leaving loading toasts in place.
    pub fn drain(&self) -> Vec<Toast> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        let (loading, done): (Vec<_>, Vec<_>) = active
            .drain(..)
            .partition(|t| t.kind == ToastKind::Loading);
        *active = loading;
        done
    }

    fn push(&self, kind: ToastKind, message: &str) -> ToastId {
        let id = ToastId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let toast = Toast {
            id,
            kind,
            message: message.to_string(),
        };
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(toast.clone());
        // No subscribers is fine
        let _ = self.events.send(ToastEvent::Shown(toast));
        id
    }
}

impl Notifier for Toaster {
    fn loading(&self, message: &str) -> ToastId {
        self.push(ToastKind::Loading, message)
    }

    fn success(&self, message: &str) -> ToastId {
        info!(text = message, "Notification shown");
        self.push(ToastKind::Success, message)
    }

    fn error(&self, message: &str) -> ToastId {
        error!(text = message, "Error notification shown");
        self.push(ToastKind::Error, message)
    }

    fn dismiss(&self, id: ToastId) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|t| t.id != id);
        let _ = self.events.send(ToastEvent::Dismissed(id));
    }
}
