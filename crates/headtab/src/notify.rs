//! Application notifications
//!
//! Gesture handlers run on the frame path and must not call into application
//! code directly. They post a notification instead, and the application
//! drains the queue from its own context with [`Notifier::dispatch`].

use std::sync::mpsc::{self, Receiver, Sender};

/// Something the application should hear about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppNotification {
    /// The user released a pull past the threshold
    StartRefresh,
    /// A pull crossed the refresh threshold for the first time
    PullEnough,
    /// A tab switch was requested
    IndexChange(i32),
}

/// Posting side of the notification queue. Cheap to clone.
#[derive(Clone)]
pub struct NotificationSender {
    tx: Sender<AppNotification>,
}

impl NotificationSender {
    /// Fire and forget. A closed queue only means nobody is listening.
    pub fn send(&self, notification: AppNotification) {
        tracing::debug!(?notification, "posting notification");
        if self.tx.send(notification).is_err() {
            tracing::trace!(?notification, "notification dropped, receiver gone");
        }
    }
}

type Callback = Box<dyn FnMut() + Send>;
type IndexCallback = Box<dyn FnMut(i32) + Send>;

/// Application callbacks for each notification kind
#[derive(Default)]
pub struct NotificationHandlers {
    pub on_start_refresh: Option<Callback>,
    pub on_pull_enough: Option<Callback>,
    pub on_index_change: Option<IndexCallback>,
}

/// Receiving side of the notification queue plus the callbacks it feeds
pub struct Notifier {
    tx: Sender<AppNotification>,
    rx: Receiver<AppNotification>,
    handlers: NotificationHandlers,
}

impl Notifier {
    pub fn new(handlers: NotificationHandlers) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, handlers }
    }

    pub fn sender(&self) -> NotificationSender {
        NotificationSender {
            tx: self.tx.clone(),
        }
    }

    pub fn has_start_refresh_handler(&self) -> bool {
        self.handlers.on_start_refresh.is_some()
    }

    /// Take every queued notification without running callbacks
    pub fn drain(&self) -> Vec<AppNotification> {
        self.rx.try_iter().collect()
    }

    /// Run the callback of every queued notification, in posting order.
    /// Returns how many notifications were drained.
    pub fn dispatch(&mut self) -> usize {
        let mut count = 0;
        while let Ok(notification) = self.rx.try_recv() {
            count += 1;
            match notification {
                AppNotification::StartRefresh => {
                    if let Some(callback) = self.handlers.on_start_refresh.as_mut() {
                        callback();
                    }
                }
                AppNotification::PullEnough => {
                    if let Some(callback) = self.handlers.on_pull_enough.as_mut() {
                        callback();
                    }
                }
                AppNotification::IndexChange(index) => {
                    if let Some(callback) = self.handlers.on_index_change.as_mut() {
                        callback(index);
                    }
                }
            }
        }
        count
    }
}
