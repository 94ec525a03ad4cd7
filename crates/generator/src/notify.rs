//! Notification queue between background jobs and the control thread
//!
//! Jobs never print to the user directly. They push [`Notification`]s through
//! a [`Notifier`]; the single [`Dispatcher`] drains the queue at a fixed
//! interval so user-facing output stays serial.

use crossbeam::channel::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// How often the dispatcher checks the queue
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub message: String,
}

/// Producer side of the queue; cheap to clone into worker threads
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: Sender<Notification>,
}

impl Notifier {
    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) {
        self.send(Level::Info, title.into(), message.into());
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) {
        self.send(Level::Error, title.into(), message.into());
    }

    fn send(&self, level: Level, title: String, message: String) {
        // The dispatcher may already be gone when the program is exiting
        if self
            .sender
            .send(Notification {
                level,
                title,
                message,
            })
            .is_err()
        {
            debug!("notification dropped, dispatcher closed");
        }
    }
}

/// Consumer side of the queue, owned by the control thread
#[derive(Debug)]
pub struct Dispatcher {
    receiver: Receiver<Notification>,
    interval: Duration,
}

/// Create a connected notifier/dispatcher pair
pub fn channel() -> (Notifier, Dispatcher) {
    let (sender, receiver) = crossbeam::channel::unbounded();
    (
        Notifier { sender },
        Dispatcher {
            receiver,
            interval: POLL_INTERVAL,
        },
    )
}

impl Dispatcher {
    /// Use a different polling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Handle every queued notification without blocking
    ///
    /// # Returns
    /// Number of notifications handled
    pub fn drain<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(Notification),
    {
        let mut handled = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(notification) => {
                    handler(notification);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return handled,
            }
        }
    }

    /// Poll the queue until `job` finishes, then drain what is left
    ///
    /// # Arguments
    /// * `job` - Background thread producing notifications
    /// * `handler` - Called on this thread for each notification, in order
    pub fn run_until<T, F>(&self, job: JoinHandle<T>, mut handler: F) -> thread::Result<T>
    where
        F: FnMut(Notification),
    {
        loop {
            self.drain(&mut handler);
            if job.is_finished() {
                break;
            }
            thread::sleep(self.interval);
        }

        let result = job.join();
        self.drain(&mut handler);
        result
    }
}
