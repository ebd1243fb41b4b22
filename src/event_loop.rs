//! Process-level scheduling: park the main thread forever, or let the caller
//! drain pending messages once per frame.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::EventLoopClosed;
use crate::window;

/// How the event loop schedules the thread that owns it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LoopMode {
    /// [`EventLoop::run`] parks the thread until the process is torn down.
    /// Each window delivers its own events from its driver's thread.
    Block,
    /// [`EventLoop::run`] returns immediately and the caller drains pending
    /// messages with [`EventLoop::poll_events`], typically once per frame.
    Poll,
}

impl Default for LoopMode {
    fn default() -> Self {
        LoopMode::Block
    }
}

/// Owns the message queue that window drivers post into.
///
/// The mode is fixed at construction. Choose it before creating any window;
/// changing strategy while windows exist is not supported.
pub struct EventLoop<T: 'static> {
    mode: LoopMode,
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T: 'static> EventLoop<T> {
    pub fn new(mode: LoopMode) -> Self {
        let live = window::live_windows();
        if live > 0 {
            warn!(
                "Event loop created in {:?} mode while {} window(s) already exist",
                mode, live,
            );
        }
        let (sender, receiver) = mpsc::channel();
        EventLoop {
            mode,
            sender,
            receiver,
        }
    }

    #[inline]
    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    /// Creates a handle that can post messages to this loop from any thread.
    pub fn create_proxy(&self) -> EventLoopProxy<T> {
        EventLoopProxy {
            sender: self.sender.clone(),
        }
    }

    /// Dispatches every message pending right now, without blocking, and
    /// returns how many were dispatched. Messages posted by `callback` are
    /// left for the next call.
    ///
    /// # Panics
    ///
    /// Panics if the loop was created in [`LoopMode::Block`].
    pub fn poll_events<F>(&self, mut callback: F) -> usize
    where
        F: FnMut(T),
    {
        assert_eq!(
            self.mode,
            LoopMode::Poll,
            "poll_events requires an event loop created with LoopMode::Poll",
        );
        let pending: Vec<T> = self.receiver.try_iter().collect();
        let dispatched = pending.len();
        for message in pending {
            callback(message);
        }
        dispatched
    }

    /// Hands the calling thread over to the loop.
    ///
    /// In [`LoopMode::Block`] this never returns. In [`LoopMode::Poll`] it
    /// returns at once.
    pub fn run(self) {
        match self.mode {
            LoopMode::Poll => (),
            LoopMode::Block => {
                debug!("Parking the event loop thread");
                loop {
                    thread::park();
                }
            }
        }
    }
}

impl<T: 'static> Default for EventLoop<T> {
    fn default() -> Self {
        EventLoop::new(LoopMode::default())
    }
}

impl<T: 'static> fmt::Debug for EventLoop<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("mode", &self.mode)
            .finish()
    }
}

/// Posts messages to an [`EventLoop`] from any thread.
pub struct EventLoopProxy<T: 'static> {
    sender: Sender<T>,
}

impl<T: 'static> EventLoopProxy<T> {
    /// Queues `message` for the next [`EventLoop::poll_events`].
    ///
    /// Fails with [`EventLoopClosed`] once the loop has been dropped.
    pub fn send(&self, message: T) -> Result<(), EventLoopClosed> {
        self.sender.send(message).map_err(|_| EventLoopClosed)
    }
}

impl<T: 'static> Clone for EventLoopProxy<T> {
    fn clone(&self) -> Self {
        EventLoopProxy {
            sender: self.sender.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for EventLoopProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad("EventLoopProxy { .. }")
    }
}
