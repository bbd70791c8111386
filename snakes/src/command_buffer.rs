use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Heading, Interrupted};

/// Which pending command [`CommandBuffer::pop_latest()`] hands out when there
/// is no backlog.
///
/// `Lifo` lets the newest intent win, which keeps steering responsive.
/// `Fifo` plays quick successive turns back in the order they were made.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferOrder {
    #[default]
    Lifo,
    Fifo,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BufferSettings {
    /// `push()` blocks while this many commands are pending.
    pub capacity: usize,
    /// With more pending commands than this, a pop hands out the newest one
    /// and discards the rest.
    pub overflow_threshold: usize,
    pub order: BufferOrder,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            capacity: 5,
            overflow_threshold: 3,
            order: BufferOrder::Lifo,
        }
    }
}

struct Pending {
    commands: VecDeque<Heading>,
    closed: bool,
}

/// The mailbox between one actor, which pushes headings whenever it likes,
/// and the coordinator, which pops at most one per tick.
pub struct CommandBuffer {
    settings: BufferSettings,
    pending: Mutex<Pending>,
    not_full: Condvar,
}

impl CommandBuffer {
    /// Panics if `settings.capacity` is zero, or not above the overflow
    /// threshold: a full buffer must be able to overflow.
    pub fn new(settings: BufferSettings) -> Self {
        assert!(settings.capacity > 0, "A command buffer needs room for a command");
        assert!(
            settings.capacity > settings.overflow_threshold,
            "Capacity {} never exceeds the overflow threshold {}",
            settings.capacity,
            settings.overflow_threshold
        );
        Self {
            settings,
            pending: Mutex::new(Pending {
                commands: VecDeque::with_capacity(settings.capacity),
                closed: false,
            }),
            not_full: Condvar::new(),
        }
    }

    pub fn settings(&self) -> BufferSettings {
        self.settings
    }

    /// Adds a command, waiting for the coordinator to make room if the
    /// buffer is full.
    ///
    /// Fails once the buffer has been closed, including while waiting.
    pub fn push(&self, heading: Heading) -> Result<(), Interrupted> {
        let mut pending = self.pending.lock();
        while !pending.closed && pending.commands.len() >= self.settings.capacity {
            self.not_full.wait(&mut pending);
        }
        if pending.closed {
            return Err(Interrupted);
        }
        pending.commands.push_back(heading);
        Ok(())
    }

    /// Takes the next command without blocking, or `None` if there is no
    /// new input since the last pop.
    ///
    /// When more than `overflow_threshold` commands have piled up, the newest
    /// one is returned and the rest are dropped.
    pub fn pop_latest(&self) -> Option<Heading> {
        let mut pending = self.pending.lock();
        let backlog = pending.commands.len();
        let heading = if backlog > self.settings.overflow_threshold {
            let newest = pending.commands.pop_back();
            pending.commands.clear();
            debug!(backlog, "Discarded stale commands");
            newest
        } else {
            match self.settings.order {
                BufferOrder::Lifo => pending.commands.pop_back(),
                BufferOrder::Fifo => pending.commands.pop_front(),
            }
        };
        if heading.is_some() {
            self.not_full.notify_all();
        }
        heading
    }

    pub fn len(&self) -> usize {
        self.pending.lock().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wakes every blocked `push()` with an error and rejects later ones.
    pub fn close(&self) {
        let mut pending = self.pending.lock();
        pending.closed = true;
        pending.commands.clear();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.pending.lock().closed
    }
}
