//! Keystroke capture: the ring buffer shared between the input thread and
//! the instruction cycle.
//!
//! One producer calls [`Keyboard::push`] as raw bytes arrive; the engine is
//! the only caller of [`Keyboard::pop`]. The interrupt, terminate, and dump
//! flags are sticky atomics. The cursors live behind a mutex because an
//! interrupt byte resets both of them from the producer side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Raw byte that requests an interrupt (Ctrl-C).
pub const INTERRUPT_BYTE: u8 = 0x03;

/// Raw byte that requests a memory dump (Ctrl-D).
pub const DUMP_BYTE: u8 = 0x04;

/// Default ring capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Default number of consecutive interrupt bytes tolerated before terminating.
pub const DEFAULT_TERMINATE_THRESHOLD: u32 = 2;

/// Threshold used by the lenient machine variant.
pub const LENIENT_TERMINATE_THRESHOLD: u32 = 5;

/// What happens when a byte arrives while the ring is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OverflowPolicy {
    /// Cursor-only ring: head advances unconditionally. Once it laps the
    /// tail the unread bytes collapse and only bytes written after the lap
    /// remain readable.
    #[default]
    Wrap,
    /// Track occupancy and evict the oldest unread byte.
    DropOldest,
    /// Track occupancy and discard the incoming byte.
    DropNewest,
}

/// Keystroke capture configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CaptureConfig {
    /// Ring storage size in bytes (at least 1).
    pub capacity: usize,
    /// Terminate once the consecutive interrupt count exceeds this value.
    pub terminate_threshold: u32,
    /// Whether the interrupt byte itself is buffered after the reset.
    pub enqueue_interrupt_byte: bool,
    /// Full-buffer behaviour.
    pub overflow: OverflowPolicy,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            terminate_threshold: DEFAULT_TERMINATE_THRESHOLD,
            enqueue_interrupt_byte: true,
            overflow: OverflowPolicy::Wrap,
        }
    }
}

impl CaptureConfig {
    /// Configuration matching the lenient machine variant.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            terminate_threshold: LENIENT_TERMINATE_THRESHOLD,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct Ring {
    buffer: Box<[u8]>,
    head: usize,
    tail: usize,
    len: usize,
    consecutive_interrupts: u32,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity.max(1)].into_boxed_slice(),
            head: 0,
            tail: 0,
            len: 0,
            consecutive_interrupts: 0,
        }
    }

    fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn pending(&self, policy: OverflowPolicy) -> usize {
        match policy {
            OverflowPolicy::Wrap => (self.head + self.capacity() - self.tail) % self.capacity(),
            OverflowPolicy::DropOldest | OverflowPolicy::DropNewest => self.len,
        }
    }

    fn enqueue(&mut self, byte: u8, policy: OverflowPolicy) {
        let capacity = self.capacity();
        if self.len == capacity {
            match policy {
                OverflowPolicy::Wrap => {}
                OverflowPolicy::DropNewest => return,
                OverflowPolicy::DropOldest => {
                    self.tail = (self.tail + 1) % capacity;
                    self.len -= 1;
                }
            }
        }
        self.buffer[self.head] = byte;
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    fn dequeue(&mut self, policy: OverflowPolicy) -> Option<u8> {
        if self.pending(policy) == 0 {
            return None;
        }
        let byte = self.buffer[self.tail];
        self.tail = (self.tail + 1) % self.capacity();
        self.len = self.len.saturating_sub(1);
        Some(byte)
    }
}

/// Shared keystroke buffer and sticky status flags.
#[derive(Debug)]
pub struct Keyboard {
    config: CaptureConfig,
    ring: Mutex<Ring>,
    interrupt: AtomicBool,
    terminate: AtomicBool,
    dump: AtomicBool,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new(CaptureConfig::default())
    }
}

impl Keyboard {
    /// Creates an empty buffer with the given configuration.
    #[must_use]
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            ring: Mutex::new(Ring::new(config.capacity)),
            interrupt: AtomicBool::new(false),
            terminate: AtomicBool::new(false),
            dump: AtomicBool::new(false),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &CaptureConfig {
        &self.config
    }

    fn ring(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepts one raw input byte. Producer side only.
    pub fn push(&self, byte: u8) {
        if self.terminate.load(Ordering::Acquire) {
            return;
        }

        let mut ring = self.ring();
        if byte == INTERRUPT_BYTE {
            self.interrupt.store(true, Ordering::Release);
            ring.clear();
            ring.consecutive_interrupts = ring.consecutive_interrupts.saturating_add(1);
            if ring.consecutive_interrupts > self.config.terminate_threshold {
                log::info!(
                    "interrupt received {} times in a row; terminating",
                    ring.consecutive_interrupts
                );
                self.terminate.store(true, Ordering::Release);
                return;
            }
            if !self.config.enqueue_interrupt_byte {
                return;
            }
        } else {
            ring.consecutive_interrupts = 0;
            if byte == DUMP_BYTE {
                self.dump.store(true, Ordering::Release);
            }
        }

        ring.enqueue(byte, self.config.overflow);
    }

    /// Removes the oldest buffered byte. Consumer side only.
    pub fn pop(&self) -> Option<u8> {
        self.ring().dequeue(self.config.overflow)
    }

    /// Number of bytes currently readable.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring().pending(self.config.overflow)
    }

    /// Returns true when [`Keyboard::pop`] would return `None`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current value of the interrupt-requested flag.
    #[must_use]
    pub fn interrupt_requested(&self) -> bool {
        self.interrupt.load(Ordering::Acquire)
    }

    /// Reads and clears the interrupt-requested flag.
    pub fn take_interrupt(&self) -> bool {
        self.interrupt.swap(false, Ordering::AcqRel)
    }

    /// Clears the interrupt-requested flag.
    pub fn clear_interrupt(&self) {
        self.interrupt.store(false, Ordering::Release);
    }

    /// True once the terminate threshold was crossed. Never resets.
    #[must_use]
    pub fn terminate_requested(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    /// Reads and clears the dump-requested flag.
    pub fn take_dump_request(&self) -> bool {
        self.dump.swap(false, Ordering::AcqRel)
    }
}
