//! # Barcode Scanner Buffer
//!
//! Tells a hardware scanner apart from a human typing, using nothing but
//! the gap between keystrokes.
//!
//! USB barcode scanners present themselves as keyboards and "type" the
//! code followed by Enter, a few milliseconds per key. People are much
//! slower. Every keystroke on the screen is fed through here with its
//! timestamp.
//!
//! ## Timing
//! ```text
//! time (ms)   0    8   16   24  ...  72   80
//! key         2    0    0    0  ...   1   ⏎
//!             │    │    │    │        │   │
//!             ▼    ▼    ▼    ▼        ▼   ▼
//! state     Empty→Accumulating ──────────► Flushed("2000000001") → Empty
//!
//! gap ≤ 50 ms (interval)      → accepted
//! gap > 50 ms, buffer holding → ignored (buffer kept)
//! 100 ms after last accepted  → buffer abandoned (reset deadline)
//! ```
//!
//! The state machine never reads a clock: the caller passes `now_ms` into
//! every call, which is what makes the timing testable without sleeping.

/// Max gap between accepted keys of one scan.
pub const SCAN_INTERVAL_MS: u64 = 50;

/// Extra wait past the interval before a half-typed buffer is dropped.
pub const SCAN_RESET_GRACE_MS: u64 = 50;

/// The keys the scanner cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKey {
    Char(char),
    Enter,
}

impl ScanKey {
    /// Maps a DOM-style key name: single characters and `"Enter"` only.
    ///
    /// ```rust
    /// use till_core::scanner::ScanKey;
    ///
    /// assert_eq!(ScanKey::from_key_name("7"), Some(ScanKey::Char('7')));
    /// assert_eq!(ScanKey::from_key_name("Enter"), Some(ScanKey::Enter));
    /// assert_eq!(ScanKey::from_key_name("Shift"), None);
    /// ```
    pub fn from_key_name(name: &str) -> Option<ScanKey> {
        if name == "Enter" {
            return Some(ScanKey::Enter);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(ScanKey::Char(c)),
            _ => None,
        }
    }
}

/// Timing parameters, normally from the register config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTiming {
    pub interval_ms: u64,
    pub reset_grace_ms: u64,
}

impl ScanTiming {
    /// How long after the last accepted character the buffer survives.
    pub fn reset_after_ms(&self) -> u64 {
        self.interval_ms + self.reset_grace_ms
    }
}

impl Default for ScanTiming {
    fn default() -> Self {
        ScanTiming {
            interval_ms: SCAN_INTERVAL_MS,
            reset_grace_ms: SCAN_RESET_GRACE_MS,
        }
    }
}

/// Buffer state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Empty,
    Accumulating {
        buffer: String,
        last_key_ms: u64,
        reset_at_ms: u64,
    },
}

/// What one keystroke did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Too late after the previous key, or not a key the scanner reads.
    Ignored,
    /// Character appended.
    Buffered,
    /// Enter on an empty buffer.
    Idle,
    /// Enter completed a code.
    Flushed(String),
}

/// Keystroke-timing barcode buffer.
#[derive(Debug, Clone, Default)]
pub struct ScanBuffer {
    state: ScanState,
    timing: ScanTiming,
    /// Time of the last accepted key, including an Enter on an empty buffer.
    last_accepted_ms: Option<u64>,
}

impl ScanBuffer {
    pub fn new(timing: ScanTiming) -> Self {
        ScanBuffer {
            timing,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Characters collected so far.
    pub fn buffer(&self) -> &str {
        match &self.state {
            ScanState::Empty => "",
            ScanState::Accumulating { buffer, .. } => buffer,
        }
    }

    /// When the pending buffer will be abandoned, if any.
    pub fn reset_deadline(&self) -> Option<u64> {
        match &self.state {
            ScanState::Empty => None,
            ScanState::Accumulating { reset_at_ms, .. } => Some(*reset_at_ms),
        }
    }

    /// Feeds one keystroke.
    pub fn key(&mut self, key: ScanKey, now_ms: u64) -> ScanOutcome {
        self.tick(now_ms);

        let within_interval = self
            .last_accepted_ms
            .map(|last| now_ms.saturating_sub(last) <= self.timing.interval_ms)
            .unwrap_or(false);

        if !within_interval && self.state != ScanState::Empty {
            return ScanOutcome::Ignored;
        }
        self.last_accepted_ms = Some(now_ms);

        match key {
            ScanKey::Enter => match std::mem::take(&mut self.state) {
                ScanState::Empty => ScanOutcome::Idle,
                ScanState::Accumulating { buffer, .. } => ScanOutcome::Flushed(buffer),
            },
            ScanKey::Char(c) => {
                let reset_at_ms = now_ms + self.timing.reset_after_ms();
                match &mut self.state {
                    ScanState::Empty => {
                        self.state = ScanState::Accumulating {
                            buffer: c.to_string(),
                            last_key_ms: now_ms,
                            reset_at_ms,
                        };
                    }
                    ScanState::Accumulating {
                        buffer,
                        last_key_ms,
                        reset_at_ms: deadline,
                    } => {
                        buffer.push(c);
                        *last_key_ms = now_ms;
                        *deadline = reset_at_ms;
                    }
                }
                ScanOutcome::Buffered
            }
        }
    }

    /// Drops an abandoned buffer once its deadline passes. Returns whether
    /// anything was dropped.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        match &self.state {
            ScanState::Accumulating { reset_at_ms, .. } if now_ms >= *reset_at_ms => {
                self.state = ScanState::Empty;
                true
            }
            _ => false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
