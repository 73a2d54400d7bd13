use flanker_core::Key;

/// A key-down event stamped on the session timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub timestamp: u64,
}

/// Non-blocking keyboard access, polled once per frame.
///
/// Events queue between polls, so nothing pressed between two frames is
/// lost.
pub trait InputPoller {
    /// Earliest queued press among `accepted`, if any.
    ///
    /// Consumes every queued press of an accepted key; other keys stay queued.
    fn poll_keys(&mut self, accepted: &[Key]) -> Option<KeyPress>;

    /// Whether `key` was pressed since the last check. Independent of any
    /// accepted-key set.
    fn check_exit(&mut self, key: &Key) -> bool;

    /// Drops everything queued so far.
    fn clear_events(&mut self);
}

/// Pending key presses, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct KeyQueue {
    pending: Vec<KeyPress>,
}

impl KeyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, press: KeyPress) {
        self.pending.push(press);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes all presses of `accepted` keys and returns the earliest.
    pub fn take_earliest(&mut self, accepted: &[Key]) -> Option<KeyPress> {
        let mut earliest: Option<KeyPress> = None;
        self.pending.retain(|press| {
            if !accepted.contains(&press.key) {
                return true;
            }
            if earliest
                .as_ref()
                .is_none_or(|e| press.timestamp < e.timestamp)
            {
                earliest = Some(press.clone());
            }
            false
        });
        earliest
    }

    /// Removes all presses of `key`, reporting whether there were any.
    pub fn take_key(&mut self, key: &Key) -> bool {
        let before = self.pending.len();
        self.pending.retain(|press| press.key != *key);
        self.pending.len() != before
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl InputPoller for KeyQueue {
    fn poll_keys(&mut self, accepted: &[Key]) -> Option<KeyPress> {
        self.take_earliest(accepted)
    }

    fn check_exit(&mut self, key: &Key) -> bool {
        self.take_key(key)
    }

    fn clear_events(&mut self) {
        self.clear()
    }
}
