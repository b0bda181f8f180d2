//! Per-group message buffer for the current window.

use crate::models::{Message, Window};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mapping of group id to the messages received in the current window.
///
/// Both operations hold the lock only for the map operation itself, never
/// across an `.await`.
#[derive(Debug, Default)]
pub struct WindowBuffer {
    groups: Mutex<Window>,
}

impl WindowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to its group, keeping arrival order.
    pub fn append(&self, message: Message) {
        self.lock()
            .entry(message.group_id)
            .or_default()
            .push(message);
    }

    /// Take the current window and start an empty one.
    pub fn swap(&self) -> Window {
        std::mem::take(&mut *self.lock())
    }

    /// Number of messages waiting in the current window.
    pub fn pending(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, Window> {
        // Every critical section is a single map operation, so a poisoned
        // map is still consistent.
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_append_groups_in_order() {
        let buffer = WindowBuffer::new();
        buffer.append(Message::new(1, None, "a1"));
        buffer.append(Message::new(2, None, "b1"));
        buffer.append(Message::new(1, None, "a2"));

        let window = buffer.swap();
        let texts: Vec<_> = window[&1].iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a1", "a2"]);
        assert_eq!(window[&2].len(), 1);
    }

    #[test]
    fn test_swap_resets_window() {
        let buffer = WindowBuffer::new();
        buffer.append(Message::new(1, None, "before"));
        assert_eq!(buffer.pending(), 1);

        let first = buffer.swap();
        assert_eq!(first.len(), 1);
        assert_eq!(buffer.pending(), 0);
        assert!(buffer.swap().is_empty());

        buffer.append(Message::new(1, None, "after"));
        let second = buffer.swap();
        assert_eq!(second[&1][0].text, "after");
    }

    #[test]
    fn test_concurrent_appends_land_in_exactly_one_window() {
        let buffer = Arc::new(WindowBuffer::new());
        let writers: Vec<_> = (0..4i64)
            .map(|group| {
                let buffer = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        buffer.append(Message::new(group, None, format!("{}:{}", group, i)));
                    }
                })
            })
            .collect();

        let mut windows = Vec::new();
        while writers.iter().any(|w| !w.is_finished()) {
            windows.push(buffer.swap());
        }
        for writer in writers {
            writer.join().unwrap();
        }
        windows.push(buffer.swap());

        let mut seen = HashSet::new();
        for window in &windows {
            for (group, messages) in window {
                for message in messages {
                    assert_eq!(message.group_id, *group);
                    assert!(seen.insert(message.text.clone()), "duplicate {}", message.text);
                }
            }
        }
        assert_eq!(seen.len(), 2000);

        // Per-group arrival order survives across consecutive windows
        for group in 0..4i64 {
            let sequence: Vec<usize> = windows
                .iter()
                .filter_map(|w| w.get(&group))
                .flatten()
                .map(|m| m.text.split(':').nth(1).unwrap().parse().unwrap())
                .collect();
            assert_eq!(sequence, (0..500).collect::<Vec<_>>());
        }
    }
}
