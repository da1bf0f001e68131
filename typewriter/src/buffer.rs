use std::collections::VecDeque;

/// FIFO of whole-text snapshots awaiting playback.
///
/// Unbounded. All drains pop from the front so snapshots play in the order
/// they were enqueued.
#[derive(Debug, Default)]
pub struct TypewriterBuffer {
    snapshots: VecDeque<String>,
}

impl TypewriterBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, text: String) {
        self.snapshots.push_back(text);
    }

    pub fn dequeue(&mut self) -> Option<String> {
        self.snapshots.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
