/// Deferred destruction of objects that frames in flight may still use.
///
/// An object retired while frame F is current can be referenced by command
/// lists up to frame F. Frame F's slot is next reused by frame F + N, whose
/// fence wait proves F has completed; from then on the object may be dropped.

use std::collections::VecDeque;

pub struct RetireQueue<T> {
    entries: VecDeque<(u64, T)>,
}

impl<T> RetireQueue<T> {
    pub fn new() -> Self {
        Self { entries: VecDeque::new() }
    }

    /// Retire `item` during frame `frame_number`
    pub fn push(&mut self, frame_number: u64, item: T) {
        self.entries.push_back((frame_number, item));
    }

    /// Drop every item retired at least `frames_in_flight` frames before
    /// `frame_number`. Returns how many were dropped.
    pub fn release(&mut self, frame_number: u64, frames_in_flight: u64) -> usize {
        let mut released = 0;
        while let Some((retired_at, _)) = self.entries.front() {
            if retired_at + frames_in_flight > frame_number {
                break;
            }
            self.entries.pop_front();
            released += 1;
        }
        released
    }

    /// Drop everything (device idle)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for RetireQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_waits_for_frames_in_flight() {
        let mut queue = RetireQueue::new();
        queue.push(5, "a");
        queue.push(6, "b");
        assert_eq!(queue.release(6, 2), 0);
        assert_eq!(queue.release(7, 2), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.release(100, 2), 1);
        assert!(queue.is_empty());
    }
}
