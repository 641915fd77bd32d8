//! Bounded live window over the most recent sensor readings.

use std::collections::VecDeque;
use std::sync::Mutex;

use vayu_models::{Reading, SeriesFrame};

/// Fixed-capacity window of recent readings.
///
/// Two parallel sequences (temperature, humidity) are kept index-aligned
/// under a single lock, so a snapshot can never observe them at different
/// append generations. The ingest pipeline is the only writer; viewers and
/// the join path read through [`ReadingWindow::snapshot`], which copies.
#[derive(Debug)]
pub struct ReadingWindow {
    capacity: usize,
    state: Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
    temperature: VecDeque<f64>,
    humidity: VecDeque<f64>,
}

impl ReadingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(WindowState {
                temperature: VecDeque::with_capacity(capacity),
                humidity: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one reading, evicting from the front once the window is
    /// full. Always succeeds; the window never blocks the producer.
    pub fn append(&self, reading: &Reading) {
        let mut state = self.lock();
        state.temperature.push_back(reading.temperature);
        state.humidity.push_back(reading.humidity);
        while state.temperature.len() > self.capacity {
            state.temperature.pop_front();
        }
        while state.humidity.len() > self.capacity {
            state.humidity.pop_front();
        }
    }

    /// Copy both series as of a single consistent instant, oldest-first.
    pub fn snapshot(&self) -> SeriesFrame {
        let state = self.lock();
        SeriesFrame {
            temperature: state.temperature.iter().copied().collect(),
            humidity: state.humidity.iter().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WindowState> {
        // A poisoned lock still holds index-aligned data; recover it.
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn reading(temperature: f64, humidity: f64) -> Reading {
        Reading::new(
            temperature,
            humidity,
            Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn append_below_capacity_keeps_everything() {
        let window = ReadingWindow::new(5);
        for i in 0..3 {
            window.append(&reading(20.0 + i as f64, 50.0 + i as f64));
        }

        let frame = window.snapshot();
        assert_eq!(frame.temperature, vec![20.0, 21.0, 22.0]);
        assert_eq!(frame.humidity, vec![50.0, 51.0, 52.0]);
    }

    #[test]
    fn append_past_capacity_evicts_oldest_first() {
        let capacity = 4;
        let total = 10;
        let window = ReadingWindow::new(capacity);
        for i in 0..total {
            window.append(&reading(i as f64, 100.0 + i as f64));
        }

        let frame = window.snapshot();
        assert_eq!(frame.len(), capacity);
        // The survivors are the most recent `capacity` inputs in arrival
        // order.
        assert_eq!(frame.temperature, vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(frame.humidity, vec![106.0, 107.0, 108.0, 109.0]);
    }

    #[test]
    fn snapshot_of_empty_window_is_empty() {
        let window = ReadingWindow::new(8);
        let frame = window.snapshot();
        assert!(frame.is_empty());
        assert!(window.is_empty());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let window = ReadingWindow::new(4);
        window.append(&reading(20.0, 50.0));

        let frame = window.snapshot();
        window.append(&reading(21.0, 51.0));

        assert_eq!(frame.len(), 1);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn snapshot_never_sees_mismatched_lengths_under_concurrency() {
        let window = Arc::new(ReadingWindow::new(16));
        let writer = {
            let window = Arc::clone(&window);
            std::thread::spawn(move || {
                for i in 0..2_000 {
                    window.append(&reading(i as f64, i as f64));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let window = Arc::clone(&window);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        let frame = window.snapshot();
                        assert_eq!(frame.temperature.len(), frame.humidity.len());
                        assert!(frame.len() <= window.capacity());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(window.len(), window.capacity());
    }

    #[test]
    fn concurrent_appends_are_serialized() {
        // The pipeline is single-writer in production; the window itself
        // must still hold its invariants if that assumption breaks.
        let window = Arc::new(ReadingWindow::new(8));
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let window = Arc::clone(&window);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        window.append(&reading(i as f64, i as f64));
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        let frame = window.snapshot();
        assert_eq!(frame.temperature.len(), frame.humidity.len());
        assert_eq!(frame.len(), 8);
    }
}
