/// Credential pool rotation

use std::sync::Mutex;

/// Thread-safe round-robin over the upstream API key pool. Spreads request
/// load across keys so no single one trips the upstream throttle. Keys are
/// never removed or expired at runtime.
pub struct KeyRotator {
    keys: Vec<String>,
    cursor: Mutex<usize>,
}

impl KeyRotator {
    /// The pool must be non-empty; configuration validation rejects an
    /// empty pool before a rotator is ever built.
    pub fn new(keys: Vec<String>) -> Self {
        assert!(!keys.is_empty(), "credential pool must not be empty");
        Self {
            keys,
            cursor: Mutex::new(0),
        }
    }

    /// Next key in rotation. The read-increment sequence happens under the
    /// lock so concurrent workers never observe the same cursor value.
    pub fn next_key(&self) -> String {
        let mut cursor = self.cursor.lock().unwrap();
        let key = self.keys[*cursor % self.keys.len()].clone();
        *cursor = cursor.wrapping_add(1);
        key
    }

    pub fn pool_size(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn rotation_wraps_around_the_pool() {
        let rotator = KeyRotator::new(vec!["a".into(), "b".into(), "c".into()]);
        let drawn: Vec<String> = (0..7).map(|_| rotator.next_key()).collect();
        assert_eq!(drawn, vec!["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn concurrent_draws_stay_evenly_distributed() {
        let rotator = Arc::new(KeyRotator::new(vec!["a".into(), "b".into()]));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let rotator = Arc::clone(&rotator);
                std::thread::spawn(move || {
                    (0..50).map(|_| rotator.next_key()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut a = 0;
        let mut b = 0;
        for handle in handles {
            for key in handle.join().unwrap() {
                match key.as_str() {
                    "a" => a += 1,
                    _ => b += 1,
                }
            }
        }
        assert_eq!(a, 100);
        assert_eq!(b, 100);
    }

    #[test]
    #[should_panic(expected = "credential pool must not be empty")]
    fn empty_pool_is_fatal() {
        KeyRotator::new(Vec::new());
    }
}
