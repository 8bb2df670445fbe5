use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Counters collected while building one document.
///
/// Uses atomic operations so the tree sink can share the structure with the
/// finished [`crate::dom::Document`] without locking.
#[derive(Debug, Default)]
pub struct DocumentMetrics {
    /// Number of element nodes created
    pub elements: AtomicUsize,
    /// Number of attributes recorded
    pub attributes: AtomicUsize,
    /// Total size of text content in bytes
    pub text_bytes: AtomicUsize,
    /// Number of `<script>` elements encountered
    pub scripts: AtomicUsize,
    /// Number of `<style>` elements and stylesheet `<link>`s encountered
    pub stylesheets: AtomicUsize,
    /// Number of nodes clipped by resource limits
    pub clipped_nodes: AtomicUsize,
}

impl DocumentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_elements(&self) {
        self.elements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_attributes(&self) {
        self.attributes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_text_content(&self, size: usize) {
        self.text_bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn increment_scripts(&self) {
        self.scripts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stylesheets(&self) {
        self.stylesheets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_clipped(&self) {
        self.clipped_nodes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn element_count(&self) -> usize {
        self.elements.load(Ordering::Relaxed)
    }

    pub fn script_count(&self) -> usize {
        self.scripts.load(Ordering::Relaxed)
    }

    pub fn stylesheet_count(&self) -> usize {
        self.stylesheets.load(Ordering::Relaxed)
    }

    pub fn clipped_count(&self) -> usize {
        self.clipped_nodes.load(Ordering::Relaxed)
    }
}

/// Timer for measuring load operations.
#[derive(Debug)]
pub struct LoadTimer {
    start: Instant,
}

impl LoadTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for LoadTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_counters() {
        let metrics = DocumentMetrics::new();
        metrics.increment_elements();
        metrics.increment_elements();
        metrics.increment_scripts();
        metrics.increment_stylesheets();
        metrics.add_text_content(42);

        assert_eq!(metrics.element_count(), 2);
        assert_eq!(metrics.script_count(), 1);
        assert_eq!(metrics.stylesheet_count(), 1);
        assert_eq!(metrics.text_bytes.load(Ordering::Relaxed), 42);
        assert_eq!(metrics.clipped_count(), 0);
    }

    #[test]
    fn test_load_timer() {
        let timer = LoadTimer::new();
        thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10);
    }

    #[test]
    fn test_thread_safety() {
        let metrics = Arc::new(DocumentMetrics::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let metrics = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    metrics.increment_elements();
                    metrics.increment_attributes();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.element_count(), 800);
        assert_eq!(metrics.attributes.load(Ordering::Relaxed), 800);
    }
}
