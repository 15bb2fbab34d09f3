//! Cumulative service metrics.

use serde::Serialize;

/// Snapshot of cache and batch statistics since the service was built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbeddingMetrics {
    /// Total cache hits across all calls
    pub cache_hits: u64,
    /// Total cache misses across all calls
    pub cache_misses: u64,
    /// Wall-clock latency of every backend batch, in milliseconds
    pub batch_latencies_ms: Vec<f64>,
}

impl EmbeddingMetrics {
    /// Add one call's cache counts
    pub fn record_lookups(&mut self, hits: u64, misses: u64) {
        self.cache_hits += hits;
        self.cache_misses += misses;
    }

    pub fn record_batch(&mut self, latency_ms: f64) {
        self.batch_latencies_ms.push(latency_ms);
    }

    /// Number of backend batches run
    pub fn batches(&self) -> usize {
        self.batch_latencies_ms.len()
    }

    /// Fraction of lookups served from cache (0.0 when nothing was looked up)
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn mean_latency_ms(&self) -> Option<f64> {
        if self.batch_latencies_ms.is_empty() {
            return None;
        }
        Some(self.batch_latencies_ms.iter().sum::<f64>() / self.batch_latencies_ms.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics() {
        let metrics = EmbeddingMetrics::default();
        assert_eq!(metrics.hit_rate(), 0.0);
        assert_eq!(metrics.mean_latency_ms(), None);
        assert_eq!(metrics.batches(), 0);
    }

    #[test]
    fn test_accumulates() {
        let mut metrics = EmbeddingMetrics::default();
        metrics.record_lookups(1, 3);
        metrics.record_lookups(3, 1);
        metrics.record_batch(2.0);
        metrics.record_batch(4.0);

        assert_eq!(metrics.cache_hits, 4);
        assert_eq!(metrics.cache_misses, 4);
        assert!((metrics.hit_rate() - 0.5).abs() < f64::EPSILON);
        assert_eq!(metrics.mean_latency_ms(), Some(3.0));
        assert_eq!(metrics.batches(), 2);
    }
}
