//! Response DTOs for the read API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStatsSnapshot;
use crate::pipeline::PipelineStatsSnapshot;
use crate::rehydrate::RehydrateReport;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Cache counters
    pub cache: CacheStatsResponse,
    /// Pipeline counters since startup
    pub pipeline: PipelineStatsSnapshot,
    /// Outcome of the startup rehydration pass
    pub rehydration: RehydrateReport,
}

/// Cache section of [`StatsResponse`]
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    /// Number of successful lookups
    pub hits: u64,
    /// Number of lookups for absent or expired ids
    pub misses: u64,
    /// Number of entries removed by the sweeper
    pub swept: u64,
    /// Entries physically present, including expired-but-unswept ones
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from the individual snapshots
    pub fn new(
        cache: CacheStatsSnapshot,
        total_entries: usize,
        pipeline: PipelineStatsSnapshot,
        rehydration: RehydrateReport,
    ) -> Self {
        Self {
            cache: CacheStatsResponse {
                hits: cache.hits,
                misses: cache.misses,
                swept: cache.swept,
                total_entries,
                hit_rate: cache.hit_rate(),
            },
            pipeline,
            rehydration,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_hit_rate() {
        let cache = CacheStatsSnapshot {
            hits: 80,
            misses: 20,
            swept: 3,
        };
        let resp = StatsResponse::new(
            cache,
            100,
            PipelineStatsSnapshot::default(),
            RehydrateReport::default(),
        );
        assert!((resp.cache.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.cache.total_entries, 100);
        assert_eq!(resp.cache.swept, 3);
    }

    #[test]
    fn test_stats_response_serialize() {
        let resp = StatsResponse::new(
            CacheStatsSnapshot::default(),
            0,
            PipelineStatsSnapshot::default(),
            RehydrateReport {
                loaded: 4,
                skipped_mismatch: 1,
            },
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["cache"]["hit_rate"], 0.0);
        assert_eq!(json["rehydration"]["skipped_mismatch"], 1);
        assert_eq!(json["pipeline"]["forwarded"], 0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
