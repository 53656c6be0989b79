//! Standardized metrics collection and reporting for CI/CD integration.
//!
//! Metrics are exported as JSON so streaming runs can be compared across
//! commits: generation throughput, store efficiency, queue behaviour and
//! structure placement.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level metrics report containing all subsystem metrics.
///
/// This is the standardized format for metrics.json files exported by tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Test/run identifier
    pub test_name: String,

    /// Timestamp when metrics were collected (ISO 8601)
    pub timestamp: String,

    /// World seed the run used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_seed: Option<u64>,

    /// Overall test result
    pub result: TestResult,

    /// Terrain generation metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terrain: Option<TerrainMetrics>,

    /// Compression store metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistenceMetrics>,

    /// Request queue / scheduler metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<StreamingMetrics>,

    /// Structure placement metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structures: Option<StructureMetrics>,

    /// Test execution metrics
    pub test_execution: TestExecutionMetrics,
}

/// Overall test result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    /// Test passed all validations
    Pass,
    /// Test failed
    Fail,
    /// Test was skipped
    Skip,
}

/// Terrain generation performance and quality metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainMetrics {
    /// Chunks classified voxel by voxel
    pub chunks_generated: usize,

    /// Chunks filled by the out-of-band fast path
    pub chunks_uniform: usize,

    /// Total voxels written by generation
    pub blocks_generated: usize,

    /// Average generation time per chunk (microseconds)
    pub avg_gen_time_us: f64,

    /// Min generation time (microseconds)
    pub min_gen_time_us: u128,

    /// Max generation time (microseconds)
    pub max_gen_time_us: u128,

    /// Total generation time (milliseconds)
    pub total_gen_time_ms: f64,

    /// Chunks per second throughput
    pub chunks_per_second: f64,

    /// Number of unique biomes present
    pub unique_biomes: usize,

    /// Sampled columns per biome name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biome_columns: Option<BTreeMap<String, usize>>,
}

/// Compression store metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceMetrics {
    /// Snapshots written to the store
    pub chunks_saved: usize,

    /// Snapshots restored from the store
    pub chunks_loaded: usize,

    /// Restores that failed and fell back to generation
    pub restore_failures: usize,

    /// Entries held at the end of the run
    pub entries: usize,

    /// Raw voxel bytes represented by the held entries
    pub bytes_uncompressed: u64,

    /// Bytes actually held by the store
    pub bytes_compressed: u64,

    /// Uncompressed / compressed
    pub compression_ratio: f64,
}

/// Scheduler and request queue metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingMetrics {
    /// Scheduler ticks executed
    pub ticks: u64,

    /// Requests enqueued by the host
    pub requests: usize,

    /// Requests completed
    pub completed: usize,

    /// Largest queue depth observed
    pub max_pending: usize,

    /// Requests still pending when the run ended
    pub pending: usize,

    /// Chunks resident in the host window at the end
    pub resident_chunks: usize,
}

/// Structure placement metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureMetrics {
    /// Trees placed
    pub trees: usize,

    /// Boulders placed
    pub boulders: usize,

    /// Desert pyramids placed
    pub pyramids: usize,

    /// Village parts (houses, well, paths)
    pub village_parts: usize,

    /// Voxel edits emitted
    pub edits: usize,

    /// Edits still waiting on chunks that never loaded
    pub edits_parked: usize,
}

/// Test execution and infrastructure metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestExecutionMetrics {
    /// Total test duration (seconds)
    pub duration_seconds: f64,

    /// Number of assertions checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertions_checked: Option<usize>,

    /// Number of validations passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations_passed: Option<usize>,
}

/// Running min/max/total of measured durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationStats {
    count: usize,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
}

impl DurationStats {
    /// Record one measurement.
    pub fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.min = Some(self.min.map_or(elapsed, |m| m.min(elapsed)));
        self.max = self.max.max(elapsed);
    }

    /// Number of recorded measurements.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Sum of all measurements.
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Mean in microseconds (0 when empty).
    pub fn avg_us(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total.as_micros() as f64 / self.count as f64
        }
    }

    /// Smallest measurement in microseconds (0 when empty).
    pub fn min_us(&self) -> u128 {
        self.min.map_or(0, |m| m.as_micros())
    }

    /// Largest measurement in microseconds.
    pub fn max_us(&self) -> u128 {
        self.max.as_micros()
    }

    /// Measurements per second over the recorded total.
    pub fn per_second(&self) -> f64 {
        let secs = self.total.as_secs_f64();
        if secs > 0.0 {
            self.count as f64 / secs
        } else {
            0.0
        }
    }
}

/// Builder for constructing metrics reports
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Create a new builder with test name
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            report: MetricsReport {
                test_name: test_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                world_seed: None,
                result: TestResult::Pass,
                terrain: None,
                persistence: None,
                streaming: None,
                structures: None,
                test_execution: TestExecutionMetrics::default(),
            },
        }
    }

    /// Set test result
    pub fn result(mut self, result: TestResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set world seed
    pub fn world_seed(mut self, seed: u64) -> Self {
        self.report.world_seed = Some(seed);
        self
    }

    /// Set terrain metrics
    pub fn terrain(mut self, metrics: TerrainMetrics) -> Self {
        self.report.terrain = Some(metrics);
        self
    }

    /// Set persistence metrics
    pub fn persistence(mut self, metrics: PersistenceMetrics) -> Self {
        self.report.persistence = Some(metrics);
        self
    }

    /// Set streaming metrics
    pub fn streaming(mut self, metrics: StreamingMetrics) -> Self {
        self.report.streaming = Some(metrics);
        self
    }

    /// Set structure metrics
    pub fn structures(mut self, metrics: StructureMetrics) -> Self {
        self.report.structures = Some(metrics);
        self
    }

    /// Set test execution metrics
    pub fn execution(mut self, metrics: TestExecutionMetrics) -> Self {
        self.report.test_execution = metrics;
        self
    }

    /// Build the metrics report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Sink for writing metrics reports to JSON files
pub struct MetricsSink {
    path: PathBuf,
}

impl MetricsSink {
    /// Create a new metrics sink at the specified path
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        Ok(Self { path })
    }

    /// Path the report is written to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write metrics report to file
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        file.write_all(json.as_bytes())?;
        tracing::debug!(path = %self.path.display(), test = %report.test_name, "metrics report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn metrics_report_roundtrip() {
        let report = MetricsReportBuilder::new("test_example")
            .result(TestResult::Pass)
            .world_seed(42)
            .terrain(TerrainMetrics {
                chunks_generated: 100,
                chunks_uniform: 20,
                blocks_generated: 3_276_800,
                avg_gen_time_us: 3970.0,
                min_gen_time_us: 2500,
                max_gen_time_us: 8000,
                total_gen_time_ms: 397.0,
                chunks_per_second: 252.0,
                unique_biomes: 5,
                biome_columns: None,
            })
            .persistence(PersistenceMetrics {
                chunks_saved: 10,
                chunks_loaded: 4,
                restore_failures: 0,
                entries: 10,
                bytes_uncompressed: 655_360,
                bytes_compressed: 8_192,
                compression_ratio: 80.0,
            })
            .execution(TestExecutionMetrics {
                duration_seconds: 2.5,
                assertions_checked: Some(500),
                validations_passed: Some(500),
            })
            .build();

        // Serialize to JSON
        let json = serde_json::to_string_pretty(&report).unwrap();

        // Deserialize back
        let parsed: MetricsReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.test_name, "test_example");
        assert_eq!(parsed.result, TestResult::Pass);
        assert_eq!(parsed.world_seed, Some(42));
        assert_eq!(parsed.terrain.as_ref().unwrap().chunks_generated, 100);
        assert_eq!(parsed.persistence.as_ref().unwrap().chunks_loaded, 4);
        assert!(parsed.streaming.is_none());
        assert!(!json.contains("\"structures\""));
    }

    #[test]
    fn duration_stats_track_extremes() {
        let mut stats = DurationStats::default();
        assert_eq!(stats.avg_us(), 0.0);
        assert_eq!(stats.min_us(), 0);

        stats.record(Duration::from_micros(300));
        stats.record(Duration::from_micros(100));
        stats.record(Duration::from_micros(200));

        assert_eq!(stats.count(), 3);
        assert_eq!(stats.min_us(), 100);
        assert_eq!(stats.max_us(), 300);
        assert!((stats.avg_us() - 200.0).abs() < 1e-9);
        assert_eq!(stats.total(), Duration::from_micros(600));
        assert!(stats.per_second() > 0.0);
    }

    #[test]
    fn metrics_sink_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "voxstream-metrics-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let report = MetricsReportBuilder::new("sink_test")
            .result(TestResult::Pass)
            .build();

        let sink = MetricsSink::create(&path).unwrap();
        sink.write(&report).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("sink_test"));
        assert!(contents.contains("\"result\": \"pass\""));

        // Cleanup
        fs::remove_file(&path).ok();
    }
}
