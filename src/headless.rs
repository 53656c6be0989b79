use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use voxstream_testkit::{
    DurationStats, EventRecord, JsonlSink, MetricsReportBuilder, MetricsSink, PersistenceMetrics,
    StreamingMetrics, StructureMetrics, TerrainMetrics, TestExecutionMetrics, TestResult,
};
use voxstream_world::{StreamingSession, WorldPos, WorldgenConfig};

pub struct HeadlessConfig {
    pub worldgen: WorldgenConfig,
    pub radius: i32,
    pub max_ticks: u64,
    /// Sleep `tick_interval_ms` between ticks instead of running flat out.
    pub realtime: bool,
    pub metrics: Option<PathBuf>,
    pub events: Option<PathBuf>,
}

#[derive(Serialize)]
struct TickEvent {
    restored: usize,
    uniform: usize,
    generated: usize,
    restore_failures: usize,
    remaining: usize,
    resident: usize,
}

/// Stream a cube of chunks around the origin until the queue drains or
/// `max_ticks` is reached.
pub fn run(cfg: HeadlessConfig) -> Result<()> {
    let run_start = Instant::now();
    let mut session = StreamingSession::new(cfg.worldgen);
    let tick_interval = Duration::from_millis(session.generator().config().tick_interval_ms);
    let chunk_volume = session.generator().config().chunk_size.pow(3);

    let mut events = match &cfg.events {
        Some(path) => Some(JsonlSink::create(path)?),
        None => None,
    };

    let requested = session.request_around(WorldPos::new(0, 0, 0), cfg.radius);
    info!(requested, radius = cfg.radius, "streaming around spawn");

    let mut tick_times = DurationStats::default();
    let mut ticks = 0u64;
    while ticks < cfg.max_ticks {
        let start = Instant::now();
        let report = session.tick();
        tick_times.record(start.elapsed());
        ticks += 1;

        if let Some(sink) = events.as_mut() {
            sink.write(&EventRecord {
                tick: session.generator().current_tick(),
                kind: "tick",
                payload: &TickEvent {
                    restored: report.restored,
                    uniform: report.uniform,
                    generated: report.generated,
                    restore_failures: report.restore_failures,
                    remaining: report.remaining,
                    resident: session.storage().len(),
                },
            })?;
        }

        let idle = report.remaining == 0 && session.generator().pending() == 0;
        if idle && session.generator().structures_placed() {
            break;
        }
        if cfg.realtime {
            std::thread::sleep(tick_interval.saturating_sub(start.elapsed()));
        }
    }

    if let Some(sink) = events.as_mut() {
        sink.flush()?;
        info!(lines = sink.lines(), "event log written");
    }

    let stats = session.generator().stats();
    info!(
        ticks,
        generated = stats.generated,
        uniform = stats.uniform,
        restored = stats.restored,
        resident = session.storage().len(),
        "headless run finished"
    );

    if let Some(path) = &cfg.metrics {
        let store = session.generator().store();
        let bytes_uncompressed = (store.len() * chunk_volume * 2) as u64;
        let bytes_compressed = store.compressed_bytes() as u64;
        let structures = session.generator().placement().unwrap_or_default();

        let report = MetricsReportBuilder::new("headless_run")
            .result(TestResult::Pass)
            .world_seed(session.generator().config().world_seed)
            .terrain(TerrainMetrics {
                chunks_generated: stats.generated,
                chunks_uniform: stats.uniform,
                blocks_generated: (stats.generated + stats.uniform) * chunk_volume,
                avg_gen_time_us: tick_times.avg_us(),
                min_gen_time_us: tick_times.min_us(),
                max_gen_time_us: tick_times.max_us(),
                total_gen_time_ms: tick_times.total().as_secs_f64() * 1000.0,
                chunks_per_second: (stats.generated + stats.uniform) as f64
                    / tick_times.total().as_secs_f64().max(f64::EPSILON),
                unique_biomes: 0,
                biome_columns: None,
            })
            .persistence(PersistenceMetrics {
                chunks_saved: stats.stored,
                chunks_loaded: stats.restored,
                restore_failures: stats.restore_failures,
                entries: store.len(),
                bytes_uncompressed,
                bytes_compressed,
                compression_ratio: bytes_uncompressed as f64 / bytes_compressed.max(1) as f64,
            })
            .streaming(StreamingMetrics {
                ticks,
                requests: stats.enqueued,
                completed: stats.restored + stats.uniform + stats.generated,
                max_pending: stats.max_pending,
                pending: session.generator().pending(),
                resident_chunks: session.storage().len(),
            })
            .structures(StructureMetrics {
                trees: structures.trees,
                boulders: structures.boulders,
                pyramids: structures.pyramids,
                village_parts: structures.houses + structures.wells + structures.paths,
                edits: structures.edits,
                edits_parked: session.storage().parked_edits(),
            })
            .execution(TestExecutionMetrics {
                duration_seconds: run_start.elapsed().as_secs_f64(),
                ..TestExecutionMetrics::default()
            })
            .build();

        MetricsSink::create(path)
            .and_then(|sink| sink.write(&report))
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "metrics written");
    }

    Ok(())
}

