//! Streaming Worldtest
//!
//! Drives a full streaming session the way a host loop would:
//! - Request a cube of chunks around the origin and drain the queue
//! - Check every resident chunk against direct generation
//! - Move the view so chunks are evicted into the compression store
//! - Move back and confirm evicted chunks are restored rather than regenerated
//! - Place structures and confirm edits reach resident and newly loaded chunks

use std::collections::BTreeMap;
use std::time::Instant;

use voxstream_testkit::{
    DurationStats, MetricsReportBuilder, MetricsSink, PersistenceMetrics, StreamingMetrics,
    StructureMetrics, TerrainMetrics, TestExecutionMetrics, TestResult,
};
use voxstream_world::{
    biome_at, blocks, ChunkBuffer, ChunkHost, ChunkPos, ChunkStorage, StreamingSession, TerrainGenerator,
    village::Village, WorldPos, WorldgenConfig,
};

const WORLD_SEED: u64 = 20_240_611;
const CHUNK_SIZE: usize = 16;
const RADIUS: i32 = 2;

fn config() -> WorldgenConfig {
    WorldgenConfig {
        world_seed: WORLD_SEED,
        chunk_size: CHUNK_SIZE,
        resident_capacity: 4096,
        // Placement is triggered explicitly below
        structure_delay_ticks: u64::MAX,
        ..WorldgenConfig::default()
    }
}

#[test]
fn streaming_worldtest() {
    let test_start = Instant::now();
    let mut assertions = 0usize;

    println!("\n=== Streaming Worldtest ===");
    println!("  World seed: {}", WORLD_SEED);
    println!("  Chunk size: {}", CHUNK_SIZE);
    println!("  View radius: {} chunks", RADIUS);
    println!();

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 1: Initial streaming around spawn
    // ═══════════════════════════════════════════════════════════════════════

    println!("Phase 1: Streaming chunks around spawn...");
    let mut session = StreamingSession::new(config());
    let requested = session.request_around(WorldPos::new(0, 0, 0), RADIUS);
    let expected = ((RADIUS * 2 + 1) as usize).pow(3);
    assert_eq!(requested, expected);

    let mut tick_times = DurationStats::default();
    let mut ticks = 0u64;
    while session.generator().pending() > 0 {
        let start = Instant::now();
        let report = session.tick();
        tick_times.record(start.elapsed());
        ticks += 1;
        assert!(report.completed() <= session.generator().config().batch_size);
        assertions += 1;
    }
    assert_eq!(session.storage().len(), expected);
    println!(
        "  {} chunks resident after {} ticks (avg {:.2}ms/tick)",
        session.storage().len(),
        ticks,
        tick_times.avg_us() / 1000.0
    );
    println!();

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 2: Resident chunks match direct generation
    // ═══════════════════════════════════════════════════════════════════════

    println!("Phase 2: Verifying resident chunks...");
    let terrain = TerrainGenerator::new(WORLD_SEED);
    let mut gen_times = DurationStats::default();
    let mut biome_columns: BTreeMap<String, usize> = BTreeMap::new();
    let positions: Vec<ChunkPos> = session.storage().iter_positions().collect();

    for pos in &positions {
        let resident = session.storage().get(*pos).expect("resident chunk");
        let origin = pos.origin(CHUNK_SIZE);

        let mut direct = ChunkBuffer::new(CHUNK_SIZE);
        let start = Instant::now();
        terrain.generate_chunk(origin, &mut direct);
        gen_times.record(start.elapsed());

        assert_eq!(resident, &direct, "chunk {} differs from direct generation", pos);
        assert_eq!(session.storage().neutral_override(*pos), None);
        assertions += 2;

        if pos.y == 0 {
            for i in 0..CHUNK_SIZE as i32 {
                for k in 0..CHUNK_SIZE as i32 {
                    let biome = biome_at((origin.x + i) as f64, (origin.z + k) as f64);
                    *biome_columns.entry(biome.name().to_string()).or_default() += 1;
                }
            }
        }
    }
    // Spawn contains the lake
    assert!(biome_columns.contains_key("lake"));
    println!("  {} chunks match; biomes: {:?}", positions.len(), biome_columns);
    println!();

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 3: Move the view to evict the spawn area
    // ═══════════════════════════════════════════════════════════════════════

    println!("Phase 3: Moving view away from spawn...");
    let far = WorldPos::new(40 * CHUNK_SIZE as i32, 0, 0);
    session.request_around(far, RADIUS);
    session.run_until_idle(1_000);

    let store = session.generator().store();
    assert_eq!(store.len(), expected, "every spawn chunk was snapshotted");
    for pos in &positions {
        assert!(store.has(&session.storage().id_for(*pos)));
        assertions += 1;
    }
    println!(
        "  {} snapshots, {} bytes compressed",
        store.len(),
        store.compressed_bytes()
    );
    println!();

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 4: Return to spawn; chunks come back from the store
    // ═══════════════════════════════════════════════════════════════════════

    println!("Phase 4: Returning to spawn...");
    session.request_around(WorldPos::new(0, 0, 0), RADIUS);
    session.run_until_idle(1_000);
    let stats = session.generator().stats();
    assert_eq!(stats.restored, expected, "spawn chunks restored, not regenerated");
    assert_eq!(stats.restore_failures, 0);
    assert_eq!(session.generator().store().len(), expected * 2);
    for pos in &positions {
        let mut direct = ChunkBuffer::new(CHUNK_SIZE);
        terrain.generate_chunk(pos.origin(CHUNK_SIZE), &mut direct);
        assert_eq!(session.storage().get(*pos), Some(&direct));
        assertions += 1;
    }
    println!("  restored {} chunks", stats.restored);
    println!();

    // ═══════════════════════════════════════════════════════════════════════
    // Phase 5: Structure placement
    // ═══════════════════════════════════════════════════════════════════════

    println!("Phase 5: Placing structures...");
    let summary = session.place_structures().expect("first placement runs");
    assert!(session.place_structures().is_none());
    assert_eq!(summary.houses, 3);
    assert_eq!(summary.wells, 1);
    assert_eq!(summary.paths, 3);
    session.run_until_idle(10_000);
    assert_eq!(session.generator().pending(), 0);
    assert_eq!(session.storage().parked_edits(), 0);
    assert_eq!(session.storage().edits_applied(), summary.edits);

    // The village sits inside the spawn window and is placed last
    let village = Village::spawn();
    let post = village.well.center.offset(1, 2, 1);
    assert_eq!(session.storage().block_at(post), Some(blocks::POLE));
    assert_eq!(
        session.storage().block_at(village.houses[0].origin),
        Some(blocks::STONE)
    );
    assertions += 4;
    println!(
        "  {} trees, {} boulders, {} pyramids, {} edits",
        summary.trees, summary.boulders, summary.pyramids, summary.edits
    );
    println!();

    // ═══════════════════════════════════════════════════════════════════════
    // Metrics
    // ═══════════════════════════════════════════════════════════════════════

    let stats = session.generator().stats();
    let store = session.generator().store();
    let voxel_bytes = (CHUNK_SIZE.pow(3) * std::mem::size_of::<u16>()) as u64;
    let bytes_uncompressed = voxel_bytes * store.len() as u64;
    let bytes_compressed = store.compressed_bytes() as u64;

    let metrics = MetricsReportBuilder::new("streaming_worldtest")
        .result(TestResult::Pass)
        .world_seed(WORLD_SEED)
        .terrain(TerrainMetrics {
            chunks_generated: stats.generated,
            chunks_uniform: stats.uniform,
            blocks_generated: (stats.generated + stats.uniform) * CHUNK_SIZE.pow(3),
            avg_gen_time_us: gen_times.avg_us(),
            min_gen_time_us: gen_times.min_us(),
            max_gen_time_us: gen_times.max_us(),
            total_gen_time_ms: gen_times.total().as_secs_f64() * 1000.0,
            chunks_per_second: gen_times.per_second(),
            unique_biomes: biome_columns.len(),
            biome_columns: Some(biome_columns),
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
            ticks: session.generator().current_tick().0,
            requests: stats.enqueued,
            completed: stats.restored + stats.uniform + stats.generated,
            max_pending: stats.max_pending,
            pending: session.generator().pending(),
            resident_chunks: session.storage().len(),
        })
        .structures(StructureMetrics {
            trees: summary.trees,
            boulders: summary.boulders,
            pyramids: summary.pyramids,
            village_parts: summary.houses + summary.wells + summary.paths,
            edits: summary.edits,
            edits_parked: session.storage().parked_edits(),
        })
        .execution(TestExecutionMetrics {
            duration_seconds: test_start.elapsed().as_secs_f64(),
            assertions_checked: Some(assertions),
            validations_passed: Some(assertions),
        })
        .build();

    let metrics_path = std::env::current_dir()
        .unwrap()
        .join("target/metrics/streaming_worldtest.json");
    let sink = MetricsSink::create(&metrics_path).expect("Failed to create metrics sink");
    sink.write(&metrics).expect("Failed to write metrics");
    println!("Metrics written to {}", metrics_path.display());
}

#[test]
fn deep_and_sky_chunks_take_the_fast_path() {
    let mut session = StreamingSession::new(WorldgenConfig {
        chunk_size: 32,
        ..config()
    });
    let deep = ChunkPos::new(0, -2, 0);
    let sky = ChunkPos::new(0, 2, 0);
    assert!(session.request(deep));
    assert!(session.request(sky));
    let report = session.tick();
    assert_eq!(report.uniform, 2);

    let storage = session.storage();
    assert!(storage.get(deep).unwrap().is_uniform(blocks::STONE));
    assert_eq!(storage.neutral_override(deep), Some(blocks::STONE));
    assert!(storage.get(sky).unwrap().is_uniform(blocks::AIR));
    assert_eq!(storage.neutral_override(sky), Some(blocks::AIR));
}

#[test]
fn parked_edits_pull_their_chunks_in() {
    let mut session = StreamingSession::new(config());
    let summary = session.place_structures().expect("placement runs");
    // Nothing is resident yet, so every edit waits on a chunk request
    assert_eq!(session.storage().parked_edits(), summary.edits);
    assert!(session.generator().pending() > 0);

    session.run_until_idle(10_000);
    assert_eq!(session.storage().parked_edits(), 0);
    assert_eq!(session.storage().edits_applied(), summary.edits);
}

#[test]
fn host_edits_on_unloaded_chunk_mark_it_wanted() {
    let mut storage = ChunkStorage::new(CHUNK_SIZE, 4, "probe");
    let target = WorldPos::new(100, 5, 100);
    storage.set_block(blocks::WINDOW, target);
    assert_eq!(storage.parked_edits(), 1);
    assert_eq!(
        storage.take_wanted(),
        vec![ChunkPos::containing(target, CHUNK_SIZE)]
    );
}
