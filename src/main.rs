//! portflow demo - one output port driven across three threads
//!
//! A block thread produces into pooled buffers and posts them with labels
//! and messages. A scheduler thread watches the port's activity counter, and
//! a downstream thread consumes the posted buffers and hands the memory back
//! to the pool.
//!
//! Usage: `portflow [config.toml]`

use anyhow::Context;
use crossbeam_channel::{bounded, unbounded};
use portflow::{config::RuntimeConfig, BufferChunk, DType, Label, OutputPort, TypedValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Number of times the block's work runs
const ITERATIONS: usize = 64;

/// Elements produced per run at most
const CHUNK_ELEMENTS: usize = 256;

/// Totals reported by the block thread once it finishes
struct BlockReport {
    elements: u64,
    buffers: u64,
    labels: u64,
    messages: u64,
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => RuntimeConfig::load(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => RuntimeConfig::default(),
    };
    anyhow::ensure!(
        config.pool.buffer_count > 0 && config.pool.token_count > 0,
        "the demo needs at least one pool buffer and one token"
    );

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting portflow demo");

    let mut port = OutputPort::with_config(0, "samples", DType::F32, &config.port);
    port.set_buffer_manager(Some(Box::new(config.pool.buffer_manager())));
    port.set_token_manager(Some(Box::new(config.pool.token_manager())));

    let (msg_tx, msg_rx) = unbounded::<TypedValue>();
    port.set_message_sink(Some(Box::new(msg_tx)));

    let activity = port.activity_handle();
    let buffer_pool = port.buffer_pool();
    let token_pool = port.token_pool();
    let running = Arc::new(AtomicBool::new(true));
    let (chunk_tx, chunk_rx) = bounded::<(BufferChunk, BufferChunk)>(config.pool.buffer_count);

    // Block: produce into pooled memory and post
    let block_handle = thread::spawn(move || {
        let mut runs = 0;
        while runs < ITERATIONS {
            let available = port.refresh_buffer();
            if available == 0 || port.token_manager_empty() {
                thread::yield_now();
                continue;
            }
            let token = port.token_manager_pop();

            port.set_reserve(CHUNK_ELEMENTS);
            port.produce(available.min(CHUNK_ELEMENTS));
            if runs % 4 == 0 {
                port.post_label(Label::new("run", TypedValue::new(runs as u64), 0));
            }
            if runs % 8 == 0 {
                port.post_message(format!("checkpoint {}", runs));
            }
            port.flush_pending();

            for chunk in port.drain_buffers() {
                if chunk_tx.send((chunk, token.clone())).is_err() {
                    tracing::warn!("Downstream hung up");
                    break;
                }
            }
            port.drain_labels();
            runs += 1;
        }

        BlockReport {
            elements: port.total_elements(),
            buffers: port.total_buffers(),
            labels: port.total_labels(),
            messages: port.total_messages(),
        }
    });

    // Scheduler: watch the activity counter until the block is done
    let scheduler_running = Arc::clone(&running);
    let scheduler_pool = Arc::clone(&buffer_pool);
    let scheduler_handle = thread::spawn(move || {
        let mut seen = activity.get();
        let mut wakeups = 0u64;
        while scheduler_running.load(Ordering::Acquire) {
            if activity.changed_since(seen) {
                seen = activity.get();
                wakeups += 1;
                let starved = scheduler_pool.lock().as_ref().map_or(true, |pool| pool.empty());
                tracing::trace!("Activity at {} (pool starved: {})", seen, starved);
            }
            thread::sleep(Duration::from_micros(200));
        }
        wakeups
    });

    // Downstream: consume buffers and return memory and tokens
    let downstream_handle = thread::spawn(move || {
        let mut consumed = 0u64;
        for (chunk, token) in chunk_rx {
            consumed += chunk.elements() as u64;
            if let Some(pool) = buffer_pool.lock().as_mut() {
                pool.push(chunk);
            }
            if let Some(pool) = token_pool.lock().as_mut() {
                pool.push(token);
            }
        }
        consumed
    });

    let report = block_handle
        .join()
        .map_err(|_| anyhow::anyhow!("block thread panicked"))?;
    running.store(false, Ordering::Release);
    let consumed = downstream_handle
        .join()
        .map_err(|_| anyhow::anyhow!("downstream thread panicked"))?;
    let wakeups = scheduler_handle
        .join()
        .map_err(|_| anyhow::anyhow!("scheduler thread panicked"))?;

    let messages: Vec<TypedValue> = msg_rx.try_iter().collect();

    tracing::info!(
        "Posted {} elements in {} buffers, {} labels, {} messages",
        report.elements,
        report.buffers,
        report.labels,
        report.messages
    );
    tracing::info!(
        "Downstream consumed {} elements; scheduler woke {} times; {} messages received",
        consumed,
        wakeups,
        messages.len()
    );

    anyhow::ensure!(
        consumed == report.elements,
        "downstream saw {} elements but {} were posted",
        consumed,
        report.elements
    );

    tracing::info!("Shutting down...");
    Ok(())
}
