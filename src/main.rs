//! Memcache Bench - cached vs. uncached read benchmark
//!
//! Loads one user code from the users file into the cache, then measures
//! repeated lookups served from the cache against lookups that re-read the
//! file every time.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memcache_bench::cache::Cache;
use memcache_bench::source::{Source, UserDirectory};
use memcache_bench::watcher::FileWatcher;
use memcache_bench::{spawn_sweep_task, spawn_watch_task, BenchmarkHarness, Config, Priority};

/// Key the looked-up user code is cached under.
const USER_CODE_KEY: &str = "USER_CODE";

/// Main entry point.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache, its removal listener and background tasks
/// 4. Load the user code with the users file as dependency
/// 5. Run the cached and uncached trials and report both
/// 6. Clear the entry and stop the background tasks
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memcache_bench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memcache Bench");

    let config = Config::from_env();
    info!(
        "Configuration loaded: ttl={}s, iterations={}, sweep_interval={}ms, watch_interval={}ms, users_file={}",
        config.ttl_seconds,
        config.iteration_count,
        config.sweep_interval_ms,
        config.watch_interval_ms,
        config.users_file.display()
    );

    let watcher = Arc::new(FileWatcher::new());
    let cache: Cache<String> = Cache::new(config.cache_config(), watcher.clone());
    cache.set_removal_listener(|event| {
        info!(
            "Reason: {} | Key-name: {} | Value-Object: {}",
            event.reason, event.key, event.value
        );
    });

    let sweep_handle = spawn_sweep_task(cache.clone(), config.sweep_interval());
    let watch_handle = spawn_watch_task(watcher, config.watch_interval());
    info!("Background tasks started");

    let users = UserDirectory::new(&config.users_file);
    let user_name = match config.lookup_user.clone() {
        Some(name) => name,
        None => users
            .users()
            .with_context(|| format!("reading {}", users.path().display()))?
            .into_iter()
            .next()
            .map(|user| user.user_name)
            .context("users file contains no users")?,
    };

    cache
        .load(USER_CODE_KEY, &users, &user_name, Priority::Default)
        .context("caching user code")?;

    let comparison = {
        let cache = cache.clone();
        let users = users.clone();
        let user_name = user_name.clone();
        let iterations = config.iteration_count;
        // The trials spin synchronously; keep them off the async workers
        tokio::task::spawn_blocking(move || {
            BenchmarkHarness::new().compare(
                &cache,
                USER_CODE_KEY,
                || users.fetch(&user_name),
                iterations,
            )
        })
        .await??
    };

    let user_code = cache.get(USER_CODE_KEY).unwrap_or_default();
    info!("Retrieved User Code: {} For User: {}", user_code, user_name);
    info!("{}", comparison.cached);
    info!("{}", comparison.uncached);
    if let Some(speedup) = comparison.speedup() {
        info!("Cache speedup: {:.1}x", speedup);
    }

    println!("{}", serde_json::to_string(&comparison.cached)?);
    println!("{}", serde_json::to_string(&comparison.uncached)?);

    cache.remove(USER_CODE_KEY);
    // Give the dispatch task a moment to deliver the final notification
    tokio::time::sleep(Duration::from_millis(50)).await;

    sweep_handle.abort();
    watch_handle.abort();
    info!("Shutdown complete");
    Ok(())
}
