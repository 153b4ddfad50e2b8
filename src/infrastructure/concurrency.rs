/// Thread pool setup for tag-value counting.

use anyhow::Result;

/// Initialize the global rayon thread pool with half the cores, minimum 1.
/// Leaves the other half to the command server's connection threads.
pub fn init_thread_pool() -> Result<usize> {
    let cores = num_cpus::get();
    let workers = std::cmp::max(1, cores / 2);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    tracing::info!(workers, cores, "initialized thread pool");

    Ok(workers)
}
