//! Worker pool setup for bulk extraction.

use tracing::info;

/// Half the cores, at least one.
pub fn worker_count() -> usize {
    std::cmp::max(1, num_cpus::get() / 2)
}

/// Initialize the global rayon pool used by `ProjectIndex`.
///
/// Leaves half the machine to the server threads and the Go parser
/// subprocesses. Fails if the global pool was already built.
pub fn init_thread_pool() -> anyhow::Result<()> {
    let workers = worker_count();

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("codegraph-worker-{i}"))
        .build_global()?;

    info!(workers, cores = num_cpus::get(), "initialized thread pool");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_is_at_least_one() {
        let workers = worker_count();
        assert!(workers >= 1);
        assert!(workers <= num_cpus::get().max(1));
    }
}
