use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::sync::LazyLock;

/// Host CPU count, detected once.
static NUM_CPUS: LazyLock<usize> = LazyLock::new(|| {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
});

/// Number of logical CPUs available to this process.
#[must_use]
pub fn cpu_count() -> usize {
    *NUM_CPUS
}

/// Resolves a configured thread count, where `0` means one per CPU.
#[must_use]
pub fn effective_threads(requested: usize) -> usize {
    if requested == 0 { cpu_count() } else { requested }
}

/// Builds a dedicated worker pool for one scan.
///
/// Each scan gets its own pool so the configured size applies to that scan
/// only and nothing global is left behind for the next caller.
///
/// # Errors
///
/// Returns an error if the operating system refuses to spawn the threads.
pub fn build_pool(requested: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(effective_threads(requested))
        .thread_name(|i| format!("hashguard-worker-{i}"))
        .build()
}
