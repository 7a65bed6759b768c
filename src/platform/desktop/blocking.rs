/// Runs a backend call on the current thread. Desktop event handlers are
/// synchronous, so "blocking" here is a seam: swapping in a worker thread or
/// async runtime later only touches this function.
pub fn run_blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    f()
}
