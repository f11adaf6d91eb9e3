use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};

/// Run `op` on `num_threads` threads that start together, collecting each
/// thread's result in thread-id order.
pub fn run_concurrent_with_barrier<F, T>(num_threads: usize, op: F) -> Vec<T>
where
    F: Fn(usize, Arc<Barrier>) -> T + Send + Clone + 'static,
    T: Send + 'static,
{
    let barrier = Arc::new(Barrier::new(num_threads));
    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let barrier = Arc::clone(&barrier);
            let op = op.clone();
            thread::spawn(move || op(thread_id, barrier))
        })
        .collect();

    wait_for_threads(handles)
}

fn wait_for_threads<T>(handles: Vec<JoinHandle<T>>) -> Vec<T> {
    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect()
}
