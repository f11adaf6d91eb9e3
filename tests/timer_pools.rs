use lightning_pool::{PoolOptions, TickerPool, TimerPool};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_timer_pool_across_tasks() {
    let pool = Arc::new(TimerPool::new(4, &PoolOptions::default()));

    let mut handles = vec![];
    for i in 0..16u64 {
        let pool_clone = Arc::clone(&pool);
        handles.push(tokio::spawn(async move {
            let mut timer = pool_clone.get(Duration::from_millis(1 + i % 3));
            timer.wait().await;
            assert!(timer.is_elapsed());
            pool_clone.put(timer)
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(pool.len() <= pool.cap());
    let stats = pool.stats();
    assert_eq!(stats.hits + stats.misses, 16);
    assert_eq!(stats.returns + stats.drops, 16);
}

#[tokio::test]
async fn test_ticker_ref_release() {
    let pool = TickerPool::new(2, &PoolOptions::default());

    let mut r = pool.get_ref(Duration::from_millis(2));
    if let Some(ticker) = r.get_mut() {
        let a = ticker.tick().await;
        let b = ticker.tick().await;
        assert!(b >= a + Duration::from_millis(2));
    }
    assert!(r.release());
    assert!(!r.release());
    assert_eq!(pool.len(), 1);

    let ticker = pool.get(Duration::from_millis(7));
    assert_eq!(ticker.period(), Duration::from_millis(7));
    assert_eq!(pool.stats().hits, 1);
}
