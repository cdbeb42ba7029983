use bounded_fifo::{Accounting, BoundedQueue, Cost, FullPolicy, PushError, WeightedQueue};
use clap::Parser;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Hammers a queue with producer and consumer threads and reports how many
/// items made it through.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long, default_value_t = 1)]
    producers: usize,
    #[arg(long, default_value_t = 1)]
    consumers: usize,
    /// Item count, or total cost with `--weighted`.
    #[arg(long, default_value_t = 1024.0)]
    capacity: f64,
    #[arg(long, default_value_t = FullPolicy::DropIncoming)]
    policy: FullPolicy,
    /// Bound the queue by frame duration instead of item count.
    #[arg(long)]
    weighted: bool,
    #[arg(long, default_value_t = 5)]
    seconds: u64,
    #[arg(long, env = "THROUGHPUT_RUNS", default_value_t = 3)]
    runs: u32,
}

struct Frame {
    seconds: f64,
}

impl Cost for Frame {
    fn cost(&self) -> f64 {
        self.seconds
    }
}

#[derive(Debug, Default)]
struct Counters {
    pushed: AtomicU64,
    rejected: AtomicU64,
    evicted: AtomicU64,
    pulled: AtomicU64,
}

fn run<T, A>(queue: Arc<BoundedQueue<T, A>>, args: &Args, make: fn(u64) -> T) -> Arc<Counters>
where
    T: Send + 'static,
    A: Accounting<T> + Send + 'static,
    A::Measure: Send,
{
    let stop = Arc::new(AtomicBool::new(false));
    let counters = Arc::new(Counters::default());
    let mut joiners = Vec::new();

    for _ in 0..args.producers {
        let (queue, stop, counters) = (queue.clone(), stop.clone(), counters.clone());
        joiners.push(thread::spawn(move || {
            let mut i = 0;
            while !stop.load(Ordering::Relaxed) {
                match queue.push(make(i)) {
                    Ok(()) => counters.pushed.fetch_add(1, Ordering::Relaxed),
                    Err(PushError::Evicted(n)) => {
                        counters.pushed.fetch_add(1, Ordering::Relaxed);
                        counters.evicted.fetch_add(n as u64, Ordering::Relaxed)
                    }
                    Err(_) => {
                        thread::yield_now();
                        counters.rejected.fetch_add(1, Ordering::Relaxed)
                    }
                };
                i += 1;
            }
        }));
    }

    for _ in 0..args.consumers {
        let (queue, stop, counters) = (queue.clone(), stop.clone(), counters.clone());
        joiners.push(thread::spawn(move || {
            // a blocking pull could outlive the producers, so poll the flag
            while !stop.load(Ordering::Relaxed) {
                if queue.pull_timeout(Duration::from_millis(10)).is_some() {
                    counters.pulled.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    thread::sleep(Duration::from_secs(args.seconds));
    stop.store(true, Ordering::SeqCst);
    for joiner in joiners {
        // make sure all the threads finish
        if joiner.join().is_err() {
            warn!("worker thread panicked");
        }
    }
    queue.clear();
    counters
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    info!(?args, "starting throughput run");

    for run_id in 0..args.runs {
        let start = Instant::now();
        let counters = if args.weighted {
            let queue = Arc::new(WeightedQueue::try_new(args.capacity, args.policy)?);
            run(queue, &args, |i| Frame {
                seconds: 0.02 + (i % 3) as f64 * 0.01,
            })
        } else {
            let queue = Arc::new(BoundedQueue::new(args.capacity as usize, args.policy));
            run(queue, &args, |i| i)
        };
        let elapsed = start.elapsed();
        let pulled = counters.pulled.load(Ordering::Relaxed);

        info!(
            run = run_id,
            pushed = counters.pushed.load(Ordering::Relaxed),
            rejected = counters.rejected.load(Ordering::Relaxed),
            evicted = counters.evicted.load(Ordering::Relaxed),
            pulled,
            per_ms = pulled / elapsed.as_millis().max(1) as u64,
            "run finished in {:?}",
            elapsed
        );
    }
    Ok(())
}
