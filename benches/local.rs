#[macro_use]
extern crate criterion;

use bounded_fifo::{BoundedQueue, Cost, FullPolicy, WeightedQueue};
use criterion::{AxisScale, Criterion, ParameterizedBenchmark, PlotConfiguration};
use std::sync::Arc;

struct Frame(f64);

impl Cost for Frame {
    fn cost(&self) -> f64 {
        self.0
    }
}

fn sequential(messages: usize) {
    let queue = BoundedQueue::new(messages, FullPolicy::DropIncoming);

    for i in 0..messages {
        queue.push(i).unwrap();
    }

    for _ in 0..messages {
        queue.pull();
    }
}

fn sequential_weighted(messages: usize) {
    let queue = WeightedQueue::try_new(messages as f64, FullPolicy::DropIncoming).unwrap();

    for _ in 0..messages {
        queue.push(Frame(1.0)).unwrap();
    }

    for _ in 0..messages {
        queue.pull();
    }
}

fn sequential_evicting(messages: usize) {
    let queue = BoundedQueue::new(messages / 10 + 1, FullPolicy::DropOldest);

    for i in 0..messages {
        let _ = queue.push(i);
    }

    while queue.try_pull().is_some() {}
}

fn threaded(threads: usize, messages: usize) {
    let queue = Arc::new(BoundedQueue::new(messages, FullPolicy::DropIncoming));

    for _ in 0..threads {
        let queue = queue.clone();
        std::thread::spawn(move || {
            for i in 0..messages / threads {
                queue.push(i).unwrap();
            }
        });
    }

    for _ in 0..(messages / threads) * threads {
        queue.pull();
    }
}

fn threaded_weighted(threads: usize, messages: usize) {
    let queue = Arc::new(
        WeightedQueue::try_new(messages as f64 * 0.5, FullPolicy::DropIncoming).unwrap(),
    );

    for _ in 0..threads {
        let queue = queue.clone();
        std::thread::spawn(move || {
            for _ in 0..messages / threads {
                queue.push(Frame(0.5)).unwrap();
            }
        });
    }

    for _ in 0..(messages / threads) * threads {
        queue.pull();
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);

    let messages = vec![1, 10, 100, 1000, 10_000];

    c.bench(
        "sequential-local",
        ParameterizedBenchmark::new(
            "counted",
            |b, input| b.iter(|| sequential(*input)),
            messages.clone(),
        )
        .with_function("weighted", |b, input| {
            b.iter(|| sequential_weighted(*input))
        })
        .with_function("evicting", |b, input| {
            b.iter(|| sequential_evicting(*input))
        })
        .plot_config(plot_config.clone()),
    );

    let mut bench = ParameterizedBenchmark::new(
        "counted 1",
        |b, input| b.iter(|| threaded(1, *input)),
        messages.clone(),
    );

    for &thread in &[1, 2, 3, 4] {
        if thread != 1 {
            bench = bench.with_function(format!("counted {}", thread), move |b, input| {
                b.iter(move || threaded(thread, *input))
            });
        }
        bench = bench.with_function(format!("weighted {}", thread), move |b, input| {
            b.iter(move || threaded_weighted(thread, *input))
        });
    }

    c.bench("threaded-local", bench.plot_config(plot_config.clone()));
}

criterion_group!(local, criterion_benchmark);
criterion_main!(local);
