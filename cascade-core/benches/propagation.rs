//! Benchmarks for change propagation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cascade_core::{create_root, freeze, Config, Memo, Runtime, Signal};

fn quiet() {
    Runtime::configure(Config {
        warn_unowned: false,
        ..Config::default()
    });
}

fn bench_signal_write_without_readers(c: &mut Criterion) {
    quiet();
    let signal = Signal::new(0u64);
    let mut next = 0u64;

    c.bench_function("signal_write_without_readers", |b| {
        b.iter(|| {
            next += 1;
            signal.set(black_box(next)).unwrap();
        })
    });
}

fn bench_memo_chain(c: &mut Criterion) {
    quiet();
    let mut group = c.benchmark_group("memo_chain");

    for depth in [10usize, 100, 1000] {
        create_root(|_| {
            let source = Signal::new(0u64);
            let mut tail = {
                let source = source.clone();
                Memo::new(move || Ok(source.get() + 1)).unwrap()
            };
            for _ in 1..depth {
                let prev = tail.clone();
                tail = Memo::new(move || Ok(prev.get()? + 1)).unwrap();
            }

            let mut next = 0u64;
            group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
                b.iter(|| {
                    next += 1;
                    source.set(next).unwrap();
                    black_box(tail.get_untracked())
                })
            });
        });
    }
    group.finish();
}

fn bench_diamond(c: &mut Criterion) {
    quiet();
    let mut group = c.benchmark_group("diamond");

    for width in [4usize, 64, 512] {
        create_root(|_| {
            let source = Signal::new(0u64);
            let branches: Vec<Memo<u64>> = (0..width as u64)
                .map(|i| {
                    let source = source.clone();
                    Memo::new(move || Ok(source.get() * i)).unwrap()
                })
                .collect();
            let sum = Memo::new(move || branches.iter().map(Memo::get).sum::<Result<u64, _>>())
                .unwrap();

            let mut next = 0u64;
            group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
                b.iter(|| {
                    next += 1;
                    source.set(next).unwrap();
                    black_box(sum.get_untracked())
                })
            });
        });
    }
    group.finish();
}

fn bench_frozen_writes(c: &mut Criterion) {
    quiet();
    create_root(|_| {
        let signals: Vec<Signal<u64>> = (0..32).map(Signal::new).collect();
        let total = {
            let signals = signals.clone();
            Memo::new(move || Ok(signals.iter().map(Signal::get).sum::<u64>())).unwrap()
        };

        let mut next = 0u64;
        c.bench_function("frozen_writes_32", |b| {
            b.iter(|| {
                next += 1;
                freeze(|| signals.iter().try_for_each(|s| s.set(next))).unwrap();
                black_box(total.get_untracked())
            })
        });
    });
}

fn bench_child_churn(c: &mut Criterion) {
    quiet();
    create_root(|_| {
        let source = Signal::new(0u64);
        let _parent = {
            let source = source.clone();
            Memo::new(move || {
                let n = source.get();
                for _ in 0..16 {
                    let source = source.clone();
                    Memo::new(move || Ok(source.get() + n))?;
                }
                Ok(n)
            })
            .unwrap()
        };

        let mut next = 0u64;
        c.bench_function("child_churn_16", |b| {
            b.iter(|| {
                next += 1;
                source.set(black_box(next)).unwrap();
            })
        });
    });
}

criterion_group!(
    benches,
    bench_signal_write_without_readers,
    bench_memo_chain,
    bench_diamond,
    bench_frozen_writes,
    bench_child_churn,
);
criterion_main!(benches);
