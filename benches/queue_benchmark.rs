//! Performance benchmarks for dispatchq
//!
//! Run with: cargo bench

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dispatchq::{DispatchConfig, QueueService, Result, WorkItem};
use std::time::Duration;
use tokio::runtime::Runtime;

/// A minimal work item for measuring queue overhead
struct BenchItem {
    id: usize,
    created: DateTime<Utc>,
}

impl BenchItem {
    fn new(id: usize) -> Self {
        Self {
            id,
            created: Utc::now(),
        }
    }
}

#[async_trait]
impl WorkItem for BenchItem {
    async fn execute(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({"id": self.id}))
    }

    fn name(&self) -> &str {
        "bench"
    }

    fn work_type(&self) -> &str {
        "bench"
    }

    fn created_time(&self) -> DateTime<Utc> {
        self.created
    }
}

/// A work item with simulated work
struct WorkLoadItem {
    id: usize,
    work_us: u64,
    created: DateTime<Utc>,
}

#[async_trait]
impl WorkItem for WorkLoadItem {
    async fn execute(&self) -> Result<serde_json::Value> {
        tokio::time::sleep(Duration::from_micros(self.work_us)).await;
        Ok(serde_json::json!({"id": self.id}))
    }

    fn name(&self) -> &str {
        "work"
    }

    fn work_type(&self) -> &str {
        "work"
    }

    fn created_time(&self) -> DateTime<Utc> {
        self.created
    }
}

fn bench_config() -> DispatchConfig {
    DispatchConfig::default().with_poll_interval(Duration::from_millis(1))
}

fn bench_enqueue_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("enqueue_throughput");

    for size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let service = QueueService::new(bench_config()).unwrap();
                service.start().await;

                for i in 0..size {
                    service.enqueue(Box::new(BenchItem::new(i))).await;
                }

                service.shutdown().await;
                service.drain(Duration::from_secs(5)).await.unwrap();
            });
        });
    }

    group.finish();
}

fn bench_concurrent_execution(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("concurrent_execution");

    for concurrency in [1, 3, 10, 20].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            concurrency,
            |b, &concurrency| {
                b.to_async(&rt).iter(|| async move {
                    let config = bench_config().with_type_concurrency("work", concurrency);
                    let service = QueueService::new(config).unwrap();
                    service.start().await;

                    for i in 0..100 {
                        let item = Box::new(WorkLoadItem {
                            id: i,
                            work_us: 100, // 100 microseconds of work
                            created: Utc::now(),
                        });
                        service.enqueue(item).await;
                    }

                    service.shutdown().await;
                    service.drain(Duration::from_secs(5)).await.unwrap();
                });
            },
        );
    }

    group.finish();
}

fn bench_priority_scheduling(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    /// BenchItem at a caller-chosen priority
    struct PrioritizedItem {
        inner: BenchItem,
        priority: dispatchq::Priority,
    }

    #[async_trait]
    impl WorkItem for PrioritizedItem {
        async fn execute(&self) -> Result<serde_json::Value> {
            self.inner.execute().await
        }
        fn name(&self) -> &str {
            self.inner.name()
        }
        fn work_type(&self) -> &str {
            self.inner.work_type()
        }
        fn priority(&self) -> dispatchq::Priority {
            self.priority
        }
        fn created_time(&self) -> DateTime<Utc> {
            self.inner.created_time()
        }
    }

    c.bench_function("priority_scheduling", |b| {
        b.to_async(&rt).iter(|| async {
            let service = QueueService::new(bench_config()).unwrap();
            service.start().await;

            // Mixed priorities in submission order
            for i in 0..30 {
                let item = Box::new(PrioritizedItem {
                    inner: BenchItem::new(i),
                    priority: (i % 3) as dispatchq::Priority,
                });
                service.enqueue(item).await;
            }

            service.shutdown().await;
            service.drain(Duration::from_secs(5)).await.unwrap();
        });
    });
}

fn bench_serial_chain(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("serial_chain");

    for length in [2, 5, 10].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(length), length, |b, &length| {
            b.to_async(&rt).iter(|| async move {
                let service = QueueService::new(bench_config()).unwrap();
                service.start().await;

                let items: Vec<Box<dyn WorkItem>> = (0..length)
                    .map(|i| Box::new(BenchItem::new(i)) as Box<dyn WorkItem>)
                    .collect();
                service.enqueue_serial(items, Duration::ZERO).await;

                service.shutdown().await;
                service.drain(Duration::from_secs(5)).await.unwrap();
            });
        });
    }

    group.finish();
}

fn bench_dedup_overhead(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    /// BenchItem carrying a uniqueness key
    struct KeyedItem {
        inner: BenchItem,
        key: String,
    }

    #[async_trait]
    impl WorkItem for KeyedItem {
        async fn execute(&self) -> Result<serde_json::Value> {
            self.inner.execute().await
        }
        fn name(&self) -> &str {
            self.inner.name()
        }
        fn work_type(&self) -> &str {
            self.inner.work_type()
        }
        fn key(&self) -> Option<String> {
            Some(self.key.clone())
        }
        fn created_time(&self) -> DateTime<Utc> {
            self.inner.created_time()
        }
    }

    let mut group = c.benchmark_group("dedup_overhead");

    group.bench_function("without_keys", |b| {
        b.to_async(&rt).iter(|| async {
            let service = QueueService::new(bench_config()).unwrap();
            service.start().await;

            for i in 0..100 {
                service.enqueue(Box::new(BenchItem::new(i))).await;
            }

            service.shutdown().await;
            service.drain(Duration::from_secs(5)).await.unwrap();
        });
    });

    group.bench_function("with_keys", |b| {
        b.to_async(&rt).iter(|| async {
            let service = QueueService::new(bench_config()).unwrap();
            service.start().await;

            for i in 0..100 {
                let item = Box::new(KeyedItem {
                    inner: BenchItem::new(i),
                    key: format!("key-{i}"),
                });
                service.enqueue(item).await;
            }

            service.shutdown().await;
            service.drain(Duration::from_secs(5)).await.unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_enqueue_throughput,
    bench_concurrent_execution,
    bench_priority_scheduling,
    bench_serial_chain,
    bench_dedup_overhead
);
criterion_main!(benches);
