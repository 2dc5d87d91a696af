//! Dispatch throughput benchmarks: single-message round trips and
//! batched delivery through one locality queue.

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use gyre_rt::prelude::*;

#[derive(Debug, Clone)]
struct Tick;

impl Message for Tick {
    const MESSAGE_TYPE: &'static str = "tick";
}

struct Counter {
    core: ActorCore,
    count: u64,
}

impl Actor for Counter {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn on_initialize(&mut self) -> Result<(), ErrorCode> {
        let own = self.core.address().clone();
        self.subscribe(&own, Counter::on_tick);
        Ok(())
    }
}

impl Counter {
    fn on_tick(&mut self, _msg: Tick) {
        self.count += 1;
    }
}

fn harness() -> (Supervisor, Address) {
    let sup = SystemContext::new()
        .create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))
        .expect("root supervisor");
    let counter = sup
        .create_actor(Duration::from_millis(500), |core| Counter { core, count: 0 })
        .expect("counter");
    sup.process();
    (sup, counter.address().clone())
}

fn single_message_dispatch(c: &mut Criterion) {
    let (sup, addr) = harness();
    c.bench_function("dispatch_single_message", |b| {
        b.iter(|| {
            sup.send(&addr, Tick);
            sup.process();
        });
    });
}

fn batched_dispatch(c: &mut Criterion) {
    let (sup, addr) = harness();
    c.bench_function("dispatch_batch_100", |b| {
        b.iter(|| {
            for _ in 0..100 {
                sup.send(&addr, Tick);
            }
            sup.process();
        });
    });
}

fn actor_spawn(c: &mut Criterion) {
    c.bench_function("create_actor_and_init", |b| {
        b.iter(|| {
            let (sup, _addr) = harness();
            sup.do_shutdown();
            sup.process();
        });
    });
}

criterion_group!(
    benches,
    single_message_dispatch,
    batched_dispatch,
    actor_spawn
);
criterion_main!(benches);
