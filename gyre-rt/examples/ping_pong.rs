//! Classic ping/pong pair under one root supervisor, driven loopless:
//! no runtime, no timers, just `process()` until the tree has shut
//! itself down.
//!
//! Run with: `cargo run --example ping_pong`

use std::sync::Arc;
use std::time::Duration;

use gyre_rt::prelude::*;

#[derive(Debug, Clone)]
struct Ping;

impl Message for Ping {
    const MESSAGE_TYPE: &'static str = "ping";
}

#[derive(Debug, Clone)]
struct Pong;

impl Message for Pong {
    const MESSAGE_TYPE: &'static str = "pong";
}

struct Pinger {
    core: ActorCore,
    ponger: Option<Address>,
}

impl Actor for Pinger {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn on_initialize(&mut self) -> Result<(), ErrorCode> {
        let own = self.core.address().clone();
        self.subscribe(&own, Pinger::on_pong);
        Ok(())
    }

    fn on_start(&mut self) {
        if let Some(ponger) = &self.ponger {
            self.core.send(ponger, Ping);
        }
    }
}

impl Pinger {
    fn on_pong(&mut self, _msg: Pong) {
        println!("pong");
        if let Some(sup) = self.core.supervisor() {
            sup.do_shutdown();
        }
    }
}

struct Ponger {
    core: ActorCore,
    pinger: Option<Address>,
}

impl Actor for Ponger {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn on_initialize(&mut self) -> Result<(), ErrorCode> {
        let own = self.core.address().clone();
        self.subscribe(&own, Ponger::on_ping);
        Ok(())
    }
}

impl Ponger {
    fn on_ping(&mut self, _msg: Ping) {
        println!("ping");
        if let Some(pinger) = &self.pinger {
            self.core.send(pinger, Pong);
        }
    }
}

fn main() -> Result<(), SupervisorError> {
    let timeout = Duration::from_millis(500); // does not matter loopless
    let ctx = SystemContext::new();
    let sup = ctx.create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))?;

    let pinger = sup.create_actor(timeout, |core| Pinger { core, ponger: None })?;
    let ponger = sup.create_actor(timeout, |core| Ponger { core, pinger: None })?;
    pinger.with_mut(|p| p.ponger = Some(ponger.address().clone()));
    ponger.with_mut(|p| p.pinger = Some(pinger.address().clone()));

    sup.process();

    assert_eq!(sup.state(), ActorState::Shutdown);
    Ok(())
}
