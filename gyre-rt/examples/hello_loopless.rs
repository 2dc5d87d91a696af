//! The smallest possible tree: one supervisor, one actor that greets on
//! start and immediately asks to be shut down. No event loop, no
//! timers.
//!
//! Run with: `cargo run --example hello_loopless`

use std::sync::Arc;
use std::time::Duration;

use gyre_rt::prelude::*;

struct Hello {
    core: ActorCore,
}

impl Actor for Hello {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn on_start(&mut self) {
        println!("hello world");
        self.core.do_shutdown();
    }
}

fn main() -> Result<(), SupervisorError> {
    let ctx = SystemContext::new();
    let sup = ctx.create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))?;
    let _hello = sup.create_actor(Duration::from_millis(500), |core| Hello { core })?;

    sup.process();
    Ok(())
}
