//! Supervision Protocol Tests
//!
//! Covers the child-first shutdown cascade, the shutdown-timeout error
//! path, init failures under both supervision policies, and the
//! rejection of child creation once shutdown has started.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use gyre_rt::prelude::*;

const TIMEOUT: Duration = Duration::from_millis(100);

/// A well-behaved child that records its hook invocations.
struct Worker {
    core: ActorCore,
    started: bool,
    stopped: bool,
}

impl Actor for Worker {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn on_start(&mut self) {
        self.started = true;
    }

    fn on_shutdown(&mut self) {
        self.stopped = true;
    }
}

/// A child whose init hook fails.
struct Broken {
    core: ActorCore,
}

impl Actor for Broken {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn on_initialize(&mut self) -> Result<(), ErrorCode> {
        Err(ErrorCode::InitFailed)
    }
}

/// A child that can never finish its shutdown: it holds a foreign
/// subscription on a locality that is never processed, so the
/// unsubscription commit is never acknowledged.
struct Stuck {
    core: ActorCore,
    remote: Address,
}

impl Actor for Stuck {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn on_initialize(&mut self) -> Result<(), ErrorCode> {
        let remote = self.remote.clone();
        self.subscribe(&remote, Stuck::on_never);
        Ok(())
    }
}

impl Stuck {
    fn on_never(&mut self, _msg: Response<StateRequest>) {}
}

fn collector() -> (SystemContext, Arc<Mutex<Vec<ErrorCode>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let ctx = SystemContext::with_error_handler(move |code| sink.lock().push(code));
    (ctx, seen)
}

#[test]
fn test_cascaded_shutdown_with_mute_child() {
    let (ctx, errors) = collector();
    let timer = Arc::new(ManualTimer::new());
    let sup = ctx
        .create_supervisor(
            SupervisorConfig::builder()
                .with_shutdown_timeout(Duration::from_millis(5))
                .build()
                .expect("config"),
            Arc::clone(&timer) as Arc<dyn TimerDriver>,
        )
        .expect("root supervisor");

    // A frozen locality: its supervisor exists but nobody ever drains
    // its queue, so commits sent there are never acknowledged.
    let frozen = SystemContext::new()
        .create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))
        .expect("frozen supervisor");
    let remote = frozen.create_address();

    let c1 = sup
        .create_actor(TIMEOUT, move |core| Stuck { core, remote })
        .expect("c1");
    let c2 = sup
        .create_actor(TIMEOUT, |core| Worker {
            core,
            started: false,
            stopped: false,
        })
        .expect("c2");
    sup.process();
    assert_eq!(sup.state(), ActorState::Operational);

    sup.do_shutdown();
    sup.process();

    // C2 confirmed immediately; C1 is wedged mid-unsubscription.
    assert_eq!(c2.state(), ActorState::Shutdown);
    assert_eq!(c1.state(), ActorState::ShuttingDown);
    assert_eq!(sup.state(), ActorState::ShuttingDown);
    assert!(errors.lock().is_empty());

    // The shutdown timeout fires for C1.
    timer.fire_all();
    sup.process();

    assert_eq!(&*errors.lock(), &[ErrorCode::ShutdownFailed]);
    assert_eq!(sup.state(), ActorState::Shutdown);
    assert_eq!(sup.children_count(), 0);
    assert_eq!(sup.queue_len(), 0);
}

#[test]
fn test_init_failure_with_shutdown_self_policy() {
    let (ctx, errors) = collector();
    let sup = ctx
        .create_supervisor(
            SupervisorConfig::builder()
                .with_policy(SupervisionPolicy::ShutdownSelf)
                .build()
                .expect("config"),
            Arc::new(NoopTimer),
        )
        .expect("root supervisor");

    let broken = sup.create_actor(TIMEOUT, |core| Broken { core }).expect("c1");
    let fine = sup
        .create_actor(TIMEOUT, |core| Worker {
            core,
            started: false,
            stopped: false,
        })
        .expect("c2");
    sup.process();

    assert_eq!(sup.state(), ActorState::Shutdown);
    assert_eq!(broken.state(), ActorState::Shutdown);
    assert_eq!(fine.state(), ActorState::Shutdown);
    fine.with(|w| assert!(w.stopped));
    assert_eq!(sup.children_count(), 0);
    assert_eq!(sup.subscription_count(), 0);
    // The failure was handled by policy, not escalated to the context.
    assert!(errors.lock().is_empty());
}

#[test]
fn test_init_failure_with_escalate_policy_isolates_child() {
    let sup = SystemContext::new()
        .create_supervisor(
            SupervisorConfig::builder()
                .with_policy(SupervisionPolicy::Escalate)
                .build()
                .expect("config"),
            Arc::new(NoopTimer),
        )
        .expect("root supervisor");

    let broken = sup.create_actor(TIMEOUT, |core| Broken { core }).expect("c1");
    let fine = sup
        .create_actor(TIMEOUT, |core| Worker {
            core,
            started: false,
            stopped: false,
        })
        .expect("c2");
    sup.process();

    // Only the failing child went down; the tree keeps running.
    assert_eq!(sup.state(), ActorState::Operational);
    assert_eq!(broken.state(), ActorState::Shutdown);
    assert_eq!(fine.state(), ActorState::Operational);
    fine.with(|w| assert!(w.started));
    assert_eq!(sup.children_count(), 1);
}

#[test]
fn test_create_actor_rejected_once_shutdown_started() {
    let sup = SystemContext::new()
        .create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))
        .expect("root supervisor");
    sup.process();
    sup.do_shutdown();
    sup.process();
    assert_eq!(sup.state(), ActorState::Shutdown);

    let result = sup.create_actor(TIMEOUT, |core| Worker {
        core,
        started: false,
        stopped: false,
    });
    assert!(matches!(result, Err(SupervisorError::ShuttingDown { .. })));
    assert_eq!(sup.children_count(), 0);

    let nested = sup.create_supervisor(
        TIMEOUT,
        SupervisorConfig::default(),
        Arc::new(NoopTimer),
    );
    assert!(matches!(nested, Err(SupervisorError::ShuttingDown { .. })));
}

#[test]
fn test_nested_supervisor_cascade() {
    let sup = SystemContext::new()
        .create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))
        .expect("root supervisor");
    let mid = sup
        .create_supervisor(TIMEOUT, SupervisorConfig::default(), Arc::new(NoopTimer))
        .expect("mid supervisor");
    let leaf = mid
        .create_actor(TIMEOUT, |core| Worker {
            core,
            started: false,
            stopped: false,
        })
        .expect("leaf");
    sup.process();

    assert_eq!(sup.state(), ActorState::Operational);
    assert_eq!(mid.state(), ActorState::Operational);
    assert_eq!(leaf.state(), ActorState::Operational);

    sup.do_shutdown();
    sup.process();

    assert_eq!(leaf.state(), ActorState::Shutdown);
    assert_eq!(mid.state(), ActorState::Shutdown);
    assert_eq!(sup.state(), ActorState::Shutdown);
    assert_eq!(sup.children_count(), 0);
    assert_eq!(mid.children_count(), 0);
    assert_eq!(mid.subscription_count(), 0);
}

#[test]
fn test_mid_supervisor_shutdown_routes_through_parent() {
    let sup = SystemContext::new()
        .create_supervisor(SupervisorConfig::default(), Arc::new(NoopTimer))
        .expect("root supervisor");
    let mid = sup
        .create_supervisor(TIMEOUT, SupervisorConfig::default(), Arc::new(NoopTimer))
        .expect("mid supervisor");
    sup.process();

    // Shutting down the middle supervisor must not touch the root.
    mid.do_shutdown();
    sup.process();

    assert_eq!(mid.state(), ActorState::Shutdown);
    assert_eq!(sup.state(), ActorState::Operational);
    assert_eq!(sup.children_count(), 0);
}
