//! Request/Response/Timeout Protocol Tests
//!
//! Covers the exactly-once response guarantee: a request that is never
//! answered times out with `RequestTimeout`, an answered request never
//! times out, and a late reply after the timeout is dropped silently.
//! The deterministic tests drive a `ManualTimer`; one test runs the real
//! Tokio timer binding end to end.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use gyre_rt::prelude::*;

#[derive(Debug, Clone)]
struct Lookup {
    key: u32,
}

impl Message for Lookup {
    const MESSAGE_TYPE: &'static str = "lookup";
}

impl Requestable for Lookup {
    type Reply = u32;
}

/// Issues one `Lookup` request and records every response it sees.
struct Requester {
    core: ActorCore,
    outcomes: Vec<Result<u32, ErrorCode>>,
}

impl Actor for Requester {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn on_initialize(&mut self) -> Result<(), ErrorCode> {
        let own = self.core.address().clone();
        self.subscribe(&own, Requester::on_response);
        Ok(())
    }
}

impl Requester {
    fn on_response(&mut self, response: Response<Lookup>) {
        let outcome = match response.error() {
            Some(code) => Err(code),
            None => Ok(*response.reply().unwrap_or(&0)),
        };
        self.outcomes.push(outcome);
    }
}

/// Answers `Lookup` requests, unless told to stay silent.
struct Responder {
    core: ActorCore,
    mute: bool,
}

impl Actor for Responder {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn on_initialize(&mut self) -> Result<(), ErrorCode> {
        let own = self.core.address().clone();
        self.subscribe(&own, Responder::on_lookup);
        Ok(())
    }
}

impl Responder {
    fn on_lookup(&mut self, request: Request<Lookup>) {
        if !self.mute {
            self.core.reply(&request, request.payload().key * 2);
        }
    }
}

const TIMEOUT: Duration = Duration::from_millis(10);

fn harness() -> (Supervisor, Arc<ManualTimer>, ActorHandle<Requester>) {
    let timer = Arc::new(ManualTimer::new());
    let sup = SystemContext::new()
        .create_supervisor(
            SupervisorConfig::default(),
            Arc::clone(&timer) as Arc<dyn TimerDriver>,
        )
        .expect("root supervisor");
    let requester = sup
        .create_actor(Duration::from_millis(500), |core| Requester {
            core,
            outcomes: Vec::new(),
        })
        .expect("requester");
    sup.process();
    (sup, timer, requester)
}

#[test]
fn test_unanswered_request_times_out() {
    let (sup, timer, requester) = harness();

    // No handler for Lookup is registered at the destination.
    let dest = sup.create_address();
    requester.with(|r| r.core().request(&dest, Lookup { key: 7 }).send(TIMEOUT));
    sup.process();

    assert_eq!(sup.pending_request_count(), 1);
    requester.with(|r| assert!(r.outcomes.is_empty()));

    timer.fire_all();
    sup.process();

    requester.with(|r| assert_eq!(r.outcomes, vec![Err(ErrorCode::RequestTimeout)]));
    assert_eq!(sup.pending_request_count(), 0);
    assert_eq!(sup.queue_len(), 0);
}

#[test]
fn test_answered_request_cancels_timer() {
    let (sup, timer, requester) = harness();
    let responder = sup
        .create_actor(Duration::from_millis(500), |core| Responder {
            core,
            mute: false,
        })
        .expect("responder");
    sup.process();

    requester.with(|r| {
        r.core()
            .request(responder.address(), Lookup { key: 21 })
            .send(TIMEOUT)
    });
    sup.process();

    requester.with(|r| assert_eq!(r.outcomes, vec![Ok(42)]));
    assert_eq!(sup.pending_request_count(), 0);
    // The reply settled the exchange, so its timer must be disarmed.
    assert!(timer.is_empty());
}

#[test]
fn test_late_reply_after_timeout_is_dropped() {
    let (sup, timer, requester) = harness();
    let responder = sup
        .create_actor(Duration::from_millis(500), |core| Responder {
            core,
            mute: true,
        })
        .expect("responder");
    sup.process();

    requester.with(|r| {
        r.core()
            .request(responder.address(), Lookup { key: 1 })
            .send(TIMEOUT)
    });
    sup.process(); // request delivered; mute responder stays silent

    timer.fire_all();
    sup.process(); // timeout response delivered

    requester.with(|r| assert_eq!(r.outcomes, vec![Err(ErrorCode::RequestTimeout)]));

    // The responder answers only now, long after the timeout fired.
    responder.with_mut(|r| r.mute = false);
    let late = requester.with(|r| {
        r.core()
            .request(responder.address(), Lookup { key: 3 })
            .send(TIMEOUT)
    });
    assert!(late.is_some());
    sup.process();

    // Exactly one new outcome: the success. The earlier exchange stays
    // settled at one timeout response.
    requester.with(|r| assert_eq!(r.outcomes, vec![Err(ErrorCode::RequestTimeout), Ok(6)]));
}

#[test]
fn test_request_ids_are_monotonic_and_unique() {
    let (sup, timer, requester) = harness();
    let dest = sup.create_address();

    let first = requester.with(|r| r.core().request(&dest, Lookup { key: 1 }).send(TIMEOUT));
    let second = requester.with(|r| r.core().request(&dest, Lookup { key: 2 }).send(TIMEOUT));
    sup.process();

    let (first, second) = (first.expect("first id"), second.expect("second id"));
    assert!(second > first);

    // Even after cancellation/timeout, ids never repeat.
    timer.fire_all();
    sup.process();
    let third = requester.with(|r| r.core().request(&dest, Lookup { key: 3 }).send(TIMEOUT));
    assert!(third.expect("third id") > second);
}

#[test]
fn test_timeout_with_tokio_timer_binding() {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    runtime.block_on(async {
        let sup = SystemContext::new()
            .create_supervisor(SupervisorConfig::default(), Arc::new(TokioTimer::new()))
            .expect("root supervisor");
        let requester = sup
            .create_actor(Duration::from_millis(500), |core| Requester {
                core,
                outcomes: Vec::new(),
            })
            .expect("requester");
        sup.start();

        // Wait until the tree is up.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while requester.state() != ActorState::Operational {
            assert!(tokio::time::Instant::now() < deadline, "init did not finish");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let dest = sup.create_address();
        requester.with(|r| {
            r.core()
                .request(&dest, Lookup { key: 9 })
                .send(Duration::from_millis(10))
        });

        while requester.with(|r| r.outcomes.is_empty()) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timeout response never arrived"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        requester.with(|r| assert_eq!(r.outcomes, vec![Err(ErrorCode::RequestTimeout)]));
        assert_eq!(sup.pending_request_count(), 0);
    });
}
