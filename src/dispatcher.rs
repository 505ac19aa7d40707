//! Event dispatcher: the single `event_task` loop (§4.4).
//!
//! Grounded on the teacher's event-drain + poll loop shape
//! (`src/events.rs::drain_events` feeding into a per-tick poll pass). The
//! dispatcher treats every context uniformly through `Stack::resolve` — it
//! never needs to know whether an id names a transport, server, or client.

use crate::bytepipe::BytePipe;
use crate::osal::{Event, EventKind};
use crate::server::ServerDataPorts;
use crate::stack::{self, PortHandle, ResolvedContext, Stack, MAX_PORTS};

/// Wait timeout used when no transport is registered for polling (§4.4).
const DEFAULT_WAIT_MS: u32 = 5000;
/// Wait timeout used once at least one transport wants per-tick polling.
const POLLING_WAIT_MS: u32 = 1;

/// The set of transports the dispatcher calls `poll()` on every iteration.
/// Populated/drained by `StartPolling`/`StopPolling` events, which a
/// transport posts when it has bytes in flight and wants to be ticked.
pub struct Poller {
    contexts: [Option<PortHandle>; MAX_PORTS],
}

impl Poller {
    pub fn new() -> Self {
        Self {
            contexts: [None; MAX_PORTS],
        }
    }

    fn add(&mut self, handle: PortHandle) {
        if self.contexts.iter().flatten().any(|&h| h == handle) {
            return;
        }
        if let Some(slot) = self.contexts.iter_mut().find(|s| s.is_none()) {
            *slot = Some(handle);
        }
    }

    fn remove(&mut self, handle: PortHandle) {
        for slot in self.contexts.iter_mut() {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.contexts.iter().all(Option::is_none)
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one iteration of the dispatcher: wait for (at most) one event, act on
/// it, then poll every registered transport exactly once. `now` is the
/// caller-supplied tick count (§4.3's 50 µs tick), since this crate never
/// reads a clock itself.
///
/// Call this in a loop from a cooperative single-thread `event_task`, or
/// spawn it as a dedicated preemptive task that loops forever.
pub async fn event_task<P: BytePipe, D: ServerDataPorts>(stack: &mut Stack<P, D>, poller: &mut Poller, now: u16) {
    let timeout_ms = if poller.is_empty() { DEFAULT_WAIT_MS } else { POLLING_WAIT_MS };

    if let Some(event) = stack.osal().event_wait(timeout_ms).await {
        handle_event(stack, poller, event);
    }

    poll_all(stack, poller, now);
}

fn handle_event<P: BytePipe, D: ServerDataPorts>(stack: &mut Stack<P, D>, poller: &mut Poller, event: Event) {
    match event.kind {
        EventKind::StartPolling => {
            if let Some(ResolvedContext::Port(handle)) = stack.resolve(event.ctx) {
                poller.add(handle);
            }
        }
        EventKind::StopPolling => {
            if let Some(ResolvedContext::Port(handle)) = stack.resolve(event.ctx) {
                poller.remove(handle);
            }
        }
        EventKind::PduReceived => dispatch_to_channel(stack, event),
        // No path in this transport implementation posts `TxComplete`
        // (tx-complete is resolved synchronously inside `TransportContext::poll`)
        // but the variant is matched exhaustively for forward compatibility.
        EventKind::TxComplete => {}
    }
}

fn dispatch_to_channel<P: BytePipe, D: ServerDataPorts>(stack: &mut Stack<P, D>, event: Event) {
    match stack.resolve(event.ctx) {
        Some(ResolvedContext::Server(handle)) => {
            if let Ok((server, transport)) = stack.server_and_port_mut(handle) {
                server.process(transport);
            }
        }
        Some(ResolvedContext::Client(handle)) => {
            if let Ok((client, transport)) = stack.client_and_port_mut(handle) {
                client.process(transport);
            }
        }
        _ => {}
    }
}

/// Poll every transport in the poller list once, and post `PduReceived` for
/// any that just finished assembling a frame (§4.3's ControlAndWait -> Idle
/// transition "post PduReceived to channel").
fn poll_all<P: BytePipe, D: ServerDataPorts>(stack: &mut Stack<P, D>, poller: &Poller, now: u16) {
    let mut ready: heapless::Vec<Event, MAX_PORTS> = heapless::Vec::new();

    for handle in poller.contexts.iter().flatten().copied() {
        if let Ok(transport) = stack.port_mut(handle) {
            if transport.poll(now).is_some() {
                if let Some(linked) = transport.linked_channel {
                    let _ = ready.push(Event {
                        kind: EventKind::PduReceived,
                        ctx: stack::channel_context_id(linked),
                    });
                }
            }
        }
    }

    for event in ready {
        stack.osal().event_post(event, false);
    }
}
