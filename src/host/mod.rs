//! Host channel bridge
//!
//! The transport that actually talks to the board (a WebSocket-like
//! session owned by the host runtime) is an external collaborator. This
//! module provides the seam between it and the UI: a pair of crossbeam
//! channels for JSON control messages plus a shared live buffer store
//! that the renderer re-reads every frame.
//!
//! - [`HostBridge`] - UI-side handle: fire-and-forget sends, non-blocking
//!   drains, buffer snapshots
//! - [`HostEndpoint`] - transport-side handle: command receiver, event
//!   sender, writable buffer store
//! - [`mock`] - a feature-gated simulated board for development and tests

#[cfg(feature = "mock-host")]
pub mod mock;

use crate::decode::FrameBuffer;
use crate::protocol::{ClientMessage, ControlEnvelope};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// The host-exposed live array of raw buffers, one per active channel
pub type BufferStore = Arc<RwLock<Vec<FrameBuffer>>>;

/// An event delivered by the host transport
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// An incoming control message
    Control(ControlEnvelope),
}

/// Shared millisecond clock for buffer update markers and staleness math.
///
/// Both ends of the bridge stamp times against the same epoch.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    fn new() -> Self {
        Self { epoch: Instant::now() }
    }

    /// Milliseconds elapsed since the bridge was created
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

/// UI-side handle to the host channel
pub struct HostBridge {
    outgoing: Sender<ClientMessage>,
    incoming: Receiver<HostEvent>,
    buffers: BufferStore,
    clock: Clock,
}

impl HostBridge {
    /// Send a control message, fire-and-forget. Delivery failures are
    /// the transport's concern; a full or disconnected channel is
    /// logged and dropped.
    pub fn send(&self, msg: ClientMessage) {
        if let Err(e) = self.outgoing.try_send(msg) {
            tracing::warn!("Dropping outgoing control message: {}", e);
        }
    }

    /// Receive all pending host events without blocking
    pub fn drain(&self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = self.incoming.try_recv() {
            events.push(ev);
        }
        events
    }

    /// Snapshot of the live buffer store
    pub fn buffers(&self) -> Vec<FrameBuffer> {
        match self.buffers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The shared clock
    pub fn clock(&self) -> Clock {
        self.clock
    }
}

/// Transport-side handle to the host channel
pub struct HostEndpoint {
    /// Commands sent by the UI
    pub commands: Receiver<ClientMessage>,
    /// Event sender towards the UI
    pub events: Sender<HostEvent>,
    /// Writable live buffer store
    pub buffers: BufferStore,
    /// The shared clock
    pub clock: Clock,
}

impl HostEndpoint {
    /// Deliver a control envelope to the UI. Returns false when the UI
    /// side is gone.
    pub fn publish(&self, envelope: ControlEnvelope) -> bool {
        self.events.send(HostEvent::Control(envelope)).is_ok()
    }

    /// Replace the buffer at `index`, growing the store as needed
    pub fn put_buffer(&self, index: usize, buffer: FrameBuffer) {
        let mut guard = match self.buffers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.len() <= index {
            guard.resize_with(index + 1, FrameBuffer::default);
        }
        guard[index] = buffer;
    }
}

/// Create a connected bridge/endpoint pair sharing a buffer store and clock
pub fn channel() -> (HostBridge, HostEndpoint) {
    let (cmd_tx, cmd_rx) = bounded(256);
    let (ev_tx, ev_rx) = bounded(256);
    let buffers: BufferStore = Arc::new(RwLock::new(Vec::new()));
    let clock = Clock::new();

    let bridge = HostBridge {
        outgoing: cmd_tx,
        incoming: ev_rx,
        buffers: buffers.clone(),
        clock,
    };
    let endpoint = HostEndpoint {
        commands: cmd_rx,
        events: ev_tx,
        buffers,
        clock,
    };
    (bridge, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::WatcherCommand;

    #[test]
    fn test_bridge_round_trip() {
        let (bridge, endpoint) = channel();

        bridge.send(ClientMessage::command(WatcherCommand::list()));
        let msg = endpoint.commands.try_recv().unwrap();
        assert!(matches!(msg, ClientMessage::Commands { .. }));

        assert!(endpoint.publish(ControlEnvelope::default()));
        assert_eq!(bridge.drain().len(), 1);
        assert!(bridge.drain().is_empty());
    }

    #[test]
    fn test_buffer_store_grows() {
        let (bridge, endpoint) = channel();
        endpoint.put_buffer(
            2,
            FrameBuffer {
                kind_code: Some('f'),
                samples: vec![0.0, 0.0, 0.5],
                updated_at_ms: endpoint.clock.now_ms(),
            },
        );
        let buffers = bridge.buffers();
        assert_eq!(buffers.len(), 3);
        assert!(buffers[0].samples.is_empty());
        assert_eq!(buffers[2].kind_code, Some('f'));
    }

    #[test]
    fn test_clock_is_shared() {
        let (bridge, endpoint) = channel();
        let a = bridge.clock().now_ms();
        let b = endpoint.clock.now_ms();
        assert!((b - a).abs() < 1000.0);
    }
}
