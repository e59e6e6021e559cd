//! Mock host for development and testing
//!
//! Simulates a board-side watcher runtime behind a [`HostEndpoint`]:
//! answers `list` requests with a small set of variables of different
//! element kinds, honors watch/control/log/monitor/set commands, and
//! streams timestamped buffers for watched variables plus single-sample
//! monitor buffers at the requested period.
//!
//! Masked writes are applied the way the board applies them:
//! read-modify-write of the integer value under the mask.
//!
//! # Enabling
//!
//! The mock host is gated behind the `mock-host` feature (on by
//! default):
//!
//! ```bash
//! cargo run --no-default-features   # disables it
//! ```

use crate::decode::{encode_timestamp, FrameBuffer};
use crate::host::HostEndpoint;
use crate::protocol::{
    ClientMessage, Cmd, ControlEnvelope, WatcherCommand, WatcherListPayload,
};
use crate::types::{WatcherDescriptor, WatcherKind};
use std::thread;
use std::time::Duration;

/// Sampling rate reported by the mock board
pub const MOCK_SAMPLE_RATE: u64 = 44_100;

/// Payload samples per streamed buffer
const BLOCK_SIZE: usize = 512;

/// Wall-clock pacing of the simulation loop
const UPDATE_INTERVAL: Duration = Duration::from_millis(50);

/// Waveform generated for a mock variable
#[derive(Debug, Clone, Copy)]
enum Pattern {
    /// Sine in [0, 1] with the given frequency in Hz
    Sine { frequency: f64 },
    /// Linear ramp in [0, 1] repeating with the given period in seconds
    Ramp { period: f64 },
    /// Square wave alternating between 0 and 1
    Square { period: f64 },
}

impl Pattern {
    fn sample(self, t_secs: f64, amplitude: f64) -> f64 {
        let raw = match self {
            Pattern::Sine { frequency } => {
                0.5 + 0.5 * (2.0 * std::f64::consts::PI * frequency * t_secs).sin()
            }
            Pattern::Ramp { period } => (t_secs % period) / period,
            Pattern::Square { period } => {
                if (t_secs % period) < period / 2.0 {
                    0.0
                } else {
                    1.0
                }
            }
        };
        raw * amplitude
    }
}

/// One simulated board variable
#[derive(Debug)]
struct MockVar {
    name: String,
    kind: WatcherKind,
    pattern: Pattern,
    watched: bool,
    controlled: bool,
    logged: bool,
    /// Current scalar value; doubles as the waveform amplitude so that
    /// remote writes are visible in the trace
    value: f64,
    monitor_period: u32,
    /// Next tick at which to emit a monitor sample, `None` = disabled
    monitor_next: Option<u64>,
    log_file_name: String,
}

impl MockVar {
    fn new(name: &str, kind: WatcherKind, pattern: Pattern) -> Self {
        Self {
            name: name.to_string(),
            kind,
            pattern,
            watched: false,
            controlled: false,
            logged: false,
            value: 1.0,
            monitor_period: 0,
            monitor_next: None,
            log_file_name: format!("{name}.bin"),
        }
    }

    fn descriptor(&self) -> WatcherDescriptor {
        WatcherDescriptor {
            name: self.name.clone(),
            type_code: self.kind.code().to_string(),
            watched: self.watched,
            controlled: self.controlled,
            logged: self.logged,
            value: self.value,
            monitor: self.monitor_period,
            log_file_name: self.log_file_name.clone(),
        }
    }

    /// Apply a masked write the way the board does: read-modify-write
    /// of the integer value under the mask
    fn set_masked(&mut self, value: f64, mask: u64) {
        let old = self.value as u64;
        let new = (old & !mask) | ((value as u64) & mask);
        self.value = new as f64;
    }
}

/// A simulated board runtime driving a [`HostEndpoint`]
pub struct MockHost {
    endpoint: HostEndpoint,
    vars: Vec<MockVar>,
    /// Board sample clock in ticks
    timestamp: u64,
}

impl MockHost {
    /// Create a mock board with a fixed set of variables
    pub fn new(endpoint: HostEndpoint) -> Self {
        let vars = vec![
            MockVar::new("osc", WatcherKind::F32, Pattern::Sine { frequency: 2.0 }),
            MockVar::new("lfo", WatcherKind::F64, Pattern::Sine { frequency: 0.5 }),
            MockVar::new("count", WatcherKind::U32, Pattern::Ramp { period: 1.0 }),
            MockVar::new("level", WatcherKind::I32, Pattern::Square { period: 0.7 }),
            MockVar::new("flags", WatcherKind::Char, Pattern::Square { period: 0.3 }),
        ];
        Self {
            endpoint,
            vars,
            timestamp: 0,
        }
    }

    /// Spawn the simulation thread. The thread exits once the UI side
    /// of the bridge is dropped.
    pub fn spawn(endpoint: HostEndpoint) -> thread::JoinHandle<()> {
        thread::spawn(move || MockHost::new(endpoint).run())
    }

    fn run(mut self) {
        tracing::info!("Mock host started ({} variables)", self.vars.len());
        loop {
            loop {
                match self.endpoint.commands.try_recv() {
                    Ok(msg) => self.handle(msg),
                    Err(crossbeam_channel::TryRecvError::Empty) => break,
                    Err(crossbeam_channel::TryRecvError::Disconnected) => {
                        tracing::info!("Mock host stopping: bridge dropped");
                        return;
                    }
                }
            }
            let ticks = (UPDATE_INTERVAL.as_secs_f64() * MOCK_SAMPLE_RATE as f64) as u64;
            self.step(ticks);
            thread::sleep(UPDATE_INTERVAL);
        }
    }

    /// Process one incoming control message
    fn handle(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::Commands { watcher } => {
                for cmd in &watcher {
                    self.apply(cmd);
                }
            }
            ClientMessage::Event { event } => {
                tracing::debug!("Client activity: {:?}", event);
            }
        }
    }

    fn apply(&mut self, cmd: &WatcherCommand) {
        if cmd.cmd == Cmd::List {
            let envelope = self.list_envelope();
            self.endpoint.publish(envelope);
            return;
        }
        for (n, name) in cmd.watchers.iter().enumerate() {
            let timestamp = self.timestamp;
            let Some(var) = self.vars.iter_mut().find(|v| &v.name == name) else {
                tracing::warn!("{:?} for unknown watcher {:?}", cmd.cmd, name);
                continue;
            };
            match cmd.cmd {
                Cmd::Watch => var.watched = true,
                Cmd::Unwatch => var.watched = false,
                Cmd::Control => var.controlled = true,
                Cmd::Uncontrol => var.controlled = false,
                Cmd::Log => var.logged = true,
                Cmd::Unlog => var.logged = false,
                Cmd::Set => {
                    if let Some(value) = cmd.values.as_ref().and_then(|v| v.get(n)) {
                        var.value = *value;
                    }
                }
                Cmd::SetMask => {
                    let value = cmd.values.as_ref().and_then(|v| v.get(n));
                    let mask = cmd.masks.as_ref().and_then(|m| m.get(n));
                    if let (Some(value), Some(mask)) = (value, mask) {
                        var.set_masked(*value, *mask);
                    }
                }
                Cmd::Monitor => {
                    let period = cmd
                        .periods
                        .as_ref()
                        .and_then(|p| p.get(n))
                        .copied()
                        .unwrap_or(0);
                    var.monitor_period = period;
                    // a period change triggers an immediate emission
                    var.monitor_next = (period > 0).then_some(timestamp);
                }
                Cmd::List => {}
            }
        }
    }

    fn list_envelope(&self) -> ControlEnvelope {
        ControlEnvelope {
            watcher: Some(WatcherListPayload {
                watchers: self.vars.iter().map(MockVar::descriptor).collect(),
                timestamp: self.timestamp,
                sample_rate: MOCK_SAMPLE_RATE,
            }),
        }
    }

    /// Advance the board clock by `ticks` and publish buffers for
    /// watched and monitored variables
    fn step(&mut self, ticks: u64) {
        let block_start = self.timestamp;
        self.timestamp += ticks;
        let now_ms = self.endpoint.clock.now_ms();

        for index in 0..self.vars.len() {
            let var = &mut self.vars[index];
            let mut frame = None;

            if var.watched {
                let mut samples = encode_timestamp(var.kind, block_start);
                for i in 0..BLOCK_SIZE {
                    let tick = block_start + (i as u64 * ticks) / BLOCK_SIZE as u64;
                    let t = tick as f64 / MOCK_SAMPLE_RATE as f64;
                    samples.push(var.pattern.sample(t, var.value));
                }
                frame = Some(samples);
            }

            if let Some(next) = var.monitor_next {
                if self.timestamp >= next {
                    let t = self.timestamp as f64 / MOCK_SAMPLE_RATE as f64;
                    let value = var.pattern.sample(t, var.value);
                    let mut samples = encode_timestamp(var.kind, self.timestamp);
                    samples.push(value);
                    // the monitor message shares the watcher's channel
                    frame = Some(samples);
                    var.monitor_next = if var.monitor_period > 1 {
                        Some(self.timestamp + u64::from(var.monitor_period))
                    } else {
                        // one-shot
                        None
                    };
                }
            }

            if let Some(samples) = frame {
                let kind_code = Some(var.kind.code());
                self.endpoint.put_buffer(
                    index,
                    FrameBuffer {
                        kind_code,
                        samples,
                        updated_at_ms: now_ms,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, Classified};
    use crate::host::{channel, HostEvent};

    #[test]
    fn test_list_request_answered() {
        let (bridge, endpoint) = channel();
        let mut host = MockHost::new(endpoint);

        host.handle(ClientMessage::command(WatcherCommand::list()));
        let events = bridge.drain();
        assert_eq!(events.len(), 1);
        let HostEvent::Control(envelope) = &events[0];
        let payload = envelope.watcher.as_ref().unwrap();
        assert_eq!(payload.watchers.len(), 5);
        assert_eq!(payload.sample_rate, MOCK_SAMPLE_RATE);
    }

    #[test]
    fn test_watch_streams_decodable_buffer() {
        let (bridge, endpoint) = channel();
        let mut host = MockHost::new(endpoint);

        host.handle(ClientMessage::command(WatcherCommand::watch("osc", true)));
        host.step(2205);

        let buffers = bridge.buffers();
        let buf = &buffers[0];
        assert_eq!(buf.kind_code, Some('f'));
        match decode(WatcherKind::F32, &buf.samples).unwrap() {
            Classified::Trace { timestamp, samples } => {
                assert_eq!(timestamp, 0);
                assert_eq!(samples.len(), BLOCK_SIZE);
                assert!(samples.iter().all(|s| (0.0..=1.0).contains(s)));
            }
            other => panic!("expected trace, got {:?}", other),
        }

        // unwatched channels never publish
        assert!(buffers.get(1).map(|b| b.samples.is_empty()).unwrap_or(true));
    }

    #[test]
    fn test_monitor_emits_single_sample() {
        let (bridge, endpoint) = channel();
        let mut host = MockHost::new(endpoint);

        host.handle(ClientMessage::command(WatcherCommand::monitor("count", 1000)));
        host.step(2205);

        let buffers = bridge.buffers();
        let buf = &buffers[2];
        match decode(WatcherKind::U32, &buf.samples).unwrap() {
            Classified::Monitor { timestamp, .. } => assert_eq!(timestamp, 2205),
            other => panic!("expected monitor, got {:?}", other),
        }
    }

    #[test]
    fn test_set_and_masked_write() {
        let (_bridge, endpoint) = channel();
        let mut host = MockHost::new(endpoint);

        host.handle(ClientMessage::command(WatcherCommand::set("count", 0xF0 as f64)));
        assert_eq!(host.vars[2].value, 240.0);

        // write 0x0F under mask 0xFF: low byte replaced, rest kept
        host.handle(ClientMessage::command(WatcherCommand::set_mask(
            "count", 0x0F as f64, 0xFF,
        )));
        assert_eq!(host.vars[2].value, 15.0);

        // masked write outside the mask leaves the value alone
        host.handle(ClientMessage::command(WatcherCommand::set_mask(
            "count",
            0xF00 as f64,
            0xFF,
        )));
        assert_eq!(host.vars[2].value, 0.0);
    }

    #[test]
    fn test_one_shot_monitor_disables() {
        let (_bridge, endpoint) = channel();
        let mut host = MockHost::new(endpoint);

        host.handle(ClientMessage::command(WatcherCommand::monitor("lfo", 1)));
        host.step(100);
        assert!(host.vars[1].monitor_next.is_none());
    }
}
