//! Wire protocol for the board's control channel
//!
//! JSON-shaped messages exchanged with the host runtime. Outgoing
//! messages carry either a batch of watcher commands or a client
//! activity event; incoming messages carry the authoritative watcher
//! list plus stream metadata.
//!
//! # Outgoing shape
//!
//! ```json
//! { "watcher": [ { "cmd": "watch", "watchers": ["gain"] } ] }
//! { "event": "active" }
//! ```
//!
//! Optional payload arrays (`values`, `masks`, `timestamps`, `periods`)
//! are omitted entirely when a command does not use them.

use crate::types::WatcherDescriptor;
use serde::{Deserialize, Serialize};

/// A control-channel command verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cmd {
    /// Request the current watcher list
    List,
    /// Start streaming a watcher's buffer
    Watch,
    /// Stop streaming
    Unwatch,
    /// Take remote control of a watcher's value
    Control,
    /// Release remote control
    Uncontrol,
    /// Start logging to board storage
    Log,
    /// Stop logging
    Unlog,
    /// Write a value
    Set,
    /// Write a value under a bitmask
    #[serde(rename = "setMask")]
    SetMask,
    /// Set the monitoring period
    Monitor,
}

/// One outgoing watcher command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatcherCommand {
    /// Command verb
    pub cmd: Cmd,
    /// Target watcher names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watchers: Vec<String>,
    /// Values for `set`/`setMask`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    /// Bitmasks for `setMask`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masks: Option<Vec<u64>>,
    /// Scheduled start timestamps for `log`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Vec<u64>>,
    /// Monitoring periods for `monitor`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods: Option<Vec<u32>>,
}

impl WatcherCommand {
    fn bare(cmd: Cmd, watchers: Vec<String>) -> Self {
        Self {
            cmd,
            watchers,
            values: None,
            masks: None,
            timestamps: None,
            periods: None,
        }
    }

    /// `{cmd: "list"}` - request the watcher list
    pub fn list() -> Self {
        Self::bare(Cmd::List, Vec::new())
    }

    /// Start or stop watching a variable
    pub fn watch(name: impl Into<String>, enable: bool) -> Self {
        let cmd = if enable { Cmd::Watch } else { Cmd::Unwatch };
        Self::bare(cmd, vec![name.into()])
    }

    /// Take or release remote control of a variable
    pub fn control(name: impl Into<String>, enable: bool) -> Self {
        let cmd = if enable { Cmd::Control } else { Cmd::Uncontrol };
        Self::bare(cmd, vec![name.into()])
    }

    /// Start logging, scheduled to begin at `start_timestamp`
    pub fn log(name: impl Into<String>, start_timestamp: u64) -> Self {
        let mut cmd = Self::bare(Cmd::Log, vec![name.into()]);
        cmd.timestamps = Some(vec![start_timestamp]);
        cmd
    }

    /// Stop logging
    pub fn unlog(name: impl Into<String>) -> Self {
        Self::bare(Cmd::Unlog, vec![name.into()])
    }

    /// Write a value
    pub fn set(name: impl Into<String>, value: f64) -> Self {
        let mut cmd = Self::bare(Cmd::Set, vec![name.into()]);
        cmd.values = Some(vec![value]);
        cmd
    }

    /// Write a value under a bitmask
    pub fn set_mask(name: impl Into<String>, value: f64, mask: u64) -> Self {
        let mut cmd = Self::bare(Cmd::SetMask, vec![name.into()]);
        cmd.values = Some(vec![value]);
        cmd.masks = Some(vec![mask]);
        cmd
    }

    /// Set the monitoring period (0 disables)
    pub fn monitor(name: impl Into<String>, period: u32) -> Self {
        let mut cmd = Self::bare(Cmd::Monitor, vec![name.into()]);
        cmd.periods = Some(vec![period]);
        cmd
    }
}

/// Client activity, reported on window focus transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientActivity {
    /// Window foregrounded
    Active,
    /// Window backgrounded
    Inactive,
}

/// An outgoing control message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ClientMessage {
    /// A batch of watcher commands
    Commands {
        /// The command batch
        watcher: Vec<WatcherCommand>,
    },
    /// A client activity event
    Event {
        /// The activity transition
        event: ClientActivity,
    },
}

impl ClientMessage {
    /// Wrap a single command in a batch message
    pub fn command(cmd: WatcherCommand) -> Self {
        ClientMessage::Commands { watcher: vec![cmd] }
    }

    /// Build an activity event from a focused flag
    pub fn activity(active: bool) -> Self {
        ClientMessage::Event {
            event: if active {
                ClientActivity::Active
            } else {
                ClientActivity::Inactive
            },
        }
    }
}

/// The watcher payload of an incoming control message
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WatcherListPayload {
    /// Ordered watcher descriptors; order defines channel indices
    #[serde(default)]
    pub watchers: Vec<WatcherDescriptor>,
    /// Latest known remote sample timestamp
    #[serde(default)]
    pub timestamp: u64,
    /// Remote sampling rate in Hz, displayed verbatim
    #[serde(rename = "sampleRate", default)]
    pub sample_rate: u64,
}

/// An incoming control message from the host
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ControlEnvelope {
    /// Present when the message carries watcher state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watcher: Option<WatcherListPayload>,
}
