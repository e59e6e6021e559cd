//! Watcher list synchronization
//!
//! [`WatcherSync`] keeps a local mirror of the board's watcher set: one
//! [`ControlGroup`] per remote variable, reconciled against each
//! periodic `list` response by a full outer join keyed on name. Local
//! edits are turned into outgoing [`WatcherCommand`]s; remote-driven
//! updates run under an echo-suppression flag so they never bounce back
//! to the board as commands.
//!
//! This module holds no egui state. The frontend binds widgets to the
//! fields of each group and reports edits through [`WatcherSync::on_user_edit`].

pub mod numeric;

use crate::protocol::{WatcherCommand, WatcherListPayload};
use crate::types::{code_has_mask, WatcherDescriptor};
use numeric::{format_value, parse_value};

/// A user edit to one control of a group
#[derive(Debug, Clone, PartialEq)]
pub enum GroupEdit {
    /// Watched toggle changed
    Watched(bool),
    /// Controlled toggle changed
    Controlled(bool),
    /// Logged toggle changed
    Logged(bool),
    /// Value input changed (raw text)
    Value(String),
    /// Mask input changed (raw text); staged locally, nothing is sent
    Mask(String),
    /// Monitor-period input changed (raw text)
    MonitorPeriod(String),
}

/// Local UI state for one remote variable.
///
/// Exactly one group exists per currently-known remote name: created on
/// first appearance in a list response, destroyed when the name
/// disappears. Input fields belong to the user and are never
/// overwritten by remote updates.
#[derive(Debug, Clone)]
pub struct ControlGroup {
    /// Remote variable name (unique key)
    pub name: String,
    /// One-character element type code from the last list response
    pub type_code: String,
    /// Watched toggle state
    pub watched: bool,
    /// Controlled toggle state
    pub controlled: bool,
    /// Logged toggle state
    pub logged: bool,
    /// Value input field (user-owned)
    pub value_input: String,
    /// Mask input field (user-owned; integer kinds only)
    pub mask_input: String,
    /// Monitor-period input field (user-owned, seeded at creation)
    pub monitor_input: String,
    /// Formatted current value from the board
    pub value_display: String,
    /// Advisory log file name, shown as a tooltip on the logged toggle
    pub log_file_name: String,
    /// Hex display latch, set by the last hex-formatted input
    pub hex: bool,
    /// Staged bitmask for the next value write (None = plain `set`)
    pub staged_mask: Option<u64>,
    /// Local clock mark of the last watch enable; buffers older than
    /// this are not drawn
    pub last_started_watching_ms: Option<f64>,
    /// Monitor readout: last decoded timestamp
    pub monitor_timestamp: String,
    /// Monitor readout: last formatted value
    pub monitor_value: String,
}

impl ControlGroup {
    fn new(desc: &WatcherDescriptor) -> Self {
        Self {
            name: desc.name.clone(),
            type_code: desc.type_code.clone(),
            watched: desc.watched,
            controlled: desc.controlled,
            logged: desc.logged,
            value_input: String::new(),
            mask_input: String::new(),
            monitor_input: desc.monitor.to_string(),
            value_display: String::new(),
            log_file_name: desc.log_file_name.clone(),
            hex: false,
            staged_mask: None,
            last_started_watching_ms: None,
            monitor_timestamp: "_".to_string(),
            monitor_value: "_".to_string(),
        }
    }

    /// Whether this group shows a mask input (integer kinds only)
    pub fn has_mask(&self) -> bool {
        code_has_mask(&self.type_code)
    }
}

/// Reconciles local control groups against remote list snapshots and
/// maps user edits to outgoing commands.
#[derive(Debug, Default)]
pub struct WatcherSync {
    /// Groups in creation order; index doubles as the channel index for
    /// the buffer store
    groups: Vec<ControlGroup>,
    /// Set while remote-driven values are written into the groups, so
    /// edit handlers do not echo them back to the board
    suppress_echo: bool,
    latest_timestamp: u64,
    sample_rate: u64,
}

impl WatcherSync {
    /// Create an empty synchronizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest known remote sample timestamp
    pub fn latest_timestamp(&self) -> u64 {
        self.latest_timestamp
    }

    /// Remote sampling rate in Hz
    pub fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    /// All groups in creation order (channel index order)
    pub fn groups(&self) -> &[ControlGroup] {
        &self.groups
    }

    /// Mutable access for widget binding
    pub fn groups_mut(&mut self) -> &mut [ControlGroup] {
        &mut self.groups
    }

    /// Look up a group by name
    pub fn group(&self, name: &str) -> Option<&ControlGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    fn group_mut(&mut self, name: &str) -> Option<&mut ControlGroup> {
        self.groups.iter_mut().find(|g| g.name == name)
    }

    /// Look up a group by channel index
    pub fn group_at(&self, index: usize) -> Option<&ControlGroup> {
        self.groups.get(index)
    }

    /// Reconcile local groups against an authoritative list snapshot.
    ///
    /// Full outer join keyed by name: unknown names create groups,
    /// known names are updated in place (identity retained), local
    /// names missing from the snapshot are destroyed.
    ///
    /// The protocol carries no request token, so a snapshot whose board
    /// timestamp regresses is taken as delivered out of order and
    /// discarded; the next periodic snapshot supersedes it anyway.
    pub fn on_list_received(&mut self, payload: &WatcherListPayload) {
        if payload.timestamp < self.latest_timestamp {
            tracing::warn!(
                "Discarding out-of-order list snapshot ({} < {})",
                payload.timestamp,
                self.latest_timestamp
            );
            return;
        }
        self.latest_timestamp = payload.timestamp;
        self.sample_rate = payload.sample_rate;

        for desc in &payload.watchers {
            if self.group(&desc.name).is_none() {
                tracing::debug!("Adding watcher {:?}", desc.name);
                self.groups.push(ControlGroup::new(desc));
            }
            self.begin_remote_update();
            self.apply_descriptor(desc);
            self.end_remote_update();
        }

        self.groups.retain(|g| {
            let keep = payload.watchers.iter().any(|d| d.name == g.name);
            if !keep {
                tracing::debug!("Removing watcher {:?}", g.name);
            }
            keep
        });
    }

    /// Write remote-driven state into a group's display widgets.
    /// Must only run between [`Self::begin_remote_update`] and
    /// [`Self::end_remote_update`].
    fn apply_descriptor(&mut self, desc: &WatcherDescriptor) {
        let Some(group) = self.group_mut(&desc.name) else {
            return;
        };
        group.watched = desc.watched;
        group.controlled = desc.controlled;
        group.logged = desc.logged;
        group.type_code = desc.type_code.clone();
        group.log_file_name = desc.log_file_name.clone();
        group.value_display = format_value(desc.value, group.hex);
    }

    fn begin_remote_update(&mut self) {
        self.suppress_echo = true;
    }

    fn end_remote_update(&mut self) {
        self.suppress_echo = false;
    }

    /// Map a user edit to at most one outgoing command.
    ///
    /// No-ops entirely while a remote update is being applied. Mask
    /// edits stage locally and emit nothing; every other edit emits
    /// exactly one command.
    pub fn on_user_edit(
        &mut self,
        name: &str,
        edit: GroupEdit,
        now_ms: f64,
    ) -> Option<WatcherCommand> {
        if self.suppress_echo {
            return None;
        }
        let latest_timestamp = self.latest_timestamp;
        let sample_rate = self.sample_rate;
        let group = self.group_mut(name)?;

        match edit {
            GroupEdit::Watched(enable) => {
                group.watched = enable;
                if enable {
                    group.last_started_watching_ms = Some(now_ms);
                }
                Some(WatcherCommand::watch(name, enable))
            }
            GroupEdit::Controlled(enable) => {
                group.controlled = enable;
                Some(WatcherCommand::control(name, enable))
            }
            GroupEdit::Logged(enable) => {
                group.logged = enable;
                if enable {
                    // schedule the log start a couple of seconds ahead of
                    // the board's current position
                    let start = latest_timestamp + 2 * sample_rate;
                    Some(WatcherCommand::log(name, start))
                } else {
                    Some(WatcherCommand::unlog(name))
                }
            }
            GroupEdit::Value(raw) => {
                group.value_input = raw.clone();
                let parsed = parse_value(&raw);
                group.hex = parsed.hex;
                match group.staged_mask {
                    Some(mask) => Some(WatcherCommand::set_mask(name, parsed.value, mask)),
                    None => Some(WatcherCommand::set(name, parsed.value)),
                }
            }
            GroupEdit::Mask(raw) => {
                group.mask_input = raw.clone();
                let parsed = parse_value(&raw);
                group.hex = parsed.hex;
                let mask = parsed.value as u64;
                // a zero mask reverts to plain `set`
                group.staged_mask = (mask != 0).then_some(mask);
                None
            }
            GroupEdit::MonitorPeriod(raw) => {
                group.monitor_input = raw.clone();
                let parsed = parse_value(&raw);
                group.hex = parsed.hex;
                let period = if parsed.value > 0.0 { parsed.value as u32 } else { 0 };
                Some(WatcherCommand::monitor(name, period))
            }
        }
    }

    /// Record a decoded monitor event into the readout labels of the
    /// group at `channel`
    pub fn record_monitor(&mut self, channel: usize, timestamp: u64, value: f64) {
        if let Some(group) = self.groups.get_mut(channel) {
            group.monitor_timestamp = timestamp.to_string();
            group.monitor_value = format_value(value, group.hex);
        }
    }
}
