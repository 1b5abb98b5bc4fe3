//! # Top level
//!
//! [`Mau`] wires the four blocks together and is clocked one host transport
//! edge at a time through [`Mau::tick`].
//!
//! ```text
//!         ┌──────┐ valid  ┌────────┐ command ┌─────┐ result ┌──────┐
//! mosi ──►│  RX  ├───────►│ decode ├────────►│ ALU ├───────►│  TX  ├──► miso
//! write ─►│      │◄───────┤        │◄────────┤     │◄───────┤      │◄── read
//!         └──────┘ accept └────────┘  ready  └─────┘ drain  └──────┘
//! ```
//!
//! Every block reacts to the registered state of the previous tick and
//! updates its own registers at the end of the tick. In practice this means
//! a framed instruction executes on the tick after its fifth nibble and
//! its result can be read from the tick after that.

use std::error::Error;

use serde::{Deserialize, Serialize};

use crate::alu::{Alu, AluResult};
use crate::decode::DecodeStage;
use crate::instruction::Instruction;
use crate::nibble::Nibble;
use crate::rx::InstructionFramer;
use crate::trace::{TraceEntry, TransactionTrace};
use crate::tx::ResultFramer;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MauConfig {
    /// Number of executed instructions kept in [`Mau::trace`].
    pub trace_capacity: usize,
}

impl Default for MauConfig {
    fn default() -> Self {
        Self { trace_capacity: 32 }
    }
}

/// Input pins sampled on a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PinsIn {
    pub mosi: Nibble,
    pub write: bool,
    pub read: bool,
    /// Synchronous reset, wins over everything else.
    pub reset: bool,
}

impl PinsIn {
    pub const IDLE: Self = Self {
        mosi: Nibble::ZERO,
        write: false,
        read: false,
        reset: false,
    };

    #[must_use]
    pub const fn write(mosi: Nibble) -> Self {
        Self {
            mosi,
            write: true,
            ..Self::IDLE
        }
    }

    #[must_use]
    pub const fn read() -> Self {
        Self {
            read: true,
            ..Self::IDLE
        }
    }

    #[must_use]
    pub const fn reset() -> Self {
        Self {
            reset: true,
            ..Self::IDLE
        }
    }
}

/// Output pins driven on a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PinsOut {
    pub miso: Nibble,
    pub carry: bool,
}

/// Handshake probes, as seen after the last tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MauStatus {
    /// RX holds a complete instruction not yet accepted.
    pub instruction_ready: bool,
    /// The ALU result slot is empty.
    pub alu_ready: bool,
    /// A result is buffered and can be read.
    pub result_valid: bool,
    /// TX is in the middle of a frame.
    pub tx_active: bool,
    pub rx_position: usize,
    pub tx_position: usize,
    pub tick: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mau {
    rx: InstructionFramer,
    alu: Alu,
    tx: ResultFramer,
    trace: TransactionTrace,
    tick: u64,
}

impl Default for Mau {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    mau: Mau,
}

impl Mau {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MauConfig::default())
    }

    #[must_use]
    pub fn with_config(config: MauConfig) -> Self {
        Self {
            rx: InstructionFramer::default(),
            alu: Alu::default(),
            tx: ResultFramer::default(),
            trace: TransactionTrace::new(config.trace_capacity),
            tick: 0,
        }
    }

    /// Clocks the device once.
    pub fn tick(&mut self, pins: PinsIn) -> PinsOut {
        let tick = self.tick;
        self.tick += 1;

        if pins.reset {
            tracing::debug!("reset at tick {tick}");
            self.reset();
            return PinsOut::default();
        }

        let tx = self.tx.step(pins.read, self.alu.result());

        let alu_ready = self.alu.is_ready(tx.consumed);
        let decoded = DecodeStage.step(self.rx.instruction(), alu_ready);

        let alu = self.alu.step(decoded.command, tx.consumed);
        if let (Some(command), Some(result)) = (decoded.command, alu.executed) {
            self.trace.record(TraceEntry {
                tick,
                instruction: command.instruction,
                control: command.control,
                result,
            });
        }

        let accepted = self.rx.is_ready() && decoded.upstream_ready;
        self.rx.step(pins.write, pins.mosi, accepted);

        PinsOut {
            miso: tx.miso,
            carry: tx.carry,
        }
    }

    /// Returns the device to idle: no partial or pending instruction, no
    /// buffered result, no frame in flight. The tick counter and the trace
    /// are kept.
    pub fn reset(&mut self) {
        self.rx.reset();
        self.alu.reset();
        self.tx.reset();
    }

    #[must_use]
    pub const fn status(&self) -> MauStatus {
        MauStatus {
            instruction_ready: self.rx.is_ready(),
            alu_ready: self.alu.is_ready(false),
            result_valid: self.alu.result().is_some(),
            tx_active: self.tx.is_active(),
            rx_position: self.rx.position(),
            tx_position: self.tx.position(),
            tick: self.tick,
        }
    }

    /// Instruction waiting in RX for the ALU.
    #[must_use]
    pub fn pending_instruction(&self) -> Option<Instruction> {
        self.rx.instruction()
    }

    /// Result waiting in the ALU slot for TX.
    #[must_use]
    pub const fn buffered_result(&self) -> Option<AluResult> {
        self.alu.result()
    }

    #[must_use]
    pub const fn trace(&self) -> &TransactionTrace {
        &self.trace
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.tick
    }

    /// Serializes the whole device, trace included.
    pub fn save_state(&self) -> Result<Vec<u8>, Box<dyn Error>> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            mau: self.clone(),
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }

    pub fn load_state(bytes: &[u8]) -> Result<Self, Box<dyn Error>> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(format!(
                "snapshot version {} is not supported (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )
            .into());
        }

        snapshot
            .mau
            .validate()
            .map_err(|reason| format!("corrupted snapshot: {reason}"))?;

        Ok(snapshot.mau)
    }

    /// Rejects states no sequence of ticks can reach.
    fn validate(&self) -> Result<(), String> {
        self.rx.validate()?;
        self.tx.validate()?;
        self.trace.validate()?;

        if self.tx.is_active() && self.alu.result().is_none() {
            return Err("tx is clocking out a frame but the alu slot is empty".to_owned());
        }
        Ok(())
    }
}
