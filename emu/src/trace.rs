use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::alu::AluResult;
use crate::decode::control::ControlWord;
use crate::instruction::Instruction;

/// One executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Tick on which the ALU accepted the instruction.
    pub tick: u64,
    pub instruction: Instruction,
    pub control: ControlWord,
    pub result: AluResult,
}

/// The most recent executed instructions, oldest first.
///
/// Once full, every push evicts the oldest entry. A capacity of zero keeps
/// nothing.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTrace {
    capacity: usize,
    entries: VecDeque<TraceEntry>,
}

impl TransactionTrace {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, entry: TraceEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TraceEntry> {
        self.entries.back()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks the invariants a restored trace must hold.
    pub fn validate(&self) -> Result<(), String> {
        if self.entries.len() > self.capacity {
            return Err(format!(
                "trace holds {} entries over a capacity of {}",
                self.entries.len(),
                self.capacity
            ));
        }
        Ok(())
    }
}
