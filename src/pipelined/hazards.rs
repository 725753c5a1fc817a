//! Hazard detection unit
//!
//! The pipeline has no forwarding, so every hazard is resolved by stalling.
//! Each hazard source owns a flag plus a short propagation chain that
//! follows the bubble it inserted down the pipe, so the bubble clears
//! exactly the state it was inserted for.

/// RAW hazard bookkeeping
/// `raised` holds the consumer in IF/ID. `in_ex` and `in_mem` follow the
/// bubble sent to EX through the next two stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawHazard {
    pub raised: bool,
    pub in_ex: bool,
    pub in_mem: bool,
}

/// Control hazard bookkeeping
/// `raised` is set by a branch in ID and suppresses fetch. The fetch bubble
/// is then tracked through ID, EX and MEM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlHazard {
    pub raised: bool,
    pub in_id: bool,
    pub in_ex: bool,
    pub in_mem: bool,
}

/// Structural hazard on the single data memory port
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StructuralHazard {
    /// A memory instruction with latency is heading to MEM
    pub raised: bool,
    /// IF, ID and EX hold their latches
    pub frozen: bool,
    /// Cycles the pending access has spent in MEM
    pub latency_tracker: u32,
    /// PC shown at IF while the freeze lasts
    pub pc_temp: Option<u32>,
}

/// Hazard detection unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HazardUnit {
    pub raw: RawHazard,
    pub control: ControlHazard,
    pub structural: StructuralHazard,
}

impl HazardUnit {
    /// The front end does not move this cycle
    pub fn pipe_frozen(&self) -> bool {
        self.structural.frozen
    }

    /// The freeze lifts once the access has waited `latency` extra cycles
    pub fn access_complete(&self, latency: u32) -> bool {
        self.structural.latency_tracker > latency
    }

    /// Releases the memory port
    pub fn release_memory(&mut self) {
        self.structural.frozen = false;
        self.structural.latency_tracker = 0;
        self.structural.raised = false;
    }
}
