//! Clone phase codes and the listener seam between the clone engine and the UI

use std::fmt;

/// One stage of the clone engine's work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Counting,
    Compressing,
    Writing,
    Receiving,
    Resolving,
    FindingSources,
    CheckingOut,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Counting,
        Operation::Compressing,
        Operation::Writing,
        Operation::Receiving,
        Operation::Resolving,
        Operation::FindingSources,
        Operation::CheckingOut,
    ];

    pub fn bits(self) -> u32 {
        match self {
            Operation::Counting => PhaseCode::COUNTING,
            Operation::Compressing => PhaseCode::COMPRESSING,
            Operation::Writing => PhaseCode::WRITING,
            Operation::Receiving => PhaseCode::RECEIVING,
            Operation::Resolving => PhaseCode::RESOLVING,
            Operation::FindingSources => PhaseCode::FINDING_SOURCES,
            Operation::CheckingOut => PhaseCode::CHECKING_OUT,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Operation::Counting => "Counting",
            Operation::Compressing => "Compressing",
            Operation::Writing => "Writing",
            Operation::Receiving => "Receiving",
            Operation::Resolving => "Resolving",
            Operation::FindingSources => "Finding Sources",
            Operation::CheckingOut => "Checking Out",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Begin/end flags combined with an operation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCode(pub u32);

impl PhaseCode {
    pub const BEGIN: u32 = 1;
    pub const END: u32 = 1 << 1;
    pub const COUNTING: u32 = 1 << 2;
    pub const COMPRESSING: u32 = 1 << 3;
    pub const WRITING: u32 = 1 << 4;
    pub const RECEIVING: u32 = 1 << 5;
    pub const RESOLVING: u32 = 1 << 6;
    pub const FINDING_SOURCES: u32 = 1 << 7;
    pub const CHECKING_OUT: u32 = 1 << 8;
    pub const OP_MASK: u32 = !(Self::BEGIN | Self::END);

    pub fn update(op: Operation) -> Self {
        Self(op.bits())
    }

    pub fn begin(op: Operation) -> Self {
        Self(Self::BEGIN | op.bits())
    }

    pub fn end(op: Operation) -> Self {
        Self(Self::END | op.bits())
    }

    pub fn with_begin(self) -> Self {
        Self(self.0 | Self::BEGIN)
    }

    pub fn with_end(self) -> Self {
        Self(self.0 | Self::END)
    }

    pub fn is_begin(self) -> bool {
        self.0 & Self::BEGIN != 0
    }

    pub fn is_end(self) -> bool {
        self.0 & Self::END != 0
    }

    /// Operation with the begin/end flags masked off, if it is a known one.
    pub fn operation(self) -> Option<Operation> {
        let masked = self.0 & Self::OP_MASK;
        Operation::ALL.into_iter().find(|op| op.bits() == masked)
    }
}

/// Receives phase events from the clone engine, synchronously on the
/// cloning thread.
pub trait ProgressListener {
    fn on_phase_event(&mut self, code: PhaseCode, current: u64, total: Option<u64>, message: &str);
}

/// Listener that drops every event, for quiet runs
pub struct NoopListener;

impl ProgressListener for NoopListener {
    fn on_phase_event(&mut self, _: PhaseCode, _: u64, _: Option<u64>, _: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_survives_flag_masking() {
        for op in Operation::ALL {
            let code = PhaseCode::begin(op).with_end();
            assert!(code.is_begin());
            assert!(code.is_end());
            assert_eq!(code.operation(), Some(op));
        }
    }

    #[test]
    fn plain_update_has_no_flags() {
        let code = PhaseCode::update(Operation::Receiving);
        assert!(!code.is_begin());
        assert!(!code.is_end());
    }

    #[test]
    fn unknown_operation_bits_yield_none() {
        assert_eq!(PhaseCode(PhaseCode::BEGIN).operation(), None);
        assert_eq!(PhaseCode(PhaseCode::COUNTING | PhaseCode::RECEIVING).operation(), None);
    }

    #[test]
    fn titles_are_human_readable() {
        assert_eq!(Operation::FindingSources.to_string(), "Finding Sources");
        assert_eq!(Operation::CheckingOut.title(), "Checking Out");
    }
}
