use serde::Serialize;
use std::convert::TryFrom;
use std::fmt;
use thiserror::Error;

/// Lifecycle of one page's synchronized views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncPhase {
    /// Hydrated, nothing requested yet.
    Idle,
    /// A batch for the current snapshot is outstanding.
    Fetching,
    Rendered,
    /// The last batch failed; views show "no data found".
    Error,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Fetching => write!(f, "Fetching"),
            Self::Rendered => write!(f, "Rendered"),
            Self::Error => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A batch was issued for a new snapshot.
    Dispatched { generation: u64 },
    /// The latest batch settled successfully.
    Settled { generation: u64 },
    /// The latest batch failed.
    Failed { generation: u64 },
}

impl fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatched { generation } => write!(f, "Dispatched({generation})"),
            Self::Settled { generation } => write!(f, "Settled({generation})"),
            Self::Failed { generation } => write!(f, "Failed({generation})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition from {from} with event {event}")]
pub struct PhaseTransitionError {
    pub from: SyncPhase,
    pub event: PhaseEvent,
}

#[derive(Debug)]
pub struct PhaseMachine {
    phase: SyncPhase,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new(SyncPhase::Idle)
    }
}

impl PhaseMachine {
    pub const fn new(initial: SyncPhase) -> Self {
        Self { phase: initial }
    }

    pub const fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Applies `event`; on error the phase is left unchanged.
    pub fn process_event(&mut self, event: PhaseEvent) -> Result<SyncPhase, PhaseTransitionError> {
        let NextPhase(next) = NextPhase::try_from((self.phase, event))?;
        self.phase = next;
        Ok(next)
    }
}

struct NextPhase(SyncPhase);

impl SyncPhase {
    const fn next_phase(self) -> NextPhase {
        NextPhase(self)
    }
}

impl TryFrom<(SyncPhase, PhaseEvent)> for NextPhase {
    type Error = PhaseTransitionError;

    fn try_from(value: (SyncPhase, PhaseEvent)) -> Result<Self, Self::Error> {
        let (current, event) = value;

        match (current, event) {
            // A new batch abandons whatever was outstanding.
            (_, PhaseEvent::Dispatched { .. }) => Ok(SyncPhase::Fetching.next_phase()),
            (SyncPhase::Fetching, PhaseEvent::Settled { .. }) => {
                Ok(SyncPhase::Rendered.next_phase())
            }
            (SyncPhase::Fetching, PhaseEvent::Failed { .. }) => Ok(SyncPhase::Error.next_phase()),
            _ => Err(PhaseTransitionError {
                from: current,
                event,
            }),
        }
    }
}
