use serde::{Deserialize, Serialize};

/// Where the monitor loop currently is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorPhase {
    Idle,
    Probing,
    Reporting,
    Sleeping,
    Stopped,
}

impl MonitorPhase {
    pub fn can_transition_to(self, target: MonitorPhase) -> bool {
        matches!(
            (self, target),
            (MonitorPhase::Idle, MonitorPhase::Probing)
                | (MonitorPhase::Probing, MonitorPhase::Reporting)
                | (MonitorPhase::Reporting, MonitorPhase::Sleeping)
                | (MonitorPhase::Reporting, MonitorPhase::Probing)
                | (MonitorPhase::Sleeping, MonitorPhase::Probing)
                | (MonitorPhase::Stopped, MonitorPhase::Probing)
                | (
                    MonitorPhase::Idle
                        | MonitorPhase::Probing
                        | MonitorPhase::Reporting
                        | MonitorPhase::Sleeping,
                    MonitorPhase::Stopped
                )
        )
    }
}

impl std::fmt::Display for MonitorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Probing => write!(f, "probing"),
            Self::Reporting => write!(f, "reporting"),
            Self::Sleeping => write!(f, "sleeping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// What a finished [`super::Monitor::run`] accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Cycles completed during this run, each with its report emitted.
    pub cycles: u64,
    /// True when the run ended because the cancellation token fired.
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_phase_transitions() {
        assert!(MonitorPhase::Idle.can_transition_to(MonitorPhase::Probing));
        assert!(MonitorPhase::Probing.can_transition_to(MonitorPhase::Reporting));
        assert!(MonitorPhase::Reporting.can_transition_to(MonitorPhase::Sleeping));
        assert!(MonitorPhase::Sleeping.can_transition_to(MonitorPhase::Probing));
        assert!(MonitorPhase::Reporting.can_transition_to(MonitorPhase::Probing));
        assert!(MonitorPhase::Probing.can_transition_to(MonitorPhase::Stopped));
        assert!(MonitorPhase::Sleeping.can_transition_to(MonitorPhase::Stopped));
        assert!(MonitorPhase::Stopped.can_transition_to(MonitorPhase::Probing));
    }

    #[test]
    fn invalid_phase_transitions() {
        assert!(!MonitorPhase::Idle.can_transition_to(MonitorPhase::Reporting));
        assert!(!MonitorPhase::Idle.can_transition_to(MonitorPhase::Sleeping));
        assert!(!MonitorPhase::Probing.can_transition_to(MonitorPhase::Sleeping));
        assert!(!MonitorPhase::Sleeping.can_transition_to(MonitorPhase::Reporting));
        assert!(!MonitorPhase::Probing.can_transition_to(MonitorPhase::Idle));
        assert!(!MonitorPhase::Stopped.can_transition_to(MonitorPhase::Stopped));
    }

    #[test]
    fn phase_display() {
        assert_eq!(MonitorPhase::Sleeping.to_string(), "sleeping");
        assert_eq!(MonitorPhase::Stopped.to_string(), "stopped");
    }
}
