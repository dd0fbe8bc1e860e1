//! System status transitions

use cdc_protocol::ReportedState;

use super::events::Event;

/// Supervisory status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemStatus {
    /// Idle and accepting motion commands
    #[default]
    Ready,
    /// Executing a `MOVE_TO`
    Moving,
    /// Running a homing sequence
    Homing,
    /// Last operation aborted or failed
    Error,
}

impl SystemStatus {
    /// Check if this is the error status
    pub fn is_error(&self) -> bool {
        matches!(self, SystemStatus::Error)
    }

    /// State reported on the console
    ///
    /// A latched emergency stop overrides the status.
    pub fn reported(self, emergency_stop: bool) -> ReportedState {
        if emergency_stop {
            return ReportedState::EmergencyStop;
        }
        match self {
            SystemStatus::Ready => ReportedState::Ready,
            SystemStatus::Moving => ReportedState::Moving,
            SystemStatus::Homing => ReportedState::Homing,
            SystemStatus::Error => ReportedState::Error,
        }
    }

    /// Process an event and return the next status
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use SystemStatus::*;

        match (self, event) {
            // Operator commands apply from any status
            (_, Stop) => Ready,
            (_, Reset) => Ready,
            (_, EmergencyStop) => Error,

            (_, MoveStarted) => Moving,
            (Moving, MoveCompleted) => Ready,
            (_, MoveAborted) => Error,

            (_, HomingStarted) => Homing,
            (Homing, HomingCompleted) => Ready,
            (Homing, HomingFailed) => Error,

            // Default: stay in current status
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_cycle() {
        let status = SystemStatus::Ready.transition(Event::MoveStarted);
        assert_eq!(status, SystemStatus::Moving);
        assert_eq!(status.transition(Event::MoveCompleted), SystemStatus::Ready);
    }

    #[test]
    fn test_abort_enters_error() {
        let status = SystemStatus::Moving.transition(Event::MoveAborted);
        assert!(status.is_error());
        assert_eq!(status.transition(Event::Reset), SystemStatus::Ready);
    }

    #[test]
    fn test_homing_outcomes() {
        let homing = SystemStatus::Error.transition(Event::HomingStarted);
        assert_eq!(homing, SystemStatus::Homing);
        assert_eq!(homing.transition(Event::HomingCompleted), SystemStatus::Ready);
        assert_eq!(homing.transition(Event::HomingFailed), SystemStatus::Error);
    }

    #[test]
    fn test_stray_completion_ignored() {
        assert_eq!(
            SystemStatus::Error.transition(Event::MoveCompleted),
            SystemStatus::Error
        );
        assert_eq!(
            SystemStatus::Ready.transition(Event::HomingCompleted),
            SystemStatus::Ready
        );
    }

    #[test]
    fn test_emergency_stop_from_any_status() {
        let statuses = [
            SystemStatus::Ready,
            SystemStatus::Moving,
            SystemStatus::Homing,
            SystemStatus::Error,
        ];
        for status in statuses {
            assert_eq!(status.transition(Event::EmergencyStop), SystemStatus::Error);
        }
    }

    #[test]
    fn test_reported_state() {
        assert_eq!(SystemStatus::Ready.reported(false), ReportedState::Ready);
        assert_eq!(SystemStatus::Homing.reported(false), ReportedState::Homing);
        assert_eq!(
            SystemStatus::Ready.reported(true),
            ReportedState::EmergencyStop
        );
    }
}
