//! Events that trigger status transitions

/// Events that can change the system status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A `MOVE_TO` started driving the actuators
    MoveStarted,
    /// Move finished all requested steps
    MoveCompleted,
    /// Move stopped early by an emergency stop
    MoveAborted,
    /// Homing started
    HomingStarted,
    /// Homing finished at the zero position
    HomingCompleted,
    /// Homing interrupted or timed out
    HomingFailed,
    /// `STOP` received
    Stop,
    /// Emergency stop latched
    EmergencyStop,
    /// Emergency stop cleared by `RESET`
    Reset,
}
