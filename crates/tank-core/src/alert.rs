//! Alert LEDs and buzzers for abnormal tank operation

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::config::{LIMIT_RATE_L_PER_S, STATE_ALERT_HOLD_S};
use crate::error::ActuatorError;
use crate::hardware::AlertOutputs;
use crate::tank::TankState;

/// Tank state buzzer level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAlert {
    Quiet,
    /// Empty or near empty, sounded straight away
    RunningDry,
    /// A critical state held for at least [`STATE_ALERT_HOLD_S`]
    Sustained,
}

impl StateAlert {
    pub fn evaluate(state: TankState, held_s: f32) -> StateAlert {
        if state.is_critical() && held_s >= STATE_ALERT_HOLD_S {
            StateAlert::Sustained
        } else if state.is_running_dry() {
            StateAlert::RunningDry
        } else {
            StateAlert::Quiet
        }
    }
}

/// Whether the rate of volume change exceeds the fault limit
pub fn rate_exceeds_limit(rate_l_per_s: f32) -> bool {
    libm::fabsf(rate_l_per_s) > LIMIT_RATE_L_PER_S
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSignal {
    TankState(StateAlert),
    RateOfChange { exceeded: bool },
}

/// The four alert outputs
pub struct AlertPanel<ROV, ST, HELD, EN> {
    rate_of_change: ROV,
    tank_state: ST,
    tank_state_held: HELD,
    enable: EN,
}

impl<ROV, ST, HELD, EN> AlertPanel<ROV, ST, HELD, EN>
where
    ROV: OutputPin,
    ST: OutputPin,
    HELD: OutputPin,
    EN: OutputPin,
{
    pub fn new(
        rate_of_change: ROV,
        tank_state: ST,
        tank_state_held: HELD,
        enable: EN,
    ) -> Result<Self, ActuatorError> {
        let mut panel = Self {
            rate_of_change,
            tank_state,
            tank_state_held,
            enable,
        };
        panel.silence()?;
        info!("ALERT SYSTEM setup complete.");
        Ok(panel)
    }

    fn set(pin: &mut impl OutputPin, on: bool) -> Result<(), ActuatorError> {
        if on {
            pin.set_high().map_err(|_| ActuatorError::Alert)
        } else {
            pin.set_low().map_err(|_| ActuatorError::Alert)
        }
    }

    fn tank_state_alert(&mut self, alert: StateAlert) -> Result<(), ActuatorError> {
        Self::set(&mut self.enable, true)?;
        match alert {
            StateAlert::Sustained => {
                Self::set(&mut self.tank_state, false)?;
                Self::set(&mut self.tank_state_held, true)
            }
            StateAlert::RunningDry => {
                Self::set(&mut self.tank_state_held, false)?;
                Self::set(&mut self.tank_state, true)
            }
            StateAlert::Quiet => {
                Self::set(&mut self.tank_state_held, false)?;
                Self::set(&mut self.tank_state, false)
            }
        }
    }
}

impl<ROV, ST, HELD, EN> AlertOutputs for AlertPanel<ROV, ST, HELD, EN>
where
    ROV: OutputPin,
    ST: OutputPin,
    HELD: OutputPin,
    EN: OutputPin,
{
    fn signal(&mut self, signal: AlertSignal) -> Result<(), ActuatorError> {
        match signal {
            AlertSignal::TankState(alert) => self.tank_state_alert(alert),
            AlertSignal::RateOfChange { exceeded } => {
                if exceeded {
                    warn!("Rate of volume change exceeds normal amount");
                }
                Self::set(&mut self.rate_of_change, exceeded)
            }
        }
    }

    fn silence(&mut self) -> Result<(), ActuatorError> {
        Self::set(&mut self.rate_of_change, false)?;
        Self::set(&mut self.enable, false)?;
        Self::set(&mut self.tank_state, false)?;
        Self::set(&mut self.tank_state_held, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakePin, PinLog};

    fn panel(log: &PinLog) -> AlertPanel<FakePin, FakePin, FakePin, FakePin> {
        AlertPanel::new(
            FakePin::new("rov", log),
            FakePin::new("state", log),
            FakePin::new("held", log),
            FakePin::new("enable", log),
        )
        .unwrap()
    }

    #[test]
    fn critical_states_escalate_after_hold_time() {
        assert_eq!(StateAlert::evaluate(TankState::NearFull, 4.9), StateAlert::Quiet);
        assert_eq!(StateAlert::evaluate(TankState::NearFull, 5.0), StateAlert::Sustained);
        assert_eq!(StateAlert::evaluate(TankState::Overfull, 12.0), StateAlert::Sustained);
        assert_eq!(StateAlert::evaluate(TankState::Empty, 0.0), StateAlert::RunningDry);
        assert_eq!(StateAlert::evaluate(TankState::NearEmpty, 5.0), StateAlert::Sustained);
        assert_eq!(StateAlert::evaluate(TankState::Low, 60.0), StateAlert::Quiet);
        assert_eq!(StateAlert::evaluate(TankState::High, 60.0), StateAlert::Quiet);
    }

    #[test]
    fn rate_limit_is_exclusive_and_symmetric() {
        assert!(!rate_exceeds_limit(1.0));
        assert!(!rate_exceeds_limit(-1.0));
        assert!(rate_exceeds_limit(1.01));
        assert!(rate_exceeds_limit(-1.5));
    }

    #[test]
    fn sustained_alert_swaps_buzzers() {
        let log = PinLog::default();
        let mut panel = panel(&log);
        log.clear();

        panel.signal(AlertSignal::TankState(StateAlert::RunningDry)).unwrap();
        assert_eq!(log.last_level("enable"), Some(true));
        assert_eq!(log.last_level("state"), Some(true));

        panel.signal(AlertSignal::TankState(StateAlert::Sustained)).unwrap();
        assert_eq!(log.last_level("state"), Some(false));
        assert_eq!(log.last_level("held"), Some(true));

        panel.signal(AlertSignal::TankState(StateAlert::Quiet)).unwrap();
        assert_eq!(log.last_level("state"), Some(false));
        assert_eq!(log.last_level("held"), Some(false));
    }

    #[test]
    fn rate_alert_follows_limit_and_silence_clears_everything() {
        let log = PinLog::default();
        let mut panel = panel(&log);

        panel.signal(AlertSignal::RateOfChange { exceeded: true }).unwrap();
        assert_eq!(log.last_level("rov"), Some(true));
        panel.signal(AlertSignal::TankState(StateAlert::Sustained)).unwrap();

        panel.silence().unwrap();
        for pin in ["rov", "enable", "state", "held"] {
            assert_eq!(log.last_level(pin), Some(false), "{pin} left on");
        }
    }
}
