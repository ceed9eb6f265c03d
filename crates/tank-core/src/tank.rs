//! Tank geometry and volume state classification

use crate::config::{
    FULL_UP_TO_PCT, HIGH_UP_TO_PCT, LOW_BELOW_PCT, NEAR_EMPTY_BELOW_PCT, NORMAL_UP_TO_PCT,
};
use crate::motor::{PumpCommand, Speed};
use crate::preferences::Preferences;
use crate::seven_segment::Indicator;

/// Volume state of the tank, from driest to wettest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankState {
    Empty,
    NearEmpty,
    Low,
    Normal,
    High,
    NearFull,
    Overfull,
}

impl TankState {
    /// Maps a volume percentage of the max. tank volume onto a state.
    /// The lower bound of Low and both bounds of Normal are inclusive.
    pub fn classify(percent: f32) -> TankState {
        if percent <= 0.0 {
            TankState::Empty
        } else if percent < NEAR_EMPTY_BELOW_PCT {
            TankState::NearEmpty
        } else if percent < LOW_BELOW_PCT {
            TankState::Low
        } else if percent <= NORMAL_UP_TO_PCT {
            TankState::Normal
        } else if percent <= HIGH_UP_TO_PCT {
            TankState::High
        } else if percent <= FULL_UP_TO_PCT {
            TankState::NearFull
        } else {
            TankState::Overfull
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TankState::Empty => "Empty",
            TankState::NearEmpty => "Near empty",
            TankState::Low => "Low",
            TankState::Normal => "Within normal range",
            TankState::High => "High",
            TankState::NearFull => "Near full",
            TankState::Overfull => "Overfull",
        }
    }

    /// Pump response that brings the tank back towards the normal range
    pub fn pump_command(self) -> PumpCommand {
        match self {
            TankState::Empty | TankState::NearEmpty => PumpCommand::Fill(Speed::High),
            TankState::Low => PumpCommand::Fill(Speed::Low),
            TankState::Normal => PumpCommand::Stop,
            TankState::High => PumpCommand::Drain(Speed::Low),
            TankState::NearFull | TankState::Overfull => PumpCommand::Drain(Speed::High),
        }
    }

    /// Status LED shown next to the seven segment digits
    pub fn indicator(self) -> Indicator {
        match self {
            TankState::Low | TankState::High => Indicator::Yellow,
            TankState::NearEmpty | TankState::NearFull => Indicator::Red,
            TankState::Empty | TankState::Overfull => Indicator::Blue,
            TankState::Normal => Indicator::Off,
        }
    }

    /// States that trip the sustained alert when held too long
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            TankState::Empty | TankState::NearEmpty | TankState::NearFull | TankState::Overfull
        )
    }

    /// States that sound the tank state buzzer straight away
    pub fn is_running_dry(self) -> bool {
        matches!(self, TankState::Empty | TankState::NearEmpty)
    }
}

/// One classified water level measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Height of the water column (cm), never negative
    pub level_cm: f32,
    /// Water volume (L), clamped to 0 when empty and to the max. volume when overfull
    pub volume_l: f32,
    /// Unclamped volume as a percentage of the max. volume
    pub percent: f32,
    pub state: TankState,
}

impl Reading {
    /// Converts the gap between the ultrasonic sensor and the water surface
    /// into a level, a volume and a state
    pub fn from_gap(gap_cm: f32, preferences: &Preferences) -> Reading {
        let level_cm = preferences.tank_height_cm - gap_cm;
        let mut volume_l = level_cm * preferences.tank_base_area_cm2 / 1000.0;
        let percent = volume_l / preferences.max_tank_volume_l * 100.0;
        let state = TankState::classify(percent);

        match state {
            TankState::Empty => volume_l = 0.0,
            TankState::Overfull => volume_l = preferences.max_tank_volume_l,
            _ => {}
        }

        Reading {
            level_cm: libm::fmaxf(level_cm, 0.0),
            volume_l,
            percent,
            state,
        }
    }
}
