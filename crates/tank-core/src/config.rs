//! Fixed configuration for the tank rig
//!
//! Pin assignments, thresholds and timing constants. The rig is a single
//! tank with a fixed wiring, so none of this is editable at runtime; the
//! operator-editable values live in [`crate::preferences::Preferences`].

// Pin Mapping (RP2040 GPIO)
//
// Console (UART0):
// - GPIO0: TX
// - GPIO1: RX
//
// Alert system:
// - GPIO2: tank state buzzer
// - GPIO3: sustained (5s) tank state buzzer
// - GPIO4: alert enable
// - GPIO11: rate of volume change LED/buzzer
//
// Seven segment display (2x 74HC595):
// - GPIO5: SER data input
// - GPIO6: RCLK latch
// - GPIO7: SRCLK shift clock
//
// Motor (L293D):
// - GPIO8: 2A input
// - GPIO9: 1A input
// - GPIO10: EN12 (PWM5 A)
//
// Sensors:
// - GPIO12: ultrasonic echo
// - GPIO13: ultrasonic trigger
// - GPIO26: thermistor divider (ADC0)

/// Console baud rate
pub const CONSOLE_BAUD: u32 = 115_200;

// Classification thresholds, percent of max. tank volume
pub const NEAR_EMPTY_BELOW_PCT: f32 = 30.0;
pub const LOW_BELOW_PCT: f32 = 40.0;
pub const NORMAL_UP_TO_PCT: f32 = 60.0;
pub const HIGH_UP_TO_PCT: f32 = 70.0;
pub const FULL_UP_TO_PCT: f32 = 100.0;

/// Rate of volume change above which a tank fault is assumed (L/s)
pub const LIMIT_RATE_L_PER_S: f32 = 1.0;

/// Seconds an abnormal state must persist before the sustained alert fires
pub const STATE_ALERT_HOLD_S: f32 = 5.0;

/// Temperature warning bounds in Celsius
pub const TEMPERATURE_LOW_C: f32 = 20.0;
pub const TEMPERATURE_HIGH_C: f32 = 30.0;

/// Motor PWM used to counter a fault
pub const MOTOR_FULL_SPEED: u8 = 250;
/// Valid PWM range for operator-set motor speeds
pub const MOTOR_SPEED_MIN: u8 = 30;
pub const MOTOR_SPEED_MAX: u8 = 255;
/// Settle time between setting direction and enabling the motor
pub const MOTOR_SETTLE_MS: u32 = 10;

// Ultrasonic sensing
pub const ULTRASONIC_WINDOW_MS: u64 = 1000;
pub const ULTRASONIC_SAMPLE_INTERVAL_MS: u32 = 300;
pub const ULTRASONIC_TRIGGER_US: u32 = 10;
pub const ULTRASONIC_ECHO_TIMEOUT_US: u64 = 30_000;
/// Microseconds of echo per centimetre of gap (round trip at 343 m/s)
pub const ULTRASONIC_US_PER_CM: f32 = 58.3;
/// Distance between the sensor's lowest point and its transducer face
pub const ULTRASONIC_OFFSET_CM: f32 = 1.0;

// Thermistor sensing
pub const THERMISTOR_WINDOW_MS: u64 = 500;
pub const THERMISTOR_SAMPLE_INTERVAL_MS: u32 = 200;
pub const THERMISTOR_FIXED_OHMS: f32 = 10_000.0;
/// RP2040 ADC is 12 bit
pub const ADC_FULL_SCALE: u16 = 4095;
pub const THERMISTOR_CALIBRATION_C: f32 = 2.0;

// Seven segment timing
pub const SEGMENT_SCROLL_FRAME_MS: u64 = 500;
pub const SEGMENT_STATIC_MS: u64 = 1000;
pub const SEGMENT_LATCH_HOLD_MS: u32 = 10;

/// Number of polling samples retained for data observation
pub const HISTORY_CAPACITY: usize = 256;

// Access control
pub const DEFAULT_PASSWORD: &str = "332450";
pub const ADMIN_MASTER_KEY: &str = "1111";
pub const PASSWORD_ATTEMPTS: u8 = 3;
pub const LOCKOUT_MS: u64 = 50_000;
pub const TEMP_ADMIN_MS: u64 = 30_000;
/// Lockout countdown is printed at this interval
pub const LOCKOUT_REPORT_MS: u64 = 5_000;

/// Console interrupt (Ctrl+C)
pub const INTERRUPT_BYTE: u8 = 0x03;
