//! # tank-firmware
//! Raspberry Pi Pico build of the water tank monitoring rig.
//!
//! Brings up the clocks and pins, assembles the rig from the tank-core
//! drivers and hands the UART0 console to the system menu. Pin assignments
//! are listed in `tank_core::config`.

#![no_std]
#![no_main]

mod board;
mod logger;

use bsp::entry;
use defmt::*;
use defmt_rtt as _;
use panic_probe as _;

// Provide an alias for our BSP so we can switch targets quickly.
use rp_pico as bsp;

use bsp::hal::{
    adc::AdcPin,
    clocks::{init_clocks_and_plls, Clock},
    fugit::RateExtU32,
    gpio::FunctionUart,
    pac,
    uart::{DataBits, StopBits, UartConfig, UartPeripheral},
    watchdog::Watchdog,
    Adc, Sio, Timer,
};
use tank_core::alert::AlertPanel;
use tank_core::config::CONSOLE_BAUD;
use tank_core::console::Console;
use tank_core::hardware::Rig;
use tank_core::menu::SystemMenu;
use tank_core::motor::Motor;
use tank_core::sensors::{Thermistor, Ultrasonic};
use tank_core::seven_segment::SevenSegment;

use board::{AdcChannel, SerialPort, TimerClock};

/// Board bring-up failures, reported over RTT before halting
#[derive(Format)]
enum StartupError {
    Peripherals,
    Clocks,
    Uart,
    AdcPin,
    Motor,
    Sensor,
    Actuator,
}

#[entry]
fn main() -> ! {
    logger::init();
    info!("Tank monitor starting");

    match run() {
        Ok(()) => info!("Program ended"),
        Err(e) => error!("Start up failed: {}", e),
    }

    loop {
        cortex_m::asm::wfi();
    }
}

fn run() -> Result<(), StartupError> {
    // Grab our singleton objects
    let mut pac = pac::Peripherals::take().ok_or(StartupError::Peripherals)?;

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    // Configure the clocks
    //
    // The default is to generate a 125 MHz system clock
    let clocks = init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .map_err(|_| StartupError::Clocks)?;

    // The single-cycle I/O block controls our GPIO pins
    let sio = Sio::new(pac.SIO);

    // Set the pins up according to their function on this particular board
    let pins = bsp::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
    let clock = TimerClock(timer);

    // Set up the console on UART0
    let uart_pins = (
        pins.gpio0.into_function::<FunctionUart>(),
        pins.gpio1.into_function::<FunctionUart>(),
    );
    let uart = UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS)
        .enable(
            UartConfig::new(CONSOLE_BAUD.Hz(), DataBits::Eight, None, StopBits::One),
            clocks.peripheral_clock.freq(),
        )
        .map_err(|_| StartupError::Uart)?;
    let mut console = Console::new(SerialPort::new(uart));

    // Set up the ultrasonic sensor
    let sonar = Ultrasonic::new(
        pins.gpio13.into_push_pull_output(),
        pins.gpio12.into_pull_down_input(),
        clock,
        timer,
    )
    .map_err(|_| StartupError::Sensor)?;

    // Set up the thermistor divider on ADC0
    let adc = Adc::new(pac.ADC, &mut pac.RESETS);
    let thermistor_pin =
        AdcPin::new(pins.gpio26.into_floating_input()).map_err(|_| StartupError::AdcPin)?;
    let thermometer = Thermistor::new(AdcChannel::new(adc, thermistor_pin), clock, timer);

    // Set up the motor, EN12 on PWM5 A
    let pwm_slices = bsp::hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let mut pwm = pwm_slices.pwm5;
    pwm.set_ph_correct();
    pwm.set_top(u16::from(u8::MAX));
    pwm.enable();
    let mut enable = pwm.channel_a;
    let _ = enable.output_to(pins.gpio10);
    let pump = Motor::new(
        enable,
        pins.gpio9.into_push_pull_output(),
        pins.gpio8.into_push_pull_output(),
        timer,
    )
    .map_err(|_| StartupError::Motor)?;

    // Set up the seven segment display shift registers
    let display = SevenSegment::new(
        pins.gpio5.into_push_pull_output(),
        pins.gpio6.into_push_pull_output(),
        pins.gpio7.into_push_pull_output(),
        clock,
        timer,
    )
    .map_err(|_| StartupError::Actuator)?;

    // Set up the alert LEDs and buzzers
    let alerts = AlertPanel::new(
        pins.gpio11.into_push_pull_output(),
        pins.gpio2.into_push_pull_output(),
        pins.gpio3.into_push_pull_output(),
        pins.gpio4.into_push_pull_output(),
    )
    .map_err(|_| StartupError::Actuator)?;

    let rig = Rig {
        sonar,
        thermometer,
        pump,
        display,
        alerts,
    };

    info!("Rig ready, handing over to the console");
    let mut menu = SystemMenu::new(rig, clock, timer);
    if let Err(e) = menu.run(&mut console) {
        error!("Console failed: {}", Debug2Format(&e));
    }
    Ok(())
}
