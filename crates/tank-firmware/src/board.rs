//! Adapters from the RP2040 HAL to the rig's device traits

use embedded_hal_0_2::adc::{Channel, OneShot};
use rp_pico::hal::adc::{Adc, AdcPin};
use rp_pico::hal::uart::{Enabled, UartDevice, UartPeripheral, ValidUartPinout};
use rp_pico::hal::Timer;
use tank_core::error::SensorError;
use tank_core::sensors::AnalogInput;
use tank_core::timer::Clock;

/// The 1 MHz system timer as the rig's clock
#[derive(Clone, Copy)]
pub struct TimerClock(pub Timer);

impl Clock for TimerClock {
    fn now_us(&self) -> u64 {
        self.0.get_counter().ticks()
    }
}

/// One ADC input pin read by single conversions
pub struct AdcChannel<P> {
    adc: Adc,
    pin: P,
}

impl<P> AdcChannel<P> {
    pub fn new(adc: Adc, pin: P) -> Self {
        Self { adc, pin }
    }
}

impl<PIN> AnalogInput for AdcChannel<AdcPin<PIN>>
where
    AdcPin<PIN>: Channel<Adc, ID = u8>,
{
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        nb::block!(self.adc.read(&mut self.pin)).map_err(|_| SensorError::Adc)
    }
}

/// Blocking `embedded-io` view of an enabled UART
pub struct SerialPort<D: UartDevice, P: ValidUartPinout<D>> {
    uart: UartPeripheral<Enabled, D, P>,
}

impl<D: UartDevice, P: ValidUartPinout<D>> SerialPort<D, P> {
    pub fn new(uart: UartPeripheral<Enabled, D, P>) -> Self {
        Self { uart }
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::ErrorType for SerialPort<D, P> {
    type Error = embedded_io::ErrorKind;
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::Read for SerialPort<D, P> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.uart.read_raw(buf) {
                Ok(count) => return Ok(count),
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(_)) => return Err(embedded_io::ErrorKind::Other),
            }
        }
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::ReadReady for SerialPort<D, P> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.uart.uart_is_readable())
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> embedded_io::Write for SerialPort<D, P> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.uart.write_full_blocking(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        while self.uart.uart_is_busy() {}
        Ok(())
    }
}
