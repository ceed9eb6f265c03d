#![cfg_attr(not(test), no_std)]

//! # tank-core
//! ## Water tank monitoring and control, without the board
//!
//! Features:
//! - Ultrasonic water level and thermistor temperature sensing
//! - Seven state volume classification with pump control
//! - Rate of volume change fault detection
//! - Seven segment volume display with state indicator LEDs
//! - Alert LEDs and buzzers for sustained abnormal states
//! - Serial console menu with password lockout and admin access
//! - Bounded sample history for data observation
//!
//! Everything in here is written against `embedded-hal` and `embedded-io`
//! traits so it runs on the Pico and in host unit tests alike.

pub mod access;
pub mod alert;
pub mod config;
pub mod console;
pub mod error;
pub mod hardware;
pub mod history;
pub mod menu;
pub mod motor;
pub mod operations;
pub mod preferences;
pub mod rendering;
pub mod sensors;
pub mod seven_segment;
pub mod tank;
pub mod timer;

#[cfg(test)]
pub(crate) mod mock;
