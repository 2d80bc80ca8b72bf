//! Core traits and types for cycle-stepped chip emulation.
//!
//! A CPU advances one bus cycle per tick. Everything it does to the outside
//! world goes through a [`Bus`]; everything it knows is visible through
//! [`Observable`].

mod bus;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
