//! Diode-circuit reference system.
//!
//! A voltage source `Vs` drives two parallel diodes through a series
//! resistor `R`. The unknowns are the two diode currents and the shared
//! junction voltage; see [`DiodeCircuit`] for the equations.

mod diode;

pub use diode::{solve_diode_circuit, DiodeCircuit, DiodeCircuitParams, DiodeSolution};

/// Thermal voltage at room temperature (approximately 26mV)
pub const THERMAL_VOLTAGE: f64 = 0.02585;
