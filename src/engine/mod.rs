//! Pure computation engine(s) for the DCA simulator.

pub mod axis;
pub mod simulation;

pub use axis::{axis_ticks, sample_ticks, AxisTicks};
pub use simulation::{
    simulate, SimulationError, SimulationInput, SimulationLedger, SimulationRecord,
};
