//! The one-call entry point: build the input file, run the solver, read the results.

use crate::bridge::solver::Solver;
use crate::error::KwaveError;
use crate::records::{
    Grid, KSpaceAndShiftVariables, Medium, Pml, Sensor, SimulationFlags, SimulationInput,
    SimulationOutput, Source,
};

/// Optional parts of a `kspace_first_order` run. Unset parts take their defaults.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Defaults to `SimulationFlags::default()`, an absorbing initial-value problem.
    pub simulation_flags: Option<SimulationFlags>,
    /// Defaults to `Pml::auto` for the grid's dimensionality.
    pub pml: Option<Pml>,
    pub kspace: Option<KSpaceAndShiftVariables>,
    /// Overrides the configured stem of the staged file names.
    pub data_name: Option<String>,
}

/// Runs one simulation and returns the input that was sent along with the decoded output.
pub fn kspace_first_order(
    solver: &Solver,
    grid: Grid,
    medium: Medium,
    sensor: Sensor,
    source: Source,
    options: RunOptions,
) -> Result<(SimulationInput, SimulationOutput), KwaveError> {
    let ndims = grid.shape().len();
    let input = SimulationInput {
        simulation_flags: options.simulation_flags.unwrap_or_default(),
        pml: options.pml.unwrap_or_else(|| Pml::auto(ndims)),
        kspace: options.kspace.unwrap_or_default(),
        grid,
        medium,
        sensor,
        source,
    };

    let data_name = options
        .data_name
        .unwrap_or_else(|| solver.config().data_name.clone());
    let output = solver.run_as(&input, &data_name)?;
    Ok((input, output))
}
