//! Records of the solver output file.

use std::sync::OnceLock;

use crate::error::KwaveError;
use crate::records::input::{Grid, Pml, Sensor, SimulationFlags};
use crate::schema::{Dim, FieldDescriptor, FieldValues, Record, RecordSchema, ShapePattern, Slot};
use crate::types::Value;

/// The output echoes the input flags and adds the source modes the run used.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationFlagsOutput {
    pub simulation_flags: SimulationFlags,
    pub u_source_mode: Option<Value>,
    pub u_source_many: Option<Value>,
    pub p_source_mode: Option<Value>,
    pub p_source_many: Option<Value>,
}

impl Default for SimulationFlagsOutput {
    fn default() -> Self {
        Self {
            simulation_flags: SimulationFlags::default(),
            u_source_mode: Some(Value::long(0)),
            u_source_many: Some(Value::long(0)),
            p_source_mode: Some(Value::long(0)),
            p_source_many: Some(Value::long(0)),
        }
    }
}

impl Record for SimulationFlagsOutput {
    fn schema() -> &'static RecordSchema {
        static SCHEMA: OnceLock<RecordSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            RecordSchema::new("SimulationFlagsOutput")
                .field(FieldDescriptor::record("simulation_flags", SimulationFlags::schema))
                .field(FieldDescriptor::long("u_source_mode").optional())
                .field(FieldDescriptor::long("u_source_many").optional())
                .field(FieldDescriptor::long("p_source_mode").optional())
                .field(FieldDescriptor::long("p_source_many").optional())
        })
    }

    fn to_fields(&self) -> FieldValues {
        FieldValues::new("SimulationFlagsOutput")
            .nested("simulation_flags", self.simulation_flags.to_fields())
            .leaf_opt("u_source_mode", self.u_source_mode.clone())
            .leaf_opt("u_source_many", self.u_source_many.clone())
            .leaf_opt("p_source_mode", self.p_source_mode.clone())
            .leaf_opt("p_source_many", self.p_source_many.clone())
    }

    fn from_fields(mut fields: FieldValues) -> Result<Self, KwaveError> {
        Ok(Self {
            simulation_flags: fields.take_record("simulation_flags")?,
            u_source_mode: fields.take_optional("u_source_mode"),
            u_source_many: fields.take_optional("u_source_many"),
            p_source_mode: fields.take_optional("p_source_mode"),
            p_source_many: fields.take_optional("p_source_many"),
        })
    }
}

/// A time series per sensor point: `(1, Nt - s + 1, Nsens)`, `s` being the first recorded step.
const TIME_SERIES: ShapePattern =
    ShapePattern([Dim::Fixed(1), Dim::Symbol("Nt-s+1"), Dim::Symbol("Nsens")]);
/// One aggregate per sensor point.
const PER_SENSOR: ShapePattern = ShapePattern([Dim::Fixed(1), Dim::Fixed(1), Dim::Symbol("Nsens")]);
/// One aggregate per grid voxel.
const WHOLE_GRID: ShapePattern =
    ShapePattern([Dim::Symbol("Nz"), Dim::Symbol("Ny"), Dim::Symbol("Nx")]);

leaf_record! {
    /// What the solver recorded. A field is only present when the matching
    /// output option was passed to the solver (`-p`, `--p_rms`, `--u_final`, ...).
    ///
    /// Only binary-mask sensors are covered; cuboid-corner sensors store grouped
    /// `p/1, p/2, ...` entries that none of these fields read.
    #[derive(Default)]
    pub struct SimulationResults as "SimulationResults" {
        opt p: "p" = float .shape(TIME_SERIES),
        opt p_rms: "p_rms" = float .shape(PER_SENSOR),
        opt p_max: "p_max" = float .shape(PER_SENSOR),
        opt p_min: "p_min" = float .shape(PER_SENSOR),
        opt p_max_all: "p_max_all" = float .shape(WHOLE_GRID),
        opt p_min_all: "p_min_all" = float .shape(WHOLE_GRID),
        opt p_final: "p_final" = float .shape(WHOLE_GRID),

        opt ux: "ux" = float .shape(TIME_SERIES),
        opt uy: "uy" = float .shape(TIME_SERIES),
        opt uz: "uz" = float .shape(TIME_SERIES),
        opt ux_non_staggered: "ux_non_staggered" = float .shape(TIME_SERIES),
        opt uy_non_staggered: "uy_non_staggered" = float .shape(TIME_SERIES),
        opt uz_non_staggered: "uz_non_staggered" = float .shape(TIME_SERIES),
        opt ux_rms: "ux_rms" = float .shape(PER_SENSOR),
        opt uy_rms: "uy_rms" = float .shape(PER_SENSOR),
        opt uz_rms: "uz_rms" = float .shape(PER_SENSOR),
        opt ux_max: "ux_max" = float .shape(PER_SENSOR),
        opt uy_max: "uy_max" = float .shape(PER_SENSOR),
        opt uz_max: "uz_max" = float .shape(PER_SENSOR),
        opt ux_min: "ux_min" = float .shape(PER_SENSOR),
        opt uy_min: "uy_min" = float .shape(PER_SENSOR),
        opt uz_min: "uz_min" = float .shape(PER_SENSOR),
        opt ux_max_all: "ux_max_all" = float .shape(WHOLE_GRID),
        opt uy_max_all: "uy_max_all" = float .shape(WHOLE_GRID),
        opt uz_max_all: "uz_max_all" = float .shape(WHOLE_GRID),
        opt ux_min_all: "ux_min_all" = float .shape(WHOLE_GRID),
        opt uy_min_all: "uy_min_all" = float .shape(WHOLE_GRID),
        opt uz_min_all: "uz_min_all" = float .shape(WHOLE_GRID),
        opt ux_final: "ux_final" = float .shape(WHOLE_GRID),
        opt uy_final: "uy_final" = float .shape(WHOLE_GRID),
        opt uz_final: "uz_final" = float .shape(WHOLE_GRID),
    }
}

/// Everything the solver writes to its output file.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub simulation_flags: SimulationFlagsOutput,
    pub grid: Grid,
    pub pml: Pml,
    /// Echoed only when the solver ran with `--copy_sensor_mask`.
    pub sensor: Option<Sensor>,
    pub results: SimulationResults,
}

impl Record for SimulationOutput {
    fn schema() -> &'static RecordSchema {
        static SCHEMA: OnceLock<RecordSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            RecordSchema::new("SimulationOutput")
                .field(FieldDescriptor::record("simulation_flags", SimulationFlagsOutput::schema))
                .field(FieldDescriptor::record("grid", Grid::schema))
                .field(FieldDescriptor::record("pml", Pml::schema))
                .field(FieldDescriptor::record("sensor", Sensor::schema).optional())
                .field(FieldDescriptor::record("results", SimulationResults::schema))
        })
    }

    fn to_fields(&self) -> FieldValues {
        let mut fields = FieldValues::new("SimulationOutput")
            .nested("simulation_flags", self.simulation_flags.to_fields())
            .nested("grid", self.grid.to_fields())
            .nested("pml", self.pml.to_fields())
            .nested("results", self.results.to_fields());
        if let Some(sensor) = &self.sensor {
            fields.set("sensor", Slot::Record(sensor.to_fields()));
        }
        fields
    }

    fn from_fields(mut fields: FieldValues) -> Result<Self, KwaveError> {
        Ok(Self {
            simulation_flags: fields.take_record("simulation_flags")?,
            grid: fields.take_record("grid")?,
            pml: fields.take_record("pml")?,
            sensor: fields.take_optional_record("sensor")?,
            results: fields.take_record("results")?,
        })
    }
}
