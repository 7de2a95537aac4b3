//! Records of the solver input file.

use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};
use num_traits::Zero;
use std::sync::OnceLock;

use crate::error::KwaveError;
use crate::schema::{
    Condition, Dim, FieldDescriptor, FieldValues, Record, RecordSchema, ShapePattern,
};
use crate::types::Value;

//==================================================================================
// 1. Simulation Flags
//==================================================================================

leaf_record! {
    /// Which source terms and physics the solver enables.
    pub struct SimulationFlags as "SimulationFlags" {
        req p0_source_flag: "p0_source_flag" = long,
        req absorbing_flag: "absorbing_flag" = long,
        req transducer_source_flag: "transducer_source_flag" = long,
        req nonlinear_flag: "nonlinear_flag" = long,
        req ux_source_flag: "ux_source_flag" = long,
        req uy_source_flag: "uy_source_flag" = long,
        req uz_source_flag: "uz_source_flag" = long,
        req p_source_flag: "p_source_flag" = long,
        /// Must stay 0; the solver does not support non-uniform grids.
        req nonuniform_grid_flag: "nonuniform_grid_flag" = long,
        req elastic_flag: "elastic_flag" = long,
        req sxx_source_flag: "sxx_source_flag" = long,
        req sxy_source_flag: "sxy_source_flag" = long,
        req sxz_source_flag: "sxz_source_flag" = long,
        req syy_source_flag: "syy_source_flag" = long,
        req syz_source_flag: "syz_source_flag" = long,
        req szz_source_flag: "szz_source_flag" = long,
        req axisymmetric_flag: "axisymmetric_flag" = long,
    }
}

impl Default for SimulationFlags {
    /// An absorbing initial-value problem: `p0_source_flag` and `absorbing_flag` set.
    fn default() -> Self {
        let off = || Value::long(0);
        Self {
            p0_source_flag: Value::long(1),
            absorbing_flag: Value::long(1),
            transducer_source_flag: off(),
            nonlinear_flag: off(),
            ux_source_flag: off(),
            uy_source_flag: off(),
            uz_source_flag: off(),
            p_source_flag: off(),
            nonuniform_grid_flag: off(),
            elastic_flag: off(),
            sxx_source_flag: off(),
            sxy_source_flag: off(),
            sxz_source_flag: off(),
            syy_source_flag: off(),
            syz_source_flag: off(),
            szz_source_flag: off(),
            axisymmetric_flag: off(),
        }
    }
}

//==================================================================================
// 2. Grid
//==================================================================================

leaf_record! {
    /// Grid properties. Shared between the input and the output file.
    pub struct Grid as "Grid" {
        req nx: "Nx" = long,
        req dx: "dx" = float,
        req ny: "Ny" = long,
        opt dy: "dy" = float,
        req nz: "Nz" = long,
        opt dz: "dz" = float,
        /// Number of time steps. Unset until `make_time` runs or the caller sets it.
        opt nt: "Nt" = long,
        opt dt: "dt" = float,
    }
}

impl Grid {
    /// A 1-D grid; `Ny` and `Nz` default to 1.
    pub fn new(nx: usize, dx: f32) -> Self {
        Self {
            nx: Value::from(nx),
            dx: Value::float(dx),
            ny: Value::long(1),
            dy: None,
            nz: Value::long(1),
            dz: None,
            nt: None,
            dt: None,
        }
    }

    pub fn two_d(nx: usize, ny: usize, dx: f32, dy: f32) -> Self {
        Self {
            ny: Value::from(ny),
            dy: Some(Value::float(dy)),
            ..Self::new(nx, dx)
        }
    }

    pub fn three_d(nx: usize, ny: usize, nz: usize, dx: f32, dy: f32, dz: f32) -> Self {
        Self {
            nz: Value::from(nz),
            dz: Some(Value::float(dz)),
            ..Self::two_d(nx, ny, dx, dy)
        }
    }

    fn points(value: &Value) -> usize {
        value.scalar_u64().unwrap_or(1) as usize
    }

    pub fn nx(&self) -> usize {
        Self::points(&self.nx)
    }

    pub fn ny(&self) -> usize {
        Self::points(&self.ny)
    }

    pub fn nz(&self) -> usize {
        Self::points(&self.nz)
    }

    pub fn is_2d(&self) -> bool {
        self.nz() == 1
    }

    /// The logical grid shape in `(Nz, Ny, Nx)` order, with trailing unit axes dropped.
    pub fn shape(&self) -> Vec<usize> {
        match (self.nz(), self.ny()) {
            (1, 1) => vec![self.nx()],
            (1, ny) => vec![ny, self.nx()],
            (nz, ny) => vec![nz, ny, self.nx()],
        }
    }

    pub fn x_size(&self) -> Option<f64> {
        Some(self.nx() as f64 * self.dx.scalar_f64()?)
    }

    pub fn y_size(&self) -> Option<f64> {
        Some(self.ny() as f64 * self.dy.as_ref()?.scalar_f64()?)
    }

    pub fn z_size(&self) -> Option<f64> {
        Some(self.nz() as f64 * self.dz.as_ref()?.scalar_f64()?)
    }

    /// Sample times `0, dt, 2*dt, ...` of the `Nt` steps. Empty while the time axis is unset.
    pub fn t_array(&self) -> Vec<f64> {
        let nt = self.nt.as_ref().and_then(Value::scalar_u64).unwrap_or(0);
        let dt = self.dt.as_ref().and_then(Value::scalar_f64).unwrap_or(0.0);
        (0..nt).map(|i| i as f64 * dt).collect()
    }

    /// Sets `dt` and `Nt` from the sound speed `c` (scalar or map).
    ///
    /// `dt = cfl * min(dx, dy, dz) / max(c)` over the active axes, and
    /// `Nt = ceil(t_end / dt)`. Without `t_end`, the simulation runs long enough
    /// for a wave at `min(c)` to cross the grid diagonal.
    pub fn make_time(&mut self, c: &Value, cfl: f64, t_end: Option<f64>) -> Result<(), KwaveError> {
        let (c_min, c_max) = match (c.min_f64(), c.max_f64()) {
            (Some(lo), Some(hi)) if lo > 0.0 => (lo, hi),
            _ => {
                return Err(KwaveError::InvalidConfig(
                    "make_time needs a positive sound speed".into(),
                ))
            }
        };

        let missing = |axis: &str| {
            KwaveError::InvalidConfig(format!("make_time needs the {axis} spacing to be set"))
        };
        let mut spacings = vec![self.dx.scalar_f64().ok_or_else(|| missing("x"))?];
        let mut sizes = vec![self.x_size().ok_or_else(|| missing("x"))?];
        let ndims = self.shape().len();
        if ndims >= 2 {
            spacings.push(self.dy.as_ref().and_then(Value::scalar_f64).ok_or_else(|| missing("y"))?);
            sizes.push(self.y_size().ok_or_else(|| missing("y"))?);
        }
        if ndims == 3 {
            spacings.push(self.dz.as_ref().and_then(Value::scalar_f64).ok_or_else(|| missing("z"))?);
            sizes.push(self.z_size().ok_or_else(|| missing("z"))?);
        }

        let t_end = t_end.unwrap_or_else(|| sizes.iter().map(|s| s * s).sum::<f64>().sqrt() / c_min);
        let min_spacing = spacings.into_iter().fold(f64::INFINITY, f64::min);
        let dt = cfl * min_spacing / c_max;
        let nt = (t_end / dt).ceil() as u64;

        log::debug!("make_time: dt = {dt:e}, Nt = {nt}");
        self.dt = Some(Value::float(dt as f32));
        self.nt = Some(Value::long(nt));
        Ok(())
    }
}

//==================================================================================
// 3. Medium
//==================================================================================

/// A per-voxel map over the whole grid.
const VOXEL_MAP: ShapePattern =
    ShapePattern([Dim::Symbol("Nz"), Dim::Symbol("Ny"), Dim::Symbol("Nx")]);

leaf_record! {
    /// Acoustic properties. Each field is a scalar for a homogeneous medium or
    /// a per-voxel map for a heterogeneous one.
    pub struct Medium as "Medium" {
        req rho0: "rho0" = float .shape(VOXEL_MAP) .shape(ShapePattern::SCALAR),
        req rho0_sgx: "rho0_sgx" = float .shape(VOXEL_MAP) .shape(ShapePattern::SCALAR),
        opt rho0_sgy: "rho0_sgy" = float .shape(VOXEL_MAP) .shape(ShapePattern::SCALAR),
        opt rho0_sgz: "rho0_sgz" = float .shape(VOXEL_MAP) .shape(ShapePattern::SCALAR),
        req c0: "c0" = float .shape(VOXEL_MAP) .shape(ShapePattern::SCALAR),
        req c_ref: "c_ref" = float,
        /// Nonlinearity; read when `nonlinear_flag` is 1.
        opt bon_a: "BonA" = float .shape(VOXEL_MAP) .shape(ShapePattern::SCALAR),
        /// Absorption; read when `absorbing_flag` is 1.
        opt alpha_coeff: "alpha_coeff" = float .shape(VOXEL_MAP) .shape(ShapePattern::SCALAR),
        opt alpha_power: "alpha_power" = float,
    }
}

impl Default for Medium {
    fn default() -> Self {
        Self {
            rho0: Value::float(1.0),
            rho0_sgx: Value::float(1.0),
            rho0_sgy: Some(Value::float(1.0)),
            rho0_sgz: Some(Value::float(1.0)),
            c0: Value::float(1500.0),
            c_ref: Value::float(1500.0),
            bon_a: None,
            alpha_coeff: None,
            alpha_power: None,
        }
    }
}

impl Medium {
    /// A homogeneous, lossless medium.
    pub fn homogeneous(c0: f32, rho0: f32) -> Self {
        Self {
            rho0: Value::float(rho0),
            rho0_sgx: Value::float(rho0),
            rho0_sgy: Some(Value::float(rho0)),
            rho0_sgz: Some(Value::float(rho0)),
            c0: Value::float(c0),
            c_ref: Value::float(c0),
            ..Self::default()
        }
    }
}

//==================================================================================
// 4. Sensor
//==================================================================================

/// `sensor_mask_type` of a binary sensor mask.
pub const MASK_TYPE_INDEX: u64 = 0;
/// `sensor_mask_type` of a list of opposing cuboid corners.
pub const MASK_TYPE_CORNERS: u64 = 1;

leaf_record! {
    pub struct Sensor as "Sensor" {
        req sensor_mask_type: "sensor_mask_type" = long,
        opt sensor_mask_index: "sensor_mask_index" = long
            .shape_when(Condition::equals("sensor_mask_type", MASK_TYPE_INDEX), ShapePattern::new(1, 1, "Nsens")),
        opt sensor_mask_corners: "sensor_mask_corners" = long
            .shape_when(Condition::equals("sensor_mask_type", MASK_TYPE_CORNERS), ShapePattern::new(1, 6, "Ncubes")),
    }
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            sensor_mask_type: Value::long(MASK_TYPE_INDEX),
            sensor_mask_index: None,
            sensor_mask_corners: None,
        }
    }
}

impl Sensor {
    /// A binary-mask sensor recording at every non-zero cell of `mask`.
    ///
    /// The index list holds row-major linear indices of the selected cells.
    pub fn binary<A, S, D>(mask: &ArrayBase<S, D>) -> Self
    where
        A: Zero + PartialEq,
        S: Data<Elem = A>,
        D: Dimension,
    {
        let index: Vec<u64> = mask
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_zero())
            .map(|(i, _)| i as u64)
            .collect();
        let n = index.len();
        let index = ArrayD::from_shape_vec(IxDyn(&[1, 1, n]), index)
            .unwrap_or_else(|_| ArrayD::zeros(IxDyn(&[1, 1, 0])));

        Self {
            sensor_mask_type: Value::long(MASK_TYPE_INDEX),
            sensor_mask_index: Some(Value::UInt64(index)),
            sensor_mask_corners: None,
        }
    }

    pub fn mask_type(&self) -> Option<u64> {
        self.sensor_mask_type.scalar_u64()
    }

    /// Rebuilds the binary mask of the given grid shape.
    ///
    /// `None` unless this is an index-mode sensor whose indices all fall inside `shape`.
    pub fn binary_mask(&self, shape: &[usize]) -> Option<ArrayD<u8>> {
        if self.mask_type() != Some(MASK_TYPE_INDEX) {
            return None;
        }
        let mut mask = ArrayD::<u8>::zeros(IxDyn(shape));
        let cells = mask.as_slice_mut()?;
        for index in self.sensor_mask_index.as_ref()?.to_f64_vec() {
            *cells.get_mut(index as usize)? = 1;
        }
        Some(mask)
    }

    /// Number of recording points of an index-mode sensor.
    pub fn num_sensors(&self) -> usize {
        self.sensor_mask_index.as_ref().map_or(0, Value::len)
    }
}

//==================================================================================
// 5. Source
//==================================================================================

leaf_record! {
    /// Source terms. Each group is read only when its flag in `SimulationFlags` is set.
    #[derive(Default)]
    pub struct Source as "Source" {
        // Velocity sources.
        opt u_source_mode: "u_source_mode" = long,
        opt u_source_many: "u_source_many" = long,
        opt u_source_index: "u_source_index" = long .shape(ShapePattern::new(1, 1, "Nsrc")),
        opt ux_source_input: "ux_source_input" = float
            .shape_when(Condition::equals("u_source_many", 0), ShapePattern::new(1, "Nt_src", 1))
            .shape_when(Condition::equals("u_source_many", 1), ShapePattern::new(1, "Nt_src", "Nsrc")),
        opt uy_source_input: "uy_source_input" = float
            .shape_when(Condition::equals("u_source_many", 0), ShapePattern::new(1, "Nt_src", 1))
            .shape_when(Condition::equals("u_source_many", 1), ShapePattern::new(1, "Nt_src", "Nsrc")),
        opt uz_source_input: "uz_source_input" = float
            .shape_when(Condition::equals("u_source_many", 0), ShapePattern::new(1, "Nt_src", 1))
            .shape_when(Condition::equals("u_source_many", 1), ShapePattern::new(1, "Nt_src", "Nsrc")),

        // Pressure sources.
        opt p_source_mode: "p_source_mode" = long,
        opt p_source_many: "p_source_many" = long,
        opt p_source_index: "p_source_index" = long .shape(ShapePattern::new(1, 1, "Nsrc")),
        opt p_source_input: "p_source_input" = float
            .shape_when(Condition::equals("p_source_many", 0), ShapePattern::new(1, "Nt_src", 1))
            .shape_when(Condition::equals("p_source_many", 1), ShapePattern::new(1, "Nt_src", "Nsrc")),

        // Transducer sources.
        opt transducer_source_input: "transducer_source_input" = float .shape(ShapePattern::new(1, 1, "Nt_src")),
        opt delay_mask: "delay_mask" = float .shape(ShapePattern::new(1, 1, "Nsrc")),

        /// Initial pressure distribution.
        opt p0_source_input: "p0_source_input" = float .shape(VOXEL_MAP),
    }
}

impl Source {
    /// An initial-value-problem source.
    pub fn initial_pressure(p0: impl Into<Value>) -> Self {
        Self {
            p0_source_input: Some(p0.into()),
            ..Self::default()
        }
    }
}

//==================================================================================
// 6. k-space and shift variables
//==================================================================================

/// Reserved by the file format. The solver computes these itself, so nothing is written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KSpaceAndShiftVariables;

impl Record for KSpaceAndShiftVariables {
    fn schema() -> &'static RecordSchema {
        static SCHEMA: OnceLock<RecordSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| RecordSchema::new("KSpaceAndShiftVariables"))
    }

    fn to_fields(&self) -> FieldValues {
        FieldValues::new("KSpaceAndShiftVariables")
    }

    fn from_fields(_fields: FieldValues) -> Result<Self, KwaveError> {
        Ok(Self)
    }
}

//==================================================================================
// 7. PML
//==================================================================================

/// Thickness, in grid points, of the automatic absorbing layer.
pub const AUTO_PML_SIZE: usize = 20;
/// Absorption of the automatic absorbing layer, in nepers per grid point.
pub const AUTO_PML_ALPHA: f32 = 2.0;

leaf_record! {
    /// Perfectly matched layer.
    pub struct Pml as "Pml" {
        req pml_x_size: "pml_x_size" = long,
        req pml_x_alpha: "pml_x_alpha" = float,
        req pml_y_size: "pml_y_size" = long,
        req pml_y_alpha: "pml_y_alpha" = float,
        req pml_z_size: "pml_z_size" = long,
        opt pml_z_alpha: "pml_z_alpha" = float,

        opt pml_x: "pml_x" = float .shape(ShapePattern::new(1, 1, "Nx")),
        opt pml_x_sgx: "pml_x_sgx" = float .shape(ShapePattern::new(1, 1, "Nx")),
        opt pml_y: "pml_y" = float .shape(ShapePattern::new(1, "Ny", 1)),
        opt pml_y_sgy: "pml_y_sgy" = float .shape(ShapePattern::new(1, "Ny", 1)),
        opt pml_z: "pml_z" = float .shape(ShapePattern::new("Nz", 1, 1)),
        opt pml_z_sgz: "pml_z_sgz" = float .shape(ShapePattern::new("Nz", 1, 1)),
    }
}

impl Pml {
    /// A layer of the given size and absorption on x and y, none on z.
    pub fn new(x_size: usize, x_alpha: f32, y_size: usize, y_alpha: f32) -> Self {
        Self {
            pml_x_size: Value::from(x_size),
            pml_x_alpha: Value::float(x_alpha),
            pml_y_size: Value::from(y_size),
            pml_y_alpha: Value::float(y_alpha),
            pml_z_size: Value::long(0),
            pml_z_alpha: None,
            pml_x: None,
            pml_x_sgx: None,
            pml_y: None,
            pml_y_sgy: None,
            pml_z: None,
            pml_z_sgz: None,
        }
    }

    /// The default layer for an `ndims`-dimensional grid: 20 points at alpha 2 on
    /// every active axis. Inactive axes get a zero-sized, zero-alpha layer.
    pub fn auto(ndims: usize) -> Self {
        let (y_size, y_alpha) = if ndims >= 2 {
            (AUTO_PML_SIZE, AUTO_PML_ALPHA)
        } else {
            (0, 0.0)
        };
        let mut pml = Self::new(AUTO_PML_SIZE, AUTO_PML_ALPHA, y_size, y_alpha);
        if ndims >= 3 {
            pml.pml_z_size = Value::from(AUTO_PML_SIZE);
            pml.pml_z_alpha = Some(Value::float(AUTO_PML_ALPHA));
        }
        pml
    }
}

//==================================================================================
// The Input File
//==================================================================================

/// Everything the solver reads from its input file.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInput {
    pub simulation_flags: SimulationFlags,
    pub grid: Grid,
    pub medium: Medium,
    pub sensor: Sensor,
    pub source: Source,
    pub pml: Pml,
    pub kspace: KSpaceAndShiftVariables,
}

impl Record for SimulationInput {
    fn schema() -> &'static RecordSchema {
        static SCHEMA: OnceLock<RecordSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            RecordSchema::new("SimulationInput")
                .field(FieldDescriptor::record("simulation_flags", SimulationFlags::schema))
                .field(FieldDescriptor::record("grid", Grid::schema))
                .field(FieldDescriptor::record("medium", Medium::schema))
                .field(FieldDescriptor::record("sensor", Sensor::schema))
                .field(FieldDescriptor::record("source", Source::schema))
                .field(FieldDescriptor::record("pml", Pml::schema))
                .field(FieldDescriptor::record("kspace", KSpaceAndShiftVariables::schema))
        })
    }

    fn to_fields(&self) -> FieldValues {
        FieldValues::new("SimulationInput")
            .nested("simulation_flags", self.simulation_flags.to_fields())
            .nested("grid", self.grid.to_fields())
            .nested("medium", self.medium.to_fields())
            .nested("sensor", self.sensor.to_fields())
            .nested("source", self.source.to_fields())
            .nested("pml", self.pml.to_fields())
            .nested("kspace", self.kspace.to_fields())
    }

    fn from_fields(mut fields: FieldValues) -> Result<Self, KwaveError> {
        Ok(Self {
            simulation_flags: fields.take_record("simulation_flags")?,
            grid: fields.take_record("grid")?,
            medium: fields.take_record("medium")?,
            sensor: fields.take_record("sensor")?,
            source: fields.take_record("source")?,
            pml: fields.take_record("pml")?,
            kspace: fields.take_record("kspace")?,
        })
    }
}
