use ndarray::{array, Array2, Array3};

use super::*;
use crate::codec::{decode, encode};
use crate::container::Container;
use crate::schema::Record;
use crate::types::Value;

#[test]
fn test_grid_shape_drops_trailing_unit_axes() {
    assert_eq!(Grid::new(64, 1e-3).shape(), vec![64]);
    assert_eq!(Grid::two_d(64, 32, 1e-3, 1e-3).shape(), vec![32, 64]);
    assert_eq!(
        Grid::three_d(64, 32, 16, 1e-3, 1e-3, 1e-3).shape(),
        vec![16, 32, 64]
    );
    assert!(Grid::two_d(64, 32, 1e-3, 1e-3).is_2d());
    assert!(!Grid::three_d(64, 32, 16, 1e-3, 1e-3, 1e-3).is_2d());
}

#[test]
fn test_grid_sizes() {
    let grid = Grid::two_d(100, 50, 0.5, 0.25);
    assert_eq!(grid.x_size(), Some(50.0));
    assert_eq!(grid.y_size(), Some(12.5));
    assert_eq!(grid.z_size(), None);
}

#[test]
fn test_make_time_uses_min_spacing_and_max_speed() {
    // 3-4-5 triangle: the diagonal is 5 m wide.
    let mut grid = Grid::two_d(3, 4, 1.0, 1.0);
    let c = Value::from(array![[1.0f32, 2.0], [1.0, 1.0]]);
    grid.make_time(&c, 0.5, None).unwrap();

    // dt = 0.5 * 1 / 2, t_end = 5 / 1
    assert_eq!(grid.dt.as_ref().and_then(Value::scalar_f64), Some(0.25));
    assert_eq!(grid.nt.as_ref().and_then(Value::scalar_u64), Some(20));

    let t = grid.t_array();
    assert_eq!(t.len(), 20);
    assert_eq!(t[1], 0.25);
}

#[test]
fn test_make_time_with_explicit_end_time() {
    let mut grid = Grid::new(10, 1.0);
    grid.make_time(&Value::float(1.0), 0.3, Some(1.0)).unwrap();
    // ceil(1.0 / 0.3)
    assert_eq!(grid.nt.as_ref().and_then(Value::scalar_u64), Some(4));
}

#[test]
fn test_make_time_rejects_missing_spacing() {
    let mut grid = Grid::two_d(3, 4, 1.0, 1.0);
    grid.dy = None;
    assert!(grid.make_time(&Value::float(1500.0), 0.3, None).is_err());
    assert!(Grid::new(3, 1.0)
        .make_time(&Value::float(0.0), 0.3, None)
        .is_err());
}

#[test]
fn test_binary_sensor_uses_row_major_indices() {
    let mask = array![[0u8, 1, 0], [1, 0, 1]];
    let sensor = Sensor::binary(&mask);

    assert_eq!(sensor.mask_type(), Some(input::MASK_TYPE_INDEX));
    assert_eq!(sensor.num_sensors(), 3);
    let index = sensor.sensor_mask_index.as_ref().unwrap();
    assert_eq!(index.shape(), &[1, 1, 3]);
    assert_eq!(index.to_f64_vec(), vec![1.0, 3.0, 5.0]);

    let rebuilt = sensor.binary_mask(&[2, 3]).unwrap();
    assert_eq!(rebuilt, mask.into_dyn());
}

#[test]
fn test_binary_mask_needs_index_mode_and_in_range_indices() {
    let mut sensor = Sensor::binary(&Array2::<u8>::ones((2, 2)));
    assert!(sensor.binary_mask(&[1, 2]).is_none());

    sensor.sensor_mask_type = Value::long(input::MASK_TYPE_CORNERS);
    assert!(sensor.binary_mask(&[2, 2]).is_none());
}

#[test]
fn test_auto_pml_covers_active_axes_only() {
    let pml = Pml::auto(2);
    assert_eq!(pml.pml_x_size.scalar_u64(), Some(20));
    assert_eq!(pml.pml_y_alpha.scalar_f64(), Some(2.0));
    assert_eq!(pml.pml_z_size.scalar_u64(), Some(0));
    assert_eq!(pml.pml_z_alpha, None);

    let pml = Pml::auto(3);
    assert_eq!(pml.pml_z_size.scalar_u64(), Some(20));
    assert!(pml.pml_z_alpha.is_some());

    assert_eq!(Pml::auto(1).pml_y_size.scalar_u64(), Some(0));
}

#[test]
fn test_default_flags_describe_an_absorbing_ivp() {
    let flags = SimulationFlags::default();
    assert_eq!(flags.p0_source_flag.scalar_u64(), Some(1));
    assert_eq!(flags.absorbing_flag.scalar_u64(), Some(1));
    assert_eq!(flags.p_source_flag.scalar_u64(), Some(0));
    assert_eq!(SimulationFlags::schema().fields().len(), 17);
}

#[test]
fn test_results_schema_declares_every_output() {
    let schema = SimulationResults::schema();
    assert_eq!(schema.fields().len(), 31);
    assert!(schema.fields().iter().all(|f| f.optional));
}

fn sample_output(sensor: Option<Sensor>) -> SimulationOutput {
    let mut grid = Grid::two_d(16, 12, 1e-4, 1e-4);
    grid.nt = Some(Value::long(40));
    grid.dt = Some(Value::float(2e-8));

    SimulationOutput {
        simulation_flags: SimulationFlagsOutput::default(),
        grid,
        pml: Pml::auto(2),
        sensor,
        results: SimulationResults {
            p: Some(Value::from(Array3::<f32>::zeros((1, 40, 27)))),
            p_final: Some(Value::from(Array3::<f32>::ones((1, 12, 16)))),
            ..SimulationResults::default()
        },
    }
}

#[test]
fn test_output_roundtrip_with_and_without_sensor() {
    for sensor in [None, Some(Sensor::binary(&Array2::<u8>::ones((3, 3))))] {
        let output = sample_output(sensor);
        let mut c = Container::new();
        encode(&output, &mut c, false).unwrap();
        assert_eq!(c.contains("sensor_mask_type"), output.sensor.is_some());

        let decoded: SimulationOutput = decode(&c).unwrap();
        assert_eq!(decoded, output);
    }
}

#[test]
fn test_homogeneous_medium() {
    let medium = Medium::homogeneous(1540.0, 1000.0);
    assert_eq!(medium.c_ref.scalar_f64(), Some(1540.0));
    assert_eq!(medium.rho0_sgz, Some(Value::float(1000.0)));
    assert_eq!(medium.alpha_coeff, None);
}
