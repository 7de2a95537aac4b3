use super::*;
use crate::codec::{decode_file, encode_file};
use crate::config::SolverConfig;
use crate::error::KwaveError;
use crate::records::{
    Grid, Medium, Pml, Sensor, SimulationFlagsOutput, SimulationInput, SimulationOutput,
    SimulationResults, Source,
};
use crate::types::Value;
use ndarray::{Array2, Array3};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Writing an executable and spawning it while another test forks can fail
/// with ETXTBSY, so process-spawning tests run one at a time.
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Installs a shell script as the solver binary and returns a config pointing at it.
/// The script sees `-i <input> -o <output>` as `$1 $2 $3 $4`.
fn stub_solver(dir: &Path, body: &str) -> SolverConfig {
    let bin_dir = dir.join("bin");
    fs::create_dir_all(&bin_dir).unwrap();
    let config = SolverConfig {
        binary_dir: bin_dir,
        data_path: dir.join("work"),
        ..SolverConfig::default()
    };

    let path = config.binary_path();
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
    config
}

fn small_input() -> SimulationInput {
    let grid = Grid::two_d(8, 8, 1e-4, 1e-4);
    SimulationInput {
        simulation_flags: Default::default(),
        pml: Pml::auto(2),
        kspace: Default::default(),
        medium: Medium::default(),
        sensor: Sensor::binary(&Array2::<u8>::from_shape_fn((8, 8), |(y, _)| u8::from(y == 0))),
        source: Source::initial_pressure(Array3::<f32>::ones((1, 8, 8))),
        grid,
    }
}

/// A solver output file the stub hands back.
fn output_fixture(dir: &Path) -> (PathBuf, SimulationOutput) {
    let mut grid = Grid::two_d(8, 8, 1e-4, 1e-4);
    grid.nt = Some(Value::long(10));
    grid.dt = Some(Value::float(2e-8));
    let output = SimulationOutput {
        simulation_flags: SimulationFlagsOutput::default(),
        grid,
        pml: Pml::auto(2),
        sensor: None,
        results: SimulationResults {
            p: Some(Value::from(Array3::<f32>::zeros((1, 10, 8)))),
            ..SimulationResults::default()
        },
    };
    let path = dir.join("fixture_output.h5");
    encode_file(&output, &path, None).unwrap();
    (path, output)
}

fn capture(config: SolverConfig) -> (Solver, CaptureSink) {
    let sink = CaptureSink::new();
    let solver = Solver::new(config)
        .with_sink(Arc::new(sink.clone()))
        .with_poll_interval(Duration::from_millis(5));
    (solver, sink)
}

//==================================================================================
// Exit status mapping
//==================================================================================

#[test]
fn test_zero_exit_decodes_the_output_file() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let (fixture, expected) = output_fixture(dir.path());
    let config = stub_solver(
        dir.path(),
        &format!(
            "echo \"Reading $2\"\necho 'progress 50%' >&2\ncp '{}' \"$4\"\necho done",
            fixture.display()
        ),
    );
    let (solver, sink) = capture(config);

    let input = small_input();
    let output: SimulationOutput = solver.run(&input).unwrap();
    assert_eq!(output, expected);

    let files = solver.staged_files("kwave_data");
    let staged: SimulationInput = decode_file(&files.input).unwrap();
    assert_eq!(staged, input);

    let lines = sink.lines();
    assert!(lines.contains(&format!("Reading {}", files.input.display())));
    assert!(lines.contains(&"progress 50%".to_string()));
    assert!(lines.contains(&"done".to_string()));
}

#[test]
fn test_nonzero_exit_is_surfaced_with_code_and_paths() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let config = stub_solver(dir.path(), "echo 'CUDA error' >&2\nexit 7");
    let (solver, sink) = capture(config);

    let err = solver.run::<_, SimulationOutput>(&small_input()).unwrap_err();
    let files = solver.staged_files("kwave_data");
    match &err {
        KwaveError::SolverExecution { code, input, output } => {
            assert_eq!(*code, Some(7));
            assert_eq!(input, &files.input);
            assert_eq!(output, &files.output);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("return code 7"));

    // The input stays for diagnosis; no output was produced or decoded.
    assert!(files.input.is_file());
    assert!(!files.output.exists());
    assert_eq!(sink.lines(), vec!["CUDA error".to_string()]);
}

#[test]
fn test_unreadable_output_is_a_decode_error() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let config = stub_solver(dir.path(), "echo garbage > \"$4\"");
    let (solver, _sink) = capture(config);

    let err = solver.run::<_, SimulationOutput>(&small_input()).unwrap_err();
    match err {
        KwaveError::Decode {
            input,
            output,
            source,
        } => {
            let files = solver.staged_files("kwave_data");
            assert_eq!(input, files.input);
            assert_eq!(output, files.output);
            assert!(input.is_file());
            assert!(matches!(*source, KwaveError::ContainerRead(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_binary_fails_before_staging() {
    let dir = TempDir::new().unwrap();
    let config = SolverConfig {
        binary_dir: dir.path().join("nowhere"),
        data_path: dir.path().join("work"),
        ..SolverConfig::default()
    };
    let solver = Solver::new(config);

    let err = solver.run::<_, SimulationOutput>(&small_input()).unwrap_err();
    assert!(matches!(err, KwaveError::BinaryNotFound(ref p) if p.ends_with("kspaceFirstOrder-CUDA.exe")));
    assert!(!dir.path().join("work").exists());
    assert!(matches!(solver.version(), Err(KwaveError::BinaryNotFound(_))));
}

//==================================================================================
// Version query, cancellation, high-level runner
//==================================================================================

#[test]
fn test_version_query_relays_output_without_staging() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let config = stub_solver(dir.path(), "echo \"kspaceFirstOrder $1\"");
    let (solver, sink) = capture(config);

    let status = solver.version().unwrap();
    assert!(status.success());
    assert_eq!(sink.lines(), vec!["kspaceFirstOrder --version".to_string()]);
    assert!(!dir.path().join("work").exists());
}

#[test]
fn test_cancellation_kills_the_solver() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let config = stub_solver(dir.path(), "echo started\nexec sleep 30");
    let (solver, _sink) = capture(config);

    let token = solver.cancel_token();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        token.cancel();
    });

    let started = Instant::now();
    let err = solver.run::<_, SimulationOutput>(&small_input()).unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, KwaveError::Cancelled { .. }));
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[test]
fn test_cancellation_reaches_processes_the_solver_started() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    // A wrapper script: `sleep` is a grandchild holding the output pipes.
    let config = stub_solver(dir.path(), "echo started\nsleep 5\necho after");
    let (solver, sink) = capture(config);

    let token = solver.cancel_token();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        token.cancel();
    });

    let started = Instant::now();
    let err = solver.run::<_, SimulationOutput>(&small_input()).unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, KwaveError::Cancelled { .. }));
    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    assert!(!sink.lines().contains(&"after".to_string()));
}

#[test]
fn test_kspace_first_order_fills_defaults_and_honours_data_name() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let (fixture, expected) = output_fixture(dir.path());
    let config = stub_solver(dir.path(), &format!("cp '{}' \"$4\"", fixture.display()));
    let (solver, _sink) = capture(config);

    let base = small_input();
    let (input, output) = kspace_first_order(
        &solver,
        base.grid.clone(),
        base.medium.clone(),
        base.sensor.clone(),
        base.source.clone(),
        RunOptions {
            data_name: Some("run_42".to_string()),
            ..RunOptions::default()
        },
    )
    .unwrap();

    assert_eq!(output, expected);
    assert_eq!(input, base);
    assert_eq!(input.pml, Pml::auto(2));
    assert!(dir.path().join("work").join("run_42_input.h5").is_file());
    assert!(dir.path().join("work").join("run_42_output.h5").is_file());
}
