// In kwave-core/benches/codec_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array3;

use kwave_core::codec::{decode, encode};
use kwave_core::records::{Grid, Medium, Pml, Sensor, SimulationInput, Source};
use kwave_core::{Container, Value};

// --- Mock data generation ---

const N: usize = 64;

/// A layered, heterogeneous 3-D medium so every voxel map is a full array.
fn layered_input() -> SimulationInput {
    let c0 = Array3::<f32>::from_shape_fn((N, N, N), |(z, _, _)| 1500.0 + 10.0 * (z / 8) as f32);
    let rho0 = Array3::<f32>::from_shape_fn((N, N, N), |(z, _, _)| 1000.0 + (z % 8) as f32);
    let mut grid = Grid::three_d(N, N, N, 1e-4, 1e-4, 1e-4);
    grid.make_time(&Value::from(c0.clone()), 0.3, None).unwrap();

    let medium = Medium {
        rho0: Value::from(rho0.clone()),
        rho0_sgx: Value::from(rho0.clone()),
        rho0_sgy: Some(Value::from(rho0.clone())),
        rho0_sgz: Some(Value::from(rho0)),
        c0: Value::from(c0),
        c_ref: Value::float(1500.0),
        ..Medium::default()
    };

    let p0 = Array3::<f32>::from_shape_fn((N, N, N), |(z, y, x)| {
        let r2 = [z, y, x].iter().map(|&i| (i as f32 - N as f32 / 2.0).powi(2)).sum::<f32>();
        if r2 < 25.0 { 1.0 } else { 0.0 }
    });
    let mask = Array3::<u8>::from_shape_fn((N, N, N), |(z, _, _)| u8::from(z == 0));

    SimulationInput {
        simulation_flags: Default::default(),
        grid,
        medium,
        sensor: Sensor::binary(&mask),
        source: Source::initial_pressure(p0),
        pml: Pml::auto(3),
        kspace: Default::default(),
    }
}

// --- Benchmark Suite ---

fn bench_codec(c: &mut Criterion) {
    let input = layered_input();

    let mut group = c.benchmark_group("SimulationInput Codec");
    group.throughput(criterion::Throughput::Elements((N * N * N) as u64));

    for level in [None, Some(3)] {
        let label = match level {
            Some(l) => format!("zstd {l}"),
            None => "raw".to_string(),
        };

        group.bench_function(format!("Encode + Serialize [{label}]"), |b| {
            b.iter(|| {
                let mut container = Container::new().with_compression(level);
                encode(black_box(&input), &mut container, true).unwrap();
                black_box(container.to_bytes().unwrap())
            })
        });

        let mut container = Container::new().with_compression(level);
        encode(&input, &mut container, true).unwrap();
        let bytes = container.to_bytes().unwrap();

        group.bench_function(format!("Parse + Decode [{label}]"), |b| {
            b.iter(|| {
                let container = Container::from_bytes(black_box(&bytes)).unwrap();
                black_box(decode::<SimulationInput>(&container).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
