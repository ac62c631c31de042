use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use num_complex::Complex64;
use svsim_core::matrix;
use svsim_state::indexes::{indexes, indexes_fixed, sorted};
use svsim_state::{AmplitudeStore, QubitVector};

// Linear congruential generator for reproducible benchmarks
struct BenchRng {
    state: u64,
}

impl BenchRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.state / 65536) % 32768) as f64 / 32768.0
    }
}

fn create_random_state(num_qubits: usize, seed: u64) -> QubitVector {
    let dimension = 1 << num_qubits;
    let mut rng = BenchRng::new(seed);

    let mut amplitudes: Vec<Complex64> = (0..dimension)
        .map(|_| Complex64::new(rng.next() - 0.5, rng.next() - 0.5))
        .collect();
    let norm: f64 = amplitudes.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt();
    amplitudes.iter_mut().for_each(|a| *a /= norm);

    QubitVector::from_amplitudes(amplitudes).unwrap()
}

fn bench_index_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_blocks");
    group.throughput(Throughput::Elements(1 << 16));

    group.bench_function("fixed_2q", |b| {
        let qubits = [7, 2];
        let qubits_sorted = [2, 7];
        b.iter(|| {
            let mut acc = 0u64;
            for k in 0..(1u64 << 16) {
                acc ^= indexes_fixed::<2, 4>(black_box(&qubits), &qubits_sorted, k)[3];
            }
            acc
        });
    });

    group.bench_function("dynamic_2q", |b| {
        let qubits = [7, 2];
        let qubits_sorted = sorted(&qubits);
        b.iter(|| {
            let mut acc = 0u64;
            for k in 0..(1u64 << 16) {
                acc ^= indexes(black_box(&qubits), &qubits_sorted, k)[3];
            }
            acc
        });
    });

    group.finish();
}

fn bench_gate_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_kernels");
    let h = matrix::u4(std::f64::consts::FRAC_PI_2, 0.0, std::f64::consts::PI, 0.0);

    for num_qubits in [10, 16, 20].iter() {
        group.throughput(Throughput::Elements(1 << num_qubits));

        for threads in [1, 4] {
            group.bench_with_input(
                BenchmarkId::new(format!("mcu_{}t", threads), num_qubits),
                num_qubits,
                |b, &num_qubits| {
                    let mut state = create_random_state(num_qubits, 42).with_threads(threads);
                    b.iter(|| state.apply_mcu(black_box(&[num_qubits / 2]), &h).unwrap());
                },
            );
        }

        group.bench_with_input(
            BenchmarkId::new("matrix_3q", num_qubits),
            num_qubits,
            |b, &num_qubits| {
                let mut state = create_random_state(num_qubits, 42);
                let m = matrix::rxx(0.3);
                let m3 = m.matmul(&m).unwrap();
                let wide = svsim_core::Matrix::stacked(&[m3.clone(), m3]).unwrap();
                b.iter(|| {
                    state
                        .apply_multiplexer(black_box(&[0]), &[1, 2], &wide)
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_measure");
    let state = create_random_state(16, 7);

    for &shots in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(shots as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_shots", shots)),
            &shots,
            |b, &shots| {
                let mut rng = BenchRng::new(123);
                let rnds: Vec<f64> = (0..shots).map(|_| rng.next()).collect();
                b.iter(|| state.sample_measure(black_box(&rnds)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_index_blocks, bench_gate_kernels, bench_sampling);
criterion_main!(benches);
