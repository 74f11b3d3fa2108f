use criterion::Criterion;
use neat4::{Genome, Neat, Settings, WyRng};
use rand::SeedableRng;

fn fitness(genome: &mut Genome) -> f64 {
    let out = genome.forward(&[0.5; 42]);
    out.iter().map(|v| 1. + v).sum()
}

fn bench_evolve(bench: &mut Criterion) {
    let mut rng = WyRng::seed_from_u64(0);
    let mut neat = Neat::new(Settings::default());
    neat.generate(42, 7, 150, &mut rng);
    neat.evaluate(&fitness);

    bench.bench_function("evaluate-150", |b| {
        b.iter(|| neat.clone().evaluate(&fitness))
    });

    bench.bench_function("evolve-150", |b| {
        b.iter(|| neat.clone().evolve(&mut rng))
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(100)
        .significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let mut criterion: criterion::Criterion<_> = {
        use core::time::Duration;
        Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    bench_evolve(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
