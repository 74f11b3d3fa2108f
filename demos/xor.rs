use approx::relative_eq;
use neat4::{default_rng, Genome, JsonFile, Neat, Settings};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const POPULATION: usize = 150;
const PAIRS: [([f64; 2], f64); 4] = [
    ([0., 0.], 0.),
    ([0., 1.], 1.),
    ([1., 0.], 1.),
    ([1., 1.], 0.),
];

fn xor(genome: &mut Genome) -> f64 {
    PAIRS.iter().fold(0., |fit, (input, want)| {
        genome.reset();
        let v = genome.forward(input)[0];
        if relative_eq!(v, *want, epsilon = 0.05) {
            fit + 1.
        } else {
            fit + (1. - (want - v).abs()).max(0.) / 2.
        }
    })
}

fn main() -> Result<(), neat4::NeatError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // an optional settings directory, otherwise the defaults
    let mut neat = match env::args().nth(1) {
        Some(dir) => Neat::from_dir(dir)?,
        None => Neat::new(Settings {
            max_generations: 300,
            max_fitness: 4.,
            node_info: neat4::settings::NodeInfo {
                activations: vec!["sigmoid".into()],
                max_depth: 4,
            },
            ..Settings::default()
        }),
    };

    let mut rng = default_rng();
    neat.generate(2, 1, POPULATION, &mut rng);
    neat.evaluate(&xor);
    while neat.should_evolve() {
        if neat.should_save() {
            neat.save(PathBuf::from("output").join(format!("xor-{}", neat.generation)))?;
        }
        neat.evolve(&mut rng);
        neat.evaluate(&xor);
    }

    if let Some(best) = neat.best_genome.as_ref() {
        info!(
            generation = neat.generation,
            fitness = best.fitness,
            nodes = best.total_nodes(),
            connections = best.total_connections(),
            "finished"
        );
        best.to_file("xor-champion.json")?;
    }

    Ok(())
}
