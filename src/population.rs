//! The [Neat] controller: owns every specie and drives the generational loop.

use crate::{
    constants::NEAT_EXTENSION,
    crossover::genomic_distance,
    error::NeatError,
    genome::Genome,
    serde_traits::JsonFile,
    settings::Settings,
    specie::Specie,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neat {
    pub settings: Settings,
    pub inputs: usize,
    pub outputs: usize,
    /// target population size
    pub population: usize,
    pub species: Vec<Specie>,
    pub generation: usize,
    pub current_species: usize,
    pub current_genome: usize,
    /// copy of the fittest genome seen so far
    pub best_genome: Option<Genome>,
}

/// Progress of a run, 1-indexed for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeatInfo {
    pub generation: usize,
    pub current_species: usize,
    pub current_genome: usize,
    pub fitness: f64,
}

impl Neat {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            inputs: 0,
            outputs: 0,
            population: 0,
            species: vec![],
            generation: 0,
            current_species: 0,
            current_genome: 0,
            best_genome: None,
        }
    }

    /// A controller configured from `settings.json` inside `dir`
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, NeatError> {
        Settings::load(dir).map(Self::new)
    }

    /// Create `population` fresh genomes and classify each into a specie
    pub fn generate(&mut self, inputs: usize, outputs: usize, population: usize, rng: &mut impl Rng) {
        self.inputs = inputs;
        self.outputs = outputs;
        self.population = population;
        self.species.clear();
        self.generation = 0;
        self.current_species = 0;
        self.current_genome = 0;

        for _ in 0..population {
            let genome = self.fresh_genome(rng);
            self.classify_genome(genome);
        }
        self.best_genome = self
            .species
            .first()
            .and_then(|specie| specie.members.first())
            .cloned();
    }

    pub(crate) fn fresh_genome(&self, rng: &mut impl Rng) -> Genome {
        Genome::new(self.inputs, self.outputs, &self.settings.node_info, rng)
    }

    /// Add `genome` to the first specie whose representative is within the compatibility
    /// threshold, or found a new specie. Returns the specie's index
    pub fn classify_genome(&mut self, genome: Genome) -> usize {
        let found = self.species.iter().position(|specie| {
            !specie.is_empty()
                && genomic_distance(
                    &genome,
                    specie.representative(),
                    &self.settings.distance_weights,
                ) <= self.settings.delta_genome_threshold
        });

        match found {
            Some(idx) => {
                self.species[idx].members.push(genome);
                idx
            }
            None => {
                self.species
                    .push(Specie::new(self.settings.max_fitness_history, genome));
                debug!(species = self.species.len(), "specie founded");
                self.species.len() - 1
            }
        }
    }

    /// Replace `best_genome` with the fittest current member, if it beats it
    pub fn update_best(&mut self) {
        let leader = self
            .species
            .iter()
            .filter_map(Specie::best)
            .fold(None, |best: Option<&Genome>, g| match best {
                Some(b) if b.fitness >= g.fitness => Some(b),
                _ => Some(g),
            });

        if let Some(leader) = leader {
            if self
                .best_genome
                .as_ref()
                .map_or(true, |best| leader.fitness > best.fitness)
            {
                self.best_genome = Some(leader.clone());
            }
        }
    }

    /// Advance one generation. Every genome must have been given a fitness first
    pub fn evolve(&mut self, rng: &mut impl Rng) {
        let mut fitness_sum = 0.;
        for specie in self.species.iter_mut() {
            specie.update_fitness();
            specie.update_fitness_history();
            specie.update_representative();
            fitness_sum += specie.fitness_mean;
        }
        self.update_best();

        if fitness_sum <= self.settings.fitness_floor {
            warn!(
                generation = self.generation,
                fitness_sum, "no fitness signal, mutating every genome"
            );
            let settings = &self.settings;
            for member in self.species.iter_mut().flat_map(|s| s.members.iter_mut()) {
                member.mutate(&settings.mutation_probabilities, &settings.node_info, rng);
            }
        } else {
            self.kill_population();
            self.repopulate(fitness_sum, rng);
        }

        info!(
            generation = self.generation,
            species = self.species.len(),
            population = self.current_population(),
            fitness_sum,
            best = self.best_genome.as_ref().map_or(0., |g| g.fitness),
            "evolved"
        );
        self.generation += 1;
        self.current_species = 0;
        self.current_genome = 0;
    }

    /// False once `max_generations` or `max_fitness` has been reached. A bound of 0 is disabled
    pub fn should_evolve(&mut self) -> bool {
        self.update_best();
        let generations_done = self.settings.max_generations > 0
            && self.generation >= self.settings.max_generations;
        let fitness_done = self.settings.max_fitness != 0.
            && self
                .best_genome
                .as_ref()
                .is_some_and(|g| g.fitness >= self.settings.max_fitness);
        !(generations_done || fitness_done)
    }

    /// Advance the cursor to the next genome, evolving once it wraps past the last specie
    pub fn next_genome(&mut self, rng: &mut impl Rng) {
        let len = self.species[self.current_species].len();
        if self.current_genome + 1 < len {
            self.current_genome += 1;
            return;
        }

        if self.current_species + 1 < self.species.len() {
            self.current_species += 1;
        } else {
            self.evolve(rng);
            self.current_species = 0;
        }
        self.current_genome = 0;
    }

    /// The genome under the cursor
    #[inline]
    pub fn genome(&self) -> &Genome {
        self.get_genome(self.current_species, self.current_genome)
    }

    #[inline]
    pub fn genome_mut(&mut self) -> &mut Genome {
        &mut self.species[self.current_species].members[self.current_genome]
    }

    #[inline]
    pub fn get_genome(&self, specie: usize, genome: usize) -> &Genome {
        &self.species[specie].members[genome]
    }

    /// Total members across every specie
    pub fn current_population(&self) -> usize {
        self.species.iter().map(Specie::len).sum()
    }

    /// The specie with the highest mean fitness
    pub fn best_specie(&self) -> Option<&Specie> {
        self.species.iter().fold(None, |best, specie| match best {
            Some(b) if b.fitness_mean >= specie.fitness_mean => Some(b),
            _ => Some(specie),
        })
    }

    /// Whether a driver should checkpoint at this generation
    pub fn should_save(&self) -> bool {
        self.settings.save_intervals.contains(&self.generation)
    }

    pub fn info(&self) -> NeatInfo {
        NeatInfo {
            generation: self.generation + 1,
            current_species: self.current_species + 1,
            current_genome: self.current_genome + 1,
            fitness: self.genome().fitness,
        }
    }

    fn neat_path<P: AsRef<Path>>(identifier: P) -> PathBuf {
        let mut path = OsString::from(identifier.as_ref());
        path.push(".");
        path.push(NEAT_EXTENSION);
        path.into()
    }

    /// Write the whole controller to `<identifier>.neat`
    pub fn save<P: AsRef<Path>>(&self, identifier: P) -> Result<(), NeatError> {
        let path = Self::neat_path(identifier);
        self.to_file(&path)?;
        debug!(path = %path.display(), generation = self.generation, "saved population");
        Ok(())
    }

    /// Read a controller written by [Neat::save]
    pub fn load<P: AsRef<Path>>(identifier: P) -> Result<Self, NeatError> {
        let path = Self::neat_path(identifier);
        let neat = Self::from_file(&path)?;
        debug!(path = %path.display(), generation = neat.generation, "loaded population");
        Ok(neat)
    }
}

impl Default for Neat {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{random::WyRng, test_t};
    use rand::{rngs::StdRng, SeedableRng};
    use std::{env::temp_dir, fs};

    pub(crate) fn neat(population: usize, rng: &mut impl Rng) -> Neat {
        let mut neat = Neat::default();
        neat.generate(3, 2, population, rng);
        neat
    }

    fn score_all(neat: &mut Neat, rng: &mut impl Rng) {
        for member in neat.species.iter_mut().flat_map(|s| s.members.iter_mut()) {
            member.fitness = rng.random_range(0. ..10.);
        }
    }

    #[test]
    fn test_generate() {
        let mut rng = WyRng::seed_from_u64(0);
        let neat = neat(50, &mut rng);
        assert_eq!(neat.current_population(), 50);
        assert!(!neat.species.is_empty());
        assert!(neat.best_genome.is_some());
        for specie in neat.species.iter() {
            assert!(!specie.is_empty());
            for member in specie.members.iter() {
                assert_eq!(member.total_nodes(), 5);
                assert_eq!(member.total_connections(), 6);
            }
        }
    }

    #[test]
    fn test_classify_threshold() {
        let mut rng = WyRng::seed_from_u64(1);
        let mut neat = neat(10, &mut rng);
        let species = neat.species.len();

        let close = neat.species[0].representative().clone();
        assert_eq!(neat.classify_genome(close), 0);
        assert_eq!(neat.species.len(), species);

        let mut far = neat.species[0].representative().clone();
        for node in far.nodes.iter_mut() {
            node.bias = 50.;
        }
        assert_eq!(neat.classify_genome(far), species);
        assert_eq!(neat.species.len(), species + 1);
    }

    #[test]
    fn test_classify_every_genome_within_threshold_of_its_specie() {
        let mut rng = WyRng::seed_from_u64(2);
        let neat = neat(60, &mut rng);
        for specie in neat.species.iter() {
            for member in specie.members.iter() {
                assert!(
                    genomic_distance(member, specie.representative(), &neat.settings.distance_weights)
                        <= neat.settings.delta_genome_threshold
                );
            }
        }
    }

    test_t!(
    population_conserved[T: WyRng | StdRng]() {
        let mut rng = T::seed_from_u64(3);
        let mut neat = neat(40, &mut rng);
        for _ in 0..15 {
            score_all(&mut neat, &mut rng);
            neat.evolve(&mut rng);
            assert_eq!(neat.current_population(), 40);
            assert!(neat.species.iter().all(|s| !s.is_empty()));
            for genome in neat.species.iter().flat_map(|s| s.members.iter()) {
                assert!(genome.is_acyclic());
            }
        }
        assert_eq!(neat.generation, 15);
    });

    #[test]
    fn test_zero_fitness_mutates_everyone() {
        let mut rng = WyRng::seed_from_u64(4);
        let mut neat = neat(20, &mut rng);
        let sizes = neat.species.iter().map(Specie::len).collect::<Vec<_>>();
        neat.evolve(&mut rng);
        assert_eq!(neat.species.iter().map(Specie::len).collect::<Vec<_>>(), sizes);
        assert_eq!(neat.generation, 1);
    }

    #[test]
    fn test_update_best_keeps_fittest_seen() {
        let mut rng = WyRng::seed_from_u64(5);
        let mut neat = neat(10, &mut rng);
        neat.species[0].members[0].fitness = 9.;
        neat.update_best();
        assert_eq!(neat.best_genome.as_ref().unwrap().fitness, 9.);

        neat.species[0].members[0].fitness = 1.;
        neat.update_best();
        assert_eq!(neat.best_genome.as_ref().unwrap().fitness, 9.);
    }

    #[test]
    fn test_should_evolve() {
        let mut rng = WyRng::seed_from_u64(6);
        let mut neat = neat(10, &mut rng);
        assert!(neat.should_evolve());

        neat.settings.max_generations = 3;
        neat.generation = 2;
        assert!(neat.should_evolve());
        neat.generation = 3;
        assert!(!neat.should_evolve());

        neat.settings.max_generations = 0;
        neat.settings.max_fitness = 5.;
        assert!(neat.should_evolve());
        neat.species[0].members[0].fitness = 5.;
        assert!(!neat.should_evolve());
    }

    #[test]
    fn test_next_genome_walks_population() {
        let mut rng = WyRng::seed_from_u64(7);
        let mut neat = neat(12, &mut rng);
        let mut seen = 0;
        while neat.generation == 0 {
            assert!(neat.current_genome < neat.species[neat.current_species].len());
            neat.genome_mut().fitness = 1.;
            seen += 1;
            neat.next_genome(&mut rng);
        }
        assert_eq!(seen, 12);
        assert_eq!((neat.current_species, neat.current_genome), (0, 0));
        assert_eq!(neat.current_population(), 12);
    }

    #[test]
    fn test_info() {
        let mut rng = WyRng::seed_from_u64(8);
        let mut neat = neat(5, &mut rng);
        neat.genome_mut().fitness = 2.5;
        assert_eq!(
            neat.info(),
            NeatInfo {
                generation: 1,
                current_species: 1,
                current_genome: 1,
                fitness: 2.5,
            }
        );
    }

    #[test]
    fn test_should_save() {
        let mut neat = Neat::default();
        neat.settings.save_intervals = vec![2, 5];
        assert!(!neat.should_save());
        neat.generation = 5;
        assert!(neat.should_save());
    }

    #[test]
    fn test_best_specie() {
        let mut rng = WyRng::seed_from_u64(9);
        let mut neat = neat(10, &mut rng);
        let far = {
            let mut g = neat.species[0].representative().clone();
            g.nodes.iter_mut().for_each(|n| n.bias = 50.);
            g
        };
        let idx = neat.classify_genome(far);
        neat.species[idx].fitness_mean = 100.;
        assert_eq!(neat.best_specie().unwrap().fitness_mean, 100.);
    }

    #[test]
    fn test_save_load() {
        let mut rng = WyRng::seed_from_u64(10);
        let mut neat = neat(30, &mut rng);
        for _ in 0..3 {
            score_all(&mut neat, &mut rng);
            neat.evolve(&mut rng);
        }
        score_all(&mut neat, &mut rng);
        neat.update_best();

        let identifier = temp_dir().join("neat4-population-round-trip");
        neat.save(&identifier).unwrap();
        let path = temp_dir().join("neat4-population-round-trip.neat");
        assert!(path.exists());

        let loaded = Neat::load(&identifier).unwrap();
        assert_eq!(loaded.generation, neat.generation);
        assert_eq!(
            loaded.species.iter().map(Specie::len).collect::<Vec<_>>(),
            neat.species.iter().map(Specie::len).collect::<Vec<_>>()
        );
        assert_eq!(
            loaded.best_genome.as_ref().map(|g| g.fitness),
            neat.best_genome.as_ref().map(|g| g.fitness)
        );
        assert_eq!(loaded, neat);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_missing() {
        let identifier = temp_dir().join("neat4-population-missing");
        assert!(matches!(Neat::load(identifier), Err(NeatError::NotFound(_))));
    }

    #[test]
    fn test_load_bad_representative() {
        let mut rng = WyRng::seed_from_u64(11);
        let neat = neat(10, &mut rng);
        let identifier = temp_dir().join("neat4-population-bad-representative");
        neat.save(&identifier).unwrap();
        let path = temp_dir().join("neat4-population-bad-representative.neat");

        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        value["species"][0]["representative"] = 77.into();
        fs::write(&path, ToString::to_string(&value)).unwrap();

        assert!(matches!(
            Neat::load(&identifier),
            Err(NeatError::Malformed { .. })
        ));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_bad_connection() {
        let mut rng = WyRng::seed_from_u64(12);
        let neat = neat(10, &mut rng);
        let identifier = temp_dir().join("neat4-population-bad-connection");
        neat.save(&identifier).unwrap();
        let path = temp_dir().join("neat4-population-bad-connection.neat");

        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        value["species"][0]["members"][0]["connections"][0]["to"] = 99.into();
        fs::write(&path, ToString::to_string(&value)).unwrap();

        assert!(matches!(
            Neat::load(&identifier),
            Err(NeatError::Malformed { .. })
        ));
        fs::remove_file(path).unwrap();
    }
}
