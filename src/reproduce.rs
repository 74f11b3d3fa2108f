//! Culling and reproduction at the population scale.

use crate::{
    constants::CLONE_BEST_EVERY,
    crossover::genomic_crossover,
    genome::Genome,
    population::Neat,
    random::Weighted,
    settings::{Breed, Crossover},
    specie::Specie,
};
use rand::{seq::IndexedRandom, Rng};
use tracing::debug;

impl Neat {
    /// Produce one child from the specie at `specie_key`. Asexual breeding clones and mutates a
    /// random member. Sexual breeding crosses two members of the specie, or one of it with one of
    /// another specie, and falls back to asexual breeding when there is no second parent
    pub fn breed(&self, specie_key: usize, rng: &mut impl Rng) -> Genome {
        let probabilities = &self.settings.breed_probabilities;
        let breed = probabilities.breed.pick(rng).unwrap_or(Breed::Asexual);
        let crossover = probabilities
            .crossover
            .pick(rng)
            .unwrap_or(Crossover::Intraspecies);
        let members = &self.species[specie_key].members;

        let parents = match (breed, crossover) {
            (Breed::Asexual, _) => None,
            (Breed::Sexual, Crossover::Interspecies) if self.species.len() > 1 => {
                let other = rng.random_range(0..self.species.len() - 1);
                let other = if other >= specie_key { other + 1 } else { other };
                members
                    .choose(rng)
                    .zip(self.species[other].members.choose(rng))
            }
            (Breed::Sexual, _) => {
                let mut pair = members.choose_multiple(rng, 2);
                pair.next().zip(pair.next())
            }
        };

        match parents {
            Some((x, y)) => genomic_crossover(x, y),
            None => {
                let mut child = members
                    .choose(rng)
                    .cloned()
                    .unwrap_or_else(|| self.fresh_genome(rng));
                child.mutate(
                    &self.settings.mutation_probabilities,
                    &self.settings.node_info,
                    rng,
                );
                child
            }
        }
    }

    /// Drop stagnant species, then cull every survivor. Near-duplicates are purged every
    /// `remove_duplicate_interval` generations
    pub fn kill_population(&mut self) {
        let interval = self.settings.remove_duplicate_interval;
        let remove_duplicate = interval > 0 && self.generation % interval == 0;

        let before = self.species.len();
        self.species.retain(Specie::should_survive);
        for specie in self.species.iter_mut() {
            specie.kill_genomes(remove_duplicate, self.settings.elitism, &self.settings);
        }
        self.species.retain(|specie| !specie.is_empty());

        if self.species.len() < before {
            debug!(
                extinct = before - self.species.len(),
                remaining = self.species.len(),
                "species went extinct"
            );
        }
    }

    /// Refill the population up to its target size. Each specie breeds offspring in proportion
    /// to its share of `fitness_sum`, and whatever shortfall remains is filled with mutated
    /// copies of the best genome (every [CLONE_BEST_EVERY]th) or mutated fresh genomes
    pub fn repopulate(&mut self, fitness_sum: f64, rng: &mut impl Rng) {
        let shortfall = self.population.saturating_sub(self.current_population());

        if fitness_sum > 0. {
            for specie_key in 0..self.species.len() {
                let share = self.species[specie_key].fitness_mean / fitness_sum;
                let offspring = (share * shortfall as f64).round().max(0.) as usize;
                let offspring =
                    offspring.min(self.population.saturating_sub(self.current_population()));
                for _ in 0..offspring {
                    let child = self.breed(specie_key, rng);
                    self.classify_genome(child);
                }
            }
        }

        let remaining = self.population.saturating_sub(self.current_population());
        if remaining > 0 {
            debug!(remaining, "topping up population");
        }
        for p in 0..remaining {
            let mut genome = match &self.best_genome {
                Some(best) if p % CLONE_BEST_EVERY == 0 => best.clone(),
                _ => self.fresh_genome(rng),
            };
            genome.mutate(
                &self.settings.mutation_probabilities,
                &self.settings.node_info,
                rng,
            );
            self.classify_genome(genome);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        genome::Mutation,
        random::WyRng,
        settings::{
            BreedModes, BreedProbabilities, CrossoverProbabilities, MutationProbabilities,
            NodeInfo, Settings,
        },
        test_t,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn neat_with(settings: Settings, population: usize, rng: &mut impl Rng) -> Neat {
        let mut neat = Neat::new(settings);
        neat.generate(2, 1, population, rng);
        neat
    }

    fn breeding(asexual: f64, sexual: f64, interspecies: f64, intraspecies: f64) -> Settings {
        Settings {
            breed_probabilities: BreedProbabilities {
                crossover: CrossoverProbabilities {
                    interspecies,
                    intraspecies,
                },
                breed: BreedModes { asexual, sexual },
            },
            ..Settings::default()
        }
    }

    test_t!(
    breed_shapes[T: WyRng | StdRng]() {
        let mut rng = T::seed_from_u64(0);
        for settings in [
            breeding(1., 0., 0., 1.),
            breeding(0., 1., 0., 1.),
            breeding(0., 1., 1., 0.),
        ] {
            let neat = neat_with(settings, 20, &mut rng);
            for key in 0..neat.species.len() {
                for _ in 0..20 {
                    let child = neat.breed(key, &mut rng);
                    assert_eq!(child.inputs, 2);
                    assert_eq!(child.outputs, 1);
                    assert_eq!(child.fitness, 0.);
                    assert!(child.is_acyclic());
                }
            }
        }
    });

    /// A specie of two identical genomes, every weight `weight` and every bias `bias`
    fn uniform_specie(weight: f64, bias: f64, rng: &mut impl Rng) -> Specie {
        let mut genome = Genome::new(2, 1, &NodeInfo::default(), rng);
        genome.connections.values_mut().for_each(|c| c.weight = weight);
        genome.nodes.iter_mut().for_each(|n| n.bias = bias);
        let mut specie = Specie::new(30, genome.clone());
        specie.members.push(genome);
        specie
    }

    #[test]
    fn test_breed_interspecies_takes_other_specie() {
        let mut rng = WyRng::seed_from_u64(6);
        let mut neat = Neat::new(breeding(0., 1., 1., 0.));
        neat.inputs = 2;
        neat.outputs = 1;
        neat.species = vec![
            uniform_specie(0.25, 0., &mut rng),
            uniform_specie(-0.75, 50., &mut rng),
        ];

        for _ in 0..20 {
            let child = neat.breed(0, &mut rng);
            assert!(child.nodes.iter().all(|n| n.bias == 0.));
            assert!(child.connections.values().all(|c| c.weight == -0.75));

            let child = neat.breed(1, &mut rng);
            assert!(child.nodes.iter().all(|n| n.bias == 50.));
            assert!(child.connections.values().all(|c| c.weight == 0.25));
        }
    }

    #[test]
    fn test_breed_interspecies_alone_stays_intraspecies() {
        let mut rng = WyRng::seed_from_u64(7);
        let mut settings = breeding(0., 1., 1., 0.);
        settings.mutation_probabilities = MutationProbabilities::only(Mutation::NodeBiasSet);
        let mut neat = Neat::new(settings);
        neat.inputs = 2;
        neat.outputs = 1;
        neat.species = vec![uniform_specie(0.25, 7., &mut rng)];

        // crossover of identical parents reproduces them, a mutated clone would not
        for _ in 0..20 {
            let child = neat.breed(0, &mut rng);
            assert!(child.nodes.iter().all(|n| n.bias == 7.));
            assert!(child.connections.values().all(|c| c.weight == 0.25));
            assert_eq!(child.total_connections(), 2);
        }
    }

    #[test]
    fn test_breed_single_member_falls_back_to_clone() {
        let mut rng = WyRng::seed_from_u64(1);
        let mut neat = neat_with(breeding(0., 1., 0., 1.), 1, &mut rng);
        assert_eq!(neat.species.len(), 1);
        neat.species[0].members[0].fitness = 4.;
        let child = neat.breed(0, &mut rng);
        assert_eq!(child.fitness, 0.);
        assert_eq!(child.inputs, 2);
    }

    #[test]
    fn test_kill_population_drops_stagnant() {
        let mut rng = WyRng::seed_from_u64(2);
        let settings = Settings {
            max_fitness_history: 2,
            ..Settings::default()
        };
        let mut neat = neat_with(settings, 10, &mut rng);
        for specie in neat.species.iter_mut() {
            specie.fitness_history.extend([1., 1.]);
        }
        neat.kill_population();
        assert!(neat.species.is_empty());
    }

    #[test]
    fn test_kill_population_culls() {
        let mut rng = WyRng::seed_from_u64(3);
        let settings = Settings {
            kill: 0.5,
            remove_duplicate_interval: 0,
            ..Settings::default()
        };
        let mut neat = neat_with(settings, 10, &mut rng);
        let expected = neat
            .species
            .iter()
            .map(|s| (s.len() as f64 * 0.5).ceil() as usize)
            .sum::<usize>();
        neat.kill_population();
        assert_eq!(neat.current_population(), expected);
    }

    #[test]
    fn test_repopulate_fills_exactly() {
        let mut rng = WyRng::seed_from_u64(4);
        let mut neat = neat_with(Settings::default(), 30, &mut rng);
        for (i, member) in neat
            .species
            .iter_mut()
            .flat_map(|s| s.members.iter_mut())
            .enumerate()
        {
            member.fitness = i as f64;
        }
        let mut fitness_sum = 0.;
        for specie in neat.species.iter_mut() {
            specie.update_fitness();
            fitness_sum += specie.fitness_mean;
        }
        neat.kill_population();
        assert!(neat.current_population() < 30);
        neat.repopulate(fitness_sum, &mut rng);
        assert_eq!(neat.current_population(), 30);
    }

    #[test]
    fn test_repopulate_from_nothing() {
        let mut rng = WyRng::seed_from_u64(5);
        let mut neat = neat_with(Settings::default(), 12, &mut rng);
        neat.species.clear();
        neat.repopulate(1., &mut rng);
        assert_eq!(neat.current_population(), 12);
        assert!(!neat.species.is_empty());
    }
}
