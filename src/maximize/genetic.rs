//! Genetic algorithm over real-valued chromosomes.
//!
//! Each generation breeds `population_size` children by one-point crossover
//! (the first half of the genes comes from a second, distinct parent),
//! re-randomizes a few members, adds fresh random spawns, and keeps the
//! `population_size` fittest.

use rand::{Rng, RngCore};

use super::traits::{Maximizer, Maximum};
use super::util::{format_arguments, random_arguments, CONVERGENCE_TOLERANCE};
use crate::error::{Error, Result};
use crate::monitor::Monitor;
use crate::objective::{MonitoredObjective, Objective};

/// Genetic algorithm maximizer.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneticAlgorithm {
    population_size: usize,
    max_generations: usize,
    mutations_per_gen: usize,
    spawns_per_gen: usize,
    converge_at_max_equals: bool,
    max_equals: usize,
}

impl GeneticAlgorithm {
    /// Defaults: population 20, 30 generations, 5 mutations and 10 spawns
    /// per generation, stall detection off with `max_equals = 5`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_max_generations(mut self, max_generations: usize) -> Self {
        self.max_generations = max_generations;
        self
    }

    pub fn with_mutations_per_gen(mut self, mutations: usize) -> Self {
        self.mutations_per_gen = mutations;
        self
    }

    pub fn with_spawns_per_gen(mut self, spawns: usize) -> Self {
        self.spawns_per_gen = spawns;
        self
    }

    /// Stop once the fittest chromosome is unchanged for `max_equals` generations.
    pub fn with_converge_at_max_equals(mut self, enabled: bool) -> Self {
        self.converge_at_max_equals = enabled;
        self
    }

    pub fn with_max_equals(mut self, max_equals: usize) -> Self {
        self.max_equals = max_equals;
        self
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn max_generations(&self) -> usize {
        self.max_generations
    }

    pub fn mutations_per_gen(&self) -> usize {
        self.mutations_per_gen
    }

    pub fn spawns_per_gen(&self) -> usize {
        self.spawns_per_gen
    }

    pub fn converge_at_max_equals(&self) -> bool {
        self.converge_at_max_equals
    }

    pub fn max_equals(&self) -> usize {
        self.max_equals
    }
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self {
            population_size: 20,
            max_generations: 30,
            mutations_per_gen: 5,
            spawns_per_gen: 10,
            converge_at_max_equals: false,
            max_equals: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Chromosome {
    genes: Vec<f64>,
    score: f64,
}

impl Chromosome {
    fn random<F: Objective>(
        n: usize,
        f: &mut MonitoredObjective<'_, F>,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        let genes = random_arguments(n, 1.0, rng);
        let score = f.evaluate(&genes)?;
        Ok(Self { genes, score })
    }

    /// Clone of `self` with the first half of the genes taken from `mate`.
    fn crossover<F: Objective>(
        &self,
        mate: &Self,
        f: &mut MonitoredObjective<'_, F>,
    ) -> Result<Self> {
        let mut genes = self.genes.clone();
        let half = genes.len() / 2;
        genes[..half].copy_from_slice(&mate.genes[..half]);
        let score = f.evaluate(&genes)?;
        Ok(Self { genes, score })
    }
}

fn sort_descending(population: &mut [Chromosome]) {
    population.sort_by(|a, b| b.score.total_cmp(&a.score));
}

impl Maximizer for GeneticAlgorithm {
    fn maximize(
        &self,
        function: &mut dyn Objective,
        monitor: &mut dyn Monitor,
        rng: &mut dyn RngCore,
    ) -> Result<Maximum> {
        let size = self.population_size;
        if size == 0 {
            return Err(Error::NoConvergence("population is empty".into()));
        }

        let mut f = MonitoredObjective::new(function, monitor);
        let n = f.argument_count();

        let mut population = Vec::with_capacity(2 * size + self.spawns_per_gen);
        for _ in 0..size {
            population.push(Chromosome::random(n, &mut f, rng)?);
        }
        sort_descending(&mut population);
        let mut fittest = population[0].clone();
        let mut equals = 0;
        let mut performed = 0;

        for generation in 1..=self.max_generations {
            f.begin_iteration(generation)?;
            performed = generation;

            for _ in 0..size {
                let father = rng.random_range(0..size);
                let mut mother = rng.random_range(0..size);
                let mut attempts = 0;
                while population[father] == population[mother] && attempts < size {
                    mother = rng.random_range(0..size);
                    attempts += 1;
                }
                let child = if population[father] == population[mother] {
                    Chromosome::random(n, &mut f, rng)?
                } else {
                    population[father].crossover(&population[mother], &mut f)?
                };
                population.push(child);
            }

            for _ in 0..self.mutations_per_gen {
                let victim = rng.random_range(0..size);
                population[victim] = Chromosome::random(n, &mut f, rng)?;
            }

            for _ in 0..self.spawns_per_gen {
                population.push(Chromosome::random(n, &mut f, rng)?);
            }

            sort_descending(&mut population);
            population.truncate(size);

            let previous = std::mem::replace(&mut fittest, population[0].clone());
            let unchanged = fittest == previous;
            let delta = fittest.score - previous.score;

            f.write_line(&format!(
                "(gen = {generation}) (fx = {:e}) (x = {{{}}}) (delta = {delta:e})",
                fittest.score,
                format_arguments(&fittest.genes)
            ));

            if unchanged {
                equals += 1;
            } else {
                equals = 0;
            }
            if (self.converge_at_max_equals && equals == self.max_equals)
                || (!unchanged && delta.abs() <= CONVERGENCE_TOLERANCE)
            {
                tracing::trace!(generation, "genetic algorithm converged");
                break;
            }
        }

        Ok(Maximum {
            arguments: fittest.genes,
            value: fittest.score,
            iterations: performed,
        })
    }
}
