use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::db::models::{Domain, Question};
use crate::db::types::DifficultyLevel;
use crate::services::blueprint::{
    adaptive_weight_multiplier, difficulty_profile_for, DifficultyProfile, PROFILE_MIXED,
};
use crate::services::performance::{performance_or_empty, DomainPerformance};

/// A domain together with its full question pool, fetched once per allocation.
#[derive(Debug, Clone)]
pub(crate) struct DomainPool {
    pub(crate) domain: Domain,
    pub(crate) questions: Vec<Question>,
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum AllocationError {
    #[error("domain '{domain}' has {available} questions but {requested} are required")]
    DomainShortage { domain: String, requested: usize, available: usize },
    #[error("question catalog has no domains")]
    NoDomains,
}

/// Configured weights, optionally adjusted by historical accuracy and always
/// renormalized to sum to 1. Domains below the sample floor keep their
/// configured weight before renormalization.
pub(crate) fn effective_weights(
    domains: &[Domain],
    performance: &HashMap<String, DomainPerformance>,
    adaptive: bool,
) -> Vec<f64> {
    let mut weights: Vec<f64> = domains
        .iter()
        .map(|domain| {
            let perf = performance_or_empty(performance, &domain.name);
            if adaptive && perf.sufficient_data {
                domain.weight * adaptive_weight_multiplier(perf.accuracy)
            } else {
                domain.weight
            }
        })
        .collect();

    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        for weight in &mut weights {
            *weight /= sum;
        }
    }
    weights
}

/// floor(total * weight) per domain; the entire flooring remainder goes to the
/// single largest-weight domain (ties broken by name), never redistributed.
pub(crate) fn distribute_counts(total: u32, domains: &[Domain], weights: &[f64]) -> Vec<usize> {
    let mut counts: Vec<usize> =
        weights.iter().map(|weight| (total as f64 * weight).floor() as usize).collect();

    let assigned: usize = counts.iter().sum();
    let remainder = (total as usize).saturating_sub(assigned);

    if remainder > 0 && !domains.is_empty() {
        let heaviest = (0..domains.len())
            .max_by(|&a, &b| {
                weights[a]
                    .partial_cmp(&weights[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| domains[b].name.cmp(&domains[a].name))
            })
            .unwrap_or(0);
        counts[heaviest] += remainder;
    }

    counts
}

/// Uniform selection without replacement inside each difficulty band; short
/// bands take everything available and the shortfall is backfilled from the
/// domain's remaining pool regardless of difficulty.
pub(crate) fn select_for_domain(
    rng: &mut StdRng,
    pool: &DomainPool,
    count: usize,
    profile: &DifficultyProfile,
) -> Result<Vec<Question>, AllocationError> {
    if pool.questions.len() < count {
        return Err(AllocationError::DomainShortage {
            domain: pool.domain.name.clone(),
            requested: count,
            available: pool.questions.len(),
        });
    }

    let (easy_count, medium_count, hard_count) = profile.band_counts(count);
    let bands = [
        (DifficultyLevel::Easy, easy_count),
        (DifficultyLevel::Medium, medium_count),
        (DifficultyLevel::Hard, hard_count),
    ];

    let mut selected: Vec<Question> = Vec::with_capacity(count);
    let mut taken: HashSet<String> = HashSet::with_capacity(count);

    for (difficulty, wanted) in bands {
        let mut band: Vec<&Question> = pool
            .questions
            .iter()
            .filter(|question| question.effective_difficulty() == difficulty)
            .collect();
        band.shuffle(rng);
        for question in band.into_iter().take(wanted) {
            taken.insert(question.id.clone());
            selected.push(question.clone());
        }
    }

    if selected.len() < count {
        let mut rest: Vec<&Question> =
            pool.questions.iter().filter(|question| !taken.contains(&question.id)).collect();
        rest.shuffle(rng);
        for question in rest.into_iter().take(count - selected.len()) {
            selected.push(question.clone());
        }
    }

    selected.truncate(count);
    Ok(selected)
}

/// Full allocation: per-domain counts, per-domain stratified selection, then
/// one shuffle of the concatenated list. The returned order is the order the
/// candidate sees; question_index is assigned from it.
pub(crate) fn allocate(
    rng: &mut StdRng,
    total_questions: u32,
    pools: &[DomainPool],
    performance: &HashMap<String, DomainPerformance>,
    adaptive: bool,
) -> Result<Vec<Question>, AllocationError> {
    if pools.is_empty() {
        return Err(AllocationError::NoDomains);
    }

    let domains: Vec<Domain> = pools.iter().map(|pool| pool.domain.clone()).collect();
    let weights = effective_weights(&domains, performance, adaptive);
    let counts = distribute_counts(total_questions, &domains, &weights);

    let mut selected: Vec<Question> = Vec::with_capacity(total_questions as usize);
    for (pool, count) in pools.iter().zip(counts) {
        let perf = performance_or_empty(performance, &pool.domain.name);
        let profile = if adaptive {
            difficulty_profile_for(perf.accuracy, perf.attempts)
        } else {
            PROFILE_MIXED
        };
        let mut picked = select_for_domain(rng, pool, count, &profile)?;
        selected.append(&mut picked);
    }

    selected.shuffle(rng);
    Ok(selected)
}
