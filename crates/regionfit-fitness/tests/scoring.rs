//! End-to-end scoring with an in-process compiler double.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use regionfit_config::EngineConfig;
use regionfit_core::{Objective, SampleSet};
use regionfit_fitness::{
    Candidate, CandidateScorer, CandidateTemplate, Dataset, Distribution, EvaluationError,
    FitnessEvaluator, ReferenceSet, WORST_FITNESS,
};
use regionfit_model::{CompilationError, CompiledArtifacts, ConstraintModel, ModelCompiler};
use regionfit_oracle::HighsOracle;
use regionfit_test::data::STAIRCASE_MIXED_CSV;
use regionfit_test::lp::STAIRCASE_LP;
use regionfit_test::regions::staircase;
use regionfit_test::{infeasible_interval, FlakyOracle};

/// Treats its input as LP text: copies `<file>` to `<file>.lp`.
#[derive(Debug, Default)]
struct LpPassthrough {
    calls: AtomicUsize,
}

impl ModelCompiler for LpPassthrough {
    fn compile(&self, source: &Path) -> Result<CompiledArtifacts, CompilationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = fs::read_to_string(source)
            .map_err(|e| CompilationError::new(source, None, e.to_string()))?;
        if text.contains("syntax error") {
            return Err(CompilationError::new(source, Some(1), "Error 800: syntax error"));
        }
        let lp = source.with_extension("lp");
        fs::write(&lp, text).map_err(|e| CompilationError::new(source, None, e.to_string()))?;
        Ok(CompiledArtifacts::new(source, lp))
    }
}

const GROUND_TRUTH: &str = "\\ staircase
Minimize
 obj: 0 x + 0 y
Subject To
\\ ### END OF TEMPLATE ###
 name_seq: x + y <= 3
Bounds
 0 <= x <= 9
 0 <= y <= 9
Generals
 x y
End
";

const TAIL: &str = "Bounds
 0 <= x <= 9
 0 <= y <= 9
Generals
 x y
End
";

const FEASIBLE_CSV: &str = "x,y
0,0
0,1
0,2
0,3
1,0
1,1
1,2
";

fn phenotype(constraints: &str) -> String {
    format!("\n{constraints}{TAIL}")
}

fn scorer() -> CandidateScorer<HighsOracle, LpPassthrough> {
    let config = EngineConfig::default().with_random_seed(5);
    let dataset = Dataset::new(
        ReferenceSet::from_csv_str(FEASIBLE_CSV).unwrap(),
        ReferenceSet::from_csv_str(STAIRCASE_MIXED_CSV).unwrap(),
    );
    CandidateScorer::new(
        FitnessEvaluator::new(HighsOracle::default(), &config),
        LpPassthrough::default(),
        CandidateTemplate::from_ground_truth(GROUND_TRUTH),
        dataset,
    )
}

#[test]
fn staircase_recall_is_seven_tenths() {
    let reference = ReferenceSet::from_csv_str(STAIRCASE_MIXED_CSV).unwrap();
    let evaluator = FitnessEvaluator::new(HighsOracle::default(), &EngineConfig::default());

    let mut from_region = ConstraintModel::new(staircase(3.0), Objective::zero(2)).unwrap();
    let recall = evaluator.recall(&reference, &mut from_region).unwrap();
    assert!((recall - 0.7).abs() < 1e-12, "{recall}");

    let mut from_lp = ConstraintModel::from_lp_str(STAIRCASE_LP, None).unwrap();
    let recall = evaluator.recall(&reference, &mut from_lp).unwrap();
    assert!((recall - 0.7).abs() < 1e-12, "{recall}");
}

#[test]
fn infeasible_candidate_has_zero_fitness() {
    let reference = ReferenceSet::from_csv_str("x\n0\n1\n").unwrap();
    let mut model = ConstraintModel::new(infeasible_interval(), Objective::zero(1)).unwrap();
    let evaluator = FitnessEvaluator::new(HighsOracle::default(), &EngineConfig::default());
    assert_eq!(evaluator.fitness(&reference, &mut model, 40).unwrap(), 0.0);
}

#[test]
fn oracle_failure_propagates_from_evaluator() {
    // Auxiliary-free models never reach the oracle for recall, so force the
    // precision sample through it.
    let reference = ReferenceSet::from_csv_str(FEASIBLE_CSV).unwrap();
    let mut model = ConstraintModel::new(staircase(3.0), Objective::zero(2)).unwrap();
    let before = model.region().clone();
    let evaluator = FitnessEvaluator::new(
        FlakyOracle::new(HighsOracle::default(), 0),
        &EngineConfig::default(),
    );
    let err = evaluator.fitness(&reference, &mut model, 10).unwrap_err();
    assert!(matches!(err, EvaluationError::Sampling(_)));
    assert_eq!(model.region(), &before);
}

#[test]
fn ground_truth_scores_above_zero() {
    let scorer = scorer();
    let training = scorer.ground_truth_fitness(Distribution::Training).unwrap();
    assert!(training > 0.0 && training <= 1.0, "{training}");

    // Three of the ten test rows lie outside the staircase.
    let test = scorer.ground_truth_fitness(Distribution::Test).unwrap();
    assert!(test > 0.0 && test < 1.0, "{test}");
}

#[test]
fn candidate_outcomes_are_recorded() {
    let scorer = scorer();

    let mut good = Candidate::new(phenotype(" name_seq: x + y <= 3\n"));
    let fitness = scorer.score(&mut good, Distribution::Training);
    assert!(fitness > 0.0);
    assert_eq!(good.fitness, Some(fitness));
    assert!(!good.invalid && !good.runtime_error);

    let mut missing = Candidate::without_phenotype();
    assert_eq!(scorer.score(&mut missing, Distribution::Training), WORST_FITNESS);
    assert!(missing.invalid);
    assert!(!missing.runtime_error);

    let mut broken = Candidate::new(phenotype(" syntax error\n"));
    assert_eq!(scorer.score(&mut broken, Distribution::Training), WORST_FITNESS);
    assert!(broken.runtime_error);
    assert!(!broken.invalid);

    let mut empty_region = Candidate::new(phenotype(" name_seq: x + y <= -1\n"));
    assert_eq!(scorer.score(&mut empty_region, Distribution::Training), WORST_FITNESS);
    assert!(!empty_region.invalid && !empty_region.runtime_error);
}

#[test]
fn placeholders_are_numbered_in_compiled_source() {
    let scorer = scorer();
    let program = scorer
        .template()
        .merge(&phenotype(" name_seq: x <= 2\n name_seq: y <= 2\n"));
    assert!(program.contains("constraint1: x <= 2"));
    assert!(program.contains("constraint2: y <= 2"));
    assert!(!program.contains("name_seq"));
    assert!(scorer.evaluate_source(&program, Distribution::Training).unwrap() > 0.0);
}

#[test]
fn population_scores_keep_order() {
    let scorer = scorer();
    let mut population = vec![
        Candidate::new(phenotype(" name_seq: x + y <= 3\n")),
        Candidate::without_phenotype(),
        Candidate::new(phenotype(" syntax error\n")),
        Candidate::new(phenotype(" name_seq: x + y <= 18\n")),
    ];

    let scores = scorer.score_population(&mut population, Distribution::Training);
    assert_eq!(scores.len(), 4);
    assert!(scores[0] > 0.0);
    assert_eq!(scores[1], WORST_FITNESS);
    assert_eq!(scores[2], WORST_FITNESS);
    assert!(!population[3].invalid && !population[3].runtime_error);
    for (candidate, score) in population.iter().zip(&scores) {
        assert_eq!(candidate.fitness, Some(*score));
    }
    assert!(population[1].invalid);
    assert!(population[2].runtime_error);
}

#[test]
fn labelled_rows_feed_the_confusion_matrix() {
    let labelled = SampleSet::from_csv_str("x,y,class\n0,0,true\n3,3,false\n2,2,true\n").unwrap();
    let mut model = ConstraintModel::new(staircase(3.0), Objective::zero(2)).unwrap();
    let evaluator = FitnessEvaluator::new(HighsOracle::default(), &EngineConfig::default());
    let matrix = evaluator.confusion_matrix(&labelled, &mut model).unwrap();
    assert_eq!(matrix.true_positives, 1);
    assert_eq!(matrix.true_negatives, 1);
    assert_eq!(matrix.false_negatives, 1);
    assert_eq!(matrix.false_positives, 0);
}
