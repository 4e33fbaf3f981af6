//! Subcommand bodies. Results go to stdout; logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regionfit::fitness::{ConfusionMatrix, CLASS_COLUMN};
use regionfit::{
    Candidate, CandidateScorer, ConstraintModel, Distribution, EngineConfig, SampleSet,
    SamplerPolicy, Session, SolverOracle, ZimplCompiler,
};
use serde_json::json;

use crate::ModelArgs;

fn load_model<O: SolverOracle + Clone>(
    session: &Session<O>,
    args: &ModelArgs,
) -> Result<ConstraintModel> {
    session
        .load_model(&args.model, args.declared.as_deref())
        .with_context(|| format!("Failed to load model {:?}", args.model))
}

fn rows_json(set: &SampleSet) -> serde_json::Value {
    json!({
        "columns": set.columns(),
        "rows": set.rows(),
    })
}

pub fn sample<O: SolverOracle + Clone>(
    session: &Session<O>,
    args: &ModelArgs,
    count: usize,
    output: Option<&Path>,
    as_json: bool,
) -> Result<()> {
    let mut model = load_model(session, args)?;
    let sampler = session.evaluator().sampler_for(&model);
    let points = match sampler {
        SamplerPolicy::HitAndRun => session
            .hit_and_run()
            .sample_default(&mut model, count, None)?,
        _ => session.branch_and_cut().sample_default(&mut model, count)?,
    };

    if let Some(path) = output {
        fs::write(path, points.to_csv_string())
            .with_context(|| format!("Failed to write {:?}", path))?;
    }
    if as_json {
        println!(
            "{}",
            json!({
                "sampler": format!("{sampler:?}"),
                "requested": count,
                "returned": points.len(),
                "points": rows_json(&points),
            })
        );
    } else if output.is_none() {
        print!("{}", points.to_csv_string());
    } else {
        println!("{} of {} points written", points.len(), count);
    }
    Ok(())
}

pub fn generate<O: SolverOracle + Clone>(
    session: &Session<O>,
    args: &ModelArgs,
    count: usize,
    positive_only: bool,
    labelled: bool,
    output: Option<&Path>,
    as_json: bool,
) -> Result<()> {
    let mut model = load_model(session, args)?;
    let rows = session
        .generator()
        .generate(&mut model, count, positive_only, labelled, None)?;

    if let Some(path) = output {
        fs::write(path, rows.to_csv_string())
            .with_context(|| format!("Failed to write {:?}", path))?;
    }
    if as_json {
        println!(
            "{}",
            json!({
                "requested": count,
                "returned": rows.len(),
                "positive_only": positive_only,
                "rows": rows_json(&rows),
            })
        );
    } else if output.is_none() {
        print!("{}", rows.to_csv_string());
    } else {
        println!("{} of {} rows written", rows.len(), count);
    }
    Ok(())
}

pub fn volume<O: SolverOracle + Clone>(
    session: &Session<O>,
    args: &ModelArgs,
    as_json: bool,
) -> Result<()> {
    let mut model = load_model(session, args)?;
    let estimate = session.volume().estimate(&mut model)?;
    if as_json {
        println!(
            "{}",
            json!({
                "probability": estimate.probability,
                "method": estimate.method.to_string(),
            })
        );
    } else {
        println!("{}\t{}", estimate.probability, estimate.method);
    }
    Ok(())
}

pub fn check<O: SolverOracle + Clone>(
    session: &Session<O>,
    args: &ModelArgs,
    data: &Path,
    as_json: bool,
) -> Result<()> {
    let mut model = load_model(session, args)?;
    let text = fs::read_to_string(data).with_context(|| format!("Failed to read {:?}", data))?;
    let table = SampleSet::from_csv_str(&text).with_context(|| format!("Malformed table {:?}", data))?;
    let (points, labels) = table.split_column(CLASS_COLUMN);
    let verdicts = session.feasibility().is_satisfied(&mut model, &points)?;
    let accepted = verdicts.iter().filter(|&&ok| ok).count();
    let matrix = labels
        .as_deref()
        .map(|labels| ConfusionMatrix::from_verdicts(Some(labels), &verdicts));

    if as_json {
        let mut report = json!({
            "rows": verdicts.len(),
            "accepted": accepted,
            "verdicts": verdicts,
        });
        if let Some(m) = matrix {
            report["confusion"] = json!({
                "true_positives": m.true_positives,
                "false_positives": m.false_positives,
                "true_negatives": m.true_negatives,
                "false_negatives": m.false_negatives,
            });
        }
        println!("{report}");
    } else {
        for verdict in &verdicts {
            println!("{verdict}");
        }
        println!("# {accepted}/{} rows accepted", verdicts.len());
        if let Some(m) = matrix {
            println!(
                "# tp={} fp={} tn={} fn={}",
                m.true_positives, m.false_positives, m.true_negatives, m.false_negatives
            );
        }
    }
    Ok(())
}

pub fn score<O: SolverOracle>(
    scorer: &CandidateScorer<O, ZimplCompiler>,
    phenotypes: &[PathBuf],
    distribution: Distribution,
    as_json: bool,
) -> Result<()> {
    let results: Vec<(String, Candidate)> = if phenotypes.is_empty() {
        let fitness = scorer
            .ground_truth_fitness(distribution)
            .context("Failed to score the ground truth")?;
        let candidate = Candidate {
            fitness: Some(fitness),
            ..Candidate::new(scorer.template().ground_truth())
        };
        vec![("ground-truth".to_string(), candidate)]
    } else {
        let mut candidates = phenotypes
            .iter()
            .map(|path| {
                fs::read_to_string(path)
                    .map(Candidate::new)
                    .with_context(|| format!("Failed to read phenotype {:?}", path))
            })
            .collect::<Result<Vec<_>>>()?;
        scorer.score_population(&mut candidates, distribution);
        phenotypes
            .iter()
            .map(|p| p.display().to_string())
            .zip(candidates)
            .collect()
    };

    if as_json {
        let report: Vec<_> = results
            .iter()
            .map(|(name, c)| {
                json!({
                    "candidate": name,
                    "fitness": c.fitness,
                    "invalid": c.invalid,
                    "runtime_error": c.runtime_error,
                })
            })
            .collect();
        println!("{}", json!({ "distribution": distribution.to_string(), "scores": report }));
    } else {
        for (name, c) in &results {
            let flag = if c.runtime_error {
                "\truntime_error"
            } else if c.invalid {
                "\tinvalid"
            } else {
                ""
            };
            println!("{}\t{}{}", c.fitness.unwrap_or_default(), name, flag);
        }
    }
    Ok(())
}

pub fn example_config(yaml: bool) -> Result<()> {
    let config = EngineConfig::default();
    let text = if yaml {
        config.to_yaml_string()?
    } else {
        config.to_toml_string()?
    };
    print!("{text}");
    Ok(())
}
