use cohort::engine::{Analysis, Method, Outcome};
use cohort::metrics::silhouette_score;
use cohort::{FeatureMatrixBuilder, Table, Value};
use rand::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=cohort=debug shows per-iteration progress.
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let table = lifestyle_table(60, 7)?;
    let features = ["Sleep Duration", "Quality of Sleep", "Stress Level"];

    let summary = table.describe(&features)?;
    for column in &summary {
        println!(
            "{:<18} n={:<3} mean={:.2} std={:.2}",
            column.name,
            column.count,
            column.mean.unwrap_or(f64::NAN),
            column.std.unwrap_or(f64::NAN),
        );
    }

    let matrix = FeatureMatrixBuilder::new(features).build(&table)?;
    println!("\n{} complete rows of {}", matrix.n_rows(), table.n_rows());

    for name in ["K-means", "EM (Gaussian Mixture)", "DBSCAN", "Hierarchical (SLINK)"] {
        let method: Method = name.parse()?;
        let outcome = method.fit(&matrix)?;
        let Some(assignment) = outcome.assignment() else {
            continue;
        };

        let silhouette = silhouette_score(&matrix, assignment)
            .map(|s| format!("{s:.3}"))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "{name:<22} clusters={} noise={} silhouette={silhouette}",
            assignment.n_clusters(),
            assignment.n_noise(),
        );
        for (label, size) in assignment.sizes() {
            println!("    cluster {label}: {size} rows");
        }
        if let Some(warning) = outcome.warning() {
            println!("    warning: {warning}");
        }
    }

    let fitted = Analysis::regression("Stress Level", "Sleep Duration").fit(&table)?;
    if let Outcome::Regression(fit) = &fitted.outcome {
        println!(
            "\nSleep Duration = {:.3} * Stress Level + {:.3}  (R² = {:.3}, n = {})",
            fit.model.slope, fit.model.intercept, fit.r_squared, fit.n
        );
    }

    Ok(())
}

/// Three synthetic lifestyle profiles with a few unanswered survey fields.
fn lifestyle_table(n: usize, seed: u64) -> cohort::Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let profiles = [
        ("Nurse", 6.1, 5.5, 8.0),
        ("Engineer", 7.8, 8.0, 4.0),
        ("Lawyer", 7.1, 6.8, 5.8),
    ];

    let rows = (0..n)
        .map(|i| {
            let (occupation, sleep, quality, stress) = profiles[i % profiles.len()];
            let stress_cell = if i % 17 == 5 {
                Value::Missing
            } else {
                Value::from(stress + rng.random_range(-0.6..0.6))
            };
            vec![
                Value::from(i as i64 + 1),
                Value::from(occupation),
                Value::from(sleep + rng.random_range(-0.3..0.3)),
                Value::from(quality + rng.random_range(-0.5..0.5)),
                stress_cell,
            ]
        })
        .collect();

    Table::new(
        vec![
            "Person ID".into(),
            "Occupation".into(),
            "Sleep Duration".into(),
            "Quality of Sleep".into(),
            "Stress Level".into(),
        ],
        rows,
    )
}
