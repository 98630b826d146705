//! Integration tests for the standard loss trio

use winnower::loss::{Direction, LossRegistry, Prediction};

fn preds(values: &[(f64, i32)]) -> Vec<Prediction> {
    values
        .iter()
        .map(|&(prob, label)| Prediction::new(prob, label, 1.0))
        .collect()
}

#[test]
fn test_standard_trio_scores_a_pool_consistently() {
    let registry = LossRegistry::standard();
    let pool = preds(&[(0.9, 1), (0.8, 1), (0.3, 0), (0.2, 0)]);

    let log_loss = registry.get("LogLoss").unwrap().compute(&pool);
    let auc = registry.get("AUC").unwrap().compute(&pool);
    let corrected = registry
        .get("LogLossCorrectedForDownSampling")
        .unwrap()
        .compute(&pool);

    // Well-separated pool: low log-loss, perfect AUC
    assert!(log_loss < 0.3, "got {}", log_loss);
    assert!((auc - 1.0).abs() < 0.01, "got {}", auc);
    assert!(corrected.is_finite());
}

#[test]
fn test_better_model_scores_better_under_every_standard_loss() {
    let registry = LossRegistry::standard();
    let sharp = preds(&[(0.95, 1), (0.9, 1), (0.1, 0), (0.05, 0)]);
    let fuzzy = preds(&[(0.6, 1), (0.55, 1), (0.45, 0), (0.4, 0)]);

    for (name, loss) in registry.iter() {
        let sharp_score = loss.compute(&sharp);
        let fuzzy_score = loss.compute(&fuzzy);
        match loss.direction() {
            Direction::Minimize => assert!(
                sharp_score <= fuzzy_score,
                "{}: sharper model should not score worse ({} vs {})",
                name,
                sharp_score,
                fuzzy_score
            ),
            Direction::Maximize => assert!(
                sharp_score >= fuzzy_score,
                "{}: sharper model should not score worse ({} vs {})",
                name,
                sharp_score,
                fuzzy_score
            ),
        }
    }
}

#[test]
fn test_degenerate_pools_stay_finite() {
    let registry = LossRegistry::standard();
    let pools: Vec<Vec<Prediction>> = vec![
        Vec::new(),
        preds(&[(0.7, 1)]),
        preds(&[(0.0, 1), (1.0, 0)]),
    ];

    for pool in &pools {
        for (name, loss) in registry.iter() {
            let value = loss.compute(pool);
            assert!(value.is_finite(), "{} must stay finite, got {}", name, value);
        }
    }
}
