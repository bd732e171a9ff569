use approx::relative_eq;
use prevalence_recalibrator::adjust;
use proptest::prelude::*;

// Log-uniform tiny scores next to the usual range
fn probability() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-9.0f64..-3.0).prop_map(|e| 10f64.powf(e)),
        1e-3f64..0.999,
    ]
}

// Rare-disease prevalences get their own arm
fn prior() -> impl Strategy<Value = f64> {
    prop_oneof![1e-3f64..0.05, 0.05f64..0.999]
}

/// Adjusted probability, or `None` when the clamp kicked in.
fn adjusted(p: f64, pi_train: f64, pi_deploy: f64) -> Option<f64> {
    let result = adjust(p, pi_train, Some(pi_deploy)).unwrap();
    if result.probability_clamped {
        None
    } else {
        result.adjusted_probability
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn equal_priors_leave_probability_unchanged(p in probability(), pi in prior()) {
        let q = adjusted(p, pi, pi).unwrap();
        prop_assert!(relative_eq!(q, p, max_relative = 1e-12), "p={} q={}", p, q);
    }

    #[test]
    fn adjustment_is_invertible(p in probability(), a in prior(), b in prior()) {
        let there = adjusted(p, a, b);
        prop_assume!(there.is_some());
        let back = adjusted(there.unwrap(), b, a);
        prop_assume!(back.is_some());
        let back = back.unwrap();
        prop_assert!(
            relative_eq!(back, p, epsilon = 1e-15, max_relative = 1e-9),
            "p={} back={}",
            p,
            back
        );
    }

    #[test]
    fn adjustment_preserves_ordering(
        p1 in probability(),
        p2 in probability(),
        a in prior(),
        b in prior(),
    ) {
        let (lo, hi) = if p1 < p2 { (p1, p2) } else { (p2, p1) };
        prop_assume!(hi - lo > 1e-4 * lo);
        let (q_lo, q_hi) = (adjusted(lo, a, b), adjusted(hi, a, b));
        prop_assume!(q_lo.is_some() && q_hi.is_some());
        prop_assert!(q_lo < q_hi, "{} -> {:?}, {} -> {:?}", lo, q_lo, hi, q_hi);
    }

    #[test]
    fn lower_deploy_prior_lowers_probability(p in probability(), a in prior(), b in prior()) {
        prop_assume!((a - b).abs() > 1e-3);
        let q = adjusted(p, a, b);
        prop_assume!(q.is_some());
        let q = q.unwrap();
        if b < a {
            prop_assert!(q < p);
        } else {
            prop_assert!(q > p);
        }
    }

    #[test]
    fn raw_probability_is_echoed(p in 0.0f64..=1.0, a in prior(), b in prior()) {
        let result = adjust(p, a, Some(b)).unwrap();
        prop_assert!(relative_eq!(result.raw_probability, p));
        let q = result.adjusted_probability.unwrap();
        prop_assert!(q > 0.0 && q < 1.0);
    }
}

#[test]
fn rare_disease_small_scores_keep_order_and_invert() {
    let (pi_train, pi_deploy) = (0.68728, 0.002);
    let raw = [1e-7, 1e-6, 1e-5, 1e-4, 5e-4, 1e-3];

    let mut previous = 0.0;
    for p in raw {
        let q = adjusted(p, pi_train, pi_deploy).unwrap();
        assert!(q > previous, "p={p} q={q} previous={previous}");
        previous = q;

        let back = adjusted(q, pi_deploy, pi_train).unwrap();
        assert!(relative_eq!(back, p, max_relative = 1e-9), "p={p} back={back}");
    }
}
