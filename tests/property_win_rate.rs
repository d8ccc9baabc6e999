use fickle_ferrets::domain::models::{win_rate, Experiment, ExperimentResults, Trial, TrialStatus};
use fickle_ferrets::services::tally;
use fickle_ferrets::Variant;
use proptest::prelude::*;

proptest! {
    /// Property: win rate is always within [0, 1] and 0/0 is 0
    #[test]
    fn prop_win_rate_bounded(total in 0u32..10_000, wins_seed in 0u32..10_000) {
        let wins = if total == 0 { 0 } else { wins_seed % (total + 1) };
        let rate = win_rate(wins, total);
        prop_assert!((0.0..=1.0).contains(&rate));
        if total == 0 {
            prop_assert!(rate.abs() < f64::EPSILON);
        }
    }

    /// Property: the winner has the higher rate, and ties go to A
    #[test]
    fn prop_winner_has_higher_rate(
        a_total in 0u32..500,
        b_total in 0u32..500,
        a_seed in 0u32..500,
        b_seed in 0u32..500,
    ) {
        let a_wins = a_seed % (a_total + 1);
        let b_wins = b_seed % (b_total + 1);
        let results = ExperimentResults::from_tallies(a_wins, a_total, b_wins, b_total);

        match results.winner {
            Variant::A => prop_assert!(results.variant_a_rate() >= results.variant_b_rate()),
            Variant::B => prop_assert!(results.variant_b_rate() > results.variant_a_rate()),
        }
    }

    /// Property: tallies never count more trials than were resolved
    #[test]
    fn prop_tally_bounded_by_resolved(outcomes in prop::collection::vec((0u8..3, any::<bool>(), any::<bool>()), 0..60)) {
        let experiment = Experiment::new("prop", "champion", "challenger", 60);
        let trials: Vec<Trial> = outcomes
            .iter()
            .map(|&(kind, is_a, verdict)| {
                let mut trial = Trial::new(if is_a { "champion" } else { "challenger" });
                match kind {
                    0 => {
                        trial.status = TrialStatus::Resolved;
                        trial.verdict = Some(verdict);
                    }
                    1 => trial.status = TrialStatus::Failed,
                    _ => {}
                }
                trial
            })
            .collect();

        let results = tally(&experiment, &trials);
        let resolved = trials.iter().filter(|t| t.is_resolved()).count();

        prop_assert_eq!(results.counted_trials() as usize, resolved);
        prop_assert!(results.variant_a_wins <= results.variant_a_total);
        prop_assert!(results.variant_b_wins <= results.variant_b_total);
    }
}
