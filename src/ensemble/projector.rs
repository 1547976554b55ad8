//! 🔮 Path Projector
//!
//! Repeatedly re-runs the aggregator on a working copy of history, feeding
//! each prediction back in as if it had resolved, to sketch a multi-step
//! forecast. Explicitly speculative: each step compounds the error of the
//! last, and the live store is never touched.

use super::aggregator::Ensemble;
use crate::history::{HistoryEntry, Outcome, Parity};

/// Project up to `steps` future outcomes from the live frontier
///
/// Stops early if a step cannot produce a prediction. The input slice is
/// cloned; fabricated entries exist only in the working copy.
pub fn project_path(ensemble: &Ensemble, history: &[HistoryEntry], steps: usize) -> Vec<Outcome> {
    let mut path = Vec::with_capacity(steps);
    let mut working: Vec<HistoryEntry> = history.to_vec();

    for step in 0..steps {
        let Some(prediction) = ensemble.run(&working, -1, false) else {
            break;
        };
        path.push(prediction.side);

        // Fabricate the predicted round as if it had resolved
        let issue_id = working.first().map(|e| e.issue_id + 1).unwrap_or(1);
        let number = match prediction.side {
            Outcome::Big => 7,
            Outcome::Small => 2,
        };
        let mut mock = HistoryEntry::from_number(issue_id, number);
        mock.parity = if step % 2 == 0 { Parity::Single } else { Parity::Double };
        working.insert(0, mock);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::detectors::tests::alternating;

    #[test]
    fn test_projection_extends_alternation() {
        let ensemble = Ensemble::new();
        let h = alternating(30);
        let path = project_path(&ensemble, &h, 5);
        assert_eq!(
            path,
            vec![
                Outcome::Small,
                Outcome::Big,
                Outcome::Small,
                Outcome::Big,
                Outcome::Small
            ]
        );
    }

    #[test]
    fn test_projection_does_not_mutate_input() {
        let ensemble = Ensemble::new();
        let h = alternating(30);
        let snapshot = h.clone();
        let _ = project_path(&ensemble, &h, 5);
        assert_eq!(h, snapshot);
    }

    #[test]
    fn test_projection_on_insufficient_history_is_empty() {
        let ensemble = Ensemble::new();
        let h = alternating(4);
        assert!(project_path(&ensemble, &h, 5).is_empty());
    }

    #[test]
    fn test_fabricated_issue_ids_advance() {
        // Indirect check: a projection over a tiny-but-sufficient history
        // still yields one outcome per successful step
        let ensemble = Ensemble::new();
        let h = alternating(12);
        let path = project_path(&ensemble, &h, 3);
        assert_eq!(path.len(), 3);
    }
}
