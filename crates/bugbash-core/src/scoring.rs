// Classification aggregation and score calculation
//
// The aggregator walks a classification tree of any depth, looking up each
// leaf label's point value for the campaign. Sibling order never matters:
// every contribution is a plain addition into the tally.

use tracing::warn;

use crate::classification::{ClassificationTree, ClassificationValue};
use crate::error::BugBashError;
use crate::message::FixEventMessage;
use crate::traits::ScoringStore;

/// Points awarded for each fix that carries no classification
pub const UNCLASSIFIED_FIX_BONUS: f64 = 1.0;

/// Running accumulators for a classification walk
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tally {
    pub points: f64,
    pub classified: f64,
}

/// Walk `tree` and add every leaf's `count * point value` into `tally`.
///
/// Malformed entries contribute nothing and are returned as
/// `BugBashError::MalformedClassification`, labelled with their dotted path.
/// They never abort the walk and never roll back what was already added.
pub async fn tally_classifications<S>(
    store: &S,
    message: &FixEventMessage,
    campaign: &str,
    tree: Option<&ClassificationTree>,
    tally: &mut Tally,
) -> Vec<BugBashError>
where
    S: ScoringStore + ?Sized,
{
    let mut malformed = Vec::new();
    let Some(root) = tree else {
        return malformed;
    };

    // Explicit stack instead of async recursion
    let mut pending: Vec<(Option<String>, &ClassificationTree)> = vec![(None, root)];

    while let Some((prefix, node)) = pending.pop() {
        for (label, value) in node.iter() {
            match value {
                ClassificationValue::Nested(child) => {
                    pending.push((Some(join_path(prefix.as_deref(), label)), child));
                }
                ClassificationValue::Count(count) => {
                    let point_value = store.select_point_value(message, campaign, label).await;
                    tally.points += count * point_value;
                    tally.classified += count;
                }
                ClassificationValue::Malformed(_) => {
                    malformed.push(BugBashError::MalformedClassification {
                        label: join_path(prefix.as_deref(), label),
                        found: value.kind(),
                    });
                }
            }
        }
    }

    malformed
}

fn join_path(prefix: Option<&str>, label: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, label),
        None => label.to_string(),
    }
}

/// Points one fix event is worth in one campaign.
///
/// Classified fixes score by their configured point values; every
/// unclassified fix adds `UNCLASSIFIED_FIX_BONUS`. Malformed classification
/// entries are logged and skipped.
pub async fn compute_score<S>(store: &S, message: &FixEventMessage, campaign: &str) -> f64
where
    S: ScoringStore + ?Sized,
{
    let mut tally = Tally::default();
    let malformed = tally_classifications(
        store,
        message,
        campaign,
        message.classification_counts.as_ref(),
        &mut tally,
    )
    .await;

    for error in &malformed {
        warn!(
            campaign = %campaign,
            repo_owner = %message.repo_owner,
            repo_name = %message.repo_name,
            error = %error,
            "Skipping malformed classification entry"
        );
    }

    tally.points + message.total_fixed as f64 * UNCLASSIFIED_FIX_BONUS
}
