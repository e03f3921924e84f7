use crate::tree::TaskTree;
use chrono::NaiveDateTime;

/// Earliest start and latest end across the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectBounds {
    pub lower: NaiveDateTime,
    pub upper: NaiveDateTime,
}

pub struct ProjectBoundsAlgorithm;

impl ProjectBoundsAlgorithm {
    /// An empty project collapses to the root's start.
    pub fn execute(tree: &TaskTree) -> ProjectBounds {
        let span = tree
            .iter()
            .map(|task| (task.start(), task.end()))
            .reduce(|(lo, hi), (start, end)| (lo.min(start), hi.max(end)));
        match span {
            Some((lower, upper)) => ProjectBounds { lower, upper },
            None => {
                let start = tree.root().start();
                ProjectBounds {
                    lower: start,
                    upper: start,
                }
            }
        }
    }
}
