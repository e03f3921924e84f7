use crate::dependency::{ConstraintType, TaskDependencyCollection};
use crate::hierarchy::TaskHierarchy;
use crate::task::{ROOT_TASK_ID, TaskId};
use crate::tree::TaskTree;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleEdge {
    /// Dependee to dependant.
    Dependency {
        constraint: ConstraintType,
        difference: i32,
        rigid: bool,
    },
    /// Child to its container.
    Containment,
    /// Ancestor of a dependee to the dependant, so a moved container settles
    /// before anything depending on its content is placed. Also dependee to
    /// every task nested in the dependant, so nested tasks see the dates
    /// their container is held to.
    Ordering,
}

/// Which dependencies become edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DagKind {
    /// Rigid dependencies plus ordering edges, for schedule propagation.
    Propagation,
    /// Every dependency regardless of hardness, for slack analysis.
    Analysis,
}

/// Registered tasks as a petgraph DAG keyed by task id.
pub struct ScheduleDag {
    pub graph: DiGraph<TaskId, ScheduleEdge>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl ScheduleDag {
    pub fn build(tree: &TaskTree, dependencies: &TaskDependencyCollection, kind: DagKind) -> Self {
        let hierarchy = TaskHierarchy::new(tree);
        let mut graph: DiGraph<TaskId, ScheduleEdge> = DiGraph::new();
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::new();

        // Nodes in document order keep the topological order stable.
        for &id in tree.sorted_ids() {
            id_to_index.insert(id, graph.add_node(id));
        }

        for &id in tree.sorted_ids() {
            if let Some(parent) = hierarchy.container(id).filter(|p| *p != ROOT_TASK_ID) {
                if let (Some(&child_ix), Some(&parent_ix)) =
                    (id_to_index.get(&id), id_to_index.get(&parent))
                {
                    graph.add_edge(child_ix, parent_ix, ScheduleEdge::Containment);
                }
            }
        }

        let mut ordering_edges: HashSet<(TaskId, TaskId)> = HashSet::new();
        for dependency in dependencies.iter() {
            if kind == DagKind::Propagation && !dependency.is_rigid() {
                continue;
            }
            let (dependee, dependant) = (dependency.dependee(), dependency.dependant());
            let (Some(&from), Some(&to)) = (id_to_index.get(&dependee), id_to_index.get(&dependant))
            else {
                continue;
            };
            graph.add_edge(
                from,
                to,
                ScheduleEdge::Dependency {
                    constraint: dependency.constraint,
                    difference: dependency.difference,
                    rigid: dependency.is_rigid(),
                },
            );

            if kind == DagKind::Propagation {
                let shared: HashSet<TaskId> = hierarchy.ancestors(dependant).into_iter().collect();
                for ancestor in hierarchy.ancestors(dependee) {
                    if ancestor == ROOT_TASK_ID || shared.contains(&ancestor) {
                        continue;
                    }
                    if ordering_edges.insert((ancestor, dependant)) {
                        if let Some(&ancestor_ix) = id_to_index.get(&ancestor) {
                            graph.add_edge(ancestor_ix, to, ScheduleEdge::Ordering);
                        }
                    }
                }
                for nested in hierarchy.deep_nested_tasks(dependant) {
                    if ordering_edges.insert((dependee, nested)) {
                        if let Some(&nested_ix) = id_to_index.get(&nested) {
                            graph.add_edge(from, nested_ix, ScheduleEdge::Ordering);
                        }
                    }
                }
            }
        }

        Self { graph, id_to_index }
    }

    /// Task ids in topological order, `None` when the constraints form a cycle.
    pub fn topological_order(&self) -> Option<Vec<TaskId>> {
        toposort(&self.graph, None)
            .ok()
            .map(|order| order.into_iter().map(|ix| self.graph[ix]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use chrono::NaiveDate;

    fn tree() -> TaskTree {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut tree = TaskTree::new(Task::new(ROOT_TASK_ID, start));
        // 0 { 1, 2 }, 3
        for (id, parent) in [(0, ROOT_TASK_ID), (1, 0), (2, 0), (3, ROOT_TASK_ID)] {
            tree.register(Task::new(id, start));
            tree.move_task(id, parent, None).unwrap();
        }
        tree
    }

    fn position(order: &[TaskId], id: TaskId) -> usize {
        order.iter().position(|t| *t == id).unwrap()
    }

    #[test]
    fn container_settles_before_dependants_of_its_content() {
        let tree = tree();
        let mut deps = TaskDependencyCollection::new();
        deps.create(&tree, 3, 1, ConstraintType::FinishStart).unwrap();
        deps.create(&tree, 2, 1, ConstraintType::FinishStart).unwrap();

        let dag = ScheduleDag::build(&tree, &deps, DagKind::Propagation);
        let order = dag.topological_order().unwrap();
        assert!(position(&order, 1) < position(&order, 0));
        assert!(position(&order, 0) < position(&order, 3));
        // siblings share the container, so no ordering edge is added for it
        assert!(position(&order, 2) < position(&order, 0));
    }

    #[test]
    fn dependee_of_container_precedes_its_content() {
        let tree = tree();
        let mut deps = TaskDependencyCollection::new();
        deps.create(&tree, 0, 3, ConstraintType::FinishStart).unwrap();

        let dag = ScheduleDag::build(&tree, &deps, DagKind::Propagation);
        let order = dag.topological_order().unwrap();
        assert!(position(&order, 3) < position(&order, 1));
        assert!(position(&order, 3) < position(&order, 2));
    }

    #[test]
    fn soft_dependencies_only_in_analysis() {
        let tree = tree();
        let mut deps = TaskDependencyCollection::new();
        deps.create(&tree, 3, 0, ConstraintType::FinishStart).unwrap();
        deps.get_mut(3, 0).unwrap().hardness = crate::dependency::Hardness::Soft;

        let propagation = ScheduleDag::build(&tree, &deps, DagKind::Propagation);
        let analysis = ScheduleDag::build(&tree, &deps, DagKind::Analysis);
        assert_eq!(propagation.graph.edge_count(), 2);
        assert_eq!(analysis.graph.edge_count(), 3);
    }
}
