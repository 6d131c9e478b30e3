//! Builder for state trees.

use std::collections::HashSet;

use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

use crate::builder::error::{BuildError, TreeViolation};
use crate::core::{Activity, ActivitySlot, Node, State, StateId, StateTree};

type Check = Validation<(), NonEmptyVec<TreeViolation>>;

struct Entry {
    name: String,
    parent: Option<StateId>,
    state: Box<dyn State>,
    activities: Vec<ActivitySlot>,
}

/// Incremental tree construction.
///
/// Handles are handed out as states are added, so later states, initial
/// children and activities can refer to earlier ones. Nothing is checked
/// until [`build`](Self::build), which reports every problem at once.
///
/// # Example
///
/// ```rust
/// use layerstate::builder::TreeBuilder;
/// use layerstate::core::NoopState;
///
/// let mut builder = TreeBuilder::new();
/// let root = builder.root(NoopState::new("Root"));
/// let menu = builder.child(root, NoopState::new("Menu"));
/// builder.initial(root, menu);
///
/// let tree = builder.build().unwrap();
/// assert_eq!(tree.find("Menu"), Some(menu));
/// ```
#[derive(Default)]
pub struct TreeBuilder {
    entries: Vec<Entry>,
    initials: Vec<(StateId, StateId)>,
    orphan_activities: Vec<StateId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, parent: Option<StateId>, state: impl State + 'static) -> StateId {
        let id = StateId(self.entries.len());
        self.entries.push(Entry {
            name: state.name().to_string(),
            parent,
            state: Box::new(state),
            activities: Vec::new(),
        });
        id
    }

    /// Add the root state. The state's name becomes its lookup key.
    pub fn root(&mut self, state: impl State + 'static) -> StateId {
        self.push(None, state)
    }

    /// Add a child of `parent`.
    pub fn child(&mut self, parent: StateId, state: impl State + 'static) -> StateId {
        self.push(Some(parent), state)
    }

    /// Attach an activity. Activities run in attachment order.
    pub fn activity(&mut self, state: StateId, activity: impl Activity + 'static) -> &mut Self {
        match self.entries.get_mut(state.0) {
            Some(entry) => entry.activities.push(ActivitySlot::new(Box::new(activity))),
            None => self.orphan_activities.push(state),
        }
        self
    }

    /// Declare the child entered by default when `parent` is entered.
    pub fn initial(&mut self, parent: StateId, child: StateId) -> &mut Self {
        self.initials.push((parent, child));
        self
    }

    fn check_roots(&self) -> Check {
        let mut roots = self.entries.iter().filter(|entry| entry.parent.is_none());
        match (roots.next(), roots.next()) {
            (None, _) => Validation::fail(TreeViolation::MissingRoot),
            (Some(_), None) => Validation::success(()),
            (Some(first), Some(second)) => Validation::fail(TreeViolation::MultipleRoots {
                first: first.name.clone(),
                second: second.name.clone(),
            }),
        }
    }

    fn check_parent(index: usize, entry: &Entry) -> Check {
        match entry.parent {
            Some(parent) if parent.0 >= index => Validation::fail(TreeViolation::UnknownParent {
                child: entry.name.clone(),
                parent,
            }),
            _ => Validation::success(()),
        }
    }

    fn check_initial(&self, parent: StateId, child: StateId) -> Check {
        let is_child = self
            .entries
            .get(child.0)
            .is_some_and(|entry| entry.parent == Some(parent));
        if is_child {
            Validation::success(())
        } else {
            Validation::fail(TreeViolation::InitialNotChild { parent, child })
        }
    }

    /// Accumulate every violation rather than stopping at the first.
    fn validate(&self) -> Check {
        let mut checks = vec![self.check_roots()];

        checks.extend(
            self.entries
                .iter()
                .enumerate()
                .map(|(index, entry)| Self::check_parent(index, entry)),
        );

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.name.as_str()) {
                checks.push(Validation::fail(TreeViolation::DuplicateName(
                    entry.name.clone(),
                )));
            }
        }

        checks.extend(
            self.initials
                .iter()
                .map(|&(parent, child)| self.check_initial(parent, child)),
        );

        checks.extend(
            self.orphan_activities
                .iter()
                .map(|&state| Validation::fail(TreeViolation::UnknownActivityOwner(state))),
        );

        Validation::all_vec(checks).map(|_| ())
    }

    /// Validate and assemble the tree.
    pub fn build(self) -> Result<StateTree, BuildError> {
        if let Validation::Failure(violations) = self.validate() {
            return Err(BuildError::Invalid(violations.iter().cloned().collect()));
        }

        let mut nodes: Vec<Node> = Vec::with_capacity(self.entries.len());
        let mut behaviors = Vec::with_capacity(self.entries.len());
        let mut activities = Vec::with_capacity(self.entries.len());
        let mut root = StateId(0);

        for (index, entry) in self.entries.into_iter().enumerate() {
            let id = StateId(index);
            match entry.parent {
                Some(parent) => nodes[parent.0].children.push(id),
                None => root = id,
            }
            nodes.push(Node::new(entry.name, entry.parent));
            behaviors.push(entry.state);
            activities.push(entry.activities);
        }
        for (parent, child) in self.initials {
            nodes[parent.0].initial = Some(child);
        }

        debug!(states = nodes.len(), "state tree built");
        Ok(StateTree::from_parts(nodes, behaviors, activities, root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::activity::{from_fn, yield_for};
    use crate::core::{ActivityMode, NoopState};

    #[test]
    fn builds_parent_child_links() {
        let mut builder = TreeBuilder::new();
        let root = builder.root(NoopState::new("Root"));
        let a = builder.child(root, NoopState::new("A"));
        let b = builder.child(root, NoopState::new("B"));
        let a1 = builder.child(a, NoopState::new("A1"));
        builder.initial(root, b);

        let tree = builder.build().unwrap();
        assert_eq!(tree.root(), root);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.parent(a1), Some(a));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.find("A1"), Some(a1));
        assert_eq!(tree.name(b), Some("B"));
    }

    #[test]
    fn declared_initial_is_entered() {
        let mut builder = TreeBuilder::new();
        let root = builder.root(NoopState::new("Root"));
        builder.child(root, NoopState::new("A"));
        let b = builder.child(root, NoopState::new("B"));
        builder.initial(root, b);

        let mut tree = builder.build().unwrap();
        tree.enter(root).unwrap();
        assert_eq!(tree.leaf(root), b);
    }

    #[test]
    fn activities_attach_in_order() {
        let mut builder = TreeBuilder::new();
        let root = builder.root(NoopState::new("Root"));
        builder
            .activity(root, from_fn("first", |_| yield_for(0), |_| yield_for(0)))
            .activity(root, from_fn("second", |_| yield_for(0), |_| yield_for(0)));

        let tree = builder.build().unwrap();
        assert_eq!(tree.activity_count(root), 2);
        assert_eq!(tree.activity_name(root, 0), Some("first"));
        assert_eq!(tree.activity_name(root, 1), Some("second"));
        assert_eq!(
            tree.activity_modes(root),
            vec![ActivityMode::Inactive, ActivityMode::Inactive]
        );
    }

    #[test]
    fn empty_builder_reports_missing_root() {
        let err = TreeBuilder::new().build().err().unwrap();
        assert_eq!(err.violations(), &[TreeViolation::MissingRoot]);
    }

    #[test]
    fn all_violations_are_accumulated() {
        let mut builder = TreeBuilder::new();
        let root = builder.root(NoopState::new("Root"));
        let a = builder.child(root, NoopState::new("A"));
        builder.child(root, NoopState::new("A"));
        builder.root(NoopState::new("Other"));
        builder.child(StateId(40), NoopState::new("Lost"));
        builder.initial(a, root);
        builder.activity(StateId(99), from_fn("x", |_| yield_for(0), |_| yield_for(0)));

        let err = builder.build().err().unwrap();
        let violations = err.violations();

        assert_eq!(violations.len(), 5);
        assert!(violations.contains(&TreeViolation::MultipleRoots {
            first: "Root".to_string(),
            second: "Other".to_string(),
        }));
        assert!(violations.contains(&TreeViolation::UnknownParent {
            child: "Lost".to_string(),
            parent: StateId(40),
        }));
        assert!(violations.contains(&TreeViolation::DuplicateName("A".to_string())));
        assert!(violations.contains(&TreeViolation::InitialNotChild {
            parent: a,
            child: root,
        }));
        assert!(violations.contains(&TreeViolation::UnknownActivityOwner(StateId(99))));
        assert!(err.to_string().starts_with("invalid state tree (5 problem(s))"));
    }
}
