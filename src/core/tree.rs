//! Arena-backed state tree.
//!
//! The tree is built once and never changes shape. Nodes are addressed by
//! [`StateId`] handles; `parent` links are navigational only and the single
//! `active_child` slot per node forms the active chain from the root to the
//! current leaf.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error};

use super::activity::{ActivityMode, ActivitySlot};
use super::error::ConfigError;
use super::state::{State, StateContext, StateId};

/// Structural data for one node.
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<StateId>,
    pub(crate) children: Vec<StateId>,
    pub(crate) initial: Option<StateId>,
    pub(crate) active_child: Option<StateId>,
    pub(crate) entered: bool,
}

impl Node {
    pub(crate) fn new(name: String, parent: Option<StateId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            initial: None,
            active_child: None,
            entered: false,
        }
    }
}

/// Exit and enter chains for one transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionPath {
    pub from: StateId,
    pub to: StateId,
    /// Least common ancestor of `from` and `to`.
    pub lca: StateId,
    /// Deepest state that stays entered across the transition.
    ///
    /// Equal to `lca` unless `to` is itself an ancestor of `from` (or equal
    /// to it), in which case `to` is exited and re-entered and the pivot is
    /// its parent. Once the tree is entered, a pivot that is not itself
    /// entered climbs to its nearest entered ancestor. `None` means the root
    /// itself is re-entered.
    pub pivot: Option<StateId>,
    /// States to exit, leaf-first, starting at `from`.
    pub exit: Vec<StateId>,
    /// States to enter, root-first, ending at `to`.
    pub enter: Vec<StateId>,
    /// Initial children entered below `to`, root-first. Empty until the
    /// transition is prepared.
    pub descent: Vec<StateId>,
}

/// Lazy walk from a state up to the root, inclusive at both ends.
pub struct PathToRoot<'a> {
    nodes: &'a [Node],
    next: Option<StateId>,
}

impl Iterator for PathToRoot<'_> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        let current = self.next?;
        self.next = self.nodes[current.0].parent;
        Some(current)
    }
}

/// A single-rooted tree of states with their behaviors and activities.
pub struct StateTree {
    nodes: Vec<Node>,
    behaviors: Vec<Box<dyn State>>,
    activities: Vec<Vec<ActivitySlot>>,
    index: HashMap<String, StateId>,
    root: StateId,
}

impl StateTree {
    /// Assemble a tree from validated parts. Only the builder calls this.
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        behaviors: Vec<Box<dyn State>>,
        activities: Vec<Vec<ActivitySlot>>,
        root: StateId,
    ) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.name.clone(), StateId(i)))
            .collect();
        Self {
            nodes,
            behaviors,
            activities,
            index,
            root,
        }
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: StateId) -> bool {
        id.0 < self.nodes.len()
    }

    fn check(&self, id: StateId) -> Result<(), ConfigError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(ConfigError::UnknownState(id))
        }
    }

    pub fn find(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: StateId) -> Option<&str> {
        self.nodes.get(id.0).map(|node| node.name.as_str())
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, id: StateId) -> &[StateId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn active_child(&self, id: StateId) -> Option<StateId> {
        self.nodes.get(id.0).and_then(|node| node.active_child)
    }

    /// True while the state is part of the active chain.
    pub fn is_entered(&self, id: StateId) -> bool {
        self.nodes.get(id.0).is_some_and(|node| node.entered)
    }

    pub fn activity_count(&self, state: StateId) -> usize {
        self.activities.get(state.0).map_or(0, Vec::len)
    }

    pub fn activity_mode(&self, state: StateId, index: usize) -> Option<ActivityMode> {
        self.activities
            .get(state.0)
            .and_then(|slots| slots.get(index))
            .map(ActivitySlot::mode)
    }

    pub fn activity_name(&self, state: StateId, index: usize) -> Option<&str> {
        self.activities
            .get(state.0)
            .and_then(|slots| slots.get(index))
            .map(ActivitySlot::name)
    }

    /// Modes of every activity attached to `state`, in attachment order.
    pub fn activity_modes(&self, state: StateId) -> Vec<ActivityMode> {
        self.activities
            .get(state.0)
            .map(|slots| slots.iter().map(ActivitySlot::mode).collect())
            .unwrap_or_default()
    }

    pub(crate) fn slot_mut(
        &mut self,
        state: StateId,
        index: usize,
    ) -> Result<&mut ActivitySlot, ConfigError> {
        self.activities
            .get_mut(state.0)
            .and_then(|slots| slots.get_mut(index))
            .ok_or(ConfigError::DetachedActivity { state, index })
    }

    fn label(&self, id: StateId) -> &str {
        &self.nodes[id.0].name
    }

    /// Enter `id`, then its initial child recursively.
    ///
    /// The whole initial-child descent is resolved before anything is
    /// entered, so a faulty `initial_child` hook leaves the tree untouched.
    pub fn enter(&mut self, id: StateId) -> Result<(), ConfigError> {
        self.check(id)?;
        let descent = self.descent(id)?;
        for state in std::iter::once(id).chain(descent) {
            self.enter_node(state);
        }
        Ok(())
    }

    /// Initial children below `id`, root-first, as chosen by the hooks.
    fn descent(&mut self, id: StateId) -> Result<Vec<StateId>, ConfigError> {
        let mut descent = Vec::new();
        let mut current = id;
        loop {
            let ctx = StateContext::new(current, &self.nodes, &self.index);
            let Some(child) = self.behaviors[current.0].initial_child(&ctx) else {
                return Ok(descent);
            };
            if !self.contains(child) || self.nodes[child.0].parent != Some(current) {
                error!(state = %self.label(current), child = %child, "initial child is not a direct child");
                return Err(ConfigError::NotADescendant {
                    ancestor: current,
                    state: child,
                });
            }
            descent.push(child);
            current = child;
        }
    }

    fn enter_node(&mut self, id: StateId) {
        if let Some(parent) = self.nodes[id.0].parent {
            self.nodes[parent.0].active_child = Some(id);
        }
        self.nodes[id.0].entered = true;
        debug!(state = %self.label(id), "enter");

        let ctx = StateContext::new(id, &self.nodes, &self.index);
        self.behaviors[id.0].on_enter(&ctx);
    }

    /// Exit `id`, its active descendants first. A no-op for states that are
    /// not entered.
    pub fn exit(&mut self, id: StateId) -> Result<(), ConfigError> {
        self.check(id)?;
        self.exit_node(id);
        Ok(())
    }

    fn exit_node(&mut self, id: StateId) {
        if !self.nodes[id.0].entered {
            return;
        }
        if let Some(child) = self.nodes[id.0].active_child {
            self.exit_node(child);
        }
        self.nodes[id.0].active_child = None;
        self.nodes[id.0].entered = false;
        debug!(state = %self.label(id), "exit");

        let ctx = StateContext::new(id, &self.nodes, &self.index);
        self.behaviors[id.0].on_exit(&ctx);
    }

    /// Run one update pass from `id` down the active chain.
    ///
    /// Returns the first transition requested by a state's predicate. A
    /// requesting state and its descendants are not updated this pass; its
    /// ancestors still are.
    pub fn update(&mut self, id: StateId, dt: f32) -> Option<(StateId, StateId)> {
        if !self.contains(id) {
            return None;
        }

        let ctx = StateContext::new(id, &self.nodes, &self.index);
        if let Some(target) = self.behaviors[id.0].transition(&ctx) {
            return Some((id, target));
        }

        let child = self.nodes[id.0].active_child;
        let request = child.and_then(|child| self.update(child, dt));

        let ctx = StateContext::new(id, &self.nodes, &self.index);
        self.behaviors[id.0].on_update(&ctx, dt);
        request
    }

    /// Deepest active descendant of `id` (or `id` itself).
    pub fn leaf(&self, id: StateId) -> StateId {
        let mut current = id;
        while let Some(child) = self.active_child(current) {
            current = child;
        }
        current
    }

    /// Active chain from `id` down to its leaf, root-first.
    pub fn active_path(&self, id: StateId) -> Vec<StateId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(child) = self.active_child(current) {
            path.push(child);
            current = child;
        }
        path
    }

    pub fn path_to_root(&self, id: StateId) -> PathToRoot<'_> {
        PathToRoot {
            nodes: &self.nodes,
            next: self.contains(id).then_some(id),
        }
    }

    /// Least common ancestor of `a` and `b`.
    pub fn lca(&self, a: StateId, b: StateId) -> Result<StateId, ConfigError> {
        self.check(a)?;
        self.check(b)?;

        let ancestors: HashSet<StateId> = self.path_to_root(a).collect();
        self.path_to_root(b)
            .find(|candidate| ancestors.contains(candidate))
            .ok_or(ConfigError::NoCommonAncestor { a, b })
    }

    /// Compute the exit and enter chains for `from -> to`.
    pub fn plan(&self, from: StateId, to: StateId) -> Result<TransitionPath, ConfigError> {
        let lca = self.lca(from, to)?;
        let mut pivot = if lca == to {
            self.nodes[to.0].parent
        } else {
            Some(lca)
        };
        // A source off the active chain: the swap must still hang below an
        // entered state.
        if self.is_entered(self.root) {
            while let Some(state) = pivot.filter(|state| !self.is_entered(*state)) {
                pivot = self.nodes[state.0].parent;
            }
        }

        let exit: Vec<StateId> = self
            .path_to_root(from)
            .take_while(|state| Some(*state) != pivot)
            .collect();

        let mut enter: Vec<StateId> = self
            .path_to_root(to)
            .take_while(|state| Some(*state) != pivot)
            .collect();
        enter.reverse();

        Ok(TransitionPath {
            from,
            to,
            lca,
            pivot,
            exit,
            enter,
            descent: Vec::new(),
        })
    }

    /// States from `from` up to (excluding) the pivot, leaf-first.
    pub fn exit_chain(&self, from: StateId, to: StateId) -> Result<Vec<StateId>, ConfigError> {
        self.plan(from, to).map(|path| path.exit)
    }

    /// States from the pivot's child down to `to`, root-first.
    pub fn enter_chain(&self, from: StateId, to: StateId) -> Result<Vec<StateId>, ConfigError> {
        self.plan(from, to).map(|path| path.enter)
    }

    /// Entered states strictly below `pivot`, root-first. `None` means the
    /// whole active chain including the root.
    pub(crate) fn active_below(&self, pivot: Option<StateId>) -> Vec<StateId> {
        match pivot {
            Some(pivot) => self
                .active_child(pivot)
                .map(|child| self.active_path(child))
                .unwrap_or_default(),
            None if self.is_entered(self.root) => self.active_path(self.root),
            None => Vec::new(),
        }
    }

    /// Plan `from -> to` and resolve the descent below `to`.
    ///
    /// Runs `initial_child` hooks but changes nothing, so an error leaves the
    /// tree as it was.
    pub(crate) fn prepare(&mut self, from: StateId, to: StateId) -> Result<TransitionPath, ConfigError> {
        let mut path = self.plan(from, to)?;
        path.descent = self.descent(to)?;
        Ok(path)
    }

    /// Apply a prepared transition: exits, then enters.
    pub(crate) fn apply(&mut self, path: &TransitionPath) {
        for &state in &path.exit {
            self.exit_node(state);
        }
        // `from` may sit above the current leaf, or off the active chain
        // entirely; whatever is still entered below the pivot goes too.
        match path.pivot {
            Some(pivot) => {
                if let Some(stale) = self.nodes[pivot.0].active_child.take() {
                    self.exit_node(stale);
                }
            }
            None => self.exit_node(self.root),
        }

        for &state in path.enter.iter().chain(&path.descent) {
            self.enter_node(state);
        }

        debug!(
            from = %self.label(path.from),
            to = %self.label(path.to),
            lca = %self.label(path.lca),
            "structural swap"
        );
    }

    /// Structural swap from `from` to `to`. Runs hooks but no activities.
    ///
    /// On error nothing has been exited or entered.
    pub fn change_state(&mut self, from: StateId, to: StateId) -> Result<TransitionPath, ConfigError> {
        let path = self.prepare(from, to)?;
        self.apply(&path);
        Ok(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::core::state::NoopState;
    use std::sync::{Arc, Mutex};

    /// Root -> { Locomotion -> { Idle, Run }, Combat -> { Attack } }
    pub(crate) struct Scenario {
        pub tree: StateTree,
        pub root: StateId,
        pub locomotion: StateId,
        pub idle: StateId,
        pub run: StateId,
        pub combat: StateId,
        pub attack: StateId,
    }

    /// Handles of the scenario tree without the tree itself.
    #[derive(Clone, Copy)]
    pub(crate) struct Ids {
        pub root: StateId,
        pub locomotion: StateId,
        pub idle: StateId,
        pub run: StateId,
        pub combat: StateId,
        pub attack: StateId,
    }

    impl Scenario {
        pub(crate) fn into_parts(self) -> (StateTree, Ids) {
            let ids = Ids {
                root: self.root,
                locomotion: self.locomotion,
                idle: self.idle,
                run: self.run,
                combat: self.combat,
                attack: self.attack,
            };
            (self.tree, ids)
        }
    }

    pub(crate) fn scenario() -> Scenario {
        let mut builder = TreeBuilder::new();
        let root = builder.root(NoopState::new("Root"));
        let locomotion = builder.child(root, NoopState::new("Locomotion"));
        let idle = builder.child(locomotion, NoopState::new("Idle"));
        let run = builder.child(locomotion, NoopState::new("Run"));
        let combat = builder.child(root, NoopState::new("Combat"));
        let attack = builder.child(combat, NoopState::new("Attack"));
        builder.initial(root, locomotion).initial(locomotion, idle);

        Scenario {
            tree: builder.build().unwrap(),
            root,
            locomotion,
            idle,
            run,
            combat,
            attack,
        }
    }

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        target: Option<&'static str>,
    }

    impl State for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn on_enter(&mut self, _ctx: &StateContext<'_>) {
            self.log.lock().unwrap().push(format!("enter {}", self.name));
        }

        fn on_exit(&mut self, _ctx: &StateContext<'_>) {
            self.log.lock().unwrap().push(format!("exit {}", self.name));
        }

        fn on_update(&mut self, _ctx: &StateContext<'_>, _dt: f32) {
            self.log.lock().unwrap().push(format!("update {}", self.name));
        }

        fn transition(&mut self, ctx: &StateContext<'_>) -> Option<StateId> {
            self.target.and_then(|name| ctx.lookup(name))
        }
    }

    fn recording_tree(
        target_from_idle: Option<&'static str>,
    ) -> (StateTree, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let state = |name, target| Recording {
            name,
            log: Arc::clone(&log),
            target,
        };

        let mut builder = TreeBuilder::new();
        let root = builder.root(state("Root", None));
        let locomotion = builder.child(root, state("Locomotion", None));
        let idle = builder.child(locomotion, state("Idle", target_from_idle));
        builder.child(locomotion, state("Run", None));
        let combat = builder.child(root, state("Combat", None));
        builder.child(combat, state("Attack", None));
        builder.initial(root, locomotion).initial(locomotion, idle);

        (builder.build().unwrap(), log)
    }

    #[test]
    fn enter_follows_initial_children() {
        let mut s = scenario();
        s.tree.enter(s.root).unwrap();

        assert_eq!(s.tree.active_child(s.root), Some(s.locomotion));
        assert_eq!(s.tree.active_child(s.locomotion), Some(s.idle));
        assert_eq!(s.tree.leaf(s.root), s.idle);
        assert_eq!(s.tree.active_path(s.root), vec![s.root, s.locomotion, s.idle]);
    }

    #[test]
    fn exit_clears_children_leaf_first() {
        let (mut tree, log) = recording_tree(None);
        let root = tree.root();
        tree.enter(root).unwrap();
        log.lock().unwrap().clear();

        tree.exit(root).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["exit Idle", "exit Locomotion", "exit Root"]
        );
        assert_eq!(tree.active_child(root), None);
        assert!(!tree.is_entered(root));
    }

    #[test]
    fn update_runs_children_before_parent() {
        let (mut tree, log) = recording_tree(None);
        let root = tree.root();
        tree.enter(root).unwrap();
        log.lock().unwrap().clear();

        assert_eq!(tree.update(root, 0.016), None);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["update Idle", "update Locomotion", "update Root"]
        );
    }

    #[test]
    fn requesting_state_skips_its_own_update() {
        let (mut tree, log) = recording_tree(Some("Attack"));
        let root = tree.root();
        tree.enter(root).unwrap();
        log.lock().unwrap().clear();

        let request = tree.update(root, 0.016);

        let idle = tree.find("Idle").unwrap();
        let attack = tree.find("Attack").unwrap();
        assert_eq!(request, Some((idle, attack)));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["update Locomotion", "update Root"]
        );
    }

    #[test]
    fn path_to_root_walks_parents() {
        let s = scenario();
        let path: Vec<_> = s.tree.path_to_root(s.attack).collect();
        assert_eq!(path, vec![s.attack, s.combat, s.root]);
        assert_eq!(s.tree.path_to_root(StateId(99)).count(), 0);
    }

    #[test]
    fn lca_of_cousins_is_root() {
        let s = scenario();
        assert_eq!(s.tree.lca(s.idle, s.attack).unwrap(), s.root);
        assert_eq!(s.tree.lca(s.idle, s.run).unwrap(), s.locomotion);
        assert_eq!(s.tree.lca(s.idle, s.locomotion).unwrap(), s.locomotion);
        assert_eq!(s.tree.lca(s.idle, s.idle).unwrap(), s.idle);
    }

    #[test]
    fn lca_rejects_foreign_handles() {
        let s = scenario();
        assert_eq!(
            s.tree.lca(s.idle, StateId(42)),
            Err(ConfigError::UnknownState(StateId(42)))
        );
    }

    #[test]
    fn chains_for_cross_branch_transition() {
        let s = scenario();
        let path = s.tree.plan(s.idle, s.attack).unwrap();

        assert_eq!(path.lca, s.root);
        assert_eq!(path.exit, vec![s.idle, s.locomotion]);
        assert_eq!(path.enter, vec![s.combat, s.attack]);
    }

    #[test]
    fn transition_to_ancestor_reenters_it() {
        let s = scenario();
        let path = s.tree.plan(s.run, s.locomotion).unwrap();

        assert_eq!(path.lca, s.locomotion);
        assert_eq!(path.pivot, Some(s.root));
        assert_eq!(path.exit, vec![s.run, s.locomotion]);
        assert_eq!(path.enter, vec![s.locomotion]);
    }

    #[test]
    fn change_state_swaps_branches() {
        let (mut tree, log) = recording_tree(None);
        let root = tree.root();
        tree.enter(root).unwrap();
        log.lock().unwrap().clear();

        let idle = tree.find("Idle").unwrap();
        let combat = tree.find("Combat").unwrap();
        let attack = tree.find("Attack").unwrap();
        tree.change_state(idle, attack).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["exit Idle", "exit Locomotion", "enter Combat", "enter Attack"]
        );
        assert_eq!(tree.active_child(root), Some(combat));
        assert_eq!(tree.active_child(combat), Some(attack));
        assert!(!tree.is_entered(idle));
    }

    #[test]
    fn change_state_from_ancestor_exits_active_leaf() {
        let mut s = scenario();
        s.tree.enter(s.root).unwrap();

        s.tree.change_state(s.locomotion, s.run).unwrap();

        assert!(!s.tree.is_entered(s.idle));
        assert_eq!(s.tree.active_child(s.locomotion), Some(s.run));
        assert_eq!(s.tree.leaf(s.root), s.run);
    }

    #[test]
    fn change_state_from_inactive_source_stays_on_active_path() {
        let mut s = scenario();
        s.tree.enter(s.root).unwrap();

        let path = s.tree.change_state(s.combat, s.attack).unwrap();

        assert_eq!(path.lca, s.combat);
        assert_eq!(path.pivot, Some(s.root));
        assert_eq!(path.enter, vec![s.combat, s.attack]);
        assert!(!s.tree.is_entered(s.locomotion));
        assert_eq!(s.tree.active_path(s.root), vec![s.root, s.combat, s.attack]);
    }

    /// Names an initial child by lookup, which may not be a child at all.
    struct Misdirected {
        name: &'static str,
        initial: &'static str,
    }

    impl State for Misdirected {
        fn name(&self) -> &str {
            self.name
        }

        fn initial_child(&mut self, ctx: &StateContext<'_>) -> Option<StateId> {
            ctx.lookup(self.initial)
        }
    }

    fn misdirected_combat() -> (StateTree, Ids) {
        let mut builder = TreeBuilder::new();
        let root = builder.root(NoopState::new("Root"));
        let locomotion = builder.child(root, NoopState::new("Locomotion"));
        let idle = builder.child(locomotion, NoopState::new("Idle"));
        let run = builder.child(locomotion, NoopState::new("Run"));
        let combat = builder.child(
            root,
            Misdirected {
                name: "Combat",
                initial: "Idle",
            },
        );
        let attack = builder.child(combat, NoopState::new("Attack"));
        builder.initial(root, locomotion).initial(locomotion, idle);

        let ids = Ids {
            root,
            locomotion,
            idle,
            run,
            combat,
            attack,
        };
        (builder.build().unwrap(), ids)
    }

    #[test]
    fn bad_initial_child_leaves_tree_untouched() {
        let (mut tree, s) = misdirected_combat();
        tree.enter(s.root).unwrap();

        assert_eq!(
            tree.change_state(s.idle, s.combat),
            Err(ConfigError::NotADescendant {
                ancestor: s.combat,
                state: s.idle,
            })
        );
        assert_eq!(tree.active_path(s.root), vec![s.root, s.locomotion, s.idle]);
        assert!(!tree.is_entered(s.combat));

        // Targeting below the faulty state skips its hook entirely.
        tree.change_state(s.idle, s.attack).unwrap();
        assert_eq!(tree.active_path(s.root), vec![s.root, s.combat, s.attack]);
    }

    #[test]
    fn bad_initial_child_blocks_enter() {
        let (mut tree, s) = misdirected_combat();

        assert!(tree.enter(s.combat).is_err());
        assert!(!tree.is_entered(s.combat));
        assert_eq!(tree.active_child(s.root), None);
    }

    #[test]
    fn prepare_resolves_descent_without_entering() {
        let mut s = scenario();
        s.tree.enter(s.root).unwrap();
        s.tree.change_state(s.idle, s.attack).unwrap();

        let path = s.tree.prepare(s.attack, s.root).unwrap();
        assert_eq!(path.pivot, None);
        assert_eq!(path.enter, vec![s.root]);
        assert_eq!(path.descent, vec![s.locomotion, s.idle]);
        assert_eq!(s.tree.leaf(s.root), s.attack);
    }

    #[test]
    fn intermediate_enter_states_skip_initial_child() {
        let mut s = scenario();
        s.tree.enter(s.root).unwrap();
        s.tree.change_state(s.idle, s.attack).unwrap();

        // Locomotion's initial child (Idle) must not be re-entered on the way to Run.
        s.tree.change_state(s.attack, s.run).unwrap();
        assert!(!s.tree.is_entered(s.idle));
        assert_eq!(s.tree.active_path(s.root), vec![s.root, s.locomotion, s.run]);
    }

    #[test]
    fn change_state_to_root_reenters_everything() {
        let mut s = scenario();
        s.tree.enter(s.root).unwrap();
        s.tree.change_state(s.idle, s.run).unwrap();

        s.tree.change_state(s.run, s.root).unwrap();
        assert_eq!(s.tree.active_path(s.root), vec![s.root, s.locomotion, s.idle]);
        assert!(!s.tree.is_entered(s.run));
    }

    #[test]
    fn active_below_pivot() {
        let mut s = scenario();
        s.tree.enter(s.root).unwrap();

        assert_eq!(s.tree.active_below(Some(s.root)), vec![s.locomotion, s.idle]);
        assert_eq!(
            s.tree.active_below(None),
            vec![s.root, s.locomotion, s.idle]
        );
        assert!(s.tree.active_below(Some(s.idle)).is_empty());
    }
}
