//! The implicit graph of world states under the four primitive arm actions.
//!
//! Nodes are [`WorldState`]s; edges cost 1 each. Successors are generated
//! on demand and never mutate their input state: each action works on a
//! clone, so tentative successors of one node are independent.

use std::fmt::{Display, Formatter};

use enum_iterator::{Sequence, all};

use crate::{
    command::Relation,
    physics::is_valid,
    search::{Edge, SearchGraph},
    world::{FLOOR_ID, Form, WorldState},
};

/// One primitive arm action.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Sequence)]
pub enum Action {
    Left,
    Right,
    Pick,
    Drop,
}

impl Action {
    /// The single-letter label used in plans.
    pub const fn label(self) -> &'static str {
        match self {
            Action::Left => "l",
            Action::Right => "r",
            Action::Pick => "p",
            Action::Drop => "d",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The successor of `state` under `action`, or `None` when the action is
/// not legal there.
pub fn apply(state: &WorldState, action: Action) -> Option<WorldState> {
    let mut next = state.clone();
    match action {
        Action::Left => {
            if next.arm == 0 {
                return None;
            }
            next.arm -= 1;
        }
        Action::Right => {
            if next.arm + 1 >= next.stacks.len() {
                return None;
            }
            next.arm += 1;
        }
        Action::Pick => {
            if next.holding.is_some() {
                return None;
            }
            let top = next.stacks[next.arm].pop()?;
            next.holding = Some(top);
        }
        Action::Drop => {
            let held = next.holding.take()?;
            let dest = state.top(state.arm).unwrap_or(FLOOR_ID);
            let relation = match state.spec(dest).map(|spec| spec.form) {
                Some(Form::Box) => Relation::Inside,
                _ => Relation::OnTop,
            };
            if !is_valid(state, &held, dest, relation) {
                return None;
            }
            next.stacks[next.arm].push(held);
        }
    }
    Some(next)
}

/// The action leading from `from` to `to`, if they are one primitive apart.
pub fn action_between(from: &WorldState, to: &WorldState) -> Option<Action> {
    all::<Action>().find(|&action| apply(from, action).as_ref() == Some(to))
}

/// The blocks world as a search graph.
pub struct StateGraph;

impl SearchGraph for StateGraph {
    type Node = WorldState;

    fn outgoing_edges(&self, node: &WorldState) -> Vec<Edge<WorldState>> {
        all::<Action>()
            .filter_map(|action| apply(node, action).map(|to| Edge { to, cost: 1 }))
            .collect()
    }
}
