//! The planner: turns DNF goals into sequences of primitive arm actions.
//!
//! A goal formula is compiled into a goal predicate and a heuristic over
//! world states, and handed to the A* search together with the state graph.
//! The heuristic counts, per conjunction, the objects that block the moves
//! a literal still needs; every blocker costs at least a pick and a drop,
//! and only one is charged per blocker, so the estimate never exceeds the
//! true remaining cost. The formula's estimate is the minimum over its
//! conjunctions, since satisfying any one of them suffices.

use std::time::Duration;

use itertools::Itertools;
use log::info;

use crate::{
    command::Relation,
    goal::{Conjunction, DnfFormula, Literal},
    graph::{Action, StateGraph, action_between},
    interpreter::Interpretation,
    search::{SearchError, a_star},
    world::{FLOOR_ID, WorldState},
};

/// Uttered in place of a plan when the goal already holds.
pub const ALREADY_TRUE: &str = "That is already true!";

/// Default wall-clock budget for one search.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// An interpretation paired with the plan that achieves it: primitive
/// action labels interleaved with human-readable utterances.
#[derive(Clone, Debug)]
pub struct PlannerResult {
    pub interpretation: Interpretation,
    pub plan: Vec<String>,
}

/// Plans every interpretation. Failing searches are dropped as long as at
/// least one succeeds; when all fail, the first error is returned.
pub fn plan_all(
    interpretations: Vec<Interpretation>,
    state: &WorldState,
    timeout: Duration,
) -> Result<Vec<PlannerResult>, SearchError> {
    let mut first_error = None;
    let mut results = Vec::new();

    for interpretation in interpretations {
        match plan(&interpretation.goal, state, timeout) {
            Ok(plan) => results.push(PlannerResult { interpretation, plan }),
            Err(error) => first_error = first_error.or(Some(error)),
        }
    }

    match (results.is_empty(), first_error) {
        (true, Some(error)) => Err(error),
        _ => Ok(results),
    }
}

/// Searches for a cheapest action sequence from `state` to any state
/// satisfying `goal`.
pub fn plan(
    goal: &DnfFormula,
    state: &WorldState,
    timeout: Duration,
) -> Result<Vec<String>, SearchError> {
    let result = a_star(
        &StateGraph,
        state.clone(),
        |node| goal_satisfied(goal, node),
        |node| estimate_cost(goal, node),
        timeout,
    )?;

    info!(target: "planner", "plan of cost {} for goal {goal}", result.cost);

    if result.path.len() <= 1 {
        return Ok(vec![ALREADY_TRUE.to_owned()]);
    }

    let mut steps = Vec::new();
    for (previous, next) in result.path.iter().tuple_windows() {
        let action = action_between(previous, next)
            .expect("adjacent path states differ by one primitive action");
        if let Some(utterance) = describe_step(previous, action) {
            steps.push(utterance);
        }
        steps.push(action.label().to_owned());
    }
    Ok(steps)
}

fn describe_step(state: &WorldState, action: Action) -> Option<String> {
    match action {
        Action::Pick => {
            let id = state.top(state.arm)?;
            Some(format!("Picking up the {}", state.spec(id)?.describe()))
        }
        Action::Drop => {
            let id = state.holding.as_deref()?;
            Some(format!("Dropping the {}", state.spec(id)?.describe()))
        }
        Action::Left | Action::Right => None,
    }
}

/// Whether some conjunction of `goal` holds in `state`.
pub fn goal_satisfied(goal: &DnfFormula, state: &WorldState) -> bool {
    goal.conjunctions.iter().any(|conjunction| conjunction_satisfied(conjunction, state))
}

fn conjunction_satisfied(conjunction: &Conjunction, state: &WorldState) -> bool {
    conjunction.0.iter().all(|literal| literal_holds(literal, state))
}

/// Whether one literal holds. A binary relation is not observable while the
/// arm holds either of its arguments.
fn literal_holds(literal: &Literal, state: &WorldState) -> bool {
    if literal.relation == Relation::Holding {
        let holds = state.holding.as_deref() == Some(literal.args[0].as_str());
        return holds == literal.polarity;
    }

    let (a, b) = (literal.args[0].as_str(), literal.args[1].as_str());
    if state.holding.as_deref().is_some_and(|held| held == a || held == b) {
        return false;
    }

    let holds = match literal.relation {
        Relation::OnTop | Relation::Inside if b == FLOOR_ID => {
            state.position(a).is_some_and(|(_, height)| height == 0)
        }
        Relation::OnTop | Relation::Inside => match (state.position(a), state.position(b)) {
            (Some((col_a, height_a)), Some((col_b, height_b))) => {
                col_a == col_b && height_a == height_b + 1
            }
            _ => false,
        },
        Relation::Above | Relation::Under => match (state.position(a), state.position(b)) {
            (Some((col_a, height_a)), Some((col_b, height_b))) if col_a == col_b => {
                if literal.relation == Relation::Above {
                    height_a > height_b
                } else {
                    height_a < height_b
                }
            }
            _ => false,
        },
        Relation::LeftOf | Relation::RightOf | Relation::Beside => {
            match (state.position(a), state.position(b)) {
                (Some((col_a, _)), Some((col_b, _))) => match literal.relation {
                    Relation::LeftOf => col_a < col_b,
                    Relation::RightOf => col_a > col_b,
                    _ => col_a.abs_diff(col_b) == 1,
                },
                _ => false,
            }
        }
        Relation::Holding => unreachable!("handled above"),
    };
    holds == literal.polarity
}

/// Lower bound on the actions remaining before `goal` holds in `state`.
pub fn estimate_cost(goal: &DnfFormula, state: &WorldState) -> usize {
    goal.conjunctions
        .iter()
        .map(|conjunction| conjunction_estimate(conjunction, state))
        .min()
        .unwrap_or(0)
}

fn conjunction_estimate(conjunction: &Conjunction, state: &WorldState) -> usize {
    conjunction.0.iter().map(|literal| literal_estimate(literal, state)).sum()
}

/// Counts the objects that must be unstacked before the literal can be
/// established. Already-satisfied and negative literals cost nothing.
fn literal_estimate(literal: &Literal, state: &WorldState) -> usize {
    if !literal.polarity || literal_holds(literal, state) {
        return 0;
    }

    match literal.relation {
        Relation::Holding => state.blockers_above(&literal.args[0]),
        Relation::OnTop | Relation::Inside => {
            let moved = state.blockers_above(&literal.args[0]);
            let dest = if literal.args[1] == FLOOR_ID {
                // Clearing the shortest column exposes a floor cell.
                state.stacks.iter().map(Vec::len).min().unwrap_or(0)
            } else {
                state.blockers_above(&literal.args[1])
            };
            moved + dest
        }
        Relation::Above => state.blockers_above(&literal.args[0]),
        Relation::Under => state.blockers_above(&literal.args[1]),
        Relation::LeftOf | Relation::RightOf | Relation::Beside => state
            .blockers_above(&literal.args[0])
            .min(state.blockers_above(&literal.args[1])),
    }
}
