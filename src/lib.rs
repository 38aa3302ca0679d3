//! # Shrdlite core
//!
//! Plans natural-language commands about a blocks world: a row of stacks of
//! shaped, sized, colored objects, manipulated by a single overhead arm.
//!
//! The pipeline runs in three stages. An external parser delivers
//! [`Command`] parse trees; the [`interpreter`] resolves their referring
//! expressions against the current [`WorldState`] and lowers each parse to
//! a goal formula in disjunctive normal form; the [`planner`] compiles the
//! formula into a goal predicate and an admissible heuristic and runs an A*
//! [`search`] over the implicit [`graph`] of world states, whose edges are
//! the four primitive arm actions (`l`, `r`, `p`, `d`). Both the
//! interpreter and the state graph defer to the same [`physics`] predicate,
//! so the planner is never asked to reach a state the world forbids.

use std::time::Duration;

use thiserror::Error;

pub mod command;
pub mod goal;
pub mod graph;
pub mod interpreter;
pub mod physics;
pub mod planner;
pub mod search;
pub mod world;

pub use command::{Command, Entity, Location, ObjectDesc, Quantifier, Relation};
pub use goal::{Conjunction, DnfFormula, Literal};
pub use interpreter::{InterpretError, Interpretation, interpret, interpret_all};
pub use planner::{ALREADY_TRUE, DEFAULT_TIMEOUT, PlannerResult, plan, plan_all};
pub use search::SearchError;
pub use world::{ObjectSpec, WorldState};

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum PipelineError {
    /// The external parser produced no parses at all.
    #[error("the utterance could not be parsed")]
    NoParses,
    #[error(transparent)]
    Interpret(#[from] InterpretError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Runs the full pipeline for one utterance: every parse is interpreted
/// against `state`, and every surviving interpretation is planned. Errors
/// in individual parses are suppressed as long as some parse makes it all
/// the way through; ambiguity is reported regardless.
pub fn process(
    parses: &[Command],
    state: &WorldState,
    timeout: Duration,
) -> Result<Vec<PlannerResult>, PipelineError> {
    if parses.is_empty() {
        return Err(PipelineError::NoParses);
    }
    let interpretations = interpret_all(parses, state)?;
    let results = plan_all(interpretations, state, timeout)?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{Action, apply},
        planner::goal_satisfied,
        world::{Color, Form, fixtures::small_world},
    };

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn entity(quantifier: Quantifier, form: Option<Form>, color: Option<Color>) -> Entity {
        Entity { quantifier, object: ObjectDesc::Flat { form, size: None, color } }
    }

    fn replay(plan: &[String], state: &WorldState) -> WorldState {
        let mut current = state.clone();
        for step in plan {
            let action = match step.as_str() {
                "l" => Action::Left,
                "r" => Action::Right,
                "p" => Action::Pick,
                "d" => Action::Drop,
                _ => continue,
            };
            current = apply(&current, action)
                .unwrap_or_else(|| panic!("illegal step {step:?} in {current}"));
        }
        current
    }

    #[test]
    fn an_empty_parse_list_is_rejected() {
        assert!(matches!(
            process(&[], &small_world(), DEFAULT_TIMEOUT),
            Err(PipelineError::NoParses)
        ));
    }

    #[test]
    fn a_command_runs_end_to_end() {
        init_logging();
        let world = small_world();

        // "take a blue object"
        let parses =
            vec![Command::Take { entity: entity(Quantifier::Any, None, Some(Color::Blue)) }];
        let results = process(&parses, &world, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(results.len(), 1);

        let end = replay(&results[0].plan, &world);
        assert!(goal_satisfied(&results[0].interpretation.goal, &end));
    }

    #[test]
    fn a_vacuous_command_reports_already_true() {
        let world = small_world();

        // "put all balls on the floor" - they already are.
        let parses = vec![Command::Move {
            entity: entity(Quantifier::All, Some(Form::Ball), None),
            location: Location {
                relation: Relation::OnTop,
                entity: Box::new(entity(Quantifier::The, Some(Form::Floor), None)),
            },
        }];
        let results = process(&parses, &world, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(results[0].plan, vec![ALREADY_TRUE.to_owned()]);
    }

    #[test]
    fn ambiguity_reaches_the_caller() {
        let world = small_world();
        let parses = vec![Command::Take { entity: entity(Quantifier::The, Some(Form::Ball), None) }];
        assert!(matches!(
            process(&parses, &world, DEFAULT_TIMEOUT),
            Err(PipelineError::Interpret(InterpretError::AmbiguousThe(_)))
        ));
    }

    #[test]
    fn interpretation_errors_name_the_missing_object() {
        let world = small_world();
        let parses =
            vec![Command::Take { entity: entity(Quantifier::Any, Some(Form::Pyramid), None) }];
        let error = process(&parses, &world, DEFAULT_TIMEOUT).unwrap_err();
        assert_eq!(error.to_string(), "there is no pyramid here");
    }
}
