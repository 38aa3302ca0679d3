//! Interprets parsed commands against the current world.
//!
//! A command's referring expressions are resolved to concrete identifiers,
//! candidate placements are filtered through the physical laws, and the
//! surviving readings are emitted as a DNF goal formula.
//!
//! The quantifier pair of a move decides the shape of the formula. Two
//! non-obvious readings are produced deliberately:
//!
//! - "any X ... every Y" groups the legal pairs by source and takes the
//!   cartesian product of the groups, so each X may be matched with a
//!   different Y;
//! - "every X ... some Y" splits the flat list of legal pairs into
//!   near-equal consecutive slices, one disjunct per slice, so each X gets
//!   one Y without all of them having to share it.

use itertools::Itertools;
use log::debug;
use thiserror::Error;

use crate::{
    command::{Command, Entity, Location, ObjectDesc, Quantifier, Relation},
    goal::{Conjunction, DnfFormula, Literal},
    physics::is_valid,
    world::{FLOOR_ID, Form, ObjectSpec, WorldState},
};

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum InterpretError {
    /// A referring expression matched nothing in the world.
    #[error("there is no {0} here")]
    NoMatchingObject(String),
    /// Every candidate placement violates a physical law, or the quantifier
    /// combination is unsatisfiable outright.
    #[error("that cannot be done: {0}")]
    NoValidInterpretation(String),
    /// A `the` expression picked out several objects; the message enumerates
    /// them so the user can clarify.
    #[error("ambiguous reference, did you mean {0}?")]
    AmbiguousThe(String),
}

/// One successfully interpreted parse: the command together with the goal
/// formula it was lowered to.
#[derive(Clone, Debug)]
pub struct Interpretation {
    pub command: Command,
    pub goal: DnfFormula,
}

/// Interprets every parse against the world. Failing parses are dropped as
/// long as at least one succeeds; when all fail, the first error is
/// returned. Ambiguity is surfaced immediately even when another parse
/// succeeds, since the user needs the clarification either way.
pub fn interpret_all(
    parses: &[Command],
    state: &WorldState,
) -> Result<Vec<Interpretation>, InterpretError> {
    let mut first_error = None;
    let mut interpretations = Vec::new();

    for command in parses {
        match interpret(command, state) {
            Ok(goal) => interpretations.push(Interpretation { command: command.clone(), goal }),
            Err(ambiguous @ InterpretError::AmbiguousThe(_)) => return Err(ambiguous),
            Err(error) => first_error = first_error.or(Some(error)),
        }
    }

    match (interpretations.is_empty(), first_error) {
        (true, Some(error)) => Err(error),
        _ => Ok(interpretations),
    }
}

/// Lowers one command to a DNF goal.
pub fn interpret(command: &Command, state: &WorldState) -> Result<DnfFormula, InterpretError> {
    let goal = match command {
        Command::Take { entity } => interpret_take(entity, state)?,
        Command::Move { entity, location } => {
            let sources = resolve_entity(&entity.object, state)?;
            let destinations = resolve_entity(&location.entity.object, state)?;
            build_goal(
                state,
                location.relation,
                &sources,
                entity.quantifier,
                &destinations,
                location.entity.quantifier,
            )?
        }
        Command::Put { location } => {
            let Some(held) = state.holding.clone() else {
                return Err(InterpretError::NoMatchingObject("object in the arm".to_owned()));
            };
            let destinations = resolve_entity(&location.entity.object, state)?;
            build_goal(
                state,
                location.relation,
                &[held],
                Quantifier::The,
                &destinations,
                location.entity.quantifier,
            )?
        }
    };

    debug!(target: "interpreter", "goal: {goal}");
    Ok(goal)
}

fn interpret_take(entity: &Entity, state: &WorldState) -> Result<DnfFormula, InterpretError> {
    let candidates = resolve_entity(&entity.object, state)?;
    let candidates: Vec<String> =
        candidates.into_iter().filter(|id| id != FLOOR_ID).collect();

    if candidates.is_empty() {
        return Err(InterpretError::NoValidInterpretation(
            "the floor cannot be picked up".to_owned(),
        ));
    }
    if entity.quantifier.is_the() && candidates.len() > 1 {
        return Err(InterpretError::AmbiguousThe(describe_options(state, &candidates)));
    }

    Ok(DnfFormula::new(
        candidates.into_iter().map(|id| Conjunction(vec![Literal::holding(id)])),
    ))
}

/// Resolves an entity's description to identifiers, including the held
/// object when its attributes match. Empty resolution is an error.
fn resolve_entity(desc: &ObjectDesc, state: &WorldState) -> Result<Vec<String>, InterpretError> {
    let mut ids = match filter(desc, state) {
        Ok(ids) => ids,
        // The description may still pick out the held object, which is not
        // part of any stack.
        Err(InterpretError::NoMatchingObject(_)) if state.holding.is_some() => Vec::new(),
        Err(error) => return Err(error),
    };

    if let Some(held) = state.holding.as_deref()
        && !ids.iter().any(|id| id == held)
        && state.spec(held).is_some_and(|spec| attrs_match(desc, spec))
    {
        ids.push(held.to_owned());
    }

    if ids.is_empty() {
        return Err(InterpretError::NoMatchingObject(desc.describe()));
    }
    Ok(ids)
}

/// Every stacked identifier matching the description. A location clause is
/// resolved first and intersected with the attribute constraints; the floor
/// description resolves to the `"floor"` sentinel.
fn filter(desc: &ObjectDesc, state: &WorldState) -> Result<Vec<String>, InterpretError> {
    let found: Vec<String> = match desc {
        ObjectDesc::Flat { form: Some(Form::Floor), .. } => vec![FLOOR_ID.to_owned()],
        ObjectDesc::Flat { .. } => state
            .stacked_ids()
            .filter(|id| state.spec(id).is_some_and(|spec| attrs_match(desc, spec)))
            .map(str::to_owned)
            .collect(),
        ObjectDesc::Relative { description, location } => {
            let related = filter_relations(location, state)?;
            filter(description, state)?
                .into_iter()
                .filter(|id| related.contains(id))
                .collect()
        }
    };

    if found.is_empty() {
        return Err(InterpretError::NoMatchingObject(desc.describe()));
    }
    Ok(found)
}

/// Every identifier standing in the location's relation to some resolver of
/// its entity.
fn filter_relations(
    location: &Location,
    state: &WorldState,
) -> Result<Vec<String>, InterpretError> {
    let delimiters = filter(&location.entity.object, state)?;

    let mut found: Vec<String> = Vec::new();
    for delimiter in &delimiters {
        for id in related_ids(location.relation, delimiter, state) {
            if !found.contains(&id) {
                found.push(id);
            }
        }
    }
    Ok(found)
}

fn related_ids(relation: Relation, delimiter: &str, state: &WorldState) -> Vec<String> {
    use Relation::*;

    match relation {
        LeftOf | RightOf | Beside => {
            let Some((col, _)) = state.position(delimiter) else {
                return Vec::new();
            };
            let keep = |other: usize| match relation {
                LeftOf => other < col,
                RightOf => other > col,
                _ => other + 1 == col || other == col + 1,
            };
            state
                .stacks
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .flat_map(|(_, stack)| stack.iter().cloned())
                .collect()
        }
        Above if delimiter == FLOOR_ID => bottom_ids(state),
        Above => {
            let Some((col, height)) = state.position(delimiter) else {
                return Vec::new();
            };
            state.stacks[col][height + 1..].to_vec()
        }
        Under => {
            let Some((col, height)) = state.position(delimiter) else {
                return Vec::new();
            };
            state.stacks[col][..height].to_vec()
        }
        // Only boxes have an inside, and only non-boxes have a top surface.
        Inside if form_of(state, delimiter) == Some(Form::Box) => {
            directly_atop(delimiter, state).into_iter().collect()
        }
        OnTop if delimiter == FLOOR_ID => bottom_ids(state),
        OnTop if form_of(state, delimiter) != Some(Form::Box) => {
            directly_atop(delimiter, state).into_iter().collect()
        }
        Inside | OnTop | Holding => Vec::new(),
    }
}

fn form_of(state: &WorldState, id: &str) -> Option<Form> {
    state.spec(id).map(|spec| spec.form)
}

fn bottom_ids(state: &WorldState) -> Vec<String> {
    state.stacks.iter().filter_map(|stack| stack.first().cloned()).collect()
}

fn directly_atop(delimiter: &str, state: &WorldState) -> Option<String> {
    let (col, height) = state.position(delimiter)?;
    state.stacks[col].get(height + 1).cloned()
}

fn attrs_match(desc: &ObjectDesc, spec: ObjectSpec) -> bool {
    match desc {
        // Location clauses are positional and do not constrain attributes.
        ObjectDesc::Relative { description, .. } => attrs_match(description, spec),
        ObjectDesc::Flat { form, size, color } => {
            form.is_none_or(|form| form == Form::AnyForm || form == spec.form)
                && size.is_none_or(|size| Some(size) == spec.size)
                && color.is_none_or(|color| Some(color) == spec.color)
        }
    }
}

/// Builds the DNF for a move from the resolved source and destination sets,
/// keeping only pairs the physical laws allow. The quantifier pair decides
/// how the legal pairs are distributed over disjuncts.
fn build_goal(
    state: &WorldState,
    relation: Relation,
    sources: &[String],
    source_q: Quantifier,
    destinations: &[String],
    destination_q: Quantifier,
) -> Result<DnfFormula, InterpretError> {
    // Only one object fits directly on any given support.
    if source_q.is_all() && destination_q.is_all() && relation.is_support() {
        return Err(InterpretError::NoValidInterpretation(format!(
            "several objects cannot all be {relation} several others"
        )));
    }

    let pairs: Vec<(&str, &str)> = sources
        .iter()
        .cartesian_product(destinations.iter())
        .filter(|(source, dest)| is_valid(state, source, dest, relation))
        .map(|(source, dest)| (source.as_str(), dest.as_str()))
        .collect();

    if pairs.is_empty() {
        return Err(InterpretError::NoValidInterpretation(
            "every such placement violates a physical law".to_owned(),
        ));
    }

    let literal = |&(source, dest): &(&str, &str)| Literal::relates(relation, source, dest);

    let conjunctions: Vec<Conjunction> = if (source_q.is_any()
        && destination_q.is_all()
        && destinations.len() > 1
        && relation.is_support())
        || (source_q.is_all() && destination_q.is_any() && sources.len() > 1)
    {
        // Each source may be matched with a different destination: group the
        // legal pairs by source and take the product across the groups.
        let mut groups: Vec<Vec<&(&str, &str)>> = Vec::new();
        for source in sources {
            let group: Vec<_> =
                pairs.iter().filter(|(s, _)| *s == source.as_str()).collect();
            if group.is_empty() {
                if source_q.is_all() {
                    return Err(InterpretError::NoValidInterpretation(format!(
                        "there is no legal destination for {source}"
                    )));
                }
                continue;
            }
            groups.push(group);
        }
        groups
            .into_iter()
            .multi_cartesian_product()
            .map(|combo| Conjunction(combo.into_iter().map(literal).collect()))
            .collect()
    } else if source_q.is_any() && destination_q.is_all() && !relation.is_support() {
        // Each source gets one destination without all of them sharing it.
        split_slices(&pairs, sources.len())
            .into_iter()
            .map(|slice| Conjunction(slice.iter().map(literal).collect()))
            .collect()
    } else if (source_q.is_the() && destination_q.is_all())
        || (source_q.is_all() && destination_q.is_the())
    {
        if relation.is_support() && destinations.iter().any(|dest| dest != FLOOR_ID) {
            return Err(InterpretError::NoValidInterpretation(format!(
                "several objects cannot share one {relation} destination"
            )));
        }
        let the_side: Vec<&str> = if source_q.is_the() {
            pairs.iter().map(|(s, _)| *s).unique().collect()
        } else {
            pairs.iter().map(|(_, d)| *d).unique().collect()
        };
        if the_side.len() > 1 {
            return Err(InterpretError::AmbiguousThe(describe_options(state, &the_side)));
        }
        vec![Conjunction(pairs.iter().map(literal).collect())]
    } else if (source_q.is_all() && sources.len() > 1) || destination_q.is_all() {
        vec![Conjunction(pairs.iter().map(literal).collect())]
    } else {
        let conjunctions: Vec<Conjunction> =
            pairs.iter().map(|pair| Conjunction(vec![literal(pair)])).collect();
        if conjunctions.len() > 1 {
            if source_q.is_the() {
                let candidates: Vec<&str> = pairs.iter().map(|(s, _)| *s).unique().collect();
                if candidates.len() > 1 {
                    return Err(InterpretError::AmbiguousThe(
                        describe_options(state, &candidates),
                    ));
                }
            }
            if destination_q.is_the() {
                let candidates: Vec<&str> = pairs.iter().map(|(_, d)| *d).unique().collect();
                if candidates.len() > 1 {
                    return Err(InterpretError::AmbiguousThe(
                        describe_options(state, &candidates),
                    ));
                }
            }
        }
        conjunctions
    };

    Ok(DnfFormula::new(conjunctions))
}

/// Splits `pairs` into `count` near-equal consecutive slices.
fn split_slices<'a>(pairs: &'a [(&'a str, &'a str)], count: usize) -> Vec<&'a [(&'a str, &'a str)]> {
    let count = count.clamp(1, pairs.len());
    let base = pairs.len() / count;
    let extra = pairs.len() % count;

    let mut slices = Vec::with_capacity(count);
    let mut start = 0;
    for i in 0..count {
        let len = base + usize::from(i < extra);
        slices.push(&pairs[start..start + len]);
        start += len;
    }
    slices
}

/// `"the large white ball (stack 1) or the small black ball (stack 5)"`,
/// with stacks numbered from 1 and the held object called out as such.
fn describe_options<S: AsRef<str>>(state: &WorldState, ids: &[S]) -> String {
    ids.iter()
        .map(|id| {
            let id = id.as_ref();
            let description =
                state.spec(id).map_or_else(|| id.to_owned(), |spec| spec.describe());
            match state.position(id) {
                Some((col, _)) => format!("the {description} (stack {})", col + 1),
                None => format!("the {description} (in the arm)"),
            }
        })
        .join(" or ")
}
