//! The blocks world: object attributes, stacks, and the overhead arm.
//!
//! A world is a row of stacks (bottom-first) of small/large colored objects,
//! plus a single arm that occupies one column at a time and can hold at most
//! one object. The attribute table is shared read-only between all clones of
//! a state; stacks, the arm column and the held object are copied by value,
//! so successor states are cheap to produce and compare.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

use anyhow::bail;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Identifier of the floor sentinel. Never appears in a stack.
pub const FLOOR_ID: &str = "floor";

/// The shape of an object. `Floor` is the sentinel base of every stack and
/// `AnyForm` is the wildcard used in object descriptions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Brick,
    Plank,
    Ball,
    Pyramid,
    Box,
    Table,
    Floor,
    AnyForm,
}

impl Display for Form {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Form::Brick => "brick",
            Form::Plank => "plank",
            Form::Ball => "ball",
            Form::Pyramid => "pyramid",
            Form::Box => "box",
            Form::Table => "table",
            Form::Floor => "floor",
            Form::AnyForm => "object",
        };
        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    Large,
}

impl Display for Size {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Size::Small => "small",
            Size::Large => "large",
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
    Red,
    Green,
    Blue,
    Yellow,
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Color::Black => "black",
            Color::White => "white",
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
        })
    }
}

/// Attributes of one physical object. Size and color are absent for the
/// floor sentinel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
pub struct ObjectSpec {
    pub form: Form,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub color: Option<Color>,
}

/// Attributes of the floor sentinel.
pub const FLOOR: ObjectSpec = ObjectSpec { form: Form::Floor, size: None, color: None };

impl ObjectSpec {
    pub const fn new(form: Form, size: Size, color: Color) -> Self {
        ObjectSpec { form, size: Some(size), color: Some(color) }
    }

    /// Human-readable description, e.g. `"large white ball"`. Used for
    /// ambiguity clarifications and plan utterances.
    pub fn describe(&self) -> String {
        let mut words = Vec::new();
        if let Some(size) = self.size {
            words.push(size.to_string());
        }
        if let Some(color) = self.color {
            words.push(color.to_string());
        }
        words.push(self.form.to_string());
        words.join(" ")
    }
}

/// One snapshot of the world.
///
/// Equality, hashing and the [`Display`] form all derive from the tuple
/// `(arm, holding, stacks)`; the attribute table does not participate, and
/// is shared between clones.
#[derive(Clone, Debug)]
pub struct WorldState {
    objects: Arc<HashMap<String, ObjectSpec>>,
    pub stacks: Vec<Vec<String>>,
    pub arm: usize,
    pub holding: Option<String>,
}

impl WorldState {
    pub fn new(
        objects: HashMap<String, ObjectSpec>,
        stacks: Vec<Vec<String>>,
        arm: usize,
        holding: Option<String>,
    ) -> Self {
        WorldState { objects: Arc::new(objects), stacks, arm, holding }
    }

    /// Attributes of `id`, with the `"floor"` sentinel resolving to [`FLOOR`].
    pub fn spec(&self, id: &str) -> Option<ObjectSpec> {
        if id == FLOOR_ID {
            return Some(FLOOR);
        }
        self.objects.get(id).copied()
    }

    /// Every identifier currently in some stack, left to right, bottom up.
    /// The held object (if any) is not included.
    pub fn stacked_ids(&self) -> impl Iterator<Item = &str> {
        self.stacks.iter().flatten().map(String::as_str)
    }

    /// `(column, height)` of `id`, or `None` when `id` is held or unknown.
    pub fn position(&self, id: &str) -> Option<(usize, usize)> {
        self.stacks.iter().enumerate().find_map(|(col, stack)| {
            stack.iter().position(|x| x == id).map(|height| (col, height))
        })
    }

    /// The topmost identifier of a column, if the column is non-empty.
    pub fn top(&self, col: usize) -> Option<&str> {
        self.stacks.get(col)?.last().map(String::as_str)
    }

    /// How many objects sit above `id` in its stack. Zero when `id` is held
    /// or is not a stacked object.
    pub fn blockers_above(&self, id: &str) -> usize {
        match self.position(id) {
            Some((col, height)) => self.stacks[col].len() - height - 1,
            None => 0,
        }
    }

    /// Checks the structural invariants of a state: the arm is within the
    /// row, every stacked identifier is known and appears exactly once, the
    /// held identifier is known and not stacked, and the floor sentinel is
    /// never stacked or held.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.arm >= self.stacks.len() {
            bail!("arm column {} is outside the row of {} stacks", self.arm, self.stacks.len());
        }

        let mut seen: Vec<&str> = Vec::new();
        for id in self.stacked_ids().chain(self.holding.as_deref()) {
            if id == FLOOR_ID {
                bail!("the floor sentinel cannot be stacked or held");
            }
            if !self.objects.contains_key(id) {
                bail!("identifier {id:?} is not in the object table");
            }
            if seen.contains(&id) {
                bail!("identifier {id:?} appears more than once");
            }
            seen.push(id);
        }

        Ok(())
    }
}

impl PartialEq for WorldState {
    fn eq(&self, other: &Self) -> bool {
        self.arm == other.arm && self.holding == other.holding && self.stacks == other.stacks
    }
}

impl Eq for WorldState {}

impl Hash for WorldState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arm.hash(state);
        self.holding.hash(state);
        self.stacks.hash(state);
    }
}

impl Display for WorldState {
    /// Deterministic form `"(arm, holding, stack0|stack1|…)"`, stacks joined
    /// bottom-up. Two states are equal iff their display forms are equal.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.arm,
            self.holding.as_deref().unwrap_or("-"),
            self.stacks.iter().map(|stack| stack.iter().join(",")).join("|")
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use super::*;

    /// The small demonstration world:
    /// stacks `[e] [l,g,m] [k] [] [f]`, arm at column 0, nothing held.
    pub(crate) fn small_world() -> WorldState {
        let objects = HashMap::from([
            ("e".to_owned(), ObjectSpec::new(Form::Ball, Size::Large, Color::White)),
            ("f".to_owned(), ObjectSpec::new(Form::Ball, Size::Small, Color::Black)),
            ("g".to_owned(), ObjectSpec::new(Form::Table, Size::Large, Color::Blue)),
            ("k".to_owned(), ObjectSpec::new(Form::Box, Size::Large, Color::Yellow)),
            ("l".to_owned(), ObjectSpec::new(Form::Box, Size::Large, Color::Red)),
            ("m".to_owned(), ObjectSpec::new(Form::Box, Size::Small, Color::Red)),
        ]);
        let stacks = vec![
            vec!["e".to_owned()],
            vec!["l".to_owned(), "g".to_owned(), "m".to_owned()],
            vec!["k".to_owned()],
            vec![],
            vec!["f".to_owned()],
        ];
        WorldState::new(objects, stacks, 0, None)
    }
}

#[cfg(test)]
mod tests {
    use assertables::assert_all;

    use super::{fixtures::small_world, *};

    #[test]
    fn positions_and_tops() {
        let world = small_world();

        assert_eq!(world.position("e"), Some((0, 0)));
        assert_eq!(world.position("g"), Some((1, 1)));
        assert_eq!(world.position("floor"), None);
        assert_eq!(world.top(1), Some("m"));
        assert_eq!(world.top(3), None);
        assert_eq!(world.blockers_above("l"), 2);
        assert_eq!(world.blockers_above("m"), 0);
    }

    #[test]
    fn display_is_deterministic() {
        let world = small_world();
        assert_eq!(world.to_string(), "(0, -, e|l,g,m|k||f)");

        let mut held = world.clone();
        held.holding = Some(held.stacks[0].pop().unwrap());
        assert_eq!(held.to_string(), "(0, e, |l,g,m|k||f)");
        assert_ne!(world, held);
    }

    #[test]
    fn clones_share_the_object_table() {
        let world = small_world();
        let clone = world.clone();
        assert!(Arc::ptr_eq(&world.objects, &clone.objects));
        assert_eq!(world, clone);
    }

    #[test]
    fn valid_world_passes_validation() {
        let world = small_world();
        world.validate().unwrap();
        assert_all!(
            world.stacked_ids().collect::<Vec<_>>().iter(),
            |id: &&str| world.spec(id).is_some()
        );
    }

    #[test]
    fn validation_rejects_duplicates_and_strays() {
        let mut world = small_world();
        world.stacks[3].push("e".to_owned());
        assert!(world.validate().is_err());

        let mut world = small_world();
        world.stacks[3].push("z".to_owned());
        assert!(world.validate().is_err());

        let mut world = small_world();
        world.arm = 9;
        assert!(world.validate().is_err());
    }

    #[test]
    fn floor_spec_is_bare() {
        let world = small_world();
        let floor = world.spec(FLOOR_ID).unwrap();
        assert_eq!(floor.form, Form::Floor);
        assert_eq!(floor.size, None);
        assert_eq!(floor.color, None);
        assert_eq!(floor.describe(), "floor");
    }
}
