//! Parse trees for user commands, as delivered by the external parser.
//!
//! The parser runs outside this crate and ships its parses as JSON; the
//! types here mirror that wire shape. Referring expressions nest: an entity
//! is a quantifier plus an object description, and a description may itself
//! be constrained by a location clause ("the ball in the large box").

use std::fmt::{Display, Formatter};

use derive_more::IsVariant;
use serde::{Deserialize, Serialize};

use crate::world::{Color, Form, Size};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(IsVariant)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
    The,
    Any,
    All,
}

/// A spatial relation between two objects. `Holding` is unary and only ever
/// appears in goal literals, never in a location clause.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(IsVariant)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    LeftOf,
    RightOf,
    Above,
    Under,
    OnTop,
    Inside,
    Beside,
    Holding,
}

impl Relation {
    /// Whether this relation places the moved object directly on the
    /// destination. Only one object fits directly on any given support.
    pub const fn is_support(self) -> bool {
        matches!(self, Relation::OnTop | Relation::Inside)
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Relation::LeftOf => "leftof",
            Relation::RightOf => "rightof",
            Relation::Above => "above",
            Relation::Under => "under",
            Relation::OnTop => "ontop",
            Relation::Inside => "inside",
            Relation::Beside => "beside",
            Relation::Holding => "holding",
        };
        write!(f, "{name}")
    }
}

/// A description of one or more objects. Absent fields match anything, as
/// does the [`Form::AnyForm`] wildcard.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectDesc {
    /// A description further constrained by where the object stands.
    Relative { description: Box<ObjectDesc>, location: Location },
    Flat {
        #[serde(default)]
        form: Option<Form>,
        #[serde(default)]
        size: Option<Size>,
        #[serde(default)]
        color: Option<Color>,
    },
}

impl ObjectDesc {
    /// English rendering of the attribute part of the description, for error
    /// messages: `"large red box"`, or `"object"` when fully unconstrained.
    pub fn describe(&self) -> String {
        match self {
            ObjectDesc::Relative { description, .. } => description.describe(),
            ObjectDesc::Flat { form, size, color } => {
                let mut words = Vec::new();
                if let Some(size) = size {
                    words.push(size.to_string());
                }
                if let Some(color) = color {
                    words.push(color.to_string());
                }
                words.push(form.unwrap_or(Form::AnyForm).to_string());
                words.join(" ")
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
pub struct Entity {
    pub quantifier: Quantifier,
    pub object: ObjectDesc,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
pub struct Location {
    pub relation: Relation,
    pub entity: Box<Entity>,
}

/// One parsed command. `Put` has no source entity: it places whatever the
/// arm is currently holding.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    Take { entity: Entity },
    Move { entity: Entity, location: Location },
    Put { location: Location },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trees_deserialize_from_json() {
        let json = r#"{
            "command": "move",
            "entity": {
                "quantifier": "any",
                "object": { "form": "ball" }
            },
            "location": {
                "relation": "inside",
                "entity": {
                    "quantifier": "the",
                    "object": {
                        "description": { "form": "box" },
                        "location": {
                            "relation": "ontop",
                            "entity": {
                                "quantifier": "the",
                                "object": { "form": "floor" }
                            }
                        }
                    }
                }
            }
        }"#;

        let command: Command = serde_json::from_str(json).unwrap();
        let Command::Move { entity, location } = command else {
            panic!("expected a move command");
        };
        assert_eq!(entity.quantifier, Quantifier::Any);
        assert_eq!(location.relation, Relation::Inside);
        assert!(matches!(location.entity.object, ObjectDesc::Relative { .. }));
    }

    #[test]
    fn descriptions_render_for_messages() {
        let desc = ObjectDesc::Flat {
            form: Some(Form::Box),
            size: Some(Size::Large),
            color: Some(Color::Red),
        };
        assert_eq!(desc.describe(), "large red box");

        let bare = ObjectDesc::Flat { form: None, size: None, color: None };
        assert_eq!(bare.describe(), "object");
    }

    #[test]
    fn relations_print_their_wire_names() {
        assert_eq!(Relation::LeftOf.to_string(), "leftof");
        assert_eq!(Relation::OnTop.to_string(), "ontop");
        assert!(Relation::Inside.is_support());
        assert!(!Relation::Beside.is_support());
    }
}
