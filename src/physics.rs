//! Physical laws of the blocks world.
//!
//! [`is_valid`] is the single source of truth for which placements are
//! legal. The interpreter consults it when filtering candidate goal pairs,
//! and the state graph consults it when deciding whether the arm may drop
//! what it is holding. Keeping one predicate guarantees the planner never
//! chases a goal the world forbids.

use crate::{
    command::Relation,
    world::{Form, Size, WorldState},
};

/// Whether `moved` may lawfully stand in `relation` to `dest`.
///
/// Unknown identifiers fail the check; the `"floor"` sentinel resolves to
/// the floor attributes.
pub fn is_valid(state: &WorldState, moved: &str, dest: &str, relation: Relation) -> bool {
    use Relation::*;

    let Some(moved_spec) = state.spec(moved) else {
        return false;
    };
    let Some(dest_spec) = state.spec(dest) else {
        return false;
    };

    let small = |size: Option<Size>| size == Some(Size::Small);
    let large = |size: Option<Size>| size == Some(Size::Large);

    // Small objects cannot support large objects.
    if large(moved_spec.size) && small(dest_spec.size) && relation.is_support() {
        return false;
    }

    // Balls cannot support anything.
    if moved_spec.form == Form::Ball && relation == Under {
        return false;
    }

    // Balls must rest in boxes or on the floor, otherwise they roll away.
    if moved_spec.form == Form::Ball
        && !matches!(dest_spec.form, Form::Box | Form::Floor)
        && relation.is_support()
    {
        return false;
    }

    // Objects go "inside" boxes, but "ontop" of everything else.
    if dest_spec.form == Form::Box && relation == OnTop {
        return false;
    }
    if dest_spec.form != Form::Box && relation == Inside {
        return false;
    }

    // Nothing rests on a ball, and a small ball supports no large object.
    if dest_spec.form == Form::Ball
        && (relation.is_support()
            || (small(dest_spec.size) && large(moved_spec.size) && relation == Under))
    {
        return false;
    }

    // Boxes cannot contain pyramids, planks, or boxes of the same size.
    if dest_spec.form == Form::Box
        && relation == Inside
        && (matches!(moved_spec.form, Form::Pyramid | Form::Plank)
            || (moved_spec.form == Form::Box && moved_spec.size == dest_spec.size))
    {
        return false;
    }

    // Small boxes cannot rest on small pyramids or bricks.
    if moved_spec.form == Form::Box
        && small(moved_spec.size)
        && small(dest_spec.size)
        && relation == OnTop
        && matches!(dest_spec.form, Form::Pyramid | Form::Brick)
    {
        return false;
    }

    // Large boxes cannot rest on pyramids.
    if moved_spec.form == Form::Box && large(moved_spec.size) && dest_spec.form == Form::Pyramid {
        return false;
    }

    // An object is never left of, right of, or beside itself.
    if matches!(relation, LeftOf | RightOf | Beside) && moved == dest {
        return false;
    }

    true
}
