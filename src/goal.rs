//! The goal language: literals, conjunctions, and formulas in disjunctive
//! normal form. A goal is met when some conjunction is met; a conjunction
//! is met when every literal in it holds.

use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::command::Relation;

/// A signed atomic relation. `holding` takes one argument, every other
/// relation takes two; the identifier `"floor"` stands for any floor cell.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Literal {
    pub polarity: bool,
    pub relation: Relation,
    pub args: Vec<String>,
}

impl Literal {
    pub fn holding(id: impl Into<String>) -> Self {
        Literal { polarity: true, relation: Relation::Holding, args: vec![id.into()] }
    }

    pub fn relates(relation: Relation, from: impl Into<String>, to: impl Into<String>) -> Self {
        Literal { polarity: true, relation, args: vec![from.into(), to.into()] }
    }
}

impl Display for Literal {
    /// `"[-]relation(arg0[,arg1])"`, the form test cases compare against.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.polarity { "" } else { "-" };
        write!(f, "{}{}({})", sign, self.relation, self.args.iter().join(","))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct Conjunction(pub Vec<Literal>);

impl Display for Conjunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(" & "))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct DnfFormula {
    pub conjunctions: Vec<Conjunction>,
}

impl DnfFormula {
    /// Builds a formula, dropping duplicate conjunctions. Conjunctions are
    /// compared structurally as ordered sequences.
    pub fn new(conjunctions: impl IntoIterator<Item = Conjunction>) -> Self {
        let mut unique: Vec<Conjunction> = Vec::new();
        for conjunction in conjunctions {
            if !unique.contains(&conjunction) {
                unique.push(conjunction);
            }
        }
        DnfFormula { conjunctions: unique }
    }

    pub fn is_empty(&self) -> bool {
        self.conjunctions.is_empty()
    }
}

impl Display for DnfFormula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.conjunctions.iter().join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_print_in_wire_form() {
        assert_eq!(Literal::holding("k").to_string(), "holding(k)");
        assert_eq!(Literal::relates(Relation::Inside, "e", "k").to_string(), "inside(e,k)");

        let mut negated = Literal::relates(Relation::OnTop, "e", "floor");
        negated.polarity = false;
        assert_eq!(negated.to_string(), "-ontop(e,floor)");
    }

    #[test]
    fn formulas_join_with_ands_and_ors() {
        let formula = DnfFormula::new([
            Conjunction(vec![
                Literal::relates(Relation::OnTop, "e", "floor"),
                Literal::relates(Relation::OnTop, "f", "floor"),
            ]),
            Conjunction(vec![Literal::holding("g")]),
        ]);
        assert_eq!(formula.to_string(), "ontop(e,floor) & ontop(f,floor) | holding(g)");
    }

    #[test]
    fn duplicate_conjunctions_are_dropped() {
        let one = Conjunction(vec![Literal::holding("g")]);
        let formula = DnfFormula::new([one.clone(), one.clone(), one]);
        assert_eq!(formula.conjunctions.len(), 1);
    }

    #[test]
    fn conjunctions_compare_as_ordered_sequences() {
        let ab = Conjunction(vec![Literal::holding("a"), Literal::holding("b")]);
        let ba = Conjunction(vec![Literal::holding("b"), Literal::holding("a")]);
        let formula = DnfFormula::new([ab, ba]);
        assert_eq!(formula.conjunctions.len(), 2);
    }
}
