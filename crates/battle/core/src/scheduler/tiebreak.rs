//! Shuffled-stack tie-break for simultaneously ready combatants.

use tracing::trace;

use crate::combatant::CombatantId;
use crate::rng::RollSource;

/// Pre-shuffled stack of combatants used to resolve ties.
///
/// Picking pops entries until one of the tied combatants surfaces; popped
/// entries stay excluded until the stack runs dry and is reshuffled, so no
/// combatant wins twice within one cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TieBreakStack {
    members: Vec<CombatantId>,
    /// Top of the stack is the last element.
    stack: Vec<CombatantId>,
}

impl TieBreakStack {
    /// Builds a shuffled stack over `members`.
    pub fn new<R: RollSource>(members: impl IntoIterator<Item = CombatantId>, rng: &mut R) -> Self {
        let mut ties = Self {
            members: members.into_iter().collect(),
            stack: Vec::new(),
        };
        ties.reshuffle(rng);
        ties
    }

    /// Builds a stack that pops in exactly `order`, first element first.
    pub fn with_order(order: impl IntoIterator<Item = CombatantId>) -> Self {
        let members: Vec<_> = order.into_iter().collect();
        let stack = members.iter().rev().copied().collect();
        Self { members, stack }
    }

    /// Entries left before the next reshuffle, next pick first.
    pub fn remaining(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.stack.iter().rev().copied()
    }

    /// Removes a combatant from the stack for good.
    pub fn retire(&mut self, id: CombatantId) {
        self.members.retain(|&m| m != id);
        self.stack.retain(|&m| m != id);
    }

    /// Picks the winner among `tied`.
    ///
    /// Returns `None` only when `tied` is empty. A tied combatant that is not
    /// a member of the stack still wins once a full fresh cycle has passed
    /// without finding anyone else.
    pub fn pick<R: RollSource>(&mut self, tied: &[CombatantId], rng: &mut R) -> Option<CombatantId> {
        let first = *tied.first()?;
        if tied.len() == 1 {
            return Some(first);
        }

        let mut refills = 0;
        loop {
            match self.stack.pop() {
                Some(candidate) if tied.contains(&candidate) => {
                    trace!(target: "battle::scheduler", winner = %candidate, tied = tied.len(), "tie broken");
                    return Some(candidate);
                }
                Some(_) => {}
                None if refills < 2 && !self.members.is_empty() => {
                    self.reshuffle(rng);
                    refills += 1;
                }
                None => return Some(first),
            }
        }
    }

    fn reshuffle<R: RollSource>(&mut self, rng: &mut R) {
        self.stack.clone_from(&self.members);
        rng.shuffle(&mut self.stack);
    }
}
