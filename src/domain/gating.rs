//! Sequential access gating within one hierarchy.

use crate::domain::ids::SectionId;

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    /// Earliest section (in flattened order) the user still has to visit
    DeniedRedirectTo(SectionId),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn redirect(&self) -> Option<SectionId> {
        match self {
            Self::Allowed => None,
            Self::DeniedRedirectTo(target) => Some(*target),
        }
    }
}

/// Everything a gate check needs to know about one hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct GateInput<'a> {
    /// Flattened order of the target's hierarchy, root first
    pub order: &'a [SectionId],
    pub target: SectionId,
    pub target_unlocked: bool,
    pub enforce: bool,
}

/// Decide whether the target may be accessed.
///
/// With enforcement on, every section strictly before the target (skipping
/// the root container at position 0) must be passed: visited, with every
/// block on it letting the user proceed. The redirect goes to the earliest
/// section not yet passed so the user is walked forward in order. Only the
/// given order is consulted; other hierarchies never matter.
pub fn check_access(input: GateInput<'_>, is_passed: impl Fn(SectionId) -> bool) -> AccessDecision {
    if !input.enforce || input.target_unlocked {
        return AccessDecision::Allowed;
    }
    let Some(position) = input.order.iter().position(|&s| s == input.target) else {
        return AccessDecision::Allowed;
    };
    for &section in input.order.iter().take(position).skip(1) {
        if !is_passed(section) {
            return AccessDecision::DeniedRedirectTo(section);
        }
    }
    AccessDecision::Allowed
}
