//! Branch unit.

use crate::encoding::BranchCondition;
use crate::state::ACC_SIGN_BIT;
use crate::CoreState;

/// Evaluates `condition` against an accumulator value.
///
/// Signed tests look only at bit 7; the undefined condition is never taken.
#[must_use]
pub const fn condition_holds(condition: BranchCondition, acc: u8) -> bool {
    let negative = (acc & ACC_SIGN_BIT) != 0;
    let zero = acc == 0;
    match condition {
        BranchCondition::Always => true,
        BranchCondition::Zero => zero,
        BranchCondition::NotZero => !zero,
        BranchCondition::LessThan => negative,
        BranchCondition::LessOrEqual => negative || zero,
        BranchCondition::GreaterThan => !negative && !zero,
        BranchCondition::GreaterOrEqual => !negative,
        BranchCondition::Reserved111 => false,
    }
}

/// Sets `PC` to `target` when `condition` holds. Returns whether it did.
pub fn branch(state: &mut CoreState, condition: BranchCondition, target: u16) -> bool {
    let taken = condition_holds(condition, state.regs.acc());
    if taken {
        tracing::debug!(from = state.regs.pc(), target, ?condition, "branch taken");
        state.regs.set_pc(target);
    }
    taken
}
