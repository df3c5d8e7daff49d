//! State machine contract for step lifecycles.
//!
//! [`StepState`](crate::StepState) implements [`LifecycleState`]; the
//! `conformance` helper checks that an implementation's transition table
//! agrees with itself.

/// A finite state machine whose transitions are listed up front.
///
/// `can_transition_to(next)` holds exactly when `next` appears in
/// `valid_next_states()`. Terminal states list no successors; every other
/// state lists at least one.
pub trait LifecycleState: Copy + Eq + Sized + 'static {
    fn can_transition_to(self, next: Self) -> bool;

    fn valid_next_states(self) -> Vec<Self>;

    fn is_terminal(self) -> bool;

    /// Every state of the machine, each listed once.
    fn all_states() -> &'static [Self];
}
