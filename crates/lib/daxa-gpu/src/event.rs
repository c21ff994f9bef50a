/// Stable identity of a split-barrier event, handed out by [`crate::device::Device`].
///
/// Grounded on the scheduler/emitter's split-barrier path (spec.md §5): a
/// split barrier signals at the end of the producing batch and is waited on
/// at the start of the consuming batch, rather than stalling in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventId(pub(crate) u64);
