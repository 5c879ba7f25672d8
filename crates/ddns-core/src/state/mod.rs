// # State
//
// In-process state for the updater: the change detector holding the last
// applied address, and the optional file that mirrors it.

pub mod detector;
pub mod file;

pub use detector::{ChangeDetector, LastApplied};
pub use file::StateMirror;
