//! fleetcycle-maintain: the maintenance performed on a drained instance.
//!
//! # Components
//!
//! - **`action`**: `MaintenanceAction`, the reboot / remote-command variant
//!   selected by the run configuration
//! - **`reboot`**: stop, wait stopped, start, wait status ok, cool down
//! - **`command`**: agent precondition checks, dispatch, poll, cool down
//! - **`poll`**: fixed-interval poll loop over command statuses

pub mod action;
pub mod command;
pub mod poll;
pub mod reboot;

pub use action::MaintenanceAction;
pub use command::CommandAction;
pub use poll::{PollReport, poll_until_terminal};
pub use reboot::RebootAction;
