//! Shared vocabulary for the axpilot agent core.
//!
//! Element records, the closed action set, step records, outcome
//! classifications, and the `BrowserDriver` port every other crate consumes.

pub mod action;
pub mod driver;
pub mod element;
pub mod mock;
pub mod step;

pub use action::{Action, ActionParseError, ScrollDirection};
pub use driver::{AxNode, BrowserDriver, DriverError, PageInfo, WaitUntil};
pub use element::{is_interactive_role, BBox, ElementRecord, TriState, INTERACTIVE_ROLES};
pub use mock::MockDriver;
pub use step::{ActionOutcome, Classification, StepRecord, StepScreenshot};
