//! Page State Sensor.
//!
//! Produces a bounded, serializable snapshot of the current page for prompt
//! building: interactive elements with locators, a visible-text excerpt, an
//! HTML excerpt, and detected price/time patterns. Sensing never fails; any
//! internal fault degrades to an explanatory placeholder state, because an
//! empty element list is a plannable situation, not an error.

pub mod model;
pub mod patterns;
pub mod scripts;
pub mod sensor;
pub mod text;

pub use model::{DetectedPatterns, ElementBox, ElementInfo, PageState};
pub use sensor::{PageSensor, SenseBudget};
