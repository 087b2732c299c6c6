/// Long-running device alerts.
pub mod alerts;
/// Wall-clock moments, clock sources, and tick counting.
pub mod clock;
pub mod energy;
pub mod engine;
/// Activity log entries and alerts.
pub mod event;
pub mod report;
/// Routine scheduling.
pub mod schedule;
pub mod types;
