/// Stages a session walks through, in order.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Calibration,
    Welcome,
    Training,
    Experiment,
    Debrief,
}
