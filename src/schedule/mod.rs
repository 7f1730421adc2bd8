pub mod types;
pub mod waves;
pub mod case_mix;
pub mod acquisition;
pub mod evaluators;
pub mod assembler;

pub use types::{hhmm, Route, ScheduleEntry};
pub use case_mix::{plan_day, plan_exercise, split_case_mix, CaseSlot};
pub use acquisition::acquire_cases;
pub use evaluators::{assign_evaluator, AssignmentState, SpecialistRole, StaffingTable, UNASSIGNED};
pub use assembler::{assemble_schedule, generate_exercise, shuffle_cases, ExerciseSchedule, ScheduleSummary};
