// Pipeline orchestration: one submission from raw input to decision.

pub mod submission;
