// Signal evaluation, crossover trends and alert gating
pub mod alert;
pub mod channel;
pub mod evaluator;
pub mod gate;
pub mod trend;
