mod engine;
pub use engine::{BenchmarkOutcome, ExecutionEngine, FileKind, FileOutcome, GroupContext};
mod hook_runner;
pub use hook_runner::{HookArgs, HookCall, HookExecutor, HookRunner, ShellHookExecutor};
mod instrument;
pub use instrument::{GnuTime, Instrument};
mod runner;
pub use runner::{GroupReport, RunOptions, SuiteReport, SuiteRunner};
