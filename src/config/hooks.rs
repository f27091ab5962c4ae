use std::fmt;
use std::str::FromStr;

/// Lifecycle points at which a suite may run a hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookName {
    BeforeSuite,
    AfterSuite,
    BeforeGroup,
    AfterGroup,
    IsBenchmark,
    RunBenchmark,
    RunNonBenchmark,
    BeforeBenchmark,
    AfterBenchmark,
    BeforeBenchmarkRepetition,
    AfterBenchmarkRepetition,
}

impl HookName {
    pub const ALL: [HookName; 11] = [
        HookName::BeforeSuite,
        HookName::AfterSuite,
        HookName::BeforeGroup,
        HookName::AfterGroup,
        HookName::IsBenchmark,
        HookName::RunBenchmark,
        HookName::RunNonBenchmark,
        HookName::BeforeBenchmark,
        HookName::AfterBenchmark,
        HookName::BeforeBenchmarkRepetition,
        HookName::AfterBenchmarkRepetition,
    ];

    /// Name of the hook as written in `benchy.yml`
    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::BeforeSuite => "before_suite",
            HookName::AfterSuite => "after_suite",
            HookName::BeforeGroup => "before_group",
            HookName::AfterGroup => "after_group",
            HookName::IsBenchmark => "is_benchmark",
            HookName::RunBenchmark => "run_benchmark",
            HookName::RunNonBenchmark => "run_non_benchmark",
            HookName::BeforeBenchmark => "before_benchmark",
            HookName::AfterBenchmark => "after_benchmark",
            HookName::BeforeBenchmarkRepetition => "before_benchmark_repetition",
            HookName::AfterBenchmarkRepetition => "after_benchmark_repetition",
        }
    }

    /// Positional arguments the hook receives, in order
    pub fn parameters(&self) -> &'static [&'static str] {
        match self {
            HookName::BeforeSuite | HookName::AfterSuite => &["suite"],
            HookName::BeforeGroup | HookName::AfterGroup => &["group"],
            HookName::IsBenchmark
            | HookName::RunNonBenchmark
            | HookName::BeforeBenchmark
            | HookName::AfterBenchmark => &["file", "group"],
            HookName::BeforeBenchmarkRepetition | HookName::AfterBenchmarkRepetition => {
                &["file", "group", "repetition"]
            }
            HookName::RunBenchmark => &["file", "group", "repetition", "results_dir"],
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookName::ALL
            .iter()
            .find(|hook| hook.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown hook '{s}'"))
    }
}

/// A user-supplied shell snippet, run as `sh -c <script> benchy <args...>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    pub script: String,
}

impl Hook {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

/// The optional hooks active for a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookSet {
    pub before_suite: Option<Hook>,
    pub after_suite: Option<Hook>,
    pub before_group: Option<Hook>,
    pub after_group: Option<Hook>,
    pub is_benchmark: Option<Hook>,
    pub run_benchmark: Option<Hook>,
    pub run_non_benchmark: Option<Hook>,
    pub before_benchmark: Option<Hook>,
    pub after_benchmark: Option<Hook>,
    pub before_benchmark_repetition: Option<Hook>,
    pub after_benchmark_repetition: Option<Hook>,
}

impl HookSet {
    fn slot(&self, name: HookName) -> &Option<Hook> {
        match name {
            HookName::BeforeSuite => &self.before_suite,
            HookName::AfterSuite => &self.after_suite,
            HookName::BeforeGroup => &self.before_group,
            HookName::AfterGroup => &self.after_group,
            HookName::IsBenchmark => &self.is_benchmark,
            HookName::RunBenchmark => &self.run_benchmark,
            HookName::RunNonBenchmark => &self.run_non_benchmark,
            HookName::BeforeBenchmark => &self.before_benchmark,
            HookName::AfterBenchmark => &self.after_benchmark,
            HookName::BeforeBenchmarkRepetition => &self.before_benchmark_repetition,
            HookName::AfterBenchmarkRepetition => &self.after_benchmark_repetition,
        }
    }

    fn slot_mut(&mut self, name: HookName) -> &mut Option<Hook> {
        match name {
            HookName::BeforeSuite => &mut self.before_suite,
            HookName::AfterSuite => &mut self.after_suite,
            HookName::BeforeGroup => &mut self.before_group,
            HookName::AfterGroup => &mut self.after_group,
            HookName::IsBenchmark => &mut self.is_benchmark,
            HookName::RunBenchmark => &mut self.run_benchmark,
            HookName::RunNonBenchmark => &mut self.run_non_benchmark,
            HookName::BeforeBenchmark => &mut self.before_benchmark,
            HookName::AfterBenchmark => &mut self.after_benchmark,
            HookName::BeforeBenchmarkRepetition => &mut self.before_benchmark_repetition,
            HookName::AfterBenchmarkRepetition => &mut self.after_benchmark_repetition,
        }
    }

    pub fn get(&self, name: HookName) -> Option<&Hook> {
        self.slot(name).as_ref()
    }

    pub fn set(&mut self, name: HookName, hook: Hook) {
        *self.slot_mut(name) = Some(hook);
    }

    pub fn is_defined(&self, name: HookName) -> bool {
        self.slot(name).is_some()
    }

    /// Names of all hooks currently defined
    pub fn defined(&self) -> Vec<HookName> {
        HookName::ALL
            .iter()
            .copied()
            .filter(|name| self.is_defined(*name))
            .collect()
    }
}
