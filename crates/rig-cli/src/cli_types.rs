use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliErrorMode {
    FailFast,
    ContinueOnError,
}

pub fn error_mode_label(mode: CliErrorMode) -> &'static str {
    match mode {
        CliErrorMode::FailFast => "fail-fast",
        CliErrorMode::ContinueOnError => "continue-on-error",
    }
}
