use std::backtrace::Backtrace;

/// Macro for logging errors with filtered backtraces
/// Example
/// ```ignore
/// error_with_backtrace!(error = %err, "Something went wrong");
/// ```
#[macro_export]
macro_rules! error_with_backtrace {
    ($($arg:tt)*) => {
        {
            let filtered_trace = $crate::backtrace::app_focused_backtrace();
            tracing::error!(
                backtrace = %filtered_trace,
                $($arg)*
            );
        }
    };
}

/// Filter the backtrace to only include lines that are relevant to the application
pub fn app_focused_backtrace() -> String {
    let backtrace = Backtrace::capture();
    let backtrace_str = format!("{backtrace:?}");

    backtrace_str
        .lines()
        .filter(|line| {
            (line.contains("soudan_")
                || line.contains("crates/")
                || line.contains("bins/soudan/"))
                && !line.contains("registry/src")
                && !line.contains("std::")
                && !line.contains("core::")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
