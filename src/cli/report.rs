//! Rendering of engine reports.

use crate::cli::output;
use crate::core::engine::Report;
use crate::error::{Error, Result};

/// Print one report: the package, each step, then the failure if any.
pub fn render(report: &Report) {
    output::header(&format!("{} {}", report.action, output::name(&report.target)));
    for step in &report.steps {
        if step.status.is_changed() {
            output::success(&step.summary);
        } else {
            output::unchanged(&step.summary);
        }
    }
    if let Some(failure) = &report.failure {
        output::error(&failure.to_string());
        if let Some(hint) = failure.hint() {
            output::hint(hint);
        }
    }
}

/// Print all reports; fail if any package failed.
pub fn finish(reports: &[Report]) -> Result<()> {
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            println!();
        }
        render(report);
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed == 0 {
        return Ok(());
    }
    Err(Error::Incomplete {
        failed,
        total: reports.len(),
        noun: if reports.len() == 1 { "package" } else { "packages" },
    })
}
