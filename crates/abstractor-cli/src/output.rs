use std::io::Write;

use abstractor_core::{
    PipelineFailure, SegmentSource, StepStatus, SummaryOutput,
};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the summary and its run metadata.
pub fn print_summary(
    w: &mut dyn Write,
    output: &SummaryOutput,
    color: ColorMode,
) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", format!("SUMMARY: {}", output.document_id).bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SUMMARY: {}", output.document_id)?;
        writeln!(w, "{}", sep)?;
    }
    writeln!(w)?;
    writeln!(w, "{}", output.summary)?;
    writeln!(w)?;

    if output.segment_source == SegmentSource::Fallback {
        let msg = "Warning: no abstract markers found; summarized the start of the document";
        if color.enabled() {
            writeln!(w, "{}", msg.yellow())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }

    print_steps(w, &output.steps, color)?;

    let msg = format!("Completed in {:.1}s", output.elapsed.as_secs_f64());
    if color.enabled() {
        writeln!(w, "{}", msg.dimmed())?;
    } else {
        writeln!(w, "{}", msg)?;
    }
    Ok(())
}

/// Print a pipeline failure, including which step failed and why.
pub fn print_failure(
    w: &mut dyn Write,
    failure: &PipelineFailure,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "ERROR:".red().bold(), failure)?;
    } else {
        writeln!(w, "ERROR: {}", failure)?;
    }
    print_steps(w, &failure.steps, color)?;
    Ok(())
}

/// Print the located abstract segment.
pub fn print_segment(
    w: &mut dyn Write,
    document_id: &str,
    segment_text: &str,
    source: SegmentSource,
    color: ColorMode,
) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", format!("SEGMENT: {}", document_id).bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SEGMENT: {}", document_id)?;
        writeln!(w, "{}", sep)?;
    }
    writeln!(w)?;
    writeln!(w, "{}", segment_text)?;
    writeln!(w)?;

    match source {
        SegmentSource::MarkerMatched => {
            let msg = "Source: marker-matched";
            if color.enabled() {
                writeln!(w, "{}", msg.dimmed())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
        SegmentSource::Fallback => {
            let msg = "Source: fallback (no abstract markers found)";
            if color.enabled() {
                writeln!(w, "{}", msg.yellow())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
    }
    Ok(())
}

fn print_steps(
    w: &mut dyn Write,
    steps: &[abstractor_core::StepReport],
    color: ColorMode,
) -> std::io::Result<()> {
    for report in steps {
        let elapsed = report
            .elapsed
            .map(|d| format!(" ({:.1}s)", d.as_secs_f64()))
            .unwrap_or_default();
        match report.status {
            StepStatus::Ok => {
                if color.enabled() {
                    writeln!(w, "  {} {}{}", "ok".green(), report.step, elapsed)?;
                } else {
                    writeln!(w, "  ok      {}{}", report.step, elapsed)?;
                }
            }
            StepStatus::Failed => {
                if color.enabled() {
                    writeln!(w, "  {} {}{}", "failed".red(), report.step, elapsed)?;
                } else {
                    writeln!(w, "  failed  {}{}", report.step, elapsed)?;
                }
            }
            StepStatus::Skipped => {
                if color.enabled() {
                    writeln!(w, "  {} {}", "skipped".dimmed(), report.step)?;
                } else {
                    writeln!(w, "  skipped {}", report.step)?;
                }
            }
        }
    }
    Ok(())
}
