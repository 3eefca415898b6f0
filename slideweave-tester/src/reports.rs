use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::runner::ScenarioResult;
use crate::util::report_timestamp;

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Playthrough Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "==============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();

    writeln!(writer, "Total scripts: {total}")?;
    writeln!(writer, "Passed: {}", passed.to_string().green())?;
    writeln!(writer, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(writer, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(writer, "{} {}", status, result.scenario_name.bold())?;
        writeln!(
            writer,
            "   Steps: {}/{} replayed",
            result.steps_run, result.steps_total
        )?;
        writeln!(writer, "   Final slide: {}", result.final_slide)?;
        writeln!(writer, "   Time: {:?}", result.duration)?;

        if !result.failures.is_empty() {
            writeln!(writer, "   Failures:")?;
            for failure in &result.failures {
                writeln!(writer, "     • {}", failure.red())?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn generate_json_report(writer: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, results)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report(writer: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(writer, "# Slideweave Playthrough Results\n")?;
    writeln!(writer, "_Generated {}_\n", report_timestamp())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();

    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total scripts**: {total}")?;
    writeln!(writer, "- **Passed**: {passed}")?;
    writeln!(writer, "- **Failed**: {}", total - passed)?;
    writeln!(writer, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(writer, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(writer, "### {} {}\n", status, result.scenario_name)?;
        writeln!(
            writer,
            "- **Steps**: {}/{} replayed",
            result.steps_run, result.steps_total
        )?;
        writeln!(writer, "- **Final slide**: `{}`", result.final_slide)?;
        writeln!(writer, "- **Time**: {:?}", result.duration)?;

        if !result.failures.is_empty() {
            writeln!(writer, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(writer, "  - {failure}")?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: name.to_string(),
            passed,
            steps_run: 2,
            steps_total: 3,
            final_slide: "hallway".to_string(),
            failures: if passed {
                Vec::new()
            } else {
                vec!["expected slide `ending`, ended on `hallway`".to_string()]
            },
            duration: Duration::from_millis(4),
            snapshot: None,
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_lists_failures() {
        let results = [result("escape", true), result("loot", false)];
        let out = render(|w| generate_console_report(w, &results, Duration::from_millis(9)));
        assert!(out.contains("Total scripts: 2"));
        assert!(out.contains("Success rate: 50.0%"));
        assert!(out.contains("Steps: 2/3 replayed"));
        assert!(out.contains("ended on `hallway`"));
    }

    #[test]
    fn json_report_is_an_array_of_results() {
        let results = [result("escape", true)];
        let out = render(|w| generate_json_report(w, &results));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["scenario_name"], "escape");
        assert_eq!(value[0]["duration"], 4000);
    }

    #[test]
    fn markdown_report_has_sections() {
        let results = [result("loot", false)];
        let out = render(|w| generate_markdown_report(w, &results));
        assert!(out.starts_with("# Slideweave Playthrough Results"));
        assert!(out.contains("### ❌ loot"));
        assert!(out.contains("- **Success rate**: 0.0%"));
    }
}
