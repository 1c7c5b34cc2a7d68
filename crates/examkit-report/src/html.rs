//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use examkit_core::report::{ExamReport, QuestionReview};
use examkit_core::scoring::{Grade, PASS_THRESHOLD};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page from an exam report.
pub fn generate_html(report: &ExamReport) -> String {
    let mut html = String::new();
    let title = report.topic.as_deref().unwrap_or("Exam");

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>examkit report: {}</title>\n",
        html_escape(title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
    let user = report
        .user_id
        .as_deref()
        .map(|u| format!(" | {}", html_escape(u)))
        .unwrap_or_default();
    html.push_str(&format!(
        "<p class=\"meta\">{}{} | {} questions | {:.1}s</p>\n",
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        user,
        report.result.total_questions,
        report.duration_ms as f64 / 1000.0
    ));
    html.push_str("</header>\n");

    // Summary
    let result = &report.result;
    let status_class = if result.passed() { "pass" } else { "fail" };
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Result</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Score</th><th>Correct</th><th>Grade</th><th>Status</th><th>Unanswered</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{:.1}%</td><td>{}/{}</td><td class=\"grade-{}\">{}</td><td class=\"{}\">{}</td><td>{}</td></tr></tbody>\n",
        result.score_percent,
        result.correct_count,
        result.total_questions,
        grade_slug(result.grade),
        result.grade,
        status_class,
        result.status,
        report.unanswered_count()
    ));
    html.push_str("</table>\n");
    html.push_str(&generate_score_bar(result.score_percent));
    html.push_str("</section>\n");

    // Per-question review
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<label><input type=\"checkbox\" id=\"only-incorrect\" onchange=\"filterRows()\"> Show only incorrect</label>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th>#</th><th>Question</th><th>Your answer</th><th>Correct answer</th><th>Verdict</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (i, q) in report.questions.iter().enumerate() {
        html.push_str(&review_row(i + 1, q));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

fn review_row(number: usize, q: &QuestionReview) -> String {
    let class = if q.verdict.is_correct() { "pass" } else { "fail" };
    let answer = match q.user_answer.as_deref() {
        Some(a) => format!("<pre>{}</pre>", html_escape(a)),
        None => "<em>unanswered</em>".to_string(),
    };
    let options = if q.options.is_empty() {
        String::new()
    } else {
        let items: Vec<String> = q
            .options
            .iter()
            .map(|o| format!("<li>{}</li>", html_escape(o)))
            .collect();
        format!("<ol class=\"options\">{}</ol>", items.join(""))
    };

    format!(
        "<tr class=\"{class}\"><td>{number}</td><td>{}<span class=\"type\">{}</span>{options}</td><td>{answer}</td><td>{}</td><td class=\"{class}\">{}</td></tr>\n",
        html_escape(&q.prompt),
        q.question_type,
        q.correct_answer.as_deref().map(html_escape).unwrap_or_else(|| "-".into()),
        q.verdict
    )
}

fn grade_slug(grade: Grade) -> &'static str {
    match grade {
        Grade::A => "a",
        Grade::B => "b",
        Grade::C => "c",
        Grade::D => "d",
    }
}

/// Horizontal bar with the score and a marker at the pass threshold.
fn generate_score_bar(score_percent: f64) -> String {
    let max_width = 400.0;
    let height = 30;
    let width = (score_percent.clamp(0.0, 100.0) / 100.0 * max_width) as usize;
    let threshold_x = (PASS_THRESHOLD / 100.0 * max_width) as usize;

    let color = if score_percent >= 75.0 {
        "#22c55e"
    } else if score_percent >= PASS_THRESHOLD {
        "#eab308"
    } else {
        "#ef4444"
    };

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        max_width as usize + 60,
        height + 10
    );
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"5\" width=\"{}\" height=\"{height}\" fill=\"var(--border)\" rx=\"4\"/>\n",
        max_width as usize
    ));
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"5\" width=\"{width}\" height=\"{height}\" fill=\"{color}\" rx=\"4\"/>\n"
    ));
    svg.push_str(&format!(
        "  <line x1=\"{threshold_x}\" y1=\"0\" x2=\"{threshold_x}\" y2=\"{}\" stroke=\"currentColor\" stroke-dasharray=\"4\"/>\n",
        height + 10
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
        max_width as usize + 8,
        5 + height / 2,
        score_percent
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &ExamReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.type { display: block; color: #6b7280; font-size: 0.75rem; }
.options { margin: 0.25rem 0 0; padding-left: 1.25rem; }
.grade-a, .grade-b { font-weight: bold; }
td pre { margin: 0; white-space: pre-wrap; font-family: inherit; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function filterRows() {
  const only = document.getElementById('only-incorrect').checked;
  document.querySelectorAll('#results tbody tr').forEach(r => {
    r.style.display = only && r.classList.contains('pass') ? 'none' : '';
  });
}
"#;
