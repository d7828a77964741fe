//! Report generation
//!
//! Pure functions from a completed [`Session`] to serialized bytes.
//! JSON round-trips the session losslessly; the other formats are
//! human-readable projections.

use redfox_common::{Outcome, Session};

use crate::error::{EngineError, EngineResult};

/// Supported report output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Html,
    Csv,
    Txt,
    Xml,
}

impl ReportFormat {
    pub const ALL: &'static [ReportFormat] = &[
        ReportFormat::Json,
        ReportFormat::Html,
        ReportFormat::Csv,
        ReportFormat::Txt,
        ReportFormat::Xml,
    ];

    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
            ReportFormat::Csv => "csv",
            ReportFormat::Txt => "txt",
            ReportFormat::Xml => "xml",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            "csv" => Ok(ReportFormat::Csv),
            "txt" | "text" => Ok(ReportFormat::Txt),
            "xml" => Ok(ReportFormat::Xml),
            other => Err(EngineError::config(
                "format",
                format!("unknown report format: {other}"),
            )),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Render a session in the requested format.
pub fn render(session: &Session, format: ReportFormat) -> EngineResult<Vec<u8>> {
    match format {
        ReportFormat::Json => render_json(session),
        ReportFormat::Html => Ok(render_html(session).into_bytes()),
        ReportFormat::Csv => render_csv(session),
        ReportFormat::Txt => Ok(render_txt(session).into_bytes()),
        ReportFormat::Xml => Ok(render_xml(session).into_bytes()),
    }
}

fn render_json(session: &Session) -> EngineResult<Vec<u8>> {
    serde_json::to_vec_pretty(session).map_err(|e| EngineError::report(e.to_string()))
}

fn render_csv(session: &Session) -> EngineResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "username",
            "password",
            "outcome",
            "status_code",
            "latency_ms",
            "detail",
            "timestamp",
        ])
        .map_err(|e| EngineError::report(e.to_string()))?;

    for outcome in &session.outcomes {
        let kind = format!("{:?}", outcome.kind);
        let status = outcome
            .status_code
            .map(|c| c.to_string())
            .unwrap_or_default();
        let latency = outcome.latency_ms.to_string();
        let timestamp = outcome.timestamp.to_rfc3339();
        writer
            .write_record([
                outcome.credential.username.as_str(),
                outcome.credential.password.as_str(),
                kind.as_str(),
                status.as_str(),
                latency.as_str(),
                outcome.detail.as_deref().unwrap_or(""),
                timestamp.as_str(),
            ])
            .map_err(|e| EngineError::report(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| EngineError::report(e.to_string()))
}

fn render_txt(session: &Session) -> String {
    let rule = "=".repeat(70);
    let thin = "-".repeat(70);
    let mut text = String::new();

    text.push_str(&format!("{rule}\n"));
    text.push_str("                 redfox credential audit report\n");
    text.push_str(&format!("{rule}\n\n"));

    text.push_str(&format!("session:        {}\n", session.id));
    text.push_str(&format!("target:         {}\n", session.target));
    text.push_str(&format!("mode:           {}\n", session.mode));
    text.push_str(&format!("state:          {:?}\n", session.state));
    if let Some(reason) = &session.failure_reason {
        text.push_str(&format!("reason:         {reason}\n"));
    }
    if let Some(duration) = session.duration() {
        text.push_str(&format!(
            "duration:       {:.1}s\n",
            duration.num_milliseconds() as f64 / 1000.0
        ));
    }
    text.push('\n');

    let tally = &session.tally;
    text.push_str(&format!("attempted:      {}\n", tally.attempted));
    text.push_str(&format!("succeeded:      {}\n", tally.succeeded));
    text.push_str(&format!("failed:         {}\n", tally.failed));
    text.push_str(&format!("errored:        {}\n", tally.errored));
    text.push_str(&format!("success rate:   {:.1}%\n", success_rate(session)));

    let successes: Vec<&Outcome> = session.outcomes.iter().filter(|o| o.is_success()).collect();
    if !successes.is_empty() {
        text.push_str(&format!("\n{thin}\nvalid credentials:\n{thin}\n"));
        for (i, outcome) in successes.iter().enumerate() {
            text.push_str(&format!(
                "{:3}. {:20} {:30} [{}] {}ms\n",
                i + 1,
                outcome.credential.username,
                outcome.credential.password,
                outcome
                    .status_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                outcome.latency_ms
            ));
        }
    }

    text.push_str(&format!("\n{rule}\n"));
    text
}

fn render_html(session: &Session) -> String {
    let successes: Vec<&Outcome> = session.outcomes.iter().filter(|o| o.is_success()).collect();
    let failures: Vec<&Outcome> = session
        .outcomes
        .iter()
        .filter(|o| !o.is_success())
        .take(50)
        .collect();

    let success_rows = if successes.is_empty() {
        "<p>No valid credentials found.</p>".to_string()
    } else {
        let mut table = String::from(
            "<table>\n<tr><th>#</th><th>Username</th><th>Password</th>\
             <th>Status</th><th>Latency</th></tr>\n",
        );
        for (i, outcome) in successes.iter().enumerate() {
            table.push_str(&format!(
                "<tr class=\"ok\"><td>{}</td><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}ms</td></tr>\n",
                i + 1,
                escape_html(&outcome.credential.username),
                escape_html(&outcome.credential.password),
                outcome.status_code.map(|c| c.to_string()).unwrap_or_default(),
                outcome.latency_ms
            ));
        }
        table.push_str("</table>");
        table
    };

    let failure_rows = if failures.is_empty() {
        "<p>No failed attempts recorded.</p>".to_string()
    } else {
        let mut table = String::from(
            "<table>\n<tr><th>Username</th><th>Password</th><th>Outcome</th><th>Detail</th></tr>\n",
        );
        for outcome in &failures {
            table.push_str(&format!(
                "<tr><td>{}</td><td><code>{}</code></td><td>{:?}</td><td>{}</td></tr>\n",
                escape_html(&outcome.credential.username),
                escape_html(&outcome.credential.password),
                outcome.kind,
                escape_html(outcome.detail.as_deref().unwrap_or(""))
            ));
        }
        table.push_str("</table>");
        table
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>redfox report - {target}</title>
<style>
body {{ font-family: sans-serif; margin: 2em; color: #222; }}
table {{ border-collapse: collapse; margin-bottom: 2em; }}
th, td {{ border: 1px solid #ccc; padding: 6px 12px; text-align: left; }}
th {{ background: #1a1a2e; color: white; }}
tr.ok {{ background: #d4edda; }}
.meta {{ color: #666; }}
</style>
</head>
<body>
<h1>Credential Audit Report</h1>
<p class="meta">target {target} | mode {mode} | state {state:?} | session {id}</p>
<p class="meta">attempted {attempted} | succeeded {succeeded} | failed {failed} | errored {errored} | success rate {rate:.1}%</p>
<h2>Valid Credentials</h2>
{success_rows}
<h2>Failed Attempts (first 50)</h2>
{failure_rows}
</body>
</html>
"#,
        target = escape_html(&session.target.url),
        mode = session.mode,
        state = session.state,
        id = session.id,
        attempted = session.tally.attempted,
        succeeded = session.tally.succeeded,
        failed = session.tally.failed,
        errored = session.tally.errored,
        rate = success_rate(session),
    )
}

fn render_xml(session: &Session) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<redfox-report>\n");

    xml.push_str("  <metadata>\n");
    xml.push_str(&format!("    <session>{}</session>\n", session.id));
    xml.push_str(&format!(
        "    <target>{}</target>\n",
        escape_xml(&session.target.url)
    ));
    xml.push_str(&format!("    <mode>{}</mode>\n", session.mode));
    xml.push_str(&format!("    <state>{:?}</state>\n", session.state));
    xml.push_str(&format!(
        "    <attempted>{}</attempted>\n",
        session.tally.attempted
    ));
    xml.push_str(&format!(
        "    <succeeded>{}</succeeded>\n",
        session.tally.succeeded
    ));
    xml.push_str(&format!("    <failed>{}</failed>\n", session.tally.failed));
    xml.push_str(&format!("    <errored>{}</errored>\n", session.tally.errored));
    xml.push_str(&format!(
        "    <success-rate>{:.2}</success-rate>\n",
        success_rate(session)
    ));
    xml.push_str("  </metadata>\n");

    xml.push_str("  <outcomes>\n");
    for outcome in &session.outcomes {
        xml.push_str("    <attempt>\n");
        xml.push_str(&format!(
            "      <username>{}</username>\n",
            escape_xml(&outcome.credential.username)
        ));
        xml.push_str(&format!(
            "      <password>{}</password>\n",
            escape_xml(&outcome.credential.password)
        ));
        xml.push_str(&format!("      <outcome>{:?}</outcome>\n", outcome.kind));
        if let Some(status) = outcome.status_code {
            xml.push_str(&format!("      <status-code>{status}</status-code>\n"));
        }
        xml.push_str(&format!(
            "      <latency-ms>{}</latency-ms>\n",
            outcome.latency_ms
        ));
        if let Some(detail) = &outcome.detail {
            xml.push_str(&format!("      <detail>{}</detail>\n", escape_xml(detail)));
        }
        xml.push_str(&format!(
            "      <timestamp>{}</timestamp>\n",
            outcome.timestamp.to_rfc3339()
        ));
        xml.push_str("    </attempt>\n");
    }
    xml.push_str("  </outcomes>\n");
    xml.push_str("</redfox-report>\n");
    xml
}

fn success_rate(session: &Session) -> f64 {
    if session.tally.attempted == 0 {
        return 0.0;
    }
    (session.tally.succeeded as f64 / session.tally.attempted as f64) * 100.0
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
