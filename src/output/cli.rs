use crate::model::{ScanReport, Severity, SeveritySummary};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct VulnRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Fixed In")]
    fixed_in: String,
    #[tabled(rename = "Title")]
    title: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Critical")]
    critical: usize,
    #[tabled(rename = "High")]
    high: usize,
    #[tabled(rename = "Medium")]
    medium: usize,
    #[tabled(rename = "Low")]
    low: usize,
    #[tabled(rename = "Unknown")]
    unknown: usize,
    #[tabled(rename = "Total")]
    total: usize,
}

impl From<SeveritySummary> for SummaryRow {
    fn from(s: SeveritySummary) -> Self {
        Self {
            critical: s.critical,
            high: s.high,
            medium: s.medium,
            low: s.low,
            unknown: s.unknown,
            total: s.total(),
        }
    }
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    println!();
    println!("Target: {}", report.target);
    println!();

    if report.vulnerabilities.is_empty() {
        println!("No vulnerabilities found.");
    } else {
        println!("Found {} vulnerabilities:", report.vulnerabilities.len());
        println!();

        let mut vulns: Vec<_> = report.vulnerabilities.iter().collect();
        // Most severe first; stable sort keeps trivy's order within a level
        vulns.sort_by_key(|v| std::cmp::Reverse(v.severity()));

        let rows: Vec<VulnRow> = vulns
            .iter()
            .map(|v| VulnRow {
                severity: format_severity(v.severity()),
                id: or_dash(v.id()),
                package: truncate(&or_dash(v.pkg_name()), 30),
                installed: or_dash(v.installed_version()),
                fixed_in: or_dash(v.fixed_version()),
                title: truncate(&or_dash(v.title()), 50),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    println!();
    println!("Summary:");
    let table = Table::new([SummaryRow::from(report.summary())])
        .with(Style::rounded())
        .to_string();
    println!("{}", table);

    Ok(())
}

fn format_severity(severity: Severity) -> String {
    match severity {
        Severity::Critical => "\x1b[31mCRITICAL\x1b[0m".to_string(),
        Severity::High => "\x1b[91mHIGH\x1b[0m".to_string(),
        Severity::Medium => "\x1b[33mMEDIUM\x1b[0m".to_string(),
        Severity::Low => "\x1b[32mLOW\x1b[0m".to_string(),
        Severity::Unknown => "UNKNOWN".to_string(),
    }
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
