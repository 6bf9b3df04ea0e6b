use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A trivy scan report.
///
/// The same shape describes one element of trivy's raw JSON output (one
/// scanned target) and the aggregate returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanReport {
    pub target: String,
    // trivy writes `null` for targets without findings
    #[serde(default, deserialize_with = "null_as_empty")]
    pub vulnerabilities: Vec<Vulnerability>,
}

impl ScanReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            vulnerabilities: Vec::new(),
        }
    }

    pub fn summary(&self) -> SeveritySummary {
        SeveritySummary::from_vulnerabilities(&self.vulnerabilities)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Vulnerability>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Vulnerability>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single vulnerability record as emitted by trivy.
///
/// The record is kept as the raw JSON object so every field, including
/// explicit `null`s and values of unexpected types, is passed through
/// unmodified. Accessors read the commonly used fields when they hold
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vulnerability(Map<String, Value>);

impl Vulnerability {
    pub fn new(id: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("VulnerabilityID".to_string(), Value::String(id.into()));
        Self(fields)
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.0
            .insert("Severity".to_string(), Value::String(severity.into()));
        self
    }

    /// Raw field access.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field("VulnerabilityID")
    }

    pub fn pkg_name(&self) -> Option<&str> {
        self.str_field("PkgName")
    }

    pub fn installed_version(&self) -> Option<&str> {
        self.str_field("InstalledVersion")
    }

    pub fn fixed_version(&self) -> Option<&str> {
        self.str_field("FixedVersion")
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("Title")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("Description")
    }

    pub fn raw_severity(&self) -> Option<&str> {
        self.str_field("Severity")
    }

    /// String entries of `References`; other entries are skipped.
    pub fn references(&self) -> Vec<&str> {
        self.0
            .get("References")
            .and_then(Value::as_array)
            .map(|refs| refs.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn severity(&self) -> Severity {
        self.raw_severity()
            .map(Severity::parse)
            .unwrap_or(Severity::Unknown)
    }
}

impl From<Map<String, Value>> for Vulnerability {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parses a trivy severity string. Anything unrecognized is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MEDIUM" => Severity::Medium,
            "LOW" => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "UNKNOWN",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vulnerability counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl SeveritySummary {
    pub fn from_vulnerabilities(vulnerabilities: &[Vulnerability]) -> Self {
        vulnerabilities
            .iter()
            .fold(Self::default(), |mut acc, v| {
                match v.severity() {
                    Severity::Critical => acc.critical += 1,
                    Severity::High => acc.high += 1,
                    Severity::Medium => acc.medium += 1,
                    Severity::Low => acc.low += 1,
                    Severity::Unknown => acc.unknown += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.unknown
    }

    /// Highest severity with at least one finding.
    pub fn highest(&self) -> Option<Severity> {
        [
            (Severity::Critical, self.critical),
            (Severity::High, self.high),
            (Severity::Medium, self.medium),
            (Severity::Low, self.low),
            (Severity::Unknown, self.unknown),
        ]
        .into_iter()
        .find(|(_, count)| *count > 0)
        .map(|(severity, _)| severity)
    }
}
