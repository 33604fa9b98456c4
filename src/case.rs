//! Case fixtures shown on the dashboard.
//!
//! # Data Model
//!
//! ```text
//! cases.toml / built-in demo set
//!        │
//!        ▼
//!   CaseBook (immutable, validated)
//!        │
//!        ▼
//!   Dashboard working copies (mutated by the mission script)
//! ```
//!
//! A `CaseBook` is built once at startup and handed to the dashboard. The
//! dashboard never writes back into it; selecting a case copies the fixture
//! again, which is how the demo "resets".

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Three-level threat classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Banner label
    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "LOW THREAT",
            Severity::Medium => "MEDIUM THREAT",
            Severity::High => "HIGH THREAT",
        }
    }

    /// Banner colour
    pub fn color(self) -> Color {
        match self {
            Severity::Low => Color::Rgb(22, 241, 149),   // #16f195
            Severity::Medium => Color::Rgb(255, 165, 0), // #ffa500
            Severity::High => Color::Rgb(255, 75, 75),   // #ff4b4b
        }
    }
}

/// A person picked out of the drone feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    /// Thumbnail reference, relative to the assets root
    #[serde(default, alias = "img")]
    pub image: Option<String>,
    /// Free-text status ("Armed", "Fleeing", ...)
    #[serde(default)]
    pub status: Option<String>,
}

impl Subject {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            image: None,
            status: None,
        }
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }
}

/// Partial override applied to a working case when the mission enters a phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CasePatch {
    pub severity: Option<Severity>,
    pub people_count: Option<u32>,
    #[serde(alias = "weapon_detected")]
    pub weapon_count: Option<u32>,
    pub subjects: Option<Vec<Subject>>,
}

impl CasePatch {
    /// Apply to a case. Returns true if anything changed.
    pub fn apply(&self, case: &mut Case) -> bool {
        let before = case.clone();
        if let Some(severity) = self.severity {
            case.severity = severity;
        }
        if let Some(people) = self.people_count {
            case.people_count = people;
        }
        if let Some(weapons) = self.weapon_count {
            case.weapon_count = weapons;
        }
        if let Some(ref subjects) = self.subjects {
            case.subjects = subjects.clone();
        }
        *case != before
    }
}

/// Scripted drone trip attached to a case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionScript {
    /// Countdown from launch to arrival on site
    pub trip_secs: u64,
    /// Time spent scanning before a weapon is "detected"
    pub detection_delay_secs: u64,
    /// Applied when the drone departs
    pub en_route: Option<CasePatch>,
    /// Applied once detection is confirmed
    pub scanning: Option<CasePatch>,
    /// Applied on negotiation; falls back to `scanning`
    pub negotiation: Option<CasePatch>,
}

impl Default for MissionScript {
    fn default() -> Self {
        Self {
            trip_secs: 90,
            detection_delay_secs: 6,
            en_route: None,
            scanning: None,
            negotiation: None,
        }
    }
}

impl MissionScript {
    pub fn negotiation_patch(&self) -> Option<&CasePatch> {
        self.negotiation.as_ref().or(self.scanning.as_ref())
    }
}

/// One simulated incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: u32,
    pub mission: String,
    pub severity: Severity,
    #[serde(default)]
    pub people_count: u32,
    #[serde(default, alias = "weapon_detected")]
    pub weapon_count: u32,
    #[serde(default, alias = "subject")]
    pub subjects: Vec<Subject>,
    pub summary: String,
    /// Looping demo video reference
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub script: Option<MissionScript>,
}

/// Errors raised while building a case book
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("case book is empty")]
    Empty,

    #[error("duplicate case id {0}")]
    DuplicateId(u32),

    #[error("failed to read case file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse case file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct CaseFile {
    #[serde(rename = "case", default)]
    cases: Vec<Case>,
}

/// Immutable, validated set of case fixtures
#[derive(Debug, Clone)]
pub struct CaseBook {
    cases: Vec<Case>,
}

impl CaseBook {
    /// Build a case book, rejecting empty sets and duplicate ids
    pub fn new(cases: Vec<Case>) -> Result<Self, CaseError> {
        if cases.is_empty() {
            return Err(CaseError::Empty);
        }
        let mut seen = HashSet::new();
        for case in &cases {
            if !seen.insert(case.id) {
                return Err(CaseError::DuplicateId(case.id));
            }
        }
        Ok(Self { cases })
    }

    /// Parse `[[case]]` tables
    pub fn from_toml_str(content: &str) -> Result<Self, CaseError> {
        let file: CaseFile = toml::from_str(content)?;
        Self::new(file.cases)
    }

    /// Load fixtures from a TOML file
    pub fn load(path: &Path) -> Result<Self, CaseError> {
        let content = std::fs::read_to_string(path).map_err(|source| CaseError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let book = Self::from_toml_str(&content)?;
        tracing::info!("Loaded {} cases from {}", book.len(), path.display());
        Ok(book)
    }

    /// Built-in demo fixtures
    pub fn demo() -> Self {
        let escalated = vec![
            Subject::named("Subject A").with_image("images/subject1.jpg"),
            Subject::named("Subject B").with_image("images/subject2.jpg"),
        ];

        let cases = vec![
            Case {
                id: 1,
                mission: "ORBIT-02".to_string(),
                severity: Severity::Medium,
                people_count: 3,
                weapon_count: 0,
                subjects: vec![],
                summary: "Caller reports disturbance; three people inside; no confirmed weapon on call."
                    .to_string(),
                video: None,
                script: Some(MissionScript {
                    trip_secs: 90,
                    detection_delay_secs: 6,
                    en_route: Some(CasePatch {
                        severity: Some(Severity::Medium),
                        people_count: Some(3),
                        weapon_count: Some(0),
                        subjects: Some(vec![]),
                    }),
                    scanning: Some(CasePatch {
                        severity: Some(Severity::High),
                        people_count: Some(5),
                        weapon_count: Some(1),
                        subjects: Some(escalated),
                    }),
                    negotiation: None,
                }),
            },
            Case {
                id: 2,
                mission: "ORBIT-02".to_string(),
                severity: Severity::Medium,
                people_count: 3,
                weapon_count: 1,
                subjects: vec![],
                summary: "Case ORBIT-02: Three individuals near loading bay. One low-confidence sidearm outline."
                    .to_string(),
                video: None,
                script: None,
            },
            Case {
                id: 3,
                mission: "ORBIT-02".to_string(),
                severity: Severity::High,
                people_count: 1,
                weapon_count: 1,
                subjects: vec![Subject::named("John Doe")],
                summary: "Known offender John Doe armed. Backup required. Engage high alert protocol."
                    .to_string(),
                video: None,
                script: None,
            },
        ];

        Self { cases }
    }

    pub fn get(&self, id: u32) -> Option<&Case> {
        self.cases.iter().find(|c| c.id == id)
    }

    pub fn first(&self) -> &Case {
        // new() rejects empty books
        &self.cases[0]
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    /// Id following `id`, wrapping around
    pub fn next_id(&self, id: u32) -> u32 {
        let pos = self.position(id);
        self.cases[(pos + 1) % self.cases.len()].id
    }

    /// Id preceding `id`, wrapping around
    pub fn previous_id(&self, id: u32) -> u32 {
        let pos = self.position(id);
        let len = self.cases.len();
        self.cases[(pos + len - 1) % len].id
    }

    fn position(&self, id: u32) -> usize {
        self.cases.iter().position(|c| c.id == id).unwrap_or(0)
    }

    fn len(&self) -> usize {
        self.cases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(Severity::Low.label(), "LOW THREAT");
        assert_eq!(Severity::Medium.label(), "MEDIUM THREAT");
        assert_eq!(Severity::High.label(), "HIGH THREAT");
        assert_eq!(Severity::High.color(), Color::Rgb(255, 75, 75));
    }

    #[test]
    fn test_demo_book() {
        let book = CaseBook::demo();
        assert_eq!(book.len(), 3);
        assert!(book.get(1).unwrap().script.is_some());
        assert!(book.get(2).unwrap().script.is_none());
        assert_eq!(book.get(3).unwrap().subjects[0].name, "John Doe");
    }

    #[test]
    fn test_cyclic_ids() {
        let book = CaseBook::demo();
        assert_eq!(book.next_id(1), 2);
        assert_eq!(book.next_id(3), 1);
        assert_eq!(book.previous_id(1), 3);
        assert_eq!(book.previous_id(2), 1);
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(matches!(CaseBook::new(vec![]), Err(CaseError::Empty)));

        let case = CaseBook::demo().first().clone();
        let result = CaseBook::new(vec![case.clone(), case]);
        assert!(matches!(result, Err(CaseError::DuplicateId(1))));
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            [[case]]
            id = 7
            mission = "HALO-11"
            severity = "low"
            people_count = 2
            summary = "Two hikers reported overdue."

            [[case.subject]]
            name = "Alpha-01"
            status = "Unarmed"

            [case.script]
            trip_secs = 30

            [case.script.scanning]
            severity = "medium"
            weapon_detected = 1
        "#;

        let book = CaseBook::from_toml_str(toml).unwrap();
        let case = book.get(7).unwrap();
        assert_eq!(case.severity, Severity::Low);
        assert_eq!(case.weapon_count, 0);
        assert_eq!(case.subjects[0].status.as_deref(), Some("Unarmed"));

        let script = case.script.as_ref().unwrap();
        assert_eq!(script.trip_secs, 30);
        assert_eq!(script.detection_delay_secs, 6);
        assert_eq!(script.negotiation_patch().unwrap().weapon_count, Some(1));
    }

    #[test]
    fn test_from_toml_bad_severity() {
        let toml = r#"
            [[case]]
            id = 1
            mission = "X"
            severity = "extreme"
            summary = "bad"
        "#;
        assert!(matches!(CaseBook::from_toml_str(toml), Err(CaseError::Parse(_))));
    }

    #[test]
    fn test_patch_apply() {
        let mut case = CaseBook::demo().first().clone();
        let patch = CasePatch {
            weapon_count: Some(1),
            severity: Some(Severity::High),
            ..Default::default()
        };
        assert!(patch.apply(&mut case));
        assert_eq!(case.weapon_count, 1);
        assert_eq!(case.people_count, 3);
        // Second application is a no-op
        assert!(!patch.apply(&mut case));
    }
}
