//! Patient records and intake requests.

use chrono::{DateTime, Local, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tier::{Tier, TierPolicy};

/// Oldest accepted age, in years.
pub const MAX_AGE: u32 = 150;

/// Text returned by [`PatientRecord::formatted_history`] for an empty log.
pub const NO_NOTES: &str = "No notes recorded.";

const NOTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Construction-time validation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Patient name cannot be empty")]
    EmptyName,

    #[error("Age {0} is outside 0-150")]
    AgeOutOfRange(u32),

    #[error("Birthdate {0} is in the future")]
    BirthdateInFuture(NaiveDate),

    #[error("Birthdate {0} is more than 150 years ago")]
    BirthdateTooOld(NaiveDate),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A single timestamped entry in a patient's note log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteEntry {
    /// Capture time
    pub recorded_at: DateTime<Utc>,
    /// Note text (trimmed, never empty)
    pub text: String,
}

/// A waiting patient.
///
/// Identity is the synthetic `id`; names are not guaranteed unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    id: String,
    name: String,
    age: u32,
    birthdate: NaiveDate,
    tier: Tier,
    arrived_at: DateTime<Utc>,
    arrival_seq: u64,
    notes: Vec<NoteEntry>,
}

impl PatientRecord {
    /// Create a validated patient record.
    ///
    /// A non-blank `initial_note` becomes the first note entry.
    pub fn new(
        name: &str,
        age: u32,
        birthdate: NaiveDate,
        tier: Tier,
        initial_note: Option<&str>,
    ) -> ValidationResult<Self> {
        let name = validate_name(name)?;
        validate_age(age)?;
        validate_birthdate(birthdate)?;

        let mut record = Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            age,
            birthdate,
            tier,
            arrived_at: Utc::now(),
            arrival_seq: 0,
            notes: Vec::new(),
        };
        if let Some(note) = initial_note {
            record.add_note(note);
        }
        Ok(record)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn birthdate(&self) -> NaiveDate {
        self.birthdate
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Time the patient joined the queue.
    pub fn arrived_at(&self) -> DateTime<Utc> {
        self.arrived_at
    }

    /// Arrival order assigned by the queue; breaks ties within a tier.
    pub fn arrival_seq(&self) -> u64 {
        self.arrival_seq
    }

    /// Dispatch ordering key: lower is served first.
    pub fn dispatch_key(&self) -> (u8, u64) {
        (self.tier.rank(), self.arrival_seq)
    }

    pub(crate) fn stamp_arrival(&mut self, seq: u64) {
        self.arrival_seq = seq;
        self.arrived_at = Utc::now();
    }

    // =========================================================================
    // Notes
    // =========================================================================

    /// Append a note. Returns false (and changes nothing) for blank text.
    pub fn add_note(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        // Keep the log non-decreasing even if the wall clock steps back.
        let now = Utc::now();
        let recorded_at = match self.notes.last() {
            Some(last) if last.recorded_at > now => last.recorded_at,
            _ => now,
        };

        self.notes.push(NoteEntry {
            recorded_at,
            text: text.to_string(),
        });
        true
    }

    /// Entries in chronological order.
    pub fn notes(&self) -> &[NoteEntry] {
        &self.notes
    }

    pub fn has_notes(&self) -> bool {
        !self.notes.is_empty()
    }

    /// Text of the most recent note, or "" when there are none.
    pub fn latest_note(&self) -> &str {
        self.notes.last().map(|n| n.text.as_str()).unwrap_or("")
    }

    /// All notes, one per line, each prefixed with its capture time.
    pub fn formatted_history(&self) -> String {
        if self.notes.is_empty() {
            return NO_NOTES.to_string();
        }

        self.notes
            .iter()
            .map(|n| format!("[{}] {}", n.recorded_at.format(NOTE_TIMESTAMP_FORMAT), n.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Overwrite the tier. Arrival order is kept, so the patient retains
    /// seniority from the original arrival.
    pub fn reassign_tier(&mut self, tier: Tier) {
        self.tier = tier;
    }

    pub fn rename(&mut self, name: &str) -> ValidationResult<()> {
        self.name = validate_name(name)?;
        Ok(())
    }

    pub fn set_age(&mut self, age: u32) -> ValidationResult<()> {
        validate_age(age)?;
        self.age = age;
        Ok(())
    }

    pub fn set_birthdate(&mut self, birthdate: NaiveDate) -> ValidationResult<()> {
        validate_birthdate(birthdate)?;
        self.birthdate = birthdate;
        Ok(())
    }

    // =========================================================================
    // Matching
    // =========================================================================

    /// Case-insensitive exact name match.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Case-insensitive substring match.
    pub fn name_contains(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.trim().to_lowercase())
    }
}

/// Validated values supplied by the intake desk.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeRequest {
    pub name: String,
    pub age: u32,
    pub birthdate: NaiveDate,
    pub is_emergency: bool,
    pub note: Option<String>,
}

impl IntakeRequest {
    pub fn new(name: impl Into<String>, age: u32, birthdate: NaiveDate, is_emergency: bool) -> Self {
        Self {
            name: name.into(),
            age,
            birthdate,
            is_emergency,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Classify and build the record.
    pub fn into_record(self, policy: &TierPolicy) -> ValidationResult<PatientRecord> {
        let tier = policy.classify(self.age, self.is_emergency);
        PatientRecord::new(&self.name, self.age, self.birthdate, tier, self.note.as_deref())
    }
}

fn validate_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

fn validate_age(age: u32) -> ValidationResult<()> {
    if age > MAX_AGE {
        return Err(ValidationError::AgeOutOfRange(age));
    }
    Ok(())
}

fn validate_birthdate(birthdate: NaiveDate) -> ValidationResult<()> {
    validate_birthdate_on(birthdate, Local::now().date_naive())
}

/// Check a birthdate against a given calendar day.
pub fn validate_birthdate_on(birthdate: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if birthdate > today {
        return Err(ValidationError::BirthdateInFuture(birthdate));
    }
    let oldest = today
        .checked_sub_months(Months::new(MAX_AGE * 12))
        .unwrap_or(NaiveDate::MIN);
    if birthdate < oldest {
        return Err(ValidationError::BirthdateTooOld(birthdate));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_patient() -> PatientRecord {
        PatientRecord::new("Max Power", 40, date(1985, 3, 14), Tier::Regular, None).unwrap()
    }

    #[test]
    fn test_new_patient() {
        let patient = make_patient();
        assert_eq!(patient.name(), "Max Power");
        assert_eq!(patient.age(), 40);
        assert_eq!(patient.tier(), Tier::Regular);
        assert!(!patient.has_notes());
        assert_eq!(patient.id().len(), 36); // UUID format
    }

    #[test]
    fn test_name_is_trimmed() {
        let patient = PatientRecord::new("  Ann  ", 30, date(1995, 1, 1), Tier::Regular, None).unwrap();
        assert_eq!(patient.name(), "Ann");
    }

    #[test]
    fn test_validation_failures() {
        let bd = date(1990, 1, 1);
        assert_eq!(
            PatientRecord::new("   ", 30, bd, Tier::Regular, None).unwrap_err(),
            ValidationError::EmptyName
        );
        assert_eq!(
            PatientRecord::new("Al", 151, bd, Tier::Regular, None).unwrap_err(),
            ValidationError::AgeOutOfRange(151)
        );
        assert!(PatientRecord::new("Al", 150, bd, Tier::Regular, None).is_ok());
        assert!(PatientRecord::new("Al", 0, bd, Tier::Regular, None).is_ok());
    }

    #[test]
    fn test_birthdate_bounds() {
        let today = date(2024, 6, 1);
        assert!(validate_birthdate_on(today, today).is_ok());
        assert!(validate_birthdate_on(date(1874, 6, 1), today).is_ok());
        assert!(matches!(
            validate_birthdate_on(date(2024, 6, 2), today),
            Err(ValidationError::BirthdateInFuture(_))
        ));
        assert!(matches!(
            validate_birthdate_on(date(1874, 5, 31), today),
            Err(ValidationError::BirthdateTooOld(_))
        ));
    }

    #[test]
    fn test_initial_note() {
        let patient =
            PatientRecord::new("Ann", 30, date(1995, 1, 1), Tier::Regular, Some("chest pain")).unwrap();
        assert_eq!(patient.latest_note(), "chest pain");

        let blank = PatientRecord::new("Ann", 30, date(1995, 1, 1), Tier::Regular, Some("  ")).unwrap();
        assert!(!blank.has_notes());
    }

    #[test]
    fn test_note_history_round_trip() {
        let mut patient = make_patient();
        assert!(patient.add_note("x"));
        assert!(patient.add_note("y"));

        let history = patient.formatted_history();
        let lines: Vec<&str> = history.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("x"));
        assert!(lines[1].ends_with("y"));
        assert!(lines[0].starts_with('['));
        assert!(patient.notes()[0].recorded_at <= patient.notes()[1].recorded_at);
        assert_eq!(patient.latest_note(), "y");
    }

    #[test]
    fn test_blank_note_rejected() {
        let mut patient = make_patient();
        assert!(!patient.add_note("   "));
        assert_eq!(patient.latest_note(), "");
        assert_eq!(patient.formatted_history(), NO_NOTES);
    }

    #[test]
    fn test_reassign_keeps_arrival() {
        let mut patient = make_patient();
        patient.stamp_arrival(7);
        patient.reassign_tier(Tier::Emergency);
        assert_eq!(patient.tier(), Tier::Emergency);
        assert_eq!(patient.arrival_seq(), 7);
        assert_eq!(patient.dispatch_key(), (1, 7));
    }

    #[test]
    fn test_setters_validate() {
        let mut patient = make_patient();
        assert!(patient.rename("").is_err());
        assert_eq!(patient.name(), "Max Power");
        assert!(patient.set_age(200).is_err());
        assert_eq!(patient.age(), 40);
        patient.set_age(41).unwrap();
        assert_eq!(patient.age(), 41);
    }

    #[test]
    fn test_name_matching() {
        let patient = make_patient();
        assert!(patient.matches_name("max power"));
        assert!(!patient.matches_name("max"));
        assert!(patient.name_contains("POW"));
    }

    #[test]
    fn test_intake_classification() {
        let policy = TierPolicy::default();
        let senior = IntakeRequest::new("Bob", 80, date(1944, 2, 2), false)
            .into_record(&policy)
            .unwrap();
        assert_eq!(senior.tier(), Tier::Senior);

        let emergency = IntakeRequest::new("Amy", 80, date(1944, 2, 2), true)
            .with_note("fall")
            .into_record(&policy)
            .unwrap();
        assert_eq!(emergency.tier(), Tier::Emergency);
        assert_eq!(emergency.latest_note(), "fall");
    }
}
