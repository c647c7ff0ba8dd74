use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Gender;
use super::tcm::{Auscultation, Inquiry, Inspection, Palpation};

/// Plausible pulse range accepted from the palpation form.
pub const PULSE_RATE_RANGE: std::ops::RangeInclusive<u16> = 1..=300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub chief_complaint: String,
    pub complaint_duration: Option<String>,
    /// Quick-entry tongue color from the short intake form. The inspection
    /// section takes precedence when both are present.
    pub tongue_color: Option<String>,
    pub tcm_inspection: Option<Inspection>,
    pub tcm_auscultation: Option<Auscultation>,
    pub tcm_inquiry: Option<Inquiry>,
    pub tcm_palpation: Option<Palpation>,
    pub emotional_state: Option<String>,
    pub lifestyle_factors: Option<String>,
    pub medical_history: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Intake payload for a new patient.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub chief_complaint: String,
    #[serde(default)]
    pub complaint_duration: Option<String>,
    #[serde(default)]
    pub tongue_color: Option<String>,
    #[serde(default)]
    pub tcm_inspection: Option<Inspection>,
    #[serde(default)]
    pub tcm_auscultation: Option<Auscultation>,
    #[serde(default)]
    pub tcm_inquiry: Option<Inquiry>,
    #[serde(default)]
    pub tcm_palpation: Option<Palpation>,
    #[serde(default)]
    pub emotional_state: Option<String>,
    #[serde(default)]
    pub lifestyle_factors: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
}

/// Partial update. Absent fields are left unchanged; a blank string or an
/// empty diagnostic section clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub chief_complaint: Option<String>,
    pub complaint_duration: Option<String>,
    pub tongue_color: Option<String>,
    pub tcm_inspection: Option<Inspection>,
    pub tcm_auscultation: Option<Auscultation>,
    pub tcm_inquiry: Option<Inquiry>,
    pub tcm_palpation: Option<Palpation>,
    pub emotional_state: Option<String>,
    pub lifestyle_factors: Option<String>,
    pub medical_history: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatientValidationError {
    #[error("{0} must not be empty")]
    BlankField(&'static str),
    #[error("Date of birth {0} is in the future")]
    FutureDob(NaiveDate),
    #[error("Pulse rate {0} is outside 1-300 bpm")]
    PulseRateOutOfRange(u16),
}

impl NewPatient {
    pub fn validate(&self, today: NaiveDate) -> Result<(), PatientValidationError> {
        require_text("name", &self.name)?;
        require_text("chief_complaint", &self.chief_complaint)?;
        check_dob(self.dob, today)?;
        check_palpation(self.tcm_palpation.as_ref())
    }

    /// Build the stored record: trims required text, drops blank optional
    /// text and empty sections.
    pub fn into_patient(self, id: Uuid, now: DateTime<Utc>) -> Patient {
        Patient {
            id,
            name: self.name.trim().to_string(),
            dob: self.dob,
            gender: self.gender,
            chief_complaint: self.chief_complaint.trim().to_string(),
            complaint_duration: non_blank(self.complaint_duration),
            tongue_color: non_blank(self.tongue_color),
            tcm_inspection: self.tcm_inspection.filter(|s| !s.is_empty()),
            tcm_auscultation: self.tcm_auscultation.filter(|s| !s.is_empty()),
            tcm_inquiry: self.tcm_inquiry.filter(|s| !s.is_empty()),
            tcm_palpation: self
                .tcm_palpation
                .map(Palpation::deduplicated)
                .filter(|s| !s.is_empty()),
            emotional_state: non_blank(self.emotional_state),
            lifestyle_factors: non_blank(self.lifestyle_factors),
            medical_history: non_blank(self.medical_history),
            created_at: now,
            updated_at: now,
        }
    }
}

impl PatientUpdate {
    pub fn validate(&self, today: NaiveDate) -> Result<(), PatientValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(complaint) = &self.chief_complaint {
            require_text("chief_complaint", complaint)?;
        }
        if let Some(dob) = self.dob {
            check_dob(dob, today)?;
        }
        check_palpation(self.tcm_palpation.as_ref())
    }
}

impl Patient {
    /// Merge an update into this record and bump `updated_at`.
    pub fn apply(&mut self, update: PatientUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(dob) = update.dob {
            self.dob = dob;
        }
        if let Some(gender) = update.gender {
            self.gender = gender;
        }
        if let Some(complaint) = update.chief_complaint {
            self.chief_complaint = complaint.trim().to_string();
        }
        merge_text(&mut self.complaint_duration, update.complaint_duration);
        merge_text(&mut self.tongue_color, update.tongue_color);
        merge_text(&mut self.emotional_state, update.emotional_state);
        merge_text(&mut self.lifestyle_factors, update.lifestyle_factors);
        merge_text(&mut self.medical_history, update.medical_history);
        if let Some(section) = update.tcm_inspection {
            self.tcm_inspection = Some(section).filter(|s| !s.is_empty());
        }
        if let Some(section) = update.tcm_auscultation {
            self.tcm_auscultation = Some(section).filter(|s| !s.is_empty());
        }
        if let Some(section) = update.tcm_inquiry {
            self.tcm_inquiry = Some(section).filter(|s| !s.is_empty());
        }
        if let Some(section) = update.tcm_palpation {
            self.tcm_palpation = Some(section.deduplicated()).filter(|s| !s.is_empty());
        }
        self.updated_at = now;
    }

    /// Tongue color used for knowledge retrieval.
    pub fn effective_tongue_color(&self) -> Option<&str> {
        self.tcm_inspection
            .as_ref()
            .and_then(|i| i.tongue_color)
            .map(|c| c.as_str())
            .or(self.tongue_color.as_deref())
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), PatientValidationError> {
    if value.trim().is_empty() {
        return Err(PatientValidationError::BlankField(field));
    }
    Ok(())
}

fn check_dob(dob: NaiveDate, today: NaiveDate) -> Result<(), PatientValidationError> {
    if dob > today {
        return Err(PatientValidationError::FutureDob(dob));
    }
    Ok(())
}

fn check_palpation(palpation: Option<&Palpation>) -> Result<(), PatientValidationError> {
    match palpation.and_then(|p| p.pulse_rate) {
        Some(rate) if !PULSE_RATE_RANGE.contains(&rate) => {
            Err(PatientValidationError::PulseRateOutOfRange(rate))
        }
        _ => Ok(()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn merge_text(target: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming {
        *target = non_blank(Some(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{PulseQuality, TongueColor};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn intake() -> NewPatient {
        serde_json::from_value(serde_json::json!({
            "name": "  Li Wei ",
            "dob": "1980-05-17",
            "gender": "male",
            "chief_complaint": "Insomnia and palpitations",
            "complaint_duration": "  ",
            "tcm_inspection": { "tongue_color": "red" },
            "tcm_auscultation": {}
        }))
        .unwrap()
    }

    #[test]
    fn intake_parses_and_validates() {
        let new = intake();
        assert_eq!(new.gender, Gender::Male);
        assert!(new.validate(today()).is_ok());
    }

    #[test]
    fn blank_name_rejected() {
        let mut new = intake();
        new.name = "   ".into();
        assert_eq!(
            new.validate(today()),
            Err(PatientValidationError::BlankField("name"))
        );
    }

    #[test]
    fn future_dob_rejected() {
        let mut new = intake();
        new.dob = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(matches!(
            new.validate(today()),
            Err(PatientValidationError::FutureDob(_))
        ));
    }

    #[test]
    fn pulse_rate_out_of_range_rejected() {
        let mut new = intake();
        new.tcm_palpation = Some(Palpation {
            pulse_rate: Some(0),
            pulse_qualities: vec![],
        });
        assert_eq!(
            new.validate(today()),
            Err(PatientValidationError::PulseRateOutOfRange(0))
        );
    }

    #[test]
    fn pulse_rate_upper_bound_inclusive() {
        let mut new = intake();
        new.tcm_palpation = Some(Palpation {
            pulse_rate: Some(300),
            pulse_qualities: vec![],
        });
        assert!(new.validate(today()).is_ok());

        new.tcm_palpation = Some(Palpation {
            pulse_rate: Some(301),
            pulse_qualities: vec![],
        });
        assert_eq!(
            new.validate(today()),
            Err(PatientValidationError::PulseRateOutOfRange(301))
        );
    }

    #[test]
    fn dob_today_accepted() {
        let mut new = intake();
        new.dob = today();
        assert!(new.validate(today()).is_ok());

        let update = PatientUpdate {
            dob: Some(today()),
            ..Default::default()
        };
        assert!(update.validate(today()).is_ok());
    }

    #[test]
    fn duplicate_pulse_qualities_stored_once() {
        let mut new = intake();
        new.tcm_palpation = Some(Palpation {
            pulse_rate: None,
            pulse_qualities: vec![PulseQuality::Wiry, PulseQuality::Wiry],
        });
        let mut patient = new.into_patient(Uuid::new_v4(), Utc::now());
        assert_eq!(
            patient.tcm_palpation.as_ref().unwrap().pulse_qualities,
            vec![PulseQuality::Wiry]
        );

        let update = PatientUpdate {
            tcm_palpation: Some(Palpation {
                pulse_rate: Some(70),
                pulse_qualities: vec![PulseQuality::Slow, PulseQuality::Rapid, PulseQuality::Slow],
            }),
            ..Default::default()
        };
        patient.apply(update, Utc::now());
        assert_eq!(
            patient.tcm_palpation.unwrap().pulse_qualities,
            vec![PulseQuality::Slow, PulseQuality::Rapid]
        );
    }

    #[test]
    fn into_patient_normalizes_fields() {
        let now = Utc::now();
        let patient = intake().into_patient(Uuid::new_v4(), now);
        assert_eq!(patient.name, "Li Wei");
        assert_eq!(patient.complaint_duration, None);
        assert!(patient.tcm_inspection.is_some());
        assert!(patient.tcm_auscultation.is_none(), "empty section is dropped");
        assert_eq!(patient.created_at, patient.updated_at);
    }

    #[test]
    fn apply_merges_and_clears() {
        let created = Utc::now();
        let mut patient = intake().into_patient(Uuid::new_v4(), created);
        patient.medical_history = Some("Hypertension".into());

        let update = PatientUpdate {
            chief_complaint: Some(" Night sweats ".into()),
            medical_history: Some(String::new()),
            tcm_inspection: Some(Inspection::default()),
            tcm_palpation: Some(Palpation {
                pulse_rate: Some(88),
                pulse_qualities: vec![PulseQuality::Rapid],
            }),
            ..Default::default()
        };
        let later = created + chrono::Duration::seconds(5);
        patient.apply(update, later);

        assert_eq!(patient.chief_complaint, "Night sweats");
        assert_eq!(patient.name, "Li Wei", "untouched field kept");
        assert_eq!(patient.medical_history, None);
        assert_eq!(patient.tcm_inspection, None);
        assert_eq!(patient.tcm_palpation.unwrap().pulse_rate, Some(88));
        assert_eq!(patient.updated_at, later);
        assert_eq!(patient.created_at, created);
    }

    #[test]
    fn effective_tongue_color_prefers_inspection() {
        let mut patient = intake().into_patient(Uuid::new_v4(), Utc::now());
        patient.tongue_color = Some("pale".into());
        assert_eq!(patient.effective_tongue_color(), Some("red"));

        patient.tcm_inspection = None;
        assert_eq!(patient.effective_tongue_color(), Some("pale"));

        patient.tongue_color = None;
        assert_eq!(patient.effective_tongue_color(), None);

        patient.tcm_inspection = Some(Inspection {
            tongue_color: Some(TongueColor::Purple),
            ..Default::default()
        });
        assert_eq!(patient.effective_tongue_color(), Some("purple"));
    }
}
