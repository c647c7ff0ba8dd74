//! The four diagnostic methods (四诊) recorded per patient.
//!
//! Each section is persisted as a JSON column and rendered verbatim into
//! the report prompt, so field names are part of the stored format.

use serde::{Deserialize, Serialize};

use super::enums::{
    Appetite, ColdHeatSensation, Complexion, PulseQuality, TongueCoating, TongueColor,
    VoiceSound,
};

/// Inspection (望诊): complexion and tongue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inspection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexion: Option<Complexion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tongue_color: Option<TongueColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tongue_coating: Option<TongueCoating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tongue_features: Option<String>,
}

impl Inspection {
    pub fn is_empty(&self) -> bool {
        self.complexion.is_none()
            && self.tongue_color.is_none()
            && self.tongue_coating.is_none()
            && is_blank(&self.tongue_features)
    }
}

/// Auscultation and olfaction (闻诊).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Auscultation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_sound: Option<VoiceSound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breath_odor: Option<String>,
}

impl Auscultation {
    pub fn is_empty(&self) -> bool {
        self.voice_sound.is_none() && is_blank(&self.breath_odor)
    }
}

/// Inquiry (问诊): the ten questions, condensed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inquiry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cold_heat_sensation: Option<ColdHeatSensation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appetite: Option<Appetite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thirst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bowel_movements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pain_description: Option<String>,
}

impl Inquiry {
    pub fn is_empty(&self) -> bool {
        self.cold_heat_sensation.is_none()
            && self.appetite.is_none()
            && is_blank(&self.sweating)
            && is_blank(&self.thirst)
            && is_blank(&self.sleep_pattern)
            && is_blank(&self.bowel_movements)
            && is_blank(&self.urination)
            && is_blank(&self.pain_description)
    }
}

/// Palpation (切诊): pulse taking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palpation {
    /// Beats per minute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_rate: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pulse_qualities: Vec<PulseQuality>,
}

impl Palpation {
    pub fn is_empty(&self) -> bool {
        self.pulse_rate.is_none() && self.pulse_qualities.is_empty()
    }

    /// Pulse qualities are a set: keep the first occurrence of each.
    pub fn deduplicated(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.pulse_qualities.len());
        self.pulse_qualities.retain(|q| {
            if seen.contains(q) {
                false
            } else {
                seen.push(*q);
                true
            }
        });
        self
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}
