use serde::Serialize;

use crate::models::Patient;

pub const REPORT_SYSTEM_PROMPT: &str =
    "You are an experienced TCM practitioner providing detailed diagnostic reports.";

pub const REPORT_SECTIONS: [&str; 5] = [
    "Overview",
    "TCM Diagnosis",
    "Pattern Identification",
    "Treatment Principles",
    "Recommendations",
];

/// Build the user prompt for a diagnostic report.
///
/// Diagnostic sections are embedded as compact JSON (`null` when not
/// recorded) so the model sees exactly what the practitioner entered.
pub fn build_report_prompt(patient: &Patient, knowledge_context: &str) -> String {
    let mut prompt = String::from(
        "As a TCM practitioner, generate a comprehensive diagnostic report based on the \
         following patient data and relevant TCM knowledge.\n\n",
    );

    prompt.push_str("Patient Information:\n");
    prompt.push_str(&format!("- Chief Complaint: {}\n", patient.chief_complaint));
    if let Some(duration) = &patient.complaint_duration {
        prompt.push_str(&format!("- Complaint Duration: {duration}\n"));
    }
    prompt.push_str(&format!("- TCM Inspection: {}\n", section_json(&patient.tcm_inspection)));
    prompt.push_str(&format!(
        "- TCM Auscultation: {}\n",
        section_json(&patient.tcm_auscultation)
    ));
    prompt.push_str(&format!("- TCM Inquiry: {}\n", section_json(&patient.tcm_inquiry)));
    prompt.push_str(&format!("- TCM Palpation: {}\n", section_json(&patient.tcm_palpation)));
    for (label, value) in [
        ("Emotional State", &patient.emotional_state),
        ("Lifestyle Factors", &patient.lifestyle_factors),
        ("Medical History", &patient.medical_history),
    ] {
        if let Some(value) = value {
            prompt.push_str(&format!("- {label}: {value}\n"));
        }
    }
    prompt.push_str(&format!("- Date of Birth: {}\n", patient.dob));
    prompt.push_str(&format!("- Gender: {}\n", patient.gender));
    prompt.push_str(&format!("- Name: {}\n\n", patient.name));

    prompt.push_str("Relevant TCM Knowledge:\n");
    prompt.push_str(knowledge_context);
    prompt.push_str("\n\n");

    prompt.push_str(
        "Please generate a structured TCM diagnostic report with the following sections:\n",
    );
    for (i, section) in REPORT_SECTIONS.iter().enumerate() {
        prompt.push_str(&format!("{}. {section}\n", i + 1));
    }
    prompt.push_str(
        "\nFormat the response in a clear, professional manner suitable for medical documentation.",
    );

    prompt
}

fn section_json<T: Serialize>(section: &Option<T>) -> String {
    serde_json::to_string(section).unwrap_or_else(|_| "null".to_string())
}
