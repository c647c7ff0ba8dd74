use super::context::build_knowledge_context;
use super::prompt::{build_report_prompt, REPORT_SYSTEM_PROMPT};
use super::retrieval::{build_search_query, retrieve};
use super::types::{ChatModel, ReportSettings, TcmReport};
use super::ReportError;
use crate::models::Patient;
use crate::pipeline::knowledge::KnowledgeStore;

/// One report run: search query → knowledge retrieval → prompt → completion.
///
/// A failed retrieval aborts the run; the model is never called with a
/// partial context.
pub struct ReportPipeline<'a> {
    knowledge: &'a dyn KnowledgeStore,
    model: &'a dyn ChatModel,
    settings: &'a ReportSettings,
}

impl<'a> ReportPipeline<'a> {
    pub fn new(
        knowledge: &'a dyn KnowledgeStore,
        model: &'a dyn ChatModel,
        settings: &'a ReportSettings,
    ) -> Self {
        Self {
            knowledge,
            model,
            settings,
        }
    }

    pub async fn generate(&self, patient: &Patient) -> Result<TcmReport, ReportError> {
        let search_query = build_search_query(patient);
        tracing::debug!(patient_id = %patient.id, query = %search_query, "Report search query");

        let knowledge = retrieve(self.knowledge, &search_query, self.settings).await?;
        let context = build_knowledge_context(&knowledge);
        let prompt = build_report_prompt(patient, &context);

        let content = self.model.complete(REPORT_SYSTEM_PROMPT, &prompt).await?;
        tracing::info!(
            patient_id = %patient.id,
            model = self.model.model_name(),
            passages = knowledge.len(),
            "Report generated"
        );

        Ok(TcmReport {
            content,
            model: self.model.model_name().to_string(),
            search_query,
            knowledge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::super::context::NO_KNOWLEDGE_FALLBACK;
    use super::super::mock::{FailingKnowledgeStore, MockChatModel};
    use crate::models::enums::{Gender, TongueColor};
    use crate::models::{Inspection, NewPatient};
    use crate::pipeline::knowledge::{InMemoryKnowledgeStore, KnowledgeEntry};

    fn patient() -> Patient {
        NewPatient {
            name: "Lin Yue".into(),
            dob: NaiveDate::from_ymd_opt(1982, 4, 12).unwrap(),
            gender: Gender::Female,
            chief_complaint: "Insomnia".into(),
            complaint_duration: None,
            tongue_color: None,
            tcm_inspection: Some(Inspection {
                tongue_color: Some(TongueColor::Red),
                ..Default::default()
            }),
            tcm_auscultation: None,
            tcm_inquiry: None,
            tcm_palpation: None,
            emotional_state: None,
            lifestyle_factors: None,
            medical_history: None,
        }
        .into_patient(Uuid::new_v4(), Utc::now())
    }

    async fn seeded_store() -> InMemoryKnowledgeStore {
        let store = InMemoryKnowledgeStore::new();
        store
            .index(&KnowledgeEntry::new(
                "Heart yin deficiency: insomnia, red tongue, night sweats.",
                Some("Heart Yin Deficiency".into()),
            ))
            .await
            .unwrap();
        store
            .index(&KnowledgeEntry::new(
                "Cold invading the stomach causes sharp epigastric pain.",
                Some("Stomach Cold".into()),
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn generates_report_with_retrieved_knowledge() {
        let store = seeded_store().await;
        let model = MockChatModel::new("1. Overview\nHeart yin deficiency.");
        let settings = ReportSettings::default();

        let report = ReportPipeline::new(&store, &model, &settings)
            .generate(&patient())
            .await
            .unwrap();

        assert_eq!(report.content, "1. Overview\nHeart yin deficiency.");
        assert_eq!(report.model, "mock-chat");
        assert_eq!(report.search_query, "Insomnia red");
        assert_eq!(
            report.knowledge[0].title.as_deref(),
            Some("Heart Yin Deficiency")
        );

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("Heart Yin Deficiency:\nHeart yin deficiency: insomnia"));
        assert!(prompt.contains("- Chief Complaint: Insomnia"));

        let (system, _) = model.prompts.lock().unwrap()[0].clone();
        assert_eq!(system, REPORT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn empty_store_uses_fallback_context() {
        let store = InMemoryKnowledgeStore::new();
        let model = MockChatModel::new("report");
        let settings = ReportSettings::default();

        let report = ReportPipeline::new(&store, &model, &settings)
            .generate(&patient())
            .await
            .unwrap();

        assert!(report.knowledge.is_empty());
        assert!(model.last_prompt().unwrap().contains(NO_KNOWLEDGE_FALLBACK));
    }

    #[tokio::test]
    async fn retrieval_failure_aborts_before_completion() {
        let model = MockChatModel::new("unused");
        let settings = ReportSettings::default();

        let result = ReportPipeline::new(&FailingKnowledgeStore, &model, &settings)
            .generate(&patient())
            .await;

        assert!(matches!(result, Err(ReportError::Knowledge(_))));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn completion_failure_is_propagated() {
        let store = seeded_store().await;
        let model = MockChatModel::failing(500);
        let settings = ReportSettings::default();

        let result = ReportPipeline::new(&store, &model, &settings)
            .generate(&patient())
            .await;

        assert!(matches!(
            result,
            Err(ReportError::Upstream { status: 500, .. })
        ));
    }
}
