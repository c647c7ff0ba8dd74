//! Repository layer: entity-scoped database operations.
//!
//! Every function takes a borrowed `Connection`; callers own connection
//! lifetime and transactions.

mod audit;
mod patient;
mod report;

pub use audit::*;
pub use patient::*;
pub use report::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use rusqlite::Connection;
    use uuid::Uuid;

    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;
    use crate::models::enums::*;
    use crate::models::*;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_patient(conn: &Connection, name: &str, complaint: &str, offset_secs: i64) -> Patient {
        let now = Utc::now() + Duration::seconds(offset_secs);
        let patient = Patient {
            id: Uuid::new_v4(),
            name: name.into(),
            dob: NaiveDate::from_ymd_opt(1975, 8, 2).unwrap(),
            gender: Gender::Female,
            chief_complaint: complaint.into(),
            complaint_duration: Some("3 months".into()),
            tongue_color: None,
            tcm_inspection: Some(Inspection {
                complexion: Some(Complexion::Pale),
                tongue_color: Some(TongueColor::Pale),
                tongue_coating: Some(TongueCoating::Thin),
                tongue_features: Some("tooth marks".into()),
            }),
            tcm_auscultation: None,
            tcm_inquiry: Some(Inquiry {
                appetite: Some(Appetite::NoAppetite),
                sleep_pattern: Some("wakes at 3am".into()),
                ..Default::default()
            }),
            tcm_palpation: Some(Palpation {
                pulse_rate: Some(62),
                pulse_qualities: vec![PulseQuality::Sinking, PulseQuality::Slow],
            }),
            emotional_state: Some("anxious".into()),
            lifestyle_factors: None,
            medical_history: None,
            created_at: now,
            updated_at: now,
        };
        insert_patient(conn, &patient).unwrap();
        patient
    }

    #[test]
    fn patient_insert_and_retrieve() {
        let conn = test_db();
        let stored = make_patient(&conn, "Wang Fang", "Fatigue", 0);
        let loaded = get_patient(&conn, &stored.id).unwrap().unwrap();
        assert_eq!(loaded, stored);
    }

    #[test]
    fn missing_patient_is_none() {
        let conn = test_db();
        assert!(get_patient(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn list_is_newest_first() {
        let conn = test_db();
        make_patient(&conn, "First", "Headache", 0);
        make_patient(&conn, "Second", "Headache", 10);
        make_patient(&conn, "Third", "Headache", 20);

        let names: Vec<String> = list_patients(&conn, &PatientFilter::default())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);
    }

    #[test]
    fn search_matches_name_or_complaint_case_insensitive() {
        let conn = test_db();
        make_patient(&conn, "Zhang San", "Chronic cough", 0);
        make_patient(&conn, "Li Si", "Lower back pain", 1);
        make_patient(&conn, "Chen Cough", "Insomnia", 2);

        let filter = PatientFilter::new(Some("COUGH".into()), None, None);
        let found = list_patients(&conn, &filter).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(count_patients(&conn, &filter).unwrap(), 2);

        let filter = PatientFilter::new(Some("back".into()), None, None);
        let found = list_patients(&conn, &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Li Si");
    }

    #[test]
    fn search_folds_accented_names() {
        let conn = test_db();
        make_patient(&conn, "Émile Durand", "Insomnia", 0);
        make_patient(&conn, "Emil Berg", "Headache", 1);

        for term in ["Émile", "émile", "ÉMILE"] {
            let filter = PatientFilter::new(Some(term.into()), None, None);
            let found = list_patients(&conn, &filter).unwrap();
            assert_eq!(found.len(), 1, "search term {term}");
            assert_eq!(found[0].name, "Émile Durand");
            assert_eq!(count_patients(&conn, &filter).unwrap(), 1);
        }
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let conn = test_db();
        make_patient(&conn, "Percent", "100% exhausted", 0);
        make_patient(&conn, "Plain", "exhausted", 1);

        let filter = PatientFilter::new(Some("%".into()), None, None);
        let found = list_patients(&conn, &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Percent");
    }

    #[test]
    fn pagination_splits_results() {
        let conn = test_db();
        for i in 0..5 {
            make_patient(&conn, &format!("Patient {i}"), "Dizziness", i);
        }

        let page1 = list_patients(&conn, &PatientFilter::new(None, Some(1), Some(2))).unwrap();
        let page3 = list_patients(&conn, &PatientFilter::new(None, Some(3), Some(2))).unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page1[0].name, "Patient 4");
        assert_eq!(page3.len(), 1);
        assert_eq!(page3[0].name, "Patient 0");
        assert_eq!(count_patients(&conn, &PatientFilter::default()).unwrap(), 5);
    }

    #[test]
    fn update_merges_and_persists() {
        let conn = test_db();
        let stored = make_patient(&conn, "Zhao Lei", "Night sweats", 0);
        let later = stored.updated_at + Duration::minutes(1);

        let update = PatientUpdate {
            chief_complaint: Some("Hot flushes".into()),
            tcm_palpation: Some(Palpation::default()),
            ..Default::default()
        };
        let updated = update_patient(&conn, &stored.id, update, later).unwrap();
        assert_eq!(updated.chief_complaint, "Hot flushes");
        assert!(updated.tcm_palpation.is_none());

        let reloaded = get_patient(&conn, &stored.id).unwrap().unwrap();
        assert_eq!(reloaded, updated);
        assert_eq!(reloaded.created_at, stored.created_at);
        assert_eq!(reloaded.updated_at, later);
    }

    #[test]
    fn update_missing_patient_is_not_found() {
        let conn = test_db();
        let result = update_patient(&conn, &Uuid::new_v4(), PatientUpdate::default(), Utc::now());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn update_that_changes_no_row_is_not_found() {
        let conn = test_db();
        let stored = make_patient(&conn, "Qian Yu", "Tinnitus", 0);
        // Simulates the row vanishing between the read and the write.
        conn.execute_batch(
            "CREATE TEMP TRIGGER skip_update BEFORE UPDATE ON patients
             BEGIN SELECT RAISE(IGNORE); END;",
        )
        .unwrap();

        let update = PatientUpdate {
            chief_complaint: Some("Vertigo".into()),
            ..Default::default()
        };
        let result = update_patient(&conn, &stored.id, update, Utc::now());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn delete_removes_patient_and_reports() {
        let conn = test_db();
        let stored = make_patient(&conn, "Sun Li", "Palpitations", 0);
        insert_report(
            &conn,
            &StoredReport {
                id: Uuid::new_v4(),
                patient_id: stored.id,
                content: "Overview".into(),
                model: "deepseek-chat".into(),
                knowledge_titles: vec![],
                created_at: Utc::now(),
            },
        )
        .unwrap();

        delete_patient(&conn, &stored.id).unwrap();
        assert!(get_patient(&conn, &stored.id).unwrap().is_none());
        assert!(list_reports_for_patient(&conn, &stored.id).unwrap().is_empty());

        let again = delete_patient(&conn, &stored.id);
        assert!(matches!(again, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn reports_listed_newest_first() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ma Jun", "Headache", 0);
        let base = Utc::now();
        for (i, content) in ["older", "newer"].iter().enumerate() {
            insert_report(
                &conn,
                &StoredReport {
                    id: Uuid::new_v4(),
                    patient_id: patient.id,
                    content: content.to_string(),
                    model: "deepseek-chat".into(),
                    knowledge_titles: vec!["Liver Yang Rising".into()],
                    created_at: base + Duration::seconds(i as i64),
                },
            )
            .unwrap();
        }

        let reports = list_reports_for_patient(&conn, &patient.id).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].content, "newer");
        assert_eq!(reports[0].knowledge_titles, vec!["Liver Yang Rising"]);
    }

    #[test]
    fn report_for_unknown_patient_is_not_found() {
        let conn = test_db();
        let result = insert_report(
            &conn,
            &StoredReport {
                id: Uuid::new_v4(),
                patient_id: Uuid::new_v4(),
                content: "orphan".into(),
                model: "deepseek-chat".into(),
                knowledge_titles: vec![],
                created_at: Utc::now(),
            },
        );
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { ref entity_type, .. }) if entity_type == "patient"
        ));
    }

    #[test]
    fn audit_entries_recorded() {
        let conn = test_db();
        insert_audit_entry(&conn, "2025-01-01T00:00:00Z", "key:abcd", "GET /api/patients", 200)
            .unwrap();
        insert_audit_entry(&conn, "2025-01-01T00:00:01Z", "key:abcd", "POST /api/reports", 502)
            .unwrap();
        assert_eq!(count_audit_entries(&conn).unwrap(), 2);

        let recent = recent_audit_entries(&conn, 1).unwrap();
        assert_eq!(recent[0].2, "POST /api/reports");
        assert_eq!(recent[0].3, 502);
    }
}
