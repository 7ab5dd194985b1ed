use blockrand_core::{
    AgeLevel, AssignmentRecord, BevFreeLevel, DurationLevel, Group, Stratum, RECORD_FIELDS,
};

fn sample_record() -> AssignmentRecord {
    let stratum = Stratum::new(
        AgeLevel::Over75,
        DurationLevel::Under18Months,
        BevFreeLevel::Over2Months,
    );
    AssignmentRecord {
        subject_id: "S-001".into(),
        age_level: stratum.age,
        duration_level: stratum.duration,
        bev_free_level: stratum.bev_free,
        stratum_key: stratum.key(),
        assigned_group: Group::B,
        timestamp: "2024-05-01 09:30:00".into(),
    }
}

#[test]
fn record_json_uses_labels() {
    let value = serde_json::to_value(sample_record()).expect("serialize");
    assert_eq!(value["age_level"], ">=75");
    assert_eq!(value["stratum_key"], ">=75_<18mo_>=2mo");
    assert_eq!(value["assigned_group"], "Group B");
    let keys: Vec<&str> = value
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    for field in RECORD_FIELDS {
        assert!(keys.contains(&field), "missing {field}");
    }
}

#[test]
fn ordered_fields_rebuild_the_record() {
    let record = sample_record();
    let fields = record.to_fields();
    assert_eq!(fields[5], "Group B");
    let rebuilt = AssignmentRecord::from_fields(&fields).expect("rebuild");
    assert_eq!(rebuilt, record);
    assert_eq!(rebuilt.stratum().key(), record.stratum_key);
}

#[test]
fn short_field_list_is_rejected() {
    let fields = vec!["S-001".to_string()];
    let err = AssignmentRecord::from_fields(&fields).expect_err("arity");
    assert_eq!(err.code(), "blockrand.record_arity");
}
