//! Thread-safe service (FFI surface) tests.

use std::sync::Arc;
use std::thread;

use triage_queue_core::{open_queue, open_queue_with_config, FfiTier, TriageQueueError};

#[test]
fn test_admit_and_dequeue() {
    let service = open_queue();
    service
        .admit("Cara".into(), 30, "1994-02-11".into(), false, None)
        .unwrap();
    let amy = service
        .admit("Amy".into(), 40, "1984-07-30".into(), true, Some("fall".into()))
        .unwrap();
    assert_eq!(amy.tier, FfiTier::Emergency);
    assert_eq!(amy.latest_note, "fall");

    assert_eq!(service.peek_next().unwrap().unwrap().name, "Amy");
    assert_eq!(service.dequeue().unwrap().unwrap().name, "Amy");
    assert_eq!(service.dequeue().unwrap().unwrap().name, "Cara");
    assert!(service.dequeue().unwrap().is_none());
}

#[test]
fn test_bad_birthdate_string() {
    let service = open_queue();
    let err = service
        .admit("Ann".into(), 30, "11/02/1994".into(), false, None)
        .unwrap_err();
    assert!(matches!(err, TriageQueueError::InvalidInput(_)));
    assert_eq!(service.total_count().unwrap(), 0);
}

#[test]
fn test_error_mapping() {
    let service = open_queue_with_config("emergency_capacity = 1".into()).unwrap();
    service
        .admit("A".into(), 30, "1994-02-11".into(), true, None)
        .unwrap();

    let err = service
        .admit("B".into(), 30, "1994-02-11".into(), true, None)
        .unwrap_err();
    assert!(matches!(err, TriageQueueError::CapacityExceeded(_)));

    let err = service.reassign_tier("Nobody".into(), FfiTier::Regular).unwrap_err();
    assert!(matches!(err, TriageQueueError::NotFound(_)));

    let err = service.reassign_tier("A".into(), FfiTier::Senior).unwrap_err();
    assert!(matches!(err, TriageQueueError::InvalidInput(_)));

    let err = service.clear_by_age_range(9, 1).unwrap_err();
    assert!(matches!(err, TriageQueueError::InvalidInput(_)));

    assert!(matches!(
        open_queue_with_config("total_capacity = 0".into()),
        Err(TriageQueueError::ConfigError(_))
    ));
}

#[test]
fn test_edits_and_stats() {
    let service = open_queue();
    service
        .admit("Ed".into(), 70, "1954-03-03".into(), false, None)
        .unwrap();

    assert_eq!(service.update_age("Ed".into(), 76).unwrap(), Some(FfiTier::Senior));
    assert!(service.reassign_tier("Ed".into(), FfiTier::Senior).unwrap());
    assert!(!service.reassign_tier("Ed".into(), FfiTier::Senior).unwrap());

    service.rename_patient("Ed".into(), "Edward".into()).unwrap();
    service.update_birthdate("Edward".into(), "1948-03-03".into()).unwrap();
    let ed = service.find_patient("edward".into()).unwrap().unwrap();
    assert_eq!(ed.birthdate, "1948-03-03");
    assert_eq!(ed.note_history.lines().count(), 4);

    let stats = service.get_stats().unwrap();
    assert_eq!(stats.senior_waiting, 1);
    assert_eq!(stats.average_age, Some(76.0));
    assert_eq!(stats.senior_percent, Some(100.0));

    let capacity = service.capacity_report().unwrap();
    assert_eq!(capacity.len(), 4);
    assert!(capacity.last().unwrap().tier.is_none());
    assert_eq!(capacity.last().unwrap().max, 50);
}

#[test]
fn test_snapshot_export() {
    let service = open_queue();
    service
        .admit("Amy".into(), 40, "1984-07-30".into(), true, None)
        .unwrap();
    let json = service.export_snapshot_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["next_patient"], "Amy");
}

#[test]
fn test_concurrent_admissions_respect_capacity() {
    let service = open_queue();
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let mut admitted = 0;
                for i in 0..10 {
                    if service
                        .admit(format!("T{}-{}", t, i), 30, "1994-02-11".into(), false, None)
                        .is_ok()
                    {
                        admitted += 1;
                    }
                }
                admitted
            })
        })
        .collect();

    let admitted: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, 25);
    assert_eq!(service.count_by_tier(FfiTier::Regular).unwrap(), 25);
    assert_eq!(service.get_stats().unwrap().total_today, 25);
}
