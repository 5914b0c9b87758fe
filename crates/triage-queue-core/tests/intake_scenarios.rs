//! End-to-end intake and dispatch scenarios.

use chrono::NaiveDate;

use triage_queue_core::admin::{AdminOperations, AdminOutcome, Confirmation};
use triage_queue_core::models::{IntakeRequest, PatientRecord, Tier};
use triage_queue_core::queue::IntakeQueue;
use triage_queue_core::QueueConfig;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn birthdate() -> NaiveDate {
    NaiveDate::from_ymd_opt(1955, 8, 9).unwrap()
}

fn admit(queue: &mut IntakeQueue, name: &str, age: u32, emergency: bool) {
    queue
        .admit(IntakeRequest::new(name, age, birthdate(), emergency))
        .unwrap();
}

fn call_all(queue: &mut IntakeQueue) -> Vec<String> {
    let mut called = Vec::new();
    while let Some(patient) = queue.dequeue() {
        called.push(patient.name().to_string());
    }
    called
}

#[test]
fn test_tiers_dispatch_in_priority_order() {
    init_logging();
    let mut queue = IntakeQueue::with_defaults();
    admit(&mut queue, "Amy", 40, true);
    admit(&mut queue, "Bob", 80, false);
    admit(&mut queue, "Cara", 30, false);

    assert_eq!(queue.find_by_exact_name("Bob").unwrap().tier(), Tier::Senior);
    assert_eq!(call_all(&mut queue), vec!["Amy", "Bob", "Cara"]);
    assert!(queue.dequeue().is_none());
}

#[test]
fn test_same_tier_is_first_come_first_served() {
    init_logging();
    let mut queue = IntakeQueue::with_defaults();
    admit(&mut queue, "Dan", 20, false);
    admit(&mut queue, "Eve", 25, false);

    assert_eq!(call_all(&mut queue), vec!["Dan", "Eve"]);
}

#[test]
fn test_clear_by_age_range_removes_only_matches() {
    init_logging();
    let mut queue = IntakeQueue::with_defaults();
    admit(&mut queue, "Forty", 40, false);
    admit(&mut queue, "Eighty", 80, false);
    admit(&mut queue, "EightyFive", 85, false);
    admit(&mut queue, "Thirty", 30, false);

    let removed = queue.clear_by_age_range(70, 90).unwrap();
    assert_eq!(removed, vec!["Eighty", "EightyFive"]);
    assert_eq!(queue.total_count(), 2);
    assert!(queue.find_by_exact_name("Forty").is_some());
    assert!(queue.find_by_exact_name("Thirty").is_some());
}

#[test]
fn test_prebuilt_record_keeps_its_tier() {
    init_logging();
    let mut queue = IntakeQueue::with_defaults();
    let record = PatientRecord::new("Young Senior", 60, birthdate(), Tier::Senior, None).unwrap();
    queue.enqueue(record).unwrap();
    admit(&mut queue, "Regular", 30, false);

    assert_eq!(call_all(&mut queue), vec!["Young Senior", "Regular"]);
}

#[test]
fn test_busy_morning() {
    init_logging();
    let config = QueueConfig::from_toml_str("regular_capacity = 3\ntotal_capacity = 5").unwrap();
    let mut queue = IntakeQueue::new(config);

    admit(&mut queue, "Walk-in 1", 30, false);
    admit(&mut queue, "Walk-in 2", 31, false);
    admit(&mut queue, "Grandma", 88, false);
    admit(&mut queue, "Walk-in 3", 32, false);
    assert!(queue
        .admit(IntakeRequest::new("Walk-in 4", 33, birthdate(), false))
        .is_err());

    admit(&mut queue, "Crash", 45, true);
    // Total of 5 reached even though senior and emergency have room
    assert!(queue
        .admit(IntakeRequest::new("Grandpa", 90, birthdate(), false))
        .is_err());

    queue.add_note("crash", "BP 90/60").unwrap();
    queue.reassign_tier("Walk-in 3", Tier::Emergency).unwrap();

    let first = queue.dequeue().unwrap();
    assert_eq!(first.name(), "Walk-in 3");
    assert_eq!(first.latest_note(), "Type changed from Regular to Emergency");

    let second = queue.dequeue().unwrap();
    assert_eq!(second.name(), "Crash");
    assert_eq!(second.latest_note(), "BP 90/60");

    let stats = queue.stats();
    assert_eq!(stats.total_today, 5);
    assert_eq!(stats.emergencies_today, 1);
    assert_eq!(stats.dispatched_today, 2);
    assert_eq!(stats.waiting, 3);

    let mut admin = AdminOperations::new(&mut queue);
    let plan = admin.plan_clear_tier(Tier::Regular);
    assert_eq!(plan.affected(), ["Walk-in 1", "Walk-in 2"]);
    let outcome = admin
        .execute(plan, Confirmation::parse("CONFIRM").unwrap())
        .unwrap();
    assert_eq!(
        outcome,
        AdminOutcome::Cleared(vec!["Walk-in 1".into(), "Walk-in 2".into()])
    );

    assert_eq!(call_all(&mut queue), vec!["Grandma"]);
    assert_eq!(queue.stats().total_today, 5);
}
