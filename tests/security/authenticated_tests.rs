use tagticket::layout::{DynamicTicketRecord, Label, StaticTicketRecord};
use tagticket::security::{AuthenticatedRecord, MacEngine, MacTag, TagKey};
use tagticket::types::UnixTime;

fn record() -> StaticTicketRecord {
    StaticTicketRecord {
        app_tag: Label::from_text("BpAl").unwrap(),
        version: Label::from_text("v1.0").unwrap(),
        counter_state: 0,
        ticket_count: 2,
        valid_for_days: 7,
    }
}

fn engine() -> MacEngine {
    MacEngine::new(&TagKey::new([9; 16])).unwrap()
}

#[test]
fn sign_marks_verified() {
    let auth = AuthenticatedRecord::sign(&engine(), record());
    assert!(auth.is_verified());
    assert_eq!(auth.record(), &record());
}

#[test]
fn from_parts_starts_unverified() {
    let auth = AuthenticatedRecord::from_parts(record(), MacTag::zero());
    assert!(!auth.is_verified());
}

#[test]
fn try_into_verified_requires_verification() {
    let (rec, tag) = AuthenticatedRecord::sign(&engine(), record()).into_parts();
    let unverified = AuthenticatedRecord::from_parts(rec, tag);
    let mut unverified = unverified.try_into_verified().unwrap_err();

    unverified.verify(&engine()).unwrap();
    assert_eq!(unverified.try_into_verified().unwrap(), record());
}

#[test]
fn into_parts_returns_signed_tag() {
    let engine = engine();
    let (rec, tag) = AuthenticatedRecord::sign(&engine, record()).into_parts();
    assert_eq!(rec, record());
    assert_eq!(tag, MacTag::compute(&engine, &record().to_bytes()));
}

#[test]
fn cleared_dynamic_record_signs_to_a_present_tag() {
    let auth = AuthenticatedRecord::sign(&engine(), DynamicTicketRecord::CLEARED);
    assert!(!auth.tag().is_empty());

    let started = DynamicTicketRecord {
        first_use: Some(UnixTime::from_secs(5)),
        last_use: None,
    };
    let other = AuthenticatedRecord::sign(&engine(), started);
    assert_ne!(auth.tag(), other.tag());
}
