use crate::common::{blank_tag, lab_context, lab_context_with};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tagticket::layout::{
    AUTH0_PAGE, AUTH1_PAGE, DynamicTicketRecord, Field, Label, TICKET_START_PAGE, TicketImage,
};
use tagticket::ticket::{IssueOutcome, TicketIssuer, TicketValidator};
use tagticket::{TicketConfig, TicketErrorKind};

fn image(tag: &tagticket::lab::SimulatedTag) -> TicketImage {
    TicketImage::from_region(&tag.region()).unwrap()
}

#[test]
fn issue_on_blank_tag_claims_protects_and_writes() {
    let (ctx, _) = lab_context(10);
    let mut tag = blank_tag(1);

    TicketIssuer::new(&ctx).issue(&mut tag, 30, 5).unwrap();

    assert_eq!(tag.key(), &ctx.keys().auth_key(&tag.uid()));
    assert_eq!(tag.page(AUTH0_PAGE)[0], TICKET_START_PAGE);
    assert_eq!(tag.page(AUTH1_PAGE)[0] & 1, 0);
    let image = image(&tag);
    assert_eq!(image.static_record.app_tag.text(), Some("BpAl"));
    assert_eq!(image.static_record.version.text(), Some("v1.0"));
    assert_eq!(image.static_record.ticket_count, 5);
    assert_eq!(image.static_record.valid_for_days, 30);
    assert_eq!(image.remaining_uses(), 5);
}

#[test]
fn top_up_adds_exactly_the_requested_uses() {
    let (ctx, clock) = lab_context(11);
    let mut tag = blank_tag(2);
    let issuer = TicketIssuer::new(&ctx);
    issuer.issue(&mut tag, 30, 5).unwrap();
    TicketValidator::new(&ctx).use_ticket(&mut tag).unwrap();
    clock.advance(Duration::from_secs(3_600));

    let before = image(&tag);
    let outcome = issuer.issue(&mut tag, 10, 4).unwrap();
    let after = image(&tag);

    assert_eq!(
        outcome,
        IssueOutcome::ToppedUp {
            added: 4,
            previous_remaining: 4,
            remaining: 8,
            valid_for_days: 40,
        }
    );
    assert_eq!(
        after.static_record.ticket_count,
        before.static_record.ticket_count + 4
    );
    assert_eq!(
        after.static_record.counter_state,
        before.static_record.counter_state
    );
    assert!(after.static_record.valid_for_days >= before.static_record.valid_for_days);
    assert_eq!(after.remaining_uses(), 8);
}

#[test]
fn top_up_restarts_a_started_window() {
    let (ctx, clock) = lab_context(12);
    let mut tag = blank_tag(3);
    let issuer = TicketIssuer::new(&ctx);
    issuer.issue(&mut tag, 30, 5).unwrap();
    TicketValidator::new(&ctx).use_ticket(&mut tag).unwrap();
    clock.advance_days(3);

    issuer.issue(&mut tag, 30, 1).unwrap();
    assert_eq!(image(&tag).dynamic, DynamicTicketRecord::CLEARED);

    let validated = TicketValidator::new(&ctx).use_ticket(&mut tag).unwrap();
    assert!(validated.first_use, "next use starts a new window");
    assert_eq!(validated.expires_at, ctx.now().add_days(60));
}

#[test]
fn top_up_of_unused_ticket_leaves_dynamic_pages_alone() {
    let (ctx, _) = lab_context(13);
    let mut tag = blank_tag(4);
    let issuer = TicketIssuer::new(&ctx);
    issuer.issue(&mut tag, 30, 5).unwrap();
    tag.clear_write_log();

    issuer.issue(&mut tag, 30, 5).unwrap();
    let writes: Vec<_> = tag.writes().iter().map(|w| (w.start, w.count)).collect();
    assert_eq!(writes, vec![(Field::TicketCount.page(), 3)]);
}

#[test]
fn top_up_of_started_ticket_is_one_write() {
    let (ctx, clock) = lab_context(26);
    let mut tag = blank_tag(16);
    let issuer = TicketIssuer::new(&ctx);
    issuer.issue(&mut tag, 30, 5).unwrap();
    TicketValidator::new(&ctx).use_ticket(&mut tag).unwrap();
    clock.advance(Duration::from_secs(60));
    tag.clear_write_log();

    issuer.issue(&mut tag, 30, 5).unwrap();
    let writes: Vec<_> = tag.writes().iter().map(|w| (w.start, w.count)).collect();
    assert_eq!(writes, vec![(Field::TicketCount.page(), 6)]);
}

#[test]
fn validity_never_shrinks_and_stays_clamped() {
    let config = TicketConfig::default().with_max_valid_days(45);
    let (ctx, _) = lab_context_with(14, config);
    let mut tag = blank_tag(5);
    let issuer = TicketIssuer::new(&ctx);

    assert_eq!(issuer.issue(&mut tag, 40, 1).unwrap().valid_for_days(), 40);
    assert_eq!(issuer.issue(&mut tag, 40, 1).unwrap().valid_for_days(), 45);
    assert_eq!(issuer.issue(&mut tag, 1, 1).unwrap().valid_for_days(), 45);
}

#[test]
fn lowered_ceiling_never_shrinks_an_existing_window() {
    let (wide, _) = lab_context(15);
    let mut tag = blank_tag(6);
    TicketIssuer::new(&wide).issue(&mut tag, 80, 1).unwrap();

    let (narrow, _) = lab_context_with(15, TicketConfig::default().with_max_valid_days(30));
    let outcome = TicketIssuer::new(&narrow).issue(&mut tag, 5, 1).unwrap();
    assert_eq!(outcome.valid_for_days(), 80);
}

#[test]
fn safety_ceiling_applies_to_the_sum() {
    let config = TicketConfig::default().with_max_remaining_tickets(10);
    let (ctx, _) = lab_context_with(16, config);
    let mut tag = blank_tag(7);
    let issuer = TicketIssuer::new(&ctx);

    assert_eq!(
        issuer.issue(&mut tag, 30, 11).unwrap_err().kind(),
        TicketErrorKind::UnsafeTicketLimitExceeded
    );
    issuer.issue(&mut tag, 30, 6).unwrap();
    let before = tag.region();
    assert_eq!(
        issuer.issue(&mut tag, 30, 5).unwrap_err().kind(),
        TicketErrorKind::UnsafeTicketLimitExceeded
    );
    assert_eq!(tag.region(), before);
    assert_eq!(issuer.issue(&mut tag, 30, 4).unwrap().remaining(), 10);
}

#[test]
fn corrupted_static_record_blocks_top_up() {
    let (ctx, _) = lab_context(17);
    let mut tag = blank_tag(8);
    let issuer = TicketIssuer::new(&ctx);
    issuer.issue(&mut tag, 30, 5).unwrap();

    tag.corrupt_region_byte(Field::TicketCount.offset() + 3);
    let before = tag.region();
    let err = issuer.issue(&mut tag, 30, 1).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::InvalidMac);
    assert_eq!(tag.region(), before, "no write after an integrity failure");
    assert_eq!(ctx.stats().integrity_failures.load(Ordering::Relaxed), 1);
}

#[test]
fn erased_static_mac_is_empty_mac() {
    let (ctx, _) = lab_context(18);
    let mut tag = blank_tag(9);
    let issuer = TicketIssuer::new(&ctx);
    issuer.issue(&mut tag, 30, 5).unwrap();

    tag.set_page(Field::StaticMac.page(), [0; 4]);
    assert_eq!(
        issuer.issue(&mut tag, 30, 1).unwrap_err().kind(),
        TicketErrorKind::EmptyMac
    );
}

#[test]
fn ticket_issued_under_another_key_ring_is_rejected() {
    let (ctx, _) = lab_context(19);
    let mut tag = blank_tag(10);
    TicketIssuer::new(&ctx).issue(&mut tag, 30, 5).unwrap();

    let (other, _) = lab_context(20);
    let err = TicketIssuer::new(&other).issue(&mut tag, 30, 1).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::AuthenticationFailure);
}

#[test]
fn foreign_application_is_never_overwritten() {
    let (ctx, _) = lab_context(21);
    let mut tag = blank_tag(11);
    tag.set_page(Field::AppTag.page(), *b"Xmpl");

    let err = TicketIssuer::new(&ctx).issue(&mut tag, 30, 5).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::InvalidAppTag);
    assert_eq!(tag.page(Field::AppTag.page()), *b"Xmpl");
    assert!(
        !tag.writes().iter().any(|w| w.touches(AUTH0_PAGE) || w.touches(AUTH1_PAGE)),
        "access configuration untouched: {:?}",
        tag.writes()
    );
    assert_eq!(tag.page(AUTH0_PAGE), blank_tag(11).page(AUTH0_PAGE));
}

#[test]
fn unreadable_app_tag_is_foreign_not_blank() {
    let (ctx, _) = lab_context(22);
    let mut tag = blank_tag(12);
    tag.set_page(Field::AppTag.page(), [0xff, 0x00, 0x13, 0x37]);
    let before = tag.region();

    let err = TicketIssuer::new(&ctx).issue(&mut tag, 30, 5).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::InvalidAppTag);
    assert_eq!(tag.region(), before);
}

#[test]
fn live_ticket_with_a_flipped_app_tag_bit_is_not_replaced() {
    let (ctx, _) = lab_context(25);
    let mut tag = blank_tag(15);
    let issuer = TicketIssuer::new(&ctx);
    issuer.issue(&mut tag, 30, 5).unwrap();

    tag.corrupt_region_byte(Field::AppTag.offset());
    let before = tag.region();
    let err = issuer.issue(&mut tag, 30, 5).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::InvalidAppTag);
    assert_eq!(tag.region(), before, "the damaged ticket is kept for inspection");
}

#[test]
fn other_version_is_rejected() {
    let (ctx, _) = lab_context(23);
    let mut tag = blank_tag(13);
    TicketIssuer::new(&ctx).issue(&mut tag, 30, 5).unwrap();

    let next = TicketConfig::default().with_version(Label::from_text("v2.0").unwrap());
    let (upgraded, _) = lab_context_with(23, next);
    let err = TicketIssuer::new(&upgraded).issue(&mut tag, 30, 5).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::InvalidVersion);
}

#[test]
fn spent_ticket_is_reissued_with_current_counter() {
    let (ctx, clock) = lab_context(24);
    let mut tag = blank_tag(14);
    let issuer = TicketIssuer::new(&ctx);
    issuer.issue(&mut tag, 30, 2).unwrap();
    let validator = TicketValidator::new(&ctx);
    validator.use_ticket(&mut tag).unwrap();
    clock.advance(Duration::from_secs(60));
    validator.use_ticket(&mut tag).unwrap();

    let outcome = issuer.issue(&mut tag, 30, 3).unwrap();
    assert!(matches!(outcome, IssueOutcome::Issued { uses: 3, .. }));
    let image = image(&tag);
    assert_eq!(image.static_record.counter_state, 2);
    assert_eq!(image.remaining_uses(), 3);
    assert!(image.usage_log.recent().is_empty());
}
