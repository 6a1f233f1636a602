//! Multi-tap scenarios, including taps torn mid-write and retried.

use crate::common::{T0, blank_tag, lab_context};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tagticket::lab::SimulatedTag;
use tagticket::layout::{Field, TicketImage};
use tagticket::ticket::{
    AdminOutcome, IssueOutcome, TicketContext, TicketIssuer, TicketValidator, format_card,
    protect_memory,
};
use tagticket::types::UnixTime;
use tagticket::TicketErrorKind;

fn issued(ctx: &TicketContext, seed: u64, days: u32, uses: u32) -> SimulatedTag {
    let mut tag = blank_tag(seed);
    TicketIssuer::new(ctx).issue(&mut tag, days, uses).unwrap();
    tag.clear_write_log();
    tag
}

fn image(tag: &SimulatedTag) -> TicketImage {
    TicketImage::from_region(&tag.region()).unwrap()
}

#[test]
fn use_torn_before_the_increment_costs_nothing() {
    let (ctx, clock) = lab_context(60);
    let mut tag = issued(&ctx, 1, 30, 5);
    let validator = TicketValidator::new(&ctx);

    tag.remove_after_writes(1);
    let err = validator.use_ticket(&mut tag).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::WriteFailure);
    assert_eq!(tag.counter(), 0);
    assert_eq!(image(&tag).dynamic.first_use, Some(UnixTime::from_secs(T0)));

    tag.clear_faults();
    clock.advance(Duration::from_secs(2));
    let validated = validator.use_ticket(&mut tag).unwrap();
    assert!(validated.first_use, "still the first use");
    assert_eq!(validated.remaining, 4);
    assert_eq!(
        validated.expires_at,
        UnixTime::from_secs(T0 + 2).add_days(30)
    );
}

#[test]
fn use_torn_after_the_increment_is_spent() {
    let (ctx, clock) = lab_context(61);
    let mut tag = issued(&ctx, 2, 30, 5);
    let validator = TicketValidator::new(&ctx);

    tag.remove_after_writes(2);
    let validated = validator.use_ticket(&mut tag).unwrap();
    assert!(!validated.bookkeeping_written);
    assert_eq!(validated.remaining, 4);
    assert!(image(&tag).usage_log.recent().is_empty());

    tag.clear_faults();
    clock.advance(Duration::from_secs(60));
    assert_eq!(validator.use_ticket(&mut tag).unwrap().remaining, 3);
}

#[test]
fn lost_last_use_write_keeps_the_ticket_valid() {
    let (ctx, clock) = lab_context(62);
    let mut tag = issued(&ctx, 3, 30, 5);
    let validator = TicketValidator::new(&ctx);
    validator.use_ticket(&mut tag).unwrap();
    clock.advance(Duration::from_secs(60));

    tag.fail_writes_to(Field::LastUse.page());
    let validated = validator.use_ticket(&mut tag).unwrap();
    assert!(!validated.bookkeeping_written);
    assert_eq!(validated.remaining, 3);
    assert_eq!(image(&tag).dynamic.last_use, Some(UnixTime::from_secs(T0)));

    // A stale last use only loosens the next cooldown check.
    tag.clear_faults();
    clock.advance(Duration::from_secs(1));
    assert_eq!(validator.use_ticket(&mut tag).unwrap().remaining, 2);
}

#[test]
fn torn_reissue_retried_grants_the_request_once() {
    let (ctx, clock) = lab_context(63);
    let mut tag = issued(&ctx, 4, 1, 2);
    let validator = TicketValidator::new(&ctx);
    validator.use_ticket(&mut tag).unwrap();
    clock.advance_days(2);

    tag.fail_writes_to(Field::FirstUse.page());
    let err = TicketIssuer::new(&ctx).issue(&mut tag, 10, 3).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::WriteFailure);
    let torn = image(&tag);
    assert_eq!(torn.static_record.ticket_count, 2, "nothing landed");
    assert_eq!(torn.dynamic.first_use, Some(UnixTime::from_secs(T0)));

    tag.clear_faults();
    let outcome = TicketIssuer::new(&ctx).issue(&mut tag, 10, 3).unwrap();
    assert_eq!(
        outcome,
        IssueOutcome::Issued {
            uses: 3,
            valid_for_days: 10
        }
    );
    assert_eq!(image(&tag).remaining_uses(), 3);

    let validated = validator.use_ticket(&mut tag).unwrap();
    assert!(validated.first_use);
    assert_eq!(validated.remaining, 2);
}

#[test]
fn torn_top_up_retried_grants_the_request_once() {
    let (ctx, clock) = lab_context(64);
    let mut tag = issued(&ctx, 5, 10, 2);
    let validator = TicketValidator::new(&ctx);
    validator.use_ticket(&mut tag).unwrap();
    clock.advance_days(1);

    tag.fail_writes_to(Field::FirstUse.page());
    let err = TicketIssuer::new(&ctx).issue(&mut tag, 10, 2).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::WriteFailure);
    let torn = image(&tag);
    assert_eq!(torn.remaining_uses(), 1);
    assert_eq!(torn.static_record.valid_for_days, 10);
    assert_eq!(torn.dynamic.first_use, Some(UnixTime::from_secs(T0)));

    tag.clear_faults();
    let outcome = TicketIssuer::new(&ctx).issue(&mut tag, 10, 2).unwrap();
    assert_eq!(
        outcome,
        IssueOutcome::ToppedUp {
            added: 2,
            previous_remaining: 1,
            remaining: 3,
            valid_for_days: 20,
        }
    );
    assert_eq!(image(&tag).remaining_uses(), 3);

    let validated = validator.use_ticket(&mut tag).unwrap();
    assert!(validated.first_use, "the top-up restarted the window");
    assert_eq!(validated.remaining, 2);
    assert_eq!(validated.expires_at, ctx.now().add_days(20));
}

#[test]
fn top_up_removed_mid_tap_changes_nothing() {
    let (ctx, _) = lab_context(68);
    let mut tag = issued(&ctx, 9, 30, 4);
    let before = tag.region();

    tag.remove_after_writes(0);
    let err = TicketIssuer::new(&ctx).issue(&mut tag, 30, 2).unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::WriteFailure);
    assert_eq!(tag.region(), before);

    tag.clear_faults();
    assert_eq!(
        TicketIssuer::new(&ctx).issue(&mut tag, 30, 2).unwrap().remaining(),
        6
    );
}

#[test]
fn formatted_card_can_be_issued_again() {
    let (ctx, clock) = lab_context(65);
    let mut tag = issued(&ctx, 6, 30, 5);
    let validator = TicketValidator::new(&ctx);
    validator.use_ticket(&mut tag).unwrap();
    clock.advance(Duration::from_secs(60));

    assert_eq!(format_card(&ctx, &mut tag), Ok(AdminOutcome::Formatted));
    let blank = image(&tag);
    assert!(blank.static_record.app_tag.is_blank());
    assert_eq!(blank.dynamic.first_use, None);
    assert_eq!(tag.counter(), 1, "formatting never touches the counter");
    assert_eq!(
        validator.use_ticket(&mut tag).unwrap_err().kind(),
        TicketErrorKind::InvalidAppTag
    );

    let outcome = TicketIssuer::new(&ctx).issue(&mut tag, 30, 2).unwrap();
    assert!(matches!(outcome, IssueOutcome::Issued { uses: 2, .. }));
    assert_eq!(image(&tag).static_record.counter_state, 1);
    assert_eq!(validator.use_ticket(&mut tag).unwrap().remaining, 1);
}

#[test]
fn protect_memory_is_idempotent() {
    let (ctx, _) = lab_context(66);
    let mut tag = blank_tag(7);

    assert_eq!(protect_memory(&ctx, &mut tag), Ok(AdminOutcome::Protected));
    tag.clear_faults();
    assert_eq!(
        protect_memory(&ctx, &mut tag),
        Ok(AdminOutcome::AlreadyProtected)
    );

    let mut ticket = issued(&ctx, 8, 30, 1);
    assert_eq!(
        protect_memory(&ctx, &mut ticket),
        Ok(AdminOutcome::AlreadyProtected)
    );
    assert_eq!(ticket.write_count(), 0);
}

#[test]
fn one_context_serves_many_tags() {
    let (ctx, clock) = lab_context(67);
    let issuer = TicketIssuer::new(&ctx);
    let validator = TicketValidator::new(&ctx);
    let mut tags: Vec<_> = (10..14).map(blank_tag).collect();

    for (i, tag) in tags.iter_mut().enumerate() {
        issuer.issue(tag, 30, i as u32 + 1).unwrap();
    }
    for tag in &mut tags {
        validator.use_ticket(tag).unwrap();
    }
    clock.advance(Duration::from_secs(60));
    for tag in &mut tags {
        let _ = validator.use_ticket(tag);
    }

    let remaining: Vec<_> = tags.iter().map(|t| image(t).remaining_uses()).collect();
    assert_eq!(remaining, vec![0, 0, 1, 2]);

    // A record copied onto another tag is bound to the wrong UID.
    let stolen = tags[3].region();
    for page in 0..14u8 {
        let at = usize::from(page) * 4;
        tags[0].set_page(26 + page, stolen[at..at + 4].try_into().unwrap());
    }
    let err = validator.use_ticket(&mut tags[0]).unwrap_err();
    assert!(err.is_integrity_failure());

    let stats = ctx.stats();
    assert_eq!(stats.issued.load(Ordering::Relaxed), 4);
    assert_eq!(stats.validated.load(Ordering::Relaxed), 7);
    assert_eq!(stats.rejected.load(Ordering::Relaxed), 2);
    assert_eq!(stats.integrity_failures.load(Ordering::Relaxed), 1);
}
