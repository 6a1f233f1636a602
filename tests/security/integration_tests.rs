use tagticket::lab::SimulatedTag;
use tagticket::layout::TicketImage;
use tagticket::security::{KeyRing, MacEngine};
use tagticket::ticket::TicketIssuer;
use tagticket::TicketErrorKind;

use crate::common::lab_context;

fn issued_image(seed: u8) -> (KeyRing, SimulatedTag) {
    let (ctx, _clock) = lab_context(seed);
    let mut tag = SimulatedTag::with_seed(u64::from(seed));
    TicketIssuer::new(&ctx)
        .issue(&mut tag, 30, 5)
        .expect("issue succeeds");
    (KeyRing::for_testing(seed), tag)
}

#[test]
fn issued_records_verify_with_the_tag_key() {
    let (keys, tag) = issued_image(21);
    let engine = MacEngine::new(&keys.mac_key(&tag.uid())).unwrap();
    let image = TicketImage::from_region(&tag.region()).unwrap();

    image
        .static_authenticated()
        .verify(&engine)
        .expect("static MAC verifies");
    image
        .dynamic_authenticated()
        .verify(&engine)
        .expect("dynamic MAC verifies");
}

#[test]
fn issued_records_do_not_verify_under_another_master() {
    let (_, tag) = issued_image(21);
    let stranger = KeyRing::for_testing(22);
    let engine = MacEngine::new(&stranger.mac_key(&tag.uid())).unwrap();
    let image = TicketImage::from_region(&tag.region()).unwrap();

    let err = image
        .static_authenticated()
        .verify(&engine)
        .map(|_| ())
        .unwrap_err();
    assert_eq!(err.kind(), TicketErrorKind::InvalidMac);
}

#[test]
fn tag_never_stores_master_or_mac_key() {
    let (keys, tag) = issued_image(23);
    let mac_key = keys.mac_key(&tag.uid());
    let region = tag.region();
    assert!(
        !region
            .windows(4)
            .any(|w| w == &mac_key.as_bytes()[..4]),
        "MAC key bytes must not appear on the tag"
    );
    assert_eq!(tag.key(), &keys.auth_key(&tag.uid()));
}
