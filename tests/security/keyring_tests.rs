use tagticket::security::{KeyRing, MasterKey, TagKey};
use tagticket::types::TagUid;

fn uid() -> TagUid {
    TagUid::new([0x04, 1, 2, 3, 4, 5, 6, 7])
}

#[test]
fn mac_and_auth_keys_are_independent() {
    let keys = KeyRing::for_testing(1);
    assert_ne!(keys.mac_key(&uid()), keys.auth_key(&uid()));
}

#[test]
fn keys_are_per_tag() {
    let keys = KeyRing::for_testing(1);
    let other = TagUid::new([0x04, 1, 2, 3, 4, 5, 6, 8]);
    assert_ne!(keys.auth_key(&uid()), keys.auth_key(&other));
    assert_ne!(keys.mac_key(&uid()), keys.mac_key(&other));
}

#[test]
fn same_masters_give_same_keys() {
    let a = KeyRing::new(MasterKey::from_seed(3), MasterKey::from_seed(4));
    let b = KeyRing::new(MasterKey::from_seed(3), MasterKey::from_seed(4));
    assert_eq!(a.mac_key(&uid()), b.mac_key(&uid()));
    assert_eq!(a.auth_key(&uid()), b.auth_key(&uid()));
}

#[test]
fn factory_key_defaults_and_overrides() {
    let keys = KeyRing::for_testing(1);
    assert_eq!(keys.factory_key(), &TagKey::factory_default());

    let custom = keys.with_factory_key(TagKey::new([0x11; 16]));
    assert_eq!(custom.factory_key(), &TagKey::new([0x11; 16]));
}

#[test]
fn operational_key_never_equals_factory_key() {
    let keys = KeyRing::for_testing(9);
    assert_ne!(&keys.auth_key(&uid()), keys.factory_key());
}
