use tagticket::security::{FACTORY_DEFAULT_KEY, KeyDiversifier, MasterKey, TagKey};
use tagticket::security::diversify::derive;
use tagticket::types::TagUid;

fn uid(last: u8) -> TagUid {
    TagUid::new([0x04, 0xa1, 0xb2, 0xc3, 0xd4, 0xe5, 0xf6, last])
}

#[test]
fn from_seed_is_deterministic() {
    assert_eq!(MasterKey::from_seed(42), MasterKey::from_seed(42));
}

#[test]
fn from_seed_varies_across_seeds() {
    assert_ne!(MasterKey::from_seed(42), MasterKey::from_seed(43));
}

#[test]
fn empty_master_is_rejected() {
    assert!(MasterKey::new(Vec::new()).is_none());
    assert!(MasterKey::new(b"secret".to_vec()).is_some());
}

#[test]
fn tag_key_from_slice_requires_sixteen_bytes() {
    assert!(TagKey::from_slice(&[1; 15]).is_none());
    assert!(TagKey::from_slice(&[1; 17]).is_none());
    assert_eq!(TagKey::from_slice(&[1; 16]), Some(TagKey::new([1; 16])));
}

#[test]
fn factory_key_is_the_published_default() {
    assert_eq!(TagKey::factory_default().as_bytes(), b"BREAKMEIFYOUCAN!");
    assert_eq!(&FACTORY_DEFAULT_KEY, b"BREAKMEIFYOUCAN!");
}

#[test]
fn derive_is_deterministic() {
    let master = MasterKey::from_seed(123);
    assert_eq!(derive(&master, &uid(1)), derive(&master, &uid(1)));
}

#[test]
fn derive_changes_with_uid() {
    let master = MasterKey::from_seed(123);
    assert_ne!(derive(&master, &uid(1)), derive(&master, &uid(2)));
}

#[test]
fn derive_changes_with_master() {
    assert_ne!(
        derive(&MasterKey::from_seed(1), &uid(1)),
        derive(&MasterKey::from_seed(2), &uid(1))
    );
}

#[test]
fn diversifier_matches_free_function() {
    let diversifier = KeyDiversifier::new(MasterKey::from_seed(5));
    assert_eq!(
        diversifier.derive(&uid(9)),
        derive(&MasterKey::from_seed(5), &uid(9))
    );
}

#[test]
fn derive_is_sha256_prefix() {
    use sha2::{Digest, Sha256};

    let master = MasterKey::new(b"master".to_vec()).unwrap();
    let mut hasher = Sha256::new();
    hasher.update(b"master");
    hasher.update(uid(3).as_bytes());
    let digest = hasher.finalize();

    assert_eq!(derive(&master, &uid(3)).as_bytes()[..], digest[..16]);
}

#[test]
fn debug_does_not_leak_full_key_material() {
    let key = TagKey::new([0x5a; 16]);
    let debug = format!("{key:?}");
    assert!(debug.starts_with("TagKey("));
    assert!(debug.contains("..."));
    assert!(debug.len() < 32);

    let master = format!("{:?}", MasterKey::from_seed(7));
    assert_eq!(master, "MasterKey(16 bytes)");
}
