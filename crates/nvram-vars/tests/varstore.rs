use nvram_core::{Attributes, NvramError, HEADER_SIZE};
use nvram_hal::VariableCodec;
use nvram_vars::{Guid, VarStore, MAX_NAME_LEN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NV_BS: Attributes = Attributes::NON_VOLATILE.union(Attributes::BOOTSERVICE_ACCESS);
const VENDOR: Guid = Guid([0x11; 16]);

#[test]
fn test_set_get_remove() {
    let mut store = VarStore::new();
    store.set(Guid::GLOBAL, "Timeout", NV_BS, &[5, 0]).unwrap();
    store.set(VENDOR, "Timeout", Attributes::BOOTSERVICE_ACCESS, &[9]).unwrap();
    assert_eq!(store.len(), 2);

    // Same name, different vendor
    assert_eq!(store.get(Guid::GLOBAL, "Timeout").unwrap().data, vec![5, 0]);
    assert_eq!(store.get(VENDOR, "Timeout").unwrap().data, vec![9]);

    // Empty data deletes
    store.set(VENDOR, "Timeout", Attributes::BOOTSERVICE_ACCESS, &[]).unwrap();
    assert!(store.get(VENDOR, "Timeout").is_none());
    assert_eq!(store.set(VENDOR, "Timeout", NV_BS, &[]), Err(NvramError::NotFound));

    let removed = store.remove(Guid::GLOBAL, "Timeout").unwrap();
    assert_eq!(removed.attributes, NV_BS);
    assert!(store.is_empty());
    assert_eq!(store.remove(Guid::GLOBAL, "Timeout").unwrap_err(), NvramError::NotFound);
}

#[test]
fn test_set_rejects_bad_input() {
    let mut store = VarStore::new();
    assert_eq!(store.set(VENDOR, "", NV_BS, &[1]), Err(NvramError::InvalidParameter));
    let long = "x".repeat(MAX_NAME_LEN + 1);
    assert_eq!(store.set(VENDOR, &long, NV_BS, &[1]), Err(NvramError::InvalidParameter));
    assert!(store.is_empty());
}

#[test]
fn test_collect_filters_volatile() {
    let mut store = VarStore::new();
    store.set(Guid::GLOBAL, "BootOrder", NV_BS, &[0, 0, 1, 0]).unwrap();
    store.set(Guid::GLOBAL, "ConIn", Attributes::BOOTSERVICE_ACCESS, &[7; 12]).unwrap();

    let image = store.collect(Attributes::NON_VOLATILE).unwrap();
    assert_eq!(image.declared_length(), Some(image.len()));
    assert!(image.len() > HEADER_SIZE);

    let mut fresh = VarStore::new();
    fresh.restore(&image, false).unwrap();
    assert_eq!(fresh.len(), 1);
    assert!(fresh.get(Guid::GLOBAL, "BootOrder").is_some());
    assert!(fresh.get(Guid::GLOBAL, "ConIn").is_none());
}

#[test]
fn test_restore_respects_force() {
    let mut saved = VarStore::new();
    saved.set(Guid::GLOBAL, "Lang", NV_BS, b"fra").unwrap();
    saved.set(Guid::GLOBAL, "Timeout", NV_BS, &[3, 0]).unwrap();
    let image = saved.collect(Attributes::NON_VOLATILE).unwrap();

    // Value set before load wins without force
    let mut live = VarStore::new();
    live.set(Guid::GLOBAL, "Lang", NV_BS, b"eng").unwrap();
    live.restore(&image, false).unwrap();
    assert_eq!(live.get(Guid::GLOBAL, "Lang").unwrap().data, b"eng".to_vec());
    assert_eq!(live.get(Guid::GLOBAL, "Timeout").unwrap().data, vec![3, 0]);

    live.restore(&image, true).unwrap();
    assert_eq!(live.get(Guid::GLOBAL, "Lang").unwrap().data, b"fra".to_vec());
}

#[test]
fn test_failed_restore_leaves_store_untouched() {
    let mut saved = VarStore::new();
    saved.set(Guid::GLOBAL, "A", NV_BS, &[1]).unwrap();
    saved.set(Guid::GLOBAL, "B", NV_BS, &[2]).unwrap();
    let image = saved.collect(Attributes::NON_VOLATILE).unwrap();

    let mut corrupt = image.to_vec();
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0xFF;

    let mut live = VarStore::new();
    live.set(VENDOR, "Keep", NV_BS, &[42]).unwrap();
    let before = live.clone();

    assert_eq!(live.restore(&corrupt, true), Err(NvramError::FormatInvalid));
    assert_eq!(live, before);
}

#[test]
fn test_randomized_roundtrip() {
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..20 {
        let mut store = VarStore::new();
        for i in 0..rng.gen_range(0..40) {
            let name = format!("Var{:04X}", i);
            let len = rng.gen_range(1..200);
            let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            let attrs = if rng.gen_bool(0.7) { NV_BS } else { Attributes::BOOTSERVICE_ACCESS };
            let vendor = if rng.gen_bool(0.5) { Guid::GLOBAL } else { VENDOR };
            store.set(vendor, &name, attrs, &data).unwrap();
        }

        let image = store.collect(Attributes::NON_VOLATILE).unwrap();
        let mut restored = VarStore::new();
        restored.restore(&image, false).unwrap();

        let expected: Vec<_> = store.filtered(Attributes::NON_VOLATILE).collect();
        let actual: Vec<_> = restored.iter().collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_guid_display() {
    assert_eq!(Guid::GLOBAL.to_string(), "8be4df61-93ca-11d2-aa0d-00e098032b8c");
}
