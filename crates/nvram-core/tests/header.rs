use nvram_core::{declared_length, Attributes, NvramError, Outcome, StoreHeader, HEADER_SIZE, STORE_MAGIC};

#[test]
fn test_header_layout_is_little_endian() {
    let hdr = StoreHeader::new(0x0102_0304, 0xAABB_CCDD);
    let mut buf = [0u8; HEADER_SIZE];
    hdr.to_bytes(&mut buf).unwrap();

    // declared_length leads the header
    assert_eq!(&buf[0..4], &[0x04, 0x03, 0x02, 0x01]);
    assert_eq!(&buf[4..8], &STORE_MAGIC.to_le_bytes());
    assert_eq!(declared_length(&buf), Some(0x0102_0304));
    assert_eq!(StoreHeader::from_bytes(&buf).unwrap(), hdr);
}

#[test]
fn test_header_rejects_short_input() {
    assert_eq!(StoreHeader::from_bytes(&[0u8; 15]), Err(NvramError::FormatInvalid));
    assert_eq!(declared_length(&[1, 2, 3]), None);

    let mut small = [0u8; 8];
    assert!(StoreHeader::new(16, 0).to_bytes(&mut small).is_err());
}

#[test]
fn test_attribute_filter() {
    let nv_bs = Attributes::NON_VOLATILE | Attributes::BOOTSERVICE_ACCESS;
    assert!(nv_bs.contains(Attributes::NON_VOLATILE));
    assert!(!Attributes::BOOTSERVICE_ACCESS.contains(Attributes::NON_VOLATILE));
    assert!(nv_bs.contains(Attributes::NONE));
    assert_eq!(Attributes::from_bits(0x8), None);
    assert_eq!(Attributes::from_bits(0x7).map(|a| a.bits()), Some(0x7));
}

#[test]
fn test_outcome_mapping() {
    // Save surfaces everything
    assert_eq!(NvramError::MediumIo.save_outcome(), Outcome::Fatal);
    assert_eq!(NvramError::DeviceUnavailable.save_outcome(), Outcome::Fatal);

    // Load absorbs everything except an unhealthy host
    assert_eq!(NvramError::DeviceUnavailable.load_outcome(), Outcome::Recoverable);
    assert_eq!(NvramError::MediumIo.load_outcome(), Outcome::Recoverable);
    assert_eq!(NvramError::FormatInvalid.load_outcome(), Outcome::Recoverable);
    assert_eq!(NvramError::ResourceExhaustion.load_outcome(), Outcome::Fatal);
}
