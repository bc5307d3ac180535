use nvram_core::{Attributes, NvramError, NvramResult};
use nvram_hal::{DeviceClass, DeviceRegistry, FlashDevice, VariableCodec};
use nvram_mem::StoreBuffer;

struct Blank {
    size: usize,
}

impl FlashDevice for Blank {
    fn size(&self) -> usize { self.size }
    fn erase_size(&self) -> usize { 4096 }
    fn read(&mut self, _offset: usize, buf: &mut [u8]) -> NvramResult<()> {
        buf.fill(0xFF);
        Ok(())
    }
    fn write(&mut self, _offset: usize, _data: &[u8]) -> NvramResult<()> { Ok(()) }
    fn erase(&mut self, _offset: usize, _len: usize) -> NvramResult<()> { Ok(()) }
}

struct OneDevice(Blank);

impl DeviceRegistry for OneDevice {
    fn flash(&mut self, index: u32) -> Option<&mut dyn FlashDevice> {
        if index == 0 { Some(&mut self.0) } else { None }
    }
}

struct NullCodec;

impl VariableCodec for NullCodec {
    fn collect(&self, _filter: Attributes) -> NvramResult<StoreBuffer> {
        StoreBuffer::with_capacity(0)
    }
    fn restore(&mut self, _image: &[u8], _force: bool) -> NvramResult<()> {
        Err(NvramError::FormatInvalid)
    }
}

#[test]
fn test_trait_object_safety() {
    let mut reg = OneDevice(Blank { size: 1 << 20 });
    let obj: &mut dyn DeviceRegistry = &mut reg;

    assert!(obj.flash(1).is_none());
    let dev = obj.flash(0).unwrap();
    assert_eq!(dev.size(), 1 << 20);

    let mut buf = [0u8; 8];
    dev.read(0, &mut buf).unwrap();
    assert_eq!(buf, [0xFF; 8]);

    let mut codec = NullCodec;
    let obj: &mut dyn VariableCodec = &mut codec;
    assert_eq!(obj.collect(Attributes::NON_VOLATILE).unwrap().len(), 0);
    assert!(obj.restore(&[], false).is_err());
}

#[test]
fn test_class_names() {
    assert_eq!(DeviceClass::Mmc.name(), "mmc");
    assert_eq!(DeviceClass::Host.name(), "host");
}
