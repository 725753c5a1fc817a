//! Data memory

use crate::error::MemoryError;
use crate::error::MemoryErrorKind;
use crate::error::SimulatorResult;

/// Value of every byte before it is first written
pub const RESET_BYTE: u8 = 0xFF;

/// Memory interface implementation
/// Multi-byte accesses are little-endian and built on the byte primitives.
pub trait StorageInterface {
    fn get8(&self, address: u32) -> SimulatorResult<u8>;
    fn set8(&mut self, address: u32, value: u8) -> SimulatorResult<()>;

    fn get16(&self, address: u32) -> SimulatorResult<u16> {
        Ok(self.get8(address)? as u16
            | ((self.get8(next(address, 1)?)? as u16) << 8))
    }
    fn get32(&self, address: u32) -> SimulatorResult<u32> {
        Ok(self.get16(address)? as u32
            | ((self.get16(next(address, 2)?)? as u32) << 16))
    }

    fn set16(&mut self, address: u32, value: u16) -> SimulatorResult<()> {
        self.set8(address, value as u8)?;
        self.set8(next(address, 1)?, (value >> 8) as u8)
    }
    fn set32(&mut self, address: u32, value: u32) -> SimulatorResult<()> {
        self.set16(address, value as u16)?;
        self.set16(next(address, 2)?, (value >> 16) as u16)
    }

    /// Size of the addressable range in bytes
    fn size(&self) -> usize;
}

fn next(address: u32, offset: u32) -> SimulatorResult<u32> {
    address.checked_add(offset).ok_or_else(|| {
        MemoryError::AccessError {
            address,
            kind: MemoryErrorKind::OutOfBounds(u32::MAX as usize),
        }
        .into()
    })
}

/// Flat byte-addressed data memory
#[derive(Clone, Debug)]
pub struct DataMemory {
    data: Vec<u8>,
}

impl DataMemory {
    pub fn make(size: usize) -> Self {
        Self { data: vec![RESET_BYTE; size] }
    }

    /// Restores every byte to its reset value
    pub fn clear(&mut self) {
        self.data.fill(RESET_BYTE);
    }

    fn index(&self, address: u32) -> SimulatorResult<usize> {
        let index = address as usize;
        if index < self.data.len() {
            Ok(index)
        } else {
            Err(MemoryError::AccessError {
                address,
                kind: MemoryErrorKind::OutOfBounds(self.data.len()),
            }
            .into())
        }
    }
}

impl StorageInterface for DataMemory {
    fn get8(&self, address: u32) -> SimulatorResult<u8> {
        Ok(self.data[self.index(address)?])
    }

    fn set8(&mut self, address: u32, value: u8) -> SimulatorResult<()> {
        let index = self.index(address)?;
        self.data[index] = value;
        Ok(())
    }

    /// A store straddling the end of memory writes nothing
    fn set32(&mut self, address: u32, value: u32) -> SimulatorResult<()> {
        let start = self.index(address)?;
        let end = self.index(next(address, 3)?)?;
        self.data[start..=end].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulatorError;

    #[test]
    fn test_reset_value() {
        let memory = DataMemory::make(16);
        assert_eq!(memory.size(), 16);
        assert_eq!(memory.get32(0).unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_little_endian() {
        let mut memory = DataMemory::make(16);
        memory.set32(4, 0x0102_0380).unwrap();
        assert_eq!(memory.get8(4).unwrap(), 0x80);
        assert_eq!(memory.get8(5).unwrap(), 0x03);
        assert_eq!(memory.get8(7).unwrap(), 0x01);
        assert_eq!(memory.get16(6).unwrap(), 0x0102);
        assert_eq!(memory.get32(4).unwrap(), 0x0102_0380);

        memory.set16(8, 0xBEEF).unwrap();
        assert_eq!(memory.get8(8).unwrap(), 0xEF);
        assert_eq!(memory.get8(10).unwrap(), RESET_BYTE);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut memory = DataMemory::make(16);
        assert!(matches!(
            memory.get8(16),
            Err(SimulatorError::MemoryError(MemoryError::AccessError {
                address: 16,
                kind: MemoryErrorKind::OutOfBounds(16),
            }))
        ));
        assert!(memory.get32(u32::MAX).is_err());

        // Straddling the end leaves memory untouched
        assert!(memory.set32(14, 0).is_err());
        assert_eq!(memory.get16(14).unwrap(), 0xFFFF);
    }

    #[test]
    fn test_clear() {
        let mut memory = DataMemory::make(8);
        memory.set32(0, 0).unwrap();
        memory.clear();
        assert_eq!(memory.get32(0).unwrap(), 0xFFFF_FFFF);
    }
}
