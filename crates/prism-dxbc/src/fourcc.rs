use core::fmt;

/// A four-byte chunk identifier as stored in a `DXBC` container.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Container magic.
    pub const DXBC: FourCC = FourCC(*b"DXBC");
    /// Input signature chunk.
    pub const ISGN: FourCC = FourCC(*b"ISGN");
    /// Input signature chunk, alternate spelling emitted by some toolchains.
    pub const ISG1: FourCC = FourCC(*b"ISG1");
    /// Output signature chunk.
    pub const OSGN: FourCC = FourCC(*b"OSGN");
    /// Output signature chunk, alternate spelling.
    pub const OSG1: FourCC = FourCC(*b"OSG1");
    /// Resource definition chunk.
    pub const RDEF: FourCC = FourCC(*b"RDEF");
    /// Resource definition chunk, alternate spelling.
    pub const RD11: FourCC = FourCC(*b"RD11");
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}
