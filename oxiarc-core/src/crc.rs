//! CRC (Cyclic Redundancy Check) implementations.
//!
//! The 842 block trailer carries a big-endian CRC-32 over the uncompressed
//! bytes of the block. It is the variant the nx842 accelerators compute
//! (`crc32_be(0, data)` in kernel terms):
//!
//! - Polynomial: 0x04C11DB7 (not reflected)
//! - Initial value: 0x00000000
//! - Final XOR: none
//! - Reflected input/output: No
//!
//! ## Performance Optimization
//!
//! For data of 16 bytes or more a slicing-by-4 loop consumes four bytes per
//! step using four pre-computed tables. Shorter input goes through the
//! single-table path, which has less setup cost.

const CRC32_BE_POLY: u32 = 0x04C11DB7;

/// CRC-32/BE slicing-by-4 lookup tables. Table 0 is the classic MSB-first table.
const CRC32_BE_TABLES: [[u32; 256]; 4] = {
    let mut tables = [[0u32; 256]; 4];

    let mut i = 0usize;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut j = 0;
        while j < 8 {
            if crc & 0x8000_0000 != 0 {
                crc = (crc << 1) ^ CRC32_BE_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    // Table t advances a byte through t additional zero bytes.
    let mut t = 1;
    while t < 4 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev >> 24) as usize] ^ (prev << 8);
            i += 1;
        }
        t += 1;
    }

    tables
};

/// Big-endian CRC-32 calculator used by the 842 block trailer.
///
/// # Example
///
/// ```
/// use oxiarc_core::crc::Crc32Be;
///
/// let mut crc = Crc32Be::new();
/// crc.update(b"1234");
/// crc.update(b"56789");
/// assert_eq!(crc.finalize(), 0x89A1897F);
/// assert_eq!(Crc32Be::compute(b"123456789"), 0x89A1897F);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32Be {
    crc: u32,
}

impl Crc32Be {
    /// Create a new calculator with the zero seed.
    pub fn new() -> Self {
        Self { crc: 0 }
    }

    /// Create a calculator continuing from a previous CRC value.
    pub fn with_seed(seed: u32) -> Self {
        Self { crc: seed }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= 16 {
            crc32_be_slice4(&mut self.crc, data);
        } else {
            crc32_be_sw(&mut self.crc, data);
        }
    }

    /// Get the current CRC value.
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.crc
    }

    /// Compute the CRC for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32Be {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn crc32_be_sw(crc: &mut u32, data: &[u8]) {
    for &byte in data {
        let index = ((*crc >> 24) ^ byte as u32) as usize;
        *crc = CRC32_BE_TABLES[0][index] ^ (*crc << 8);
    }
}

#[inline]
fn crc32_be_slice4(crc: &mut u32, data: &[u8]) {
    let mut c = *crc;
    let mut chunks = data.chunks_exact(4);

    for chunk in &mut chunks {
        let word = c ^ u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        c = CRC32_BE_TABLES[3][(word >> 24) as usize]
            ^ CRC32_BE_TABLES[2][((word >> 16) & 0xFF) as usize]
            ^ CRC32_BE_TABLES[1][((word >> 8) & 0xFF) as usize]
            ^ CRC32_BE_TABLES[0][(word & 0xFF) as usize];
    }

    crc32_be_sw(&mut c, chunks.remainder());
    *crc = c;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_be_empty() {
        assert_eq!(Crc32Be::compute(b""), 0);
    }

    #[test]
    fn test_crc32_be_check() {
        // CRC-32/CKSUM check value without its final XOR
        assert_eq!(Crc32Be::compute(b"123456789"), 0x89A1897F);
    }

    #[test]
    fn test_crc32_be_hello_world() {
        assert_eq!(Crc32Be::compute(b"Hello, World!"), 0xA7BAD02F);
    }

    #[test]
    fn test_crc32_be_incremental() {
        let mut crc = Crc32Be::new();
        crc.update(b"Hello");
        crc.update(b", ");
        crc.update(b"World!");
        assert_eq!(crc.finalize(), 0xA7BAD02F);
    }

    #[test]
    fn test_crc32_be_seed_continues() {
        let first = Crc32Be::compute(b"12345");
        let mut crc = Crc32Be::with_seed(first);
        crc.update(b"6789");
        assert_eq!(crc.value(), 0x89A1897F);
    }

    #[test]
    fn test_crc32_be_table_correctness() {
        assert_eq!(CRC32_BE_TABLES[0][0], 0x00000000);
        assert_eq!(CRC32_BE_TABLES[0][1], 0x04C11DB7);
        assert_eq!(CRC32_BE_TABLES[0][255], 0xB1F740B4);
    }

    #[test]
    fn test_crc32_be_slice4_matches_bytewise() {
        for size in [16, 17, 31, 32, 33, 64, 127, 4096] {
            let data: Vec<u8> = (0..size).map(|i| (i * 37 + 11) as u8).collect();

            let mut fast = 0u32;
            crc32_be_slice4(&mut fast, &data);
            let mut slow = 0u32;
            crc32_be_sw(&mut slow, &data);

            assert_eq!(fast, slow, "slicing mismatch for size {}", size);
        }
    }
}
