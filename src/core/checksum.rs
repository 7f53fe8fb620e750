//! Structural checksums.
//!
//! A checksum is computed from the content of a structure only, and must be
//! identical for identical content on every platform and every run. It lets
//! peers verify they loaded the same rules without exchanging them.
//!
//! Structures are hashed by streaming their `bincode` encoding (fixed-width
//! little-endian integers, IEEE-754 bit patterns for floats) through a
//! 64-bit FNV-1a hasher, after a kind tag. Fields tagged
//! `#[serde(skip)]` do not contribute.

use std::hash::Hasher;

use serde::Serialize;

/// A deterministic FNV-1a 64-bit hasher.
#[derive(Debug)]
pub struct FnvHasher {
    state: u64,
}

impl FnvHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

impl std::io::Write for FnvHasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Hasher::write(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Something with a platform-stable structural checksum.
pub trait CheckSum {
    /// Tag mixed in ahead of the content, so that different kinds with the
    /// same encoding hash differently.
    const KIND: &'static str;

    /// Feed this structure's content into `hasher`.
    fn combine_into(&self, hasher: &mut FnvHasher);

    /// The checksum of this structure alone.
    fn checksum(&self) -> u64 {
        let mut hasher = FnvHasher::new();
        hasher.write(Self::KIND.as_bytes());
        self.combine_into(&mut hasher);
        hasher.finish()
    }
}

/// Stream the encoding of `value` into `hasher`.
///
/// Encoding into an infallible sink only fails for types serde cannot
/// represent (e.g. maps with non-string keys in some formats); that is a
/// content-definition bug and is logged rather than propagated.
pub fn combine_serialized<T: Serialize + ?Sized>(hasher: &mut FnvHasher, value: &T) {
    if let Err(err) = bincode::serialize_into(&mut *hasher, value) {
        tracing::error!(error = %err, "failed to encode value for checksum");
    }
}

/// Checksum of an ordered sequence of checksummed items.
pub fn combine_all<'a, T, I>(hasher: &mut FnvHasher, items: I)
where
    T: CheckSum + 'a,
    I: IntoIterator<Item = &'a T>,
{
    for item in items {
        hasher.write_u64(item.checksum());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl CheckSum for Named {
        const KIND: &'static str = "Named";

        fn combine_into(&self, hasher: &mut FnvHasher) {
            combine_serialized(hasher, self.0);
        }
    }

    #[test]
    fn test_fnv_known_value() {
        // FNV-1a 64 of "a"
        let mut hasher = FnvHasher::new();
        hasher.write(b"a");
        assert_eq!(hasher.finish(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_checksum_stable() {
        assert_eq!(Named("alpha").checksum(), Named("alpha").checksum());
        assert_ne!(Named("alpha").checksum(), Named("beta").checksum());
    }

    #[test]
    fn test_combine_all_order_sensitive() {
        let a = [Named("x"), Named("y")];
        let b = [Named("y"), Named("x")];

        let mut ha = FnvHasher::new();
        combine_all(&mut ha, &a);
        let mut hb = FnvHasher::new();
        combine_all(&mut hb, &b);

        assert_ne!(ha.finish(), hb.finish());
    }
}
