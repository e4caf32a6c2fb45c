//! Variable-length binary keys.
//!
//! A [`Key`] is the BSD-radix wire convention: its first byte is the total
//! length of the buffer (itself included), and every bit thereafter is
//! addressed MSB-first starting at the first payload byte. [`KeyView`] is
//! the read-only, non-owning counterpart the trie actually walks.

use std::fmt;

/// An owned variable-length key or mask, stored in the length-prefixed wire
/// convention described by §3/§6 of the external interface.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Key(Box<[u8]>);

impl Key {
    /// Builds a key from a payload (the length byte is computed and
    /// prepended automatically). Panics if the payload plus the length
    /// byte would not fit in a `u8` — malformed input this deep is a bug
    /// in the caller, not a recoverable [`crate::RibError`].
    pub fn from_payload(payload: &[u8]) -> Self {
        assert!(payload.len() + 1 <= u8::MAX as usize, "key payload too long");
        let mut buf = Vec::with_capacity(payload.len() + 1);
        buf.push((payload.len() + 1) as u8);
        buf.extend_from_slice(payload);
        Key(buf.into_boxed_slice())
    }

    /// Builds an all-ones mask of the given payload length (a host mask).
    pub fn host_mask(payload_len: usize) -> Self {
        Self::from_payload(&vec![0xffu8; payload_len])
    }

    /// Builds an all-zeros mask of the given payload length (a default
    /// mask, matching the root sentinel's "everything" route).
    pub fn zero_mask(payload_len: usize) -> Self {
        Self::from_payload(&vec![0u8; payload_len])
    }

    #[inline]
    pub fn view(&self) -> KeyView<'_> {
        KeyView(&self.0)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Validates the length-byte convention against the actual buffer size:
    /// the `InvalidArgument` check the RIB boundary must perform before a
    /// key ever reaches the trie (§4.1/§7).
    pub fn from_wire(buf: &[u8]) -> Option<Self> {
        if buf.is_empty() || buf[0] as usize != buf.len() {
            return None;
        }
        Some(Key(buf.to_vec().into_boxed_slice()))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(")?;
        for b in self.view().payload() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

/// Read-only view of a [`Key`]'s bytes. Bit 0 is the MSB of the first
/// payload byte (the byte right after the length byte); bit access beyond
/// the payload's length logically extends the key with zeros (§4.1 — this
/// is load-bearing for [`KeyView::compare`] against a shorter mask).
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct KeyView<'a>(&'a [u8]);

impl<'a> KeyView<'a> {
    #[inline]
    pub fn new(buf: &'a [u8]) -> Self {
        debug_assert!(!buf.is_empty());
        KeyView(buf)
    }

    /// The wire length byte (total size including itself).
    #[inline]
    pub fn len(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len() <= 1
    }

    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        &self.0[1..]
    }

    /// Total number of significant bits a host route over this payload
    /// would have.
    #[inline]
    pub fn bit_len(&self) -> u16 {
        self.payload().len() as u16 * 8
    }

    /// Bit `n`, MSB-first, counted from the first payload byte. Returns 0
    /// past the end of the payload.
    #[inline]
    pub fn bit(&self, n: u16) -> u8 {
        let payload = self.payload();
        let byte_idx = (n / 8) as usize;
        match payload.get(byte_idx) {
            Some(&byte) => (byte >> (7 - (n % 8))) & 1,
            None => 0,
        }
    }

    /// Compares `self` and `other` bit-by-bit up to (and excluding)
    /// `up_to_bit`; both extend logically with zeros.
    pub fn compare(&self, other: &KeyView<'_>, up_to_bit: u16) -> bool {
        let whole_bytes = (up_to_bit / 8) as usize;
        let a = self.payload();
        let b = other.payload();
        for i in 0..whole_bytes {
            if a.get(i).copied().unwrap_or(0) != b.get(i).copied().unwrap_or(0) {
                return false;
            }
        }
        let rem = up_to_bit % 8;
        if rem == 0 {
            return true;
        }
        let mask = !(0xffu8 >> rem);
        let av = a.get(whole_bytes).copied().unwrap_or(0) & mask;
        let bv = b.get(whole_bytes).copied().unwrap_or(0) & mask;
        av == bv
    }

    /// The first bit position (0-based) at which `self` and `other`
    /// disagree, scanning up to `max_bits`. Returns `max_bits` if they
    /// agree everywhere scanned.
    pub fn first_mismatch(&self, other: &KeyView<'_>, max_bits: u16) -> u16 {
        for bit in 0..max_bits {
            if self.bit(bit) != other.bit(bit) {
                return bit;
            }
        }
        max_bits
    }

    /// Produces `self & mask` as an owned [`Key`] with the same payload
    /// length as `self`; bits beyond the mask's own payload are treated as
    /// zero (host semantics: a short mask clears everything past it).
    pub fn apply_mask(&self, mask: &KeyView<'_>) -> Key {
        let a = self.payload();
        let m = mask.payload();
        let masked: Vec<u8> = a
            .iter()
            .enumerate()
            .map(|(i, &byte)| byte & m.get(i).copied().unwrap_or(0))
            .collect();
        Key::from_payload(&masked)
    }

    /// First bit index (0-based) at which the mask stops being all-ones:
    /// the mask's "significant length". An all-ones mask of the payload's
    /// full width returns the payload's full bit length (host route).
    pub fn significant_len(&self) -> u16 {
        let payload = self.payload();
        for (byte_idx, &byte) in payload.iter().enumerate() {
            if byte != 0xff {
                let lead = byte.leading_ones() as u16;
                return byte_idx as u16 * 8 + lead;
            }
        }
        payload.len() as u16 * 8
    }
}

impl fmt::Debug for KeyView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyView(")?;
        for b in self.payload() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_length_byte() {
        let k = Key::from_payload(&[1, 2, 3, 4]);
        assert_eq!(k.view().len(), 5);
        assert_eq!(k.view().payload(), &[1, 2, 3, 4]);
    }

    #[test]
    fn bit_extends_with_zeros() {
        let k = Key::from_payload(&[0b1010_0000]);
        assert_eq!(k.view().bit(0), 1);
        assert_eq!(k.view().bit(1), 0);
        assert_eq!(k.view().bit(2), 1);
        // past the single payload byte: logically zero
        assert_eq!(k.view().bit(100), 0);
    }

    #[test]
    fn significant_len_host_and_default() {
        assert_eq!(Key::host_mask(4).view().significant_len(), 32);
        assert_eq!(Key::zero_mask(4).view().significant_len(), 0);
        let k = Key::from_payload(&[0xff, 0xf0, 0, 0]);
        assert_eq!(k.view().significant_len(), 12);
    }

    #[test]
    fn apply_mask_clears_tail() {
        let k = Key::from_payload(&[0xff, 0xff, 0xff, 0xff]);
        let m = Key::from_payload(&[0xff, 0x00, 0x00, 0x00]);
        let masked = k.view().apply_mask(&m.view());
        assert_eq!(masked.view().payload(), &[0xff, 0, 0, 0]);
    }

    #[test]
    fn compare_respects_bit_boundary() {
        let a = Key::from_payload(&[0b1111_0000]);
        let b = Key::from_payload(&[0b1111_1111]);
        assert!(a.view().compare(&b.view(), 4));
        assert!(!a.view().compare(&b.view(), 5));
    }
}
