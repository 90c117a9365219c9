/// Convert a file offset read from a save header into a `usize`, if it fits.
///
/// Save headers store offsets as 64-bit values regardless of the host;
/// on a 32-bit target a huge offset simply cannot index a byte buffer.
#[inline]
pub fn u64_to_usize(offset: u64) -> Option<usize> {
    usize::try_from(offset).ok()
}

#[cfg(test)]
mod tests {
    use super::u64_to_usize;

    #[test]
    fn small_offsets_fit() {
        assert_eq!(u64_to_usize(0), Some(0));
        assert_eq!(u64_to_usize(4096), Some(4096));
    }

    #[test]
    fn huge_offsets_only_fit_on_64_bit_targets() {
        let fits = u64_to_usize(u64::MAX);
        if size_of::<usize>() >= size_of::<u64>() {
            assert_eq!(fits, Some(u64::MAX as usize), "64-bit usize holds any u64");
        } else {
            assert_eq!(fits, None, "32-bit usize cannot hold u64::MAX");
        }
    }
}
