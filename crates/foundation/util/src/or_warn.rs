/// Extension for `Option` lookups whose `None` case is worth a log line
/// but not an error.
pub trait OrWarn<T> {
    /// Log a warning naming the missing thing when `self` is `None`,
    /// then return `self` unchanged.
    fn or_warn(self, what: &str) -> Self;
}

impl<T> OrWarn<T> for Option<T> {
    #[inline]
    fn or_warn(self, what: &str) -> Self {
        if self.is_none() {
            log::warn!("{what} was not present");
        }
        self
    }
}
