//! Parent device capability for retimer handles

/// The caller-owned device a retimer handle is attached to.
///
/// The registry never owns a parent; handles keep a weak back-reference and
/// reach the parent's static configuration data through this trait.
pub trait ParentDevice: Send + Sync {
    /// Device name, used in log output
    fn name(&self) -> &str;

    /// Look up a named property in the device's static configuration.
    ///
    /// Returns the raw stored bytes; a terminator byte kept by the backing
    /// store is included and stripped by the reader.
    fn property(&self, key: &str) -> Option<Vec<u8>>;
}
