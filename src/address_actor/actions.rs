/// Custom actions for address-book entries.
#[derive(Debug, Clone)]
pub enum AddressAction {
    /// Drops the default flag. Returns whether the flag was set before.
    ClearDefault,
}
