use bitflags::bitflags;

bitflags! {
    /// Configuration of a database, fixed at open time by the layer above.
    ///
    /// The cursor layer does not interpret these itself; they travel to the
    /// engine, which enforces them (e.g. rejecting duplicate operations on a
    /// database opened without [`DatabaseFlags::DUP_SORT`]).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DatabaseFlags: u32 {
        /// Keys may hold multiple values, stored in sorted order. Enables
        /// the duplicate positioning operations and duplicate counts.
        const DUP_SORT = 0x04;
    }
}

bitflags! {
    /// Modifiers for cursor writes and deletes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct WriteFlags: u32 {
        /// Fail with the key-exists status instead of overwriting when the
        /// key is already present.
        const NO_OVERWRITE = 0x10;
        /// `DUP_SORT`-only: fail with the key-exists status when the exact
        /// key/value pair is already present.
        const NO_DUP_DATA = 0x20;
        /// Replace the value at the cursor's current position.
        const CURRENT = 0x40;
        /// Delete-only: remove every duplicate of the current key instead of
        /// just the one at the current position.
        const ALL_DUPS = 0x80;
        /// The key sorts at or after the current end of the database; the
        /// engine may skip its ordering search and fails with the
        /// key-mismatch status if the claim is false.
        const APPEND = 0x2_0000;
    }
}
