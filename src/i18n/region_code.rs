pub struct RegionCode {
}

impl RegionCode {
    /// Returns a region code string representing the "unknown" region.
    pub fn get_unknown() -> &'static str {
        return Self::zz();
    }

    /// The region code for the non-geographical entities ("world" per UN M.49).
    pub fn un001() -> &'static str {
        return "001";
    }

    pub fn zz() -> &'static str {
        return "ZZ";
    }
}
