//! Formatting rules for member display identifiers.
//!
//! An identifier looks like `DAIC-CSE-00001`: a club prefix, a category
//! (usually the department code) and a five digit ordinal. The ordinal is
//! shared by every category, so `DAIC-CSE-00001` and `DAIC-ECE-00002` can
//! coexist but `DAIC-ECE-00001` will never be produced after the first.

/// Attempts made by the allocator before falling back.
pub const MAX_ALLOCATION_ATTEMPTS: i64 = 5;

/// Distance past the observed count used once every attempt has collided.
pub const FALLBACK_ORDINAL_OFFSET: i64 = 100;

pub const ORDINAL_WIDTH: usize = 5;

/// Upper-cased, trimmed category, or `default` when blank.
pub fn normalize_category(category: Option<&str>, default: &str) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_uppercase(),
        _ => default.trim().to_uppercase(),
    }
}

pub fn format_member_id(prefix: &str, category: &str, ordinal: i64) -> String {
    format!("{}-{}-{:0width$}", prefix, category, ordinal, width = ORDINAL_WIDTH)
}

/// Ordinal tried on the zero-based `attempt` when `assigned` ids exist.
pub fn candidate_ordinal(assigned: i64, attempt: i64) -> i64 {
    assigned + 1 + attempt
}

pub fn fallback_ordinal(assigned: i64) -> i64 {
    assigned + FALLBACK_ORDINAL_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_member_id() {
        assert_eq!(format_member_id("DAIC", "CSE", 1), "DAIC-CSE-00001");
        assert_eq!(format_member_id("DAIC", "GEN", 42), "DAIC-GEN-00042");
        // Wider ordinals are not truncated
        assert_eq!(format_member_id("DAIC", "CSE", 123456), "DAIC-CSE-123456");
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category(Some("cse"), "GEN"), "CSE");
        assert_eq!(normalize_category(Some("  ece "), "GEN"), "ECE");
        assert_eq!(normalize_category(Some("   "), "GEN"), "GEN");
        assert_eq!(normalize_category(None, "gen"), "GEN");
    }

    #[test]
    fn test_ordinals() {
        assert_eq!(candidate_ordinal(0, 0), 1);
        assert_eq!(candidate_ordinal(4, 0), 5);
        assert_eq!(candidate_ordinal(4, 2), 7);
        assert_eq!(fallback_ordinal(4), 104);
    }
}
