//! Whitespace helpers shared by normalization and projection.

/// Trim both ends and collapse every internal whitespace run to one space.
pub fn squish(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Owned copy of a text value that is worth exposing.
pub fn present_text(s: Option<&String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty()).cloned()
}

/// Owned copy of a list value that is worth exposing.
pub fn present_list(list: Option<&[String]>) -> Option<Vec<String>> {
    list.filter(|l| !l.is_empty()).map(|l| l.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squish_trims_and_collapses() {
        assert_eq!(squish("  food \t pantry\n\nhours  "), "food pantry hours");
        assert_eq!(squish("single"), "single");
        assert_eq!(squish("   "), "");
        assert_eq!(squish("non\u{a0}breaking  space"), "non breaking space");
    }

    #[test]
    fn present_filters_blank_values() {
        assert_eq!(present_text(Some(&"  ".to_string())), None);
        assert_eq!(present_text(Some(&"Free".to_string())), Some("Free".to_string()));
        assert_eq!(present_list(Some(&[])), None);
        assert_eq!(present_list(Some(&["a".to_string()])), Some(vec!["a".to_string()]));
        assert_eq!(present_list(None), None);
    }
}
