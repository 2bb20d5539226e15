//! Tag formatting helpers.

/// Render a `key:value` tag
pub fn tag(key: &str, value: impl AsRef<str>) -> String {
    format!("{}:{}", key, value.as_ref())
}

/// Prepend `own` tags to the user-supplied `custom` tags, keeping order.
pub fn with_custom_tags(own: Vec<String>, custom: &[String]) -> Vec<String> {
    let mut tags = own;
    tags.extend(custom.iter().cloned());
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_ordering() {
        let own = vec![tag("record_kind", "ep"), tag("record_name", "x")];
        let tags = with_custom_tags(own, &["custom:tag".to_string()]);
        assert_eq!(tags, vec!["record_kind:ep", "record_name:x", "custom:tag"]);
    }
}
