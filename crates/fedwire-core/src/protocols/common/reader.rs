/// Treat a blank field the same as an absent one.
pub(crate) fn optional_non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::optional_non_empty;

    #[test]
    fn optional_non_empty_blank() {
        assert_eq!(optional_non_empty(Some("  ")), None);
        assert_eq!(optional_non_empty(None), None);
    }

    #[test]
    fn optional_non_empty_value() {
        assert_eq!(
            optional_non_empty(Some(" bob@example.org ")),
            Some("bob@example.org")
        );
    }
}
