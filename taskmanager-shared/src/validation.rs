/// Validation error rendering
///
/// Converts `validator::ValidationErrors` into the `{field: [messages]}` map
/// sent to clients in 422 responses. Keys are sorted so responses are
/// deterministic.

use std::collections::BTreeMap;

use validator::ValidationErrors;

/// Field name to human-readable messages
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Flattens field errors into an [`ErrorMap`]
///
/// Errors without a message fall back to their code.
pub fn error_map(errors: &ValidationErrors) -> ErrorMap {
    errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Single-field error map
pub fn field_error(field: &str, message: &str) -> ErrorMap {
    let mut map = ErrorMap::new();
    map.insert(field.to_string(), vec![message.to_string()]);
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use validator::ValidationError;

    #[test]
    fn test_error_map_uses_messages_and_codes() {
        let mut errors = ValidationErrors::new();

        let mut blank = ValidationError::new("blank");
        blank.message = Some(Cow::Borrowed("can't be blank"));
        errors.add("title", blank);
        errors.add("email", ValidationError::new("email"));

        let map = error_map(&errors);

        assert_eq!(map["title"], vec!["can't be blank"]);
        assert_eq!(map["email"], vec!["email"]);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["email", "title"]);
    }

    #[test]
    fn test_field_error() {
        let map = field_error("email", "has already been taken");
        assert_eq!(map.len(), 1);
        assert_eq!(map["email"], vec!["has already been taken"]);
    }
}
