/// The attributes a form field exposes for identification.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldDescriptor {
    pub name: Option<String>,
    pub id: Option<String>,
    pub placeholder: Option<String>,
}

impl FieldDescriptor {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Resolution order: name, then id, then placeholder, then `"field"`.
    pub fn identity(&self) -> String {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.id))
            .or_else(|| non_empty(&self.placeholder))
            .unwrap_or_else(|| "field".to_string())
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_takes_priority_over_id() {
        let field = FieldDescriptor {
            name: Some("email".to_string()),
            id: Some("e1".to_string()),
            placeholder: None,
        };

        assert_eq!(field.identity(), "email");
    }

    #[test]
    fn placeholder_is_the_last_attribute_tried() {
        let field = FieldDescriptor {
            name: None,
            id: None,
            placeholder: Some("Your message".to_string()),
        };

        assert_eq!(field.identity(), "Your message");
    }

    #[test]
    fn empty_attributes_are_skipped() {
        let field = FieldDescriptor {
            name: Some(String::new()),
            id: Some("e1".to_string()),
            placeholder: None,
        };

        assert_eq!(field.identity(), "e1");
    }

    #[test]
    fn anonymous_fields_fall_back_to_a_literal() {
        assert_eq!(FieldDescriptor::default().identity(), "field");
    }
}
