use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

/// Render a raw tera template against any serializable context.
pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    tera.render("inline_template", &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::ToolSpec;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_load_prompt() {
        let template = "Hello, {{ name }}! You are {{ age }} years old.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "Alice".to_string());
        context.insert("age".to_string(), 30.to_string());

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(result, "Hello, Alice! You are 30 years old.");
    }

    #[test]
    fn test_load_prompt_missing_variable() {
        let template = "Hello, {{ name }}! You are {{ age }} years old.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "Alice".to_string());
        assert!(load_prompt(template, &context).is_err());
    }

    #[test]
    fn test_load_prompt_does_not_escape() {
        let mut context = HashMap::new();
        context.insert("input".to_string(), r#"{"location": "<Paris & co>"}"#.to_string());
        let result = load_prompt("{{ input }}", &context).unwrap();
        assert_eq!(result, r#"{"location": "<Paris & co>"}"#);
    }

    #[test]
    fn test_load_prompt_with_tools() {
        let template = "### Tools\n{% for tool in tools %}\n{{tool.name}}: {{tool.description}}{% endfor %}";
        let tools = vec![
            ToolSpec::new("calculator", "Performs basic math operations", json!({})),
            ToolSpec::new("weather", "Gets weather information", json!({})),
        ];
        let mut context = HashMap::new();
        context.insert("tools".to_string(), tools);

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(
            result,
            "### Tools\n\ncalculator: Performs basic math operations\nweather: Gets weather information"
        );
    }
}
