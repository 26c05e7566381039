use anyhow::Result;
use serde::Serialize;

use crate::cli::OutputFormat;

pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    println!("{}", render(&data, format)?);
    Ok(())
}

fn render<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    let json_value = serde_json::to_value(data)?;

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&json_value)?,
        OutputFormat::Yaml => serde_yaml::to_string(&json_value)?,
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_json() {
        let out = render(&json!({"name": "s1"}), OutputFormat::Json).unwrap();
        assert_eq!(out, "{\n  \"name\": \"s1\"\n}");
    }

    #[test]
    fn test_render_yaml() {
        let out = render(
            &json!({"name": "s1", "properties": {"storageMB": 51200}}),
            OutputFormat::Yaml,
        )
        .unwrap();
        assert!(out.contains("name: s1"));
        assert!(out.contains("storageMB: 51200"));
    }
}
