use std::str::FromStr;

use crate::error::GenerateError;

/// How schema field names are turned into output property names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldNaming {
    #[default]
    Original,
    CamelCase,
}

impl FromStr for FieldNaming {
    type Err = GenerateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "original" => Ok(FieldNaming::Original),
            "camel_case" | "camelCase" => Ok(FieldNaming::CamelCase),
            other => Err(GenerateError::invalid_option(
                &format!("field_naming={other}"),
                "expected `original` or `camel_case`",
            )),
        }
    }
}

/// Options passed through protoc's plugin parameter, e.g.
/// `--tstypes_opt=field_naming=camel_case,async_iterator=AsyncIterable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub field_naming: FieldNaming,
    pub async_iterator: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            field_naming: FieldNaming::Original,
            async_iterator: "AsyncIterator".to_owned(),
        }
    }
}

impl GeneratorOptions {
    pub fn from_parameter(parameter: Option<&str>) -> Result<Self, GenerateError> {
        parameter.unwrap_or_default().parse()
    }
}

impl FromStr for GeneratorOptions {
    type Err = GenerateError;

    fn from_str(parameter: &str) -> Result<Self, Self::Err> {
        let mut options = GeneratorOptions::default();
        let mut seen: Vec<&str> = Vec::new();

        for part in parameter.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let (key, value) = match part.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (part, None),
            };

            // the flag and the key set the same thing
            let canonical = if key == "camel_case_names" {
                "field_naming"
            } else {
                key
            };

            if seen.contains(&canonical) {
                return Err(GenerateError::invalid_option(part, "specified more than once"));
            }
            seen.push(canonical);

            match (key, value) {
                ("field_naming", Some(value)) => options.field_naming = value.parse()?,

                ("camel_case_names", None) => options.field_naming = FieldNaming::CamelCase,

                ("camel_case_names", Some(_)) => {
                    return Err(GenerateError::invalid_option(part, "flag does not take a value"));
                }

                ("async_iterator", Some(value)) => {
                    if !is_identifier(value) {
                        return Err(GenerateError::invalid_option(
                            part,
                            "expected a TypeScript identifier",
                        ));
                    }

                    options.async_iterator = value.to_owned();
                }

                ("field_naming" | "async_iterator", None) => {
                    return Err(GenerateError::invalid_option(part, "missing a value"));
                }

                _ => return Err(GenerateError::invalid_option(part, "unknown option")),
            }
        }

        Ok(options)
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }

    chars.all(|char| char.is_ascii_alphanumeric() || char == '_' || char == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parameter_is_default() {
        assert_eq!(
            GeneratorOptions::from_parameter(None).unwrap(),
            GeneratorOptions::default()
        );
        assert_eq!(
            GeneratorOptions::from_parameter(Some(" , ")).unwrap(),
            GeneratorOptions::default()
        );
    }

    #[test]
    fn field_naming() {
        let options: GeneratorOptions = "field_naming=camel_case".parse().unwrap();
        assert_eq!(options.field_naming, FieldNaming::CamelCase);

        let options: GeneratorOptions = "camel_case_names".parse().unwrap();
        assert_eq!(options.field_naming, FieldNaming::CamelCase);

        let options: GeneratorOptions = "field_naming=original".parse().unwrap();
        assert_eq!(options.field_naming, FieldNaming::Original);
    }

    #[test]
    fn async_iterator() {
        let options: GeneratorOptions = "async_iterator=AsyncIterable, camel_case_names"
            .parse()
            .unwrap();

        assert_eq!(options.async_iterator, "AsyncIterable");
        assert_eq!(options.field_naming, FieldNaming::CamelCase);
    }

    #[test]
    fn rejects_bad_options() {
        for parameter in [
            "unknown=1",
            "verbose",
            "field_naming=snake",
            "field_naming",
            "camel_case_names=true",
            "field_naming=original,camel_case_names",
            "async_iterator=Async<Iterator>",
            "async_iterator=",
        ] {
            assert!(
                matches!(
                    parameter.parse::<GeneratorOptions>(),
                    Err(GenerateError::InvalidOption { .. })
                ),
                "{parameter} should be rejected"
            );
        }
    }
}
