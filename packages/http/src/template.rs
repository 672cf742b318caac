//! URL templates over asset fields, e.g. `https://host/{{ .Type }}/{{ .Urn }}`.

use harvest_assets::Asset;
use regex::Regex;

use crate::error::Error;

const FIELDS: &[&str] = &["Urn", "Type", "Name", "Service", "Url"];

#[derive(Debug, Clone)]
pub struct UrlTemplate {
    raw: String,
    placeholder: Regex,
}

impl UrlTemplate {
    /// Parse a template, rejecting unknown placeholders.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let placeholder = Regex::new(r"\{\{\s*\.(\w+)\s*\}\}").map_err(|e| Error::Template {
            message: e.to_string(),
        })?;
        for captures in placeholder.captures_iter(raw) {
            let field = &captures[1];
            if !FIELDS.contains(&field) {
                return Err(Error::Template {
                    message: format!("unknown field .{field} in {raw:?}"),
                });
            }
        }
        if raw.matches("{{").count() != placeholder.find_iter(raw).count() {
            return Err(Error::Template {
                message: format!("malformed placeholder in {raw:?}"),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            placeholder,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn render(&self, asset: &Asset) -> String {
        self.placeholder
            .replace_all(&self.raw, |captures: &regex::Captures<'_>| {
                match &captures[1] {
                    "Urn" => asset.urn.clone(),
                    "Type" => asset.kind.clone(),
                    "Name" => asset.name.clone(),
                    "Service" => asset.service.clone(),
                    "Url" => asset.url.clone(),
                    _ => String::new(),
                }
            })
            .into_owned()
    }
}
