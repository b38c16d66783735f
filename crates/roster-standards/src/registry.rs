use crate::error::{Result, StandardsError};
use crate::templates::{SportTemplate, builtin_templates};

/// Lookup over the available sport templates.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<SportTemplate>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    pub fn new(templates: Vec<SportTemplate>) -> Self {
        Self { templates }
    }

    /// Finds a template by id or sport name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&SportTemplate> {
        let name = name.trim();
        self.templates.iter().find(|template| {
            template.id.eq_ignore_ascii_case(name) || template.sport.eq_ignore_ascii_case(name)
        })
    }

    pub fn get(&self, name: &str) -> Result<&SportTemplate> {
        self.find(name)
            .ok_or_else(|| StandardsError::UnknownTemplate {
                name: name.to_string(),
            })
    }

    /// The template used when nothing better is known.
    pub fn fallback(&self) -> Option<&SportTemplate> {
        self.templates.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SportTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
