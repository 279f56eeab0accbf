use super::{DocumentFilter, DocumentFilterContext};
use crate::error::Result;
use crate::openapi::{OpenApiDocument, Tag};
use indexmap::IndexMap;

/// Injects configured descriptions into the document's tag list
#[derive(Debug, Default)]
pub struct TagDescriptionsDocumentFilter {
    descriptions: IndexMap<String, String>,
}

impl TagDescriptionsDocumentFilter {
    pub fn new(descriptions: IndexMap<String, String>) -> Self {
        Self { descriptions }
    }
}

impl DocumentFilter for TagDescriptionsDocumentFilter {
    fn apply(
        &self,
        document: &mut OpenApiDocument,
        _context: &mut DocumentFilterContext<'_, '_>,
    ) -> Result<()> {
        for (name, description) in &self.descriptions {
            match document.tags.iter_mut().find(|tag| &tag.name == name) {
                Some(tag) => tag.description = Some(description.clone()),
                None => document.tags.push(Tag {
                    name: name.clone(),
                    description: Some(description.clone()),
                }),
            }
        }
        Ok(())
    }
}
