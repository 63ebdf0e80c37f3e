//! # Producers
//!
//! A producer is identified by its taxpayer document; the store converges
//! repeated submissions of one document onto a single row.

use crate::document::Document;
use crate::error::ValidationError;
use crate::id::ProducerId;
use crate::name::PersonName;

/// A validated producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Producer {
    id: Option<ProducerId>,
    name: PersonName,
    document: Document,
    is_active: bool,
}

impl Producer {
    /// Validate the name, then the document.
    pub fn new(
        id: Option<ProducerId>,
        name: impl Into<String>,
        document: impl Into<String>,
        is_active: Option<bool>,
    ) -> Result<Self, ValidationError> {
        let name = PersonName::new(name)?;
        let document = Document::classify(document)?;
        Ok(Self {
            id,
            name,
            document,
            is_active: is_active.unwrap_or(true),
        })
    }

    pub fn id(&self) -> Option<ProducerId> {
        self.id
    }

    pub fn name(&self) -> &PersonName {
        &self.name
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}
