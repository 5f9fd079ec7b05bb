use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::RawRepresentation;
use crate::property_bag::PropertyBag;
use crate::usage::UsageDetails;

/// A single embedding vector with metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
}

impl Embedding {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            ..Default::default()
        }
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Embeddings produced for a batch of inputs, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedEmbeddings {
    #[serde(default)]
    pub embeddings: Vec<Embedding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
    #[serde(skip)]
    pub raw_representation: Option<RawRepresentation>,
}

impl GeneratedEmbeddings {
    pub fn new(embeddings: Vec<Embedding>) -> Self {
        Self {
            embeddings,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Embedding> {
        self.embeddings.get(index)
    }

    /// Append another batch, summing usage with the nullable-aware rules.
    pub fn extend_from(&mut self, other: GeneratedEmbeddings) {
        self.embeddings.extend(other.embeddings);
        if let Some(usage) = other.usage {
            *self.usage.get_or_insert_with(UsageDetails::default) += usage;
        }
        if let Some(bag) = &other.additional_properties {
            crate::property_bag::merge_into(&mut self.additional_properties, bag);
        }
    }
}

/// Options for an embedding generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingGenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<PropertyBag>,
}

impl EmbeddingGenerationOptions {
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}
