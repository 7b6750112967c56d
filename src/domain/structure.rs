//! Declared field structure of an API definition.
//!
//! Flat definitions declare a single field map. Relational definitions declare
//! entities with relations between them; graph definitions declare types whose
//! fields may reference other types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::error::StructureError;
use super::shape::ApiShape;

/// Primitive type tag of a field, or a reference to another declared type.
///
/// Scalar tags are lower-case (`string`, `date`, `id`, ...) or one of the
/// GraphQL built-in scalars (`String`, `Int`, `Float`, `Boolean`, `ID`). Any
/// other spelling names a type, so `Date` or `Text` can be declared as
/// graph types and referenced from fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Id,
    Reference(String),
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "string" | "text" | "String" => FieldType::String,
            "number" | "int" | "integer" | "float" | "decimal" | "Int" | "Float" => FieldType::Number,
            "boolean" | "bool" | "Boolean" => FieldType::Boolean,
            "date" | "datetime" => FieldType::Date,
            "id" | "ID" => FieldType::Id,
            _ => FieldType::Reference(tag),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::String => "string".to_string(),
            FieldType::Number => "number".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Date => "date".to_string(),
            FieldType::Id => "ID".to_string(),
            FieldType::Reference(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self { field_type }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::OneToOne => "oneToOne",
            RelationKind::OneToMany => "oneToMany",
            RelationKind::ManyToOne => "manyToOne",
            RelationKind::ManyToMany => "manyToMany",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    #[serde(rename = "type")]
    pub kind: RelationKind,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named entity (relational) or type (graph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, RelationSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStructure {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntitySpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<EntitySpec>,
}

impl FieldStructure {
    pub fn flat(fields: impl IntoIterator<Item = (String, FieldType)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, field_type)| (name, FieldSpec::new(field_type)))
                .collect(),
            ..Default::default()
        }
    }

    /// Entities for relational structures, types for graph structures.
    pub fn collections(&self, shape: ApiShape) -> &[EntitySpec] {
        match shape {
            ApiShape::Flat => &[],
            ApiShape::Relational => &self.entities,
            ApiShape::Graph => &self.types,
        }
    }

    /// Check the declaration against `shape`, collecting every problem found.
    pub fn check(&self, shape: ApiShape) -> Result<(), Vec<StructureError>> {
        let mut errors = Vec::new();

        match shape {
            ApiShape::Flat => {
                if self.fields.is_empty() {
                    errors.push(StructureError::Empty(shape, "field"));
                }
                if self.fields.keys().any(|name| name.trim().is_empty()) {
                    errors.push(StructureError::UnnamedField("fields".to_string()));
                }
                if !self.entities.is_empty() {
                    errors.push(StructureError::Unexpected("entities", shape));
                }
                if !self.types.is_empty() {
                    errors.push(StructureError::Unexpected("types", shape));
                }
            }
            ApiShape::Relational => {
                if !self.types.is_empty() {
                    errors.push(StructureError::Unexpected("types", shape));
                }
                Self::check_entities(shape, &self.entities, "entity", &mut errors);
            }
            ApiShape::Graph => {
                if !self.entities.is_empty() {
                    errors.push(StructureError::Unexpected("entities", shape));
                }
                Self::check_entities(shape, &self.types, "type", &mut errors);
            }
        }
        if shape != ApiShape::Flat && !self.fields.is_empty() {
            errors.push(StructureError::Unexpected("fields", shape));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_entities(
        shape: ApiShape,
        entities: &[EntitySpec],
        noun: &'static str,
        errors: &mut Vec<StructureError>,
    ) {
        if entities.is_empty() {
            errors.push(StructureError::Empty(shape, noun));
            return;
        }

        let mut seen = HashSet::new();
        for (idx, entity) in entities.iter().enumerate() {
            if entity.name.trim().is_empty() {
                errors.push(StructureError::UnnamedEntity(idx));
                continue;
            }
            if !seen.insert(entity.name.as_str()) {
                errors.push(StructureError::DuplicateEntity(entity.name.clone()));
            }
        }
        let known: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();

        for entity in entities.iter().filter(|e| !e.name.trim().is_empty()) {
            if entity.fields.is_empty() {
                errors.push(StructureError::NoFields(entity.name.clone()));
            }
            for (field, decl) in &entity.fields {
                if field.trim().is_empty() {
                    errors.push(StructureError::UnnamedField(entity.name.clone()));
                }
                if let FieldType::Reference(target) = &decl.field_type {
                    if !known.contains(target.as_str()) {
                        errors.push(StructureError::UnknownFieldType {
                            entity: entity.name.clone(),
                            field: field.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
            for (relation, decl) in &entity.relations {
                if !is_valid_relation_name(relation) {
                    errors.push(StructureError::InvalidRelationName {
                        entity: entity.name.clone(),
                        relation: relation.clone(),
                    });
                }
                if decl.target == entity.name {
                    errors.push(StructureError::SelfRelation {
                        entity: entity.name.clone(),
                        relation: relation.clone(),
                    });
                } else if !known.contains(decl.target.as_str()) {
                    errors.push(StructureError::UnknownTarget {
                        entity: entity.name.clone(),
                        relation: relation.clone(),
                        target: decl.target.clone(),
                    });
                }
            }
        }
    }
}

fn is_valid_relation_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn relational(value: serde_json::Value) -> FieldStructure {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_flat_structure_from_wire() {
        let structure: FieldStructure = serde_json::from_value(json!({
            "fields": { "name": { "type": "string" }, "age": { "type": "number" } }
        }))
        .unwrap();
        assert_eq!(structure.fields["age"].field_type, FieldType::Number);
        assert!(structure.check(ApiShape::Flat).is_ok());
    }

    #[test]
    fn test_flat_requires_fields() {
        let errors = FieldStructure::default().check(ApiShape::Flat).unwrap_err();
        assert_eq!(errors, vec![StructureError::Empty(ApiShape::Flat, "field")]);
    }

    #[test]
    fn test_relational_relations() {
        let structure = relational(json!({
            "entities": [
                {
                    "name": "users",
                    "fields": { "id": { "type": "number" }, "email": { "type": "string" } },
                    "relations": { "posts": { "type": "oneToMany", "target": "posts" } }
                },
                {
                    "name": "posts",
                    "fields": { "id": { "type": "number" }, "userId": { "type": "number" } },
                    "relations": { "author": { "type": "manyToOne", "target": "users" } }
                }
            ]
        }));
        assert!(structure.check(ApiShape::Relational).is_ok());
        assert_eq!(structure.entities[0].relations["posts"].kind, RelationKind::OneToMany);
    }

    #[test]
    fn test_relational_rejects_bad_relations() {
        let structure = relational(json!({
            "entities": [
                {
                    "name": "users",
                    "fields": { "id": { "type": "number" } },
                    "relations": {
                        "me": { "type": "oneToOne", "target": "users" },
                        "ghosts": { "type": "oneToMany", "target": "ghosts" },
                        "1bad name": { "type": "oneToMany", "target": "users" }
                    }
                },
                { "name": "users", "fields": { "id": { "type": "number" } } }
            ]
        }));
        let errors = structure.check(ApiShape::Relational).unwrap_err();
        assert!(errors.contains(&StructureError::DuplicateEntity("users".to_string())));
        assert!(errors.contains(&StructureError::SelfRelation {
            entity: "users".to_string(),
            relation: "me".to_string(),
        }));
        assert!(errors.contains(&StructureError::UnknownTarget {
            entity: "users".to_string(),
            relation: "ghosts".to_string(),
            target: "ghosts".to_string(),
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructureError::InvalidRelationName { relation, .. } if relation == "1bad name")));
    }

    #[test]
    fn test_graph_type_references() {
        let structure: FieldStructure = serde_json::from_value(json!({
            "types": [
                { "name": "Book", "fields": { "title": { "type": "String" }, "author": { "type": "Author" } } },
                { "name": "Author", "fields": { "name": { "type": "String" }, "publisher": { "type": "Publisher" } } }
            ]
        }))
        .unwrap();
        let errors = structure.check(ApiShape::Graph).unwrap_err();
        assert_eq!(
            errors,
            vec![StructureError::UnknownFieldType {
                entity: "Author".to_string(),
                field: "publisher".to_string(),
                target: "Publisher".to_string(),
            }]
        );
        assert_eq!(structure.types[0].fields["title"].field_type, FieldType::String);
    }

    #[test]
    fn test_wrong_section_for_shape() {
        let structure = FieldStructure::flat([("name".to_string(), FieldType::String)]);
        let errors = structure.check(ApiShape::Graph).unwrap_err();
        assert!(errors.contains(&StructureError::Empty(ApiShape::Graph, "type")));
        assert!(errors.contains(&StructureError::Unexpected("fields", ApiShape::Graph)));
    }

    #[test]
    fn test_scalar_tags() {
        assert_eq!(FieldType::from("Int".to_string()), FieldType::Number);
        assert_eq!(FieldType::from("integer".to_string()), FieldType::Number);
        assert_eq!(FieldType::from("ID".to_string()), FieldType::Id);
        assert_eq!(FieldType::from("datetime".to_string()), FieldType::Date);
        assert_eq!(String::from(FieldType::Id), "ID");
    }

    #[test]
    fn test_graph_types_named_like_scalars() {
        let structure: FieldStructure = serde_json::from_value(json!({
            "types": [
                { "name": "Event", "fields": { "title": { "type": "String" }, "when": { "type": "Date" } } },
                { "name": "Date", "fields": { "day": { "type": "Int" }, "note": { "type": "Text" } } },
                { "name": "Text", "fields": { "body": { "type": "string" } } }
            ]
        }))
        .unwrap();

        assert!(structure.check(ApiShape::Graph).is_ok());
        assert_eq!(
            structure.types[0].fields["when"].field_type,
            FieldType::Reference("Date".to_string())
        );
        assert_eq!(
            structure.types[1].fields["note"].field_type,
            FieldType::Reference("Text".to_string())
        );
    }
}
