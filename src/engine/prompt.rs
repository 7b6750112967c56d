//! Generation prompts, rendered from Tera templates.
//!
//! Each shape has its own template describing the required container, the
//! declared structure, per-field guidance and formatting rules.

use serde::Serialize;
use std::collections::BTreeMap;
use tera::{Context, Tera};

use crate::domain::{ApiShape, FieldSpec, FieldStructure, FieldType, GenerationError};

const FORMAT_RULES: &str = r#"   - Dates: "YYYY-MM-DD"
   - Emails: syntactically valid, formatted "first.last@domain.com"
   - Numbers: realistic values for the field
   - Names: realistic first and last names
   - Titles and roles: realistic job titles"#;

const FLAT_TEMPLATE: &str = r#"Generate exactly {{ count }} realistic JSON records based on this structure:
{{ structure }}

Strict instructions:
1. Return ONLY a valid JSON array of objects.
2. Each object must follow the structure above, without the type definitions (no "fields" or "type" keys).
3. The data must be realistic, varied and consistent.
4. Required formats:
{{ format_rules }}
{% if hints %}5. Field guidance:
{% for hint in hints %}   - "{{ hint.field }}": {{ hint.guidance }}
{% endfor %}{% endif %}
Expected format:
[
  { "id": 1, "title": "Software engineer" },
  { "id": 2, "title": "Marketing manager" }
]"#;

const RELATIONAL_TEMPLATE: &str = r#"Generate realistic relational JSON data based on this structure:
{{ structure }}

Strict instructions:
1. Return ONLY a JSON object with one array of records per entity: {{ collections | join(sep=", ") }}.
2. Relations between entities must be consistent (for example a userId in posts must match an existing id in users).
{% for relation in relations %}   - {{ relation.entity }}.{{ relation.name }} is {{ relation.kind }} to {{ relation.target }}
{% endfor %}3. Generate about {{ count }} records per entity.
4. The data must be realistic, varied and consistent.
5. Required formats:
{{ format_rules }}
{% if hints %}6. Field guidance:
{% for hint in hints %}   - "{{ hint.field }}": {{ hint.guidance }}
{% endfor %}{% endif %}
Expected format:
{
  "entity1": [ { ... }, { ... } ],
  "entity2": [ { ... }, { ... } ]
}"#;

const GRAPH_TEMPLATE: &str = r#"Generate realistic GraphQL JSON data based on this structure:
{{ structure }}

Strict instructions:
1. Return ONLY a JSON object with a single "data" property holding one array of records per type: {{ collections | join(sep=", ") }}.
2. References between types must be consistent.
3. Generate about {{ count }} records per type.
4. The data must be realistic, varied and consistent.
5. Required formats:
{{ format_rules }}
{% if hints %}6. Field guidance:
{% for hint in hints %}   - "{{ hint.field }}": {{ hint.guidance }}
{% endfor %}{% endif %}
Expected format:
{
  "data": {
    "Type1": [ { ... }, { ... } ],
    "Type2": [ { ... }, { ... } ]
  }
}"#;

/// Semantic hint derived from a field's name or type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldHint {
    FullName,
    FirstName,
    LastName,
    Email,
    JobTitle,
    Date,
}

impl FieldHint {
    /// Classify a field. Names are compared case-insensitively with
    /// underscores and dashes ignored, so `full_name` and `fullName` agree.
    pub fn classify(name: &str, field_type: &FieldType) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "name" | "names" | "fullname" | "nomcomplet" => Some(Self::FullName),
            "prenom" | "firstname" => Some(Self::FirstName),
            "nom" | "lastname" => Some(Self::LastName),
            "email" | "courriel" => Some(Self::Email),
            "title" | "titre" | "profession" | "job" => Some(Self::JobTitle),
            _ if key.ends_with("email") => Some(Self::Email),
            _ if *field_type == FieldType::Date => Some(Self::Date),
            _ => None,
        }
    }

    fn guidance(&self) -> &'static str {
        match self {
            Self::FullName => "a full name formatted \"First Last\"",
            Self::FirstName => "a realistic first name",
            Self::LastName => "a realistic family name",
            Self::Email => "a valid email address formatted \"first.last@domain.com\"",
            Self::JobTitle => "a realistic job title or profession",
            Self::Date => "a date formatted \"YYYY-MM-DD\"",
        }
    }
}

#[derive(Debug, Serialize)]
struct HintLine {
    field: String,
    guidance: &'static str,
}

#[derive(Debug, Serialize)]
struct RelationLine<'a> {
    entity: &'a str,
    name: &'a str,
    kind: &'static str,
    target: &'a str,
}

/// A rendered prompt plus the short description of the expected output.
#[derive(Debug, Clone)]
pub struct GenerationPrompt {
    pub text: String,
    pub output_format: &'static str,
}

/// Render the generation prompt for `count` records of `structure`.
pub fn build_prompt(
    shape: ApiShape,
    structure: &FieldStructure,
    count: u32,
) -> Result<GenerationPrompt, GenerationError> {
    let structure_json = serde_json::to_string_pretty(structure)
        .map_err(|e| GenerationError::Prompt(e.to_string()))?;

    let mut context = Context::new();
    context.insert("count", &count);
    context.insert("structure", &structure_json);
    context.insert("format_rules", FORMAT_RULES);
    context.insert("hints", &hints(shape, structure));

    let entities = structure.collections(shape);
    let collections: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    context.insert("collections", &collections);

    let relations: Vec<RelationLine> = entities
        .iter()
        .flat_map(|entity| {
            entity.relations.iter().map(move |(name, decl)| RelationLine {
                entity: &entity.name,
                name,
                kind: decl.kind.as_str(),
                target: &decl.target,
            })
        })
        .collect();
    context.insert("relations", &relations);

    let template = match shape {
        ApiShape::Flat => FLAT_TEMPLATE,
        ApiShape::Relational => RELATIONAL_TEMPLATE,
        ApiShape::Graph => GRAPH_TEMPLATE,
    };
    let text = Tera::one_off(template, &context, false)
        .map_err(|e| GenerationError::Prompt(e.to_string()))?;

    Ok(GenerationPrompt {
        text,
        output_format: shape.container_description(),
    })
}

fn hints(shape: ApiShape, structure: &FieldStructure) -> Vec<HintLine> {
    let mut lines = Vec::new();
    match shape {
        ApiShape::Flat => push_hints(&mut lines, None, &structure.fields),
        ApiShape::Relational | ApiShape::Graph => {
            for entity in structure.collections(shape) {
                push_hints(&mut lines, Some(&entity.name), &entity.fields);
            }
        }
    }
    lines
}

fn push_hints(lines: &mut Vec<HintLine>, entity: Option<&str>, fields: &BTreeMap<String, FieldSpec>) {
    for (name, decl) in fields {
        if let Some(hint) = FieldHint::classify(name, &decl.field_type) {
            let field = match entity {
                Some(entity) => format!("{}.{}", entity, name),
                None => name.clone(),
            };
            lines.push(HintLine {
                field,
                guidance: hint.guidance(),
            });
        }
    }
}
