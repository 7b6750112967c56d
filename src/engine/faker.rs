//! Offline generation backend.
//!
//! Builds records locally from the declared structure using field-name hints,
//! so the generate pipeline works without any external service.

use chrono::{Duration, NaiveDate};
use fake::faker::company::en::Profession;
use fake::faker::internet::en::FreeEmailProvider;
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::prompt::FieldHint;
use crate::domain::{ApiShape, FieldSpec, FieldStructure, FieldType};

/// Produce a raw dataset for `shape` with `count` records per collection.
pub fn fake_dataset(shape: ApiShape, structure: &FieldStructure, count: u32) -> Value {
    match shape {
        ApiShape::Flat => fake_records(&structure.fields, count),
        ApiShape::Relational => fake_collections(shape, structure, count),
        ApiShape::Graph => json!({ "data": fake_collections(shape, structure, count) }),
    }
}

fn fake_collections(shape: ApiShape, structure: &FieldStructure, count: u32) -> Value {
    Value::Object(
        structure
            .collections(shape)
            .iter()
            .map(|entity| (entity.name.clone(), fake_records(&entity.fields, count)))
            .collect(),
    )
}

fn fake_records(fields: &BTreeMap<String, FieldSpec>, count: u32) -> Value {
    let mut rng = rand::thread_rng();
    let records = (1..=count)
        .map(|index| {
            let person = Person::random();
            let record: Map<String, Value> = fields
                .iter()
                .map(|(name, decl)| {
                    let value = fake_value(&mut rng, name, &decl.field_type, index, count, &person);
                    (name.clone(), value)
                })
                .collect();
            Value::Object(record)
        })
        .collect();
    Value::Array(records)
}

/// One invented person per record so that name and email fields agree.
struct Person {
    first: String,
    last: String,
}

impl Person {
    fn random() -> Self {
        Self {
            first: FirstName().fake(),
            last: LastName().fake(),
        }
    }

    fn email(&self) -> String {
        let domain: String = FreeEmailProvider().fake();
        format!(
            "{}.{}@{}",
            ascii_slug(&self.first),
            ascii_slug(&self.last),
            domain
        )
    }
}

fn ascii_slug(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn fake_value(
    rng: &mut impl Rng,
    name: &str,
    field_type: &FieldType,
    index: u32,
    count: u32,
    person: &Person,
) -> Value {
    if name.eq_ignore_ascii_case("id") {
        return match field_type {
            FieldType::String => json!(uuid::Uuid::new_v4().to_string()),
            _ => json!(index),
        };
    }

    if let Some(hint) = FieldHint::classify(name, field_type) {
        return match hint {
            FieldHint::FullName => json!(format!("{} {}", person.first, person.last)),
            FieldHint::FirstName => json!(person.first),
            FieldHint::LastName => json!(person.last),
            FieldHint::Email => json!(person.email()),
            FieldHint::JobTitle => json!(Profession().fake::<String>()),
            FieldHint::Date => json!(random_date(rng)),
        };
    }

    match field_type {
        FieldType::String if is_free_text(name) => json!(Sentence(4..10).fake::<String>()),
        FieldType::String => json!(Word().fake::<String>()),
        FieldType::Number if is_foreign_key(name) => json!(rng.gen_range(1..=count.max(1))),
        FieldType::Number => json!(rng.gen_range(1..=1000)),
        FieldType::Boolean => json!(rng.gen_bool(0.5)),
        FieldType::Date => json!(random_date(rng)),
        FieldType::Id => json!(index),
        FieldType::Reference(_) => json!(rng.gen_range(1..=count.max(1))),
    }
}

fn is_free_text(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["description", "content", "body", "bio", "summary", "comment"]
        .iter()
        .any(|k| lower.contains(k))
}

fn is_foreign_key(name: &str) -> bool {
    name.ends_with("Id") || name.ends_with("_id")
}

fn random_date(rng: &mut impl Rng) -> String {
    let offset = Duration::days(rng.gen_range(0..3650));
    NaiveDate::from_ymd_opt(2015, 1, 1)
        .and_then(|base| base.checked_add_signed(offset))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "2015-01-01".to_string())
}
