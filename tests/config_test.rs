use mimic::cli::Cli;
use mimic::config::{ProviderKind, Settings};
use mimic::domain::ApiShape;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_external_configs() -> anyhow::Result<()> {
    // Create a temporary directory
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    fs::create_dir_all(root.join("config/apis"))?;

    // Create mimic.toml
    let mimic_toml = r#"
[server]
host = "127.0.0.1"
port = 4000

[generator]
provider = "faker"
default_count = 5
max_count = 50
"#;
    fs::write(root.join("mimic.toml"), mimic_toml)?;

    // A flat API in JSON
    let people_json = r#"
{
    "id": "people",
    "name": "People",
    "type": "SIMPLE",
    "structure": { "fields": { "name": { "type": "string" }, "email": { "type": "string" } } },
    "endpoints": [{ "path": "/people", "method": "GET", "response": [{ "name": "Ada" }] }],
    "dataset": [{ "name": "Ada", "email": "ada@example.com" }]
}
"#;
    fs::write(root.join("config/apis/people.json"), people_json)?;

    // A relational API in YAML
    let blog_yaml = r#"
id: blog
name: Blog
type: RELATIONAL
structure:
  entities:
    - name: users
      fields:
        name: { type: string }
      relations:
        posts: { type: oneToMany, target: posts }
    - name: posts
      fields:
        title: { type: string }
        userId: { type: number }
"#;
    fs::write(root.join("config/apis/blog.yaml"), blog_yaml)?;

    // A graph API in TOML
    let library_toml = r#"
id = "library"
name = "Library"
type = "GRAPHQL"

[[structure.types]]
name = "Book"
fields = { title = { type = "string" } }
"#;
    fs::write(root.join("config/apis/library.toml"), library_toml)?;

    // Files with other extensions are ignored
    fs::write(root.join("config/apis/README.md"), "# seeds")?;

    // Load settings
    let settings = Settings::from_root(root.to_str().unwrap())?;

    assert_eq!(settings.server.port, 4000);
    assert_eq!(settings.generator.provider, ProviderKind::Faker);
    assert_eq!(settings.generator.default_count, 5);
    assert_eq!(settings.generator.max_count, 50);
    assert_eq!(settings.generator.temperature, 0.7);

    assert_eq!(settings.apis.len(), 3);
    let shapes: Vec<(String, ApiShape)> = settings
        .apis
        .iter()
        .map(|seed| {
            (
                seed.definition.id.clone().unwrap_or_default(),
                seed.definition.shape,
            )
        })
        .collect();
    assert!(shapes.contains(&("people".to_string(), ApiShape::Flat)));
    assert!(shapes.contains(&("blog".to_string(), ApiShape::Relational)));
    assert!(shapes.contains(&("library".to_string(), ApiShape::Graph)));

    let blog = settings
        .apis
        .iter()
        .find(|seed| seed.definition.id.as_deref() == Some("blog"))
        .unwrap();
    assert!(blog.definition.structure.entities[1].fields.contains_key("userId"));

    Ok(())
}

#[test]
fn test_defaults_without_config_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = Settings::from_root(temp_dir.path().to_str().unwrap())?;

    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 3000);
    assert!(!settings.auth.enabled);
    assert_eq!(settings.generator.provider, ProviderKind::Faker);
    assert_eq!(settings.generator.max_count, 100);
    assert!(!settings.generator.retry.enabled);
    assert!(settings.apis.is_empty());

    Ok(())
}

#[test]
fn test_invalid_seed_fails_validation() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("config/apis"))?;

    let broken = r#"
{
    "id": "broken",
    "name": "Broken",
    "type": "SIMPLE",
    "structure": { "fields": { "name": { "type": "string" } } },
    "endpoints": [{ "path": "people", "method": "GET", "response": [] }],
    "dataset": { "name": "not a list" }
}
"#;
    fs::write(root.join("config/apis/broken.json"), broken)?;

    let err = Settings::from_root(root.to_str().unwrap()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Configuration validation failed"));
    assert!(message.contains("broken.endpoints[0]"));
    assert!(message.contains("broken.dataset"));

    Ok(())
}

#[test]
fn test_cli_overrides_config_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    let config_path = root.join("mimic.toml");
    fs::write(
        &config_path,
        r#"
[server]
host = "127.0.0.1"
port = 3000

[generator]
provider = "openai"
model = "gpt-4o"
"#,
    )?;

    let cli = Cli {
        config: config_path,
        host: Some("0.0.0.0".to_string()),
        port: Some(8080),
        provider: Some(ProviderKind::Anthropic),
        model: None,
    };
    let settings = Settings::new_with_cli(&cli)?;

    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.generator.provider, ProviderKind::Anthropic);
    assert_eq!(settings.generator.model.as_deref(), Some("gpt-4o"));

    Ok(())
}
