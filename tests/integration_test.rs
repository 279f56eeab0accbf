use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use swaggen::cli::{self, CliArgs};
use swaggen::error::Error;
use tempfile::TempDir;

const MAIN: &str = include_str!("fixtures/store/main.rs");
const MODELS: &str = include_str!("fixtures/store/models.rs");
const USERS: &str = include_str!("fixtures/store/users.rs");

/// Helper function to create a temporary test project
fn create_test_project(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn store_project() -> TempDir {
    create_test_project(&[
        ("src/main.rs", MAIN),
        ("src/models.rs", MODELS),
        ("src/users.rs", USERS),
    ])
}

fn cli_args(project: &TempDir, extra: &[&str]) -> CliArgs {
    let project_path = project.path().to_string_lossy().into_owned();
    let mut argv = vec!["swaggen", project_path.as_str()];
    argv.extend_from_slice(extra);
    CliArgs::parse_from(argv)
}

fn generate_json(project: &TempDir, extra: &[&str]) -> Value {
    let document = cli::generate(&cli_args(project, extra)).expect("Failed to generate document");
    serde_json::to_value(&document).expect("Failed to convert document")
}

#[test]
fn test_actix_end_to_end_generation() {
    let project = store_project();
    let doc = generate_json(&project, &["--title", "Store API"]);

    assert_eq!(doc["openapi"], "3.0.1");
    assert_eq!(doc["info"], json!({ "title": "Store API", "version": "1.0.0" }));

    let paths: Vec<&String> = doc["paths"].as_object().unwrap().keys().collect();
    assert_eq!(paths, vec!["/users", "/users/{id}"]);

    let list = &doc["paths"]["/users"]["get"];
    assert_eq!(list["operationId"], "GetUsers");
    assert_eq!(list["tags"], json!(["users"]));
    assert_eq!(list["summary"], "List users");
    assert_eq!(list["description"], "Results are paged.");
    assert_eq!(
        list["parameters"],
        json!([
            {
                "name": "page",
                "in": "query",
                "required": false,
                "schema": { "type": "integer", "format": "int32" }
            },
            {
                "name": "tags",
                "in": "query",
                "required": false,
                "style": "form",
                "explode": true,
                "schema": { "type": "array", "items": { "type": "string" } }
            }
        ])
    );
    assert_eq!(
        list["responses"]["200"]["content"]["application/json"]["schema"],
        json!({ "type": "array", "items": { "$ref": "#/components/schemas/User" } })
    );

    let create = &doc["paths"]["/users"]["post"];
    assert_eq!(
        create["requestBody"],
        json!({
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/CreateUserRequest" }
                }
            },
            "required": true
        })
    );
    assert_eq!(create["responses"], json!({ "200": { "description": "Success" } }));

    let get = &doc["paths"]["/users/{id}"]["get"];
    assert_eq!(get["operationId"], "GetUsersById");
    assert_eq!(get["parameters"][0]["in"], "path");
    assert_eq!(get["parameters"][0]["required"], true);

    let delete = &doc["paths"]["/users/{id}"]["delete"];
    assert_eq!(delete["deprecated"], true);

    assert_eq!(doc["tags"], json!([{ "name": "users" }]));
}

#[test]
fn test_definitions_follow_types_across_modules() {
    let project = store_project();
    let doc = generate_json(&project, &[]);

    let schemas = &doc["components"]["schemas"];
    let names: Vec<&String> = schemas.as_object().unwrap().keys().collect();
    assert_eq!(names, vec!["CreateUserRequest", "Role", "User"]);

    let user = &schemas["User"];
    assert_eq!(user["type"], "object");
    assert_eq!(user["description"], "A registered user");
    assert_eq!(user["required"], json!(["id", "name", "role"]));
    assert_eq!(
        user["properties"]["email"],
        json!({ "type": "string", "description": "Contact address", "nullable": true })
    );
    assert_eq!(user["properties"]["role"], json!({ "$ref": "#/components/schemas/Role" }));
    assert_eq!(
        user["properties"]["manager"],
        json!({ "$ref": "#/components/schemas/User" })
    );

    assert_eq!(schemas["Role"], json!({ "type": "string", "enum": ["Admin", "Member"] }));
}

#[test]
fn test_conflicting_routes_need_a_resolver() {
    let duplicate = r#"
        use actix_web::{get, HttpResponse};

        #[get("/users")]
        pub async fn list_all_users() -> HttpResponse {
            HttpResponse::Ok().finish()
        }
    "#;
    let project = create_test_project(&[
        ("src/main.rs", MAIN),
        ("src/models.rs", MODELS),
        ("src/users.rs", USERS),
        ("src/users_v0.rs", duplicate),
    ]);

    let err = cli::generate(&cli_args(&project, &[])).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("GET /users"), "{}", message);
    assert!(message.contains("users::list_users"), "{}", message);
    assert!(message.contains("users_v0::list_all_users"), "{}", message);
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::ConflictingActions { .. })
    ));

    let doc = generate_json(&project, &["--resolve-conflicts"]);
    assert_eq!(doc["paths"]["/users"]["get"]["tags"], json!(["users"]));
}

#[test]
fn test_config_file_selects_documents() {
    let project = store_project();
    let config_path = project.path().join("swaggen.yaml");
    std::fs::write(
        &config_path,
        r#"
documents:
  public:
    title: Public API
    version: "2.0"
    include_paths: [/users]
  empty:
    title: Nothing
    version: "1.0"
    include_groups: [admin]
ignore_obsolete_actions: true
security_schemes:
  bearer:
    type: http
    scheme: bearer
security:
  - bearer: []
tag_descriptions:
  users: User accounts
"#,
    )
    .unwrap();
    let config = config_path.to_string_lossy().into_owned();

    let doc = generate_json(&project, &["-c", &config, "-d", "public"]);
    assert_eq!(doc["info"]["title"], "Public API");
    assert!(doc["paths"]["/users/{id}"].get("delete").is_none());
    assert_eq!(
        doc["components"]["securitySchemes"]["bearer"],
        json!({ "type": "http", "scheme": "bearer" })
    );
    assert_eq!(doc["security"], json!([{ "bearer": [] }]));
    assert_eq!(
        doc["tags"],
        json!([{ "name": "users", "description": "User accounts" }])
    );

    let doc = generate_json(&project, &["-c", &config, "-d", "empty"]);
    assert_eq!(doc["paths"], json!({}));

    let err = cli::generate(&cli_args(&project, &["-c", &config, "-d", "v1"])).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Unknown Swagger document - \"v1\""), "{}", message);
}

#[test]
fn test_run_writes_output_file() {
    let project = store_project();
    let output = project.path().join("out").join("openapi.json");
    let output_arg = output.to_string_lossy().into_owned();

    cli::run(cli_args(&project, &["-f", "json", "-o", &output_arg])).unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let doc: Value = serde_json::from_str(&content).unwrap();
    assert!(doc["paths"]["/users"]["get"].is_object());

    let yaml_output = project.path().join("openapi.yaml");
    let yaml_arg = yaml_output.to_string_lossy().into_owned();
    cli::run(cli_args(&project, &["-o", &yaml_arg, "--full-type-names"])).unwrap();

    let yaml = std::fs::read_to_string(&yaml_output).unwrap();
    assert!(yaml.contains("models.User:"), "{}", yaml);
}
