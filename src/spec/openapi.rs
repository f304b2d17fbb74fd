//! OpenAPI 3 compilation
//!
//! Derives one [`EndpointTest`] per supported operation, in document order.

use serde_json::{Map, Value};
use tracing::debug;

use super::resolve::Resolver;
use crate::error::{ForgeError, ForgeResult};
use crate::models::{AuthPolicy, EndpointTest, Expectation, HttpMethod, TestPlan};

/// Response schema name meaning "no body to check"
pub const EMPTY_RESPONSE_SCHEMA: &str = "EmptyResponse";

/// Token used when a bearer scheme is declared but no value is available
pub const PLACEHOLDER_TOKEN: &str = "dummy_token";

const MIN_MAJOR_VERSION: u32 = 3;
const JSON_MEDIA_TYPE: &str = "application/json";

/// Compile an OpenAPI document into a test plan
pub fn compile(document: &Value, environment: &str, token: Option<&str>) -> ForgeResult<TestPlan> {
    if !document.is_object() {
        return Err(ForgeError::invalid("contract document is not a mapping"));
    }
    check_version(document)?;

    let resolver = Resolver::new(document);
    let mut tests = Vec::new();

    if let Some(paths) = document.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            let item = resolver.resolve(item)?;
            let shared = item.get("parameters");

            for (key, operation) in item.as_object().into_iter().flatten() {
                let Ok(method) = key.parse::<HttpMethod>() else {
                    continue;
                };
                tests.push(operation_test(&resolver, path, method, operation, shared)?);
            }
        }
    }

    let base_url = select_server(document, environment);
    let auth = resolve_auth(&resolver, document, token)?;
    debug!(
        "Compiled {} operations against '{}' for environment '{}'",
        tests.len(),
        base_url,
        environment
    );

    Ok(TestPlan::new(base_url, auth, tests))
}

/// Reject documents older than OpenAPI 3
fn check_version(document: &Value) -> ForgeResult<()> {
    let version = ["openapi", "swagger"]
        .iter()
        .find_map(|key| document.get(*key))
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| ForgeError::invalid("document declares no openapi version"))?;

    let major = version
        .split('.')
        .next()
        .and_then(|m| m.trim().parse::<u32>().ok())
        .ok_or_else(|| ForgeError::invalid(format!("unrecognised openapi version '{version}'")))?;

    if major < MIN_MAJOR_VERSION {
        return Err(ForgeError::invalid(format!(
            "unsupported openapi version '{version}', {MIN_MAJOR_VERSION}.x or later is required"
        )));
    }
    Ok(())
}

fn operation_test<'a>(
    resolver: &Resolver<'a>,
    path: &str,
    method: HttpMethod,
    operation: &'a Value,
    shared_params: Option<&'a Value>,
) -> ForgeResult<EndpointTest> {
    let operation = resolver.resolve(operation)?;
    let expected_status = expected_status(operation);

    let mut test = EndpointTest::new(method.as_str(), path).expect_status(expected_status);
    test.params = parameters(resolver, shared_params, operation.get("parameters"))?;
    test.payload = payload(resolver, method, operation)?;
    test.expected_keys = expected_keys(resolver, operation, expected_status)?;

    Ok(test)
}

/// Lowest declared response code below 400, else 200
fn expected_status(operation: &Value) -> u16 {
    operation
        .get("responses")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|responses| responses.keys())
        .filter_map(|code| code.parse::<u16>().ok())
        .filter(|code| *code < 400)
        .min()
        .unwrap_or(200)
}

/// Query and path parameters with their schema examples
///
/// Path-item parameters come first; an operation parameter with the same
/// name and location replaces the shared one in place.
fn parameters<'a>(
    resolver: &Resolver<'a>,
    shared: Option<&'a Value>,
    own: Option<&'a Value>,
) -> ForgeResult<Map<String, Value>> {
    let mut merged: Vec<(String, String, Value)> = Vec::new();

    for list in [shared, own].into_iter().flatten() {
        for param in list.as_array().into_iter().flatten() {
            let param = resolver.resolve(param)?;
            let (Some(name), Some(location)) = (
                param.get("name").and_then(Value::as_str),
                param.get("in").and_then(Value::as_str),
            ) else {
                continue;
            };
            if location != "query" && location != "path" {
                continue;
            }
            let Some(schema) = resolver.child(param, "schema")? else {
                continue;
            };

            let example = schema.get("example").cloned().unwrap_or(Value::Null);
            match merged
                .iter_mut()
                .find(|(n, l, _)| n == name && l == location)
            {
                Some(slot) => slot.2 = example,
                None => merged.push((name.to_string(), location.to_string(), example)),
            }
        }
    }

    Ok(merged
        .into_iter()
        .map(|(name, _, example)| (name, example))
        .collect())
}

/// Request body built from property examples
fn payload<'a>(
    resolver: &Resolver<'a>,
    method: HttpMethod,
    operation: &'a Value,
) -> ForgeResult<Option<Value>> {
    let Some(body) = resolver.child(operation, "requestBody")? else {
        return Ok(None);
    };
    let Some(schema) = media_schema(resolver, body)? else {
        return Ok(None);
    };

    let mut fields = Map::new();
    for (name, property) in schema
        .get("properties")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
    {
        if let Some(example) = resolver.resolve(property)?.get("example") {
            fields.insert(name.clone(), example.clone());
        }
    }

    // The server assigns ids; updates must not send one back
    if method == HttpMethod::Put {
        fields.remove("id");
    }

    Ok((!fields.is_empty()).then_some(Value::Object(fields)))
}

/// Required keys of the response schema at `status`
fn expected_keys<'a>(
    resolver: &Resolver<'a>,
    operation: &'a Value,
    status: u16,
) -> ForgeResult<Expectation> {
    let Some(response) = operation
        .get("responses")
        .and_then(|r| r.get(status.to_string()))
    else {
        return Ok(Expectation::default());
    };
    let response = resolver.resolve(response)?;

    let Some(schema) = media_entry(response).and_then(|media| media.get("schema")) else {
        return Ok(Expectation::default());
    };
    if Resolver::ref_name(schema) == Some(EMPTY_RESPONSE_SCHEMA) {
        return Ok(Expectation::default());
    }

    let schema = resolver.resolve(schema)?;
    let required = match schema.get("type").and_then(Value::as_str) {
        Some("array") => match resolver.child(schema, "items")? {
            Some(items) => items.get("required"),
            None => None,
        },
        Some("object") => schema.get("required"),
        _ => None,
    };

    Ok(Expectation::keys(
        required
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str),
    ))
}

/// Media type entry of a request body or response, preferring JSON
fn media_entry(container: &Value) -> Option<&Value> {
    let content = container.get("content")?.as_object()?;
    content
        .get(JSON_MEDIA_TYPE)
        .or_else(|| content.values().next())
}

fn media_schema<'a>(resolver: &Resolver<'a>, container: &'a Value) -> ForgeResult<Option<&'a Value>> {
    match media_entry(container) {
        Some(media) => resolver.child(media, "schema"),
        None => Ok(None),
    }
}

/// First server whose description starts with the environment name,
/// else the first server, else empty
fn select_server(document: &Value, environment: &str) -> String {
    let servers: Vec<&Value> = document
        .get("servers")
        .and_then(Value::as_array)
        .map(|s| s.iter().collect())
        .unwrap_or_default();

    let environment = environment.to_lowercase();
    servers
        .iter()
        .find(|server| {
            server
                .get("description")
                .and_then(Value::as_str)
                .map(|d| d.to_lowercase().starts_with(&environment))
                .unwrap_or(false)
        })
        .or_else(|| servers.first())
        .and_then(|server| server.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Bearer header for the first bearer scheme named by the document's
/// security requirements
fn resolve_auth<'a>(
    resolver: &Resolver<'a>,
    document: &'a Value,
    token: Option<&str>,
) -> ForgeResult<AuthPolicy> {
    let requirements = match document.get("security").and_then(Value::as_array) {
        Some(reqs) if !reqs.is_empty() => reqs,
        _ => return Ok(AuthPolicy::new()),
    };
    let schemes = document
        .get("components")
        .and_then(|c| c.get("securitySchemes"));

    let names = requirements
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|req| req.keys());

    for name in names {
        let Some(scheme) = schemes.and_then(|s| s.get(name)) else {
            continue;
        };
        let scheme = resolver.resolve(scheme)?;
        let is_bearer = scheme.get("type").and_then(Value::as_str) == Some("http")
            && scheme
                .get("scheme")
                .and_then(Value::as_str)
                .map(|s| s.eq_ignore_ascii_case("bearer"))
                .unwrap_or(false);
        if !is_bearer {
            continue;
        }

        let value = token
            .or_else(|| scheme.get("bearerFormat").and_then(Value::as_str))
            .unwrap_or(PLACEHOLDER_TOKEN);
        return Ok(AuthPolicy::bearer(value));
    }

    Ok(AuthPolicy::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::ExpectedKey;
    use serde_json::json;

    fn posts_document() -> Value {
        json!({
            "openapi": "3.0.3",
            "servers": [
                {"url": "https://staging.example.com", "description": "Staging server"},
                {"url": "https://api.example.com", "description": "Prod server"}
            ],
            "security": [{"bearerAuth": []}],
            "paths": {
                "/posts": {
                    "get": {
                        "parameters": [
                            {"name": "userId", "in": "query", "schema": {"type": "integer", "example": 1}},
                            {"name": "X-Trace", "in": "header", "schema": {"type": "string"}}
                        ],
                        "responses": {
                            "200": {
                                "description": "ok",
                                "content": {"application/json": {"schema": {
                                    "type": "array",
                                    "items": {"$ref": "#/components/schemas/Post"}
                                }}}
                            }
                        }
                    },
                    "post": {
                        "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/NewPost"}}}},
                        "responses": {
                            "201": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Post"}}}},
                            "400": {"description": "bad"}
                        }
                    }
                },
                "/posts/{id}": {
                    "parameters": [
                        {"$ref": "#/components/parameters/PostId"}
                    ],
                    "put": {
                        "requestBody": {"content": {"application/json": {"schema": {
                            "type": "object",
                            "properties": {
                                "id": {"type": "integer", "example": 1},
                                "title": {"type": "string", "example": "foo"},
                                "body": {"type": "string"}
                            }
                        }}}},
                        "responses": {"200": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Post"}}}}}
                    },
                    "delete": {
                        "parameters": [
                            {"name": "id", "in": "path", "schema": {"type": "integer", "example": 42}}
                        ],
                        "responses": {
                            "204": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/EmptyResponse"}}}},
                            "404": {"description": "missing"}
                        }
                    },
                    "trace": {"responses": {"200": {"description": "ok"}}},
                    "summary": "Single post"
                }
            },
            "components": {
                "parameters": {
                    "PostId": {"name": "id", "in": "path", "required": true, "schema": {"type": "integer", "example": 1}}
                },
                "schemas": {
                    "Post": {
                        "type": "object",
                        "required": ["id", "title"],
                        "properties": {"id": {"type": "integer"}, "title": {"type": "string"}}
                    },
                    "NewPost": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string", "example": "foo"},
                            "body": {"type": "string", "example": "bar"},
                            "userId": {"type": "integer", "example": 1},
                            "draft": {"type": "boolean"}
                        }
                    },
                    "EmptyResponse": {"type": "object"}
                },
                "securitySchemes": {
                    "bearerAuth": {"type": "http", "scheme": "bearer", "bearerFormat": "JWT"}
                }
            }
        })
    }

    #[test]
    fn test_operations_in_document_order() {
        let plan = compile(&posts_document(), "prod", None).unwrap();
        let summary: Vec<_> = plan.tests.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            summary,
            vec!["GET /posts", "POST /posts", "PUT /posts/{id}", "DELETE /posts/{id}"]
        );
    }

    #[test]
    fn test_expected_status() {
        let plan = compile(&posts_document(), "prod", None).unwrap();
        let statuses: Vec<_> = plan.tests.iter().map(|t| t.expected_status).collect();
        assert_eq!(statuses, vec![200, 201, 200, 204]);
    }

    #[test]
    fn test_params_from_schema_examples() {
        let plan = compile(&posts_document(), "prod", None).unwrap();

        let get = &plan.tests[0];
        assert_eq!(get.params.len(), 1);
        assert_eq!(get.params["userId"], json!(1));

        // shared path-item parameter, resolved through $ref
        assert_eq!(plan.tests[2].params["id"], json!(1));
        // overridden by the operation's own declaration
        assert_eq!(plan.tests[3].params["id"], json!(42));
        assert_eq!(plan.tests[3].params.len(), 1);
    }

    #[test]
    fn test_param_without_example_is_null() {
        let doc = json!({
            "openapi": "3.1.0",
            "paths": {"/search": {"get": {
                "parameters": [{"name": "q", "in": "query", "schema": {"type": "string"}}],
                "responses": {"200": {"description": "ok"}}
            }}}
        });
        let plan = compile(&doc, "prod", None).unwrap();
        assert_eq!(plan.tests[0].params["q"], Value::Null);
    }

    #[test]
    fn test_payload_from_examples() {
        let plan = compile(&posts_document(), "prod", None).unwrap();
        assert_eq!(
            plan.tests[1].payload,
            Some(json!({"title": "foo", "body": "bar", "userId": 1}))
        );
        assert_eq!(plan.tests[0].payload, None);
    }

    #[test]
    fn test_put_payload_drops_id() {
        let plan = compile(&posts_document(), "prod", None).unwrap();
        assert_eq!(plan.tests[2].payload, Some(json!({"title": "foo"})));
    }

    #[test]
    fn test_payload_without_examples_is_none() {
        let doc = json!({
            "openapi": "3.0.0",
            "paths": {"/things/{id}": {"put": {
                "requestBody": {"content": {"application/json": {"schema": {
                    "type": "object",
                    "properties": {"id": {"type": "integer", "example": 3}, "name": {"type": "string"}}
                }}}},
                "responses": {"200": {"description": "ok"}}
            }}}
        });
        let plan = compile(&doc, "prod", None).unwrap();
        assert_eq!(plan.tests[0].payload, None);
    }

    #[test]
    fn test_expected_keys() {
        let plan = compile(&posts_document(), "prod", None).unwrap();
        let keys = Expectation::keys(["id", "title"]);

        // array of $ref items
        assert_eq!(plan.tests[0].expected_keys, keys);
        // object via $ref
        assert_eq!(plan.tests[1].expected_keys, keys);
        // empty response marker
        assert!(plan.tests[3].expected_keys.is_empty());
    }

    #[test]
    fn test_expected_keys_missing_response_schema() {
        let doc = json!({
            "openapi": "3.0.0",
            "paths": {"/health": {"get": {"responses": {"200": {"description": "ok"}}}}}
        });
        let plan = compile(&doc, "prod", None).unwrap();
        assert!(plan.tests[0].expected_keys.is_empty());
        assert!(matches!(plan.tests[0].expected_keys.entries(), []));
    }

    #[test]
    fn test_non_json_media_type_is_used() {
        let doc = json!({
            "openapi": "3.0.0",
            "paths": {"/items": {"get": {"responses": {"200": {"content": {
                "application/vnd.items+json": {"schema": {"type": "object", "required": ["items"]}}
            }}}}}}
        });
        let plan = compile(&doc, "prod", None).unwrap();
        assert_eq!(
            plan.tests[0].expected_keys.entries(),
            &[ExpectedKey::Key("items".to_string())]
        );
    }

    #[test]
    fn test_server_selection() {
        let doc = posts_document();
        assert_eq!(
            compile(&doc, "staging", None).unwrap().base_url,
            "https://staging.example.com"
        );
        assert_eq!(
            compile(&doc, "PROD", None).unwrap().base_url,
            "https://api.example.com"
        );
        assert_eq!(
            compile(&doc, "qa", None).unwrap().base_url,
            "https://staging.example.com"
        );

        let bare = json!({"openapi": "3.0.0", "paths": {}});
        assert_eq!(compile(&bare, "prod", None).unwrap().base_url, "");
    }

    #[test]
    fn test_bearer_auth_resolution() {
        let doc = posts_document();
        let header = |plan: TestPlan| plan.auth.headers.get("Authorization").cloned();

        assert_eq!(
            header(compile(&doc, "prod", Some("env-token")).unwrap()),
            Some("Bearer env-token".to_string())
        );
        assert_eq!(
            header(compile(&doc, "prod", None).unwrap()),
            Some("Bearer JWT".to_string())
        );

        let mut no_format = doc.clone();
        no_format["components"]["securitySchemes"]["bearerAuth"]
            .as_object_mut()
            .unwrap()
            .remove("bearerFormat");
        assert_eq!(
            header(compile(&no_format, "prod", None).unwrap()),
            Some(format!("Bearer {PLACEHOLDER_TOKEN}"))
        );
    }

    #[test]
    fn test_no_security_means_no_auth() {
        let mut doc = posts_document();
        doc.as_object_mut().unwrap().remove("security");
        assert!(compile(&doc, "prod", Some("tok")).unwrap().auth.is_empty());
    }

    #[test]
    fn test_legacy_versions_rejected() {
        for doc in [
            json!({"openapi": "2.0", "paths": {}}),
            json!({"swagger": "2.0", "paths": {}}),
            json!({"paths": {}}),
            json!({"openapi": "three", "paths": {}}),
        ] {
            let err = compile(&doc, "prod", None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SpecInvalid, "{doc}");
        }
    }

    #[test]
    fn test_not_a_mapping() {
        let err = compile(&json!(["openapi"]), "prod", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SpecInvalid);
    }

    #[test]
    fn test_unresolvable_schema_reference() {
        let doc = json!({
            "openapi": "3.0.0",
            "paths": {"/a": {"post": {
                "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Missing"}}}},
                "responses": {"201": {"description": "ok"}}
            }}}
        });
        assert_eq!(
            compile(&doc, "prod", None).unwrap_err().kind(),
            ErrorKind::SpecInvalid
        );
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let doc = posts_document();
        assert_eq!(
            compile(&doc, "staging", Some("t")).unwrap(),
            compile(&doc, "staging", Some("t")).unwrap()
        );
    }
}
