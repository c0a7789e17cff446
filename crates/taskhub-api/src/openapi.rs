// SPDX-License-Identifier: Apache-2.0

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiRoute {
    pub method: &'static str,
    pub path: &'static str,
    pub summary: &'static str,
    pub authenticated: bool,
}

const fn route(method: &'static str, path: &'static str, summary: &'static str) -> ApiRoute {
    ApiRoute {
        method,
        path,
        summary,
        authenticated: true,
    }
}

const fn public(method: &'static str, path: &'static str, summary: &'static str) -> ApiRoute {
    ApiRoute {
        method,
        path,
        summary,
        authenticated: false,
    }
}

pub const API_ROUTES: &[ApiRoute] = &[
    public("get", "/health", "liveness probe"),
    public("get", "/api/openapi.json", "route contract"),
    public("post", "/api/register", "create an account"),
    public("post", "/api/login", "exchange credentials for a bearer token"),
    route("get", "/api/me", "current user"),
    route("get", "/api/users/search", "search users"),
    route("put", "/api/profile", "update own profile"),
    route("get", "/api/tasks", "list personal tasks"),
    route("post", "/api/tasks", "create a personal task"),
    route("get", "/api/tasks/{id}", "get a task"),
    route("put", "/api/tasks/{id}", "update a personal task"),
    route("delete", "/api/tasks/{id}", "delete a personal task"),
    route("get", "/api/tasks/{id}/progress", "get personal progress"),
    route("put", "/api/tasks/{id}/progress", "set personal progress"),
    route("get", "/api/tasks/{id}/files", "list task files"),
    route("post", "/api/tasks/{id}/files", "upload a file (multipart field `file`)"),
    route("get", "/api/files/{id}", "download a file"),
    route("delete", "/api/files/{id}", "delete a file"),
    route("get", "/api/groups", "list accepted groups"),
    route("post", "/api/groups", "create a group"),
    route("get", "/api/groups/search", "search groups"),
    route("get", "/api/groups/{id}", "get a group with members"),
    route("put", "/api/groups/{id}", "update a group"),
    route("delete", "/api/groups/{id}", "delete a group"),
    route("post", "/api/groups/{id}/members", "invite members"),
    route("delete", "/api/groups/{id}/members/{user_id}", "remove a member"),
    route("post", "/api/groups/{id}/members/{user_id}/accept", "accept an invitation"),
    route("get", "/api/groups/{id}/tasks", "list group tasks"),
    route("post", "/api/groups/{id}/tasks", "create a group task"),
    route("put", "/api/groups/{id}/tasks/{task_id}", "update a group task"),
    route("delete", "/api/groups/{id}/tasks/{task_id}", "delete a group task"),
    route("get", "/api/groups/{id}/tasks/{task_id}/progress", "list member progress"),
    route("put", "/api/groups/{id}/tasks/{task_id}/progress", "report own progress"),
    route("get", "/api/groups/{id}/tasks/{task_id}/progress/me", "own progress row"),
    route(
        "put",
        "/api/groups/{id}/tasks/{task_id}/members/{user_id}/progress",
        "admin sets member progress",
    ),
    route("get", "/api/groups/{id}/tasks/{task_id}/files", "files uploaded by one member"),
    route("post", "/api/groups/{id}/files/{file_id}/approve", "approve a file"),
    route("get", "/api/notifications", "list notifications"),
    route("put", "/api/notifications/{id}/read", "mark a notification read"),
    route("delete", "/api/notifications/{id}", "delete a notification"),
    route("get", "/api/analytics/streak", "activity streak"),
    route("get", "/api/analytics/summary", "task summary"),
];

#[must_use]
pub fn openapi_v1_spec() -> Value {
    let mut paths = Map::new();
    for r in API_ROUTES {
        let entry = paths
            .entry(r.path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let mut op = json!({
            "summary": r.summary,
            "responses": {
                "200": {"description": "ok"},
                "default": {"description": "error envelope", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorEnvelope"}}}}
            }
        });
        if r.authenticated {
            op["security"] = json!([{"bearer": []}]);
        }
        if let Value::Object(ops) = entry {
            ops.insert(r.method.to_string(), op);
        }
    }
    json!({
      "openapi": "3.0.3",
      "info": {"title": "taskhub API", "version": "v1"},
      "paths": paths,
      "components": {
        "securitySchemes": {"bearer": {"type": "http", "scheme": "bearer", "bearerFormat": "JWT"}},
        "schemas": {
          "ApiErrorCode": {
            "type": "string",
            "enum": ["NotFound", "Forbidden", "ValidationFailed", "QuotaExceeded", "Unauthorized", "Conflict", "PayloadTooLarge", "Internal"]
          },
          "ErrorEnvelope": {
            "type": "object",
            "required": ["success", "error", "code"],
            "properties": {
              "success": {"type": "boolean"},
              "error": {"type": "string"},
              "code": {"$ref": "#/components/schemas/ApiErrorCode"}
            }
          }
        }
      }
    })
}
