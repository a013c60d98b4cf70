mod common;

use axum::{
    Router,
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE},
    },
};
use axum_catalog_api::routes::create_api_router;
use common::{ADMIN_EMAIL, ADMIN_PASSWORD, TestContext, png_bytes, setup};
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "catalog-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, Vec<u8>),
}

fn multipart_body(parts: Vec<Part<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

struct Client {
    app: Router,
    _ctx: TestContext,
    admin_token: String,
    viewer_token: String,
}

impl Client {
    async fn new() -> anyhow::Result<Self> {
        let ctx = setup().await?;
        let admin_token = ctx.state.gate.issue_token(ADMIN_EMAIL, "admin")?;
        let viewer_token = ctx.state.gate.issue_token(ADMIN_EMAIL, "viewer")?;
        let app = create_api_router().with_state(ctx.state.clone());
        Ok(Self {
            app,
            _ctx: ctx,
            admin_token,
            viewer_token,
        })
    }

    async fn send(&self, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
        let (status, _, body) = self.send_raw(request).await?;
        Ok((status, body))
    }

    async fn send_raw(
        &self,
        request: Request<Body>,
    ) -> anyhow::Result<(StatusCode, axum::http::HeaderMap, Value)> {
        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok((status, headers, body))
    }

    fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        parts: Vec<Part<'_>>,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(multipart_body(parts))).unwrap()
    }

    fn admin(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.admin_token))
    }

    async fn create_torta(&self) -> anyhow::Result<Value> {
        let request = self.multipart(
            Method::POST,
            "/productos/",
            Some(&self.admin_token),
            vec![
                Part::Text("nombre", "Torta"),
                Part::Text("precio", "10.0"),
                Part::Text("categoria", "postres"),
            ],
        );
        let (status, body) = self.send(request).await?;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        Ok(body)
    }
}

#[tokio::test]
async fn multipart_create_returns_created_product() -> anyhow::Result<()> {
    let client = Client::new().await?;

    let body = client.create_torta().await?;
    assert_eq!(body["id"], 1);
    assert_eq!(body["nombre"], "Torta");
    assert_eq!(body["precio"], 10.0);
    assert_eq!(body["categoria"], "postres");
    assert_eq!(body["disponible"], 1);
    assert_eq!(body["descripcion"], Value::Null);
    assert_eq!(body["creado_por"], ADMIN_EMAIL);
    assert_eq!(body["imagenes"], json!([]));

    // Both spellings of the collection route are served.
    for uri in ["/productos", "/productos/"] {
        let request = Request::builder().uri(uri).body(Body::empty())?;
        let (status, list) = client.send(request).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["total"], 1);
        assert_eq!(list["productos"][0]["nombre"], "Torta");
    }
    Ok(())
}

#[tokio::test]
async fn multipart_upload_reports_urls_in_order() -> anyhow::Result<()> {
    let client = Client::new().await?;
    client.create_torta().await?;

    let request = client.multipart(
        Method::POST,
        "/productos/1/imagenes",
        Some(&client.admin_token),
        vec![
            Part::File("imagenes", "a.png", png_bytes(12, 12, false)),
            Part::File("imagenes", "b.png", png_bytes(12, 12, true)),
            Part::Text("ignored", "text fields carry no file"),
        ],
    );
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "2 image(s) uploaded successfully");
    let urls = body["detail"]["urls"].as_array().cloned().unwrap_or_default();
    assert_eq!(urls.len(), 2);
    for url in &urls {
        let url = url.as_str().unwrap();
        assert!(url.starts_with("/media/products/1/") && url.ends_with(".png"));
    }

    let request = Request::builder().uri("/productos/1").body(Body::empty())?;
    let (status, product) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK);
    let images = product["imagenes"].as_array().cloned().unwrap_or_default();
    let orders: Vec<i64> = images.iter().filter_map(|i| i["orden"].as_i64()).collect();
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(images[0]["url_imagen"], urls[0]);
    assert_eq!(images[0]["producto_id"], 1);

    let image_id = images[0]["id"].as_i64().unwrap();
    let request = client
        .admin(Method::DELETE, &format!("/productos/1/imagenes/{image_id}"))
        .body(Body::empty())?;
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"]["imagen_id"], image_id);
    Ok(())
}

#[tokio::test]
async fn upload_to_missing_product_is_404_before_file_checks() -> anyhow::Result<()> {
    let client = Client::new().await?;

    let request = client.multipart(
        Method::POST,
        "/productos/77/imagenes",
        Some(&client.admin_token),
        vec![Part::File("imagenes", "a.gif", vec![1, 2, 3])],
    );
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
    assert_eq!(body["detail"], "Product not found");
    Ok(())
}

#[tokio::test]
async fn put_applies_partial_updates() -> anyhow::Result<()> {
    let client = Client::new().await?;
    let created = client.create_torta().await?;

    let request = client
        .admin(Method::PUT, "/productos/1")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("precio=12"))?;
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["precio"], 12.0);
    assert_eq!(body["nombre"], created["nombre"]);

    let request = client.multipart(
        Method::PUT,
        "/productos/1",
        Some(&client.admin_token),
        vec![Part::Text("disponible", "0")],
    );
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["disponible"], 0);
    assert_eq!(body["precio"], 12.0);

    // No body and no content type is an empty patch.
    let request = client.admin(Method::PUT, "/productos/1").body(Body::empty())?;
    let (status, unchanged) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK, "{unchanged}");
    assert_eq!(unchanged, body);

    let request = client.admin(Method::PUT, "/productos/999").body(Body::empty())?;
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let request = client
        .admin(Method::PUT, "/productos/1")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("precio=-1"))?;
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
    Ok(())
}

#[tokio::test]
async fn delete_reports_product_id_then_404() -> anyhow::Result<()> {
    let client = Client::new().await?;
    client.create_torta().await?;

    let request = client.admin(Method::DELETE, "/productos/1").body(Body::empty())?;
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"]["producto_id"], 1);
    assert!(body["message"].is_string());

    let request = client.admin(Method::DELETE, "/productos/1").body(Body::empty())?;
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Product not found");

    let request = Request::builder().uri("/productos/1").body(Body::empty())?;
    let (status, _) = client.send(request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn mutations_require_an_admin_token() -> anyhow::Result<()> {
    let client = Client::new().await?;
    let parts = || {
        vec![
            Part::Text("nombre", "Torta"),
            Part::Text("precio", "10"),
            Part::Text("categoria", "postres"),
        ]
    };

    let request = client.multipart(Method::POST, "/productos/", None, parts());
    let (status, headers, body) = client.send_raw(request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Not authenticated");
    assert_eq!(headers.get(WWW_AUTHENTICATE).unwrap(), "Bearer");

    let request = client.multipart(Method::POST, "/productos/", Some("not-a-token"), parts());
    let (status, _) = client.send(request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = client.multipart(
        Method::POST,
        "/productos/",
        Some(&client.viewer_token),
        parts(),
    );
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Admin privileges required");

    let request = Request::builder().uri("/productos/").body(Body::empty())?;
    let (status, list) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 0);
    Ok(())
}

#[tokio::test]
async fn malformed_requests_get_json_errors() -> anyhow::Result<()> {
    let client = Client::new().await?;

    for uri in ["/productos/?disponible=abc", "/productos/abc"] {
        let request = Request::builder().uri(uri).body(Body::empty())?;
        let (status, body) = client.send(request).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["detail"].is_string(), "{uri}: {body}");
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{"))?;
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
    Ok(())
}

#[tokio::test]
async fn login_then_me() -> anyhow::Result<()> {
    let client = Client::new().await?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }).to_string(),
        ))?;
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["role"], "admin");
    let token = body["access_token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/auth/me")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let (status, me) = client.send(request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me, json!({ "email": ADMIN_EMAIL, "role": "admin" }));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": ADMIN_EMAIL, "password": "nope" }).to_string(),
        ))?;
    let (status, body) = client.send(request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect email or password");
    Ok(())
}
