//! Book Store demo for MetaGuard
//!
//! Guards the book routes, runs a handful of requests through them and
//! prints the responses. Pass `docs` to print the OpenAPI document instead.
//!
//! Run with: cargo run -p books-api
//!      or: cargo run -p books-api -- docs > openapi.json

use bytes::Bytes;
use http::{Method, Request, StatusCode};
use metaguard::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// ============================================
// Data Models
// ============================================

/// A book in the store
#[derive(Debug, Clone, Serialize, Deserialize, Schema)]
pub struct Book {
    #[schema(example = 1004)]
    pub id: i64,
    #[schema(example = "A Wrinkle in Time")]
    pub title: String,
    #[schema(example = "Madeleine L'Engle")]
    pub author: String,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: i64,
    limit: i64,
}

#[derive(Debug, Deserialize)]
struct NewBook {
    title: String,
    author: String,
}

type Store = Arc<RwLock<Vec<Book>>>;

// ============================================
// Guards
// ============================================

struct Routes {
    list_books: Guard,
    create_book: Guard,
    get_book: Guard,
}

impl Routes {
    fn new(store: Store) -> Result<Self, ConfigError> {
        let list_books = Guard::new(
            GuardConfig::new()
                .tag("Books")
                .operation_id("getBooks")
                .description("Get a list of the books in the system.")
                .param(
                    "page",
                    ParameterSpec::query().schema(
                        ParameterSchema::integer().minimum(0).maximum(999999).default_value(0),
                    ),
                )
                .param(
                    "limit",
                    ParameterSpec::query().schema(
                        ParameterSchema::integer().minimum(1).maximum(100).default_value(10),
                    ),
                )
                .response("200", "#/components/schemas/Book[]")
                .response("406", json!({"$ref": "#/components/responses/IllegalInput"}))
                .annotate_locals("parameters"),
        )?;

        let create_book = Guard::from_json_str(
            r##"{
                "tags": ["Books"],
                "operationId": "createBook",
                "description": "Create a book.",
                "annotateLocals": "inputs",
                "parameters": {
                    "title": {"in": "body", "required": true, "schema": {"type": "string", "minLength": 1}},
                    "author": {"in": "body", "required": true, "schema": {"type": "string", "minLength": 1}}
                },
                "responses": {"200": "#/components/schemas/Book"}
            }"##,
        )?;

        let get_book = Guard::new(
            GuardConfig::new()
                .tag("Books")
                .operation_id("getBook")
                .path("/books/{id}")
                .param(
                    "id",
                    ParameterSpec::path()
                        .required()
                        .schema(ParameterSchema::integer().minimum(1))
                        .validate_async(move |id, _| {
                            let store = store.clone();
                            let id = id.as_i64();
                            async move {
                                let books = store.read().map_err(|_| "book store is poisoned")?;
                                Ok::<_, &str>(books.iter().any(|b| Some(b.id) == id))
                            }
                        }),
                )
                .param(
                    "format",
                    ParameterSpec::header().schema(ParameterSchema::string().one_of(["full", "short"])),
                )
                .response("200", "#/components/schemas/Book")
                .annotate_locals("inputs"),
        )?;

        Ok(Self {
            list_books,
            create_book,
            get_book,
        })
    }

    fn openapi(&self) -> OpenApiSpec {
        OpenApiSpec::from_config(
            OpenApiConfig::new("MetaGuard Book Store", "1.0.2")
                .description("A sample Book Store whose documentation is generated from its guards.")
                .license("MIT", Some("https://opensource.org/licenses/MIT".to_string()))
                .server("/")
                .tag("Books", "Entries related to books"),
        )
        .register::<Book>()
        .with_error_responses()
        .document_routes([
            ("/books", "get", &self.list_books),
            ("/books", "post", &self.create_book),
            ("/books/:id", "get", &self.get_book),
        ])
    }
}

// ============================================
// Handlers
// ============================================

fn list_books(store: &Store, locals: &Locals) -> Result<Value, BoxError> {
    let params: ListParams = locals
        .get("parameters")
        .ok_or("parameters were not published")?
        .deserialize()?;
    let books = store.read().map_err(|_| "book store is poisoned")?;

    let start = (params.page * params.limit) as usize;
    let page: Vec<&Book> = books.iter().skip(start).take(params.limit as usize).collect();
    Ok(serde_json::to_value(page)?)
}

fn create_book(store: &Store, locals: &Locals) -> Result<Value, BoxError> {
    let new: NewBook = locals
        .get("inputs")
        .ok_or("inputs were not published")?
        .deserialize()?;
    let mut books = store.write().map_err(|_| "book store is poisoned")?;

    let book = Book {
        id: books.iter().map(|b| b.id).max().unwrap_or(0) + 1,
        title: new.title,
        author: new.author,
    };
    books.push(book.clone());
    Ok(serde_json::to_value(book)?)
}

fn get_book(store: &Store, locals: &Locals) -> Result<Value, BoxError> {
    let inputs = locals.get("inputs").ok_or("inputs were not published")?;
    let id = inputs.get("id").and_then(Value::as_i64);
    let books = store.read().map_err(|_| "book store is poisoned")?;

    let book = books
        .iter()
        .find(|b| Some(b.id) == id)
        .ok_or("book vanished")?;
    match inputs.get("format").and_then(Value::as_str) {
        Some("short") => Ok(json!({"id": book.id, "title": book.title})),
        _ => Ok(serde_json::to_value(book)?),
    }
}

type BoxError = metaguard::BoxError;
type Handler = fn(&Store, &Locals) -> Result<Value, BoxError>;

#[derive(Debug, Clone, Copy)]
enum Route {
    ListBooks,
    CreateBook,
    GetBook,
}

impl Routes {
    fn route(&self, route: Route) -> (&Guard, Handler) {
        match route {
            Route::ListBooks => (&self.list_books, list_books as Handler),
            Route::CreateBook => (&self.create_book, create_book as Handler),
            Route::GetBook => (&self.get_book, get_book as Handler),
        }
    }
}

// ============================================
// Dispatch
// ============================================

async fn dispatch(routes: &Routes, store: &Store, request: Request<Bytes>) -> (StatusCode, Value) {
    let segments: Vec<String> = request
        .uri()
        .path()
        .trim_matches('/')
        .split('/')
        .map(str::to_string)
        .collect();
    let method = request.method().clone();

    let (route, path_params) = match (&method, segments.as_slice()) {
        (&Method::GET, [books]) if books == "books" => (Route::ListBooks, HashMap::new()),
        (&Method::POST, [books]) if books == "books" => (Route::CreateBook, HashMap::new()),
        (&Method::GET, [books, id]) if books == "books" => {
            (Route::GetBook, HashMap::from([("id".to_string(), id.clone())]))
        }
        _ => return (StatusCode::NOT_FOUND, json!({"error": {"type": "not_found"}})),
    };
    let (guard, handler) = routes.route(route);

    let ctx = match HttpRequestContext::from_request(request, path_params) {
        Ok(ctx) => ctx,
        Err(err) => {
            let body = json!({"error": {"type": "bad_request", "message": err.to_string()}});
            return (StatusCode::BAD_REQUEST, body);
        }
    };

    let mut locals = Locals::new();
    guard
        .call(&ctx, &mut locals, |rejection, locals| match rejection {
            Some(GuardError::InvalidParameter(err)) => (err.status(), err.to_body()),
            Some(err) => {
                error!(error = %err, "guard failed");
                (err.status(), json!({"error": {"type": "internal", "message": err.to_string()}}))
            }
            None => match handler(store, locals) {
                Ok(body) => (StatusCode::OK, body),
                Err(err) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": {"type": "internal", "message": err.to_string()}}),
                ),
            },
        })
        .await
}

fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: Value) -> Request<Bytes> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = if body.is_null() {
        Bytes::new()
    } else {
        Bytes::from(body.to_string())
    };
    builder.body(body).unwrap_or_default()
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("metaguard=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let store: Store = Arc::new(RwLock::new(vec![Book {
        id: 1,
        title: "The Cryptonomicon".to_string(),
        author: "Neal Stephenson".to_string(),
    }]));
    let routes = Routes::new(store.clone())?;

    if std::env::args().nth(1).as_deref() == Some("docs") {
        println!("{}", routes.openapi().to_json_pretty()?);
        return Ok(());
    }

    let requests = [
        request(Method::GET, "/books", &[], Value::Null),
        request(Method::GET, "/books?page=0&limit=500", &[], Value::Null),
        request(Method::POST, "/books", &[], json!({"title": "Dune", "author": "Frank Herbert"})),
        request(Method::POST, "/books", &[], json!({"title": "Untitled"})),
        request(Method::GET, "/books/2", &[("format", "short")], Value::Null),
        request(Method::GET, "/books/42", &[], Value::Null),
        request(Method::GET, "/books/abc", &[], Value::Null),
    ];

    for request in requests {
        let line = format!("{} {}", request.method(), request.uri());
        let (status, body) = dispatch(&routes, &store, request).await;
        info!("{line} -> {status}");
        println!("{line}\n  {status}\n  {body}\n");
    }

    Ok(())
}
