use actix_web::web::Data;
use actix_web::Error;
use actix_web::HttpResponse;
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::api::{
    Book, BookId, CreateBookResponse, SignInInput, SignUpInput, SignUpResponse, TokenResponse,
    UpdateBookInput,
};
use crate::auth::AuthenticatedUser;
use crate::book_service::BookService;
use crate::books_repository::BookRepositoryError;
use crate::user_service::UserService;
use crate::user_service::UserServiceError;
use crate::users_repository::UserRepositoryError;

fn book_error_response(operation: &str, err: BookRepositoryError) -> HttpResponse {
    match err {
        BookRepositoryError::Validation(_) | BookRepositoryError::EmptyUpdate => {
            tracing::warn!("{} rejected: {}", operation, err);
            HttpResponse::BadRequest().finish()
        }
        BookRepositoryError::NotFound(_) => {
            tracing::info!("{}: {}", operation, err);
            HttpResponse::NotFound().finish()
        }
        err => {
            tracing::error!("{} failed: {}", operation, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn user_error_response(operation: &str, err: UserServiceError) -> HttpResponse {
    match err {
        UserServiceError::Validation(_) => {
            tracing::warn!("{} rejected: {}", operation, err);
            HttpResponse::BadRequest().finish()
        }
        UserServiceError::CredentialsInvalid
        | UserServiceError::InvalidToken(_)
        | UserServiceError::ExpiredToken => {
            tracing::warn!("{} rejected: {}", operation, err);
            HttpResponse::Unauthorized().finish()
        }
        UserServiceError::Repository(UserRepositoryError::AlreadyExists(_)) => {
            tracing::warn!("{} rejected: {}", operation, err);
            HttpResponse::Conflict().finish()
        }
        err => {
            tracing::error!("{} failed: {}", operation, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn get_all_books(book_service: Data<BookService>) -> Result<HttpResponse, Error> {
    Ok(match book_service.get_all().await {
        Ok(books) => HttpResponse::Ok().json(books),
        Err(err) => book_error_response("Get all books", err),
    })
}

#[api_v2_operation]
pub async fn create_book(
    book_service: Data<BookService>,
    user: AuthenticatedUser,
    book: web::Json<Book>,
) -> Result<HttpResponse, Error> {
    Ok(match book_service.create(book.into_inner()).await {
        Ok(id) => {
            tracing::info!("User {} added book {}", user.user_id, id);
            HttpResponse::Created().json(CreateBookResponse { id })
        }
        Err(err) => book_error_response("Create book", err),
    })
}

#[api_v2_operation]
pub async fn get_book(
    book_service: Data<BookService>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    Ok(match book_service.get_by_id(book_id).await {
        Ok(book) => HttpResponse::Ok().json(book),
        Err(err) => book_error_response(&format!("Get book {}", book_id), err),
    })
}

#[api_v2_operation]
pub async fn update_book(
    book_service: Data<BookService>,
    user: AuthenticatedUser,
    book_id: web::Path<BookId>,
    input: web::Json<UpdateBookInput>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    Ok(
        match book_service.update(book_id, input.into_inner()).await {
            Ok(()) => {
                tracing::info!("User {} updated book {}", user.user_id, book_id);
                HttpResponse::Ok().finish()
            }
            Err(err) => book_error_response(&format!("Update book {}", book_id), err),
        },
    )
}

#[api_v2_operation]
pub async fn delete_book(
    book_service: Data<BookService>,
    user: AuthenticatedUser,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    let operation = format!("Delete book {}", book_id);

    // repository delete is unconditional, the lookup distinguishes a missing book
    if let Err(err) = book_service.get_by_id(book_id).await {
        return Ok(book_error_response(&operation, err));
    }

    Ok(match book_service.delete(book_id).await {
        Ok(()) => {
            tracing::info!("User {} deleted book {}", user.user_id, book_id);
            HttpResponse::Ok().finish()
        }
        Err(err) => book_error_response(&operation, err),
    })
}

#[api_v2_operation]
pub async fn sign_up(
    user_service: Data<UserService>,
    input: web::Json<SignUpInput>,
) -> Result<HttpResponse, Error> {
    Ok(match user_service.sign_up(input.into_inner()).await {
        Ok(id) => {
            tracing::info!("User {} signed up", id);
            HttpResponse::Ok().json(SignUpResponse { id })
        }
        Err(err) => user_error_response("Sign up", err),
    })
}

#[api_v2_operation]
pub async fn sign_in(
    user_service: Data<UserService>,
    input: web::Json<SignInInput>,
) -> Result<HttpResponse, Error> {
    Ok(match user_service.sign_in(input.into_inner()).await {
        Ok(token) => HttpResponse::Ok().json(TokenResponse { token }),
        Err(err) => user_error_response("Sign in", err),
    })
}

#[cfg(test)]
mod handler_tests {
    use std::sync::Arc;

    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::http::header::{ContentType, AUTHORIZATION};
    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::web::Data;
    use actix_web::App;
    use chrono::{Duration, TimeZone, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use paperclip::actix::OpenApiExt;
    use serde_json::json;

    use crate::api::{Book, CreateBookResponse, SignUpResponse, TokenResponse};
    use crate::app_config::{config_app, json_config, path_config};
    use crate::book_service::BookService;
    use crate::books_repository::InMemoryBookRepository;
    use crate::password_hasher::Sha256PasswordHasher;
    use crate::token_manager::{SessionClaims, TokenManager};
    use crate::user_service::UserService;
    use crate::users_repository::InMemoryUsersRepository;

    const SIGNING_SECRET: &[u8] = b"secret";

    async fn init_app(
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        let book_service = Data::new(BookService::new(Arc::new(
            InMemoryBookRepository::default(),
        )));
        let user_service = Data::new(UserService::new(
            Arc::new(InMemoryUsersRepository::default()),
            Arc::new(Sha256PasswordHasher::new("salt").unwrap()),
            TokenManager::new(SIGNING_SECRET, Duration::hours(1)).unwrap(),
        ));

        test::init_service(
            App::new()
                .wrap_api()
                .app_data(json_config())
                .app_data(path_config())
                .app_data(book_service)
                .app_data(user_service)
                .configure(config_app)
                .build(),
        )
        .await
    }

    async fn sign_up_and_sign_in(
        app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    ) -> String {
        let credentials = json!({"name": "Ann", "email": "ann@example.com", "password": "secret1"});
        let resp = test::call_service(
            app,
            TestRequest::post()
                .uri("/auth/sign-up")
                .set_json(&credentials)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let _: SignUpResponse = test::read_body_json(resp).await;

        let resp = test::call_service(
            app,
            TestRequest::get()
                .uri("/auth/sign-in")
                .set_json(json!({"email": "ann@example.com", "password": "secret1"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let token: TokenResponse = test::read_body_json(resp).await;
        token.token
    }

    fn sample_book() -> Book {
        Book {
            id: 0,
            title: "Roadside Picnic".to_string(),
            author: "Strugatsky".to_string(),
            publish_date: Utc.with_ymd_and_hms(1972, 1, 1, 0, 0, 0).unwrap(),
            rating: 5,
        }
    }

    #[actix_web::test]
    async fn test_health() {
        let app = init_app().await;
        let resp =
            test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_book_lifecycle() {
        let app = init_app().await;
        let token = sign_up_and_sign_in(&app).await;
        let bearer = format!("Bearer {}", token);

        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/books")
                .insert_header((AUTHORIZATION, bearer.clone()))
                .set_json(sample_book())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let CreateBookResponse { id } = test::read_body_json(resp).await;

        let resp =
            test::call_service(&app, TestRequest::get().uri(&format!("/books/{}", id)).to_request())
                .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let book: Book = test::read_body_json(resp).await;
        assert_eq!(book, Book { id, ..sample_book() });

        let resp = test::call_service(
            &app,
            TestRequest::put()
                .uri(&format!("/books/{}", id))
                .insert_header((AUTHORIZATION, bearer.clone()))
                .set_json(json!({"rating": 3}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, TestRequest::get().uri("/books").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let books: Vec<Book> = test::read_body_json(resp).await;
        assert_eq!(
            books,
            vec![Book {
                id,
                rating: 3,
                ..sample_book()
            }]
        );

        let resp = test::call_service(
            &app,
            TestRequest::delete()
                .uri(&format!("/books/{}", id))
                .insert_header((AUTHORIZATION, bearer.clone()))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            TestRequest::delete()
                .uri(&format!("/books/{}", id))
                .insert_header((AUTHORIZATION, bearer))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_mutations_require_valid_token() {
        let app = init_app().await;

        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/books")
                .set_json(sample_book())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &app,
            TestRequest::put()
                .uri("/books/1")
                .insert_header((AUTHORIZATION, "Bearer not-a-token"))
                .set_json(json!({"rating": 3}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &app,
            TestRequest::delete()
                .uri("/books/1")
                .insert_header((AUTHORIZATION, "Token abc"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let now = Utc::now();
        let expired_token = encode(
            &Header::default(),
            &SessionClaims {
                sub: "1".to_string(),
                iat: (now - Duration::hours(2)).timestamp(),
                exp: (now - Duration::hours(1)).timestamp(),
            },
            &EncodingKey::from_secret(SIGNING_SECRET),
        )
        .unwrap();
        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/books")
                .insert_header((AUTHORIZATION, format!("Bearer {}", expired_token)))
                .set_json(sample_book())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_bad_requests() {
        let app = init_app().await;
        let token = sign_up_and_sign_in(&app).await;
        let bearer = format!("Bearer {}", token);

        let resp =
            test::call_service(&app, TestRequest::get().uri("/books/abc").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            TestRequest::delete()
                .uri("/books/abc")
                .insert_header((AUTHORIZATION, bearer.clone()))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/books")
                .insert_header((AUTHORIZATION, bearer.clone()))
                .insert_header(ContentType::json())
                .set_payload("{not json")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/books")
                .insert_header((AUTHORIZATION, bearer.clone()))
                .set_json(Book {
                    title: "".to_string(),
                    ..sample_book()
                })
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/books")
                .insert_header((AUTHORIZATION, bearer.clone()))
                .set_json(sample_book())
                .to_request(),
        )
        .await;
        let CreateBookResponse { id } = test::read_body_json(resp).await;

        let resp = test::call_service(
            &app,
            TestRequest::put()
                .uri(&format!("/books/{}", id))
                .insert_header((AUTHORIZATION, bearer.clone()))
                .set_json(json!({}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            TestRequest::put()
                .uri(&format!("/books/{}", id))
                .insert_header((AUTHORIZATION, bearer.clone()))
                .insert_header(ContentType::json())
                .set_payload("{\"rating\": ")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/auth/sign-in")
                .set_json(json!({"email": "not-an-email", "password": "secret1"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            TestRequest::put()
                .uri("/books/20000")
                .insert_header((AUTHORIZATION, bearer.clone()))
                .set_json(json!({"title": "x"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp =
            test::call_service(&app, TestRequest::get().uri("/books/20000").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = test::read_body(resp).await;
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn test_auth_failures() {
        let app = init_app().await;
        sign_up_and_sign_in(&app).await;

        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/auth/sign-in")
                .set_json(json!({"email": "ann@example.com", "password": "wrong1"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/auth/sign-up")
                .set_json(json!({"name": "A", "email": "a@example.com", "password": "secret1"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/auth/sign-up")
                .set_json(json!({"name": "Ann", "email": "ann@example.com", "password": "secret1"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
