#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use cattlefund::config::Config;
use cattlefund::entities::blog_post;
use cattlefund::entities::cattle::{self, media_urls, CattleStatus};
use cattlefund::entities::investment::{self, InvestmentStatus, InvestmentType};
use cattlefund::entities::project::{self, ProjectStatus};
use cattlefund::error::AppError;
use cattlefund::services::{
    AuthProvider, AuthUser, Email, Mailer, NewUserMetadata, ObjectStore, Session,
};
use cattlefund::{create_app, AppState};

pub const NOTIFY_INBOX: &str = "owner@farm.test";

// For initializing tracing once
static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

/// Records every email; fails every send while `failing` is set.
#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<Email>>,
    failing: AtomicBool,
}

impl FakeMailer {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: Email) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("mail provider unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

struct FakeAccount {
    user: AuthUser,
    password: String,
}

/// In-memory identity service. Tokens are `token-<uuid>`.
#[derive(Default)]
pub struct FakeAuth {
    accounts: Mutex<HashMap<String, FakeAccount>>,
    tokens: Mutex<HashMap<String, AuthUser>>,
    failing_deletes: AtomicBool,
}

impl FakeAuth {
    /// Registers an identity and returns a valid access token for it.
    pub fn add_user(&self, email: &str, password: &str, role: Option<&str>) -> (AuthUser, String) {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: role.map(str::to_string),
        };
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            FakeAccount {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        (user.clone(), self.issue_token(&user))
    }

    pub fn password_of(&self, email: &str) -> Option<String> {
        self.accounts.lock().unwrap().get(email).map(|a| a.password.clone())
    }

    /// Makes every later admin delete fail as an upstream error.
    pub fn fail_deletes(&self) {
        self.failing_deletes.store(true, Ordering::SeqCst);
    }

    pub fn has_user(&self, id: Uuid) -> bool {
        self.accounts.lock().unwrap().values().any(|a| a.user.id == id)
    }

    fn issue_token(&self, user: &AuthUser) -> String {
        let token = format!("token-{}", user.id);
        self.tokens.lock().unwrap().insert(token.clone(), user.clone());
        token
    }

    fn create(&self, email: &str, password: &str, metadata: &NewUserMetadata) -> Result<AuthUser, AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AppError::InvalidRequest("User already registered".to_string()));
        }
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: Some(metadata.role.clone()),
        };
        accounts.insert(
            email.to_string(),
            FakeAccount {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        Ok(user)
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_up(&self, email: &str, password: &str, metadata: &NewUserMetadata) -> Result<AuthUser, AppError> {
        self.create(email, password, metadata)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(AppError::InvalidRequest("Invalid login credentials".to_string())),
            }
        };
        let access_token = self.issue_token(&user);
        Ok(Session { access_token, user })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError> {
        self.tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("invalid JWT".to_string()))
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> Result<(), AppError> {
        let user = self.get_user(access_token).await?;
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(&user.email)
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn admin_create_user(&self, email: &str, password: &str, metadata: &NewUserMetadata) -> Result<AuthUser, AppError> {
        self.create(email, password, metadata)
    }

    async fn admin_set_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .values_mut()
            .find(|a| a.user.id == user_id)
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn admin_delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.failing_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("auth service unavailable".to_string()));
        }
        let mut accounts = self.accounts.lock().unwrap();
        let before = accounts.len();
        accounts.retain(|_, a| a.user.id != user_id);
        if accounts.len() == before {
            return Err(AppError::NotFound("user".to_string()));
        }
        self.tokens.lock().unwrap().retain(|_, u| u.id != user_id);
        Ok(())
    }
}

/// Keeps uploaded objects in memory.
#[derive(Default)]
pub struct FakeStore {
    pub objects: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, AppError> {
        self.objects
            .lock()
            .unwrap()
            .push((path.to_string(), content_type.to_string(), bytes.len()));
        Ok(format!("https://storage.test/images/{}", path))
    }
}

pub struct TestApp {
    pub state: AppState,
    pub mailer: Arc<FakeMailer>,
    pub auth: Arc<FakeAuth>,
    pub store: Arc<FakeStore>,
    pub admin_token: String,
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    pub fn router(&self) -> Router {
        create_app(self.state.clone())
    }

    /// Sends one request through the full router and returns status and JSON body.
    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

pub async fn test_db() -> DatabaseConnection {
    // One connection, or every pool member would get its own empty in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn spawn_app() -> TestApp {
    setup();

    let db = test_db().await;
    let mut config = Config::for_database("sqlite::memory:");
    config.notify_email = Some(NOTIFY_INBOX.to_string());

    let mailer = Arc::new(FakeMailer::default());
    let auth = Arc::new(FakeAuth::default());
    let store = Arc::new(FakeStore::default());
    let (_, admin_token) = auth.add_user("admin@farm.test", "admin-secret", Some("admin"));

    let state = AppState {
        db,
        mailer: mailer.clone(),
        auth: auth.clone(),
        storage: store.clone(),
        config: Arc::new(config),
    };

    TestApp {
        state,
        mailer,
        auth,
        store,
        admin_token,
    }
}

pub async fn seed_project(db: &DatabaseConnection, title: &str, status: ProjectStatus) -> project::Model {
    let now = Utc::now();
    project::ActiveModel {
        title: Set(title.to_string()),
        description: Set(format!("{} description", title)),
        goal_amount: Set(1_000_000),
        raised_amount: Set(0),
        investor_count: Set(0),
        deadline: Set(None),
        status: Set(status),
        image_url: Set(None),
        view_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_investment(
    db: &DatabaseConnection,
    project_id: i32,
    amount: i64,
    status: InvestmentStatus,
) -> investment::Model {
    let now = Utc::now();
    investment::ActiveModel {
        project_id: Set(project_id),
        investor_id: Set(None),
        investor_name: Set("Karim Uddin".to_string()),
        email: Set("karim@example.com".to_string()),
        phone: Set("01700000000".to_string()),
        amount: Set(amount),
        investment_type: Set(InvestmentType::SixMonths),
        investment_deadline: Set(None),
        message: Set(None),
        status: Set(status),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_cattle(db: &DatabaseConnection, name: &str, price: i64, status: CattleStatus) -> cattle::Model {
    let now = Utc::now();
    cattle::ActiveModel {
        name: Set(name.to_string()),
        breed: Set("Sahiwal".to_string()),
        weight: Set(320.5),
        age: Set(30),
        price: Set(price),
        description: Set("Healthy and vaccinated".to_string()),
        location: Set("Savar".to_string()),
        status: Set(status),
        images: Set(media_urls(vec![])),
        videos: Set(media_urls(vec![])),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_post(db: &DatabaseConnection, title: &str, slug: &str, published: bool) -> blog_post::Model {
    let now = Utc::now();
    blog_post::ActiveModel {
        title: Set(title.to_string()),
        slug: Set(slug.to_string()),
        content: Set("Body text".to_string()),
        excerpt: Set(None),
        featured_image: Set(None),
        author: Set("Admin".to_string()),
        published: Set(published),
        published_at: Set(published.then_some(now)),
        view_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
