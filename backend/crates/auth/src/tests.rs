//! Scenario tests for the auth crate
//! Use cases run against the in-memory store; HTTP tests drive the router.

#[cfg(test)]
mod support {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::application::config::{AuthConfig, HashCost};
    use crate::domain::mailer::Mailer;
    use crate::domain::value_object::{email::Email, verification_code::VerificationCode};
    use crate::error::{AuthError, AuthResult};

    pub fn test_config() -> AuthConfig {
        AuthConfig::with_random_secret().with_password_cost(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
    }

    /// Mailer that records every message and can be switched to fail
    #[derive(Clone, Default)]
    pub struct RecordingMailer {
        sent: Arc<Mutex<Vec<(String, String)>>>,
        failing: Arc<AtomicBool>,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            let mailer = Self::default();
            mailer.failing.store(true, Ordering::SeqCst);
            mailer
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn last_code_for(&self, email: &str) -> Option<String> {
            self.sent()
                .into_iter()
                .rev()
                .find(|(to, _)| to == email)
                .map(|(_, code)| code)
        }
    }

    impl Mailer for RecordingMailer {
        async fn send_verification_email(
            &self,
            to: &Email,
            code: &VerificationCode,
        ) -> AuthResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AuthError::MailDelivery("relay unavailable".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.as_str().to_string(), code.as_str().to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod use_case_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use super::support::{RecordingMailer, test_config};
    use crate::application::config::HashCost;
    use crate::application::{
        AuthConfig, CreateAccountInput, CreateAccountOutput, CreateAccountUseCase,
        EditProfileInput, EditProfileUseCase, FindIdentityUseCase, LoginInput, LoginUseCase,
        MailDispatch, TokenCodec, VerifyEmailUseCase,
    };
    use crate::domain::entity::identity::{Identity, IdentityChanges, NewIdentity};
    use crate::domain::entity::verification::Verification;
    use crate::domain::repository::{IdentityRepository, VerificationRepository};
    use crate::domain::value_object::{
        email::Email, identity_id::IdentityId, user_password::UserPassword,
        user_role::UserRole, verification_code::VerificationCode,
    };
    use crate::error::{AuthError, AuthResult};
    use crate::infra::memory::MemoryAuthRepository;

    struct Fixture {
        repo: Arc<MemoryAuthRepository>,
        mailer: Arc<RecordingMailer>,
        config: Arc<AuthConfig>,
        tokens: Arc<TokenCodec>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_mailer(RecordingMailer::default())
        }

        fn with_mailer(mailer: RecordingMailer) -> Self {
            Self::build(mailer, test_config())
        }

        fn with_config(config: AuthConfig) -> Self {
            Self::build(RecordingMailer::default(), config)
        }

        fn build(mailer: RecordingMailer, config: AuthConfig) -> Self {
            let tokens = TokenCodec::from_config(&config);
            Self {
                repo: Arc::new(MemoryAuthRepository::new()),
                mailer: Arc::new(mailer),
                config: Arc::new(config),
                tokens: Arc::new(tokens),
            }
        }

        async fn create(&self, email: &str, password: &str) -> AuthResult<CreateAccountOutput> {
            CreateAccountUseCase::new(self.repo.clone(), self.mailer.clone(), self.config.clone())
                .execute(CreateAccountInput {
                    email: email.to_string(),
                    password: password.to_string(),
                    role: UserRole::Client,
                })
                .await
        }

        async fn login(&self, email: &str, password: &str) -> AuthResult<IdentityId> {
            let use_case =
                LoginUseCase::new(self.repo.clone(), self.tokens.clone(), self.config.clone());
            let output = use_case
                .execute(LoginInput {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await?;
            assert_eq!(self.tokens.verify(&output.token)?, output.identity_id);
            Ok(output.identity_id)
        }

        async fn edit(
            &self,
            id: IdentityId,
            email: Option<&str>,
            password: Option<&str>,
        ) -> AuthResult<crate::application::EditProfileOutput> {
            EditProfileUseCase::new(self.repo.clone(), self.mailer.clone(), self.config.clone())
                .execute(
                    id,
                    EditProfileInput {
                        email: email.map(str::to_string),
                        password: password.map(str::to_string),
                    },
                )
                .await
        }

        async fn verify(&self, code: &str) -> AuthResult<Identity> {
            VerifyEmailUseCase::new(self.repo.clone()).execute(code).await
        }
    }

    #[tokio::test]
    async fn test_create_account_sends_code() {
        let fx = Fixture::new();
        let output = fx.create("a@x.com", "pw1").await.unwrap();

        assert_eq!(output.identity.email.as_str(), "a@x.com");
        assert_eq!(output.identity.role, UserRole::Client);
        assert!(!output.identity.verified);
        assert_eq!(output.verification_mail, MailDispatch::Sent);

        let pending = fx
            .repo
            .pending_verification(output.identity.id)
            .await
            .unwrap();
        assert_eq!(pending.code.as_str().len(), 43);
        assert_eq!(
            fx.mailer.sent(),
            vec![("a@x.com".to_string(), pending.code.as_str().to_string())]
        );
    }

    #[tokio::test]
    async fn test_create_verify_login_scenario() {
        let fx = Fixture::new();
        fx.create("a@x.com", "pw1").await.unwrap();
        let code = fx.mailer.last_code_for("a@x.com").unwrap();
        fx.verify(&code).await.unwrap();

        let output = LoginUseCase::new(fx.repo.clone(), fx.tokens.clone(), fx.config.clone())
            .execute(LoginInput {
                email: "a@x.com".into(),
                password: "pw1".into(),
            })
            .await
            .unwrap();

        let subject = fx.tokens.verify(&output.token).unwrap();
        let identity = FindIdentityUseCase::new(fx.repo.clone())
            .execute(subject)
            .await
            .unwrap();
        assert!(identity.verified);
        assert_eq!(identity.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_password_is_stored_hashed() {
        let fx = Fixture::new();
        let output = fx.create("a@x.com", "pw1").await.unwrap();

        let hash = fx
            .repo
            .find_password_hash(output.identity.id)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(hash.as_phc_string(), "pw1");
        assert!(hash.as_phc_string().starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_create_account_duplicate_email() {
        let fx = Fixture::new();
        fx.create("a@x.com", "pw1").await.unwrap();

        let err = fx.create("a@x.com", "other").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
        assert_eq!(fx.repo.counts().await, (1, 1));
    }

    #[tokio::test]
    async fn test_create_account_rejects_invalid_input() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.create("not-an-email", "pw1").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            fx.create("a@x.com", "").await,
            Err(AuthError::Validation(_))
        ));
        assert_eq!(fx.repo.counts().await, (0, 0));
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_account() {
        let fx = Fixture::with_mailer(RecordingMailer::failing());
        let output = fx.create("a@x.com", "pw1").await.unwrap();

        assert!(matches!(output.verification_mail, MailDispatch::Failed(_)));
        assert_eq!(fx.repo.counts().await, (1, 1));
        assert!(fx.login("a@x.com", "pw1").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_outcomes() {
        let fx = Fixture::new();
        let created = fx.create("a@x.com", "pw1").await.unwrap();

        assert_eq!(fx.login("a@x.com", "pw1").await.unwrap(), created.identity.id);
        assert!(matches!(
            fx.login("a@x.com", "wrong").await,
            Err(AuthError::InvalidCredential)
        ));
        assert!(matches!(
            fx.login("b@x.com", "pw1").await,
            Err(AuthError::NotFound)
        ));
        assert!(matches!(
            fx.login("A@x.com", "pw1").await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_find_identity() {
        let fx = Fixture::new();
        let created = fx.create("a@x.com", "pw1").await.unwrap();

        let use_case = FindIdentityUseCase::new(fx.repo.clone());
        assert_eq!(
            use_case.execute(created.identity.id).await.unwrap(),
            created.identity
        );
        assert!(matches!(
            use_case.execute(IdentityId::from_i64(999)).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_verify_email_once() {
        let fx = Fixture::new();
        fx.create("a@x.com", "pw1").await.unwrap();
        let code = fx.mailer.last_code_for("a@x.com").unwrap();

        let identity = fx.verify(&code).await.unwrap();
        assert!(identity.verified);
        assert_eq!(fx.repo.counts().await, (1, 0));

        assert!(matches!(
            fx.verify(&code).await,
            Err(AuthError::VerificationNotFound)
        ));
    }

    #[tokio::test]
    async fn test_verify_unknown_code() {
        let fx = Fixture::new();
        fx.create("a@x.com", "pw1").await.unwrap();

        let unknown = VerificationCode::generate();
        assert!(matches!(
            fx.verify(unknown.as_str()).await,
            Err(AuthError::VerificationNotFound)
        ));
        assert!(matches!(
            fx.verify("garbage").await,
            Err(AuthError::VerificationNotFound)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_verify_single_winner() {
        let fx = Fixture::new();
        fx.create("a@x.com", "pw1").await.unwrap();
        let code = fx.mailer.last_code_for("a@x.com").unwrap();

        let (first, second) = tokio::join!(fx.verify(&code), fx.verify(&code));
        let successes = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_email_change_resets_verification() {
        let fx = Fixture::new();
        let created = fx.create("a@x.com", "pw1").await.unwrap();
        let first_code = fx.mailer.last_code_for("a@x.com").unwrap();
        fx.verify(&first_code).await.unwrap();

        let output = fx
            .edit(created.identity.id, Some("b@x.com"), None)
            .await
            .unwrap();
        assert_eq!(output.identity.email.as_str(), "b@x.com");
        assert!(!output.identity.verified);
        assert_eq!(output.verification_mail, Some(MailDispatch::Sent));

        let new_code = fx.mailer.last_code_for("b@x.com").unwrap();
        let identity = fx.verify(&new_code).await.unwrap();
        assert!(identity.verified);
        assert_eq!(identity.email.as_str(), "b@x.com");
    }

    #[tokio::test]
    async fn test_reissue_supersedes_pending_code() {
        let fx = Fixture::new();
        let created = fx.create("a@x.com", "pw1").await.unwrap();
        let stale = fx.mailer.last_code_for("a@x.com").unwrap();

        fx.edit(created.identity.id, Some("b@x.com"), None)
            .await
            .unwrap();

        assert_eq!(fx.repo.counts().await, (1, 1));
        assert!(matches!(
            fx.verify(&stale).await,
            Err(AuthError::VerificationNotFound)
        ));
    }

    #[tokio::test]
    async fn test_password_only_edit() {
        let fx = Fixture::new();
        let created = fx.create("a@x.com", "pw1").await.unwrap();
        let code = fx.mailer.last_code_for("a@x.com").unwrap();
        fx.verify(&code).await.unwrap();
        let mails_before = fx.mailer.sent().len();

        let output = fx
            .edit(created.identity.id, None, Some("pw2"))
            .await
            .unwrap();
        assert!(output.identity.verified);
        assert!(output.verification_mail.is_none());
        assert_eq!(fx.mailer.sent().len(), mails_before);

        assert!(fx.login("a@x.com", "pw2").await.is_ok());
        assert!(matches!(
            fx.login("a@x.com", "pw1").await,
            Err(AuthError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn test_same_email_edit_is_noop() {
        let fx = Fixture::new();
        let created = fx.create("a@x.com", "pw1").await.unwrap();
        let code = fx.mailer.last_code_for("a@x.com").unwrap();
        fx.verify(&code).await.unwrap();

        let output = fx
            .edit(created.identity.id, Some("a@x.com"), None)
            .await
            .unwrap();
        assert!(output.identity.verified);
        assert!(output.verification_mail.is_none());
        assert_eq!(fx.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_to_taken_email() {
        let fx = Fixture::new();
        let a = fx.create("a@x.com", "pw1").await.unwrap();
        fx.create("b@x.com", "pw1").await.unwrap();

        assert!(matches!(
            fx.edit(a.identity.id, Some("b@x.com"), None).await,
            Err(AuthError::DuplicateEmail)
        ));
        let unchanged = fx.repo.find_by_id(a.identity.id).await.unwrap().unwrap();
        assert_eq!(unchanged.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_edit_unknown_identity() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.edit(IdentityId::from_i64(5), None, Some("pw2")).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_edit_invalid_input() {
        let fx = Fixture::new();
        let created = fx.create("a@x.com", "pw1").await.unwrap();
        assert!(matches!(
            fx.edit(created.identity.id, Some("nope"), None).await,
            Err(AuthError::Validation(_))
        ));
    }

    /// Store wrapper that injects failures into writes
    #[derive(Clone, Default)]
    struct FaultyRepository {
        inner: MemoryAuthRepository,
        /// Version checks never succeed
        contended: bool,
        /// `change_email` fails before touching the store
        email_change_fails: bool,
        /// `consume_and_verify` fails this many times before delegating
        verify_failures: Arc<AtomicUsize>,
    }

    impl IdentityRepository for FaultyRepository {
        async fn find_by_id(&self, id: IdentityId) -> AuthResult<Option<Identity>> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>> {
            self.inner.find_by_email(email).await
        }

        async fn find_password_hash(&self, id: IdentityId) -> AuthResult<Option<UserPassword>> {
            self.inner.find_password_hash(id).await
        }

        async fn insert_identity(&self, identity: &NewIdentity) -> AuthResult<Identity> {
            self.inner.insert_identity(identity).await
        }

        async fn update_identity(
            &self,
            id: IdentityId,
            expected_version: i32,
            changes: &IdentityChanges,
        ) -> AuthResult<bool> {
            if self.contended {
                return Ok(false);
            }
            self.inner.update_identity(id, expected_version, changes).await
        }
    }

    impl VerificationRepository for FaultyRepository {
        async fn insert_verification(
            &self,
            identity_id: IdentityId,
            code: &VerificationCode,
        ) -> AuthResult<Verification> {
            self.inner.insert_verification(identity_id, code).await
        }

        async fn change_email(
            &self,
            id: IdentityId,
            expected_version: i32,
            changes: &IdentityChanges,
            code: &VerificationCode,
        ) -> AuthResult<Option<Verification>> {
            if self.email_change_fails {
                return Err(AuthError::Unexpected("connection reset".into()));
            }
            if self.contended {
                return Ok(None);
            }
            self.inner
                .change_email(id, expected_version, changes, code)
                .await
        }

        async fn consume_and_verify(
            &self,
            code: &VerificationCode,
        ) -> AuthResult<Option<Identity>> {
            let remaining = self.verify_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.verify_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(AuthError::Unexpected("connection reset".into()));
            }
            self.inner.consume_and_verify(code).await
        }
    }

    async fn create_on(
        repo: &Arc<FaultyRepository>,
        mailer: &Arc<RecordingMailer>,
        config: &Arc<AuthConfig>,
    ) -> Identity {
        CreateAccountUseCase::new(repo.clone(), mailer.clone(), config.clone())
            .execute(CreateAccountInput {
                email: "a@x.com".into(),
                password: "pw1".into(),
                role: UserRole::Owner,
            })
            .await
            .unwrap()
            .identity
    }

    async fn edit_email_on(
        repo: &Arc<FaultyRepository>,
        mailer: &Arc<RecordingMailer>,
        config: &Arc<AuthConfig>,
        id: IdentityId,
    ) -> AuthResult<crate::application::EditProfileOutput> {
        EditProfileUseCase::new(repo.clone(), mailer.clone(), config.clone())
            .execute(
                id,
                EditProfileInput {
                    email: Some("b@x.com".into()),
                    password: None,
                },
            )
            .await
    }

    #[tokio::test]
    async fn test_edit_gives_up_after_contention() {
        let config = Arc::new(test_config());
        let repo = Arc::new(FaultyRepository {
            contended: true,
            ..Default::default()
        });
        let mailer = Arc::new(RecordingMailer::default());
        let created = create_on(&repo, &mailer, &config).await;

        let result = edit_email_on(&repo, &mailer, &config, created.id).await;
        assert!(matches!(result, Err(AuthError::EditConflict)));
        assert!(mailer.last_code_for("b@x.com").is_none());

        // Nothing was written, so the original code still verifies
        let code = mailer.last_code_for("a@x.com").unwrap();
        let identity = VerifyEmailUseCase::new(repo.clone())
            .execute(&code)
            .await
            .unwrap();
        assert_eq!(identity.email.as_str(), "a@x.com");
        assert!(identity.verified);
    }

    #[tokio::test]
    async fn test_failed_email_change_keeps_old_email_and_code() {
        let config = Arc::new(test_config());
        let repo = Arc::new(FaultyRepository {
            email_change_fails: true,
            ..Default::default()
        });
        let mailer = Arc::new(RecordingMailer::default());
        let created = create_on(&repo, &mailer, &config).await;
        let old_code = mailer.last_code_for("a@x.com").unwrap();

        let result = edit_email_on(&repo, &mailer, &config, created.id).await;
        assert!(matches!(result, Err(AuthError::Unexpected(_))));
        assert!(mailer.last_code_for("b@x.com").is_none());

        let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.email.as_str(), "a@x.com");
        assert_eq!(stored.version, created.version);

        // The code mailed to a@x.com can only ever verify a@x.com
        let identity = VerifyEmailUseCase::new(repo.clone())
            .execute(&old_code)
            .await
            .unwrap();
        assert_eq!(identity.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_failed_verify_keeps_code_usable() {
        let config = Arc::new(test_config());
        let repo = Arc::new(FaultyRepository {
            verify_failures: Arc::new(AtomicUsize::new(1)),
            ..Default::default()
        });
        let mailer = Arc::new(RecordingMailer::default());
        let created = create_on(&repo, &mailer, &config).await;
        let code = mailer.last_code_for("a@x.com").unwrap();

        let use_case = VerifyEmailUseCase::new(repo.clone());
        assert!(use_case.execute(&code).await.is_err());

        let pending = repo.inner.pending_verification(created.id).await.unwrap();
        assert_eq!(pending.code.as_str(), code);
        assert!(!repo.find_by_id(created.id).await.unwrap().unwrap().verified);

        let identity = use_case.execute(&code).await.unwrap();
        assert!(identity.verified);
        assert_eq!(repo.inner.counts().await, (1, 0));
    }

    #[tokio::test]
    async fn test_memory_email_change_drops_pending_code() {
        let fx = Fixture::new();
        let created = fx.create("a@x.com", "pw1").await.unwrap();
        let stale = fx.mailer.last_code_for("a@x.com").unwrap();

        let changes = created
            .identity
            .changes_for(Some(Email::new("b@x.com").unwrap()), None);
        assert!(fx
            .repo
            .update_identity(created.identity.id, created.identity.version, &changes)
            .await
            .unwrap());

        assert!(fx.repo.pending_verification(created.identity.id).await.is_none());
        assert!(matches!(
            fx.verify(&stale).await,
            Err(AuthError::VerificationNotFound)
        ));
    }

    #[tokio::test]
    async fn test_memory_change_email_is_version_checked() {
        let fx = Fixture::new();
        let created = fx.create("a@x.com", "pw1").await.unwrap();
        let pending = fx.repo.pending_verification(created.identity.id).await.unwrap();

        let changes = created
            .identity
            .changes_for(Some(Email::new("b@x.com").unwrap()), None);
        let code = VerificationCode::generate();
        let outcome = fx
            .repo
            .change_email(created.identity.id, created.identity.version + 1, &changes, &code)
            .await
            .unwrap();
        assert!(outcome.is_none());

        // Losing the version check leaves both the identity and its code alone
        let stored = fx.repo.find_by_id(created.identity.id).await.unwrap().unwrap();
        assert_eq!(stored.email.as_str(), "a@x.com");
        assert_eq!(
            fx.repo.pending_verification(created.identity.id).await.unwrap(),
            pending
        );
    }

    #[tokio::test]
    async fn test_unknown_email_login_pays_hash_cost() {
        let fx = Fixture::with_config(test_config().with_password_cost(HashCost {
            memory_kib: 8192,
            iterations: 3,
            parallelism: 1,
        }));
        fx.create("a@x.com", "pw1").await.unwrap();

        async fn fastest(fx: &Fixture, email: &str) -> Duration {
            let mut best = Duration::MAX;
            for _ in 0..3 {
                let started = Instant::now();
                assert!(fx.login(email, "wrong").await.is_err());
                best = best.min(started.elapsed());
            }
            best
        }

        let mismatch = fastest(&fx, "a@x.com").await;
        let unknown = fastest(&fx, "nobody@x.com").await;
        assert!(
            unknown * 4 >= mismatch,
            "unknown email took {unknown:?}, mismatch took {mismatch:?}"
        );
    }

    #[tokio::test]
    async fn test_memory_store_rejects_duplicate_insert() {
        let fx = Fixture::new();
        fx.create("a@x.com", "pw1").await.unwrap();

        let hash = fx
            .repo
            .find_password_hash(IdentityId::from_i64(1))
            .await
            .unwrap()
            .unwrap();
        let err = fx
            .repo
            .insert_identity(&NewIdentity {
                email: Email::new("a@x.com").unwrap(),
                password_hash: hash,
                role: UserRole::Delivery,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }
}

#[cfg(test)]
mod http_tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::support::{RecordingMailer, test_config};
    use crate::infra::memory::MemoryAuthRepository;
    use crate::presentation::router::auth_router_generic;

    fn app() -> (Router, RecordingMailer) {
        let mailer = RecordingMailer::default();
        let router =
            auth_router_generic(MemoryAuthRepository::new(), mailer.clone(), test_config());
        (router, mailer)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("x-jwt", token);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register_and_login(app: &Router, email: &str) -> (i64, String) {
        let (status, body) = send(
            app,
            "POST",
            "/accounts",
            None,
            Some(json!({ "email": email, "password": "pw1", "role": "Owner" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["identity"]["id"].as_i64().unwrap();

        let (status, body) = send(
            app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": email, "password": "pw1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["identityId"], id);
        (id, body["token"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_create_account_response() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            "POST",
            "/accounts",
            None,
            Some(json!({ "email": "a@x.com", "password": "pw1" })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["identity"]["email"], "a@x.com");
        assert_eq!(body["identity"]["role"], "Client");
        assert_eq!(body["identity"]["verified"], false);
        assert_eq!(body["verificationMail"]["status"], "Sent");
        assert!(!body.to_string().contains("password"));
        assert!(!body.to_string().contains("argon2"));
    }

    #[tokio::test]
    async fn test_duplicate_account_conflict() {
        let (app, _) = app();
        let body = json!({ "email": "a@x.com", "password": "pw1" });
        send(&app, "POST", "/accounts", None, Some(body.clone())).await;
        let (status, problem) = send(&app, "POST", "/accounts", None, Some(body)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(problem["code"], "DUPLICATE_EMAIL");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (app, _) = app();
        register_and_login(&app, "a@x.com").await;

        let unknown = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": "b@x.com", "password": "pw1" })),
        )
        .await;
        let wrong = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "nope" })),
        )
        .await;

        assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown, wrong);
        assert_eq!(wrong.1["code"], "INVALID_CREDENTIAL");
    }

    #[tokio::test]
    async fn test_protected_route_requires_identity() {
        let (app, _) = app();
        let (status, problem) = send(&app, "GET", "/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(problem["code"], "UNAUTHORIZED");

        let (status, _) = send(&app, "GET", "/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_on_public_route() {
        let (app, _) = app();
        let (status, _) = send(
            &app,
            "POST",
            "/accounts",
            Some("not.a-token"),
            Some(json!({ "email": "a@x.com", "password": "pw1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_me_and_profile_lookup() {
        let (app, _) = app();
        let (id, token) = register_and_login(&app, "a@x.com").await;
        let (other_id, _) = register_and_login(&app, "b@x.com").await;

        let (status, me) = send(&app, "GET", "/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], id);
        assert_eq!(me["role"], "Owner");

        let uri = format!("/identities/{}", other_id);
        let (status, other) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(other["email"], "b@x.com");

        let (status, _) = send(&app, "GET", "/identities/999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/identities/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_edit_and_verify_flow() {
        let (app, mailer) = app();
        let (_, token) = register_and_login(&app, "a@x.com").await;

        let (status, edited) = send(
            &app,
            "PATCH",
            "/me",
            Some(&token),
            Some(json!({ "email": "c@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["identity"]["email"], "c@x.com");
        assert_eq!(edited["identity"]["verified"], false);
        assert_eq!(edited["verificationMail"]["status"], "Sent");

        let code = mailer.last_code_for("c@x.com").unwrap();
        let (status, verified) = send(
            &app,
            "POST",
            "/verify-email",
            None,
            Some(json!({ "code": code })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verified["verified"], true);

        let (status, problem) = send(
            &app,
            "POST",
            "/verify-email",
            None,
            Some(json!({ "code": code })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(problem["code"], "VERIFICATION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_password_edit_omits_mail_outcome() {
        let (app, _) = app();
        let (_, token) = register_and_login(&app, "a@x.com").await;

        let (status, edited) = send(
            &app,
            "PATCH",
            "/me",
            Some(&token),
            Some(json!({ "password": "pw2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(edited.get("verificationMail").is_none());

        let (status, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "pw2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
