//! The check capability and the built-in checks.

use async_trait::async_trait;
use serde::Deserialize;

use crate::session::TargetSession;

/// Why a check did not pass.
///
/// `Assertion` means the probed condition was evaluated correctly and did
/// not hold; `Probe` means the probe itself malfunctioned (network failure,
/// malformed response, programming bug). The evaluator maps these to the
/// `fail` and `error` outcome classes respectively.
#[derive(Debug, thiserror::Error)]
pub enum CheckFailure {
    /// Expected-outcome mismatch
    #[error("{0}")]
    Assertion(String),

    /// The probe itself malfunctioned
    #[error("{0}")]
    Probe(String),
}

impl CheckFailure {
    /// Shorthand for an assertion failure.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }
}

impl From<reqwest::Error> for CheckFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::Probe(err.to_string())
    }
}

/// A configured, executable probe against a target.
///
/// Implementations own only the parameters bound at parse time and are
/// stateless across runs: `verify` may be invoked repeatedly and
/// concurrently against different targets.
#[async_trait]
pub trait Check: Send + Sync {
    /// Human-readable label, stable and deterministic per configuration.
    fn describe(&self) -> String;

    /// Probe the target. `Ok(())` means the condition held.
    async fn verify(&self, session: &TargetSession) -> Result<(), CheckFailure>;
}

/// Permanent placeholder for tasks whose checks are intentionally stubbed.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NotImplemented;

#[async_trait]
impl Check for NotImplemented {
    fn describe(&self) -> String {
        "Checks are not yet implemented for this task".to_string()
    }

    async fn verify(&self, _session: &TargetSession) -> Result<(), CheckFailure> {
        Err(CheckFailure::assertion("coming soon..."))
    }
}

/// Assert that a page contains a literal substring.
#[derive(Debug, Clone, Deserialize)]
pub struct WebpageContent {
    /// Path relative to the target's base URL
    pub url: String,

    /// Substring expected in the response body
    pub expected_text: String,
}

#[async_trait]
impl Check for WebpageContent {
    fn describe(&self) -> String {
        format!("Check webpage content: {}", self.url)
    }

    async fn verify(&self, session: &TargetSession) -> Result<(), CheckFailure> {
        let body = session.get(&self.url).await?.text().await?;
        if !body.contains(&self.expected_text) {
            return Err(CheckFailure::assertion(format!(
                "Text \"{}\" is expected in the web page {}, but it is not found.",
                self.expected_text,
                session.url(&self.url),
            )));
        }
        Ok(())
    }
}

/// Assert that a path responds with an exact status code.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpStatus {
    /// Path relative to the target's base URL
    pub url: String,

    /// Expected status code
    pub expected_status: u16,
}

#[async_trait]
impl Check for HttpStatus {
    fn describe(&self) -> String {
        format!("Check HTTP status: {} [{}]", self.url, self.expected_status)
    }

    async fn verify(&self, session: &TargetSession) -> Result<(), CheckFailure> {
        let actual = session.get(&self.url).await?.status().as_u16();
        if actual != self.expected_status {
            return Err(CheckFailure::assertion(format!(
                "For URL {}, actual status code {} does not match expected status code {}",
                self.url, actual, self.expected_status,
            )));
        }
        Ok(())
    }
}

/// Assert that a resource exists (200-class response).
#[derive(Debug, Clone, Deserialize)]
pub struct FileExists {
    /// Path relative to the target's base URL
    pub path: String,
}

#[async_trait]
impl Check for FileExists {
    fn describe(&self) -> String {
        format!("Check file exists: {}", self.path)
    }

    async fn verify(&self, session: &TargetSession) -> Result<(), CheckFailure> {
        let path = format!("/{}", self.path.trim_start_matches('/'));
        let response = session.get(&path).await?;
        if !response.status().is_success() {
            return Err(CheckFailure::assertion(format!(
                "File {} does not exist",
                self.path
            )));
        }
        Ok(())
    }
}

/// Assert that a package is installed on the target.
///
/// Probes `/packages/<package>` and expects a 200 response.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageExists {
    /// Package name expected in the target's package listing
    pub package: String,
}

#[async_trait]
impl Check for PackageExists {
    fn describe(&self) -> String {
        format!("Check package exists: {}", self.package)
    }

    async fn verify(&self, session: &TargetSession) -> Result<(), CheckFailure> {
        let response = session.get(&format!("/packages/{}", self.package)).await?;
        if response.status().as_u16() != 200 {
            return Err(CheckFailure::assertion(format!(
                "Package {} does not exist",
                self.package
            )));
        }
        Ok(())
    }
}

/// Assert that the target's user listing contains a user.
///
/// Probes `/users` and expects a JSON body shaped as
/// `{"data": {"users": ["..."]}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserExists {
    /// Username expected in the listing
    pub user: String,
}

#[derive(Debug, Deserialize)]
struct UsersBody {
    data: UsersData,
}

#[derive(Debug, Deserialize)]
struct UsersData {
    users: Vec<String>,
}

#[async_trait]
impl Check for UserExists {
    fn describe(&self) -> String {
        format!("Check user exists: {}", self.user)
    }

    async fn verify(&self, session: &TargetSession) -> Result<(), CheckFailure> {
        let body: UsersBody = session
            .get("/users")
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !body.data.users.contains(&self.user) {
            return Err(CheckFailure::assertion(format!(
                "User {} does not exist",
                self.user
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    async fn session_for(fixture: &testutil::Fixture) -> TargetSession {
        TargetSession::new(fixture.base_url()).unwrap()
    }

    #[tokio::test]
    async fn test_not_implemented_always_fails() {
        let check = NotImplemented;
        let session = TargetSession::new("http://127.0.0.1:9").unwrap();

        let err = check.verify(&session).await.unwrap_err();
        assert!(matches!(err, CheckFailure::Assertion(msg) if msg == "coming soon..."));
    }

    #[tokio::test]
    async fn test_webpage_content_pass() {
        let fixture = testutil::serve(200, "<h1>Hello World</h1>").await;
        let check = WebpageContent {
            url: "/".to_string(),
            expected_text: "Hello".to_string(),
        };

        assert!(check.verify(&session_for(&fixture).await).await.is_ok());
    }

    #[tokio::test]
    async fn test_webpage_content_missing_text() {
        let fixture = testutil::serve(200, "<h1>Goodbye</h1>").await;
        let session = session_for(&fixture).await;
        let check = WebpageContent {
            url: "/".to_string(),
            expected_text: "Hello".to_string(),
        };

        let err = check.verify(&session).await.unwrap_err();
        let CheckFailure::Assertion(message) = err else {
            panic!("expected an assertion failure, got {:?}", err);
        };
        assert!(message.contains("\"Hello\""));
        assert!(message.contains(&session.url("/")));
    }

    #[tokio::test]
    async fn test_webpage_content_unreachable_target_is_probe_error() {
        let check = WebpageContent {
            url: "/".to_string(),
            expected_text: "Hello".to_string(),
        };
        let session = TargetSession::new(testutil::dead_url().await).unwrap();

        let err = check.verify(&session).await.unwrap_err();
        assert!(matches!(err, CheckFailure::Probe(_)));
    }

    #[tokio::test]
    async fn test_http_status_match() {
        let fixture = testutil::serve(404, "gone").await;
        let check = HttpStatus {
            url: "/missing".to_string(),
            expected_status: 404,
        };

        assert!(check.verify(&session_for(&fixture).await).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_status_mismatch() {
        let fixture = testutil::serve(500, "boom").await;
        let check = HttpStatus {
            url: "/".to_string(),
            expected_status: 200,
        };

        let err = check
            .verify(&session_for(&fixture).await)
            .await
            .unwrap_err();
        let CheckFailure::Assertion(message) = err else {
            panic!("expected an assertion failure, got {:?}", err);
        };
        assert!(message.contains("500"));
        assert!(message.contains("200"));
    }

    #[tokio::test]
    async fn test_file_exists_success_class() {
        let fixture = testutil::serve(200, "contents").await;
        let check = FileExists {
            path: "style.css".to_string(),
        };

        assert!(check.verify(&session_for(&fixture).await).await.is_ok());
    }

    #[tokio::test]
    async fn test_file_exists_not_found() {
        let fixture = testutil::serve(404, "").await;
        let check = FileExists {
            path: "style.css".to_string(),
        };

        let err = check
            .verify(&session_for(&fixture).await)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckFailure::Assertion(msg) if msg.contains("style.css")));
    }

    #[tokio::test]
    async fn test_package_exists() {
        let fixture = testutil::serve(200, r#"{"name": "nginx"}"#).await;
        let check = PackageExists {
            package: "nginx".to_string(),
        };

        assert!(check.verify(&session_for(&fixture).await).await.is_ok());
    }

    #[tokio::test]
    async fn test_package_missing() {
        let fixture = testutil::serve(404, "").await;
        let check = PackageExists {
            package: "nginx".to_string(),
        };

        let err = check
            .verify(&session_for(&fixture).await)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckFailure::Assertion(msg) if msg.contains("nginx")));
    }

    #[tokio::test]
    async fn test_user_exists_member() {
        let fixture = testutil::serve(200, r#"{"data": {"users": ["alice", "bob"]}}"#).await;
        let check = UserExists {
            user: "alice".to_string(),
        };

        assert!(check.verify(&session_for(&fixture).await).await.is_ok());
    }

    #[tokio::test]
    async fn test_user_exists_missing_member() {
        let fixture = testutil::serve(200, r#"{"data": {"users": ["alice"]}}"#).await;
        let check = UserExists {
            user: "carol".to_string(),
        };

        let err = check
            .verify(&session_for(&fixture).await)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckFailure::Assertion(msg) if msg.contains("carol")));
    }

    #[tokio::test]
    async fn test_user_exists_server_error_is_probe_error() {
        let fixture = testutil::serve(500, "").await;
        let check = UserExists {
            user: "alice".to_string(),
        };

        let err = check
            .verify(&session_for(&fixture).await)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckFailure::Probe(_)));
    }

    #[tokio::test]
    async fn test_user_exists_malformed_body_is_probe_error() {
        let fixture = testutil::serve(200, "not json at all").await;
        let check = UserExists {
            user: "alice".to_string(),
        };

        let err = check
            .verify(&session_for(&fixture).await)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckFailure::Probe(_)));
    }
}
