//! Classification of networking failures into auth errors.

use crate::constants::AUTH_ENDPOINT_FRAGMENTS;
use crate::events::{AuthErrorKind, AuthSignal};

/// Decides which responses count as auth errors.
///
/// 401 and 403 responses from the authentication endpoints are expected while
/// the user is logging in or verifying an OTP, so they are ignored.
#[derive(Debug, Clone)]
pub struct ResponseInterceptor {
    auth_fragments: Vec<String>,
}

impl Default for ResponseInterceptor {
    fn default() -> Self {
        Self::new(AUTH_ENDPOINT_FRAGMENTS.iter().copied())
    }
}

impl ResponseInterceptor {
    /// Creates an interceptor treating paths containing any of `fragments` as
    /// authentication endpoints.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            auth_fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `path` belongs to the authentication flow.
    pub fn is_auth_endpoint(&self, path: &str) -> bool {
        self.auth_fragments.iter().any(|f| path.contains(f.as_str()))
    }

    /// Classifies a response status.
    pub fn inspect(&self, status: u16, path: &str) -> Option<AuthErrorKind> {
        if self.is_auth_endpoint(path) {
            return None;
        }
        match status {
            401 => Some(AuthErrorKind::ApiUnauthorized),
            403 => Some(AuthErrorKind::ApiForbidden),
            _ => None,
        }
    }

    /// Classifies a networking signal into an error kind and user message.
    pub fn classify(&self, signal: &AuthSignal) -> Option<(AuthErrorKind, String)> {
        match signal {
            AuthSignal::HttpResponse { status, path } => {
                self.inspect(*status, path).map(|kind| (kind, default_message(kind)))
            }
            AuthSignal::NetworkFailure { message } => {
                Some((AuthErrorKind::NetworkError, message.clone()))
            }
            AuthSignal::GlobalFailure { message } => {
                Some((AuthErrorKind::GlobalError, message.clone()))
            }
            _ => None,
        }
    }
}

fn default_message(kind: AuthErrorKind) -> String {
    match kind {
        AuthErrorKind::ApiUnauthorized => "Your session is no longer valid. Please log in again.",
        AuthErrorKind::ApiForbidden => "You do not have permission to perform this action.",
        AuthErrorKind::NetworkError => "Unable to reach the server. Check your connection.",
        AuthErrorKind::GlobalError => "Something went wrong. Please try again.",
    }
    .to_string()
}
