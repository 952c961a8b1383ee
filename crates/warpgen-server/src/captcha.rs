//! hCaptcha verification
//!
//! Only wired in when a secret is configured. Verification happens before
//! any generation work so rejected requests cost no upstream registration.

use serde::Deserialize;
use std::time::Duration;
use warpgen_core::CaptchaSettings;

/// siteverify response (fields we care about)
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifies captcha tokens against hCaptcha
#[derive(Debug, Clone)]
pub struct CaptchaVerifier {
    http: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl CaptchaVerifier {
    pub fn new(
        secret: impl Into<String>,
        verify_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CaptchaError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CaptchaError::Http(e.to_string()))?;

        Ok(Self {
            http,
            secret: secret.into(),
            verify_url: verify_url.into(),
        })
    }

    /// Verifier for the configured secret, `None` when captcha is off
    pub fn from_settings(
        settings: &CaptchaSettings,
        timeout: Duration,
    ) -> Result<Option<Self>, CaptchaError> {
        settings
            .secret
            .as_deref()
            .map(|secret| Self::new(secret, settings.verify_url.as_str(), timeout))
            .transpose()
    }

    /// Check a client token
    pub async fn verify(&self, token: Option<&str>) -> Result<(), CaptchaError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(CaptchaError::Missing)?;

        let response: VerifyResponse = self
            .http
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| CaptchaError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| CaptchaError::Http(e.to_string()))?;

        if response.success {
            tracing::debug!("Captcha token accepted");
            Ok(())
        } else {
            Err(CaptchaError::Rejected(response.error_codes.join(", ")))
        }
    }
}

/// Captcha errors
#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    #[error("Captcha token is required")]
    Missing,

    #[error("Captcha verification failed: {0}")]
    Rejected(String),

    #[error("Captcha service unavailable: {0}")]
    Http(String),
}
