use anyhow::Context;
use axum::async_trait;
use serde_json::json;
use tracing::info;

/// Outbound email abstraction for the password-reset flow.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_password(&self, to: &str, reset_link: &str) -> anyhow::Result<()>;
    async fn send_reset_confirmation(&self, to: &str) -> anyhow::Result<()>;
}

/// Dev/test mailer that logs instead of sending.
#[derive(Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_password(&self, to: &str, reset_link: &str) -> anyhow::Result<()> {
        info!(to = %to, reset_link = %reset_link, "reset password email (log only)");
        Ok(())
    }

    async fn send_reset_confirmation(&self, to: &str) -> anyhow::Result<()> {
        info!(to = %to, "reset confirmation email (log only)");
        Ok(())
    }
}

/// SendGrid v3 mail-send client.
#[derive(Clone)]
pub struct SendgridMailer {
    client: reqwest::Client,
    api_key: String,
    sending_email: String,
    sandbox: bool,
}

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

impl SendgridMailer {
    pub fn new(
        api_key: &str,
        sending_email: &str,
        timeout: std::time::Duration,
        sandbox: bool,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            sending_email: sending_email.to_string(),
            sandbox,
        })
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> anyhow::Result<()> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.sending_email },
            "subject": subject,
            "content": [
                { "type": "text/plain", "value": text },
                { "type": "text/html", "value": html },
            ],
            "mail_settings": { "sandbox_mode": { "enable": self.sandbox } },
        });

        let res = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("sendgrid request")?;

        if !res.status().is_success() {
            let status = res.status();
            let detail = res.text().await.unwrap_or_default();
            anyhow::bail!("sendgrid responded {status}: {detail}");
        }
        info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

#[async_trait]
impl Mailer for SendgridMailer {
    async fn send_reset_password(&self, to: &str, reset_link: &str) -> anyhow::Result<()> {
        let html = format!(
            "<p>You are receiving this because you (or someone else) requested the reset of the password for your account.<br><br>\
             Please click on the following link, or paste this into your browser to complete the process:<br><br>\
             <a href=\"{reset_link}\">Reset Password</a><br><br>\
             If you did not request this, please ignore this email and your password will remain unchanged.</p>"
        );
        self.send(
            to,
            "Reset Your Password",
            "Reset your password by clicking the link below.",
            &html,
        )
        .await
    }

    async fn send_reset_confirmation(&self, to: &str) -> anyhow::Result<()> {
        let html = format!(
            "<p>This is a confirmation that the password for your account <strong>{to}</strong> has just been changed.</p>"
        );
        self.send(
            to,
            "Your Password Has Been Changed",
            "This is a confirmation that the password for your account has just been changed.",
            &html,
        )
        .await
    }
}

/// Reset link embedded in the reset email, resolved against the frontend.
pub fn reset_link(frontend_url: &str, token: &str) -> String {
    format!("{}/login/reset/{}", frontend_url.trim_end_matches('/'), token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = LogMailer;
        mailer
            .send_reset_password("user@example.com", "http://localhost:3000/login/reset/abc")
            .await
            .expect("log mailer send");
        mailer
            .send_reset_confirmation("user@example.com")
            .await
            .expect("log mailer confirmation");
    }

    #[test]
    fn reset_link_joins_frontend_and_token() {
        assert_eq!(
            reset_link("http://localhost:3000", "tok-123"),
            "http://localhost:3000/login/reset/tok-123"
        );
        // A trailing slash on the base must not produce a double slash.
        assert_eq!(
            reset_link("https://portal.example.com/", "tok-123"),
            "https://portal.example.com/login/reset/tok-123"
        );
    }
}
